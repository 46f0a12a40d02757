use thiserror::Error;

/// Errors surfaced by the preview-sync library
///
/// The correlation pipeline itself is fail-soft: lookup misses are `None`
/// and delivery failures are logged. These variants cover the outer
/// surfaces (browser rendering, payload decoding, configuration, tools).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The preview browser could not be launched
    #[error("Failed to launch preview browser: {0}")]
    LaunchFailed(String),

    /// Loading a document into the preview failed
    #[error("Preview navigation failed: {0}")]
    NavigationFailed(String),

    /// Script evaluation inside the preview failed
    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    /// The rendered DOM payload could not be decoded
    #[error("Failed to parse DOM: {0}")]
    DomParseFailed(String),

    /// No element matched a lookup
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A selector outside the supported subset
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A transport payload was not a valid message
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Configuration failed validation or could not be read
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No tool is registered under the requested name
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool parameters did not match the tool's schema
    #[error("Invalid parameters for tool '{tool}': {reason}")]
    InvalidParams { tool: String, reason: String },

    /// A tool ran but could not complete
    #[error("Tool '{tool}' failed: {reason}")]
    ToolExecutionFailed { tool: String, reason: String },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SyncError>;
