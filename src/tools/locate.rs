use crate::dom::ElementFingerprint;
use crate::error::{Result, SyncError};
use crate::session::InspectOutcome;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters for the locate tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocateParams {
    /// Element fingerprint as sent in an `inspect` message
    pub fingerprint: Value,

    /// Treat as a live inspection: dedup, highlight and signal the preview (default: false)
    #[serde(default)]
    pub highlight: bool,
}

/// Tool for finding the HTML source line of a rendered element
#[derive(Default)]
pub struct LocateTool;

impl Tool for LocateTool {
    type Params = LocateParams;

    fn name(&self) -> &str {
        "locate"
    }

    fn execute_typed(&self, params: LocateParams, context: &mut ToolContext) -> Result<ToolResult> {
        let fingerprint: ElementFingerprint =
            serde_json::from_value(params.fingerprint).map_err(|e| SyncError::InvalidParams {
                tool: "locate".to_string(),
                reason: format!("Invalid fingerprint: {}", e),
            })?;

        let outcome = if params.highlight {
            context.session.handle_inspect(&fingerprint)
        } else {
            match context.session.locate(&fingerprint) {
                Some(resolution) => InspectOutcome::Located(resolution),
                None => InspectOutcome::Missed,
            }
        };

        match outcome {
            InspectOutcome::Located(resolution) => Ok(ToolResult::success_with(serde_json::json!({
                "selector": fingerprint.selector,
                "line": resolution.line,
                "strategy": resolution.strategy,
            }))),
            InspectOutcome::Duplicate => Ok(ToolResult::success_with(serde_json::json!({
                "selector": fingerprint.selector,
                "duplicate": true,
            }))),
            InspectOutcome::Missed => Ok(ToolResult::failure(format!(
                "No source line found for {}",
                fingerprint.selector
            ))),
        }
    }
}
