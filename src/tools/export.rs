use crate::error::{Result, SyncError};
use crate::tools::{Tool, ToolContext, ToolResult};
use log::info;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;

/// Parameters for the export_document tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportDocumentParams {
    /// Document title (default: "My Website")
    #[serde(default = "default_title")]
    pub title: String,

    /// File to write the document to; returned inline when omitted
    #[serde(default)]
    pub output: Option<String>,
}

fn default_title() -> String {
    "My Website".to_string()
}

/// Tool for composing the standalone single-file website
#[derive(Default)]
pub struct ExportDocumentTool;

impl Tool for ExportDocumentTool {
    type Params = ExportDocumentParams;

    fn name(&self) -> &str {
        "export_document"
    }

    fn execute_typed(&self, params: ExportDocumentParams, context: &mut ToolContext) -> Result<ToolResult> {
        let html = context.session.buffers().export_document(&params.title);

        if let Some(output) = &params.output {
            fs::write(output, &html).map_err(|e| SyncError::ToolExecutionFailed {
                tool: "export_document".to_string(),
                reason: format!("Failed to write {}: {}", output, e),
            })?;
            info!("Wrote {} ({} bytes)", output, html.len());
            return Ok(ToolResult::success_with(serde_json::json!({
                "title": params.title,
                "length": html.len(),
                "output": output,
            })));
        }

        Ok(ToolResult::success_with(serde_json::json!({
            "title": params.title,
            "length": html.len(),
            "html": html,
        })))
    }
}
