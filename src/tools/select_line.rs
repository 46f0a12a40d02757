use crate::buffer::Language;
use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the select_line tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectLineParams {
    /// Buffer to select in
    pub language: Language,

    /// Zero-based line index
    pub line: usize,
}

/// Tool for selecting a source line and highlighting its rendered element
#[derive(Default)]
pub struct SelectLineTool;

impl Tool for SelectLineTool {
    type Params = SelectLineParams;

    fn name(&self) -> &str {
        "select_line"
    }

    fn execute_typed(&self, params: SelectLineParams, context: &mut ToolContext) -> Result<ToolResult> {
        match context.session.click_split_line(params.language, params.line) {
            Some(selection) => Ok(ToolResult::success_with(serde_json::json!({
                "language": selection.language,
                "line": selection.line,
                "start": selection.range.start,
                "end": selection.range.end,
                "preview": selection.preview,
            }))),
            None => Ok(ToolResult::failure(format!(
                "Line {} does not exist in the {} buffer",
                params.line, params.language
            ))),
        }
    }
}
