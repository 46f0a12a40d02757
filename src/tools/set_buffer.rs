use crate::buffer::Language;
use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the set_buffer tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetBufferParams {
    /// Buffer to replace
    pub language: Language,

    /// New text content
    pub text: String,
}

/// Tool for replacing a buffer's text
#[derive(Default)]
pub struct SetBufferTool;

impl Tool for SetBufferTool {
    type Params = SetBufferParams;

    fn name(&self) -> &str {
        "set_buffer"
    }

    fn execute_typed(&self, params: SetBufferParams, context: &mut ToolContext) -> Result<ToolResult> {
        let length = params.text.len();
        context.session.set_buffer(params.language, params.text);

        Ok(ToolResult::success_with(serde_json::json!({
            "language": params.language,
            "length": length,
            "lines": context.session.buffers().get(params.language).line_count(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferSet;
    use crate::config::SyncOptions;
    use crate::session::SyncSession;

    #[test]
    fn test_set_buffer_tool_name() {
        assert_eq!(SetBufferTool.name(), "set_buffer");
    }

    #[test]
    fn test_set_buffer_replaces_text() {
        let mut session = SyncSession::new(BufferSet::default(), SyncOptions::default());
        let mut context = ToolContext::new(&mut session);
        let result = SetBufferTool
            .execute(serde_json::json!({"language": "html", "text": "<p>a</p>\n<p>b</p>"}), &mut context)
            .unwrap();

        assert_eq!(result.data.unwrap()["lines"], 2);
        assert_eq!(session.buffers().html.text(), "<p>a</p>\n<p>b</p>");
        // Map is rebuilt on next use, not on write
        assert_eq!(session.build_count(), 0);
    }
}
