//! Echo 工具（playground 与测试用）

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Tool;

/// Echo 工具：回显文本
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo text back to the user. Args: {\"text\": \"message\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let text = match &args {
            Value::String(s) => s.as_str(),
            other => other.get("text").and_then(|v| v.as_str()).unwrap_or("(empty)"),
        };
        Ok(text.to_string())
    }
}
