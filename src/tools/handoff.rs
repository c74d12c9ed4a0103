//! Hand off 工具：优雅退出
//!
//! 当模型给不出可用回复、或 Chain 检测到重复动作 / 解析失败时，用该工具的消息把会话
//! 移交给人工，而不是向用户返回空串或裸错误。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Tool;

/// hand off 工具在 JSON "tool.name" 中使用的名称
pub const HANDOFF_TOOL_NAME: &str = "hand_off";

/// 默认的移交话术
pub const HANDOFF_MESSAGE: &str = "Let me hand you off to an agent now";

/// 移交工具：执行时仅返回固定话术
pub struct HandOffTool;

#[async_trait]
impl Tool for HandOffTool {
    fn name(&self) -> &str {
        HANDOFF_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Hand off the conversation to a human agent"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        Ok(HANDOFF_MESSAGE.to_string())
    }
}
