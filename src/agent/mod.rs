//! 决策层：Action/Finish 值类型、结构化输出解码器、Planner
//!
//! Planner trait 定义 Chain 消费的决策契约；should_answer / clarify / fix_tool_input
//! 都是可选能力，默认实现为「缺席」（不预检、不澄清、不修复），由具体 Planner 按配置开启。

pub mod conversational;
pub mod decoder;
pub mod prompts;
pub mod structs;

use async_trait::async_trait;

pub use conversational::{ConversationalPlanner, PlannerConfig};
pub use decoder::JsonOutputDecoder;
pub use prompts::PlannerPrompts;
pub use structs::{AgentAction, AgentDecision, AgentFinish};

use crate::core::AgentError;
use crate::memory::Message;

/// Planner 契约：给定转录与本轮已积累的 Action 历史，产出下一步决策
#[async_trait]
pub trait Planner: Send + Sync {
    /// 预检：会话是否已经解决、无需再规划。默认缺席（返回 None）
    async fn should_answer(
        &self,
        _transcript: &[Message],
    ) -> Result<Option<AgentFinish>, AgentError> {
        Ok(None)
    }

    /// 规划下一步：执行工具（Action）或直接回复（Finish）
    async fn plan(
        &self,
        transcript: &[Message],
        intermediate_steps: &[AgentAction],
    ) -> Result<AgentDecision, AgentError>;

    /// 澄清子步：检查待执行动作的参数是否齐备，缺参时返回澄清问题（Finish）。
    /// 默认缺席：原样放行
    async fn clarify(
        &self,
        action: AgentAction,
        _transcript: &[Message],
        _intermediate_steps: &[AgentAction],
    ) -> Result<AgentDecision, AgentError> {
        Ok(AgentDecision::Action(action))
    }

    /// 工具执行失败后的输入修复。默认缺席：返回原动作（输入未变化即不重试）
    async fn fix_tool_input(
        &self,
        _tool_description: &str,
        action: &AgentAction,
        _error: &str,
    ) -> Result<AgentAction, AgentError> {
        Ok(action.clone())
    }
}
