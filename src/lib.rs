//! tether：工具增强的对话代理运行时
//!
//! 分层：
//! - 「core：有界编排循环（Chain）与统一错误类型」
//! - 「agent：Planner 决策层、结构化输出解码与修复、prompt 模板」
//! - 「llm：LLM 客户端抽象（OpenAI 实现 + 测试用 Mock）」
//! - 「tools：工具契约、注册表与带超时的调用器」
//! - 「memory：会话转录与键值记忆」
//!
//! 一轮交互：Chain 读转录 -> Planner 规划（可选预检/澄清/置信度闸门）->
//! 解码器把 LLM 文本解成 Action/Finish -> 调用器执行工具 -> 观察写回记忆，
//! 直到 Finish 或达到迭代/时间上限。

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tools;

pub use agent::{
    AgentAction, AgentDecision, AgentFinish, ConversationalPlanner, JsonOutputDecoder, Planner,
    PlannerConfig, PlannerPrompts,
};
pub use config::{load_config, AppConfig};
pub use core::{AgentError, Chain, ChainConfig, RepeatComparison};
pub use llm::{LlmClient, MockLlm, OpenAiClient};
pub use memory::{BufferMemory, MemoryStore, Message, Role};
pub use tools::{Tool, ToolInvoker, ToolRegistry};
