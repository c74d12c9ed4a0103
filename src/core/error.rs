//! Agent 错误类型
//!
//! 错误分级与 Chain 的恢复策略配合：Decode / 工具执行错误在 Chain 边界被捕获并转为
//! hand-off AgentFinish，调用方永远拿到自然语言回复而非裸异常；不支持的工具与资源耗尽
//! 不是错误，是数据条件 / 终止态。

use thiserror::Error;

/// Agent 运行过程中可能出现的错误（解码、工具、LLM 后端、配置）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 模型输出在有界修复后仍不是合法结构化数据；对当前规划步是致命的
    #[error("Decode failed after {attempts} repair attempts: {detail}")]
    DecodeFailed { attempts: usize, detail: String },

    /// 工具调用期间的任何失败（参数校验、执行异常、超时）统一包装为该可恢复错误
    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    /// LLM 后端返回的错误（重试由后端适配器负责，此处不重试）
    #[error("LLM error: {0}")]
    LlmError(String),

    /// 配置错误（如工具描述为空），在构造期尽早暴露
    #[error("Config error: {0}")]
    ConfigError(String),
}
