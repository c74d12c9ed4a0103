//! 工具调用器
//!
//! run(tool, args) 先做输入形态校验，再在全局超时内执行工具；校验失败、执行失败与超时
//! 全部归一化为单一可恢复错误 ToolExecutionFailed，编排层永远看不到工具自有的错误类型。
//! 每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::Tool;

/// 工具调用器：对每次调用施加超时，并将一切失败映射为 ToolExecutionFailed
pub struct ToolInvoker {
    timeout: Duration,
}

impl ToolInvoker {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定工具并返回其文本输出；输出 JSON 审计日志
    pub async fn run(&self, tool: &dyn Tool, args: &Value) -> Result<String, AgentError> {
        if let Err(e) = tool.validate_input(args) {
            return Err(AgentError::ToolExecutionFailed(format!(
                "Tool input args value error: {e}"
            )));
        }

        let start = Instant::now();
        let result = timeout(self.timeout, tool.execute(args.clone())).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool.name(),
            "ok": ok,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview(args),
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        match result {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) => Err(AgentError::ToolExecutionFailed(format!(
                "Failed to run tool {} due to {}",
                tool.name(),
                e
            ))),
            Err(_) => Err(AgentError::ToolExecutionFailed(format!(
                "Tool {} timed out after {}s",
                tool.name(),
                self.timeout.as_secs()
            ))),
        }
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            Err("boom".to_string())
        }
    }

    struct PickyTool;

    #[async_trait]
    impl Tool for PickyTool {
        fn name(&self) -> &str {
            "picky"
        }

        fn description(&self) -> &str {
            "Requires an object with a city field"
        }

        fn validate_input(&self, args: &Value) -> Result<(), String> {
            if args.get("city").and_then(|v| v.as_str()).is_some() {
                Ok(())
            } else {
                Err("missing required arg: city".to_string())
            }
        }

        async fn execute(&self, args: Value) -> Result<String, String> {
            Ok(format!("ok: {}", args["city"]))
        }
    }

    #[tokio::test]
    async fn test_failure_is_wrapped_as_tool_execution_failed() {
        let invoker = ToolInvoker::new(5);
        let err = invoker
            .run(&FailingTool, &serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            AgentError::ToolExecutionFailed(msg) => {
                assert!(msg.contains("failing"));
                assert!(msg.contains("boom"));
            }
            other => panic!("Expected ToolExecutionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validation_failure_is_recoverable() {
        let invoker = ToolInvoker::new(5);
        let err = invoker
            .run(&PickyTool, &serde_json::json!({"town": "SF"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolExecutionFailed(_)));
    }

    #[tokio::test]
    async fn test_valid_input_executes() {
        let invoker = ToolInvoker::new(5);
        let out = invoker
            .run(&PickyTool, &serde_json::json!({"city": "SF"}))
            .await
            .unwrap();
        assert!(out.contains("SF"));
    }
}
