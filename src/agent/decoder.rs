//! 结构化输出解码器
//!
//! 模型输出的 JSON 都内嵌在自然语言里：取首个 `{` 到末个 `}` 之间的片段解析。
//! 解析失败进入有界修复协议：把畸形片段塞进修复 prompt 再问一次模型，迭代
//! 至多 max_repair_attempts 次（显式计数器，非递归），超限即 DecodeFailed。

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;

use crate::agent::prompts::FIX_JSON_PROMPT;
use crate::agent::structs::{AgentAction, AgentDecision, AgentFinish};
use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::tools::HANDOFF_TOOL_NAME;

/// 默认修复尝试上限
pub const DEFAULT_MAX_REPAIR_ATTEMPTS: usize = 3;

/// JSON 输出解码器：持有 LLM（仅用于修复协议）与尝试上限
pub struct JsonOutputDecoder {
    llm: Arc<dyn LlmClient>,
    max_repair_attempts: usize,
    repair_prompt: String,
}

impl JsonOutputDecoder {
    pub fn new(llm: Arc<dyn LlmClient>, max_repair_attempts: usize) -> Self {
        Self {
            llm,
            max_repair_attempts,
            repair_prompt: FIX_JSON_PROMPT.to_string(),
        }
    }

    /// 覆盖修复 prompt 模板（需含 {payload} 占位符）
    pub fn with_repair_prompt(mut self, template: impl Into<String>) -> Self {
        self.repair_prompt = template.into();
        self
    }

    /// 取首个 `{` 到末个 `}` 之间的片段
    fn extract_braced(text: &str) -> Option<&str> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end < start {
            return None;
        }
        Some(text[start..=end].trim())
    }

    fn try_parse(text: &str) -> Option<Value> {
        let fragment = Self::extract_braced(text)?;
        serde_json::from_str(fragment).ok()
    }

    /// 提取并解析 JSON；失败时进入有界修复循环。
    /// 恰好在第 max_repair_attempts 次修复仍失败后返回 DecodeFailed，绝不多试一次。
    pub async fn load_json(&self, text: &str) -> Result<Value, AgentError> {
        if let Some(value) = Self::try_parse(text) {
            return Ok(value);
        }

        let mut fragment = Self::extract_braced(text).unwrap_or(text).to_string();
        for attempt in 1..=self.max_repair_attempts {
            tracing::debug!(attempt, max = self.max_repair_attempts, "repairing malformed model output");
            let prompt = self.repair_prompt.replace("{payload}", &fragment);
            let reply = self
                .llm
                .complete(&[Message::user(prompt)])
                .await
                .map_err(AgentError::LlmError)?;
            if let Some(value) = Self::try_parse(&reply) {
                return Ok(value);
            }
            // 下一轮修复基于最新一次的畸形输出
            fragment = Self::extract_braced(&reply).unwrap_or(&reply).to_string();
        }

        Err(AgentError::DecodeFailed {
            attempts: self.max_repair_attempts,
            detail: format!("not a valid json: `{fragment}`"),
        })
    }

    /// 把一段模型文本解码为单步决策。
    ///
    /// 判定是策略而非语法：need_use_tool 含 "no" 或工具名为空即走 finish 路径；
    /// finish 路径上缺少面向用户的文本本身就是解码异常，用 hand off 动作顶替，
    /// 绝不把空消息返回给用户。
    pub async fn decode(&self, text: &str) -> Result<AgentDecision, AgentError> {
        let response = self.load_json(text).await?;

        let tool_name = response
            .pointer("/tool/name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim();
        let tool_args = response
            .pointer("/tool/args")
            .cloned()
            .unwrap_or(Value::Null);
        let need_use_tool = response
            .pointer("/thoughts/need_use_tool")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_lowercase();
        let model_response = response
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or("");

        if tool_name == HANDOFF_TOOL_NAME {
            let mut action = AgentAction::new(HANDOFF_TOOL_NAME, serde_json::json!({}));
            action.model_response = model_response.to_string();
            action.log = "Needs to hand off".to_string();
            return Ok(AgentDecision::Action(action));
        }

        if need_use_tool.contains("no") || tool_name.is_empty() {
            if !model_response.is_empty() {
                return Ok(AgentDecision::Finish(AgentFinish::new(
                    model_response,
                    model_response,
                )));
            }
            let mut action = AgentAction::new(HANDOFF_TOOL_NAME, serde_json::json!({}));
            action.log = "Empty model response".to_string();
            return Ok(AgentDecision::Action(action));
        }

        let mut action = AgentAction::new(tool_name, tool_args);
        action.model_response = model_response.to_string();
        Ok(AgentDecision::Action(action))
    }

    /// 解码澄清子步的回答：缺参且有澄清问题则以 Finish（问题本身）终止本轮，
    /// 否则原样放行待执行动作。
    pub async fn decode_clarification(
        &self,
        text: &str,
        pending_action: AgentAction,
    ) -> Result<AgentDecision, AgentError> {
        let response = self.load_json(text).await?;

        let has_arg_value = response
            .get("has_arg_value")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        let clarifying_question = response
            .get("clarifying_question")
            .and_then(Value::as_str)
            .unwrap_or("");

        if has_arg_value.contains("no") && !clarifying_question.is_empty() {
            return Ok(AgentDecision::Finish(AgentFinish::new(
                clarifying_question,
                clarifying_question,
            )));
        }
        Ok(AgentDecision::Action(pending_action))
    }

    /// 从文本中提取首个整数作为置信度；找不到时返回 0，置信度本质上尽力而为，从不报错
    pub fn decode_confidence(text: &str) -> u32 {
        static FIRST_INTEGER: OnceLock<Regex> = OnceLock::new();
        let re = FIRST_INTEGER.get_or_init(|| Regex::new(r"\d+").unwrap());
        re.find(text)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }
}
