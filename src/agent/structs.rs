//! 决策值类型：AgentAction / AgentFinish / AgentDecision
//!
//! AgentAction 在生命周期内可变：Planner 创建时只有 tool 与 tool_input，
//! Chain 派发后写入 tool_output；Finish 是终态，历史列表仅在循环退出时附上。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 一次工具调用决策及其（可能为空的）结果
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentAction {
    /// 工具名
    pub tool: String,
    /// 工具输入：字符串或具名参数对象
    #[serde(default)]
    pub tool_input: Value,
    /// 工具输出，执行前为空
    #[serde(default)]
    pub tool_output: String,
    /// 模型在决策旁附带的自然语言说明
    #[serde(default)]
    pub model_response: String,
    /// 诊断备注
    #[serde(default)]
    pub log: String,
}

impl AgentAction {
    pub fn new(tool: impl Into<String>, tool_input: Value) -> Self {
        Self {
            tool: tool.into(),
            tool_input,
            ..Default::default()
        }
    }

    /// 写入记忆并拼入下一轮 prompt 的展示文本：
    /// 工具尚未产出输出时用模型自述，否则用「用了工具 X、输入 Y、得到 Z」的格式化串
    pub fn response(&self) -> String {
        if !self.model_response.is_empty() && self.tool_output.is_empty() {
            return self.model_response.clone();
        }
        format!(
            "Outputs from using tool '{}' for inputs {} is '{}'\n",
            self.tool, self.tool_input, self.tool_output
        )
    }
}

/// 终态决策：面向用户的回复与本轮完整决策历史
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentFinish {
    pub message: String,
    pub log: String,
    #[serde(default)]
    pub intermediate_steps: Vec<AgentAction>,
}

impl AgentFinish {
    pub fn new(message: impl Into<String>, log: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            log: log.into(),
            intermediate_steps: Vec::new(),
        }
    }
}

/// 单步决策：要么执行工具，要么终止回复用户；所有消费方都必须穷尽匹配两个变体
#[derive(Clone, Debug)]
pub enum AgentDecision {
    Action(AgentAction),
    Finish(AgentFinish),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_prefers_model_remark_before_execution() {
        let mut action = AgentAction::new("get_weather", json!({"city": "SF"}));
        action.model_response = "Checking the weather".to_string();
        assert_eq!(action.response(), "Checking the weather");
    }

    #[test]
    fn test_response_formats_tool_output_after_execution() {
        let mut action = AgentAction::new("get_weather", json!({"city": "SF"}));
        action.model_response = "Checking the weather".to_string();
        action.tool_output = "Sunny".to_string();
        let text = action.response();
        assert!(text.contains("get_weather"));
        assert!(text.contains("Sunny"));
        assert!(text.contains(r#"{"city":"SF"}"#));
    }

    #[test]
    fn test_action_roundtrips_through_serde() {
        let mut action = AgentAction::new("echo", json!("hello"));
        action.tool_output = "hello".to_string();
        let value = serde_json::to_value(&action).unwrap();
        let back: AgentAction = serde_json::from_value(value).unwrap();
        assert_eq!(back.tool, "echo");
        assert_eq!(back.tool_output, "hello");
    }
}
