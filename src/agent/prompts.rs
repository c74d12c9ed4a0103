//! Planner 默认 prompt 模板
//!
//! 模板是配置数据而非契约：全部在构造 Planner 时显式注入（PlannerPrompts），
//! 没有进程级模板注册表。占位符用 `{name}` 形式，替换见 conversational.rs。

/// 规划模板：工具目录 + 转录 + 观察记录，要求模型按 JSON 作答
pub const PLANNING_PROMPT: &str = r#"You are an assistant who tries to have a helpful and polite conversation
with the user based on the previous conversation and observations from tools.
Use a tool when provided. If there is no tool available, just respond with a
helpful and polite conversation. Always reply with a non empty response.

Assistant has access to the following tools:
{tools}

Previous conversation so far:
{history}

Previous observations:
{agent_scratchpad}

Please respond to the user question in JSON format as described below
RESPONSE FORMAT:
{
  "thoughts": {
    "plan": "Given previous observations, what is the next step after the previous conversation",
    "need_use_tool": "Yes if needs to use another tool not used in previous observations else No"
  },
  "tool": {
    "name": "tool name, should be one of [{tool_names}] or empty if tool is not needed",
    "args": {
      "arg_name": "arg value from conversation history or observation to run tool"
    }
  },
  "response": "Response to user"
}

Ensure the response is a single valid JSON object
"#;

/// 澄清模板：检查工具所需参数是否齐备，否则给出澄清问题
pub const CLARIFYING_QUESTION_PROMPT: &str = r#"You are an assistant who is going to use the '{tool_name}' tool.
Check if you have enough information from the previous conversation and observations to use the tool based on the spec below.
"{tool_desp}"

Previous conversation so far:
{history}

Previous observations:
{agent_scratchpad}

Please respond in JSON format as described below
RESPONSE FORMAT:
{
    "has_arg_value": "Do values for all input args for the '{tool_name}' tool exist? answer with Yes or No",
    "clarifying_question": "clarifying question to the user to ask for missing information"
}

Ensure the response is a single valid JSON object
"#;

/// 预检模板：用户是否已确认问题解决（yes/no）
pub const SHOULD_ANSWER_PROMPT: &str = r#"You are an assistant.
Given the following conversation so far, has the user acknowledged the question is resolved,
such as "thank you" or "that's all"?
Answer with yes or no.

Conversation:
{history}
"#;

/// 工具输入修复模板：根据工具 spec、被拒输入与错误文本产出修正后的 JSON 输入
pub const FIX_TOOL_INPUT_PROMPT: &str = r#"Tool has the following spec and input provided
Spec: "{tool_description}"
Inputs: "{inputs}"
Running this tool failed with the following error: "{error}"
What is the correct input in JSON format for this tool?
"#;

/// 置信度模板：给定转录与待执行决策，要求模型打 1..5 分
pub const ESTIMATE_CONFIDENCE_PROMPT: &str = r#"Below is a conversation between an assistant and a user, followed by the
assistant's next planned message or action.

Conversation:
{history}

Planned next step:
{assistant_message}

On a scale of 1 to 5, how confident are you that this next step is correct and
helpful for the user? Respond with a single integer.
"#;

/// 修复模板：要求模型把畸形片段改写成合法 JSON
pub const FIX_JSON_PROMPT: &str = r#"Fix the following json into correct format
```json
{payload}
```

Respond with only the corrected JSON object.
"#;

/// should_answer 预检命中时的礼貌性收尾话术
pub const RESOLVED_MESSAGE: &str = "Thank you for contacting us";

/// Planner 的 prompt 配置：构造时注入，替代全局模板状态
#[derive(Clone, Debug)]
pub struct PlannerPrompts {
    pub planning: String,
    pub clarifying_question: String,
    pub should_answer: String,
    pub fix_tool_input: String,
    pub estimate_confidence: String,
    pub resolved_message: String,
}

impl Default for PlannerPrompts {
    fn default() -> Self {
        Self {
            planning: PLANNING_PROMPT.to_string(),
            clarifying_question: CLARIFYING_QUESTION_PROMPT.to_string(),
            should_answer: SHOULD_ANSWER_PROMPT.to_string(),
            fix_tool_input: FIX_TOOL_INPUT_PROMPT.to_string(),
            estimate_confidence: ESTIMATE_CONFIDENCE_PROMPT.to_string(),
            resolved_message: RESOLVED_MESSAGE.to_string(),
        }
    }
}
