//! 对话式 Planner
//!
//! plan：拼工具目录 + 转录 + 观察记录的单条 prompt，调 LLM 后交解码器；
//! clarify：仅对已注册工具做缺参检查，未知工具原样放行（由 Chain 在派发处处理）；
//! 可选置信度闸门：低于阈值时有界重试规划，耗尽后返回现有最优决策。

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::decoder::{JsonOutputDecoder, DEFAULT_MAX_REPAIR_ATTEMPTS};
use crate::agent::prompts::PlannerPrompts;
use crate::agent::structs::{AgentAction, AgentDecision, AgentFinish};
use crate::agent::Planner;
use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::{format_transcript, Message};
use crate::tools::{ToolRegistry, HANDOFF_MESSAGE, HANDOFF_TOOL_NAME};

/// Planner 行为配置：可选能力的开关与界限
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    /// 是否启用 should_answer 预检（默认关）
    pub enable_should_answer: bool,
    /// 是否启用澄清子步（默认关）
    pub enable_clarification: bool,
    /// 置信度阈值（1..5）；None 表示不启用置信度闸门
    pub min_confidence: Option<u32>,
    /// 置信度不足时的规划重试次数
    pub plan_retries: usize,
    /// 解码修复尝试上限
    pub max_repair_attempts: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enable_should_answer: false,
            enable_clarification: false,
            min_confidence: None,
            plan_retries: 2,
            max_repair_attempts: DEFAULT_MAX_REPAIR_ATTEMPTS,
        }
    }
}

/// 对话式 Planner：持有 LLM、解码器、工具目录快照与 prompt 配置
pub struct ConversationalPlanner {
    llm: Arc<dyn LlmClient>,
    decoder: JsonOutputDecoder,
    /// (name, description) 目录快照，按名排序保证 prompt 稳定
    catalog: Vec<(String, String)>,
    prompts: PlannerPrompts,
    config: PlannerConfig,
}

impl std::fmt::Debug for ConversationalPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationalPlanner")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl ConversationalPlanner {
    /// 从 LLM 与工具目录构造。工具描述为空是配置错误，在此尽早暴露而非调用时
    pub fn from_llm_and_tools(
        llm: Arc<dyn LlmClient>,
        tools: &ToolRegistry,
        prompts: PlannerPrompts,
        config: PlannerConfig,
    ) -> Result<Self, AgentError> {
        let mut catalog = tools.tool_descriptions();
        catalog.sort();
        for (name, description) in &catalog {
            if description.trim().is_empty() {
                return Err(AgentError::ConfigError(format!(
                    "tool '{name}' has an empty description"
                )));
            }
        }
        let decoder = JsonOutputDecoder::new(llm.clone(), config.max_repair_attempts);
        Ok(Self {
            llm,
            decoder,
            catalog,
            prompts,
            config,
        })
    }

    fn tool_names(&self) -> String {
        self.catalog
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn tool_strings(&self) -> String {
        self.catalog
            .iter()
            .map(|(name, description)| format!("> {name}: \n{description}"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn catalog_description(&self, tool: &str) -> Option<&str> {
        self.catalog
            .iter()
            .find(|(name, _)| name == tool)
            .map(|(_, description)| description.as_str())
    }

    /// 观察记录段落：按时间顺序拼接每个 Action 的展示文本
    fn scratchpad(intermediate_steps: &[AgentAction]) -> String {
        intermediate_steps
            .iter()
            .map(AgentAction::response)
            .collect::<String>()
    }

    async fn complete(&self, prompt: String) -> Result<String, AgentError> {
        self.llm
            .complete(&[Message::user(prompt)])
            .await
            .map_err(AgentError::LlmError)
    }

    async fn plan_once(
        &self,
        transcript: &[Message],
        intermediate_steps: &[AgentAction],
    ) -> Result<AgentDecision, AgentError> {
        let prompt = self
            .prompts
            .planning
            .replace("{tools}", &self.tool_strings())
            .replace("{tool_names}", &self.tool_names())
            .replace("{history}", &format_transcript(transcript))
            .replace("{agent_scratchpad}", &Self::scratchpad(intermediate_steps));

        tracing::debug!("planning");
        let output = self.complete(prompt).await?;
        let decision = self.decoder.decode(&output).await?;

        // 模型显式选择 hand off 即终止本轮，不再经由派发
        if let AgentDecision::Action(action) = &decision {
            tracing::info!(tool = %action.tool, "plan to take action");
            if action.tool == HANDOFF_TOOL_NAME {
                return Ok(AgentDecision::Finish(AgentFinish::new(
                    HANDOFF_MESSAGE,
                    "Handing off to agent",
                )));
            }
        }
        Ok(decision)
    }

    /// 把待执行决策格式化为单条 assistant 发言，请模型打分并与阈值比较
    async fn is_confident(
        &self,
        decision: &AgentDecision,
        transcript: &[Message],
        min_confidence: u32,
    ) -> Result<bool, AgentError> {
        let assistant_message = match decision {
            AgentDecision::Finish(finish) => format!("Assistant: {}", finish.message),
            AgentDecision::Action(action) => format!(
                "Action: {} with input: {}",
                action.tool, action.tool_input
            ),
        };
        let prompt = self
            .prompts
            .estimate_confidence
            .replace("{history}", &format_transcript(transcript))
            .replace("{assistant_message}", &assistant_message);

        let output = self.complete(prompt).await?;
        let score = JsonOutputDecoder::decode_confidence(&output);
        tracing::debug!(score, min_confidence, "estimated confidence");
        Ok(score >= min_confidence)
    }
}

#[async_trait]
impl Planner for ConversationalPlanner {
    async fn should_answer(
        &self,
        transcript: &[Message],
    ) -> Result<Option<AgentFinish>, AgentError> {
        if !self.config.enable_should_answer || transcript.is_empty() {
            return Ok(None);
        }
        let prompt = self
            .prompts
            .should_answer
            .replace("{history}", &format_transcript(transcript));
        let output = self.complete(prompt).await?;
        if output.to_lowercase().contains("yes") {
            let message = self.prompts.resolved_message.clone();
            return Ok(Some(AgentFinish::new(message.clone(), message)));
        }
        Ok(None)
    }

    async fn plan(
        &self,
        transcript: &[Message],
        intermediate_steps: &[AgentAction],
    ) -> Result<AgentDecision, AgentError> {
        let Some(min_confidence) = self.config.min_confidence else {
            return self.plan_once(transcript, intermediate_steps).await;
        };

        // 置信度闸门：有界重试，耗尽后返回现有决策而非永远循环
        let mut retries_left = self.config.plan_retries;
        loop {
            let decision = self.plan_once(transcript, intermediate_steps).await?;
            if self
                .is_confident(&decision, transcript, min_confidence)
                .await?
            {
                return Ok(decision);
            }
            if retries_left == 0 {
                tracing::warn!("confidence retries exhausted, returning best available decision");
                return Ok(decision);
            }
            retries_left -= 1;
            tracing::info!(retries_left, "generation is not confident, replanning");
        }
    }

    async fn clarify(
        &self,
        action: AgentAction,
        transcript: &[Message],
        intermediate_steps: &[AgentAction],
    ) -> Result<AgentDecision, AgentError> {
        if !self.config.enable_clarification {
            return Ok(AgentDecision::Action(action));
        }
        // 澄清是针对已知工具的精化，不是闸门：未知工具原样放行，由 Chain 在派发处处理
        let Some(tool_desp) = self.catalog_description(&action.tool) else {
            return Ok(AgentDecision::Action(action));
        };

        let prompt = self
            .prompts
            .clarifying_question
            .replace("{tool_name}", &action.tool)
            .replace("{tool_desp}", tool_desp)
            .replace("{history}", &format_transcript(transcript))
            .replace("{agent_scratchpad}", &Self::scratchpad(intermediate_steps));

        tracing::debug!(tool = %action.tool, "deciding if clarification is needed");
        let output = self.complete(prompt).await?;
        self.decoder.decode_clarification(&output, action).await
    }

    async fn fix_tool_input(
        &self,
        tool_description: &str,
        action: &AgentAction,
        error: &str,
    ) -> Result<AgentAction, AgentError> {
        let prompt = self
            .prompts
            .fix_tool_input
            .replace("{tool_description}", tool_description)
            .replace("{inputs}", &action.tool_input.to_string())
            .replace("{error}", error);

        tracing::info!(tool = %action.tool, "fixing tool input");
        let output = self.complete(prompt).await?;
        let new_inputs = self.decoder.load_json(&output).await?;
        Ok(AgentAction::new(action.tool.clone(), new_inputs))
    }
}
