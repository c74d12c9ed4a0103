//! Chain：有界执行循环（Step Scheduler）
//!
//! 单条用户输入 -> 追加转录 -> 可选 should_answer 预检 ->
//! while 未达迭代/时间上限 { plan -> clarify -> 派发工具 -> 记录 Action } ->
//! Finish（带完整决策历史）写回记忆。
//!
//! 派发处处理三类条件：未知工具（描述性输出串，不是错误）、重复动作（以 Finish 短路，
//! 防止无效工具调用无限重复）、工具执行失败（fix_tool_input 修正后恰好重试一次）。
//! Decode / 工具错误都在本层被捕获，调用方永远拿到 Finish 而非裸异常。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::agent::{AgentAction, AgentDecision, AgentFinish, Planner};
use crate::core::AgentError;
use crate::memory::{MemoryStore, Message, INTERMEDIATE_STEPS_KEY};
use crate::tools::{ToolInvoker, ToolRegistry, HANDOFF_MESSAGE};

/// 重复动作的相等语义：解析后输入的结构相等，或序列化串相等
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepeatComparison {
    #[default]
    Structural,
    Serialized,
}

/// Chain 配置：资源上限与错误恢复策略
#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// 单轮最大迭代步数
    pub max_iterations: usize,
    /// 单轮最大执行时长；None 表示不限
    pub max_execution_time: Option<Duration>,
    /// plan / 解码出错时是否转为 hand-off Finish（false 则向调用方抛出）
    pub recover_from_decode_errors: bool,
    /// 重复动作比较策略
    pub repeat_comparison: RepeatComparison,
    /// hand-off 话术（重复动作且模型无自述、解析失败时使用）
    pub handoff_message: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            max_execution_time: None,
            recover_from_decode_errors: true,
            repeat_comparison: RepeatComparison::Structural,
            handoff_message: HANDOFF_MESSAGE.to_string(),
        }
    }
}

/// 有界编排循环：驱动 Planner -> ToolInvoker -> MemoryStore 直到 Finish 或上限
pub struct Chain {
    planner: Arc<dyn Planner>,
    tools: Arc<ToolRegistry>,
    invoker: ToolInvoker,
    memory: Arc<dyn MemoryStore>,
    config: ChainConfig,
}

impl Chain {
    pub fn new(
        planner: Arc<dyn Planner>,
        tools: Arc<ToolRegistry>,
        invoker: ToolInvoker,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            planner,
            tools,
            invoker,
            memory,
            config: ChainConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn memory(&self) -> &Arc<dyn MemoryStore> {
        &self.memory
    }

    /// 处理单条用户输入，返回终态 Finish。
    /// Decode 与工具错误不会逃逸；仅在 recover_from_decode_errors 关闭时才向调用方抛错。
    pub async fn run(&self, user_query: &str) -> Result<AgentFinish, AgentError> {
        self.memory.append_transcript(Message::user(user_query));
        let transcript = self.memory.load_transcript();

        // 本会话已积累的 Action 历史（新会话为空）
        let mut steps: Vec<AgentAction> = self
            .memory
            .load(INTERMEDIATE_STEPS_KEY)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        let mut iterations = 0usize;
        let start = Instant::now();

        // 预检：会话已解决则直接收尾，不进入规划
        let precheck = match self.planner.should_answer(&transcript).await {
            Ok(result) => result,
            Err(e) if self.config.recover_from_decode_errors => Some(self.graceful_exit(&e)),
            Err(e) => return Err(e),
        };

        let mut finish = match precheck {
            Some(finish) => finish,
            None => loop {
                if !self.should_continue(iterations, start.elapsed()) {
                    tracing::warn!(iterations, "chain stopped due to resource bound");
                    break AgentFinish::new(
                        "Agent stopped due to iteration limit or time limit.",
                        "",
                    );
                }

                let decision = match self.take_next_step(&transcript, &steps).await {
                    Ok(decision) => decision,
                    Err(e) if self.config.recover_from_decode_errors => {
                        break self.graceful_exit(&e)
                    }
                    Err(e) => return Err(e),
                };

                match decision {
                    AgentDecision::Finish(finish) => break finish,
                    AgentDecision::Action(action) => {
                        steps.push(action);
                        iterations += 1;
                    }
                }
            },
        };

        finish.intermediate_steps = steps.clone();

        match serde_json::to_value(&steps) {
            Ok(value) => self.memory.save(INTERMEDIATE_STEPS_KEY, value),
            Err(e) => tracing::warn!(error = %e, "failed to serialize intermediate steps"),
        }
        self.memory
            .append_transcript(Message::assistant(finish.message.clone()));

        Ok(finish)
    }

    /// 一次决策：plan ->（Action 时）clarify -> 派发
    async fn take_next_step(
        &self,
        transcript: &[Message],
        steps: &[AgentAction],
    ) -> Result<AgentDecision, AgentError> {
        let output = self.planner.plan(transcript, steps).await?;

        let output = match output {
            AgentDecision::Action(action) => {
                self.planner.clarify(action, transcript, steps).await?
            }
            finish => finish,
        };

        match output {
            AgentDecision::Finish(finish) => Ok(AgentDecision::Finish(finish)),
            AgentDecision::Action(action) => self.dispatch(action).await,
        }
    }

    /// 派发一个待执行动作：未知工具 / 重复动作 / 执行与修复重试
    async fn dispatch(&self, mut action: AgentAction) -> Result<AgentDecision, AgentError> {
        let Some(tool) = self.tools.get(&action.tool) else {
            tracing::warn!(tool = %action.tool, "tool is not supported");
            action.tool_output = format!("Tool {} is not supported", action.tool);
            return Ok(AgentDecision::Action(action));
        };

        if let Some(last_input) = self.memory.load(&action.tool) {
            if self.is_repeat(&last_input, &action.tool_input) {
                return Ok(AgentDecision::Finish(self.handle_repeated_action(action)));
            }
        }
        // 先记后跑：失败的调用也计入重复检测
        self.memory.save(&action.tool, action.tool_input.clone());

        let output = match self.invoker.run(tool.as_ref(), &action.tool_input).await {
            Ok(output) => output,
            Err(e) => {
                let fixed = self
                    .planner
                    .fix_tool_input(tool.description(), &action, &e.to_string())
                    .await?;
                if fixed.tool_input != action.tool_input {
                    // 修正后的输入恰好重试一次；不在失败上循环
                    action.tool_input = fixed.tool_input;
                    self.memory.save(&action.tool, action.tool_input.clone());
                    match self.invoker.run(tool.as_ref(), &action.tool_input).await {
                        Ok(output) => output,
                        Err(e2) => format!("Error: {e2}"),
                    }
                } else {
                    format!("Error: {e}")
                }
            }
        };

        tracing::info!(tool = %action.tool, input = %action.tool_input, "took action");
        action.tool_output = output;
        Ok(AgentDecision::Action(action))
    }

    /// 重复动作短路：有模型自述时把自述作为回复，否则走 hand-off 话术
    fn handle_repeated_action(&self, action: AgentAction) -> AgentFinish {
        let log = format!(
            "Action taken before: {}, input: {}",
            action.tool, action.tool_input
        );
        tracing::info!(%log, "repeated action, exiting gracefully");
        if !action.model_response.is_empty() {
            AgentFinish::new(action.response(), log)
        } else {
            AgentFinish::new(
                self.config.handoff_message.clone(),
                "Gracefully exit due to repeated action",
            )
        }
    }

    fn is_repeat(&self, last_input: &Value, current_input: &Value) -> bool {
        match self.config.repeat_comparison {
            RepeatComparison::Structural => last_input == current_input,
            RepeatComparison::Serialized => last_input.to_string() == current_input.to_string(),
        }
    }

    fn should_continue(&self, iterations: usize, elapsed: Duration) -> bool {
        if iterations >= self.config.max_iterations {
            return false;
        }
        if let Some(limit) = self.config.max_execution_time {
            if elapsed >= limit {
                return false;
            }
        }
        true
    }

    /// 把致命错误转为 hand-off Finish：错误文本作为诊断 log，话术面向用户
    fn graceful_exit(&self, error: &AgentError) -> AgentFinish {
        let log = format!("Invalid or incomplete response due to {error}");
        tracing::warn!(%log, "recovering with hand-off finish");
        AgentFinish::new(self.config.handoff_message.clone(), log)
    }
}
