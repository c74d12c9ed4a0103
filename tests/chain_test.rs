//! Chain 端到端测试：脚本化 LLM 驱动完整的「规划 -> 执行 -> 收尾」回路

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use tether::agent::{ConversationalPlanner, PlannerConfig, PlannerPrompts};
use tether::core::{Chain, ChainConfig};
use tether::llm::MockLlm;
use tether::memory::BufferMemory;
use tether::tools::{Tool, ToolInvoker, ToolRegistry, HANDOFF_MESSAGE};

/// 固定返回晴天的天气工具
struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Gets the current weather for a city"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        Ok("Today is a sunny day".to_string())
    }
}

/// 记录执行次数的改址工具
struct AddressTool {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for AddressTool {
    fn name(&self) -> &str {
        "change_shipping_address"
    }

    fn description(&self) -> &str {
        "Changes the shipping address of an order"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Address updated".to_string())
    }
}

/// 要求 city 参数的查询工具，用于触发输入修复路径
struct LookupTool {
    executions: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for LookupTool {
    fn name(&self) -> &str {
        "lookup"
    }

    fn description(&self) -> &str {
        "Looks up a record; requires a city argument"
    }

    fn validate_input(&self, args: &Value) -> Result<(), String> {
        if args.get("city").and_then(|v| v.as_str()).is_some() {
            Ok(())
        } else {
            Err("missing required arg: city".to_string())
        }
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(format!("record for {}", args["city"]))
    }
}

fn tool_call(name: &str, args: Value, response: &str) -> String {
    json!({
        "thoughts": {"need_use_tool": "Yes"},
        "tool": {"name": name, "args": args},
        "response": response,
    })
    .to_string()
}

fn finish_reply(response: &str) -> String {
    json!({
        "thoughts": {"need_use_tool": "No"},
        "tool": {"name": "", "args": {}},
        "response": response,
    })
    .to_string()
}

fn build_chain(
    replies: Vec<String>,
    tools: ToolRegistry,
    planner_config: PlannerConfig,
    chain_config: ChainConfig,
) -> (Arc<MockLlm>, Chain) {
    let llm = Arc::new(MockLlm::new(replies));
    let tools = Arc::new(tools);
    let planner = Arc::new(
        ConversationalPlanner::from_llm_and_tools(
            llm.clone(),
            &tools,
            PlannerPrompts::default(),
            planner_config,
        )
        .unwrap(),
    );
    let chain = Chain::new(
        planner,
        tools,
        ToolInvoker::new(5),
        Arc::new(BufferMemory::new()),
    )
    .with_config(chain_config);
    (llm, chain)
}

#[tokio::test]
async fn test_tool_call_then_finish() {
    let mut tools = ToolRegistry::new();
    tools.register(WeatherTool);
    let replies = vec![
        tool_call("get_weather", json!({"city": "SF"}), "Let me check"),
        finish_reply("It is sunny"),
    ];
    let (llm, chain) = build_chain(
        replies,
        tools,
        PlannerConfig::default(),
        ChainConfig::default(),
    );

    let finish = chain.run("What's the weather in SF?").await.unwrap();

    assert_eq!(finish.message, "It is sunny");
    assert_eq!(finish.intermediate_steps.len(), 1);
    let step = &finish.intermediate_steps[0];
    assert_eq!(step.tool, "get_weather");
    assert_eq!(step.tool_input, json!({"city": "SF"}));
    assert_eq!(step.tool_output, "Today is a sunny day");
    assert_eq!(llm.calls(), 2);

    // 收尾后转录含用户与助手两条消息
    let transcript = chain.memory().load_transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].content, "It is sunny");
}

#[tokio::test]
async fn test_decode_failure_recovers_with_handoff() {
    let mut tools = ToolRegistry::new();
    tools.register(WeatherTool);
    // 首次规划与两次修复全是垃圾输出
    let replies = vec![
        "total garbage".to_string(),
        "still garbage".to_string(),
        "more garbage".to_string(),
    ];
    let planner_config = PlannerConfig {
        max_repair_attempts: 2,
        ..PlannerConfig::default()
    };
    let (llm, chain) = build_chain(replies, tools, planner_config, ChainConfig::default());

    let finish = chain.run("hello").await.unwrap();

    assert_eq!(finish.message, HANDOFF_MESSAGE);
    assert!(finish.log.contains("Invalid or incomplete response"));
    assert!(finish.intermediate_steps.is_empty());
    // 规划 1 次 + 修复恰好 2 次
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn test_repeated_action_short_circuits() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut tools = ToolRegistry::new();
    tools.register(AddressTool {
        calls: calls.clone(),
    });
    let same_call = tool_call(
        "change_shipping_address",
        json!({"order": "A1", "address": "1 Main St"}),
        "Updating your address now",
    );
    let replies = vec![same_call.clone(), same_call];
    let (_llm, chain) = build_chain(
        replies,
        tools,
        PlannerConfig::default(),
        ChainConfig::default(),
    );

    let finish = chain.run("Change my shipping address").await.unwrap();

    // 第二次相同输入不再执行工具，以模型自述收尾
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(finish.message, "Updating your address now");
    assert!(finish.log.contains("Action taken before"));
    assert_eq!(finish.intermediate_steps.len(), 1);
}

#[tokio::test]
async fn test_iteration_bound_stops_the_loop() {
    let tools = ToolRegistry::new();
    let unknown = tool_call("ghost", json!({"n": 1}), "");
    let replies = vec![unknown.clone(), unknown.clone(), unknown];
    let chain_config = ChainConfig {
        max_iterations: 3,
        ..ChainConfig::default()
    };
    let (llm, chain) = build_chain(replies, tools, PlannerConfig::default(), chain_config);

    let finish = chain.run("do something").await.unwrap();

    assert_eq!(
        finish.message,
        "Agent stopped due to iteration limit or time limit."
    );
    assert_eq!(finish.intermediate_steps.len(), 3);
    for step in &finish.intermediate_steps {
        assert_eq!(step.tool_output, "Tool ghost is not supported");
    }
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn test_failed_tool_input_is_fixed_and_retried_once() {
    let executions = Arc::new(AtomicUsize::new(0));
    let mut tools = ToolRegistry::new();
    tools.register(LookupTool {
        executions: executions.clone(),
    });
    let replies = vec![
        tool_call("lookup", json!({}), "Looking it up"),
        // fix_tool_input 的修正输出
        r#"{"city": "SF"}"#.to_string(),
        finish_reply("Found it"),
    ];
    let (llm, chain) = build_chain(
        replies,
        tools,
        PlannerConfig::default(),
        ChainConfig::default(),
    );

    let finish = chain.run("look up SF").await.unwrap();

    assert_eq!(finish.message, "Found it");
    assert_eq!(finish.intermediate_steps.len(), 1);
    let step = &finish.intermediate_steps[0];
    // Action 带上修正后的输入与重试成功的输出
    assert_eq!(step.tool_input, json!({"city": "SF"}));
    assert!(step.tool_output.contains("SF"));
    // 首次输入未通过校验，execute 只跑了重试那一次
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn test_steps_accumulate_across_runs_in_one_session() {
    let mut tools = ToolRegistry::new();
    tools.register(WeatherTool);
    let replies = vec![
        tool_call("get_weather", json!({"city": "SF"}), ""),
        finish_reply("It is sunny"),
        finish_reply("You're welcome"),
    ];
    let (_llm, chain) = build_chain(
        replies,
        tools,
        PlannerConfig::default(),
        ChainConfig::default(),
    );

    let first = chain.run("Weather in SF?").await.unwrap();
    assert_eq!(first.intermediate_steps.len(), 1);

    // 第二轮复用同一会话：历史 Action 仍然可见
    let second = chain.run("thanks").await.unwrap();
    assert_eq!(second.message, "You're welcome");
    assert_eq!(second.intermediate_steps.len(), 1);
    assert_eq!(second.intermediate_steps[0].tool, "get_weather");
}
