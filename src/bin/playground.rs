//! 交互式试验台：stdin REPL 驱动一条 Chain
//!
//! 用法：OPENAI_API_KEY=sk-... cargo run --bin tether-playground
//! 配置见 config/default.toml，可用 TETHER__ 前缀环境变量覆盖。

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;

use tether::agent::{ConversationalPlanner, PlannerConfig, PlannerPrompts};
use tether::core::Chain;
use tether::llm::OpenAiClient;
use tether::memory::BufferMemory;
use tether::tools::{EchoTool, HandOffTool, ToolInvoker, ToolRegistry};
use tether::{load_config, observability};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init();

    let app = load_config()?;

    let llm = Arc::new(OpenAiClient::new(
        app.llm.base_url.as_deref(),
        &app.llm.model,
        None,
    ));

    let mut tools = ToolRegistry::new();
    tools.register(EchoTool);
    tools.register(HandOffTool);
    let tools = Arc::new(tools);

    let planner_config = PlannerConfig {
        enable_should_answer: app.planner.enable_should_answer,
        enable_clarification: app.planner.enable_clarification,
        min_confidence: app.planner.min_confidence,
        plan_retries: app.planner.plan_retries,
        max_repair_attempts: app.decoder.max_repair_attempts,
    };
    let planner = Arc::new(ConversationalPlanner::from_llm_and_tools(
        llm.clone(),
        &tools,
        PlannerPrompts::default(),
        planner_config,
    )?);

    let chain = Chain::new(
        planner,
        tools,
        ToolInvoker::new(app.tools.tool_timeout_secs),
        Arc::new(BufferMemory::new()),
    )
    .with_config(app.chain.to_chain_config()?);

    println!("tether playground (empty line to quit)");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            break;
        }

        match chain.run(query).await {
            Ok(finish) => {
                println!("{}", finish.message);
                if !finish.log.is_empty() {
                    tracing::debug!(log = %finish.log, "finish");
                }
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    let (prompt, completion, total) = llm.usage.get();
    tracing::info!(prompt, completion, total, "token usage");
    Ok(())
}
