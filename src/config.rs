//! 配置加载：config/default.toml + TETHER__ 环境变量覆盖
//!
//! 例：TETHER__CHAIN__MAX_ITERATIONS=10 覆盖 [chain].max_iterations。

use std::time::Duration;

use serde::Deserialize;

use crate::core::{AgentError, ChainConfig, RepeatComparison};

/// 顶层配置
#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub chain: ChainSection,
    #[serde(default)]
    pub decoder: DecoderSection,
    #[serde(default)]
    pub planner: PlannerSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

/// [chain]：循环上限与错误恢复
#[derive(Clone, Debug, Deserialize)]
pub struct ChainSection {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// 单轮最大执行秒数；省略即不限
    #[serde(default)]
    pub max_execution_secs: Option<u64>,
    #[serde(default = "default_true")]
    pub recover_from_decode_errors: bool,
    /// "structural" 或 "serialized"
    #[serde(default = "default_repeat_comparison")]
    pub repeat_comparison: String,
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_execution_secs: None,
            recover_from_decode_errors: true,
            repeat_comparison: default_repeat_comparison(),
        }
    }
}

impl ChainSection {
    pub fn to_chain_config(&self) -> Result<ChainConfig, AgentError> {
        let repeat_comparison = match self.repeat_comparison.as_str() {
            "structural" => RepeatComparison::Structural,
            "serialized" => RepeatComparison::Serialized,
            other => {
                return Err(AgentError::ConfigError(format!(
                    "unknown repeat_comparison '{other}', expected 'structural' or 'serialized'"
                )))
            }
        };
        Ok(ChainConfig {
            max_iterations: self.max_iterations,
            max_execution_time: self.max_execution_secs.map(Duration::from_secs),
            recover_from_decode_errors: self.recover_from_decode_errors,
            repeat_comparison,
            ..ChainConfig::default()
        })
    }
}

/// [decoder]：结构化输出修复次数
#[derive(Clone, Debug, Deserialize)]
pub struct DecoderSection {
    #[serde(default = "default_max_repair_attempts")]
    pub max_repair_attempts: usize,
}

impl Default for DecoderSection {
    fn default() -> Self {
        Self {
            max_repair_attempts: default_max_repair_attempts(),
        }
    }
}

/// [planner]：可选能力开关
#[derive(Clone, Debug, Deserialize)]
pub struct PlannerSection {
    #[serde(default)]
    pub enable_should_answer: bool,
    #[serde(default)]
    pub enable_clarification: bool,
    /// 置信度下限（1..=5）；省略即不做置信度门控
    #[serde(default)]
    pub min_confidence: Option<u32>,
    #[serde(default = "default_plan_retries")]
    pub plan_retries: usize,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            enable_should_answer: false,
            enable_clarification: false,
            min_confidence: None,
            plan_retries: default_plan_retries(),
        }
    }
}

/// [llm]：模型与端点
#[derive(Clone, Debug, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
    /// 兼容 OpenAI 协议的自定义端点；省略即官方端点
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
        }
    }
}

/// [tools]：工具执行约束
#[derive(Clone, Debug, Deserialize)]
pub struct ToolsSection {
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_max_iterations() -> usize {
    15
}

fn default_true() -> bool {
    true
}

fn default_repeat_comparison() -> String {
    "structural".to_string()
}

fn default_max_repair_attempts() -> usize {
    3
}

fn default_plan_retries() -> usize {
    2
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_tool_timeout_secs() -> u64 {
    30
}

/// 加载配置：config/default.toml（可缺省）+ TETHER__ 前缀环境变量
pub fn load_config() -> Result<AppConfig, AgentError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(
            config::Environment::with_prefix("TETHER")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| AgentError::ConfigError(e.to_string()))?;

    settings
        .try_deserialize()
        .map_err(|e| AgentError::ConfigError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.chain.max_iterations, 15);
        assert!(cfg.chain.recover_from_decode_errors);
        assert_eq!(cfg.decoder.max_repair_attempts, 3);
        assert!(!cfg.planner.enable_should_answer);
        assert_eq!(cfg.planner.plan_retries, 2);
        assert_eq!(cfg.tools.tool_timeout_secs, 30);
    }

    #[test]
    fn chain_section_maps_to_chain_config() {
        let section = ChainSection {
            max_iterations: 5,
            max_execution_secs: Some(60),
            recover_from_decode_errors: false,
            repeat_comparison: "serialized".to_string(),
        };
        let cfg = section.to_chain_config().unwrap();
        assert_eq!(cfg.max_iterations, 5);
        assert_eq!(cfg.max_execution_time, Some(Duration::from_secs(60)));
        assert!(!cfg.recover_from_decode_errors);
        assert_eq!(cfg.repeat_comparison, RepeatComparison::Serialized);
    }

    #[test]
    fn unknown_repeat_comparison_is_rejected() {
        let section = ChainSection {
            repeat_comparison: "fuzzy".to_string(),
            ..ChainSection::default()
        };
        assert!(section.to_chain_config().is_err());
    }
}
