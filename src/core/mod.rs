//! 核心层：错误类型与有界编排循环（Chain）

pub mod chain;
pub mod error;

pub use chain::{Chain, ChainConfig, RepeatComparison};
pub use error::AgentError;
