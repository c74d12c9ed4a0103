//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient：complete 接收角色标注消息列表，
//! 返回一条生成文本。超时 / 限流等传输层重试由后端适配器负责，本 crate 不重试。

use async_trait::async_trait;

use crate::memory::Message;

/// LLM 客户端 trait：一次调用产出一条回复
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
