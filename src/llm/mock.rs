//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按脚本顺序弹出预置回复，并记录调用次数，便于精确断言「修复协议恰好调用 N 次」之类的性质。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::Message;

/// 脚本化 Mock 客户端：每次 complete 弹出下一条预置回复
#[derive(Debug, Default)]
pub struct MockLlm {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl MockLlm {
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// 向脚本末尾追加一条回复
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    /// 已发生的 complete 调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "mock script exhausted".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_exhausted() {
        let llm = MockLlm::new(["first", "second"]);
        assert_eq!(llm.complete(&[]).await.unwrap(), "first");
        assert_eq!(llm.complete(&[]).await.unwrap(), "second");
        assert!(llm.complete(&[]).await.is_err());
        assert_eq!(llm.calls(), 3);
    }
}
