//! 进程内 Turn Memory
//!
//! kv 表存「每个工具最近一次输入」与序列化的 Action 历史，转录表存整段对话；
//! 内部用 Mutex 做内变性，使 Chain 与外层代码可共享同一实例（单会话内串行访问）。

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::memory::{MemoryStore, Message};

/// 进程内记忆：kv 存储 + 对话转录
#[derive(Debug, Default)]
pub struct BufferMemory {
    kv: Mutex<HashMap<String, Value>>,
    transcript: Mutex<Vec<Message>>,
}

impl BufferMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryStore for BufferMemory {
    fn load(&self, key: &str) -> Option<Value> {
        self.kv.lock().unwrap().get(key).cloned()
    }

    fn save(&self, key: &str, value: Value) {
        self.kv.lock().unwrap().insert(key.to_string(), value);
    }

    fn load_transcript(&self) -> Vec<Message> {
        self.transcript.lock().unwrap().clone()
    }

    fn append_transcript(&self, message: Message) {
        self.transcript.lock().unwrap().push(message);
    }

    fn clear(&self) {
        self.kv.lock().unwrap().clear();
        self.transcript.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kv_overwrite_keeps_latest() {
        let memory = BufferMemory::new();
        memory.save("get_weather", json!({"city": "SF"}));
        memory.save("get_weather", json!({"city": "NY"}));
        assert_eq!(memory.load("get_weather"), Some(json!({"city": "NY"})));
    }

    #[test]
    fn test_load_missing_key() {
        let memory = BufferMemory::new();
        assert_eq!(memory.load("nope"), None);
    }

    #[test]
    fn test_transcript_append_and_clear() {
        let memory = BufferMemory::new();
        memory.append_transcript(Message::user("hi"));
        memory.append_transcript(Message::assistant("hello"));
        assert_eq!(memory.load_transcript().len(), 2);

        memory.clear();
        assert!(memory.load_transcript().is_empty());
        assert_eq!(memory.load("anything"), None);
    }
}
