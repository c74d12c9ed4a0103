//! 记忆层：每会话 Turn Memory（kv + 对话转录）
//!
//! MemoryStore 是 Chain 消费的存储契约：kv 命名空间按工具名存「最近一次输入」做重复检测，
//! 另有专用键存序列化的 Action 历史；转录在一个会话内只追加，会话之间可显式 clear。

pub mod buffer;
pub mod transcript;

pub use buffer::BufferMemory;
pub use transcript::{format_transcript, Message, Role};

/// Chain 持久化 Action 历史所用的专用键
pub const INTERMEDIATE_STEPS_KEY: &str = "intermediate_steps";

/// Turn Memory 存储契约：kv 读写、转录追加/读取、整体清空
///
/// 同一实例只服务一个会话；并发会话各自持有独立实例（跨会话共享行为未定义）。
pub trait MemoryStore: Send + Sync {
    /// 按键读取 kv 值，不存在时返回 None
    fn load(&self, key: &str) -> Option<serde_json::Value>;

    /// 写入 kv 值，同键覆盖（不追加）
    fn save(&self, key: &str, value: serde_json::Value);

    /// 读取整段对话转录（跨越整个会话，而非单轮）
    fn load_transcript(&self) -> Vec<Message>;

    /// 向转录追加一条消息
    fn append_transcript(&self, message: Message);

    /// 清空 kv 与转录（用于独立会话之间的重置）
    fn clear(&self);
}
