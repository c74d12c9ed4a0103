//! 对话转录：角色标注消息
//!
//! Chain 将每轮用户输入与最终回复追加到转录，Planner 把整个转录格式化后拼入 prompt。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 将转录格式化为 "User: ...\nAssistant: ..." 形式，供 prompt 的 history 段落使用
pub fn format_transcript(messages: &[Message]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut lines = Vec::with_capacity(messages.len());
    for m in messages {
        let role = match m.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        };
        lines.push(format!("{}: {}", role, m.content));
    }
    lines.join("\n") + "\n"
}
