//! 工具箱：Tool trait、注册表、调用器与内置工具（echo、hand off）

pub mod echo;
pub mod handoff;
pub mod invoker;
pub mod registry;

pub use echo::EchoTool;
pub use handoff::{HandOffTool, HANDOFF_MESSAGE, HANDOFF_TOOL_NAME};
pub use invoker::ToolInvoker;
pub use registry::{Tool, ToolRegistry};
