// MCP (Model Context Protocol) layer: wire types, the tool registry,
// and JSON-RPC dispatch. Transport lives in the server crate.

pub mod dispatch;
pub mod protocol;
pub mod tools;

pub use dispatch::{McpDispatcher, SERVER_NAME};
