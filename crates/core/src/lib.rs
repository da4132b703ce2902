// Core types and functionality for the Readwise MCP gateway

pub mod error;
pub mod shape;
pub mod types;

pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use types::*;
