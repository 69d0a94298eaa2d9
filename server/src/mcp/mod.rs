//! MCP (Model Context Protocol) support.
//!
//! Implements the Streamable HTTP transport session lifecycle and the
//! JSON-RPC handler behind it.

pub mod handler;
pub mod session;

pub use handler::{JsonRpcRequest, JsonRpcResponse, McpHandler};
pub use session::{SessionRegistry, StreamTransport, TransportEvent, TransportState};
