//! HTTP endpoint handlers.

pub mod mcp;
