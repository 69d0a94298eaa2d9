//! Shared types for the Followup MCP gateway.
//!
//! This crate contains the tool payload types exchanged between MCP clients
//! and the gateway, along with their validation rules.

/// Default port for the Followup gateway server.
pub const DEFAULT_PORT: u16 = 3000;

pub mod recap;

// Re-export commonly used types
pub use recap::{Contact, MeetingRecap, ValidationFailure};
