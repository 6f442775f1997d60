//! CLI commands for the wheel advisor.

pub mod chat;
pub mod request;

pub use chat::parse_chat;
pub use request::{execute, Request};
