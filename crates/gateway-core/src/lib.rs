//! # Gateway Core
//!
//! Core types, traits, and the agent service for the Invoice Agent Gateway.
//!
//! This crate provides:
//! - The [`AgentPlatform`] trait describing the hosted agent capabilities
//! - Conversation and envelope types returned to callers
//! - The [`InvoiceAgentService`] that drives a chat exchange
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod conversation;
pub mod error;
pub mod platform;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use conversation::{
    to_conversation, ChatEnvelope, ChatFailure, ChatReply, ConversationMessage,
};
pub use error::{GatewayError, GatewayResult};
pub use platform::{AgentInfo, AgentPlatform, Run, RunError, RunStatus, Thread, ThreadMessage};
pub use service::InvoiceAgentService;
