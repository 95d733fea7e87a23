//! # ZoneWatch Core
//!
//! Domain types, traits, and error definitions for the ZoneWatch zone-safety
//! assistant. This crate has **zero framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (LLM/embedding provider, reranker, query
//! engine, tool) is a trait here. Implementations live in their respective
//! crates, so tests can swap in scripted mocks.

pub mod engine;
pub mod error;
pub mod event;
pub mod history;
pub mod message;
pub mod provider;
pub mod rerank;
pub mod tool;
pub mod zone;

// Re-export key types at crate root for ergonomics
pub use engine::QueryEngine;
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use history::{ChatHistory, HistoryEntry, Sender};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{embed_one, EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use rerank::{RerankHit, Reranker};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
pub use zone::{ZoneDocument, ZoneId};
