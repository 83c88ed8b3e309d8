//! # Aura Core
//!
//! Domain types, traits, and error definitions for the Aura multi-agent
//! backend. This crate has **no framework dependencies**: it defines the
//! model every other crate implements against.
//!
//! ## Collaborators as traits
//!
//! The orchestration core talks to three external collaborators, each
//! defined as a trait here:
//! - [`Provider`]: the LLM Gateway (prompt in, text or tool calls out)
//! - [`Tool`]: side-effecting capabilities such as web search
//! - [`KnowledgeStore`]: ingestion and retrieval for grounding
//!
//! Implementations live in their respective crates, so tests can swap in
//! scripted stand-ins.

pub mod decision;
pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use decision::{NavigationDirective, RouterDecision, RouterRequest, StructuredResult};
pub use error::{IngestError, KnowledgeError, ProviderError, ToolError};
pub use knowledge::{KnowledgeQuery, KnowledgeRecord, KnowledgeStore};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use tool::{CapabilityRegistry, Tool, ToolCall, ToolResult};
