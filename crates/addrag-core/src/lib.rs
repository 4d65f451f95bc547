// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Addrag address resolution service.
//!
//! This crate provides the error type, domain types, corpus filter model,
//! and collaborator traits used throughout the Addrag workspace. Concrete
//! clients (Ollama, Qdrant, SQLite) and the pipeline itself live in sibling
//! crates and depend only on the seams defined here.

pub mod error;
pub mod filter;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AddragError;
pub use filter::{CorpusFilter, FieldCondition};
pub use types::{
    ADDRESS_FIELDS, AddressQuery, AttributedResults, CanonicalAddress, ChatMessage, ChatRequest,
    ChatResponse, ConversationTurn, ExtractedAddress, FallbackAddress, FieldCandidateSet,
    LlmResponse, MatchResult, ParsedAddress, PointId, Resolution, RetrievalRecord, ScoredAddress,
    ScrollPage, ScrolledPoint, SubUnit, ToolCall, ToolDefinition,
};

// Re-export all collaborator traits at crate root.
pub use traits::{AddressCorpus, CandidateStore, ChatModel, ConversationStore, EmbeddingModel};
