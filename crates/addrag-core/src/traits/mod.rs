// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the resolution pipeline.
//!
//! Every external dependency of the pipeline (generative model, embedding
//! model, vector corpus, conversation memory, candidate persistence) sits
//! behind one of these seams. Concrete clients are constructed once at
//! startup and injected as `Arc<dyn Trait>`; all traits use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod candidates;
pub mod chat;
pub mod corpus;
pub mod embedding;
pub mod memory;

// Re-export all traits at the traits module level for convenience.
pub use candidates::CandidateStore;
pub use chat::ChatModel;
pub use corpus::AddressCorpus;
pub use embedding::EmbeddingModel;
pub use memory::ConversationStore;
