// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Addrag integration tests.
//!
//! Provides mock implementations of the collaborator traits for fast,
//! deterministic, CI-runnable tests without a live model server or vector
//! store.
//!
//! # Components
//!
//! - [`MockChat`] - Scripted chat model with a FIFO response queue
//! - [`MockEmbedder`] - Embedding model returning a fixed vector
//! - [`MockCorpus`] - Corpus with scripted search results and a scan probe
//! - [`InMemoryCandidateStore`] - HashMap-backed candidate persistence
//! - [`InMemoryConversationStore`] - Vec-backed conversation history

pub mod mock_chat;
pub mod mock_corpus;
pub mod mock_embedder;
pub mod mock_stores;

pub use mock_chat::MockChat;
pub use mock_corpus::{MockCorpus, SearchCall};
pub use mock_embedder::MockEmbedder;
pub use mock_stores::{InMemoryCandidateStore, InMemoryConversationStore};
