// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Addrag address resolution service.
//!
//! Two stores share one database file: [`HistoryStore`] for per-session
//! conversation turns and [`FieldCandidateStore`] for per-field candidate
//! vocabularies. The schema is bootstrapped on open; see [`database`].

pub mod candidates;
pub mod database;
pub mod history;

pub use candidates::FieldCandidateStore;
pub use database::{open_database, open_in_memory};
pub use history::HistoryStore;
