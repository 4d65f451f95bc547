// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed store for per-field candidate vocabularies.
//!
//! One row per address field, holding the distinct payload values observed
//! in the corpus as a JSON array. Rows are replaced wholesale on refresh.

use addrag_core::error::AddragError;
use addrag_core::traits::CandidateStore;
use addrag_core::types::FieldCandidateSet;
use async_trait::async_trait;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Persistent candidate vocabulary store backed by SQLite.
pub struct FieldCandidateStore {
    conn: Connection,
}

impl FieldCandidateStore {
    /// Creates a new candidate store wrapping an existing connection.
    ///
    /// The connection must already have the schema applied (see
    /// [`crate::database::open_database`]).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CandidateStore for FieldCandidateStore {
    async fn get(&self, field_name: &str) -> Result<Option<FieldCandidateSet>, AddragError> {
        let field = field_name.to_string();
        self.conn
            .call(move |conn| {
                let row: Option<String> = conn
                    .query_row(
                        "SELECT values_json FROM field_candidates WHERE field_name = ?1",
                        rusqlite::params![field],
                        |row| row.get(0),
                    )
                    .optional()?;

                let set = match row {
                    Some(raw) => {
                        let values: Vec<String> =
                            serde_json::from_str(&raw).map_err(|e| {
                                rusqlite::Error::FromSqlConversionFailure(
                                    0,
                                    rusqlite::types::Type::Text,
                                    Box::new(e),
                                )
                            })?;
                        Some(FieldCandidateSet {
                            field_name: field,
                            values,
                        })
                    }
                    None => None,
                };
                Ok(set)
            })
            .await
            .map_err(crate::database::map_tr_err)
    }

    async fn put(&self, set: &FieldCandidateSet) -> Result<(), AddragError> {
        let field = set.field_name.clone();
        let values_json =
            serde_json::to_string(&set.values).map_err(|e| AddragError::Storage {
                source: Box::new(e),
            })?;
        let updated_at = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        let count = set.values.len();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO field_candidates (field_name, values_json, updated_at) \
                     VALUES (?1, ?2, ?3) \
                     ON CONFLICT(field_name) DO UPDATE SET \
                     values_json = excluded.values_json, updated_at = excluded.updated_at",
                    rusqlite::params![field, values_json, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;

        debug!(field_name = %set.field_name, count, "candidate set persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_in_memory;

    async fn test_store() -> FieldCandidateStore {
        FieldCandidateStore::new(open_in_memory().await.unwrap())
    }

    fn sample_set(field: &str, values: &[&str]) -> FieldCandidateSet {
        FieldCandidateSet {
            field_name: field.to_string(),
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = test_store().await;

        let set = sample_set("town", &["Wellington", "Auckland", "Dunedin"]);
        store.put(&set).await.unwrap();

        let loaded = store.get("town").await.unwrap().unwrap();
        assert_eq!(loaded.field_name, "town");
        assert_eq!(loaded.values, vec!["Wellington", "Auckland", "Dunedin"]);
    }

    #[tokio::test]
    async fn get_missing_field_returns_none() {
        let store = test_store().await;
        assert!(store.get("postcode").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_previous_values() {
        let store = test_store().await;

        store.put(&sample_set("region", &["Otago"])).await.unwrap();
        store
            .put(&sample_set("region", &["Otago", "Southland"]))
            .await
            .unwrap();

        let loaded = store.get("region").await.unwrap().unwrap();
        assert_eq!(loaded.values, vec!["Otago", "Southland"]);
    }

    #[tokio::test]
    async fn fields_are_independent() {
        let store = test_store().await;

        store.put(&sample_set("town", &["Napier"])).await.unwrap();
        store.put(&sample_set("postcode", &["4110"])).await.unwrap();

        assert_eq!(
            store.get("town").await.unwrap().unwrap().values,
            vec!["Napier"]
        );
        assert_eq!(
            store.get("postcode").await.unwrap().unwrap().values,
            vec!["4110"]
        );
    }

    #[tokio::test]
    async fn empty_value_list_round_trips() {
        let store = test_store().await;

        store.put(&sample_set("locality", &[])).await.unwrap();
        let loaded = store.get("locality").await.unwrap().unwrap();
        assert!(loaded.values.is_empty());
    }
}
