// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory-aware canonicalization of retrieved addresses.
//!
//! Each retrieved raw address is rewritten by the generative model into the
//! fixed fielded-address schema, with recent conversation turns rendered
//! into the prompt for context. A failed rewrite does not fail the
//! pipeline: the raw address is kept as a tagged fallback record. The same
//! module owns the conversational reply used when retrieval found nothing
//! address-like in the query.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use addrag_core::error::AddragError;
use addrag_core::traits::{ChatModel, ConversationStore};
use addrag_core::types::{
    CanonicalAddress, ChatMessage, ChatRequest, FallbackAddress, ParsedAddress, RetrievalRecord,
    ScoredAddress,
};

use crate::extractor::extract_json_slice;

/// Rendered in place of history when a session has no prior turns (or the
/// request carries no session at all).
const NO_HISTORY: &str = "No previous conversation.";

/// Most recent physical lines of history kept in a prompt.
const HISTORY_LINE_LIMIT: usize = 10;

/// Prompt for rewriting one retrieved address into the fielded schema.
const CANONICALIZE_PROMPT: &str = r#"You are an address formatting assistant. Parse the address below and return it as a fielded address record.

Conversation History:
{conversation_history}

Use the conversation history to understand context and preferences from previous queries.

Allowed fields (snake_case keys, include only populated ones):
- street_number: number identifying a specific property on a public street
- street_number_suffix: suffix for the street number
- street_number_last: last number in a range of street numbers
- street_number_last_suffix: suffix for street_number_last
- street_pre_direction: direction appearing before the street name
- street_name: name of the street
- street_type: type of street (alley, avenue, boulevard, crescent, drive, highway, lane, terrace, parade, place, tarn, way, wharf)
- street_post_direction: direction appearing after the street name
- po_box_number: post office box number
- locality: area within local authority boundaries
- city: city where the address is located
- postal_code: postal delivery area descriptor
- postal_code_extension: extension used on the postal code
- state_or_province: state or province
- country: two-character ISO 3166 country code
- building_name: well-known building name
- private_street_number: street number on a private street
- private_street_name: private street name
- language: two-character ISO 639 language code
- sub_units: list of entries with sub_unit_type (BERTH, FLAT, PIER, SUITE, SHOP, TOWER, UNIT, ROOM, LEVEL) and sub_unit_name

Mandatory rules:
- country and language MUST be two-letter codes.
- sub_unit_type and sub_unit_name MUST always appear together.
- street_number_last_suffix is allowed only when street_number_last is present.
- Represent range addresses with street_number and street_number_last.
- Put directional indicators in street_pre_direction or street_post_direction as they appear.

Example of correct output:
{
  "street_number": "123",
  "street_name": "Main",
  "street_type": "Street",
  "city": "Anytown",
  "state_or_province": "CA",
  "postal_code": "12345",
  "country": "US",
  "language": "EN",
  "sub_units": [
    {
      "sub_unit_type": "SUITE",
      "sub_unit_name": "200"
    }
  ]
}

CRITICAL:
- Return ONLY the JSON object.
- Use a flat structure with no wrapper object.
- If there are no sub-units, use "sub_units": [].

Address to parse:
{retrieved_address}

Return only the JSON. No markdown. No extra text."#;

/// Prompt for the conversational degrade path.
const CONVERSATIONAL_PROMPT: &str = r#"You are an address assistant. Answer the user in a conversational style.

Conversation History:
{conversation_history}

Correct address:
{retrieved_address}

User query:
{user_query}

Provide your response as a conversation-style answer."#;

/// Rewrites retrieved raw addresses into the canonical schema and produces
/// conversational replies, both with per-session conversation memory.
pub struct Canonicalizer {
    chat: Arc<dyn ChatModel>,
    memory: Arc<dyn ConversationStore>,
    history_turns: usize,
}

impl Canonicalizer {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        memory: Arc<dyn ConversationStore>,
        history_turns: usize,
    ) -> Self {
        Self {
            chat,
            memory,
            history_turns,
        }
    }

    /// Canonicalizes every retrieved record that carries a non-blank
    /// normalized address, in retrieval order.
    ///
    /// Model failures and unparsable output degrade per record to a
    /// raw-address fallback; they never fail the call. The first canonical
    /// result of the batch is persisted as a conversation turn when a
    /// session is present, with its similarity score stored as text.
    pub async fn canonicalize(
        &self,
        records: &[RetrievalRecord],
        user_query: &str,
        session_id: Option<&str>,
    ) -> Result<Vec<ScoredAddress>, AddragError> {
        let history = self.history_for(session_id).await;

        let mut results = Vec::new();
        let mut persisted = false;
        for hit in records {
            let Some(raw) = hit.normalized_address() else {
                debug!(id = %hit.id, "skipping hit without a normalized address");
                continue;
            };
            let score = (hit.score * 10_000.0).round() / 10_000.0;

            let prompt = CANONICALIZE_PROMPT
                .replace("{conversation_history}", &history)
                .replace("{retrieved_address}", raw);
            let request = ChatRequest::completion(vec![ChatMessage::user(prompt)], 0.0);
            let address = match self.chat.complete(request).await {
                Ok(response) => parse_canonical(&response.content, raw),
                Err(error) => {
                    warn!(%error, "canonicalization call failed, keeping raw address");
                    ParsedAddress::Fallback(FallbackAddress::parsing_failed(raw))
                }
            };

            if !persisted
                && let Some(session) = session_id
                && let ParsedAddress::Canonical(ref canonical) = address
            {
                persisted = true;
                self.persist_turn(session, user_query, canonical, score).await;
            }

            results.push(ScoredAddress { score, address });
        }
        Ok(results)
    }

    /// Conversation-style reply for queries that resolved to no addresses.
    ///
    /// The model failure here is the caller's failure: this reply *is* the
    /// response, so a provider error propagates instead of degrading.
    pub async fn conversational(
        &self,
        user_query: &str,
        session_id: Option<&str>,
    ) -> Result<String, AddragError> {
        let history = self.history_for(session_id).await;
        let prompt = CONVERSATIONAL_PROMPT
            .replace("{conversation_history}", &history)
            .replace("{retrieved_address}", "")
            .replace("{user_query}", user_query);
        let request = ChatRequest::completion(vec![ChatMessage::user(prompt)], 0.0);
        let response = self.chat.complete(request).await?;
        let content = response.content.trim().to_string();

        if let Some(session) = session_id {
            let value = Value::String(content.clone());
            if let Err(error) = self
                .memory
                .append(session, user_query, &value, Some("0"))
                .await
            {
                warn!(%error, "conversation write failed, response unaffected");
            }
        }
        Ok(content)
    }

    /// Renders recent session turns for prompting: chronological order,
    /// capped at the last [`HISTORY_LINE_LIMIT`] physical lines. A read
    /// failure degrades to no history rather than failing the request.
    async fn history_for(&self, session_id: Option<&str>) -> String {
        let Some(session) = session_id else {
            return NO_HISTORY.to_string();
        };
        let turns = match self.memory.recent(session, self.history_turns).await {
            Ok(turns) => turns,
            Err(error) => {
                warn!(%error, "conversation read failed, proceeding without history");
                return NO_HISTORY.to_string();
            }
        };
        if turns.is_empty() {
            return NO_HISTORY.to_string();
        }

        let mut lines = Vec::new();
        // recent() returns newest first; prompts read oldest to newest.
        for turn in turns.iter().rev() {
            lines.push(format!("User Query: {}", turn.query));
            lines.push(format!("Response: {}", render_response(&turn.response)));
        }
        let text = lines.join("\n");
        let all: Vec<&str> = text.lines().collect();
        let start = all.len().saturating_sub(HISTORY_LINE_LIMIT);
        all[start..].join("\n")
    }

    async fn persist_turn(
        &self,
        session: &str,
        user_query: &str,
        canonical: &CanonicalAddress,
        score: f64,
    ) {
        match serde_json::to_value(canonical) {
            Ok(response) => {
                if let Err(error) = self
                    .memory
                    .append(session, user_query, &response, Some(&score.to_string()))
                    .await
                {
                    warn!(%error, "conversation write failed, response unaffected");
                }
            }
            Err(error) => {
                warn!(%error, "could not serialize canonical address for history");
            }
        }
    }
}

fn render_response(response: &Value) -> String {
    match response {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses one canonicalization reply, enforcing the schema invariants.
/// Anything short of a valid canonical record keeps the raw address.
fn parse_canonical(content: &str, raw: &str) -> ParsedAddress {
    let Some(slice) = extract_json_slice(content) else {
        warn!("canonicalization output carried no JSON, keeping raw address");
        debug!(raw_output = %content, "canonicalization output");
        return ParsedAddress::Fallback(FallbackAddress::parsing_failed(raw));
    };
    match serde_json::from_str::<CanonicalAddress>(slice) {
        Ok(canonical) => match canonical.validate() {
            Ok(()) => ParsedAddress::Canonical(canonical),
            Err(reason) => {
                warn!(reason, "canonical address failed validation, keeping raw address");
                ParsedAddress::Fallback(FallbackAddress::parsing_failed(raw))
            }
        },
        Err(error) => {
            warn!(%error, "unparsable canonicalization output, keeping raw address");
            debug!(raw_output = %content, "canonicalization output");
            ParsedAddress::Fallback(FallbackAddress::parsing_failed(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addrag_core::types::PointId;
    use addrag_test_utils::{InMemoryConversationStore, MockChat};
    use serde_json::json;

    fn record(id: u64, score: f64, address: &str) -> RetrievalRecord {
        let mut payload = serde_json::Map::new();
        payload.insert("normalized_address".to_string(), json!(address));
        RetrievalRecord {
            id: PointId::Num(id),
            score,
            payload,
        }
    }

    fn canonicalizer_over(
        chat: Arc<MockChat>,
        memory: Arc<InMemoryConversationStore>,
    ) -> Canonicalizer {
        Canonicalizer::new(chat, memory, 3)
    }

    #[tokio::test]
    async fn hits_are_canonicalized_in_retrieval_order() {
        let chat = Arc::new(MockChat::new());
        chat.add_text(r#"{"street_number": "10", "street_name": "King", "city": "Wellington"}"#)
            .await;
        chat.add_text(r#"{"street_number": "45", "street_name": "Queen", "city": "Auckland"}"#)
            .await;
        let canonicalizer = canonicalizer_over(chat, Arc::new(InMemoryConversationStore::new()));

        let records = vec![
            record(1, 0.912_39, "10 King Street, Wellington"),
            record(2, 0.87, "45 Queen Street, Auckland"),
        ];
        let results = canonicalizer
            .canonicalize(&records, "10 king st", None)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, 0.9124);
        assert_eq!(results[1].score, 0.87);
        match &results[0].address {
            ParsedAddress::Canonical(c) => {
                assert_eq!(c.street_number.as_deref(), Some("10"));
                assert_eq!(c.city.as_deref(), Some("Wellington"));
            }
            ParsedAddress::Fallback(_) => panic!("expected canonical"),
        }
    }

    #[tokio::test]
    async fn blank_normalized_address_is_skipped() {
        let chat = Arc::new(MockChat::new());
        chat.add_text(r#"{"city": "Napier"}"#).await;
        let canonicalizer =
            canonicalizer_over(chat.clone(), Arc::new(InMemoryConversationStore::new()));

        let records = vec![record(1, 0.9, "   "), record(2, 0.8, "7 Ocean Ave, Napier")];
        let results = canonicalizer
            .canonicalize(&records, "napier", None)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 0.8);
        assert_eq!(chat.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn prompt_carries_history_and_address() {
        let chat = Arc::new(MockChat::new());
        chat.add_text(r#"{"city": "Wellington"}"#).await;
        let memory = Arc::new(InMemoryConversationStore::new());
        memory
            .append("s-1", "first question", &json!({"city": "Napier"}), None)
            .await
            .unwrap();
        let canonicalizer = canonicalizer_over(chat.clone(), memory);

        canonicalizer
            .canonicalize(
                &[record(1, 0.9, "10 King Street, Wellington")],
                "10 king st",
                Some("s-1"),
            )
            .await
            .unwrap();

        let requests = chat.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.0);
        assert!(requests[0].tools.is_empty());
        let prompt = &requests[0].messages[0].content;
        assert!(prompt.contains("User Query: first question"));
        assert!(prompt.contains(r#"Response: {"city":"Napier"}"#));
        assert!(prompt.contains("10 King Street, Wellington"));
        assert!(!prompt.contains("{retrieved_address}"));
        assert!(!prompt.contains("{conversation_history}"));
    }

    #[tokio::test]
    async fn history_keeps_the_last_three_turns_chronologically() {
        let chat = Arc::new(MockChat::new());
        chat.add_text(r#"{"city": "Wellington"}"#).await;
        let memory = Arc::new(InMemoryConversationStore::new());
        for i in 1..=4 {
            memory
                .append("s-1", &format!("question {i}"), &json!(format!("answer {i}")), None)
                .await
                .unwrap();
        }
        let canonicalizer = canonicalizer_over(chat.clone(), memory);

        canonicalizer
            .canonicalize(&[record(1, 0.9, "10 King St")], "next", Some("s-1"))
            .await
            .unwrap();

        let prompt = chat.requests().await[0].messages[0].content.clone();
        // Oldest turn falls outside the three-turn window.
        assert!(!prompt.contains("question 1"));
        let q2 = prompt.find("User Query: question 2").unwrap();
        let q3 = prompt.find("User Query: question 3").unwrap();
        let q4 = prompt.find("User Query: question 4").unwrap();
        assert!(q2 < q3 && q3 < q4);
        assert!(prompt.contains("Response: answer 4"));
    }

    #[tokio::test]
    async fn garbage_output_falls_back_to_the_raw_address() {
        let chat = Arc::new(MockChat::new());
        chat.add_text("Sorry, I cannot help with that.").await;
        let canonicalizer = canonicalizer_over(chat, Arc::new(InMemoryConversationStore::new()));

        let results = canonicalizer
            .canonicalize(&[record(1, 0.9, "10 King Street, Wellington")], "q", None)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        match &results[0].address {
            ParsedAddress::Fallback(f) => {
                assert_eq!(f.raw_address, "10 King Street, Wellington");
                assert_eq!(f.error, FallbackAddress::PARSING_FAILED);
            }
            ParsedAddress::Canonical(_) => panic!("expected fallback"),
        }
    }

    #[tokio::test]
    async fn invalid_canonical_output_falls_back() {
        let chat = Arc::new(MockChat::new());
        chat.add_text(r#"{"city": "Wellington", "country": "New Zealand"}"#).await;
        let canonicalizer = canonicalizer_over(chat, Arc::new(InMemoryConversationStore::new()));

        let results = canonicalizer
            .canonicalize(&[record(1, 0.9, "10 King St, Wellington, New Zealand")], "q", None)
            .await
            .unwrap();

        assert!(matches!(results[0].address, ParsedAddress::Fallback(_)));
    }

    #[tokio::test]
    async fn provider_failure_keeps_the_raw_address() {
        let chat = Arc::new(MockChat::new());
        chat.add_error("model unavailable").await;
        let canonicalizer = canonicalizer_over(chat, Arc::new(InMemoryConversationStore::new()));

        let results = canonicalizer
            .canonicalize(&[record(1, 0.9, "10 King Street")], "q", None)
            .await
            .unwrap();

        assert!(matches!(results[0].address, ParsedAddress::Fallback(_)));
    }

    #[tokio::test]
    async fn first_canonical_result_is_persisted_once() {
        let chat = Arc::new(MockChat::new());
        chat.add_text(r#"{"street_number": "10", "city": "Wellington"}"#).await;
        chat.add_text(r#"{"street_number": "45", "city": "Auckland"}"#).await;
        let memory = Arc::new(InMemoryConversationStore::new());
        let canonicalizer = canonicalizer_over(chat, memory.clone());

        canonicalizer
            .canonicalize(
                &[
                    record(1, 0.912_39, "10 King Street, Wellington"),
                    record(2, 0.87, "45 Queen Street, Auckland"),
                ],
                "10 king st",
                Some("s-1"),
            )
            .await
            .unwrap();

        let turns = memory.turns().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].query, "10 king st");
        assert_eq!(turns[0].score.as_deref(), Some("0.9124"));
        assert_eq!(turns[0].response["street_number"], json!("10"));
        assert_eq!(turns[0].response["sub_units"], json!([]));
    }

    #[tokio::test]
    async fn fallback_then_canonical_persists_the_canonical() {
        let chat = Arc::new(MockChat::new());
        chat.add_text("not json at all").await;
        chat.add_text(r#"{"street_number": "45", "city": "Auckland"}"#).await;
        let memory = Arc::new(InMemoryConversationStore::new());
        let canonicalizer = canonicalizer_over(chat, memory.clone());

        let results = canonicalizer
            .canonicalize(
                &[
                    record(1, 0.9, "10 King Street, Wellington"),
                    record(2, 0.87, "45 Queen Street, Auckland"),
                ],
                "query",
                Some("s-1"),
            )
            .await
            .unwrap();

        assert!(matches!(results[0].address, ParsedAddress::Fallback(_)));
        assert!(matches!(results[1].address, ParsedAddress::Canonical(_)));

        let turns = memory.turns().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].score.as_deref(), Some("0.87"));
        assert_eq!(turns[0].response["city"], json!("Auckland"));
    }

    #[tokio::test]
    async fn no_session_means_no_history_and_no_persistence() {
        let chat = Arc::new(MockChat::new());
        chat.add_text(r#"{"city": "Wellington"}"#).await;
        let memory = Arc::new(InMemoryConversationStore::new());
        let canonicalizer = canonicalizer_over(chat.clone(), memory.clone());

        canonicalizer
            .canonicalize(&[record(1, 0.9, "10 King St")], "q", None)
            .await
            .unwrap();

        let prompt = chat.requests().await[0].messages[0].content.clone();
        assert!(prompt.contains("No previous conversation."));
        assert!(memory.turns().await.is_empty());
    }

    #[tokio::test]
    async fn memory_write_failure_does_not_fail_the_call() {
        let chat = Arc::new(MockChat::new());
        chat.add_text(r#"{"city": "Wellington"}"#).await;
        let memory = Arc::new(InMemoryConversationStore::new());
        memory.set_fail_appends(true);
        let canonicalizer = canonicalizer_over(chat, memory);

        let results = canonicalizer
            .canonicalize(&[record(1, 0.9, "10 King St")], "q", Some("s-1"))
            .await
            .unwrap();
        assert!(matches!(results[0].address, ParsedAddress::Canonical(_)));
    }

    #[tokio::test]
    async fn memory_read_failure_degrades_to_no_history() {
        let chat = Arc::new(MockChat::new());
        chat.add_text(r#"{"city": "Wellington"}"#).await;
        let memory = Arc::new(InMemoryConversationStore::new());
        memory
            .append("s-1", "earlier", &json!("earlier answer"), None)
            .await
            .unwrap();
        memory.set_fail_reads(true);
        let canonicalizer = canonicalizer_over(chat.clone(), memory);

        canonicalizer
            .canonicalize(&[record(1, 0.9, "10 King St")], "q", Some("s-1"))
            .await
            .unwrap();

        let prompt = chat.requests().await[0].messages[0].content.clone();
        assert!(prompt.contains("No previous conversation."));
        assert!(!prompt.contains("earlier"));
    }

    #[tokio::test]
    async fn conversational_reply_is_persisted_with_zero_score() {
        let chat = Arc::new(MockChat::new());
        chat.add_text("  Happy to help with addresses any time.  ").await;
        let memory = Arc::new(InMemoryConversationStore::new());
        let canonicalizer = canonicalizer_over(chat.clone(), memory.clone());

        let reply = canonicalizer
            .conversational("hello there", Some("s-1"))
            .await
            .unwrap();
        assert_eq!(reply, "Happy to help with addresses any time.");

        let turns = memory.turns().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].query, "hello there");
        assert_eq!(turns[0].score.as_deref(), Some("0"));
        assert_eq!(turns[0].response, json!("Happy to help with addresses any time."));

        let prompt = chat.requests().await[0].messages[0].content.clone();
        assert!(prompt.contains("User query:\nhello there"));
        assert!(!prompt.contains("{user_query}"));
    }

    #[tokio::test]
    async fn conversational_provider_failure_propagates() {
        let chat = Arc::new(MockChat::new());
        chat.add_error("model unavailable").await;
        let canonicalizer =
            canonicalizer_over(chat, Arc::new(InMemoryConversationStore::new()));

        let err = canonicalizer
            .conversational("hello", Some("s-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AddragError::Provider { .. }));
    }

    #[test]
    fn fenced_canonical_output_is_parsed() {
        let content = "```json\n{\"city\": \"Napier\"}\n```";
        match parse_canonical(content, "7 Ocean Ave, Napier") {
            ParsedAddress::Canonical(c) => assert_eq!(c.city.as_deref(), Some("Napier")),
            ParsedAddress::Fallback(_) => panic!("expected canonical"),
        }
    }
}
