// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the resolution pipeline and collaborator traits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Query types ---

/// A single address resolution request. Immutable for the life of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressQuery {
    /// Free-text, possibly partial address description.
    pub text: String,
    /// Session for conversation memory; `None` disables history entirely.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Result limit for the whole-text safety-net search.
    pub top_k: usize,
}

impl AddressQuery {
    /// Creates a query with no session and the given result limit.
    pub fn new(text: impl Into<String>, top_k: usize) -> Self {
        Self {
            text: text.into(),
            session_id: None,
            top_k,
        }
    }

    /// Attaches a session id for conversation memory.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

// --- Extraction types ---

/// The fixed set of structured fields the extractor populates, in canonical
/// order. Every [`ExtractedAddress`] carries all of them; a field with no
/// observed value holds an empty sequence.
pub const ADDRESS_FIELDS: [&str; 5] = ["house_low", "locality", "town", "postcode", "region"];

/// Structured field-sets pulled out of free text by the entity extractor.
///
/// Each field holds an ordered sequence of string variants. A sequence longer
/// than one means the model batched several physical addresses into parallel
/// positions; [`ExtractedAddress::split`] transposes those into separate
/// records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedAddress {
    pub house_low: Vec<String>,
    pub locality: Vec<String>,
    pub town: Vec<String>,
    pub postcode: Vec<String>,
    pub region: Vec<String>,
}

impl ExtractedAddress {
    /// Borrows the value sequence for a field by name.
    pub fn field(&self, name: &str) -> Option<&[String]> {
        match name {
            "house_low" => Some(&self.house_low),
            "locality" => Some(&self.locality),
            "town" => Some(&self.town),
            "postcode" => Some(&self.postcode),
            "region" => Some(&self.region),
            _ => None,
        }
    }

    /// Replaces the value sequence for a field by name. Unknown names are
    /// ignored: the field set is fixed.
    pub fn set_field(&mut self, name: &str, values: Vec<String>) {
        match name {
            "house_low" => self.house_low = values,
            "locality" => self.locality = values,
            "town" => self.town = values,
            "postcode" => self.postcode = values,
            "region" => self.region = values,
            _ => {}
        }
    }

    /// Iterates all fields in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        [
            ("house_low", self.house_low.as_slice()),
            ("locality", self.locality.as_slice()),
            ("town", self.town.as_slice()),
            ("postcode", self.postcode.as_slice()),
            ("region", self.region.as_slice()),
        ]
        .into_iter()
    }

    /// Fields that carry at least one value, in canonical order.
    pub fn non_empty_fields(&self) -> Vec<(&'static str, &[String])> {
        self.fields().filter(|(_, v)| !v.is_empty()).collect()
    }

    /// True when no field carries any value.
    pub fn is_empty(&self) -> bool {
        self.fields().all(|(_, v)| v.is_empty())
    }

    /// Length of the longest field sequence.
    pub fn max_variants(&self) -> usize {
        self.fields().map(|(_, v)| v.len()).max().unwrap_or(0)
    }

    /// True when every field sequence has length ≤ 1, i.e. the record
    /// describes at most one physical address per field position.
    pub fn is_split(&self) -> bool {
        self.max_variants() <= 1
    }

    /// Transposes parallel field sequences into one record per position.
    ///
    /// Record *i* takes index *i* of each field's sequence when present and
    /// an empty sequence otherwise; the output length equals the longest
    /// field sequence. Idempotent: a record that is already split comes back
    /// as a single unchanged record.
    pub fn split(&self) -> Vec<ExtractedAddress> {
        if self.is_split() {
            return vec![self.clone()];
        }

        let count = self.max_variants();
        (0..count)
            .map(|i| {
                let mut record = ExtractedAddress::default();
                for (name, values) in self.fields() {
                    let slot = match values.get(i) {
                        Some(v) => vec![v.clone()],
                        None => Vec::new(),
                    };
                    record.set_field(name, slot);
                }
                record
            })
            .collect()
    }
}

// --- Matching types ---

/// Outcome of fuzzy-matching one field's extracted values against the known
/// candidate set for that field.
///
/// `matched_value` is `None` when no candidate met the acceptance threshold;
/// that is an explicit "no constraint" outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub field_name: String,
    /// The extracted value that produced the best score.
    pub original_value: Option<String>,
    /// The accepted corpus value, if any.
    pub matched_value: Option<String>,
    /// Similarity score in [0, 100].
    pub score: f64,
}

impl MatchResult {
    /// A below-threshold result for the given field.
    pub fn unmatched(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            original_value: None,
            matched_value: None,
            score: 0.0,
        }
    }

    /// True when a candidate was accepted.
    pub fn is_accepted(&self) -> bool {
        self.matched_value.is_some()
    }
}

/// The persisted universe of known values for one corpus field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCandidateSet {
    pub field_name: String,
    /// Distinct non-empty values observed across the corpus. Order carries
    /// no meaning.
    pub values: Vec<String>,
}

// --- Retrieval types ---

/// Identifier of a single corpus point. The corpus assigns either numeric or
/// UUID-string ids; both shapes pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{n}"),
            PointId::Uuid(s) => write!(f, "{s}"),
        }
    }
}

/// One ranked row returned by a corpus similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRecord {
    pub id: PointId,
    /// Similarity score as reported by the corpus index; no re-ranking is
    /// applied downstream.
    pub score: f64,
    /// Corpus payload fields (`normalized_address`, `town`, `postcode`, …).
    pub payload: serde_json::Map<String, Value>,
}

impl RetrievalRecord {
    /// The payload's normalized address text, when present and non-empty.
    pub fn normalized_address(&self) -> Option<&str> {
        self.payload
            .get("normalized_address")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One point yielded by a paginated corpus scroll (payload only, no score).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrolledPoint {
    pub id: PointId,
    pub payload: serde_json::Map<String, Value>,
}

/// A page of scrolled points plus the continuation token, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollPage {
    pub points: Vec<ScrolledPoint>,
    /// Offset to pass to the next scroll call; `None` when exhausted.
    pub next_offset: Option<PointId>,
}

// --- Canonical output schema ---

/// A sub-unit within an address (flat, suite, unit, …). Both fields are
/// always populated together; an entry with either side blank is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubUnit {
    pub sub_unit_type: String,
    pub sub_unit_name: String,
}

/// The fixed canonical address schema every successful resolution conforms
/// to. Unpopulated scalar fields are omitted from serialized output, never
/// emitted as null; `sub_units` defaults to an empty sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_number_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_number_last: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_number_last_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_pre_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_post_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_box_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_or_province: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_street_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_street_name: Option<String>,
    /// ISO 639 alpha-2 language code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub sub_units: Vec<SubUnit>,
}

impl CanonicalAddress {
    /// Checks the schema invariants: two-character country and language
    /// codes when present, paired non-empty sub-unit fields, and
    /// `street_number_last_suffix` only alongside `street_number_last`.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref country) = self.country
            && country.chars().count() != 2
        {
            return Err(format!("country must be a two-character code, got `{country}`"));
        }
        if let Some(ref language) = self.language
            && language.chars().count() != 2
        {
            return Err(format!(
                "language must be a two-character code, got `{language}`"
            ));
        }
        for (i, sub_unit) in self.sub_units.iter().enumerate() {
            if sub_unit.sub_unit_type.trim().is_empty() || sub_unit.sub_unit_name.trim().is_empty()
            {
                return Err(format!(
                    "sub_units[{i}] must carry both sub_unit_type and sub_unit_name"
                ));
            }
        }
        if self.street_number_last_suffix.is_some() && self.street_number_last.is_none() {
            return Err(
                "street_number_last_suffix requires street_number_last to be present".to_string(),
            );
        }
        Ok(())
    }
}

/// Fallback record produced when canonicalization fails for a retrieved
/// candidate; the raw corpus text is preserved rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackAddress {
    pub raw_address: String,
    pub error: String,
}

impl FallbackAddress {
    /// Tag used for records the generative model could not parse.
    pub const PARSING_FAILED: &str = "parsing_failed";

    pub fn parsing_failed(raw_address: impl Into<String>) -> Self {
        Self {
            raw_address: raw_address.into(),
            error: Self::PARSING_FAILED.to_string(),
        }
    }
}

/// Canonicalization output for one retrieved candidate: either a
/// schema-conformant address or the raw-address fallback.
///
/// Untagged on the wire; fallback records are distinguished by their
/// required `raw_address`/`error` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedAddress {
    Fallback(FallbackAddress),
    Canonical(CanonicalAddress),
}

// --- Generation types ---

/// A single chat message for a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A tool the generative model may call, described by a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments.
    pub parameters: Value,
}

/// One structured tool invocation emitted by the generative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

/// A generation request against the chat model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Tool schemas offered to the model; empty means plain completion.
    pub tools: Vec<ToolDefinition>,
    pub temperature: f32,
}

impl ChatRequest {
    /// Plain completion request at the given temperature.
    pub fn completion(messages: Vec<ChatMessage>, temperature: f32) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            temperature,
        }
    }

    /// Tool-calling request at the given temperature.
    pub fn with_tools(
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
        temperature: f32,
    ) -> Self {
        Self {
            messages,
            tools,
            temperature,
        }
    }
}

/// A generation response: free text plus any structured tool calls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

// --- Conversation memory types ---

/// One persisted conversation turn for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub session_id: String,
    pub query: String,
    /// The response as persisted: canonical address JSON, fallback record,
    /// or a conversational string.
    pub response: Value,
    /// Similarity score of the persisted result, stored as text.
    pub score: Option<String>,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

// --- Resolution output ---

/// One canonicalized result with the similarity score of the retrieval hit
/// that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAddress {
    pub score: f64,
    pub address: ParsedAddress,
}

/// Retrieval results attributed to the extracted record (or raw query) that
/// produced them. Result sets are never merged across keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedResults {
    /// Stable originating key: `address_1`, `address_2`, … or the raw query
    /// text for the whole-text safety net.
    pub address_key: String,
    pub results: Vec<RetrievalRecord>,
}

/// The generative half of a resolution: canonicalized addresses when the
/// query contained one, a conversational reply otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LlmResponse {
    Conversational(String),
    Addresses(Vec<ScoredAddress>),
}

/// Terminal artifact of the pipeline, handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub llm_response: LlmResponse,
    pub extracted_address_matches: Vec<AttributedResults>,
}
