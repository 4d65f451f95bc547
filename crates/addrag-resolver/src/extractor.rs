// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured address extraction from free text via model tool-calling.
//!
//! The model is offered a single `record_address` tool and asked to emit one
//! call per detected address. Raw output arrives in several shapes (a
//! structured object, a list of objects, or serialized text wrapping
//! either); every shape funnels through one normalization step before
//! multi-address records are transposed into independent single-address
//! records.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use addrag_core::error::AddragError;
use addrag_core::traits::ChatModel;
use addrag_core::types::{
    ADDRESS_FIELDS, ChatMessage, ChatRequest, ExtractedAddress, ToolDefinition,
};

const EXTRACTION_TOOL: &str = "record_address";

/// System prompt for address extraction.
const EXTRACTION_PROMPT: &str = r#"You are an expert address parser.

IMPORTANT RULES:
- The user may mention MULTIPLE ADDRESSES.
- Emit ONE record_address tool call per detected address.
- DO NOT merge different people's addresses.
- Return EACH FIELD as a LIST of strings, even if only one value exists.
- Unknown or missing values must be an empty list [].
- The output must carry exactly these fields: house_low, locality, town, postcode, region.

Example:
User: "I live at 10 King St, Wellington. My brother lives in Palmerston North."
Emit two record_address tool calls:

{"house_low": ["10"], "locality": ["King St"], "town": ["Wellington"], "postcode": [], "region": []}
{"house_low": [], "locality": [], "town": ["Palmerston North"], "postcode": [], "region": []}"#;

/// Pulls structured address fields out of free text with one tool-calling
/// completion.
pub struct EntityExtractor {
    chat: Arc<dyn ChatModel>,
}

impl EntityExtractor {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Extracts zero or more single-address records from the text.
    ///
    /// A provider failure propagates; unparsable model output does not, and
    /// yields zero records so the caller can fall back to unstructured
    /// retrieval.
    pub async fn extract(&self, text: &str) -> Result<Vec<ExtractedAddress>, AddragError> {
        let request = ChatRequest::with_tools(
            vec![
                ChatMessage::system(EXTRACTION_PROMPT),
                ChatMessage::user(text),
            ],
            vec![extraction_tool()],
            0.0,
        );
        let response = self.chat.complete(request).await?;

        let raw: Vec<RawExtraction> = if response.tool_calls.is_empty() {
            // Some models answer in the content channel instead of calling
            // the tool; treat that as serialized output.
            vec![RawExtraction::Text(response.content)]
        } else {
            response
                .tool_calls
                .into_iter()
                .filter(|call| call.name == EXTRACTION_TOOL)
                .map(|call| match call.arguments {
                    Value::Object(map) => RawExtraction::Object(map),
                    Value::Array(items) => RawExtraction::List(items),
                    Value::String(text) => RawExtraction::Text(text),
                    other => RawExtraction::Text(other.to_string()),
                })
                .collect()
        };

        let records: Vec<ExtractedAddress> = raw
            .into_iter()
            .flat_map(RawExtraction::normalize)
            .flat_map(|record| record.split())
            .filter(|record| !record.is_empty())
            .collect();
        debug!(count = records.len(), "entity extraction complete");
        Ok(records)
    }
}

/// The tool schema offered to the model: every address field as an array of
/// strings, all required.
fn extraction_tool() -> ToolDefinition {
    let mut properties = Map::new();
    for field in ADDRESS_FIELDS {
        properties.insert(
            field.to_string(),
            json!({"type": "array", "items": {"type": "string"}}),
        );
    }
    ToolDefinition {
        name: EXTRACTION_TOOL.to_string(),
        description: "Record the structured fields of one address detected in the user's text."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": ADDRESS_FIELDS,
        }),
    }
}

/// The output shapes the extractor accepts from the model.
///
/// All shapes resolve to records through [`RawExtraction::normalize`];
/// nothing downstream branches on shape.
#[derive(Debug, Clone)]
enum RawExtraction {
    Object(Map<String, Value>),
    List(Vec<Value>),
    Text(String),
}

impl RawExtraction {
    /// Resolves any accepted shape into zero or more extracted records.
    fn normalize(self) -> Vec<ExtractedAddress> {
        match self {
            RawExtraction::Object(map) => vec![coerce_record(&map)],
            RawExtraction::List(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(coerce_record(&map)),
                    other => {
                        warn!(element = %other, "skipping non-object extraction element");
                        None
                    }
                })
                .collect(),
            RawExtraction::Text(text) => {
                match extract_json_slice(&text)
                    .and_then(|slice| serde_json::from_str::<Value>(slice).ok())
                {
                    Some(Value::Object(map)) => RawExtraction::Object(map).normalize(),
                    Some(Value::Array(items)) => RawExtraction::List(items).normalize(),
                    Some(_) | None => {
                        warn!("extraction output carried no parsable JSON");
                        debug!(raw = %text, "unparsable extraction output");
                        Vec::new()
                    }
                }
            }
        }
    }
}

/// Coerces one raw object into the fixed field shape: a missing or null
/// field becomes an empty sequence, a scalar becomes a one-element sequence,
/// and non-string elements are stringified. Unknown keys are dropped.
fn coerce_record(map: &Map<String, Value>) -> ExtractedAddress {
    let mut record = ExtractedAddress::default();
    for field in ADDRESS_FIELDS {
        let values = match map.get(field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(stringify)
                .collect(),
            Some(other) => vec![stringify(other)],
        };
        record.set_field(field, values);
    }
    record
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Slices the first JSON object or array out of surrounding prose or
/// markdown fencing. Returns `None` when no bracketed span exists.
pub(crate) fn extract_json_slice(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let object = trimmed.find('{');
    let array = trimmed.find('[');
    let (start, close) = match (object, array) {
        (Some(o), Some(a)) => {
            if a < o {
                (a, ']')
            } else {
                (o, '}')
            }
        }
        (Some(o), None) => (o, '}'),
        (None, Some(a)) => (a, ']'),
        (None, None) => return None,
    };
    let end = trimmed.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&trimmed[start..=end])
}
