//! Documents, visibility directives and query predicates

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Visibility directive for a store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// The write does not return until the document is readable.
    Immediate,
    /// The document becomes readable after a bounded, unspecified delay.
    #[default]
    Deferred,
}

impl Visibility {
    /// Value of the `refresh` query parameter for REST document stores.
    pub fn refresh_param(&self) -> &'static str {
        match self {
            Visibility::Immediate => "wait_for",
            Visibility::Deferred => "false",
        }
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, Visibility::Immediate)
    }
}

/// Conjunction of exact-match terms used to look a document up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    terms: Vec<(String, Value)>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact-match term. Dotted field names address nested objects.
    pub fn term(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.terms.push((field.into(), value.into()));
        self
    }

    pub fn terms(&self) -> &[(String, Value)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether `document` satisfies every term.
    pub fn matches(&self, document: &Value) -> bool {
        self.terms.iter().all(|(field, expected)| {
            field
                .split('.')
                .try_fold(document, |node, segment| node.get(segment))
                .is_some_and(|actual| actual == expected)
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, value)) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}={}", field, value)?;
        }
        Ok(())
    }
}

/// Acknowledgement of a successful store write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub collection: String,
    pub key: String,
    /// Monotonic per-key version; the first write of a key is version 1.
    pub version: u64,
    pub visibility: Visibility,
}

/// Per-agent hints payload.
///
/// Arbitrary JSON object; only `agentId` is interpreted. The handler
/// overwrites `agentId` with the caller's path identity before persisting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HintsDocument {
    #[serde(rename = "agentId", default, deserialize_with = "lenient_agent_id")]
    pub agent_id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Callers may send any JSON under `agentId`; it is replaced before persisting.
fn lenient_agent_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

impl HintsDocument {
    /// Decode a request body. Anything other than a JSON object is rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Scope the document to `agent_id`.
    pub fn tagged(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_visibility_refresh_param() {
        assert_eq!(Visibility::Immediate.refresh_param(), "wait_for");
        assert_eq!(Visibility::Deferred.refresh_param(), "false");
        assert_eq!(Visibility::default(), Visibility::Deferred);
    }

    #[test]
    fn test_predicate_matches_all_terms() {
        let doc = json!({"api_key_id": "key-1", "active": true});

        assert!(Predicate::new().term("api_key_id", "key-1").matches(&doc));
        assert!(Predicate::new()
            .term("api_key_id", "key-1")
            .term("active", true)
            .matches(&doc));
        assert!(!Predicate::new()
            .term("api_key_id", "key-1")
            .term("active", false)
            .matches(&doc));
        assert!(!Predicate::new().term("missing", "x").matches(&doc));
    }

    #[test]
    fn test_predicate_nested_field() {
        let doc = json!({"agent": {"id": "agent-7"}});
        assert!(Predicate::new().term("agent.id", "agent-7").matches(&doc));
        assert!(!Predicate::new().term("agent.name", "agent-7").matches(&doc));
    }

    #[test]
    fn test_predicate_display() {
        let predicate = Predicate::new().term("api_key_id", "key-1").term("active", true);
        assert_eq!(predicate.to_string(), "api_key_id=\"key-1\" AND active=true");
    }

    #[test]
    fn test_empty_predicate_matches_everything() {
        assert!(Predicate::new().matches(&json!({"a": 1})));
    }

    #[test]
    fn test_hints_document_keeps_unknown_fields() {
        let doc = HintsDocument::from_slice(br#"{"agentId":"x","hints":{"k8s":true}}"#).unwrap();
        assert_eq!(doc.agent_id, "x");
        assert_eq!(doc.fields.get("hints"), Some(&json!({"k8s": true})));
    }

    #[test]
    fn test_hints_document_tagging_overwrites_agent_id() {
        let doc = HintsDocument::from_slice(br#"{"agentId":""}"#)
            .unwrap()
            .tagged("agent-42");
        let value: Value = serde_json::from_slice(&doc.to_vec().unwrap()).unwrap();
        assert_eq!(value, json!({"agentId": "agent-42"}));
    }

    #[test]
    fn test_hints_document_accepts_non_string_agent_id() {
        let doc = HintsDocument::from_slice(br#"{"agentId":7,"v":1}"#)
            .unwrap()
            .tagged("agent-7");
        assert_eq!(doc.agent_id, "agent-7");
        assert_eq!(doc.fields.get("v"), Some(&json!(1)));
    }

    #[test]
    fn test_hints_document_rejects_non_objects() {
        assert!(HintsDocument::from_slice(b"[1,2,3]").is_err());
        assert!(HintsDocument::from_slice(b"\"text\"").is_err());
        assert!(HintsDocument::from_slice(b"{\"agentId\":").is_err());
        assert!(HintsDocument::from_slice(b"").is_err());
    }
}
