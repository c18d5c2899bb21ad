//! Turns raw model output into a report whose numbers come from the engine.
//!
//! The model's text is reduced to the outermost `{ ... }` region, parsed as a
//! JSON object, and accepted only when it carries both `ghosting_probability`
//! and `match_score`. Accepted documents keep every model-authored field and
//! key order; the three numeric fields are overwritten with engine scores.
//! The `analyses.result_json` column is `json`, so the stored text keeps that order.

use serde_json::{Map, Value};

use crate::analysis::models::EngineScores;

pub const REQUIRED_KEYS: &[&str] = &["ghosting_probability", "match_score"];

/// A model-authored report that passed the shape check.
#[derive(Debug, Clone, PartialEq)]
pub struct AiCandidate(Map<String, Value>);

/// Slice from the first `{` to the last `}` inclusive, trimmed.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].trim())
}

impl AiCandidate {
    /// Returns `None` when the text holds no JSON object or the object lacks a required key.
    pub fn parse(text: &str) -> Option<Self> {
        let region = extract_json_object(text)?;
        match serde_json::from_str::<Value>(region).ok()? {
            Value::Object(map) if REQUIRED_KEYS.iter().all(|k| map.contains_key(*k)) => {
                Some(Self(map))
            }
            _ => None,
        }
    }

    /// Overwrites the numeric fields in place, appending any that are missing.
    pub fn merge_scores(self, scores: EngineScores) -> Value {
        let mut doc = self.0;
        doc.insert(
            "ghosting_probability".to_string(),
            Value::from(scores.ghosting_probability),
        );
        doc.insert("match_score".to_string(), Value::from(scores.match_score));
        doc.insert(
            "ats_readability_score".to_string(),
            Value::from(scores.ats_readability_score),
        );
        Value::Object(doc)
    }
}
