use crate::core::PositionStack;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved transcript, stored under the transcript name
///
/// `marks` holds the position stack in its serialized form (a JSON array
/// stored as a string), so the stored value is a JSON object nested inside
/// a string field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub text: String,
    pub marks: String,
    /// When the record was written; older records don't carry it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl TranscriptRecord {
    pub fn new(text: &str, marks: &PositionStack) -> Self {
        Self {
            text: text.to_string(),
            marks: marks.serialize(),
            saved_at: Some(Utc::now()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Decode the embedded position stack
    pub fn positions(&self) -> serde_json::Result<PositionStack> {
        let mut stack = PositionStack::new();
        stack.deserialize(&self.marks)?;
        Ok(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_embeds_marks_as_string() {
        let stack = PositionStack::from_positions(vec![0.0, 6.0]);
        let record = TranscriptRecord::new("hello", &stack);
        let json = record.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["text"], "hello");
        assert_eq!(value["marks"], "[0.0,6.0]");
        assert!(value["saved_at"].is_string());
    }

    #[test]
    fn test_record_without_timestamp_loads() {
        let record = TranscriptRecord::from_json(r#"{"text":"abc","marks":"[0,6,12]"}"#).unwrap();
        assert_eq!(record.text, "abc");
        assert!(record.saved_at.is_none());
        assert_eq!(record.positions().unwrap().current_position(), 12.0);
    }

    #[test]
    fn test_record_with_bad_marks() {
        let record = TranscriptRecord::from_json(r#"{"text":"abc","marks":"[oops"}"#).unwrap();
        assert!(record.positions().is_err());
    }
}
