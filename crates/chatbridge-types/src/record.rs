//! Prompt and response log records exposed by the inspection API.
//!
//! Both records are append-only: the index is assigned by the log at append
//! time and a record is never mutated afterwards.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A prompt as it was submitted to the processing path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub timestamp: DateTime<Local>,
    pub content: String,
    /// 1-based position in the prompt log.
    pub index: u64,
}

/// A complete generated reply with its generation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub start_timestamp: DateTime<Local>,
    pub end_timestamp: DateTime<Local>,
    pub content: String,
    /// 1-based position in the response log.
    pub index: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_record_field_names() {
        let record = PromptRecord {
            timestamp: Local::now(),
            content: "Hello".to_string(),
            index: 1,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("timestamp").is_some());
        assert_eq!(json["content"], "Hello");
        assert_eq!(json["index"], 1);
    }

    #[test]
    fn test_response_record_field_names() {
        let now = Local::now();
        let record = ResponseRecord {
            start_timestamp: now,
            end_timestamp: now,
            content: "Hi there".to_string(),
            index: 3,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("start_timestamp").is_some());
        assert!(json.get("end_timestamp").is_some());
        assert_eq!(json["index"], 3);
    }
}
