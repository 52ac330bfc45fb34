//! Prompt/response log shared by the processing path and the inspection API.
//!
//! Each log assigns its 1-based index while holding its own write lock, so
//! concurrent appenders can never observe the same length and indices stay
//! gap-free. Readers take a shared lock and get a cloned snapshot.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Local};

use chatbridge_types::record::{PromptRecord, ResponseRecord};

#[derive(Debug, Default)]
pub struct ExchangeLog {
    prompts: RwLock<Vec<PromptRecord>>,
    responses: RwLock<Vec<ResponseRecord>>,
}

impl ExchangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted prompt. Returns its index.
    pub fn record_prompt(&self, content: &str) -> u64 {
        let mut prompts = self.prompts.write().unwrap_or_else(PoisonError::into_inner);
        let index = prompts.len() as u64 + 1;
        prompts.push(PromptRecord {
            timestamp: Local::now(),
            content: content.to_string(),
            index,
        });
        index
    }

    /// Record a completed reply and its generation window. Returns its index.
    pub fn record_response(
        &self,
        content: &str,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> u64 {
        let mut responses = self.responses.write().unwrap_or_else(PoisonError::into_inner);
        let index = responses.len() as u64 + 1;
        responses.push(ResponseRecord {
            start_timestamp: start,
            end_timestamp: end,
            content: content.to_string(),
            index,
        });
        index
    }

    /// All prompts in submission order.
    pub fn prompts(&self) -> Vec<PromptRecord> {
        self.prompts.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// All responses in completion order.
    pub fn responses(&self) -> Vec<ResponseRecord> {
        self.responses.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn response_count(&self) -> usize {
        self.responses.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_indices_start_at_one() {
        let log = ExchangeLog::new();
        assert_eq!(log.record_prompt("a"), 1);
        assert_eq!(log.record_prompt("b"), 2);
        let now = Local::now();
        assert_eq!(log.record_response("x", now, now), 1);

        let prompts = log.prompts();
        assert_eq!(prompts[0].content, "a");
        assert_eq!(prompts[1].index, 2);
        assert_eq!(log.response_count(), 1);
    }

    #[test]
    fn test_logs_are_independent() {
        let log = ExchangeLog::new();
        log.record_prompt("only a prompt");
        assert_eq!(log.prompt_count(), 1);
        assert_eq!(log.response_count(), 0);
        assert!(log.responses().is_empty());
    }

    #[test]
    fn test_concurrent_appends_produce_unique_indices() {
        let log = Arc::new(ExchangeLog::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        log.record_prompt(&format!("{t}-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let prompts = log.prompts();
        assert_eq!(prompts.len(), 400);
        for (position, record) in prompts.iter().enumerate() {
            assert_eq!(record.index, position as u64 + 1);
        }
    }

    #[test]
    fn test_response_keeps_generation_window() {
        let log = ExchangeLog::new();
        let start = Local::now();
        let end = start + chrono::Duration::milliseconds(250);
        log.record_response("done", start, end);
        let record = &log.responses()[0];
        assert_eq!(record.start_timestamp, start);
        assert_eq!(record.end_timestamp, end);
    }
}
