//! Threshold-triggered memory compaction.
//!
//! `MemoryManager` keeps two pieces of text: a running `summary` and the raw
//! transcript accumulated since the last compaction. Once the transcript
//! grows past the configured threshold, one summarization call replaces the
//! summary and the summarized text is removed from the transcript. A failed
//! call leaves both untouched.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use chatbridge_types::config::MemoryConfig;
use chatbridge_types::llm::{CompletionRequest, LlmError, Message, MessageRole};
use chatbridge_types::memory::MemorySnapshot;

use crate::llm::box_provider::BoxLlmProvider;

/// Instruction for turning the raw transcript into memory.
const MEMORY_SYSTEM_PROMPT: &str = "This is your earlier conversation with the user. \
Summarize it so it can be kept as your memory.";

/// Instruction for shrinking an oversized summary.
const CONDENSE_SYSTEM_PROMPT: &str = "This is the content of your memory. \
Summarize it so your memory can be kept.";

const SUMMARY_MAX_TOKENS: u32 = 1024;

#[derive(Debug)]
pub struct MemoryManager {
    state: RwLock<MemorySnapshot>,
    transcript_threshold: usize,
    summary_threshold: Option<usize>,
}

impl MemoryManager {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            state: RwLock::new(MemorySnapshot::default()),
            transcript_threshold: config.transcript_threshold,
            summary_threshold: config.summary_threshold,
        }
    }

    /// Append one line (`USER:...` / `YOU:...`) to the raw transcript.
    pub fn record_turn(&self, role: MessageRole, content: &str) {
        let label = match role {
            MessageRole::User => "USER",
            MessageRole::Assistant => "YOU",
            MessageRole::System => "SYSTEM",
        };
        self.write().raw_transcript.push_str(&format!("{label}:{content}\n"));
    }

    /// Whether the transcript has outgrown the compaction threshold.
    pub fn needs_compaction(&self) -> bool {
        self.read().raw_transcript.chars().count() > self.transcript_threshold
    }

    /// Compact the transcript into the summary if it exceeds the threshold.
    ///
    /// Returns `Ok(true)` when a compaction happened and `Ok(false)` when the
    /// transcript was still under the threshold (no call is made).
    #[tracing::instrument(name = "compact_memory", skip(self, provider), fields(model = %model))]
    pub async fn maybe_compact(
        &self,
        provider: &BoxLlmProvider,
        model: &str,
    ) -> Result<bool, LlmError> {
        if !self.needs_compaction() {
            return Ok(false);
        }
        let transcript = self.read().raw_transcript.clone();

        info!(chars = transcript.chars().count(), "Memorizing chats");
        let summary = summarize(provider, model, MEMORY_SYSTEM_PROMPT, &transcript).await?;

        {
            let mut state = self.write();
            state.summary = summary;
            if state.raw_transcript.starts_with(&transcript) {
                state.raw_transcript.replace_range(..transcript.len(), "");
            } else {
                warn!("Transcript changed during compaction, keeping it intact");
            }
        }

        self.condense_if_oversized(provider, model).await;
        Ok(true)
    }

    /// Condense the summary itself once it passes `summary_threshold`.
    async fn condense_if_oversized(&self, provider: &BoxLlmProvider, model: &str) {
        let Some(limit) = self.summary_threshold else {
            return;
        };
        let summary = self.summary();
        if summary.chars().count() <= limit {
            return;
        }

        info!(chars = summary.chars().count(), limit, "Condensing memory");
        match summarize(provider, model, CONDENSE_SYSTEM_PROMPT, &summary).await {
            Ok(condensed) => self.write().summary = condensed,
            Err(e) => warn!(error = %e, "Memory condensation failed, keeping full summary"),
        }
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        self.read().clone()
    }

    pub fn summary(&self) -> String {
        self.read().summary.clone()
    }

    /// Length of the raw transcript in characters.
    pub fn transcript_len(&self) -> usize {
        self.read().raw_transcript.chars().count()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemorySnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemorySnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One non-streaming summarization call. Empty output counts as a failure.
async fn summarize(
    provider: &BoxLlmProvider,
    model: &str,
    instruction: &str,
    content: &str,
) -> Result<String, LlmError> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![
            Message::system(instruction),
            Message::user(content),
        ],
        max_tokens: SUMMARY_MAX_TOKENS,
        temperature: Some(0.0),
        stream: false,
    };

    let response = provider.complete(&request).await?;
    let summary = response.content.trim();
    if summary.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(summary.to_string())
}
