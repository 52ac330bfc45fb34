//! Scripted in-memory provider for tests.
//!
//! Each call pops the next [`ScriptedReply`] off a shared queue. Clones share
//! the queue and the request journal, so a test can keep one handle while the
//! session owns another.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chatbridge_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, StreamEvent, Usage,
};

use super::provider::{EventStream, LlmProvider};

/// One canned answer to a provider call.
#[derive(Debug)]
pub enum ScriptedReply {
    /// A complete reply. Streamed as a single fragment.
    Text(String),
    /// A reply delivered as these fragments. Concatenated for `complete`.
    Fragments(Vec<String>),
    /// Some fragments followed by a mid-stream failure.
    FragmentsThenError(Vec<String>, LlmError),
    /// The call fails outright.
    Error(LlmError),
}

#[derive(Default)]
struct Script {
    replies: VecDeque<ScriptedReply>,
    requests: Vec<CompletionRequest>,
}

/// An [`LlmProvider`] that replays a fixed script.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for a later call.
    pub fn push(&self, reply: ScriptedReply) -> &Self {
        self.lock().replies.push_back(reply);
        self
    }

    pub fn push_text(&self, text: &str) -> &Self {
        self.push(ScriptedReply::Text(text.to_string()))
    }

    pub fn push_fragments(&self, fragments: &[&str]) -> &Self {
        self.push(ScriptedReply::Fragments(
            fragments.iter().map(|f| f.to_string()).collect(),
        ))
    }

    pub fn push_error(&self, error: LlmError) -> &Self {
        self.push(ScriptedReply::Error(error))
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_reply(&self, request: CompletionRequest) -> ScriptedReply {
        let mut script = self.lock();
        script.requests.push(request);
        script.replies.pop_front().unwrap_or_else(|| {
            ScriptedReply::Error(LlmError::Provider {
                message: "script exhausted".to_string(),
            })
        })
    }
}

fn response(content: String) -> CompletionResponse {
    CompletionResponse {
        id: "scripted".to_string(),
        content,
        model: "scripted-model".to_string(),
        stop_reason: StopReason::EndTurn,
        usage: Usage::default(),
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match self.next_reply(request.clone()) {
            ScriptedReply::Text(text) => Ok(response(text)),
            ScriptedReply::Fragments(fragments) => Ok(response(fragments.concat())),
            ScriptedReply::FragmentsThenError(_, error) | ScriptedReply::Error(error) => Err(error),
        }
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let (fragments, failure) = match self.next_reply(request) {
            ScriptedReply::Text(text) => (vec![text], None),
            ScriptedReply::Fragments(fragments) => (fragments, None),
            ScriptedReply::FragmentsThenError(fragments, error) => (fragments, Some(error)),
            ScriptedReply::Error(error) => (Vec::new(), Some(error)),
        };

        Box::pin(async_stream::try_stream! {
            yield StreamEvent::Connected;
            for text in fragments {
                yield StreamEvent::TextDelta { text };
            }
            if let Some(error) = failure {
                Err(error)?;
            }
            yield StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn };
            yield StreamEvent::Done;
        })
    }
}
