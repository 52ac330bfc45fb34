//! The bridge session: one conversation, processed one prompt at a time.
//!
//! `ChatSession` is the explicit context object that owns every piece of
//! per-conversation state (history window, memory, logs, live listeners).
//! The processing path goes through [`ChatSession::process`]; the inspection
//! API and the live channel only read the log and memory or register
//! listeners, all of which are safe to do concurrently.
//!
//! Prompts are serialized by the history lock: a second `process` stream
//! waits until the first one has finished or been dropped, so responses are
//! recorded in the order their prompts were submitted.

pub mod prompt;

use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use futures_util::{Stream, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, info};

use chatbridge_types::chat::{Language, Prompt, ResponseChunk};
use chatbridge_types::config::BridgeConfig;
use chatbridge_types::error::{BridgeError, ConfigError};
use chatbridge_types::llm::{CompletionRequest, LlmError, Message, MessageRole};

use crate::chat::history::ChatHistory;
use crate::llm::box_provider::BoxLlmProvider;
use crate::memory::manager::MemoryManager;
use crate::record::log::ExchangeLog;
use crate::relay::StreamRelay;
use crate::relay::listeners::ListenerRegistry;

use self::prompt::compose_prompt;

/// Lazy sequence of reply chunks for one prompt.
pub type ResponseStream<'a> =
    Pin<Box<dyn Stream<Item = Result<ResponseChunk, BridgeError>> + Send + 'a>>;

const WARMUP_PROMPT: &str = "Hello";

/// Per-session request parameters, validated from [`BridgeConfig`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub model: String,
    pub stream: bool,
    pub user_role: MessageRole,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub default_language: Option<Language>,
}

impl SessionSettings {
    pub fn from_config(config: &BridgeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            model: config.model.clone(),
            stream: config.stream,
            user_role: config.user_role()?,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            default_language: config.default_language()?,
        })
    }
}

pub struct ChatSession {
    provider: BoxLlmProvider,
    settings: SessionSettings,
    history: Mutex<ChatHistory>,
    memory: MemoryManager,
    log: ExchangeLog,
    relay: StreamRelay,
}

impl ChatSession {
    /// Build a session, failing fast on any configuration error.
    pub fn new(config: &BridgeConfig, provider: BoxLlmProvider) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut history = ChatHistory::new(config.chat_size);
        if let Some(turn) = config.init_turn()? {
            history.initialize(turn);
        }

        Ok(Self {
            provider,
            settings: SessionSettings::from_config(config)?,
            history: Mutex::new(history),
            memory: MemoryManager::new(&config.memory),
            log: ExchangeLog::new(),
            relay: StreamRelay::new(Arc::new(ListenerRegistry::new(config.listener_buffer))),
        })
    }

    /// Send one throwaway request to confirm the service answers.
    #[tracing::instrument(name = "warmup", skip(self), fields(provider = %self.provider.name()))]
    pub async fn warmup(&self) -> Result<Duration, LlmError> {
        info!("Warming up");
        let start = Instant::now();

        let mut messages: Vec<Message> = self.history.lock().await.initial().cloned().into_iter().collect();
        messages.push(Message::new(self.settings.user_role, WARMUP_PROMPT));
        self.provider.complete(&self.request(messages, false)).await?;

        let elapsed = start.elapsed();
        info!(elapsed_ms = elapsed.as_millis() as u64, "Warmed up");
        Ok(elapsed)
    }

    /// Process one prompt, yielding the reply as chunks.
    ///
    /// In streaming mode chunks are sentence-sized and every raw fragment is
    /// also broadcast to live listeners; otherwise exactly one chunk holding
    /// the whole reply is yielded. The user turn enters the history window
    /// and the transcript before the model is called, so a failed call still
    /// leaves it in memory. The reply is recorded (log, history, transcript)
    /// before the final chunk is handed out.
    pub fn process(&self, prompt: impl Into<Prompt>) -> ResponseStream<'_> {
        let prompt = prompt.into();

        Box::pin(async_stream::try_stream! {
            let mut history = self.history.lock().await;
            let language = prompt.language.or(self.settings.default_language);
            let prompt_index = self.log.record_prompt(&prompt.text);

            self.memory
                .maybe_compact(&self.provider, &self.settings.model)
                .await
                .map_err(BridgeError::from)?;

            let composed = compose_prompt(&self.memory.snapshot(), &prompt.text, language);
            debug!(prompt_index, composed = %composed, "Current prompt");
            let mut messages = history.context_for_next_turn();
            messages.push(Message::new(self.settings.user_role, composed));
            let request = self.request(messages, self.settings.stream);

            history.append(Message::new(self.settings.user_role, prompt.text.clone()));
            self.memory.record_turn(MessageRole::User, &prompt.text);

            let start = Local::now();
            let mut generated = String::new();
            let mut final_chunk = ResponseChunk { text: String::new(), language, is_final: true };

            if self.settings.stream {
                let mut chunks = self.relay.relay(self.provider.stream(request), language);
                while let Some(chunk) = chunks.next().await {
                    let chunk = chunk.map_err(BridgeError::from)?;
                    generated.push_str(&chunk.text);
                    if chunk.is_final {
                        final_chunk = chunk;
                        break;
                    }
                    yield chunk;
                }
            } else {
                let response = self.provider.complete(&request).await.map_err(BridgeError::from)?;
                generated = response.content;
                final_chunk.text = generated.clone();
            }
            let end = Local::now();

            let response_index = self.log.record_response(&generated, start, end);
            history.append(Message::new(MessageRole::Assistant, generated.clone()));
            self.memory.record_turn(MessageRole::Assistant, &generated);
            info!(
                prompt_index,
                response_index,
                chars = generated.chars().count(),
                elapsed_ms = (end - start).num_milliseconds(),
                "Response recorded"
            );

            yield final_chunk;
        })
    }

    pub fn log(&self) -> &ExchangeLog {
        &self.log
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        self.relay.listeners()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn request(&self, messages: Vec<Message>, stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stream,
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{ScriptedProvider, ScriptedReply};
    use chatbridge_types::config::MemoryConfig;

    fn session_with(config: BridgeConfig) -> (ChatSession, ScriptedProvider) {
        let script = ScriptedProvider::new();
        let session = ChatSession::new(&config, BoxLlmProvider::new(script.clone())).unwrap();
        (session, script)
    }

    async fn run(session: &ChatSession, prompt: impl Into<Prompt>) -> Vec<Result<ResponseChunk, BridgeError>> {
        session.process(prompt).collect().await
    }

    #[tokio::test]
    async fn test_non_streaming_hello_end_to_end() {
        let (session, script) = session_with(BridgeConfig::default());
        script.push_text("Hi there! How can I help?");

        let chunks = run(&session, "Hello").await;

        assert_eq!(chunks.len(), 1);
        let chunk = chunks[0].as_ref().unwrap();
        assert_eq!(chunk.text, "Hi there! How can I help?");
        assert!(chunk.is_final);

        let prompts = session.log().prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].content, "Hello");
        let responses = session.log().responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].content, "Hi there! How can I help?");
        assert!(responses[0].start_timestamp <= responses[0].end_timestamp);

        let transcript = session.memory().snapshot().raw_transcript;
        assert!(transcript.contains("USER:Hello"));
        assert!(transcript.contains("YOU:Hi there! How can I help?"));
    }

    #[tokio::test]
    async fn test_default_request_shape() {
        let (session, script) = session_with(BridgeConfig::default());
        script.push_text("first").push_text("second");

        run(&session, "One").await;
        run(&session, "Two").await;

        let requests = script.requests();
        assert_eq!(requests[1].model, "deepseek-chat");
        assert!(!requests[1].stream);
        // chat_size = 1: only the initial turn and the composed prompt.
        assert_eq!(requests[1].messages.len(), 2);
        assert_eq!(requests[1].messages[0].role, MessageRole::System);
        assert_eq!(requests[1].messages[0].content, "You are a helpful AI assistant.");
        let composed = &requests[1].messages[1].content;
        assert!(composed.contains("USER:One\nYOU:first\n"));
        assert!(composed.ends_with("Two"));
    }

    #[tokio::test]
    async fn test_history_window_feeds_request() {
        let (session, script) = session_with(BridgeConfig {
            chat_size: 3,
            ..Default::default()
        });
        script.push_text("first reply").push_text("second reply");

        run(&session, "first question").await;
        run(&session, "second question").await;

        let messages = &script.requests()[1].messages;
        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(messages[1].content, "first question");
        assert_eq!(messages[2].content, "first reply");
    }

    #[tokio::test]
    async fn test_indices_track_prompt_count() {
        let (session, script) = session_with(BridgeConfig::default());
        for i in 0..5 {
            script.push_text(&format!("reply {i}"));
        }
        for i in 0..5 {
            run(&session, format!("prompt {i}")).await;
        }

        let prompt_indices: Vec<u64> = session.log().prompts().iter().map(|p| p.index).collect();
        let response_indices: Vec<u64> = session.log().responses().iter().map(|r| r.index).collect();
        assert_eq!(prompt_indices, vec![1, 2, 3, 4, 5]);
        assert_eq!(response_indices, vec![1, 2, 3, 4, 5]);
        assert_eq!(session.log().responses()[4].content, "reply 4");
    }

    #[tokio::test]
    async fn test_streaming_chunks_and_broadcast() {
        let (session, script) = session_with(BridgeConfig {
            stream: true,
            ..Default::default()
        });
        let fragments = ["It is", " sunny.", " Take a", " hat. Enjoy"];
        script.push_fragments(&fragments);
        let mut listener = session.listeners().register();

        let chunks: Vec<ResponseChunk> =
            run(&session, "Weather?").await.into_iter().map(Result::unwrap).collect();

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["It is sunny. ", "Take a hat. ", "Enjoy"]);
        assert!(chunks.last().unwrap().is_final);
        assert_eq!(session.log().responses()[0].content, fragments.concat());
        assert!(script.requests()[0].stream);

        for fragment in fragments {
            assert_eq!(listener.receiver.recv().await.unwrap(), fragment);
        }
    }

    #[tokio::test]
    async fn test_streaming_failure_keeps_user_turn() {
        let (session, script) = session_with(BridgeConfig {
            stream: true,
            ..Default::default()
        });
        script.push(ScriptedReply::FragmentsThenError(
            vec!["Halfway. ".into(), "There".into()],
            LlmError::Stream("reset".into()),
        ));

        let chunks = run(&session, "Go").await;

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].as_ref().unwrap().text, "Halfway. ");
        let err = chunks[1].as_ref().unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(session.log().prompt_count(), 1);
        assert_eq!(session.log().response_count(), 0);
        assert_eq!(session.memory().snapshot().raw_transcript, "USER:Go\n");
    }

    #[tokio::test]
    async fn test_model_failure_is_surfaced() {
        let (session, script) = session_with(BridgeConfig::default());
        script.push_error(LlmError::Timeout(60));
        script.push_text("recovered");

        let chunks = run(&session, "Hello").await;
        assert_eq!(chunks.len(), 1);
        assert!(matches!(chunks[0], Err(BridgeError::Llm(LlmError::Timeout(60)))));
        assert_eq!(session.log().response_count(), 0);
        // The prompt survives the failed call.
        assert_eq!(session.memory().snapshot().raw_transcript, "USER:Hello\n");

        // Retrying works, and the earlier attempt is part of the context.
        let chunks = run(&session, "Hello").await;
        assert_eq!(chunks[0].as_ref().unwrap().text, "recovered");
        assert!(script.requests()[1].messages[1].content.contains("USER:Hello\n"));
        assert_eq!(session.log().prompt_count(), 2);
        assert_eq!(session.log().response_count(), 1);
        assert_eq!(
            session.memory().snapshot().raw_transcript,
            "USER:Hello\nUSER:Hello\nYOU:recovered\n"
        );
    }

    #[tokio::test]
    async fn test_failed_turn_stays_in_history_window() {
        let (session, script) = session_with(BridgeConfig {
            chat_size: 3,
            ..Default::default()
        });
        script.push_error(LlmError::Overloaded("busy".into()));
        script.push_text("ok");

        run(&session, "first").await;
        run(&session, "second").await;

        let messages = &script.requests()[1].messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[1].content, "first");
    }

    #[tokio::test]
    async fn test_compaction_runs_before_next_request() {
        let (session, script) = session_with(BridgeConfig {
            memory: MemoryConfig {
                transcript_threshold: 20,
                summary_threshold: None,
            },
            ..Default::default()
        });
        script
            .push_text("A fairly long answer to the first question.")
            .push_text("User asked a question and got an answer.")
            .push_text("Second answer.");

        run(&session, "First question").await;
        run(&session, "Second question").await;

        let requests = script.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].messages[1].content.starts_with("USER:First question\n"));
        let composed = &requests[2].messages[1].content;
        assert!(composed.contains("User asked a question and got an answer."));
        assert!(!composed.contains("USER:First question"));

        let snapshot = session.memory().snapshot();
        assert_eq!(snapshot.summary, "User asked a question and got an answer.");
        assert_eq!(snapshot.raw_transcript, "USER:Second question\nYOU:Second answer.\n");
    }

    #[tokio::test]
    async fn test_compaction_failure_keeps_transcript() {
        let (session, script) = session_with(BridgeConfig {
            memory: MemoryConfig {
                transcript_threshold: 10,
                summary_threshold: None,
            },
            ..Default::default()
        });
        script.push_text("Long enough reply").push_error(LlmError::Timeout(60));

        run(&session, "Question").await;
        let before = session.memory().snapshot();
        let chunks = run(&session, "Follow-up").await;

        assert!(matches!(chunks[0], Err(BridgeError::Llm(LlmError::Timeout(60)))));
        assert_eq!(session.memory().snapshot(), before);
        assert_eq!(script.call_count(), 2);
        assert_eq!(session.log().prompt_count(), 2);
        assert_eq!(session.log().response_count(), 1);
    }

    #[tokio::test]
    async fn test_language_flows_into_prompt_and_chunks() {
        let (session, script) = session_with(BridgeConfig::default());
        script.push_text("Bonjour !");

        let chunks = run(&session, Prompt::new("Salut").with_language(Language::French)).await;

        assert_eq!(chunks[0].as_ref().unwrap().language, Some(Language::French));
        assert!(script.requests()[0].messages[1].content.contains("answer in french"));
    }

    #[tokio::test]
    async fn test_default_language_applies() {
        let (session, script) = session_with(BridgeConfig {
            default_language: Some("ja-auto".to_string()),
            ..Default::default()
        });
        script.push_text("こんにちは");

        let chunks = run(&session, "Hi").await;

        assert_eq!(chunks[0].as_ref().unwrap().language, Some(Language::Japanese));
        assert!(script.requests()[0].messages[1].content.contains("answer in japanese"));
    }

    #[tokio::test]
    async fn test_warmup_sends_hello() {
        let (session, script) = session_with(BridgeConfig::default());
        script.push_text("Hello!");

        session.warmup().await.unwrap();

        let request = &script.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content, "Hello");
        assert_eq!(session.log().prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_warmup_failure_propagates() {
        let (session, script) = session_with(BridgeConfig::default());
        script.push_error(LlmError::AuthenticationFailed);
        assert!(matches!(session.warmup().await, Err(LlmError::AuthenticationFailed)));
    }

    #[test]
    fn test_missing_initial_prompt_fails_fast() {
        let config = BridgeConfig {
            init_chat_prompt: String::new(),
            ..Default::default()
        };
        let result = ChatSession::new(&config, BoxLlmProvider::new(ScriptedProvider::new()));
        assert!(matches!(result, Err(ConfigError::MissingInitialPrompt)));
    }

    #[tokio::test]
    async fn test_prompts_are_processed_one_at_a_time() {
        let (session, script) = session_with(BridgeConfig::default());
        script.push_text("a").push_text("b");
        let session = Arc::new(session);

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.process("A").collect::<Vec<_>>().await })
        };
        let second = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.process("B").collect::<Vec<_>>().await })
        };
        first.await.unwrap();
        second.await.unwrap();

        let prompts = session.log().prompts();
        let responses = session.log().responses();
        assert_eq!(responses.len(), 2);
        // Replies were consumed in processing order, and prompt indices follow it.
        assert_eq!(responses[0].content, "a");
        assert_eq!(responses[1].content, "b");
        for (prompt, response) in prompts.iter().zip(responses.iter()) {
            assert_eq!(prompt.index, response.index);
            assert!(prompt.timestamp <= response.end_timestamp);
        }
    }
}
