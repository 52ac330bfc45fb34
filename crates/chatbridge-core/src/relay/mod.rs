//! Streaming relay: provider fragments in, sentence chunks out.
//!
//! Every non-empty text fragment is pushed to the live listeners first and
//! then fed to a [`sentence::SentenceBuffer`]. Complete sentences are
//! yielded as they appear; when the provider stream ends, whatever is still
//! buffered is yielded as the final chunk, terminated or not.

pub mod listeners;
pub mod sentence;

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};

use chatbridge_types::chat::{Language, ResponseChunk};
use chatbridge_types::llm::{LlmError, StreamEvent};

use crate::llm::provider::EventStream;

use self::listeners::ListenerRegistry;
use self::sentence::SentenceBuffer;

/// Boxed stream of reply chunks produced by [`StreamRelay::relay`].
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ResponseChunk, LlmError>> + Send + 'static>>;

#[derive(Debug, Clone)]
pub struct StreamRelay {
    listeners: Arc<ListenerRegistry>,
}

impl StreamRelay {
    pub fn new(listeners: Arc<ListenerRegistry>) -> Self {
        Self { listeners }
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        &self.listeners
    }

    /// Turn a provider event stream into sentence chunks.
    ///
    /// Each call starts with an empty buffer. A provider error ends the
    /// chunk stream with that error; fragments already broadcast stay sent.
    pub fn relay(&self, events: EventStream, language: Option<Language>) -> ChunkStream {
        let listeners = Arc::clone(&self.listeners);

        Box::pin(async_stream::try_stream! {
            let mut events = events;
            let mut sentences = SentenceBuffer::new();

            while let Some(event) = events.next().await {
                match event? {
                    StreamEvent::TextDelta { text } => {
                        if text.is_empty() {
                            continue;
                        }
                        listeners.broadcast(&text);
                        for sentence in sentences.push(&text) {
                            yield ResponseChunk { text: sentence, language, is_final: false };
                        }
                    }
                    StreamEvent::Done => break,
                    StreamEvent::Connected
                    | StreamEvent::MessageDelta { .. }
                    | StreamEvent::Usage(_) => {}
                }
            }

            yield ResponseChunk { text: sentences.finish(), language, is_final: true };
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(fragments: &[&str]) -> EventStream {
        let mut items: Vec<Result<StreamEvent, LlmError>> = vec![Ok(StreamEvent::Connected)];
        items.extend(fragments.iter().map(|f| {
            Ok(StreamEvent::TextDelta {
                text: f.to_string(),
            })
        }));
        items.push(Ok(StreamEvent::Done));
        Box::pin(futures_util::stream::iter(items))
    }

    async fn collect(stream: ChunkStream) -> Vec<Result<ResponseChunk, LlmError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_chunks_concatenate_to_input() {
        let relay = StreamRelay::new(Arc::new(ListenerRegistry::new(64)));
        let fragments = ["The sky", " is blue.", " Grass is", " green. And", " that is all"];

        let chunks = collect(relay.relay(events(&fragments), None)).await;
        let texts: Vec<String> = chunks.into_iter().map(|c| c.unwrap().text).collect();

        assert_eq!(texts.concat(), fragments.concat());
        assert_eq!(texts.last().unwrap(), "And that is all");
    }

    #[tokio::test]
    async fn test_final_chunk_is_flagged_and_tagged() {
        let relay = StreamRelay::new(Arc::new(ListenerRegistry::new(64)));
        let chunks = collect(relay.relay(events(&["One. ", "Two"]), Some(Language::English))).await;
        let chunks: Vec<ResponseChunk> = chunks.into_iter().map(Result::unwrap).collect();

        assert_eq!(chunks.len(), 2);
        assert!(!chunks[0].is_final);
        assert!(chunks[1].is_final);
        assert!(chunks.iter().all(|c| c.language == Some(Language::English)));
    }

    #[tokio::test]
    async fn test_fragments_are_broadcast_raw() {
        let registry = Arc::new(ListenerRegistry::new(64));
        let mut listener = registry.register();
        let relay = StreamRelay::new(Arc::clone(&registry));

        let _ = collect(relay.relay(events(&["Hel", "", "lo."]), None)).await;

        assert_eq!(listener.receiver.recv().await.unwrap(), "Hel");
        assert_eq!(listener.receiver.recv().await.unwrap(), "lo.");
        assert!(listener.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dead_listener_does_not_interrupt_relay() {
        let registry = Arc::new(ListenerRegistry::new(64));
        drop(registry.register());
        let mut alive = registry.register();
        let relay = StreamRelay::new(Arc::clone(&registry));

        let chunks = collect(relay.relay(events(&["Still. ", "Going"]), None)).await;

        assert!(chunks.iter().all(Result::is_ok));
        assert_eq!(registry.len(), 1);
        assert_eq!(alive.receiver.recv().await.unwrap(), "Still. ");
        assert_eq!(alive.receiver.recv().await.unwrap(), "Going");
    }

    #[tokio::test]
    async fn test_provider_error_ends_stream() {
        let relay = StreamRelay::new(Arc::new(ListenerRegistry::new(64)));
        let items: Vec<Result<StreamEvent, LlmError>> = vec![
            Ok(StreamEvent::TextDelta { text: "Partial. ".into() }),
            Ok(StreamEvent::TextDelta { text: "More".into() }),
            Err(LlmError::Stream("connection reset".into())),
        ];
        let chunks = collect(relay.relay(Box::pin(futures_util::stream::iter(items)), None)).await;

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].as_ref().unwrap().text, "Partial. ");
        assert!(matches!(chunks[1], Err(LlmError::Stream(_))));
    }

    #[tokio::test]
    async fn test_empty_stream_yields_empty_final_chunk() {
        let relay = StreamRelay::new(Arc::new(ListenerRegistry::new(64)));
        let chunks = collect(relay.relay(events(&[]), None)).await;
        assert_eq!(chunks.len(), 1);
        let chunk = chunks[0].as_ref().unwrap();
        assert!(chunk.is_final);
        assert!(chunk.text.is_empty());
    }
}
