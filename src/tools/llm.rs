use crate::models::{ConversationMessage, Role};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use rig::completion::{AssistantContent, CompletionError, Message, Prompt};
use rig::prelude::*;
use rig::providers::openai;
use rig::streaming::StreamingChat;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

const CHUNK_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmError(pub String);

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LLM error: {}", self.0)
    }
}

impl std::error::Error for LlmError {}

/// What the token producer pushes to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Failed(String),
}

/// Producer half of a chunk stream.
#[derive(Debug, Clone)]
pub struct ChunkSender {
    tx: mpsc::Sender<StreamEvent>,
}

impl ChunkSender {
    /// Returns false once the consumer has gone away.
    pub async fn delta(&self, text: impl Into<String>) -> bool {
        self.tx.send(StreamEvent::Delta(text.into())).await.is_ok()
    }

    pub async fn done(self) {
        let _ = self.tx.send(StreamEvent::Done).await;
    }

    pub async fn fail(self, message: impl Into<String>) {
        let _ = self.tx.send(StreamEvent::Failed(message.into())).await;
    }
}

/// Consumer half: a finite, non-restartable sequence of stream events.
/// Dropping it tells the producer to stop.
#[derive(Debug)]
pub struct ChunkStream {
    rx: mpsc::Receiver<StreamEvent>,
}

impl ChunkStream {
    pub fn channel() -> (ChunkSender, ChunkStream) {
        let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
        (ChunkSender { tx }, ChunkStream { rx })
    }
}

impl Stream for ChunkStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Single-shot completion returning the whole text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;

    /// Starts a streamed completion. An error here means nothing was produced.
    async fn stream(&self, messages: &[ConversationMessage]) -> Result<ChunkStream, LlmError>;
}

pub struct OpenAiModel {
    client: openai::Client,
    completion_model: String,
    streaming_model: String,
}

impl OpenAiModel {
    pub fn new(api_key: &str, completion_model: &str, streaming_model: &str) -> Self {
        Self {
            client: openai::Client::new(api_key),
            completion_model: completion_model.to_string(),
            streaming_model: streaming_model.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    #[instrument(skip(self, system, prompt), fields(model = %self.completion_model))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let agent = self
            .client
            .agent(&self.completion_model)
            .preamble(system)
            .build();
        let prompt = prompt.to_string();
        agent
            .prompt(&prompt)
            .await
            .map_err(|e| LlmError(format!("Prompt error: {}", e)))
    }

    #[instrument(skip(self, messages), fields(model = %self.streaming_model, messages = messages.len()))]
    async fn stream(&self, messages: &[ConversationMessage]) -> Result<ChunkStream, LlmError> {
        let chat = ChatRequest::from_messages(messages)?;
        let agent = self
            .client
            .agent(&self.streaming_model)
            .preamble(&chat.preamble)
            .build();

        let response = agent
            .stream_chat(chat.prompt, chat.history)
            .await
            .map_err(|e| LlmError(format!("Streaming request failed: {}", e)))?;

        let (sender, stream) = ChunkStream::channel();
        tokio::spawn(forward_completion(response, sender));
        Ok(stream)
    }
}

/// A conversation split the way a rig agent takes it.
#[derive(Debug, PartialEq)]
struct ChatRequest {
    preamble: String,
    history: Vec<Message>,
    prompt: String,
}

impl ChatRequest {
    /// System messages become the preamble; the final user message is the prompt.
    fn from_messages(messages: &[ConversationMessage]) -> Result<Self, LlmError> {
        let (last, earlier) = match messages.split_last() {
            Some((last, earlier)) if last.role == Role::User => (last, earlier),
            _ => return Err(LlmError("conversation must end with a user message".to_string())),
        };

        let mut preamble = Vec::new();
        let mut history = Vec::with_capacity(earlier.len());
        for message in earlier {
            match message.role {
                Role::System => preamble.push(message.content.as_str()),
                Role::User => history.push(Message::user(message.content.clone())),
                Role::Assistant => history.push(Message::assistant(message.content.clone())),
            }
        }

        Ok(Self {
            preamble: preamble.join("\n\n"),
            history,
            prompt: last.content.clone(),
        })
    }
}

/// Forwards a rig completion stream into a chunk channel.
/// The provider stream ending is the completion marker.
async fn forward_completion<S>(mut completion: S, sender: ChunkSender)
where
    S: Stream<Item = Result<AssistantContent, CompletionError>> + Unpin,
{
    while let Some(item) = completion.next().await {
        match item {
            Ok(AssistantContent::Text(text)) => {
                if text.text.is_empty() {
                    continue;
                }
                if !sender.delta(text.text).await {
                    debug!("Chunk consumer dropped, closing completion stream");
                    return;
                }
            }
            Ok(AssistantContent::ToolCall(call)) => {
                warn!("Ignoring unexpected tool call {}", call.function.name);
            }
            Err(e) => {
                sender.fail(format!("Completion stream error: {}", e)).await;
                return;
            }
        }
    }
    sender.done().await;
}
