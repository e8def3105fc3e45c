use crate::error::SummarizeError;
use crate::models::{ActionState, ConversationMessage, Role, SearchResult};
use crate::render::citation_marker;
use crate::tools::llm::{ChunkStream, LanguageModel, StreamEvent};
use chrono::NaiveDate;
use futures::{ready, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{info, instrument};

/// Streams a cited answer grounded in a ranked set of search results.
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LanguageModel>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    #[instrument(skip(self, messages, sources), fields(messages = messages.len(), sources = sources.len()))]
    pub async fn summarize(
        &self,
        messages: &[ConversationMessage],
        sources: &[SearchResult],
    ) -> Result<SummaryStream, SummarizeError> {
        let today = chrono::Local::now().date_naive();
        let system_prompt = build_grounding_prompt(sources, today);
        let chat_messages = compose_messages(system_prompt, messages);

        info!("Starting summary stream");
        let stream = self
            .llm
            .stream(&chat_messages)
            .await
            .map_err(|e| SummarizeError::ProviderFailure(e.0))?;

        Ok(SummaryStream::new(stream))
    }

    /// Summarize wrapped in the caller-facing envelope.
    pub async fn summarize_action(
        &self,
        messages: &[ConversationMessage],
        sources: &[SearchResult],
    ) -> ActionState<SummaryStream> {
        match self.summarize(messages, sources).await {
            Ok(stream) => ActionState::success("OpenAI response generated successfully", stream),
            Err(e) => {
                tracing::error!("Error generating response: {}", e);
                ActionState::failure(format!("Failed to generate response: {}", e))
            }
        }
    }
}

/// Puts the grounding prompt first and drops any other system message.
pub fn compose_messages(system_prompt: String, messages: &[ConversationMessage]) -> Vec<ConversationMessage> {
    std::iter::once(ConversationMessage::system(system_prompt))
        .chain(messages.iter().filter(|m| m.role != Role::System).cloned())
        .collect()
}

pub fn build_grounding_prompt(sources: &[SearchResult], today: NaiveDate) -> String {
    let sources_block = sources
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[{}] {}\nURL: {}\nSummary: {}\nContent: {}\n",
                i + 1,
                r.title,
                r.url,
                r.summary,
                r.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful assistant that summarizes search results into concise, readable paragraphs.

Your responsibilities:
- For each major topic or article, write a **separate paragraph**
- Do NOT combine multiple topics into a single paragraph
- You MUST rely on the provided sources where possible
- Use **clear headings** or **numbered entries** (e.g. 1., 2., etc.)
- Always include inline HTML-compatible citations for the source number N using: {citation}
- Return markdown-compatible HTML (e.g. <p>, <strong>, etc.)
Wrap each entry in <p> tags like this: <p><strong>Topic</strong>: Content...<sup>...</sup></p><p>...</p>

Respond in this format:
1. <strong>Headline</strong>: Summary sentence...<sup>...</sup>
2. <strong>Headline</strong>: Another summary...<sup>...</sup>

### SOURCES:
{sources}
Today's date is {date}.
"#,
        citation = citation_marker(1).replace("source-1", "source-N").replace("[1]", "[N]"),
        sources = sources_block,
        date = today.format("%B %-d, %Y"),
    )
}

/// Text chunks of one completion.
///
/// Ends with `None` after the producer's completion marker. A producer failure, or a
/// channel that closes without the marker, yields one `Err` and then ends.
#[derive(Debug)]
pub struct SummaryStream {
    inner: ChunkStream,
    finished: bool,
}

impl SummaryStream {
    pub fn new(inner: ChunkStream) -> Self {
        Self {
            inner,
            finished: false,
        }
    }
}

impl Stream for SummaryStream {
    type Item = Result<String, SummarizeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        let item = match ready!(self.inner.poll_next_unpin(cx)) {
            Some(StreamEvent::Delta(text)) => return Poll::Ready(Some(Ok(text))),
            Some(StreamEvent::Done) => None,
            Some(StreamEvent::Failed(message)) => Some(Err(SummarizeError::StreamFailure(message))),
            None => Some(Err(SummarizeError::StreamFailure(
                "stream closed before completion".to_string(),
            ))),
        };
        self.finished = true;
        Poll::Ready(item)
    }
}
