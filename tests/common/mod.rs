#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};
use web_search_assistant::models::{ConversationMessage, RawSearchRecord, SearchRequest, TurnEvent};
use web_search_assistant::tasks::{QueryRewriter, SearchClient, Summarizer};
use web_search_assistant::tools::{
    ChunkStream, LanguageModel, LlmError, SearchProvider, SearchProviderError,
};
use web_search_assistant::Orchestrator;

pub fn record(title: Option<&str>, url: &str) -> RawSearchRecord {
    RawSearchRecord {
        title: title.map(str::to_string),
        url: Some(url.to_string()),
        text: Some(format!("content of {}", url)),
        summary: Some(format!("summary of {}", url)),
    }
}

pub fn records(n: usize) -> Vec<RawSearchRecord> {
    (1..=n)
        .map(|i| record(Some(format!("Result {}", i).as_str()), &format!("https://site{}.example/page", i)))
        .collect()
}

#[derive(Default)]
pub struct ScriptedSearch {
    responses: Mutex<VecDeque<Result<Vec<RawSearchRecord>, SearchProviderError>>>,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl ScriptedSearch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: Result<Vec<RawSearchRecord>, SearchProviderError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn queries(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.query.clone())
            .collect()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawSearchRecord>, SearchProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SearchProviderError("no scripted response".to_string())))
    }
}

/// One step of a scripted completion stream.
#[derive(Clone)]
pub enum Step {
    Delta(&'static str),
    Wait(Arc<Notify>),
    Done,
    Fail(&'static str),
}

#[derive(Default)]
pub struct ScriptedModel {
    completions: Mutex<VecDeque<Result<String, LlmError>>>,
    streams: Mutex<VecDeque<Result<Vec<Step>, LlmError>>>,
    pub completion_prompts: Mutex<Vec<String>>,
    pub streamed_messages: Mutex<Vec<Vec<ConversationMessage>>>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_completion(&self, reply: Result<String, LlmError>) {
        self.completions.lock().unwrap().push_back(reply);
    }

    pub fn push_stream(&self, script: Result<Vec<Step>, LlmError>) {
        self.streams.lock().unwrap().push_back(script);
    }

    pub fn push_answer(&self, chunks: &[&'static str]) {
        let mut steps: Vec<Step> = chunks.iter().map(|c| Step::Delta(*c)).collect();
        steps.push(Step::Done);
        self.push_stream(Ok(steps));
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
        self.completion_prompts.lock().unwrap().push(prompt.to_string());
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError("no scripted completion".to_string())))
    }

    async fn stream(&self, messages: &[ConversationMessage]) -> Result<ChunkStream, LlmError> {
        self.streamed_messages.lock().unwrap().push(messages.to_vec());
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError("no scripted stream".to_string())))?;

        let (sender, stream) = ChunkStream::channel();
        tokio::spawn(async move {
            for step in script {
                match step {
                    Step::Delta(text) => {
                        if !sender.delta(text).await {
                            return;
                        }
                    }
                    Step::Wait(gate) => gate.notified().await,
                    Step::Done => return sender.done().await,
                    Step::Fail(message) => return sender.fail(message).await,
                }
            }
        });
        Ok(stream)
    }
}

pub fn orchestrator(search: &Arc<ScriptedSearch>, model: &Arc<ScriptedModel>) -> Orchestrator {
    Orchestrator::new(
        QueryRewriter::new(model.clone()),
        SearchClient::new(search.clone()),
        Summarizer::new(model.clone()),
    )
}

pub fn events() -> (mpsc::Sender<TurnEvent>, mpsc::Receiver<TurnEvent>) {
    mpsc::channel(256)
}

pub fn drain(rx: &mut mpsc::Receiver<TurnEvent>) -> Vec<TurnEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

pub fn chunks(events: &[TurnEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            TurnEvent::Chunk(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// Reads a turn's events until its terminal event.
pub async fn until_terminal(rx: &mut mpsc::Receiver<TurnEvent>) -> Vec<TurnEvent> {
    let mut out = Vec::new();
    while let Some(event) = rx.recv().await {
        let terminal = event.is_terminal();
        out.push(event);
        if terminal {
            break;
        }
    }
    out
}
