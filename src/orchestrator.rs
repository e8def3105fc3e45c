use crate::conversation::ConversationState;
use crate::error::OrchestrationError;
use crate::models::{Turn, TurnEvent, TurnPhase, TurnReport};
use crate::tasks::{QueryRewriter, SearchClient, Summarizer};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

pub const DEFAULT_RESULT_COUNT: usize = 5;
const EVENT_BUFFER: usize = 64;

/// Runs rewrite, search and summarize for each turn of one conversation.
///
/// History only grows through a successful commit. Any failure discards the working
/// set and returns the orchestrator to [`TurnPhase::Idle`].
pub struct Orchestrator {
    state: ConversationState,
    phase: TurnPhase,
    rewriter: QueryRewriter,
    search: SearchClient,
    summarizer: Summarizer,
    result_count: usize,
    history_tx: watch::Sender<Vec<Turn>>,
}

impl Orchestrator {
    pub fn new(rewriter: QueryRewriter, search: SearchClient, summarizer: Summarizer) -> Self {
        let (history_tx, _) = watch::channel(Vec::new());
        Self {
            state: ConversationState::new(),
            phase: TurnPhase::Idle,
            rewriter,
            search,
            summarizer,
            result_count: DEFAULT_RESULT_COUNT,
            history_tx,
        }
    }

    pub fn with_result_count(mut self, result_count: usize) -> Self {
        self.result_count = result_count;
        self
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn history(&self) -> &[Turn] {
        self.state.history()
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Snapshot of the history, refreshed on every commit.
    pub fn subscribe_history(&self) -> watch::Receiver<Vec<Turn>> {
        self.history_tx.subscribe()
    }

    /// Runs one turn to completion, forwarding progress to `events`.
    ///
    /// Dropping the receiver of `events` cancels the turn.
    #[instrument(skip(self, events))]
    pub async fn submit(
        &mut self,
        query: &str,
        events: &mpsc::Sender<TurnEvent>,
    ) -> Result<TurnReport, OrchestrationError> {
        if query.trim().is_empty() {
            return Err(OrchestrationError::EmptyQuery);
        }

        if self.phase != TurnPhase::Idle {
            warn!("Previous turn was abandoned in phase {:?}", self.phase);
            self.phase = TurnPhase::Idle;
        }
        if let Some(stale) = self.state.begin_turn(query) {
            warn!("Discarded abandoned turn for {:?}", stale.query);
        }

        let start_time = Instant::now();
        let mut task_times: HashMap<String, u64> = HashMap::new();

        let result = match self.run_turn(query, events, &mut task_times).await {
            Ok(search_query) => {
                self.set_phase(TurnPhase::Committing, events).await;
                match self.state.commit().cloned() {
                    Some(turn) => {
                        self.history_tx.send_replace(self.state.history().to_vec());
                        let total_time_ms = start_time.elapsed().as_millis() as u64;
                        info!(
                            "Committed turn {} ({} chars, {} sources) in {}ms",
                            self.state.history().len(),
                            turn.answer.len(),
                            turn.sources.len(),
                            total_time_ms
                        );
                        Ok(TurnReport {
                            turn,
                            search_query,
                            total_time_ms,
                            task_times,
                        })
                    }
                    None => Err(OrchestrationError::NoTurnInFlight),
                }
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            self.set_phase(TurnPhase::Errored, events).await;
            self.state.abort();
            warn!("Turn failed: {}", e);
        }
        self.set_phase(TurnPhase::Idle, events).await;
        result
    }

    async fn run_turn(
        &mut self,
        query: &str,
        events: &mpsc::Sender<TurnEvent>,
        task_times: &mut HashMap<String, u64>,
    ) -> Result<String, OrchestrationError> {
        let search_query = if self.state.history().is_empty() {
            query.to_string()
        } else {
            self.set_phase(TurnPhase::Rewriting, events).await;
            let started = Instant::now();
            let rewritten = self.rewriter.rewrite(self.state.history(), query).await?;
            task_times.insert("rewrite".to_string(), started.elapsed().as_millis() as u64);
            emit(events, TurnEvent::Rewritten(rewritten.clone())).await?;
            rewritten
        };

        self.set_phase(TurnPhase::Searching, events).await;
        let started = Instant::now();
        let results = self.search.search(&search_query, self.result_count).await?;
        task_times.insert("search".to_string(), started.elapsed().as_millis() as u64);
        if results.is_empty() {
            return Err(OrchestrationError::NoResults);
        }
        self.state.set_results(results.clone());
        emit(events, TurnEvent::Sources(results.clone())).await?;

        self.set_phase(TurnPhase::Summarizing, events).await;
        let started = Instant::now();
        let messages = self.state.messages_for(query);
        let mut stream = self.summarizer.summarize(&messages, &results).await?;

        let mut answer = String::new();
        loop {
            let next = tokio::select! {
                next = stream.next() => next,
                _ = events.closed() => return Err(OrchestrationError::Cancelled),
            };
            match next {
                Some(Ok(chunk)) => {
                    answer.push_str(&chunk);
                    self.state.set_partial_answer(&answer);
                    emit(events, TurnEvent::Chunk(chunk)).await?;
                }
                Some(Err(e)) => return Err(e.into()),
                None => break,
            }
        }
        task_times.insert("summarize".to_string(), started.elapsed().as_millis() as u64);

        Ok(search_query)
    }

    async fn set_phase(&mut self, phase: TurnPhase, events: &mpsc::Sender<TurnEvent>) {
        debug!("Turn phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        let _ = events.send(TurnEvent::Phase(phase)).await;
    }
}

async fn emit(events: &mpsc::Sender<TurnEvent>, event: TurnEvent) -> Result<(), OrchestrationError> {
    events
        .send(event)
        .await
        .map_err(|_| OrchestrationError::Cancelled)
}

/// Shared handle to one conversation. At most one turn runs at a time; a submission
/// while a turn is in flight is rejected with [`OrchestrationError::TurnInProgress`].
#[derive(Clone)]
pub struct ConversationHandle {
    id: Uuid,
    orchestrator: Arc<Mutex<Orchestrator>>,
    history: watch::Receiver<Vec<Turn>>,
}

impl ConversationHandle {
    pub fn new(orchestrator: Orchestrator) -> Self {
        let history = orchestrator.subscribe_history();
        Self {
            id: Uuid::new_v4(),
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            history,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Committed turns, oldest first. Does not wait for an in-flight turn.
    pub fn history(&self) -> Vec<Turn> {
        self.history.borrow().clone()
    }

    /// Starts a turn in the background and returns its event stream, which ends
    /// with exactly one [`TurnEvent::Completed`] or [`TurnEvent::Failed`].
    pub fn start_turn(&self, query: &str) -> Result<mpsc::Receiver<TurnEvent>, OrchestrationError> {
        if query.trim().is_empty() {
            return Err(OrchestrationError::EmptyQuery);
        }
        let query = query.to_string();

        let mut orchestrator = self
            .orchestrator
            .clone()
            .try_lock_owned()
            .map_err(|_| OrchestrationError::TurnInProgress)?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let span = info_span!("turn", conversation = %self.id);
        tokio::spawn(
            async move {
                let outcome = orchestrator.submit(&query, &tx).await;
                drop(orchestrator);

                let terminal = match outcome {
                    Ok(report) => TurnEvent::Completed(report),
                    Err(e) => TurnEvent::Failed(e.user_message()),
                };
                let _ = tx.send(terminal).await;
            }
            .instrument(span),
        );

        Ok(rx)
    }
}
