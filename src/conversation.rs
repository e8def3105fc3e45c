use crate::models::{ConversationMessage, SearchResult, Turn};

/// Working set of the one turn currently in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentTurn {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub partial_answer: String,
}

/// Committed history plus the in-flight working set.
///
/// History is append-only. A turn only reaches it through [`ConversationState::commit`].
#[derive(Debug, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
    current: Option<CurrentTurn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    pub fn current(&self) -> Option<&CurrentTurn> {
        self.current.as_ref()
    }

    pub fn is_turn_in_flight(&self) -> bool {
        self.current.is_some()
    }

    /// Starts a fresh working set. Returns the working set it replaced, if any.
    pub fn begin_turn(&mut self, query: &str) -> Option<CurrentTurn> {
        self.current.replace(CurrentTurn {
            query: query.to_string(),
            ..CurrentTurn::default()
        })
    }

    pub fn set_results(&mut self, results: Vec<SearchResult>) {
        if let Some(current) = self.current.as_mut() {
            current.results = results;
        }
    }

    /// Overwrites the partial answer with everything received so far.
    pub fn set_partial_answer(&mut self, answer: &str) {
        if let Some(current) = self.current.as_mut() {
            current.partial_answer.clear();
            current.partial_answer.push_str(answer);
        }
    }

    /// Folds the working set into a new history entry.
    pub fn commit(&mut self) -> Option<&Turn> {
        let current = self.current.take()?;
        self.turns.push(Turn {
            question: current.query,
            answer: current.partial_answer,
            sources: current.results,
        });
        self.turns.last()
    }

    /// Drops the working set, leaving history untouched.
    pub fn abort(&mut self) -> Option<CurrentTurn> {
        self.current.take()
    }

    /// Prior turns as alternating user/assistant messages followed by `query`.
    pub fn messages_for(&self, query: &str) -> Vec<ConversationMessage> {
        let mut messages = Vec::with_capacity(self.turns.len() * 2 + 1);
        for turn in &self.turns {
            messages.push(ConversationMessage::user(turn.question.clone()));
            messages.push(ConversationMessage::assistant(turn.answer.clone()));
        }
        messages.push(ConversationMessage::user(query));
        messages
    }
}
