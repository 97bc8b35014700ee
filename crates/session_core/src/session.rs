//! Session state and its pure transition function.
//!
//! The store is deliberately dumb: it is total over every event in
//! every state and never performs IO. Gating rules (no advance while
//! loading, no advance without a session) live in the orchestrator.

use shared::{
    domain::{Phase, SessionId},
    protocol::{
        EventEntry, HistorySeries, MetricsSnapshot, PolicyPatch, PolicySet, Scores, TurnResult,
    },
};

/// The single client-side aggregate for one play-through.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub session_id: Option<SessionId>,
    pub turn: u32,
    pub max_turns: u32,
    /// Locally staged configuration; may diverge from the last
    /// server-acknowledged set between an edit and the next submit.
    pub policies: PolicySet,
    pub snapshot: Option<MetricsSnapshot>,
    pub history: HistorySeries,
    /// Event batch from the most recent turn only.
    pub latest_events: Vec<EventEntry>,
    /// Append-only log across the whole session; the server never
    /// returns this cumulatively, it is accumulated here.
    pub all_events: Vec<EventEntry>,
    pub scores: Option<Scores>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Start,
            session_id: None,
            turn: 0,
            max_turns: 20,
            policies: PolicySet::default(),
            snapshot: None,
            history: HistorySeries::default(),
            latest_events: Vec::new(),
            all_events: Vec::new(),
            scores: None,
            is_loading: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A network operation started.
    Loading,
    /// `create_session` succeeded; prior session data is discarded.
    SessionCreated(TurnResult),
    /// `advance_turn` succeeded for the current session.
    TurnAdvanced(TurnResult),
    /// The player staged a local policy change.
    PolicyEdited(PolicyPatch),
    /// A network operation failed with a normalized message.
    Failed(String),
    /// Back to the canonical defaults, identity included.
    Reset,
}

impl SessionState {
    /// Applies one event, returning the next state. Referentially
    /// transparent: `self` is never mutated.
    #[must_use]
    pub fn apply(&self, event: SessionEvent) -> SessionState {
        match event {
            SessionEvent::Loading => SessionState {
                is_loading: true,
                error: None,
                ..self.clone()
            },
            SessionEvent::SessionCreated(result) => {
                SessionState::default().with_turn_result(result)
            }
            SessionEvent::TurnAdvanced(result) => self.with_turn_result(result),
            SessionEvent::PolicyEdited(patch) => SessionState {
                policies: patch.apply_to(&self.policies),
                ..self.clone()
            },
            SessionEvent::Failed(message) => SessionState {
                is_loading: false,
                error: Some(message),
                ..self.clone()
            },
            SessionEvent::Reset => SessionState::default(),
        }
    }

    /// Merges one server turn result: turn-scoped fields are replaced
    /// (history wholesale, the server sends the full series), the
    /// event batch is appended to the cumulative log, and the
    /// server-echoed policy set becomes authoritative.
    fn with_turn_result(&self, result: TurnResult) -> SessionState {
        let mut all_events = self.all_events.clone();
        all_events.extend(result.events.iter().cloned());
        SessionState {
            phase: if result.is_finished {
                Phase::Finished
            } else {
                Phase::Playing
            },
            session_id: Some(result.game_id),
            turn: result.turn,
            max_turns: result.max_turns,
            policies: result.policies,
            snapshot: Some(result.state),
            history: result.history,
            latest_events: result.events,
            all_events,
            scores: result.scores,
            is_loading: false,
            error: None,
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
