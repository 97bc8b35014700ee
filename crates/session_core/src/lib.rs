//! Client-side session core for the policy-simulation game.
//!
//! [`GameClient`] sequences the two remote operations (create
//! session, advance turn), merges local policy edits with
//! server-confirmed state, and exposes the resulting [`SessionState`]
//! to presentation code through a watch channel. All state changes go
//! through the pure reducer in [`session`]; the network side is
//! behind the [`BackendGateway`] trait so the whole flow is testable
//! against fakes.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use shared::{
    domain::Difficulty,
    protocol::PolicyPatch,
};

pub mod gateway;
pub mod session;

pub use gateway::{BackendGateway, GatewayError, HttpBackendGateway};
pub use session::{SessionEvent, SessionState};

pub struct GameClient {
    gateway: Arc<dyn BackendGateway>,
    inner: Mutex<ClientInner>,
    states: watch::Sender<SessionState>,
}

struct ClientInner {
    session: SessionState,
    /// Bumped on every reset. Responses for requests issued under an
    /// older epoch are discarded instead of re-seeding a session the
    /// player already walked away from.
    epoch: u64,
}

impl GameClient {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Arc<Self> {
        let (states, _) = watch::channel(SessionState::default());
        Arc::new(Self {
            gateway,
            inner: Mutex::new(ClientInner {
                session: SessionState::default(),
                epoch: 0,
            }),
            states,
        })
    }

    /// Convenience constructor over the real HTTP gateway.
    pub fn connect(base_url: impl Into<String>) -> Arc<Self> {
        Self::new(Arc::new(HttpBackendGateway::new(base_url)))
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.states.borrow().clone()
    }

    /// Receiver that yields every state the store passes through.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.states.subscribe()
    }

    /// Starts a new session. On success the store is re-seeded from
    /// the server's initial turn result; on failure the phase stays
    /// at start with the error message recorded.
    pub async fn start_game(&self, difficulty: Difficulty, seed: Option<i64>) {
        let Some(epoch) = self.begin_operation("start_game").await else {
            return;
        };
        match self.gateway.create_session(difficulty, seed).await {
            Ok(result) => {
                info!(
                    session_id = %result.game_id,
                    turn = result.turn,
                    max_turns = result.max_turns,
                    "session created"
                );
                self.settle(epoch, SessionEvent::SessionCreated(result))
                    .await;
            }
            Err(err) => {
                warn!("create session failed: {err}");
                self.settle(epoch, SessionEvent::Failed(err.to_string()))
                    .await;
            }
        }
    }

    /// Submits the currently staged policy set for one simulation
    /// step. Deliberately a silent no-op before a session exists.
    /// A finished session is not gated here; rejecting the verb at
    /// that point is the presentation layer's call.
    pub async fn advance_turn(&self) {
        let (epoch, session_id, policies) = {
            let mut inner = self.inner.lock().await;
            let Some(session_id) = inner.session.session_id.clone() else {
                debug!("advance_turn ignored: no session established");
                return;
            };
            if inner.session.is_loading {
                debug!("advance_turn ignored: an operation is already in flight");
                return;
            }
            inner.session = inner.session.apply(SessionEvent::Loading);
            self.states.send_replace(inner.session.clone());
            (inner.epoch, session_id, inner.session.policies.clone())
        };
        match self.gateway.advance_turn(&session_id, &policies).await {
            Ok(result) => {
                info!(
                    session_id = %session_id,
                    turn = result.turn,
                    finished = result.is_finished,
                    events = result.events.len(),
                    "turn advanced"
                );
                self.settle(epoch, SessionEvent::TurnAdvanced(result)).await;
            }
            Err(err) => {
                warn!(session_id = %session_id, "advance turn failed: {err}");
                self.settle(epoch, SessionEvent::Failed(err.to_string()))
                    .await;
            }
        }
    }

    /// Stages a local policy change. Never touches the network; the
    /// accumulated set goes out with the next [`Self::advance_turn`].
    pub async fn edit_policy(&self, patch: PolicyPatch) {
        let mut inner = self.inner.lock().await;
        inner.session = inner.session.apply(SessionEvent::PolicyEdited(patch));
        self.states.send_replace(inner.session.clone());
    }

    /// Discards the whole session, identity included, and bumps the
    /// epoch so in-flight responses cannot resurrect it. The
    /// server-side session is abandoned best-effort in the
    /// background.
    pub async fn reset_game(&self) {
        let abandoned = {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            let session_id = inner.session.session_id.clone();
            inner.session = inner.session.apply(SessionEvent::Reset);
            self.states.send_replace(inner.session.clone());
            session_id
        };
        if let Some(session_id) = abandoned {
            let gateway = Arc::clone(&self.gateway);
            tokio::spawn(async move {
                if let Err(err) = gateway.abandon_session(&session_id).await {
                    debug!(session_id = %session_id, "abandon after reset failed: {err}");
                }
            });
        }
    }

    /// Marks the store loading and captures the epoch the operation
    /// runs under. Returns `None` when another operation is already
    /// in flight.
    async fn begin_operation(&self, verb: &str) -> Option<u64> {
        let mut inner = self.inner.lock().await;
        if inner.session.is_loading {
            debug!("{verb} ignored: an operation is already in flight");
            return None;
        }
        inner.session = inner.session.apply(SessionEvent::Loading);
        self.states.send_replace(inner.session.clone());
        Some(inner.epoch)
    }

    /// Applies a terminal transition unless a reset happened since
    /// the operation was issued.
    async fn settle(&self, issued_epoch: u64, event: SessionEvent) {
        let mut inner = self.inner.lock().await;
        if inner.epoch != issued_epoch {
            debug!(
                issued_epoch,
                current_epoch = inner.epoch,
                "discarding response issued before reset"
            );
            return;
        }
        inner.session = inner.session.apply(event);
        self.states.send_replace(inner.session.clone());
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
