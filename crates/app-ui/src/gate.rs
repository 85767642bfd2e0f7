//! Route gate
//!
//! Keeps the user on the screens their session allows. The gate looks at
//! three inputs (whether a user is signed in, whether onboarding has been
//! completed and which route group is showing) and redirects with a
//! navigation `replace`:
//!
//! | Signed in | Onboarding done | Current group        | Redirect      |
//! |-----------|-----------------|----------------------|---------------|
//! | yes       | yes             | auth or onboarding   | home          |
//! | yes       | no              | anything but onboarding | onboarding |
//! | no        | any             | anything but auth    | auth          |
//!
//! Nothing is decided while the session is still loading.

use app_state::{OnboardingStore, SessionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::navigation::{Navigator, Route, RouteSegment};

/// Where the gate considers the user to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Session still loading
    #[default]
    Unknown,
    /// No signed-in user
    NeedsAuth,
    /// Signed in, onboarding not completed
    NeedsOnboarding,
    /// Signed in and onboarded
    Authenticated,
}

/// Inputs to a gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateInput {
    /// Session is still loading
    pub is_loading: bool,
    /// A user is signed in
    pub signed_in: bool,
    /// Onboarding flag reads as completed
    pub onboarding_completed: bool,
    /// Group of the route currently showing
    pub segment: RouteSegment,
}

/// Outcome of a gate decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    /// Resolved state
    pub state: GateState,
    /// Route to replace the current one with, if any
    pub redirect: Option<Route>,
}

impl GateDecision {
    fn stay(state: GateState) -> Self {
        Self { state, redirect: None }
    }

    fn redirect(state: GateState, route: Route) -> Self {
        Self { state, redirect: Some(route) }
    }
}

/// Decide where the user belongs
pub fn decide(input: &GateInput) -> GateDecision {
    if input.is_loading {
        return GateDecision::stay(GateState::Unknown);
    }

    match (input.signed_in, input.onboarding_completed) {
        (true, true) => match input.segment {
            RouteSegment::Auth | RouteSegment::Onboarding => {
                GateDecision::redirect(GateState::Authenticated, Route::Home)
            }
            _ => GateDecision::stay(GateState::Authenticated),
        },
        (true, false) => match input.segment {
            RouteSegment::Onboarding => GateDecision::stay(GateState::NeedsOnboarding),
            _ => GateDecision::redirect(GateState::NeedsOnboarding, Route::Onboarding),
        },
        (false, _) => match input.segment {
            RouteSegment::Auth => GateDecision::stay(GateState::NeedsAuth),
            _ => GateDecision::redirect(GateState::NeedsAuth, Route::Auth),
        },
    }
}

/// Applies gate decisions to a navigator
#[derive(Clone)]
pub struct RouteGate {
    session: Arc<SessionStore>,
    onboarding: Arc<OnboardingStore>,
}

impl RouteGate {
    /// Create a gate over the session and onboarding flag
    pub fn new(session: Arc<SessionStore>, onboarding: Arc<OnboardingStore>) -> Self {
        Self { session, onboarding }
    }

    /// Read the current inputs, decide and apply any redirect
    pub async fn evaluate(&self, navigator: &Navigator) -> GateDecision {
        let snapshot = self.session.snapshot();
        if snapshot.is_loading {
            return GateDecision::stay(GateState::Unknown);
        }

        let onboarding_completed = if snapshot.is_signed_in() {
            self.onboarding.is_completed().await
        } else {
            false
        };

        let input = GateInput {
            is_loading: false,
            signed_in: snapshot.is_signed_in(),
            onboarding_completed,
            segment: navigator.segment(),
        };
        let decision = decide(&input);

        if let Some(target) = &decision.redirect {
            tracing::info!(state = ?decision.state, to = %target, "route gate redirect");
            navigator.replace(target.clone());
        }

        decision
    }

    /// Re-evaluate on every session, onboarding or route change
    ///
    /// The task runs until the handle is stopped or dropped.
    pub fn spawn(self, navigator: Navigator) -> GateHandle {
        let (state_tx, state_rx) = watch::channel(GateState::Unknown);

        let task = tokio::spawn(async move {
            let mut session_rx = self.session.subscribe();
            let mut onboarding_rx = self.onboarding.subscribe();
            let mut route_rx = navigator.subscribe();

            loop {
                session_rx.borrow_and_update();
                onboarding_rx.borrow_and_update();
                route_rx.borrow_and_update();

                let decision = self.evaluate(&navigator).await;
                state_tx.send_replace(decision.state);

                let changed = tokio::select! {
                    r = session_rx.changed() => r,
                    r = onboarding_rx.changed() => r,
                    r = route_rx.changed() => r,
                };
                if changed.is_err() {
                    tracing::debug!("route gate inputs closed");
                    break;
                }
            }
        });

        GateHandle { task, state: state_rx }
    }
}

/// Running gate task
pub struct GateHandle {
    task: JoinHandle<()>,
    state: watch::Receiver<GateState>,
}

impl GateHandle {
    /// Latest state decided by the gate
    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Subscribe to gate state changes
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.clone()
    }

    /// Stop re-evaluating
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Check if the gate task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for GateHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
