use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::RecommendationBatch;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DashboardTab {
    Overview,
    Recommendations,
}

impl Default for DashboardTab {
    fn default() -> Self {
        DashboardTab::Overview
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum RecommendationLoadState {
    Idle,
    Loading,
    Ready { batch: RecommendationBatch },
    Failed { reason: String },
}

impl Default for RecommendationLoadState {
    fn default() -> Self {
        RecommendationLoadState::Idle
    }
}

impl RecommendationLoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, RecommendationLoadState::Ready { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RecommendationLoadState::Loading)
    }

    pub fn batch(&self) -> Option<&RecommendationBatch> {
        match self {
            RecommendationLoadState::Ready { batch } => Some(batch),
            _ => None,
        }
    }
}

/// Identifies one entry into the recommendations tab. Completions carrying
/// any other token are stale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub session_id: String,
    pub active_tab: DashboardTab,
    pub recommendations: RecommendationLoadState,
    pending: Option<RequestToken>,
}

impl ActiveSession {
    pub fn pending(&self) -> Option<RequestToken> {
        self.pending
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn(ActiveSession),
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    StartGeneration(RequestToken),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// Read-only view of the session for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub is_authenticated: bool,
    pub active_tab: DashboardTab,
    pub session_id: Option<String>,
}

/// Owns the session state and the request counter. All transitions are total.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: SessionState,
    /// Survives logout so tokens from an earlier session never match a later one.
    next_request: u64,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self {
            state: SessionState::LoggedOut,
            next_request: 0,
        }
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn(_))
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match &self.state {
            SessionState::LoggedIn(session) => Some(session),
            SessionState::LoggedOut => None,
        }
    }

    pub fn view(&self) -> SessionView {
        match &self.state {
            SessionState::LoggedOut => SessionView {
                is_authenticated: false,
                active_tab: DashboardTab::default(),
                session_id: None,
            },
            SessionState::LoggedIn(session) => SessionView {
                is_authenticated: true,
                active_tab: session.active_tab,
                session_id: Some(session.session_id.clone()),
            },
        }
    }

    pub fn recommendations(&self) -> RecommendationLoadState {
        self.active()
            .map(|session| session.recommendations.clone())
            .unwrap_or_default()
    }

    /// Returns `false` when a session is already active.
    pub fn login(&mut self) -> bool {
        if self.is_authenticated() {
            return false;
        }
        self.state = SessionState::LoggedIn(ActiveSession {
            session_id: Uuid::new_v4().to_string(),
            active_tab: DashboardTab::Overview,
            recommendations: RecommendationLoadState::Idle,
            pending: None,
        });
        true
    }

    /// Drops the whole dashboard state and hands back the request that was in
    /// flight, if any.
    pub fn logout(&mut self) -> Option<RequestToken> {
        match std::mem::replace(&mut self.state, SessionState::LoggedOut) {
            SessionState::LoggedIn(session) => session.pending,
            SessionState::LoggedOut => None,
        }
    }

    pub fn select_tab(&mut self, tab: DashboardTab) -> Effect {
        let next_request = &mut self.next_request;
        let SessionState::LoggedIn(session) = &mut self.state else {
            return Effect::None;
        };

        match (session.active_tab, tab) {
            (DashboardTab::Overview, DashboardTab::Overview) => Effect::None,
            (DashboardTab::Recommendations, DashboardTab::Overview) => {
                // The in-flight request, if any, can no longer apply.
                session.active_tab = DashboardTab::Overview;
                session.pending = None;
                Effect::None
            }
            (DashboardTab::Overview, DashboardTab::Recommendations) => {
                session.active_tab = DashboardTab::Recommendations;
                Self::begin_request(session, next_request)
            }
            (DashboardTab::Recommendations, DashboardTab::Recommendations) => {
                let settled_or_running = matches!(
                    session.recommendations,
                    RecommendationLoadState::Ready { .. } | RecommendationLoadState::Loading
                );
                if settled_or_running {
                    Effect::None
                } else {
                    Self::begin_request(session, next_request)
                }
            }
        }
    }

    fn begin_request(session: &mut ActiveSession, next_request: &mut u64) -> Effect {
        *next_request += 1;
        let token = RequestToken(*next_request);
        session.recommendations = RecommendationLoadState::Loading;
        session.pending = Some(token);
        Effect::StartGeneration(token)
    }

    /// Applies a finished generation if it still belongs to the current entry
    /// into the recommendations tab.
    pub fn complete(
        &mut self,
        token: RequestToken,
        outcome: Result<RecommendationBatch, String>,
    ) -> Completion {
        let SessionState::LoggedIn(session) = &mut self.state else {
            return Completion::Stale;
        };
        if session.active_tab != DashboardTab::Recommendations || session.pending != Some(token) {
            return Completion::Stale;
        }

        session.pending = None;
        session.recommendations = match outcome {
            Ok(batch) => RecommendationLoadState::Ready { batch },
            Err(reason) => RecommendationLoadState::Failed { reason },
        };
        Completion::Applied
    }
}
