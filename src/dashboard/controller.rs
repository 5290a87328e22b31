use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    error::DashboardResult,
    models::{PriorityCounts, RecommendationBatch, StatCard},
    recommendations::{RecommendationSource, ScriptedGenerator},
    settings::DashboardSettings,
    telemetry::{StaticTelemetry, TelemetrySnapshot, TelemetrySource, TelemetrySummary},
};

use super::{
    events::StateEmitter,
    state::{Completion, DashboardTab, Effect, RecommendationLoadState, RequestToken, SessionMachine, SessionView},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Everything the presentation layer needs to render one frame.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub session: SessionView,
    /// Present only while logged in.
    pub telemetry: Option<TelemetrySnapshot>,
    pub summary: Option<TelemetrySummary>,
    pub headline_cards: Vec<StatCard>,
    pub recommendations: RecommendationLoadState,
    /// Badge counts, present once a batch is ready.
    pub recommendation_counts: Option<PriorityCounts>,
}

impl DashboardSnapshot {
    pub fn recommendations_status(&self) -> &'static str {
        match self.recommendations {
            RecommendationLoadState::Idle => "idle",
            RecommendationLoadState::Loading => "loading",
            RecommendationLoadState::Ready { .. } => "ready",
            RecommendationLoadState::Failed { .. } => "failed",
        }
    }
}

struct InFlight {
    token: RequestToken,
    cancel: CancellationToken,
    /// Taken by `settle`; the slot stays so the request can still be cancelled.
    handle: Option<JoinHandle<()>>,
}

/// Session state and the request serving it. Both live behind one lock so a
/// transition and its cancel/spawn side effect are never split.
struct Dashboard {
    machine: SessionMachine,
    in_flight: Option<InFlight>,
}

impl Dashboard {
    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
    }
}

/// Single owner of the dashboard session. Intents are applied under one lock
/// and every resulting snapshot is published before the lock is released.
#[derive(Clone)]
pub struct DashboardController {
    state: Arc<Mutex<Dashboard>>,
    telemetry: Arc<dyn TelemetrySource>,
    generator: Arc<dyn RecommendationSource>,
    emitter: Arc<dyn StateEmitter>,
    generation_timeout: Duration,
}

impl DashboardController {
    pub fn new(
        telemetry: Arc<dyn TelemetrySource>,
        generator: Arc<dyn RecommendationSource>,
        emitter: Arc<dyn StateEmitter>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(Dashboard {
                machine: SessionMachine::new(),
                in_flight: None,
            })),
            telemetry,
            generator,
            emitter,
            generation_timeout,
        }
    }

    /// Demo household plus the scripted generator, tuned by `settings`.
    pub fn from_settings(settings: &DashboardSettings, emitter: Arc<dyn StateEmitter>) -> DashboardResult<Self> {
        let telemetry = StaticTelemetry::demo()?;
        let generator = ScriptedGenerator::new(settings.latency(), settings.jitter());
        Ok(Self::new(
            Arc::new(telemetry),
            Arc::new(generator),
            emitter,
            settings.generation_timeout(),
        ))
    }

    pub async fn get_snapshot(&self) -> DashboardSnapshot {
        let dashboard = self.state.lock().await;
        self.snapshot_of(&dashboard.machine)
    }

    pub async fn login(&self) -> DashboardSnapshot {
        let mut dashboard = self.state.lock().await;
        if dashboard.machine.login() {
            if let Some(session) = dashboard.machine.active() {
                log_info!("Session {} started", session.session_id);
            }
        }
        self.publish(&dashboard.machine)
    }

    pub async fn logout(&self) -> DashboardSnapshot {
        let mut dashboard = self.state.lock().await;
        let session_id = dashboard.machine.active().map(|session| session.session_id.clone());
        let pending = dashboard.machine.logout();
        dashboard.cancel_in_flight();

        if let Some(session_id) = session_id {
            log_info!("Session {session_id} ended");
        }
        if let Some(token) = pending {
            log_debug!("Discarding recommendation request {} on logout", token.value());
        }
        self.publish(&dashboard.machine)
    }

    pub async fn select_tab(&self, tab: DashboardTab) -> DashboardSnapshot {
        let mut dashboard = self.state.lock().await;
        let effect = dashboard.machine.select_tab(tab);
        if let Effect::StartGeneration(token) = effect {
            log_info!("Generating recommendations (request {})", token.value());
            self.spawn_generation(&mut dashboard, token);
        }
        self.publish(&dashboard.machine)
    }

    /// Waits for the request currently in flight, if any.
    pub async fn settle(&self) {
        let handle = {
            let mut dashboard = self.state.lock().await;
            dashboard.in_flight.as_mut().and_then(|in_flight| in_flight.handle.take())
        };
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                log_warn!("Recommendation task ended abnormally: {err}");
            }
        }
    }

    fn snapshot_of(&self, machine: &SessionMachine) -> DashboardSnapshot {
        let telemetry = machine.is_authenticated().then(|| self.telemetry.snapshot());
        let summary = telemetry.as_ref().map(TelemetrySnapshot::summary);
        let headline_cards = telemetry
            .as_ref()
            .map(TelemetrySnapshot::headline_cards)
            .unwrap_or_default();
        let recommendations = machine.recommendations();
        let recommendation_counts = recommendations.batch().map(RecommendationBatch::count_by_priority);

        DashboardSnapshot {
            session: machine.view(),
            telemetry,
            summary,
            headline_cards,
            recommendations,
            recommendation_counts,
        }
    }

    fn publish(&self, machine: &SessionMachine) -> DashboardSnapshot {
        let snapshot = self.snapshot_of(machine);
        self.emitter.emit_state(&snapshot);
        snapshot
    }

    /// Called with the lock held; the task only touches state after this
    /// returns and the lock is released.
    fn spawn_generation(&self, dashboard: &mut Dashboard, token: RequestToken) {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(self.clone().run_generation(token, cancel.clone()));

        let superseded = dashboard.in_flight.replace(InFlight {
            token,
            cancel,
            handle: Some(handle),
        });
        if let Some(previous) = superseded {
            log_debug!("Request {} superseded by {}", previous.token.value(), token.value());
            previous.cancel.cancel();
        }
    }

    async fn run_generation(self, token: RequestToken, cancel: CancellationToken) {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                log_debug!("Recommendation request {} cancelled", token.value());
                return;
            }
            result = tokio::time::timeout(self.generation_timeout, self.generator.generate()) => {
                self.classify(token, result)
            }
        };

        let mut dashboard = self.state.lock().await;
        match dashboard.machine.complete(token, outcome) {
            Completion::Applied => {
                log_info!(
                    "Recommendation request {} settled as {}",
                    token.value(),
                    dashboard.machine.recommendations().batch().map_or("failed", |_| "ready")
                );
                self.publish(&dashboard.machine);
            }
            Completion::Stale => {
                log_debug!("Dropping stale result of recommendation request {}", token.value());
            }
        }

        if dashboard.in_flight.as_ref().map(|current| current.token) == Some(token) {
            dashboard.in_flight = None;
        }
    }

    fn classify(
        &self,
        token: RequestToken,
        result: Result<DashboardResult<RecommendationBatch>, tokio::time::error::Elapsed>,
    ) -> Result<RecommendationBatch, String> {
        match result {
            Ok(Ok(batch)) => Ok(batch),
            Ok(Err(err)) => {
                log_warn!("Recommendation request {} failed: {err}", token.value());
                Err(err.to_string())
            }
            Err(_) => {
                log_warn!(
                    "Recommendation request {} timed out after {}ms",
                    token.value(),
                    self.generation_timeout.as_millis()
                );
                Err(format!(
                    "recommendation generation timed out after {}ms",
                    self.generation_timeout.as_millis()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex as StdMutex,
    };

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::{
        error::DashboardError,
        models::Priority,
        recommendations::candidate_pool,
    };

    #[derive(Default)]
    struct RecordingEmitter {
        snapshots: StdMutex<Vec<DashboardSnapshot>>,
    }

    impl RecordingEmitter {
        fn snapshots(&self) -> Vec<DashboardSnapshot> {
            self.snapshots.lock().unwrap().clone()
        }

        fn ready_batches(&self) -> Vec<Uuid> {
            self.snapshots()
                .iter()
                .filter_map(|s| s.recommendations.batch().map(|b| b.batch_id))
                .collect()
        }
    }

    impl StateEmitter for RecordingEmitter {
        fn emit_state(&self, snapshot: &DashboardSnapshot) {
            self.snapshots.lock().unwrap().push(snapshot.clone());
        }
    }

    /// Builds each batch up front so tests can tell which call produced it.
    struct CountingSource {
        latency: Duration,
        produced: StdMutex<Vec<Uuid>>,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(latency: Duration) -> Self {
            Self {
                latency,
                produced: StdMutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RecommendationSource for CountingSource {
        async fn generate(&self) -> DashboardResult<RecommendationBatch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let batch = RecommendationBatch::new(candidate_pool());
            self.produced.lock().unwrap().push(batch.batch_id);
            tokio::time::sleep(self.latency).await;
            Ok(batch)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl RecommendationSource for FailingSource {
        async fn generate(&self) -> DashboardResult<RecommendationBatch> {
            Err(DashboardError::GenerationFailure("model backend offline".into()))
        }
    }

    fn controller(generator: Arc<dyn RecommendationSource>) -> (DashboardController, Arc<RecordingEmitter>) {
        let emitter = Arc::new(RecordingEmitter::default());
        let controller = DashboardController::new(
            Arc::new(StaticTelemetry::demo().unwrap()),
            generator,
            emitter.clone(),
            Duration::from_secs(10),
        );
        (controller, emitter)
    }

    fn scripted() -> Arc<dyn RecommendationSource> {
        Arc::new(ScriptedGenerator::default())
    }

    #[tokio::test(start_paused = true)]
    async fn login_shows_overview_with_telemetry() {
        let (controller, emitter) = controller(scripted());

        let before = controller.get_snapshot().await;
        assert!(!before.session.is_authenticated);
        assert!(before.telemetry.is_none());
        assert!(before.headline_cards.is_empty());
        assert!(before.summary.is_none());

        let snapshot = controller.login().await;
        assert!(snapshot.session.is_authenticated);
        assert_eq!(snapshot.session.active_tab, DashboardTab::Overview);
        assert_eq!(snapshot.recommendations, RecommendationLoadState::Idle);
        assert_eq!(snapshot.telemetry.as_ref().unwrap().generation.len(), 8);
        assert_eq!(snapshot.headline_cards.len(), 4);

        let summary = snapshot.summary.as_ref().unwrap();
        assert_eq!(summary.peak_generation.unwrap().kilowatt_hours(), 4.5);
        assert_eq!(summary.latest_savings.as_ref().unwrap().period(), "Jun");
        assert!(summary.savings_growth_pct.unwrap() > 0.0);
        assert!(snapshot.recommendation_counts.is_none());

        assert_eq!(emitter.snapshots().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recommendations_load_then_become_ready() {
        let (controller, emitter) = controller(scripted());
        controller.login().await;

        let loading = controller.select_tab(DashboardTab::Recommendations).await;
        assert_eq!(loading.session.active_tab, DashboardTab::Recommendations);
        assert!(loading.recommendations.is_loading());

        controller.settle().await;

        let ready = controller.get_snapshot().await;
        let batch = ready.recommendations.batch().expect("batch delivered");
        assert_eq!(batch.len(), 5);
        for item in &batch.items {
            assert!(item.is_complete());
            assert!(matches!(item.priority, Priority::High | Priority::Medium | Priority::Low));
        }

        let counts = ready.recommendation_counts.unwrap();
        assert_eq!((counts.high, counts.medium, counts.low), (2, 2, 1));

        let statuses: Vec<_> = emitter.snapshots().iter().map(|s| s.recommendations_status()).collect();
        assert_eq!(statuses, ["idle", "loading", "ready"]);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_round_trip_applies_only_the_second_request() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(1500)));
        let (controller, emitter) = controller(source.clone());
        controller.login().await;

        controller.select_tab(DashboardTab::Recommendations).await;
        tokio::task::yield_now().await;
        controller.select_tab(DashboardTab::Overview).await;
        controller.select_tab(DashboardTab::Recommendations).await;
        controller.settle().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        let produced = source.produced.lock().unwrap().clone();
        assert_eq!(produced.len(), 2);
        assert_eq!(emitter.ready_batches(), vec![produced[1]]);

        let snapshot = controller.get_snapshot().await;
        assert_eq!(snapshot.recommendations.batch().unwrap().batch_id, produced[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn result_arriving_on_overview_is_dropped() {
        let (controller, emitter) = controller(scripted());
        controller.login().await;
        controller.select_tab(DashboardTab::Recommendations).await;
        controller.select_tab(DashboardTab::Overview).await;

        controller.settle().await;

        let snapshot = controller.get_snapshot().await;
        assert_eq!(snapshot.session.active_tab, DashboardTab::Overview);
        assert!(snapshot.recommendations.is_loading());
        assert!(emitter.ready_batches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_while_loading_leaves_nothing_behind() {
        let (controller, emitter) = controller(scripted());
        let first = controller.login().await;
        controller.select_tab(DashboardTab::Recommendations).await;

        let snapshot = controller.logout().await;
        assert!(!snapshot.session.is_authenticated);
        let emitted_at_logout = emitter.snapshots().len();

        tokio::time::sleep(Duration::from_secs(5)).await;

        let after = controller.get_snapshot().await;
        assert!(!after.session.is_authenticated);
        assert!(after.telemetry.is_none());
        assert_eq!(after.recommendations, RecommendationLoadState::Idle);
        assert_eq!(emitter.snapshots().len(), emitted_at_logout);

        let again = controller.login().await;
        assert_eq!(again.session.active_tab, DashboardTab::Overview);
        assert_eq!(again.recommendations, RecommendationLoadState::Idle);
        assert_eq!(snapshot.session.session_id, None);
        assert_ne!(again.session.session_id, first.session.session_id);
    }

    #[tokio::test(start_paused = true)]
    async fn reselecting_ready_tab_does_not_regenerate() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(10)));
        let (controller, _emitter) = controller(source.clone());
        controller.login().await;
        controller.select_tab(DashboardTab::Recommendations).await;
        controller.settle().await;

        let snapshot = controller.select_tab(DashboardTab::Recommendations).await;
        controller.settle().await;
        assert!(snapshot.recommendations.is_ready());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn generation_failure_is_reported_and_retryable() {
        let (controller, _emitter) = controller(Arc::new(FailingSource));
        controller.login().await;
        controller.select_tab(DashboardTab::Recommendations).await;
        controller.settle().await;

        let failed = controller.get_snapshot().await;
        match &failed.recommendations {
            RecommendationLoadState::Failed { reason } => assert!(reason.contains("model backend offline")),
            other => panic!("expected failure, got {other:?}"),
        }

        let retry = controller.select_tab(DashboardTab::Recommendations).await;
        assert!(retry.recommendations.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generation_times_out() {
        let emitter = Arc::new(RecordingEmitter::default());
        let controller = DashboardController::new(
            Arc::new(StaticTelemetry::demo().unwrap()),
            Arc::new(ScriptedGenerator::new(Duration::from_secs(60), Duration::ZERO)),
            emitter.clone(),
            Duration::from_secs(2),
        );
        controller.login().await;
        controller.select_tab(DashboardTab::Recommendations).await;
        controller.settle().await;

        let snapshot = controller.get_snapshot().await;
        match &snapshot.recommendations {
            RecommendationLoadState::Failed { reason } => assert!(reason.contains("timed out after 2000ms")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn controller_from_settings_uses_configured_latency() {
        let settings = DashboardSettings {
            recommendation_latency_ms: 200,
            ..DashboardSettings::default()
        };
        let controller = DashboardController::from_settings(&settings, Arc::new(crate::dashboard::LogEmitter)).unwrap();
        controller.login().await;

        let started = tokio::time::Instant::now();
        controller.select_tab(DashboardTab::Recommendations).await;
        controller.settle().await;

        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(controller.get_snapshot().await.recommendations.is_ready());
    }

    #[test]
    fn snapshot_serializes_for_the_front_end() {
        let snapshot = DashboardSnapshot {
            session: SessionView {
                is_authenticated: true,
                active_tab: DashboardTab::Recommendations,
                session_id: Some("abc".into()),
            },
            telemetry: None,
            summary: None,
            headline_cards: Vec::new(),
            recommendations: RecommendationLoadState::Loading,
            recommendation_counts: None,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["session"]["isAuthenticated"], true);
        assert_eq!(json["session"]["activeTab"], "recommendations");
        assert_eq!(json["recommendations"]["status"], "loading");
        assert!(json["recommendationCounts"].is_null());
    }

    /// After the intents have landed, a session sitting on the recommendations
    /// tab must have a request that will settle it.
    async fn assert_not_stranded(controller: &DashboardController) {
        controller.settle().await;
        let snapshot = controller.get_snapshot().await;
        if snapshot.session.is_authenticated && snapshot.session.active_tab == DashboardTab::Recommendations {
            assert!(
                !snapshot.recommendations.is_loading(),
                "recommendations stuck in loading"
            );
        }
    }

    fn quick() -> Arc<dyn RecommendationSource> {
        Arc::new(ScriptedGenerator::new(Duration::from_millis(1), Duration::ZERO))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn logout_racing_a_fresh_login_never_strands_loading() {
        for _ in 0..500 {
            let (controller, _emitter) = controller(quick());
            controller.login().await;
            controller.select_tab(DashboardTab::Recommendations).await;

            let leaving = controller.clone();
            let returning = controller.clone();
            let (left, returned) = tokio::join!(
                tokio::spawn(async move {
                    leaving.logout().await;
                }),
                tokio::spawn(async move {
                    returning.login().await;
                    returning.select_tab(DashboardTab::Recommendations).await;
                }),
            );
            left.unwrap();
            returned.unwrap();

            assert_not_stranded(&controller).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tab_switches_never_strand_loading() {
        for _ in 0..500 {
            let (controller, _emitter) = controller(quick());
            controller.login().await;

            let direct = controller.clone();
            let round_trip = controller.clone();
            let (first, second) = tokio::join!(
                tokio::spawn(async move {
                    direct.select_tab(DashboardTab::Recommendations).await;
                }),
                tokio::spawn(async move {
                    round_trip.select_tab(DashboardTab::Overview).await;
                    round_trip.select_tab(DashboardTab::Recommendations).await;
                }),
            );
            first.unwrap();
            second.unwrap();

            assert_not_stranded(&controller).await;
        }
    }
}
