use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::calendar::YearMonth;
use crate::grid::{self, Grid};
use crate::ingest::{DataSource, DiagnosticTrace, Ingestion, Ingestor};
use crate::model::OccupancyRecord;
use crate::observability;

/// What started an ingestion cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Open,
    Previous,
    Next,
    Reload,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

/// Everything the presentation layer needs for one loaded month.
#[derive(Debug, Clone)]
pub struct MonthView {
    pub month: YearMonth,
    pub records: Vec<OccupancyRecord>,
    pub source: DataSource,
    pub trace: DiagnosticTrace,
    pub grid: Grid,
}

impl MonthView {
    fn build(ingestion: Ingestion, rooms: u32) -> Self {
        let grid = grid::resolve(&ingestion.records, ingestion.month, rooms);
        Self {
            month: ingestion.month,
            records: ingestion.records,
            source: ingestion.source,
            trace: ingestion.trace,
            grid,
        }
    }

    pub fn label(&self) -> String {
        self.month.label()
    }
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub month: YearMonth,
    pub phase: Phase,
    pub generation: u64,
    view: Option<Arc<MonthView>>,
}

impl SessionSnapshot {
    /// The loaded month, only while `Ready`.
    pub fn view(&self) -> Option<&MonthView> {
        match self.phase {
            Phase::Ready => self.view.as_deref(),
            Phase::Loading => None,
        }
    }

    pub fn label(&self) -> String {
        self.month.label()
    }
}

/// Result of one triggered cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Ready(Arc<MonthView>),
    /// A newer cycle started before this one finished; its result was dropped.
    Superseded,
}

/// Drive `cycle` to completion unless `shutdown` resolves first, in which
/// case the cycle is dropped and `None` is returned.
pub async fn until_shutdown<F: Future>(cycle: F, shutdown: impl Future) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = shutdown => None,
        outcome = cycle => Some(outcome),
    }
}

struct SessionState {
    month: YearMonth,
    phase: Phase,
    generation: u64,
    view: Option<Arc<MonthView>>,
    inflight: Option<CancellationToken>,
}

/// Page-level state: selected month, loading flag and the current record set.
///
/// Cycles are serialized by generation: starting a cycle cancels the one in
/// flight, and a result whose generation is no longer current is discarded.
pub struct CalendarSession {
    ingestor: Arc<Ingestor>,
    rooms: u32,
    state: RwLock<SessionState>,
}

impl CalendarSession {
    /// A session positioned on `month`, in `Loading` until the first cycle runs.
    pub fn new(ingestor: Arc<Ingestor>, rooms: u32, month: YearMonth) -> Self {
        Self {
            ingestor,
            rooms,
            state: RwLock::new(SessionState {
                month,
                phase: Phase::Loading,
                generation: 0,
                view: None,
                inflight: None,
            }),
        }
    }

    pub fn rooms(&self) -> u32 {
        self.rooms
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            month: state.month,
            phase: state.phase,
            generation: state.generation,
            view: state.view.clone(),
        }
    }

    /// Load the current month.
    pub async fn open(&self) -> CycleOutcome {
        self.cycle(Trigger::Open, |m| m).await
    }

    pub async fn previous(&self) -> CycleOutcome {
        self.cycle(Trigger::Previous, |m| m.previous()).await
    }

    pub async fn next(&self) -> CycleOutcome {
        self.cycle(Trigger::Next, |m| m.next()).await
    }

    /// Re-fetch the current month.
    pub async fn reload(&self) -> CycleOutcome {
        self.cycle(Trigger::Reload, |m| m).await
    }

    pub async fn jump(&self, month: YearMonth) -> CycleOutcome {
        self.cycle(Trigger::Jump, move |_| month).await
    }

    async fn cycle(&self, trigger: Trigger, target: impl FnOnce(YearMonth) -> YearMonth) -> CycleOutcome {
        let (month, generation, cancel) = {
            let mut state = self.state.write().await;
            if let Some(stale) = state.inflight.take() {
                stale.cancel();
            }
            state.month = target(state.month);
            state.phase = Phase::Loading;
            state.generation += 1;
            state.view = None;
            let cancel = CancellationToken::new();
            state.inflight = Some(cancel.clone());
            (state.month, state.generation, cancel)
        };
        metrics::counter!(
            observability::SESSION_TRIGGERS_TOTAL,
            "trigger" => observability::trigger_label(trigger)
        )
        .increment(1);
        debug!(?trigger, %month, generation, "cycle started");

        let ingestion = self.ingestor.ingest(month, &cancel).await;

        let mut state = self.state.write().await;
        let Some(ingestion) = ingestion.filter(|_| state.generation == generation) else {
            metrics::counter!(observability::CYCLES_SUPERSEDED_TOTAL).increment(1);
            debug!(%month, generation, current = state.generation, "cycle superseded");
            return CycleOutcome::Superseded;
        };

        let view = Arc::new(MonthView::build(ingestion, self.rooms));
        metrics::gauge!(observability::FALLBACK_ACTIVE)
            .set(if view.source.is_live() { 0.0 } else { 1.0 });
        info!(
            %month,
            records = view.records.len(),
            source = ?view.source,
            "calendar ready"
        );
        state.view = Some(view.clone());
        state.phase = Phase::Ready;
        state.inflight = None;
        CycleOutcome::Ready(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Strategy;
    use crate::model::Indicator;
    use crate::source::{SheetHandle, SheetTransport, TransportError, TransportResponse};

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    /// Serves the same flat export to every request; requests numbered in
    /// `hang_on` never complete.
    struct FlatOnly {
        body: String,
        calls: AtomicUsize,
        hang_on: Vec<usize>,
    }

    impl FlatOnly {
        fn new(body: &str) -> Self {
            Self {
                body: body.into(),
                calls: AtomicUsize::new(0),
                hang_on: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl SheetTransport for FlatOnly {
        async fn fetch(&self, url: &str) -> Result<TransportResponse, TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang_on.contains(&n) {
                std::future::pending::<()>().await;
            }
            if url.contains("gviz") {
                return Ok(TransportResponse {
                    status: 404,
                    body: String::new(),
                });
            }
            Ok(TransportResponse {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    const BODY: &str = "room_id,start_date,end_date,status,note\n\
                        1,2025-09-01,2025-09-10,occupied,\n\
                        1,2025-09-05,2025-09-15,booked,\n";

    fn session(transport: FlatOnly, month: YearMonth) -> Arc<CalendarSession> {
        let ingestor = Ingestor::new(Arc::new(transport), SheetHandle::with_base_url("s", "http://test"))
            .with_fetch_timeout(Duration::from_secs(30));
        Arc::new(CalendarSession::new(Arc::new(ingestor), 10, month))
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[tokio::test]
    async fn starts_loading_without_view() {
        let s = session(FlatOnly::new(BODY), ym(2025, 8));
        let snap = s.snapshot().await;
        assert_eq!(snap.phase, Phase::Loading);
        assert!(snap.view().is_none());
        assert_eq!(snap.label(), "September 2025");
    }

    #[tokio::test]
    async fn open_resolves_grid() {
        let s = session(FlatOnly::new(BODY), ym(2025, 8));
        let CycleOutcome::Ready(view) = s.open().await else {
            panic!("expected ready");
        };
        assert_eq!(view.source, DataSource::Live(Strategy::FlatText));
        assert_eq!(view.grid.len(), 10 * 30);
        assert_eq!(view.grid.indicator(1, 7), Some(Indicator::Filled));
        assert_eq!(view.grid.indicator(1, 12), Some(Indicator::Reserved));

        let snap = s.snapshot().await;
        assert_eq!(snap.phase, Phase::Ready);
        assert_eq!(snap.generation, 1);
        assert_eq!(snap.view().unwrap().records.len(), 2);
    }

    #[tokio::test]
    async fn navigation_wraps_and_refetches() {
        let s = session(FlatOnly::new(BODY), ym(2025, 0));
        s.open().await;
        s.previous().await;
        let snap = s.snapshot().await;
        assert_eq!(snap.month, ym(2024, 11));
        assert_eq!(snap.view().unwrap().grid.days(), 31);

        let s = session(FlatOnly::new(BODY), ym(2025, 11));
        s.next().await;
        let snap = s.snapshot().await;
        assert_eq!(snap.month, ym(2026, 0));
        assert_eq!(snap.view().unwrap().month, ym(2026, 0));
    }

    #[tokio::test]
    async fn reload_keeps_month_and_bumps_generation() {
        let s = session(FlatOnly::new(BODY), ym(2025, 8));
        s.open().await;
        s.reload().await;
        let snap = s.snapshot().await;
        assert_eq!(snap.month, ym(2025, 8));
        assert_eq!(snap.generation, 2);
        assert_eq!(snap.phase, Phase::Ready);
    }

    #[tokio::test]
    async fn fallback_is_flagged() {
        let s = session(FlatOnly::new("header only\n"), ym(2024, 1));
        let CycleOutcome::Ready(view) = s.jump(ym(2024, 1)).await else {
            panic!("expected ready");
        };
        assert_eq!(view.source, DataSource::Fallback);
        assert!(!view.source.is_live());
        assert_eq!(view.grid.len(), 10 * 29);
        assert_eq!(view.grid.indicator(1, 1), Some(Indicator::Filled));
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_loading_cycle() {
        let mut transport = FlatOnly::new(BODY);
        transport.hang_on = vec![0];
        let s = session(transport, ym(2025, 8));

        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = stop.send(());
        });

        let outcome = tokio::time::timeout(Duration::from_secs(5), until_shutdown(s.reload(), stopped))
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(s.snapshot().await.phase, Phase::Loading);
    }

    #[tokio::test]
    async fn cycle_completes_when_no_shutdown_arrives() {
        let s = session(FlatOnly::new(BODY), ym(2025, 8));
        let outcome = until_shutdown(s.open(), std::future::pending::<()>()).await;
        assert!(matches!(outcome, Some(CycleOutcome::Ready(_))));
    }

    #[tokio::test]
    async fn newer_cycle_supersedes_stale_one() {
        let mut transport = FlatOnly::new(BODY);
        // The first cycle's table request never answers.
        transport.hang_on = vec![0];
        let s = session(transport, ym(2025, 8));

        let stale = {
            let s = s.clone();
            tokio::spawn(async move { s.reload().await })
        };
        // Let the stale cycle reach its hanging fetch.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(s.snapshot().await.phase, Phase::Loading);

        let fresh = s.next().await;
        assert!(matches!(fresh, CycleOutcome::Ready(_)));

        let stale = tokio::time::timeout(Duration::from_secs(5), stale)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(stale, CycleOutcome::Superseded));

        let snap = s.snapshot().await;
        assert_eq!(snap.month, ym(2025, 9));
        assert_eq!(snap.generation, 2);
        assert_eq!(snap.phase, Phase::Ready);
    }
}
