mod coerce;
mod error;
pub mod fallback;
mod flat;
mod table;
mod trace;

pub use coerce::parse_date;
pub use error::{FailureClass, RowRejection, StrategyError};
pub use trace::{DiagnosticTrace, RejectedRow, StrategyAttempt};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::calendar::YearMonth;
use crate::model::*;
use crate::observability;
use crate::source::{SheetHandle, SheetTransport};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One ingestion method, in the order the chain tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    StructuredTable,
    FlatText,
    Fallback,
}

/// Chain order. `Fallback` is last and always succeeds.
pub const STRATEGY_CHAIN: [Strategy; 3] = [Strategy::StructuredTable, Strategy::FlatText, Strategy::Fallback];

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::StructuredTable => "structured-table",
            Strategy::FlatText => "flat-text",
            Strategy::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the current record set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Live(Strategy),
    Fallback,
}

impl DataSource {
    pub fn is_live(&self) -> bool {
        matches!(self, DataSource::Live(_))
    }
}

/// Output of one completed ingestion cycle.
#[derive(Debug, Clone)]
pub struct Ingestion {
    pub month: YearMonth,
    pub records: Vec<OccupancyRecord>,
    pub source: DataSource,
    pub trace: DiagnosticTrace,
}

/// Records, rejections and coercion notes from parsing one response body.
#[derive(Debug, Default)]
pub(crate) struct Parsed {
    pub records: Vec<OccupancyRecord>,
    pub rejected: Vec<RejectedRow>,
    pub warnings: Vec<String>,
}

impl Parsed {
    fn push(&mut self, row: usize, raw: Result<coerce::RawRow, RowRejection>) {
        let result = raw.and_then(|r| r.into_record(row, &mut self.warnings));
        match result {
            Ok(record) => self.records.push(record),
            Err(reason) => {
                debug!(row, %reason, "row skipped");
                self.rejected.push(RejectedRow { row, reason });
            }
        }
    }
}

/// Runs the strategy chain against one sheet.
pub struct Ingestor {
    transport: Arc<dyn SheetTransport>,
    handle: SheetHandle,
    fetch_timeout: Duration,
}

impl Ingestor {
    pub fn new(transport: Arc<dyn SheetTransport>, handle: SheetHandle) -> Self {
        Self {
            transport,
            handle,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn handle(&self) -> &SheetHandle {
        &self.handle
    }

    /// Run one ingestion cycle for `month`.
    ///
    /// Returns `None` only if `cancel` fires before the cycle finishes.
    pub async fn ingest(&self, month: YearMonth, cancel: &CancellationToken) -> Option<Ingestion> {
        let started = Instant::now();
        metrics::counter!(observability::INGEST_CYCLES_TOTAL).increment(1);
        info!(sheet = %self.handle.id, %month, "ingestion cycle started");

        let mut trace = DiagnosticTrace::default();
        for strategy in STRATEGY_CHAIN {
            let attempt_start = Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(%month, %strategy, "ingestion cycle cancelled");
                    return None;
                }
                result = self.run(strategy, month) => result,
            };

            let (result, rejected, records) = match result {
                Ok(parsed) if parsed.records.is_empty() => {
                    let skipped = parsed.rejected.len();
                    (Err(StrategyError::NoValidRows { skipped }), parsed.rejected, None)
                }
                Ok(parsed) => (
                    Ok(parsed.records.len()),
                    parsed.rejected,
                    Some((parsed.records, parsed.warnings)),
                ),
                Err(e) => (Err(e), Vec::new(), None),
            };

            let outcome = match &result {
                Ok(n) => {
                    info!(%strategy, records = n, skipped = rejected.len(), "strategy succeeded");
                    "success"
                }
                Err(e) => {
                    warn!(%strategy, error = %e, "strategy failed");
                    e.class().label()
                }
            };
            metrics::counter!(
                observability::STRATEGY_ATTEMPTS_TOTAL,
                "strategy" => strategy.label(),
                "outcome" => outcome
            )
            .increment(1);

            trace.attempts.push(StrategyAttempt {
                strategy,
                result,
                rejected,
                elapsed: attempt_start.elapsed(),
            });

            if let Some((records, warnings)) = records {
                let source = match strategy {
                    Strategy::Fallback => {
                        warn!(%month, "all live strategies failed, using fallback data");
                        DataSource::Fallback
                    }
                    live => DataSource::Live(live),
                };
                for msg in warnings {
                    warn!(%strategy, "{msg}");
                    trace.warnings.push(msg);
                }
                warn_inverted(&records, &mut trace);
                metrics::histogram!(observability::INGEST_DURATION_SECONDS)
                    .record(started.elapsed().as_secs_f64());
                metrics::gauge!(observability::RECORDS_LOADED).set(records.len() as f64);
                return Some(Ingestion {
                    month,
                    records,
                    source,
                    trace,
                });
            }
        }

        // Unreachable in practice: the fallback strategy always yields records.
        Some(Ingestion {
            month,
            records: fallback::records(month),
            source: DataSource::Fallback,
            trace,
        })
    }

    async fn run(&self, strategy: Strategy, month: YearMonth) -> Result<Parsed, StrategyError> {
        match strategy {
            Strategy::StructuredTable => {
                let body = self.fetch(&self.handle.table_query_url()).await?;
                table::parse(&body)
            }
            Strategy::FlatText => {
                let body = self.fetch(&self.handle.flat_export_url()).await?;
                Ok(flat::parse(&body))
            }
            Strategy::Fallback => Ok(Parsed {
                records: fallback::records(month),
                ..Parsed::default()
            }),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, StrategyError> {
        debug!(url, "fetching");
        let response = tokio::time::timeout(self.fetch_timeout, self.transport.fetch(url))
            .await
            .map_err(|_| StrategyError::Timeout(self.fetch_timeout))?
            .map_err(|e| StrategyError::Transport(e.to_string()))?;
        if !response.is_success() {
            return Err(StrategyError::Status(response.status));
        }
        Ok(response.body)
    }
}

fn warn_inverted(records: &[OccupancyRecord], trace: &mut DiagnosticTrace) {
    for r in records.iter().filter(|r| r.range.is_inverted()) {
        let msg = format!(
            "room {}: start {} is after end {}, range ignored",
            r.room_id, r.range.start, r.range.end
        );
        warn!("{msg}");
        trace.warnings.push(msg);
    }
}
