mod reconcile;

pub use reconcile::{Applied, apply_event};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Instant;

use tokio::sync::{RwLock, broadcast, watch};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::model::{ChangeEvent, Filter, OrderSpec, Row};
use crate::observability;

/// Whether a configured row limit constrains live inserts or only the
/// initial fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitMode {
    /// The limit shapes the initial fetch only; live inserts can grow the
    /// collection past it.
    #[default]
    FetchOnly,
    /// The tail beyond the limit is dropped after every reconciliation.
    Truncate,
}

/// Everything that defines one view instance. All of it is fixed for the
/// instance's lifetime — changing any input means closing the view and
/// spawning a new one.
#[derive(Debug, Clone)]
pub struct ViewSpec {
    pub table: String,
    pub fields: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub order: Option<OrderSpec>,
    pub limit: Option<usize>,
    pub limit_mode: LimitMode,
    pub key_field: String,
}

impl ViewSpec {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: None,
            filters: Vec::new(),
            order: None,
            limit: None,
            limit_mode: LimitMode::default(),
            key_field: "id".into(),
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: OrderSpec) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn limit_mode(mut self, mode: LimitMode) -> Self {
        self.limit_mode = mode;
        self
    }

    pub fn key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = field.into();
        self
    }
}

/// Lifecycle of a view. `Failed` is terminal — recovery is closing the
/// view and spawning a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Ready,
    Failed(String),
}

struct Shared {
    rows: RwLock<Vec<Row>>,
    status: watch::Sender<ViewStatus>,
    live: AtomicBool,
}

/// A live, filtered, ordered mirror of one remote table.
///
/// Construction subscribes to the table's change feed, issues the bulk
/// fetch, and spawns a driver task that reconciles events into the shared
/// row set one at a time, in arrival order. Events that arrive while the
/// fetch is in flight buffer in the subscription channel and replay once
/// the snapshot lands.
pub struct LiveView {
    shared: Arc<Shared>,
    status_rx: watch::Receiver<ViewStatus>,
    close_tx: watch::Sender<bool>,
}

impl LiveView {
    /// Subscribe, fetch, and spawn the driver. The subscription is opened
    /// here, before the fetch is even issued, so no event can slip between
    /// the two. Returns immediately; await [`LiveView::wait_ready`] for the
    /// snapshot.
    pub fn spawn(backend: Arc<dyn Backend>, spec: ViewSpec) -> Self {
        let events = backend.subscribe(&spec.table);
        let (status_tx, status_rx) = watch::channel(ViewStatus::Loading);
        let (close_tx, close_rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            rows: RwLock::new(Vec::new()),
            status: status_tx,
            live: AtomicBool::new(false),
        });
        tokio::spawn(drive(backend, spec, events, shared.clone(), close_rx));
        Self {
            shared,
            status_rx,
            close_tx,
        }
    }

    /// A stable snapshot of the current rows. Empty while loading or failed.
    pub async fn rows(&self) -> Vec<Row> {
        self.shared.rows.read().await.clone()
    }

    pub fn status(&self) -> ViewStatus {
        self.status_rx.borrow().clone()
    }

    /// Wait until the initial fetch has resolved either way.
    pub async fn wait_ready(&self) -> ViewStatus {
        let mut rx = self.status_rx.clone();
        loop {
            let current = rx.borrow_and_update().clone();
            if current != ViewStatus::Loading {
                return current;
            }
            if rx.changed().await.is_err() {
                return self.status();
            }
        }
    }

    /// Whether the change feed is still delivering events. False until the
    /// snapshot lands and after the feed closes.
    pub fn is_live(&self) -> bool {
        self.shared.live.load(AtomicOrdering::Relaxed)
    }

    /// Stop listening. Idempotent and safe before the fetch resolves; a
    /// fetch resolving after close is discarded without touching state.
    pub fn close(&self) {
        let _ = self.close_tx.send(true);
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        let _ = self.close_tx.send(true);
    }
}

async fn drive(
    backend: Arc<dyn Backend>,
    spec: ViewSpec,
    mut events: broadcast::Receiver<ChangeEvent>,
    shared: Arc<Shared>,
    mut close_rx: watch::Receiver<bool>,
) {
    // Events racing the bulk query buffer in the already-open subscription
    // and replay, in arrival order, once the snapshot lands.
    let fetch_start = Instant::now();
    let fetched = tokio::select! {
        res = backend.query(
            &spec.table,
            spec.fields.as_deref(),
            &spec.filters,
            spec.order.as_ref(),
            spec.limit,
        ) => res,
        _ = close_rx.changed() => {
            debug!(table = %spec.table, "view closed before initial fetch resolved");
            return;
        }
    };
    metrics::histogram!(observability::FETCH_DURATION_SECONDS)
        .record(fetch_start.elapsed().as_secs_f64());

    match fetched {
        Ok(rows) => {
            info!(table = %spec.table, rows = rows.len(), "live view ready");
            metrics::gauge!(observability::VIEW_ROWS, "table" => spec.table.clone())
                .set(rows.len() as f64);
            *shared.rows.write().await = rows;
            shared.live.store(true, AtomicOrdering::Relaxed);
            let _ = shared.status.send(ViewStatus::Ready);
        }
        Err(e) => {
            warn!(table = %spec.table, error = %e, "initial fetch failed");
            metrics::counter!(observability::FETCH_FAILURES_TOTAL).increment(1);
            let _ = shared.status.send(ViewStatus::Failed(e.to_string()));
            // Buffered events die with the subscription.
            return;
        }
    }

    loop {
        tokio::select! {
            _ = close_rx.changed() => break,
            received = events.recv() => match received {
                Ok(event) => {
                    let mut rows = shared.rows.write().await;
                    let outcome = reconcile::apply_event(&mut rows, &event, &spec);
                    metrics::counter!(
                        observability::EVENTS_TOTAL,
                        "outcome" => observability::outcome_label(outcome)
                    )
                    .increment(1);
                    metrics::gauge!(observability::VIEW_ROWS, "table" => spec.table.clone())
                        .set(rows.len() as f64);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(table = %spec.table, skipped, "change feed lagged; view may be stale");
                    metrics::counter!(observability::EVENTS_LAGGED_TOTAL).increment(skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!(table = %spec.table, "change feed closed; view no longer updating");
                    break;
                }
            },
        }
    }

    shared.live.store(false, AtomicOrdering::Relaxed);
    debug!(table = %spec.table, "view driver stopped");
}
