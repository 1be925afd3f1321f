use crate::view::Applied;

// ── RED metrics (event-driven) ──────────────────────────────────

/// Counter: change events processed. Labels: outcome.
pub const EVENTS_TOTAL: &str = "medsync_events_total";

/// Counter: change events dropped for missing a primary key.
pub const EVENTS_MALFORMED_TOTAL: &str = "medsync_events_malformed_total";

/// Counter: events skipped because the receiver lagged the feed.
pub const EVENTS_LAGGED_TOTAL: &str = "medsync_events_lagged_total";

/// Histogram: initial bulk-fetch latency in seconds.
pub const FETCH_DURATION_SECONDS: &str = "medsync_fetch_duration_seconds";

// ── USE metrics (per-view state) ────────────────────────────────

/// Gauge: rows currently held by a view. Labels: table.
pub const VIEW_ROWS: &str = "medsync_view_rows";

/// Counter: views whose initial fetch failed.
pub const FETCH_FAILURES_TOTAL: &str = "medsync_fetch_failures_total";

/// Map a reconciliation outcome to a short label for metrics.
pub fn outcome_label(outcome: Applied) -> &'static str {
    match outcome {
        Applied::Inserted => "inserted",
        Applied::Replaced => "replaced",
        Applied::Removed => "removed",
        Applied::Ignored => "ignored",
    }
}
