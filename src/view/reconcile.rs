use serde_json::Value;
use tracing::debug;

use crate::model::{ChangeEvent, Row, matches_all, row_key};
use crate::observability;

use super::{LimitMode, ViewSpec};

/// What applying one change event did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Replaced,
    Removed,
    Ignored,
}

/// Reconcile one change event into the row set, in place.
///
/// Invariants on return: primary keys are unique, and when an order is
/// configured the rows match it. An event whose payload lacks the primary
/// key is a no-op.
pub fn apply_event(rows: &mut Vec<Row>, event: &ChangeEvent, spec: &ViewSpec) -> Applied {
    let Some(key) = event.key(&spec.key_field) else {
        debug!(key_field = %spec.key_field, "change event missing primary key, ignored");
        metrics::counter!(observability::EVENTS_MALFORMED_TOTAL).increment(1);
        return Applied::Ignored;
    };

    match event {
        ChangeEvent::Insert { new } => upsert(rows, key, new, spec),
        ChangeEvent::Update { new } => match position_of(rows, key, &spec.key_field) {
            Some(idx) if matches_all(&spec.filters, new) => {
                rows[idx] = new.clone();
                resort(rows, spec);
                Applied::Replaced
            }
            Some(idx) => {
                // The new version no longer matches — the row left the view.
                rows.remove(idx);
                Applied::Removed
            }
            // Not in the view: the change may have brought it in, or an
            // earlier insert was missed. Either way, treat as an insert.
            None => upsert(rows, key, new, spec),
        },
        ChangeEvent::Delete { .. } => match position_of(rows, key, &spec.key_field) {
            Some(idx) => {
                rows.remove(idx);
                Applied::Removed
            }
            // Already absent is not an error.
            None => Applied::Ignored,
        },
    }
}

fn upsert(rows: &mut Vec<Row>, key: &Value, new: &Row, spec: &ViewSpec) -> Applied {
    if !matches_all(&spec.filters, new) {
        return Applied::Ignored;
    }
    let outcome = match position_of(rows, key, &spec.key_field) {
        // Duplicate delivery for a key already present: replace, keeping
        // keys unique.
        Some(idx) => {
            rows[idx] = new.clone();
            Applied::Replaced
        }
        None => {
            rows.push(new.clone());
            Applied::Inserted
        }
    };
    resort(rows, spec);
    outcome
}

fn resort(rows: &mut Vec<Row>, spec: &ViewSpec) {
    if let Some(order) = &spec.order {
        rows.sort_by(|a, b| order.compare(a, b));
    }
    if spec.limit_mode == LimitMode::Truncate
        && let Some(limit) = spec.limit
        && rows.len() > limit
    {
        rows.truncate(limit);
    }
}

fn position_of(rows: &[Row], key: &Value, key_field: &str) -> Option<usize> {
    rows.iter()
        .position(|r| row_key(r, key_field) == Some(key))
}
