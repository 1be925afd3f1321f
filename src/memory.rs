use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::backend::Backend;
use crate::error::SyncError;
use crate::hub::ChangeHub;
use crate::model::{ChangeEvent, Filter, OrderSpec, Row, matches_all, row_key};

/// Table holding the joined clinician-schedule rows, profile embedded.
pub const ROSTER_TABLE: &str = "weekly_schedules";

/// In-memory stand-in for the hosted backend: tables of rows plus a change
/// hub. Mutations publish the same events a realtime channel would, so a
/// `LiveView` cannot tell the difference. Used by tests and local
/// development.
pub struct MemoryBackend {
    tables: DashMap<String, Vec<Row>>,
    hub: ChangeHub,
    key_field: String,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_key_field("id")
    }

    pub fn with_key_field(key_field: impl Into<String>) -> Self {
        Self {
            tables: DashMap::new(),
            hub: ChangeHub::new(),
            key_field: key_field.into(),
        }
    }

    /// Add a row and publish the insert event.
    pub fn insert(&self, table: &str, row: Row) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        self.hub.publish(table, &ChangeEvent::Insert { new: row });
    }

    /// Replace the row with the same key (or add it) and publish an update.
    pub fn update(&self, table: &str, row: Row) {
        {
            let mut rows = self.tables.entry(table.to_string()).or_default();
            match self.position_of(&rows, &row) {
                Some(idx) => rows[idx] = row.clone(),
                None => rows.push(row.clone()),
            }
        }
        self.hub.publish(table, &ChangeEvent::Update { new: row });
    }

    /// Remove the row with the given key and publish the delete, carrying
    /// the old row. Silently does nothing when the key is absent.
    pub fn delete(&self, table: &str, key: &Value) {
        let old = {
            let Some(mut rows) = self.tables.get_mut(table) else {
                return;
            };
            let Some(idx) = rows
                .iter()
                .position(|r| row_key(r, &self.key_field) == Some(key))
            else {
                return;
            };
            rows.remove(idx)
        };
        self.hub.publish(table, &ChangeEvent::Delete { old });
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |rows| rows.len())
    }

    fn position_of(&self, rows: &[Row], row: &Row) -> Option<usize> {
        let key = row_key(row, &self.key_field)?;
        rows.iter()
            .position(|r| row_key(r, &self.key_field) == Some(key))
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn query(
        &self,
        table: &str,
        fields: Option<&[String]>,
        filters: &[Filter],
        order: Option<&OrderSpec>,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, SyncError> {
        let mut rows: Vec<Row> = self
            .tables
            .get(table)
            .map(|r| r.clone())
            .unwrap_or_default();
        rows.retain(|r| matches_all(filters, r));
        if let Some(order) = order {
            rows.sort_by(|a, b| order.compare(a, b));
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        if let Some(fields) = fields {
            rows = rows
                .into_iter()
                .map(|r| project(r, fields, &self.key_field))
                .collect();
        }
        Ok(rows)
    }

    fn subscribe(&self, table: &str) -> broadcast::Receiver<ChangeEvent> {
        self.hub.subscribe(table)
    }

    async fn roster(&self, role: &str) -> Result<Vec<Row>, SyncError> {
        let rows: Vec<Row> = self
            .tables
            .get(ROSTER_TABLE)
            .map(|r| r.clone())
            .unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter(|r| {
                r.get("profile")
                    .and_then(|p| p.get("role"))
                    .and_then(Value::as_str)
                    == Some(role)
            })
            .collect())
    }
}

/// Keep only the requested fields. The primary key always survives — the
/// reconciler needs it.
fn project(row: Row, fields: &[String], key_field: &str) -> Row {
    row.into_iter()
        .filter(|(name, _)| name == key_field || fields.iter().any(|f| f == name))
        .collect()
}
