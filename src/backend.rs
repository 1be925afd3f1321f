use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::SyncError;
use crate::model::{ChangeEvent, Filter, OrderSpec, Row};

/// The capabilities the surrounding application provides. Both are opaque
/// external collaborators: a hosted backend in production, [`crate::memory::MemoryBackend`]
/// in tests and local development.
#[async_trait]
pub trait Backend: Send + Sync {
    /// One-shot bulk read with filters, ordering, and limit applied
    /// backend-side, exactly as given.
    async fn query(
        &self,
        table: &str,
        fields: Option<&[String]>,
        filters: &[Filter],
        order: Option<&OrderSpec>,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, SyncError>;

    /// Open a change feed scoped to the whole table. The backend is not
    /// asked to pre-filter events; filtering happens client-side. Dropping
    /// the receiver is the (idempotent) unsubscribe.
    fn subscribe(&self, table: &str) -> broadcast::Receiver<ChangeEvent>;

    /// Weekly-schedule rows joined with their owning profile, pre-filtered
    /// backend-side to profiles with the given role.
    async fn roster(&self, role: &str) -> Result<Vec<Row>, SyncError>;
}
