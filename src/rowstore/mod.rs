//! Row-store seam for routed tickets.

mod sheets;

pub use sheets::SheetsClient;

use async_trait::async_trait;

use crate::error::RowStoreError;

/// One routed row: subject, urgency label, summary.
pub type TicketRow = [String; 3];

/// Destination for routed ticket rows.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Append `row` under `destination`. Failures must surface — the
    /// orchestrator only marks a ticket processed after a successful
    /// append.
    async fn append(&self, destination: &str, row: TicketRow) -> Result<(), RowStoreError>;
}
