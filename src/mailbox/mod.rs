//! Mailbox ingestion seam.
//!
//! The pipeline only needs an ordered batch of tickets with stable
//! identifiers; everything mailbox-specific (labels, query syntax)
//! passes through untouched.

mod gmail;

pub use gmail::GmailClient;

use async_trait::async_trait;

use crate::error::MailError;
use crate::triage::types::Ticket;

/// Operator-controlled fetch parameters, forwarded to the source
/// unmodified.
#[derive(Debug, Clone, Default)]
pub struct FetchParams {
    /// Mailbox label filters (e.g. `INBOX`). Empty = all labels.
    pub label_ids: Vec<String>,
    /// Source-native search query, passed through as-is.
    pub query: Option<String>,
    /// Maximum number of tickets to return. `None` = unbounded.
    pub limit: Option<usize>,
}

/// A source of inbound tickets.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch up to `params.limit` tickets, in mailbox order. Ids must
    /// be stable across runs — the ledger depends on it.
    async fn fetch(&self, params: &FetchParams) -> Result<Vec<Ticket>, MailError>;
}
