//! Pipeline orchestrator — fetch, dedup, classify, route, record.
//!
//! Tickets run strictly sequentially in fetch order. A ticket enters
//! the ledger only after the row store accepted its row; a failure on
//! one ticket is recorded and the batch continues. The ledger is
//! snapshotted after every routed ticket and once more at run end, so
//! an interrupted run loses nothing that completed.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::PipelineError;
use crate::ledger::Ledger;
use crate::mailbox::{FetchParams, MessageSource};
use crate::rowstore::RowStore;
use crate::triage::classifier::TicketClassifier;
use crate::triage::types::{
    Classification, OutcomeStatus, RunReport, Ticket, TicketOutcome,
};

pub struct TicketProcessor {
    source: Arc<dyn MessageSource>,
    classifier: TicketClassifier,
    store: Arc<dyn RowStore>,
}

impl TicketProcessor {
    pub fn new(
        source: Arc<dyn MessageSource>,
        classifier: TicketClassifier,
        store: Arc<dyn RowStore>,
    ) -> Self {
        Self {
            source,
            classifier,
            store,
        }
    }

    /// Run the pipeline once over the mailbox.
    ///
    /// Fetch failures abort the run (there is nothing to iterate); the
    /// final ledger snapshot failing is also fatal because idempotency
    /// depends on it. Everything else is a per-ticket outcome.
    pub async fn run(
        &self,
        ledger: &mut Ledger,
        params: &FetchParams,
    ) -> Result<RunReport, PipelineError> {
        let tickets = self.source.fetch(params).await?;
        let fetched = tickets.len();
        info!(fetched, "Fetched tickets from mailbox");

        let pending: Vec<Ticket> = tickets
            .into_iter()
            .filter(|t| !ledger.contains(&t.id))
            .collect();
        let already_routed = fetched - pending.len();
        if already_routed > 0 {
            info!(already_routed, "Skipping tickets already in the ledger");
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        let mut processed = 0usize;
        let mut skipped = 0usize;

        for ticket in pending {
            match self.route_one(&ticket).await {
                Ok(classification) => {
                    ledger.insert(ticket.id.clone());
                    // Snapshot now so a mid-run crash keeps this ticket.
                    // A failed snapshot is retried by the final save.
                    if let Err(e) = ledger.save().await {
                        error!(id = %ticket.id, error = %e, "Ledger snapshot failed, will retry at run end");
                    }
                    processed += 1;
                    info!(
                        id = %ticket.id,
                        category = classification.category.key(),
                        urgency = classification.urgency.label(),
                        "Ticket routed"
                    );
                    outcomes.push(TicketOutcome {
                        id: ticket.id,
                        subject: ticket.subject,
                        status: OutcomeStatus::Routed {
                            category: classification.category,
                            urgency: classification.urgency,
                            sheet: classification.category.sheet(),
                        },
                    });
                }
                Err(e) => {
                    skipped += 1;
                    error!(id = %ticket.id, subject = %ticket.subject, error = %e, "Ticket skipped");
                    outcomes.push(TicketOutcome {
                        id: ticket.id,
                        subject: ticket.subject,
                        status: OutcomeStatus::Skipped {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        ledger.save().await.map_err(PipelineError::Ledger)?;

        info!(processed, skipped, ledger_size = ledger.len(), "Run complete");
        Ok(RunReport {
            fetched,
            processed,
            skipped,
            ledger_size: ledger.len(),
            outcomes,
        })
    }

    /// Classify one ticket and append its row. The ledger is untouched
    /// here — only the caller records success.
    async fn route_one(&self, ticket: &Ticket) -> Result<Classification, PipelineError> {
        let classification = self.classifier.classify(&ticket.subject, &ticket.body).await?;
        let row = [
            ticket.subject.clone(),
            classification.urgency.label().to_string(),
            classification.summary.clone(),
        ];
        self.store.append(classification.category.sheet(), row).await?;
        Ok(classification)
    }
}
