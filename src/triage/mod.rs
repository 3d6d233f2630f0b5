//! Ticket triage pipeline.
//!
//! Flow:
//! 1. Mailbox fetch → [`types::Ticket`] batch
//! 2. Ledger dedup → only unseen ids continue
//! 3. [`classifier::TicketClassifier`] → retry-wrapped completion + normalization
//! 4. Category route → row appended to the row store
//! 5. Ledger update + snapshot

pub mod classifier;
pub mod normalizer;
pub mod processor;
pub mod types;
