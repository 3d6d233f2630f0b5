//! Ticket Triage — support-mailbox classification pipeline.

pub mod config;
pub mod error;
pub mod ledger;
pub mod llm;
pub mod mailbox;
pub mod rowstore;
pub mod triage;
