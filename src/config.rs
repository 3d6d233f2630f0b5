//! Run configuration, read from the environment.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::mailbox::FetchParams;

/// Default ledger snapshot location.
const DEFAULT_LEDGER_PATH: &str = "./data/processed_tickets.json";

/// Everything an operator controls for one run.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub groq_api_key: SecretString,
    pub gmail_token: SecretString,
    pub sheets_token: SecretString,
    pub spreadsheet_id: String,
    pub ledger_path: PathBuf,
    /// Cap on processed messages. `None` = the whole mailbox.
    pub limit: Option<usize>,
    /// Mailbox label filters, passed through unmodified.
    pub label_ids: Vec<String>,
    /// Mailbox search query, passed through unmodified.
    pub query: Option<String>,
}

impl TriageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let limit = match std::env::var("TRIAGE_LIMIT") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TRIAGE_LIMIT".into(),
                message: format!("expected a positive integer, got '{raw}'"),
            })?),
            Err(_) => None,
        };

        Ok(Self {
            groq_api_key: SecretString::from(required("GROQ_API_KEY")?),
            gmail_token: SecretString::from(required("GMAIL_ACCESS_TOKEN")?),
            sheets_token: SecretString::from(required("SHEETS_ACCESS_TOKEN")?),
            spreadsheet_id: required("GOOGLE_SHEETS_SPREADSHEET_ID")?,
            ledger_path: std::env::var("TRIAGE_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LEDGER_PATH)),
            limit,
            label_ids: std::env::var("TRIAGE_LABEL_IDS")
                .map(|raw| parse_label_ids(&raw))
                .unwrap_or_default(),
            query: std::env::var("TRIAGE_QUERY").ok(),
        })
    }

    pub fn fetch_params(&self) -> FetchParams {
        FetchParams {
            label_ids: self.label_ids.clone(),
            query: self.query.clone(),
            limit: self.limit,
        }
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Comma-separated label list, whitespace-tolerant.
fn parse_label_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
