//! Google Sheets `values:append` writer.
//!
//! Each category routes to a named sheet tab; rows land in columns
//! A:C (subject, urgency, summary). The sheet name goes quoted into
//! the A1 range because tab names carry spaces and accents. Token
//! acquisition is out of scope; the client takes a ready access token.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use super::{RowStore, TicketRow};
use crate::error::RowStoreError;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsClient {
    http: reqwest::Client,
    access_token: SecretString,
    spreadsheet_id: String,
    base_url: String,
}

impl SheetsClient {
    pub fn new(access_token: SecretString, spreadsheet_id: impl Into<String>) -> Self {
        Self::with_base_url(access_token, spreadsheet_id, SHEETS_API_URL)
    }

    /// Point the client at a different base URL (tests).
    pub fn with_base_url(
        access_token: SecretString,
        spreadsheet_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
            spreadsheet_id: spreadsheet_id.into(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct AppendBody {
    values: Vec<TicketRow>,
}

#[async_trait]
impl RowStore for SheetsClient {
    async fn append(&self, destination: &str, row: TicketRow) -> Result<(), RowStoreError> {
        let range = format!("'{destination}'!A:C");
        let raw_url = format!(
            "{}/{}/values/{range}:append",
            self.base_url, self.spreadsheet_id
        );
        // Url::parse percent-encodes the spaces and accents in the range.
        let url = reqwest::Url::parse(&raw_url)
            .map_err(|e| RowStoreError::RequestFailed(e.to_string()))?;

        debug!(sheet = %destination, subject = %row[0], "Appending routed ticket row");

        let response = self
            .http
            .post(url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(self.access_token.expose_secret())
            .json(&AppendBody { values: vec![row] })
            .send()
            .await
            .map_err(|e| RowStoreError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RowStoreError::Status { status, body });
        }

        Ok(())
    }
}
