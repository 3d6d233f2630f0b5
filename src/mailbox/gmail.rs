//! Gmail REST client — read-only message fetch.
//!
//! Two-phase fetch against the `users/me` endpoints: paginate message
//! ids (100 per page), then pull each message with `format=full` and
//! flatten its MIME tree into subject + plain-text body. Token
//! acquisition is out of scope; the client takes a ready OAuth access
//! token.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{FetchParams, MessageSource};
use crate::error::MailError;
use crate::triage::types::Ticket;

const GMAIL_API_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail list page size.
const PAGE_SIZE: usize = 100;

/// Width for the HTML-to-text fallback rendering.
const TEXT_WRAP_COLS: usize = 80;

pub struct GmailClient {
    http: reqwest::Client,
    access_token: SecretString,
    base_url: String,
}

impl GmailClient {
    pub fn new(access_token: SecretString) -> Self {
        Self::with_base_url(access_token, GMAIL_API_URL)
    }

    /// Point the client at a different base URL (tests).
    pub fn with_base_url(access_token: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
            base_url: base_url.into(),
        }
    }

    /// Paginate `messages.list` until exhausted or `limit` is covered.
    async fn list_ids(&self, params: &FetchParams) -> Result<Vec<String>, MailError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/messages", self.base_url))
                .bearer_auth(self.access_token.expose_secret())
                .query(&[("maxResults", PAGE_SIZE.to_string())]);
            for label in &params.label_ids {
                request = request.query(&[("labelIds", label)]);
            }
            if let Some(query) = &params.query {
                request = request.query(&[("q", query)]);
            }
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: MessageList = send_json(request).await?;
            ids.extend(page.messages.into_iter().map(|m| m.id));

            page_token = page.next_page_token;
            if page_token.is_none() || params.limit.is_some_and(|limit| ids.len() >= limit) {
                break;
            }
        }

        if let Some(limit) = params.limit {
            ids.truncate(limit);
        }
        Ok(ids)
    }

    async fn get_message(&self, id: &str) -> Result<GmailMessage, MailError> {
        let request = self
            .http
            .get(format!("{}/messages/{id}", self.base_url))
            .bearer_auth(self.access_token.expose_secret())
            .query(&[("format", "full")]);
        send_json(request).await
    }
}

#[async_trait]
impl MessageSource for GmailClient {
    async fn fetch(&self, params: &FetchParams) -> Result<Vec<Ticket>, MailError> {
        let ids = self.list_ids(params).await?;
        debug!(count = ids.len(), "Listed mailbox message ids");

        let mut tickets = Vec::with_capacity(ids.len());
        for id in ids {
            let message = self.get_message(&id).await?;
            let payload = message.payload.unwrap_or_default();
            let subject = header_value(&payload, "Subject").unwrap_or_default().to_string();
            let body = body_text(&payload);
            tickets.push(Ticket { id, subject, body });
        }

        info!(count = tickets.len(), "Fetched tickets from Gmail");
        Ok(tickets)
    }
}

async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, MailError> {
    let response = request
        .send()
        .await
        .map_err(|e| MailError::RequestFailed(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(MailError::Status { status, body });
    }

    response
        .json()
        .await
        .map_err(|e| MailError::InvalidPayload(e.to_string()))
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Deserialize)]
struct GmailMessage {
    payload: Option<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    data: Option<String>,
}

// ── Payload flattening ──────────────────────────────────────────────

/// Case-insensitive header lookup on the top-level payload.
fn header_value<'a>(part: &'a MessagePart, name: &str) -> Option<&'a str> {
    part.headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Extract a plain-text body: `text/plain` parts win, `text/html`
/// parts are rendered to text as a fallback, anything else is dropped.
fn body_text(payload: &MessagePart) -> String {
    let mut plain = Vec::new();
    let mut html = Vec::new();
    collect_texts(payload, &mut plain, &mut html);

    let plain = plain.join("\n");
    let plain = plain.trim();
    if !plain.is_empty() {
        return plain.to_string();
    }

    let html = html.join("\n");
    if !html.trim().is_empty() {
        return html2text::from_read(html.as_bytes(), TEXT_WRAP_COLS);
    }

    String::new()
}

/// Recursive MIME walk collecting decoded text parts.
fn collect_texts(part: &MessagePart, plain: &mut Vec<String>, html: &mut Vec<String>) {
    if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
        let text = decode_body_data(data);
        if !text.is_empty() {
            if part.mime_type.starts_with("text/plain") {
                plain.push(text);
            } else if part.mime_type.starts_with("text/html") {
                html.push(text);
            }
        }
    }
    for sub in &part.parts {
        collect_texts(sub, plain, html);
    }
}

/// base64url → text. Gmail pads inconsistently, so padding is stripped
/// before decoding. Non-UTF-8 bytes fall back to a latin-1 reading
/// rather than dropping the body.
fn decode_body_data(data: &str) -> String {
    let bytes = match URL_SAFE_NO_PAD.decode(data.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(_) => return String::new(),
    };
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}
