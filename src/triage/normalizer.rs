//! Classification normalizer — turns raw model output into a validated
//! [`Classification`].
//!
//! The model is prompted for strict JSON but does not always comply:
//! responses arrive wrapped in prose, markdown fences, or with invented
//! category names. Parsing tries the whole text first, then the first
//! balanced `{...}` span. Out-of-set categories and urgencies are
//! replaced with their defaults; an unparsable response is a hard
//! error the caller must handle.

use tracing::warn;

use crate::error::NormalizeError;
use crate::triage::types::{Category, Classification, Urgency};

/// Raw response shape. Missing fields default to empty strings so the
/// validation layer below decides what to do with them.
#[derive(Debug, serde::Deserialize)]
struct RawClassification {
    #[serde(default)]
    categorie: String,
    #[serde(default)]
    urgence: String,
    #[serde(default)]
    synthese: String,
}

/// Parse raw model output into a validated classification.
///
/// Guarantees: category and urgency are members of their closed sets,
/// summary is trimmed (possibly empty). Returns
/// [`NormalizeError::MalformedResponse`] when no JSON object can be
/// extracted at all — never a silent default result.
pub fn parse_classification(raw: &str) -> Result<Classification, NormalizeError> {
    let parsed: RawClassification = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => {
            let span = balanced_object_span(raw).ok_or_else(|| malformed(raw))?;
            serde_json::from_str(span).map_err(|_| malformed(raw))?
        }
    };

    let category = Category::from_key(&parsed.categorie).unwrap_or_else(|| {
        warn!(
            categorie = %parsed.categorie,
            fallback = Category::DEFAULT.key(),
            "Unknown category in model response, using default"
        );
        Category::DEFAULT
    });

    let urgency = Urgency::from_label(&parsed.urgence).unwrap_or_else(|| {
        warn!(
            urgence = %parsed.urgence,
            fallback = Urgency::DEFAULT.label(),
            "Unknown urgency in model response, using default"
        );
        Urgency::DEFAULT
    });

    Ok(Classification {
        category,
        urgency,
        summary: parsed.synthese.trim().to_string(),
    })
}

fn malformed(raw: &str) -> NormalizeError {
    NormalizeError::MalformedResponse {
        raw: raw.to_string(),
    }
}

/// First balanced `{...}` span in `text`, if any.
///
/// Brace counting is string-aware so braces inside JSON string values
/// don't unbalance the scan.
fn balanced_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
