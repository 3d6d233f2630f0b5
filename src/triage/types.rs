//! Shared types for the ticket triage pipeline.

use serde::{Deserialize, Serialize};

// ── Inbound ticket ──────────────────────────────────────────────────

/// One inbound support request pulled from the mailbox.
///
/// Immutable once fetched. Identity is `id`, which the mailbox assigns
/// and which stays stable across runs — the ledger keys on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Mailbox-assigned identifier.
    pub id: String,
    /// Subject line (may be empty).
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

// ── Category ────────────────────────────────────────────────────────

/// Closed set of ticket categories.
///
/// The wire keys are what the classifier is prompted to emit and what
/// the normalizer parses. Anything outside this set falls back to
/// [`Category::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Hardware/software failure, outage, slowness, system error.
    TechnicalIssue,
    /// Paperwork, contracts, invoices, HR, information requests.
    AdminRequest,
    /// Forgotten password, locked account, login failure.
    AccessAuth,
    /// Usage guidance, feature questions, general assistance.
    UserSupport,
    /// Reproducible malfunction of a live service feature.
    ServiceBug,
}

impl Category {
    /// Fallback when the classifier emits something outside the set.
    pub const DEFAULT: Category = Category::UserSupport;

    /// All members, in prompt order.
    pub const ALL: [Category; 5] = [
        Category::TechnicalIssue,
        Category::AdminRequest,
        Category::AccessAuth,
        Category::UserSupport,
        Category::ServiceBug,
    ];

    /// Wire key used in classification responses.
    pub fn key(self) -> &'static str {
        match self {
            Category::TechnicalIssue => "probleme_technique",
            Category::AdminRequest => "demande_administrative",
            Category::AccessAuth => "probleme_acces_auth",
            Category::UserSupport => "support_utilisateur",
            Category::ServiceBug => "bug_service",
        }
    }

    /// Parse a wire key. `None` for anything outside the closed set.
    pub fn from_key(key: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Destination sheet for routed tickets.
    ///
    /// Total mapping — every category routes somewhere. There is no
    /// dedicated sheet for service bugs, so they land on the technical
    /// issue sheet.
    pub fn sheet(self) -> &'static str {
        match self {
            Category::TechnicalIssue | Category::ServiceBug => "Problème technique informatique",
            Category::AdminRequest => "Demande administrative",
            Category::AccessAuth => "Problème d’accès / authentification",
            Category::UserSupport => "Demande de support utilisateur",
        }
    }
}

// ── Urgency ─────────────────────────────────────────────────────────

/// Ordered urgency scale, least to most severe.
///
/// Wire labels are the French forms the classifier is prompted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    /// Simple information request, no impact.
    Negligible,
    /// Minor problem, mild inconvenience.
    Low,
    /// Noticeable but workaroundable.
    Moderate,
    /// A user or team blocked on an important task.
    High,
    /// Major impact, production down, security or data at stake.
    Critical,
}

impl Urgency {
    /// Fallback when the classifier emits an unknown level.
    pub const DEFAULT: Urgency = Urgency::Moderate;

    /// All levels, least to most severe.
    pub const ALL: [Urgency; 5] = [
        Urgency::Negligible,
        Urgency::Low,
        Urgency::Moderate,
        Urgency::High,
        Urgency::Critical,
    ];

    /// Wire label used in classification responses and routed rows.
    pub fn label(self) -> &'static str {
        match self {
            Urgency::Negligible => "Anodine",
            Urgency::Low => "Faible",
            Urgency::Moderate => "Modérée",
            Urgency::High => "Élevée",
            Urgency::Critical => "Critique",
        }
    }

    /// Parse a wire label. `None` for anything outside the scale.
    pub fn from_label(label: &str) -> Option<Self> {
        Urgency::ALL.into_iter().find(|u| u.label() == label)
    }
}

// ── Classification ──────────────────────────────────────────────────

/// Normalized output of a classification call.
///
/// Never persisted standalone — only as a routed row. Category and
/// urgency are guaranteed members of their closed sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub urgency: Urgency,
    /// Short summary, trimmed. Possibly empty, never absent.
    pub summary: String,
}

// ── Run reporting ───────────────────────────────────────────────────

/// Outcome for a single ticket, in the order it was attempted.
#[derive(Debug, Clone)]
pub struct TicketOutcome {
    pub id: String,
    pub subject: String,
    pub status: OutcomeStatus,
}

/// What happened to one ticket.
#[derive(Debug, Clone)]
pub enum OutcomeStatus {
    /// Classified and durably appended to the row store.
    Routed {
        category: Category,
        urgency: Urgency,
        sheet: &'static str,
    },
    /// Failed somewhere; not in the ledger, retried next run.
    Skipped { reason: String },
}

/// Aggregate report for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Tickets returned by the mailbox (before dedup).
    pub fetched: usize,
    /// Tickets routed and recorded this run.
    pub processed: usize,
    /// Tickets that failed and were left for the next run.
    pub skipped: usize,
    /// Ledger size after the final snapshot.
    pub ledger_size: usize,
    /// Per-ticket outcomes, strictly in fetch order.
    pub outcomes: Vec<TicketOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keys_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()), Some(category));
        }
        assert_eq!(Category::from_key("totally_unknown"), None);
    }

    #[test]
    fn every_category_has_a_sheet() {
        for category in Category::ALL {
            assert!(!category.sheet().is_empty());
        }
    }

    #[test]
    fn service_bug_shares_technical_sheet() {
        assert_eq!(
            Category::ServiceBug.sheet(),
            Category::TechnicalIssue.sheet()
        );
    }

    #[test]
    fn urgency_labels_round_trip() {
        for urgency in Urgency::ALL {
            assert_eq!(Urgency::from_label(urgency.label()), Some(urgency));
        }
        assert_eq!(Urgency::from_label("Urgente"), None);
    }

    #[test]
    fn urgency_is_ordered() {
        assert!(Urgency::Negligible < Urgency::Low);
        assert!(Urgency::Low < Urgency::Moderate);
        assert!(Urgency::Moderate < Urgency::High);
        assert!(Urgency::High < Urgency::Critical);
    }

    #[test]
    fn defaults_are_members_of_their_sets() {
        assert!(Category::ALL.contains(&Category::DEFAULT));
        assert!(Urgency::ALL.contains(&Urgency::DEFAULT));
    }
}
