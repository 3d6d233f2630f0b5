//! LLM-backed ticket classifier.
//!
//! Builds the triage prompts, runs one completion through the bounded
//! retry controller, and normalizes whatever comes back. Each
//! classification call gets a fresh retry budget.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{LlmError, PipelineError};
use crate::llm::retry::retry_with_delay;
use crate::llm::Completion;
use crate::triage::normalizer::parse_classification;
use crate::triage::types::Classification;

/// Total attempts per classification call, rate-limit signals only.
const MAX_ATTEMPTS: u32 = 5;

/// Fixed backoff between rate-limited attempts. Blocks the whole
/// pipeline on purpose: the rate limit applies to the process, not to
/// one message.
const RETRY_DELAY: Duration = Duration::from_secs(10);

/// Body text sent to the model is capped (token economy — the
/// classifier runs on every message).
const BODY_PREVIEW_CHARS: usize = 4000;

/// Triage instructions. Strict JSON output, closed category set,
/// 5-level urgency scale.
const SYSTEM_PROMPT: &str = r#"Tu es un agent de tri de tickets support.

À partir du sujet et du contenu d'un email, tu dois :

1) Classer le ticket dans UNE SEULE catégorie parmi :
   - probleme_technique : problème matériel ou logiciel, panne, lenteur, erreur système
   - demande_administrative : paperasse, contrat, facture, RH, demandes d'information
   - probleme_acces_auth : mot de passe oublié, compte bloqué, échec de connexion
   - support_utilisateur : accompagnement, aide à l'utilisation, question sur une fonctionnalité
   - bug_service : dysfonctionnement d'une fonctionnalité, bug reproductible sur un service déjà en place

2) Attribuer un niveau d'urgence parmi :
   - Anodine
   - Faible
   - Modérée
   - Élevée
   - Critique

Règles d'urgence :
- Critique : impact majeur, service bloqué pour plusieurs utilisateurs, production à l'arrêt, sécurité ou données critiques en jeu.
- Élevée : forte gêne, un utilisateur ou équipe bloquée sur une tâche importante, délai serré.
- Modérée : gêne notable mais contournable, impact limité dans le temps.
- Faible : problème mineur, simple inconfort.
- Anodine : demande d'information simple, pas de blocage, pas d'impact.

3) Produire une synthèse courte (1 à 3 phrases max) en français.

Tu dois répondre STRICTEMENT au format JSON :

{
  "categorie": "...",
  "urgence": "...",
  "synthese": "..."
}"#;

/// Classifies one ticket at a time against the completion backend.
pub struct TicketClassifier {
    llm: Arc<dyn Completion>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl TicketClassifier {
    pub fn new(llm: Arc<dyn Completion>) -> Self {
        Self {
            llm,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Override the retry knobs (tests).
    pub fn with_retry(llm: Arc<dyn Completion>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            llm,
            max_attempts,
            retry_delay,
        }
    }

    /// Classify one ticket: retry-wrapped completion, then
    /// normalization. Rate-limit exhaustion and malformed responses
    /// both surface as errors for the orchestrator to record.
    pub async fn classify(
        &self,
        subject: &str,
        body: &str,
    ) -> Result<Classification, PipelineError> {
        let user_prompt = build_user_prompt(subject, body);

        let raw = retry_with_delay(
            self.max_attempts,
            self.retry_delay,
            LlmError::is_rate_limited,
            || self.llm.complete(SYSTEM_PROMPT, &user_prompt),
        )
        .await?;

        Ok(parse_classification(&raw)?)
    }
}

/// Build the per-ticket user prompt, body truncated.
fn build_user_prompt(subject: &str, body: &str) -> String {
    let body_preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
    format!("Sujet: {subject}\n\nContenu:\n{body_preview}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::triage::types::{Category, Urgency};

    /// Mock backend: fails with `failures` rate limits, then answers.
    struct FlakyCompletion {
        response: String,
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyCompletion {
        fn new(response: &str, failures: u32) -> Self {
            Self {
                response: response.to_string(),
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Completion for FlakyCompletion {
        fn model_name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(LlmError::RateLimited { retry_after: None })
            } else {
                Ok(self.response.clone())
            }
        }
    }

    /// Mock backend: always fails with a non-retryable error.
    struct BrokenCompletion {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Completion for BrokenCompletion {
        fn model_name(&self) -> &str {
            "broken"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::RequestFailed {
                reason: "upstream down".into(),
            })
        }
    }

    const GOOD_RESPONSE: &str =
        r#"{"categorie": "probleme_acces_auth", "urgence": "Élevée", "synthese": "Compte bloqué."}"#;

    #[tokio::test]
    async fn classifies_clean_response() {
        let llm = Arc::new(FlakyCompletion::new(GOOD_RESPONSE, 0));
        let classifier = TicketClassifier::new(llm);

        let result = classifier
            .classify("Compte bloqué", "Je ne peux plus me connecter.")
            .await
            .unwrap();
        assert_eq!(result.category, Category::AccessAuth);
        assert_eq!(result.urgency, Urgency::High);
        assert_eq!(result.summary, "Compte bloqué.");
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_from_transient_rate_limits() {
        let llm = Arc::new(FlakyCompletion::new(GOOD_RESPONSE, 3));
        let classifier = TicketClassifier::new(Arc::clone(&llm) as Arc<dyn Completion>);

        let result = classifier.classify("Sujet", "Contenu").await.unwrap();
        assert_eq!(result.category, Category::AccessAuth);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_exhaustion_propagates_after_five_attempts() {
        let llm = Arc::new(FlakyCompletion::new(GOOD_RESPONSE, u32::MAX));
        let classifier = TicketClassifier::new(Arc::clone(&llm) as Arc<dyn Completion>);

        let err = classifier.classify("Sujet", "Contenu").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Llm(LlmError::RateLimited { .. })
        ));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn non_rate_limit_failure_is_not_retried() {
        let llm = Arc::new(BrokenCompletion {
            calls: AtomicU32::new(0),
        });
        let classifier = TicketClassifier::new(Arc::clone(&llm) as Arc<dyn Completion>);

        let err = classifier.classify("Sujet", "Contenu").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Llm(LlmError::RequestFailed { .. })
        ));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_response_surfaces_as_normalize_error() {
        let llm = Arc::new(FlakyCompletion::new("pas de JSON ici", 0));
        let classifier = TicketClassifier::new(llm);

        let err = classifier.classify("Sujet", "Contenu").await.unwrap_err();
        assert!(matches!(err, PipelineError::Normalize(_)));
    }

    #[test]
    fn user_prompt_contains_subject_and_body() {
        let prompt = build_user_prompt("Imprimante en panne", "Rien ne sort du bac.");
        assert!(prompt.contains("Sujet: Imprimante en panne"));
        assert!(prompt.contains("Rien ne sort du bac."));
    }

    #[test]
    fn user_prompt_truncates_long_bodies() {
        let long_body = "x".repeat(10_000);
        let prompt = build_user_prompt("Sujet", &long_body);
        assert!(prompt.len() < BODY_PREVIEW_CHARS + 100);
    }

    #[test]
    fn system_prompt_names_every_category_and_level() {
        for category in Category::ALL {
            assert!(SYSTEM_PROMPT.contains(category.key()));
        }
        for urgency in Urgency::ALL {
            assert!(SYSTEM_PROMPT.contains(urgency.label()));
        }
    }
}
