use std::sync::Arc;

use ticket_triage::config::TriageConfig;
use ticket_triage::ledger::Ledger;
use ticket_triage::llm::GroqClient;
use ticket_triage::mailbox::GmailClient;
use ticket_triage::rowstore::SheetsClient;
use ticket_triage::triage::classifier::TicketClassifier;
use ticket_triage::triage::processor::TicketProcessor;
use ticket_triage::triage::types::OutcomeStatus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = TriageConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  required: GROQ_API_KEY, GMAIL_ACCESS_TOKEN, SHEETS_ACCESS_TOKEN, GOOGLE_SHEETS_SPREADSHEET_ID");
        std::process::exit(1);
    });

    eprintln!("📨 Ticket triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Ledger: {}", config.ledger_path.display());
    match config.limit {
        Some(limit) => eprintln!("   Limit: {limit}"),
        None => eprintln!("   Limit: none (whole mailbox)"),
    }
    if !config.label_ids.is_empty() {
        eprintln!("   Labels: {}", config.label_ids.join(", "));
    }
    if let Some(query) = &config.query {
        eprintln!("   Query: {query}");
    }
    eprintln!();

    let llm = Arc::new(GroqClient::new(config.groq_api_key.clone()));
    let source = Arc::new(GmailClient::new(config.gmail_token.clone()));
    let store = Arc::new(SheetsClient::new(
        config.sheets_token.clone(),
        config.spreadsheet_id.clone(),
    ));

    let processor = TicketProcessor::new(source, TicketClassifier::new(llm), store);

    let mut ledger = Ledger::load(&config.ledger_path).await;
    let report = processor.run(&mut ledger, &config.fetch_params()).await?;

    for outcome in &report.outcomes {
        match &outcome.status {
            OutcomeStatus::Routed { category, urgency, sheet } => {
                println!(
                    "[OK]   '{}' -> {} ({}) -> {}",
                    outcome.subject,
                    category.key(),
                    urgency.label(),
                    sheet
                );
            }
            OutcomeStatus::Skipped { reason } => {
                println!("[SKIP] '{}' ({}): {}", outcome.subject, outcome.id, reason);
            }
        }
    }

    println!(
        "\nDone: {} processed, {} skipped, {} ids in ledger.",
        report.processed, report.skipped, report.ledger_size
    );

    Ok(())
}
