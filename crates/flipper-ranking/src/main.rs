//! Headless ranking run
//!
//! Resolves the configured session, runs one collection against the scoring
//! service and prints the first page of the ranked view as JSON on stdout.
//! Logs go to stderr.

use std::sync::Arc;

use anyhow::Context;
use flipper_core::{CollectionEvent, ViewResult};
use flipper_ranking::config::AppConfig;
use flipper_ranking::panel::{Notice, RankingPanel};
use flipper_ranking::scoring::ScoringClient;
use flipper_ranking::wallet::{connect_session, MemoryCredentialStore, StaticWallet};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Serialize)]
struct RunOutput {
    outcome: Option<CollectionEvent>,
    view: ViewResult,
    notices: Vec<Notice>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("flipper_ranking=info")
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Using default configuration");
        AppConfig::default()
    });

    tracing::info!(
        api_url = %config.scoring.api_url,
        interval_seconds = config.poller.interval_seconds,
        page_size = config.view.page_size,
        "Configuration loaded"
    );

    let wallet = StaticWallet::single(config.session.wallet_address.clone());
    let credentials = MemoryCredentialStore::with_signature(config.session.signature.clone());
    let session = connect_session(&wallet, &credentials, &config.session.contract_address)
        .await
        .context("Failed to resolve session (set FLIPPER__SESSION__* variables)")?;

    let client = Arc::new(ScoringClient::new(&config.scoring)?);
    let mut panel = RankingPanel::new(client, &config)?;

    let outcome = tokio::select! {
        outcome = panel.refresh(&session) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, cancelling collection");
            None
        }
    };
    panel.close();

    let mut notices: Vec<Notice> = panel.modal().cloned().into_iter().collect();
    notices.extend(panel.take_toasts());

    let output = RunOutput {
        outcome,
        view: panel.view(),
        notices,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    panel.require_collection(output.outcome.as_ref())?;
    Ok(())
}
