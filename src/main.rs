// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sheet-Intake server
//!
//! Authorizes one operator against Google OAuth2 and appends form
//! submissions to a Google Sheet.

use sheet_intake::{
    config::{Config, DuplicateGuardMode},
    db::{FirestoreDb, RecordStore},
    services::ClientIdentity,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
    })?;
    tracing::info!(port = config.port, "Starting Sheet-Intake");

    // Client identity is mandatory; no partial startup without it
    let identity = ClientIdentity::load(&config.credentials_path).inspect_err(|e| {
        tracing::error!(
            path = %config.credentials_path.display(),
            error = %e,
            "Failed to load client credentials"
        );
    })?;
    tracing::info!(client_id = %identity.client_id, "Client credentials loaded");

    // Initialize the duplicate guard backend
    let records = match config.duplicate_guard {
        DuplicateGuardMode::Off => None,
        DuplicateGuardMode::Memory => Some(RecordStore::in_memory()),
        DuplicateGuardMode::Firestore => {
            let project_id = config.gcp_project_id.as_deref().unwrap_or_default();
            Some(RecordStore::Firestore(FirestoreDb::new(project_id).await?))
        }
    };
    tracing::info!(mode = ?config.duplicate_guard, "Duplicate guard configured");

    let state = Arc::new(AppState::new(config.clone(), identity, records));

    // Previously granted authorization survives restarts
    match state.token_store.load_persisted().await {
        Ok(Some(_)) => {}
        Ok(None) => tracing::info!("No saved tokens; authorization required"),
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable token file"),
    }

    // Build router
    let app = sheet_intake::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sheet_intake=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
