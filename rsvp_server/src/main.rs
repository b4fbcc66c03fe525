//! RSVP server: loads settings from env / `.env`, builds the configured guest store
//! and serves the HTTP routes.
//!
//! Run from repo root: `cargo run -p rsvp-server`

use std::sync::Arc;
use tokio::net::TcpListener;
use wedding_rsvp::{app, logging, AppState, GuestRepository, MemoryStore, RsvpConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing("wedding_rsvp=info,rsvp_server=info");

    let config = RsvpConfig::load()?;
    let repo = match GuestRepository::from_config(&config).await {
        Ok(repo) if repo.is_initialized() => repo,
        Ok(_) => {
            tracing::warn!("remote guest store not configured; using the local in-memory store");
            GuestRepository::new(Arc::new(MemoryStore::new()), config.guests.clone())
        }
        Err(e) => {
            tracing::warn!(error = %e, "guest store failed to initialize; using the local in-memory store");
            GuestRepository::new(Arc::new(MemoryStore::new()), config.guests.clone())
        }
    };

    let router = app(AppState::new(repo), config.body_limit_bytes);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
