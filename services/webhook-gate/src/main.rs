// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Webhook Gate Service
//!
//! An ingress filter and event router for a single WAHA webhook endpoint.
//! Each request passes, in order:
//!
//! - Domain whitelist (Host / Origin)
//! - IP whitelist (peer address / X-Forwarded-For)
//! - Bot filter (optional)
//! - Header authentication (optional)
//!
//! Admitted events are routed to one output channel and handed to the sink.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is
//! honoured):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `WEBHOOK_PATH`: Endpoint path (default: change-this-path)
//! - `WEBHOOK_EVENTS`: Comma separated subscription (default: *)
//! - `WEBHOOK_AUTH`: `none` or `headerAuth` (default: none)
//! - `WEBHOOK_AUTH_HEADER_NAME` / `WEBHOOK_AUTH_API_KEY`: header credential
//!
//! See [`Config::from_lookup`] for the full list.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use webhook_gate::{
    auth::EnvCredentialStore,
    catalog::EventCatalog,
    config::Config,
    delivery::TracingSink,
    gatekeeper::UserAgentBotDetector,
    handlers::{router, AppState, WebhookEndpoint},
    metrics::GateMetrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let catalog = match &config.catalog_path {
        Some(path) => EventCatalog::load(path)?,
        None => EventCatalog::builtin()?,
    };

    let unknown = catalog.unknown_tokens(&config.webhook.events);
    if !unknown.is_empty() {
        warn!(tokens = ?unknown, "Subscribed events missing from the event catalog");
    }

    info!(
        bind_addr = %config.bind_addr,
        path = %config.webhook.route_path(),
        events = ?config.webhook.events.tokens(),
        authentication = ?config.webhook.authentication,
        ignore_bots = config.webhook.options.ignore_bots,
        "Starting webhook gate"
    );

    // Create application state
    let endpoint = WebhookEndpoint::new(
        &config.webhook,
        Arc::new(EnvCredentialStore),
        Arc::new(UserAgentBotDetector::new()?),
        Arc::new(TracingSink),
    );
    info!(
        outputs = ?endpoint.settings().await.registration.topology().labels().collect::<Vec<_>>(),
        "Output channels resolved"
    );

    let state = Arc::new(AppState {
        endpoint,
        catalog,
        metrics: GateMetrics::new()?,
        config: config.clone(),
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
