// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the webhook gate service.
//!
//! The webhook route runs the admission pipeline, then routes the admitted
//! payload to one output channel and hands it to the channel sink.

use crate::auth::{AuthConfig, CredentialStore};
use crate::catalog::EventCatalog;
use crate::config::{Config, WebhookConfig};
use crate::delivery::{ChannelSink, Delivery};
use crate::error::Result;
use crate::gatekeeper::{admit, AdmissionResult, BotDetector, GatekeeperConfig, InboundRequest, Rejection};
use crate::metrics::{GateMetrics, Outcome};
use crate::response::ResponseConfig;
use crate::router::{route, ChannelOutputs, InboundEvent, RoutingDecision};
use crate::topology::{OutputTopology, Registration};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

/// Per-endpoint settings, read as one snapshot per request.
#[derive(Debug, Clone)]
pub struct EndpointSettings {
    pub gate: GatekeeperConfig,
    pub auth: AuthConfig,
    pub registration: Registration,
    pub response: ResponseConfig,
}

impl EndpointSettings {
    /// Resolve settings, computing the output topology once.
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            gate: config.options.clone(),
            auth: config.authentication,
            registration: Registration::new(config.events.clone()),
            response: config.response.clone(),
        }
    }
}

/// Result of processing one webhook request.
#[derive(Debug, Clone)]
pub enum EndpointOutcome {
    /// Refused by the gatekeeper
    Rejected(Rejection),
    /// Admitted but nothing to deliver
    NoResponse,
    /// Delivered to one channel
    Delivered {
        channel: usize,
        label: String,
        response: ResponseConfig,
    },
}

impl IntoResponse for EndpointOutcome {
    fn into_response(self) -> Response {
        match self {
            EndpointOutcome::Rejected(rejection) => rejection.into_response(),
            EndpointOutcome::NoResponse => StatusCode::OK.into_response(),
            EndpointOutcome::Delivered { response, .. } => response.into_response_for_delivery(),
        }
    }
}

/// The webhook endpoint and its collaborators.
pub struct WebhookEndpoint {
    settings: RwLock<Arc<EndpointSettings>>,
    credentials: Arc<dyn CredentialStore>,
    bots: Arc<dyn BotDetector>,
    sink: Arc<dyn ChannelSink>,
}

impl WebhookEndpoint {
    pub fn new(
        config: &WebhookConfig,
        credentials: Arc<dyn CredentialStore>,
        bots: Arc<dyn BotDetector>,
        sink: Arc<dyn ChannelSink>,
    ) -> Self {
        Self {
            settings: RwLock::new(Arc::new(EndpointSettings::from_config(config))),
            credentials,
            bots,
            sink,
        }
    }

    /// Current settings snapshot.
    pub async fn settings(&self) -> Arc<EndpointSettings> {
        self.settings.read().await.clone()
    }

    /// Replace the endpoint settings. Requests already running keep the
    /// snapshot they started with.
    pub async fn reconfigure(&self, config: &WebhookConfig) {
        let settings = Arc::new(EndpointSettings::from_config(config));
        info!(
            channels = settings.registration.topology().len(),
            "Webhook endpoint reconfigured"
        );
        *self.settings.write().await = settings;
    }

    /// Process one request end to end.
    pub async fn handle(
        &self,
        request: &InboundRequest,
        body: &[u8],
    ) -> Result<EndpointOutcome> {
        let settings = self.settings().await;

        let admission = admit(
            request,
            &settings.gate,
            settings.auth,
            self.credentials.as_ref(),
            self.bots.as_ref(),
        )
        .await?;

        if let AdmissionResult::Rejected(rejection) = admission {
            return Ok(EndpointOutcome::Rejected(rejection));
        }

        let payload: Value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(body).unwrap_or_else(|e| {
                debug!(error = %e, "Body is not JSON, no event to route");
                Value::Null
            })
        };
        let event = InboundEvent::from_payload(&payload);

        let registration = &settings.registration;
        let decision = route(
            registration.subscription(),
            registration.topology(),
            &event,
            payload,
        );

        match decision {
            RoutingDecision::Drop => Ok(EndpointOutcome::NoResponse),
            RoutingDecision::Deliver { channel, payload } => {
                let topology = registration.topology();
                let outputs = ChannelOutputs::deliver(topology, channel, payload)?;
                let label = channel_label(topology, channel);

                self.sink
                    .deliver(Delivery {
                        channel,
                        label: label.clone(),
                        outputs,
                    })
                    .await?;

                Ok(EndpointOutcome::Delivered {
                    channel,
                    label,
                    response: settings.response.clone(),
                })
            }
        }
    }
}

fn channel_label(topology: &OutputTopology, channel: usize) -> String {
    topology
        .channels()
        .get(channel)
        .map(|c| c.label.clone())
        .unwrap_or_default()
}

/// Shared application state.
pub struct AppState {
    pub endpoint: WebhookEndpoint,
    pub catalog: EventCatalog,
    pub metrics: GateMetrics,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "webhook-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Webhook endpoint.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let request = InboundRequest::from_parts(
        headers,
        connect_info.map(|ConnectInfo(addr)| addr),
        state.config.trusted_proxy_hops,
    );
    debug!(
        remote_ip = ?request.remote_ip,
        proxy_chain = ?request.proxy_chain,
        bytes = body.len(),
        "Processing webhook request"
    );

    let outcome = match state.endpoint.handle(&request, &body).await {
        Ok(outcome) => outcome,
        Err(e) => {
            state.metrics.record(Outcome::Error);
            return Err(e);
        }
    };

    match &outcome {
        EndpointOutcome::Rejected(rejection) => {
            state.metrics.record(rejection.reason.into());
        }
        EndpointOutcome::NoResponse => {
            debug!("No event routed");
            state.metrics.record(Outcome::Dropped);
        }
        EndpointOutcome::Delivered { channel, label, .. } => {
            debug!(channel, label = %label, "Event handed to sink");
            state.metrics.record(Outcome::Delivered);
            state.metrics.record_delivery(label);
        }
    }

    Ok(outcome.into_response())
}

/// Selectable events.
pub async fn events(State(state): State<Arc<AppState>>) -> Json<EventCatalog> {
    Json(state.catalog.clone())
}

/// Output channels of the current configuration.
pub async fn outputs(State(state): State<Arc<AppState>>) -> Json<OutputTopology> {
    let settings = state.endpoint.settings().await;
    Json(settings.registration.topology().clone())
}

/// Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/events", get(events))
        .route("/outputs", get(outputs))
        .route(&state.config.webhook.route_path(), post(webhook));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
