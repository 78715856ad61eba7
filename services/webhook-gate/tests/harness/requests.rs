// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request builders and service wiring for tests.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use webhook_gate::{
    auth::{StaticCredentialStore, StoredCredential},
    catalog::EventCatalog,
    config::{Config, WebhookConfig},
    delivery::BroadcastSink,
    gatekeeper::{InboundRequest, UserAgentBotDetector},
    handlers::{AppState, WebhookEndpoint},
    metrics::GateMetrics,
};

pub const HEADER_NAME: &str = "X-Api-Key";
pub const API_KEY: &str = "s3cret-key";

/// Fluent builder for inbound requests.
///
/// Requests are assembled through [`InboundRequest::from_parts`], the same
/// path the HTTP handler takes.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    headers: HeaderMap,
    peer: Option<IpAddr>,
    trusted_hops: usize,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        self
    }

    pub fn host(self, host: &str) -> Self {
        self.header(header::HOST.as_str(), host)
    }

    pub fn origin(self, origin: &str) -> Self {
        self.header(header::ORIGIN.as_str(), origin)
    }

    pub fn user_agent(self, user_agent: &str) -> Self {
        self.header(header::USER_AGENT.as_str(), user_agent)
    }

    pub fn api_key(self, key: &str) -> Self {
        self.header(HEADER_NAME, key)
    }

    pub fn remote_ip(mut self, ip: &str) -> Self {
        self.peer = Some(ip.parse().unwrap());
        self
    }

    pub fn forwarded_for(self, chain: &str) -> Self {
        self.header("x-forwarded-for", chain)
    }

    pub fn trusted_hops(mut self, hops: usize) -> Self {
        self.trusted_hops = hops;
        self
    }

    pub fn build(self) -> InboundRequest {
        let peer = self.peer.map(|ip| SocketAddr::new(ip, 40000));
        InboundRequest::from_parts(self.headers, peer, self.trusted_hops)
    }
}

/// Credential store holding the test header credential.
pub fn credential_store() -> Arc<StaticCredentialStore> {
    Arc::new(StaticCredentialStore::new(StoredCredential::new(HEADER_NAME, API_KEY)))
}

/// Endpoint wired to test collaborators; the sink has a live subscriber.
pub fn endpoint(config: &WebhookConfig) -> (WebhookEndpoint, Arc<BroadcastSink>) {
    let sink = Arc::new(BroadcastSink::new(64));
    let endpoint = WebhookEndpoint::new(
        config,
        credential_store(),
        Arc::new(UserAgentBotDetector::new().unwrap()),
        sink.clone(),
    );
    (endpoint, sink)
}

/// Full application state for HTTP tests.
pub fn app_state(config: Config) -> (Arc<AppState>, Arc<BroadcastSink>) {
    let (endpoint, sink) = self::endpoint(&config.webhook);
    let state = Arc::new(AppState {
        endpoint,
        catalog: EventCatalog::builtin().unwrap(),
        metrics: GateMetrics::new().unwrap(),
        config,
    });
    (state, sink)
}
