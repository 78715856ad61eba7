// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Admission pipeline for inbound webhook requests.
//!
//! Checks run in a fixed order and the first failure ends the pipeline:
//! 1. Domain whitelist (Host and Origin headers)
//! 2. IP whitelist (peer address and proxy chain)
//! 3. Bot filter (only when `ignore_bots` is set)
//! 4. Authentication
//!
//! Whitelist rejections are plain 403s. Bot and authentication rejections
//! carry a `WWW-Authenticate` challenge.

use crate::auth::{authenticate, AuthConfig, AuthFailure, CredentialStore};
use crate::error::{GateError, Result};
use crate::matcher::Whitelist;
use async_trait::async_trait;
use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::{debug, info};

pub const DOMAIN_REJECTED: &str = "Domain is not whitelisted to access the webhook!";
pub const IP_REJECTED: &str = "IP is not whitelisted to access the webhook!";
const CHALLENGE: &str = "Basic realm=\"Webhook\"";

/// Pre-authentication admission settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatekeeperConfig {
    /// Refuse requests whose user agent looks like a crawler or previewer
    #[serde(default)]
    pub ignore_bots: bool,

    /// Allowed IP fragments (empty allows all)
    #[serde(default)]
    pub ip_whitelist: Whitelist,

    /// Allowed domain fragments (empty allows all)
    #[serde(default)]
    pub domain_whitelist: Whitelist,
}

/// The parts of an inbound request the gatekeeper inspects.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub headers: HeaderMap,
    /// Address the transport reports for the peer
    pub remote_ip: Option<String>,
    /// Forwarded addresses added by trusted proxies, client first
    pub proxy_chain: Vec<String>,
}

impl InboundRequest {
    /// Build from the request headers and the socket peer, if known.
    ///
    /// Only the last `trusted_hops` entries of `X-Forwarded-For` enter the
    /// proxy chain, since anything further left was written by the client.
    /// With no trusted hops the header is ignored.
    pub fn from_parts(headers: HeaderMap, peer: Option<SocketAddr>, trusted_hops: usize) -> Self {
        let forwarded: Vec<String> = if trusted_hops == 0 {
            Vec::new()
        } else {
            headers
                .get_all("x-forwarded-for")
                .iter()
                .filter_map(|value| value.to_str().ok())
                .flat_map(|value| value.split(','))
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect()
        };
        let skip = forwarded.len().saturating_sub(trusted_hops);

        Self {
            remote_ip: peer.map(|addr| addr.ip().to_string()),
            proxy_chain: forwarded.into_iter().skip(skip).collect(),
            headers,
        }
    }

    fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    Domain,
    Ip,
    Bot,
    Auth(AuthFailure),
}

/// A terminal refusal: status, extra headers and a plain-text body.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Rejection {
    fn whitelist(reason: RejectionReason, body: &str) -> Self {
        Self {
            reason,
            status: StatusCode::FORBIDDEN,
            headers: HeaderMap::new(),
            body: body.to_string(),
        }
    }

    fn challenge(reason: RejectionReason, failure: AuthFailure) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
        Self {
            reason,
            status: failure.status(),
            headers,
            body: failure.to_string(),
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Outcome of the admission pipeline.
#[must_use]
#[derive(Debug, Clone)]
pub enum AdmissionResult {
    Admitted,
    Rejected(Rejection),
}

impl AdmissionResult {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionResult::Admitted)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            AdmissionResult::Admitted => None,
            AdmissionResult::Rejected(r) => Some(r),
        }
    }
}

/// Host collaborator deciding whether a user agent belongs to a bot.
#[async_trait]
pub trait BotDetector: Send + Sync {
    async fn is_bot(&self, user_agent: Option<&str>) -> Result<bool>;
}

/// Crawler, link previewer and scripted client markers.
const BOT_PATTERN: &str = r"(?i)(bot\b|bot/|crawl|spider|slurp|scrape|facebookexternalhit|embedly|preview|lighthouse|headlesschrome|phantomjs|^curl/|^wget/|python-requests|go-http-client|^java/|libwww-perl|httpclient)";

/// Bot detector matching the user agent against known bot markers.
#[derive(Debug, Clone)]
pub struct UserAgentBotDetector {
    pattern: Regex,
}

impl UserAgentBotDetector {
    pub fn new() -> Result<Self> {
        Self::with_pattern(BOT_PATTERN)
    }

    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| GateError::Internal(format!("invalid bot pattern: {e}")))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, user_agent: &str) -> bool {
        self.pattern.is_match(user_agent)
    }
}

#[async_trait]
impl BotDetector for UserAgentBotDetector {
    async fn is_bot(&self, user_agent: Option<&str>) -> Result<bool> {
        Ok(user_agent.is_some_and(|ua| !ua.is_empty() && self.matches(ua)))
    }
}

/// Run the admission pipeline for one request.
///
/// Collaborator failures from the bot detector propagate as errors; every
/// other refusal is returned as [`AdmissionResult::Rejected`].
pub async fn admit(
    request: &InboundRequest,
    gate: &GatekeeperConfig,
    auth: AuthConfig,
    credentials: &dyn CredentialStore,
    bots: &dyn BotDetector,
) -> Result<AdmissionResult> {
    // Domain
    let host = request.header(header::HOST);
    let domains: Vec<&str> = [host, request.header(header::ORIGIN)]
        .into_iter()
        .flatten()
        .collect();

    if !gate.domain_whitelist.allows(&domains, host) {
        info!(domains = ?domains, "Domain not whitelisted");
        return Ok(AdmissionResult::Rejected(Rejection::whitelist(
            RejectionReason::Domain,
            DOMAIN_REJECTED,
        )));
    }

    // IP
    let chain: Vec<&str> = request.proxy_chain.iter().map(String::as_str).collect();
    if !gate.ip_whitelist.allows(&chain, request.remote_ip.as_deref()) {
        info!(
            remote_ip = ?request.remote_ip,
            proxy_chain = ?request.proxy_chain,
            "IP not whitelisted"
        );
        return Ok(AdmissionResult::Rejected(Rejection::whitelist(
            RejectionReason::Ip,
            IP_REJECTED,
        )));
    }

    // Bots
    if gate.ignore_bots {
        let user_agent = request.header(header::USER_AGENT);
        if bots.is_bot(user_agent).await? {
            info!(user_agent = ?user_agent, "Bot request refused");
            return Ok(AdmissionResult::Rejected(Rejection::challenge(
                RejectionReason::Bot,
                AuthFailure::Challenge,
            )));
        }
    }

    // Authentication
    if let Err(failure) = authenticate(auth, &request.headers, credentials).await {
        info!(status = failure.status().as_u16(), reason = %failure, "Authentication failed");
        return Ok(AdmissionResult::Rejected(Rejection::challenge(
            RejectionReason::Auth(failure),
            failure,
        )));
    }

    debug!("Request admitted");
    Ok(AdmissionResult::Admitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{StaticCredentialStore, StoredCredential};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Bot detector with a fixed answer that counts its calls.
    struct FixedBots {
        answer: bool,
        calls: AtomicUsize,
    }

    impl FixedBots {
        fn new(answer: bool) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BotDetector for FixedBots {
        async fn is_bot(&self, _: Option<&str>) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    struct BrokenBots;

    #[async_trait]
    impl BotDetector for BrokenBots {
        async fn is_bot(&self, _: Option<&str>) -> Result<bool> {
            Err(GateError::BotDetection("detector offline".to_string()))
        }
    }

    fn request(host: &'static str, remote_ip: &str) -> InboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static(host));
        InboundRequest {
            headers,
            remote_ip: Some(remote_ip.to_string()),
            proxy_chain: Vec::new(),
        }
    }

    async fn run(
        request: &InboundRequest,
        gate: &GatekeeperConfig,
        auth: AuthConfig,
        bots: &dyn BotDetector,
    ) -> AdmissionResult {
        let store = StaticCredentialStore::new(StoredCredential::new("X-Api-Key", "key"));
        admit(request, gate, auth, &store, bots).await.unwrap()
    }

    #[tokio::test]
    async fn test_default_config_admits() {
        let result = run(
            &request("hooks.local", "127.0.0.1"),
            &GatekeeperConfig::default(),
            AuthConfig::None,
            &FixedBots::new(true),
        )
        .await;
        assert!(result.is_admitted());
    }

    #[tokio::test]
    async fn test_domain_rejection_is_plain_403() {
        let gate = GatekeeperConfig {
            domain_whitelist: Whitelist::parse("example.com"),
            ..Default::default()
        };
        let result = run(&request("evil.test", "127.0.0.1"), &gate, AuthConfig::None, &FixedBots::new(false)).await;
        let rejection = result.rejection().unwrap();
        assert_eq!(rejection.reason, RejectionReason::Domain);
        assert_eq!(rejection.status, StatusCode::FORBIDDEN);
        assert!(rejection.body.contains("Domain is not whitelisted"));
        assert!(rejection.headers.get(header::WWW_AUTHENTICATE).is_none());
    }

    #[tokio::test]
    async fn test_origin_header_satisfies_domain_whitelist() {
        let gate = GatekeeperConfig {
            domain_whitelist: Whitelist::parse("example.com"),
            ..Default::default()
        };
        let mut req = request("10.1.1.1:8080", "127.0.0.1");
        req.headers
            .insert(header::ORIGIN, HeaderValue::from_static("https://app.example.com"));
        let result = run(&req, &gate, AuthConfig::None, &FixedBots::new(false)).await;
        assert!(result.is_admitted());
    }

    #[tokio::test]
    async fn test_ip_rejection_checks_proxy_chain() {
        let gate = GatekeeperConfig {
            ip_whitelist: Whitelist::parse("192.168.1.10"),
            ..Default::default()
        };

        let rejected = run(&request("h", "10.0.0.1"), &gate, AuthConfig::None, &FixedBots::new(false)).await;
        let rejection = rejected.rejection().unwrap();
        assert_eq!(rejection.reason, RejectionReason::Ip);
        assert_eq!(rejection.body, IP_REJECTED);
        assert!(rejection.headers.is_empty());

        let mut proxied = request("h", "10.0.0.1");
        proxied.proxy_chain = vec!["192.168.1.10".to_string(), "10.0.0.1".to_string()];
        let admitted = run(&proxied, &gate, AuthConfig::None, &FixedBots::new(false)).await;
        assert!(admitted.is_admitted());
    }

    #[tokio::test]
    async fn test_bot_rejection_carries_challenge() {
        let gate = GatekeeperConfig {
            ignore_bots: true,
            ..Default::default()
        };
        let mut req = request("h", "127.0.0.1");
        req.headers
            .insert(header::USER_AGENT, HeaderValue::from_static("Googlebot"));
        let result = run(&req, &gate, AuthConfig::None, &FixedBots::new(true)).await;
        let rejection = result.rejection().unwrap();
        assert_eq!(rejection.reason, RejectionReason::Bot);
        assert_eq!(rejection.status, StatusCode::FORBIDDEN);
        assert_eq!(rejection.body, "Authorization data is wrong!");
        assert_eq!(
            rejection.headers.get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"Webhook\""
        );
    }

    #[tokio::test]
    async fn test_bot_check_skipped_unless_enabled() {
        let bots = FixedBots::new(true);
        let result = run(&request("h", "127.0.0.1"), &GatekeeperConfig::default(), AuthConfig::None, &bots).await;
        assert!(result.is_admitted());
        assert_eq!(bots.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_whitelist_rejection_short_circuits_later_checks() {
        let gate = GatekeeperConfig {
            ignore_bots: true,
            domain_whitelist: Whitelist::parse("example.com"),
            ..Default::default()
        };
        let bots = FixedBots::new(true);
        let result = run(&request("other.test", "127.0.0.1"), &gate, AuthConfig::None, &bots).await;
        assert_eq!(result.rejection().unwrap().reason, RejectionReason::Domain);
        assert_eq!(bots.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auth_failure_becomes_challenge() {
        let result = run(
            &request("h", "127.0.0.1"),
            &GatekeeperConfig::default(),
            AuthConfig::HeaderAuth,
            &FixedBots::new(false),
        )
        .await;
        let rejection = result.rejection().unwrap();
        assert_eq!(rejection.reason, RejectionReason::Auth(AuthFailure::MissingHeader));
        assert_eq!(rejection.status, StatusCode::FORBIDDEN);
        assert_eq!(rejection.body, "Missing authentication header.");
        assert!(rejection.headers.contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_bot_detector_error_propagates() {
        let gate = GatekeeperConfig {
            ignore_bots: true,
            ..Default::default()
        };
        let store = StaticCredentialStore::empty();
        let result = admit(&request("h", "127.0.0.1"), &gate, AuthConfig::None, &store, &BrokenBots).await;
        assert!(matches!(result, Err(GateError::BotDetection(_))));
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_forwarded_header_ignored_without_trusted_hops() {
        let peer = Some("203.0.113.66:5555".parse().unwrap());
        let req = InboundRequest::from_parts(forwarded("192.168.1.10"), peer, 0);
        assert!(req.proxy_chain.is_empty());
        assert_eq!(req.remote_ip.as_deref(), Some("203.0.113.66"));
    }

    #[test]
    fn test_proxy_chain_keeps_trusted_hops_only() {
        let peer = Some("127.0.0.1:5000".parse().unwrap());
        let header = "192.168.1.10, 203.0.113.9, 10.0.0.2 ,";

        let req = InboundRequest::from_parts(forwarded(header), peer, 1);
        assert_eq!(req.proxy_chain, ["10.0.0.2"]);

        let req = InboundRequest::from_parts(forwarded(header), peer, 2);
        assert_eq!(req.proxy_chain, ["203.0.113.9", "10.0.0.2"]);

        let req = InboundRequest::from_parts(forwarded(header), peer, 8);
        assert_eq!(req.proxy_chain, ["192.168.1.10", "203.0.113.9", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_spoofed_forwarded_header_refused() {
        let gate = GatekeeperConfig {
            ip_whitelist: Whitelist::parse("192.168.1.10"),
            ..Default::default()
        };
        let peer = Some("203.0.113.66:5555".parse().unwrap());

        let direct = InboundRequest::from_parts(forwarded("192.168.1.10"), peer, 0);
        let result = run(&direct, &gate, AuthConfig::None, &FixedBots::new(false)).await;
        assert_eq!(result.rejection().unwrap().reason, RejectionReason::Ip);

        // Behind one proxy, the client can still prepend whatever it likes.
        let proxied = InboundRequest::from_parts(forwarded("192.168.1.10, 198.51.100.7"), peer, 1);
        let result = run(&proxied, &gate, AuthConfig::None, &FixedBots::new(false)).await;
        assert_eq!(result.rejection().unwrap().reason, RejectionReason::Ip);

        let trusted = InboundRequest::from_parts(forwarded("198.51.100.7, 192.168.1.10"), peer, 1);
        let result = run(&trusted, &gate, AuthConfig::None, &FixedBots::new(false)).await;
        assert!(result.is_admitted());
    }

    #[tokio::test]
    async fn test_user_agent_detector() {
        let detector = UserAgentBotDetector::new().unwrap();
        for ua in [
            "Googlebot/2.1 (+http://www.google.com/bot.html)",
            "facebookexternalhit/1.1",
            "Mozilla/5.0 (compatible; bingbot/2.0)",
            "curl/8.4.0",
            "python-requests/2.31",
        ] {
            assert!(detector.is_bot(Some(ua)).await.unwrap(), "{ua} should be a bot");
        }
        for ua in [
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36",
            "axios/1.6.2",
        ] {
            assert!(!detector.is_bot(Some(ua)).await.unwrap(), "{ua} should not be a bot");
        }
        assert!(!detector.is_bot(None).await.unwrap());
        assert!(!detector.is_bot(Some("")).await.unwrap());
    }
}
