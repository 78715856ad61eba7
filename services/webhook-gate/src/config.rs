// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the webhook gate.
//!
//! Loaded from environment variables; unparseable values fall back to their
//! defaults. Credentials are not part of this configuration, they are
//! resolved through the credential store on each authenticated request.

use crate::auth::AuthConfig;
use crate::gatekeeper::GatekeeperConfig;
use crate::matcher::Whitelist;
use crate::response::{ResponseCode, ResponseConfig};
use crate::topology::EventSubscription;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors that cannot fall back to a default.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown authentication mode {0:?}: expected \"none\" or \"headerAuth\"")]
    UnknownAuthMode(String),
}

/// Configuration for the webhook gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Webhook endpoint configuration
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Reverse proxies in front of the service whose `X-Forwarded-For`
    /// entries are trusted (default: 0, the header is ignored)
    #[serde(default)]
    pub trusted_proxy_hops: usize,

    /// Event catalog file; the built-in catalog is used when absent
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Settings of the single webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Path the sender POSTs events to (default: change-this-path)
    #[serde(default = "default_webhook_path")]
    pub path: String,

    /// Subscribed events (default: `*`)
    #[serde(default = "EventSubscription::any")]
    pub events: EventSubscription,

    /// Authentication mode (default: none)
    #[serde(default)]
    pub authentication: AuthConfig,

    /// Bot and whitelist options
    #[serde(default)]
    pub options: GatekeeperConfig,

    /// Response to successful deliveries
    #[serde(default)]
    pub response: ResponseConfig,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "change-this-path".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            webhook: WebhookConfig::default(),
            trusted_proxy_hops: 0,
            catalog_path: None,
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            path: default_webhook_path(),
            events: EventSubscription::any(),
            authentication: AuthConfig::default(),
            options: GatekeeperConfig::default(),
            response: ResponseConfig::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl WebhookConfig {
    /// Route the endpoint is mounted on, always starting with `/`.
    pub fn route_path(&self) -> String {
        format!("/{}", self.path.trim().trim_start_matches('/'))
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup.
    ///
    /// - `BIND_ADDR`: server bind address (default: 0.0.0.0:8080)
    /// - `WEBHOOK_PATH`: endpoint path (default: change-this-path)
    /// - `WEBHOOK_EVENTS`: comma separated subscription (default: *)
    /// - `WEBHOOK_IGNORE_BOTS`: refuse bot user agents (default: false)
    /// - `WEBHOOK_IP_WHITELIST`, `WEBHOOK_DOMAIN_WHITELIST`: comma separated fragments
    /// - `WEBHOOK_AUTH`: `none` or `headerAuth` (default: none)
    /// - `WEBHOOK_RESPONSE_CODE`, `WEBHOOK_RESPONSE_CUSTOM_CODE`: response status
    /// - `WEBHOOK_RESPONSE_DATA`, `WEBHOOK_NO_RESPONSE_BODY`: response body
    /// - `WEBHOOK_PROXY_HOPS`: trusted reverse proxies (default: 0)
    /// - `EVENT_CATALOG_PATH`: event catalog file
    /// - `METRICS_ENABLED`: expose /metrics (default: true)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let authentication = match lookup("WEBHOOK_AUTH") {
            Some(raw) => AuthConfig::parse(&raw).ok_or(ConfigError::UnknownAuthMode(raw))?,
            None => AuthConfig::default(),
        };

        let response_code = match (
            parse_var(lookup("WEBHOOK_RESPONSE_CUSTOM_CODE")),
            parse_var(lookup("WEBHOOK_RESPONSE_CODE")),
        ) {
            (Some(custom), _) => Some(ResponseCode::Custom(custom)),
            (None, Some(code)) => Some(ResponseCode::Code(code)),
            (None, None) => None,
        };

        Ok(Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(default_bind_addr),
            webhook: WebhookConfig {
                path: lookup("WEBHOOK_PATH").unwrap_or_else(default_webhook_path),
                events: lookup("WEBHOOK_EVENTS")
                    .map(|raw| EventSubscription::parse(&raw))
                    .unwrap_or_else(EventSubscription::any),
                authentication,
                options: GatekeeperConfig {
                    ignore_bots: parse_var(lookup("WEBHOOK_IGNORE_BOTS")).unwrap_or(false),
                    ip_whitelist: Whitelist::from_option(lookup("WEBHOOK_IP_WHITELIST").as_deref()),
                    domain_whitelist: Whitelist::from_option(
                        lookup("WEBHOOK_DOMAIN_WHITELIST").as_deref(),
                    ),
                },
                response: ResponseConfig {
                    response_code,
                    response_data: lookup("WEBHOOK_RESPONSE_DATA"),
                    no_response_body: parse_var(lookup("WEBHOOK_NO_RESPONSE_BODY")).unwrap_or(false),
                },
            },
            trusted_proxy_hops: parse_var(lookup("WEBHOOK_PROXY_HOPS")).unwrap_or(0),
            catalog_path: lookup("EVENT_CATALOG_PATH"),
            metrics: MetricsConfig {
                enabled: parse_var(lookup("METRICS_ENABLED")).unwrap_or(true),
                ..Default::default()
            },
        })
    }
}

fn parse_var<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}
