// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Webhook Gate
//!
//! This crate provides an ingress filter and event router for a single
//! inbound webhook endpoint receiving WAHA events:
//!
//! - Domain and IP whitelisting (substring match, empty allows all)
//! - Bot filtering by user agent
//! - Header-based authentication against a stored credential
//! - Event-name normalization and routing to one of several output channels
//! - Output channel topology resolved once per configuration

pub mod auth;
pub mod catalog;
pub mod config;
pub mod delivery;
pub mod error;
pub mod gatekeeper;
pub mod handlers;
pub mod matcher;
pub mod metrics;
pub mod response;
pub mod router;
pub mod topology;

pub use auth::{authenticate, AuthConfig, AuthFailure, CredentialStore, StoredCredential};
pub use catalog::EventCatalog;
pub use config::Config;
pub use error::GateError;
pub use gatekeeper::{admit, AdmissionResult, BotDetector, GatekeeperConfig, InboundRequest};
pub use handlers::{EndpointOutcome, WebhookEndpoint};
pub use matcher::{normalize_event_name, whitelist_allows, Whitelist};
pub use router::{route, InboundEvent, RoutingDecision};
pub use topology::{resolve_topology, EventSubscription, OutputTopology, Registration};
