// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for webhook outcomes.

use crate::gatekeeper::RejectionReason;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Request outcome label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    RejectedDomain,
    RejectedIp,
    RejectedAuth,
    Dropped,
    Delivered,
    /// A collaborator failed and the request was answered with a 500
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RejectedDomain => "rejected_domain",
            Self::RejectedIp => "rejected_ip",
            Self::RejectedAuth => "rejected_auth",
            Self::Dropped => "dropped",
            Self::Delivered => "delivered",
            Self::Error => "error",
        }
    }
}

impl From<RejectionReason> for Outcome {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::Domain => Self::RejectedDomain,
            RejectionReason::Ip => Self::RejectedIp,
            RejectionReason::Bot | RejectionReason::Auth(_) => Self::RejectedAuth,
        }
    }
}

/// Registry holding the gate's counters.
pub struct GateMetrics {
    registry: Registry,
    requests: IntCounterVec,
    deliveries: IntCounterVec,
}

impl GateMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("webhook_requests_total", "Webhook requests by outcome"),
            &["outcome"],
        )?;
        let deliveries = IntCounterVec::new(
            Opts::new("webhook_deliveries_total", "Delivered events by output channel"),
            &["channel"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(deliveries.clone()))?;

        Ok(Self {
            registry,
            requests,
            deliveries,
        })
    }

    pub fn record(&self, outcome: Outcome) {
        self.requests.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn record_delivery(&self, channel_label: &str) {
        self.deliveries.with_label_values(&[channel_label]).inc();
    }

    pub fn requests(&self, outcome: Outcome) -> u64 {
        self.requests.with_label_values(&[outcome.as_str()]).get()
    }

    /// Render all counters in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
