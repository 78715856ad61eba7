// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Routes an admitted event to exactly one output channel.

use crate::error::{GateError, Result};
use crate::matcher::normalize_event_name;
use crate::topology::{EventSubscription, OutputTopology, SELF_TOKEN};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Event facts extracted from a webhook payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundEvent {
    /// The `event` field, if present
    pub raw_name: Option<String>,
    /// `payload.fromMe`, false when absent
    pub is_self_originated: bool,
}

impl InboundEvent {
    pub fn new(raw_name: impl Into<String>, is_self_originated: bool) -> Self {
        Self {
            raw_name: Some(raw_name.into()),
            is_self_originated,
        }
    }

    /// Extract the event name and self flag from a parsed body.
    pub fn from_payload(body: &Value) -> Self {
        Self {
            raw_name: body
                .get("event")
                .and_then(Value::as_str)
                .map(str::to_string),
            is_self_originated: body
                .pointer("/payload/fromMe")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Where an admitted payload goes.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
    Deliver { channel: usize, payload: Value },
    Drop,
}

/// Route an event against a subscription and the topology resolved from it.
///
/// The payload is passed through untouched.
pub fn route(
    subscription: &EventSubscription,
    topology: &OutputTopology,
    event: &InboundEvent,
    payload: Value,
) -> RoutingDecision {
    let raw_name = match event.raw_name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => {
            debug!("Payload carries no event name");
            return RoutingDecision::Drop;
        }
    };

    let normalized = normalize_event_name(raw_name);

    if subscription.has_wildcard() {
        debug!(event = %normalized, "Routing to wildcard channel");
        return RoutingDecision::Deliver {
            channel: 0,
            payload,
        };
    }

    let Some(event_channel) = subscription.position(&normalized) else {
        debug!(event = %normalized, "Event not subscribed");
        return RoutingDecision::Drop;
    };

    let channel = if event.is_self_originated {
        subscription.position(SELF_TOKEN).unwrap_or(event_channel)
    } else {
        event_channel
    };

    debug_assert!(channel < topology.len());
    debug!(event = %normalized, channel, self_originated = event.is_self_originated, "Event routed");
    RoutingDecision::Deliver { channel, payload }
}

/// Per-channel item lists for one delivery; at most one list is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChannelOutputs {
    channels: Vec<Vec<Value>>,
}

impl ChannelOutputs {
    /// Place the payload in `channel` and leave every other channel empty.
    pub fn deliver(
        topology: &OutputTopology,
        channel: usize,
        payload: Value,
    ) -> Result<Self> {
        if channel >= topology.len() {
            return Err(GateError::Internal(format!(
                "channel {channel} outside topology of {} channels",
                topology.len()
            )));
        }

        let mut channels = vec![Vec::new(); topology.len()];
        channels[channel].push(payload);
        Ok(Self { channels })
    }

    pub fn channels(&self) -> &[Vec<Value>] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Index of the populated channel.
    pub fn populated(&self) -> Option<usize> {
        self.channels.iter().position(|items| !items.is_empty())
    }
}
