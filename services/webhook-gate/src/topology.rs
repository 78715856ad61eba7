// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Event subscriptions and the output channels they expose.
//!
//! The topology is resolved once per configuration. The router derives
//! channel indices from the same subscription, so the declared channel set
//! and the addressed channel set cannot drift apart.

use crate::matcher::normalize_event_name;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Subscribes to every event on a single channel.
pub const WILDCARD: &str = "*";

/// Reserved token receiving events whose payload has `fromMe: true`.
///
/// It never names an event itself: an event is routed to the `self` channel
/// only after it has matched the subscription through its own name.
pub const SELF_TOKEN: &str = "self";

/// Ordered set of event tokens chosen by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct EventSubscription {
    tokens: Vec<String>,
}

impl EventSubscription {
    /// Build a subscription from tokens.
    ///
    /// Tokens are trimmed and normalized; blanks are dropped and repeats keep
    /// their first position.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for token in tokens {
            let token = normalize_event_name(token.as_ref().trim());
            if !token.is_empty() && !normalized.contains(&token) {
                normalized.push(token);
            }
        }
        Self { tokens: normalized }
    }

    /// Parse a comma separated token list.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// Subscription matching every event.
    pub fn any() -> Self {
        Self::new([WILDCARD])
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.contains(WILDCARD)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Position of a token in subscription order.
    pub fn position(&self, token: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t == token)
    }
}

impl From<Vec<String>> for EventSubscription {
    fn from(tokens: Vec<String>) -> Self {
        Self::new(tokens)
    }
}

impl From<EventSubscription> for Vec<String> {
    fn from(subscription: EventSubscription) -> Self {
        subscription.tokens
    }
}

/// One output channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Channel {
    /// Display label
    pub label: String,
    /// Subscription token served by this channel, `None` for the
    /// descriptive "No Events" channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Fixed sequence of output channels derived from a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputTopology {
    channels: Vec<Channel>,
}

impl OutputTopology {
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.label.as_str())
    }
}

/// Compute the output channels for a subscription.
///
/// - empty: one descriptive "No Events" channel
/// - contains `*`: one "Any Event" channel, other tokens are unreachable
/// - otherwise: one channel per token, in subscription order
pub fn resolve_topology(subscription: &EventSubscription) -> OutputTopology {
    let channels = if subscription.is_empty() {
        vec![Channel {
            label: "No Events".to_string(),
            token: None,
        }]
    } else if subscription.has_wildcard() {
        vec![Channel {
            label: "Any Event".to_string(),
            token: Some(WILDCARD.to_string()),
        }]
    } else {
        subscription
            .tokens()
            .iter()
            .map(|token| Channel {
                label: channel_label(token),
                token: Some(token.clone()),
            })
            .collect()
    };

    OutputTopology { channels }
}

/// `session_status` -> `Session Status`
fn channel_label(token: &str) -> String {
    token
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// A subscription bound to the topology resolved from it.
///
/// Built once per endpoint configuration and shared read-only between
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct Registration {
    subscription: EventSubscription,
    topology: Arc<OutputTopology>,
}

impl Registration {
    pub fn new(subscription: EventSubscription) -> Self {
        let topology = Arc::new(resolve_topology(&subscription));
        Self {
            subscription,
            topology,
        }
    }

    pub fn subscription(&self) -> &EventSubscription {
        &self.subscription
    }

    pub fn topology(&self) -> &OutputTopology {
        &self.topology
    }
}
