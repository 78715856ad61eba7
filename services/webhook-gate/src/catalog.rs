// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Catalog of subscribable webhook events.
//!
//! Consulted when a subscription is configured, never while routing.

use crate::error::CatalogError;
use crate::matcher::normalize_event_name;
use crate::topology::EventSubscription;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../catalog/webhook-events.json");

/// One selectable event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOption {
    /// Display name
    pub name: String,
    /// Subscription token
    pub value: String,
}

impl EventOption {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Entries that are not webhook events but are always selectable.
fn static_options() -> [EventOption; 3] {
    [
        EventOption::new("Any / All Events", "*"),
        EventOption::new("Self", "self"),
        EventOption::new("Message Waiting", "message_waiting"),
    ]
}

/// Ordered list of event options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventCatalog {
    options: Vec<EventOption>,
}

impl EventCatalog {
    /// Build a catalog, normalizing values and putting the static entries first.
    pub fn from_options(options: Vec<EventOption>) -> Self {
        let statics = static_options();
        let mut catalog: Vec<EventOption> = statics.to_vec();

        for option in options {
            let value = normalize_event_name(option.value.trim());
            if value.is_empty() || catalog.iter().any(|o| o.value == value) {
                continue;
            }
            catalog.push(EventOption {
                name: option.name,
                value,
            });
        }

        Self { options: catalog }
    }

    /// Build a catalog from dotted event names such as `group.v2.participants`.
    pub fn from_event_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let options = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                EventOption {
                    name: display_name(name),
                    value: normalize_event_name(name),
                }
            })
            .collect();
        Self::from_options(options)
    }

    /// Parse a JSON array of `{ "name", "value" }` options.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let options: Vec<EventOption> = serde_json::from_str(raw)?;
        Ok(Self::from_options(options))
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Load a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn options(&self) -> &[EventOption] {
        &self.options
    }

    pub fn contains(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    /// Subscription tokens the catalog does not know.
    pub fn unknown_tokens<'a>(&self, subscription: &'a EventSubscription) -> Vec<&'a str> {
        subscription
            .tokens()
            .iter()
            .map(String::as_str)
            .filter(|token| !self.contains(token))
            .collect()
    }
}

/// `group.v2.participants` -> `Group V2 Participants`
fn display_name(event: &str) -> String {
    event
        .split('.')
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
