// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Address whitelists and event-name normalization.
//!
//! Whitelists use substring semantics: an operator entering `example.com`
//! also admits `sub.example.com`, and `192.168.1.` admits the whole /24.

use serde::{Deserialize, Serialize};

/// A set of address fragments (domain or IP substrings).
///
/// An empty whitelist admits everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Whitelist {
    fragments: Vec<String>,
}

impl Whitelist {
    /// Parse a comma separated whitelist, trimming each fragment.
    ///
    /// Blank fragments are discarded so a stray trailing comma does not turn
    /// into a fragment that every address contains.
    pub fn parse(raw: &str) -> Self {
        let fragments = raw
            .split(',')
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_string)
            .collect();
        Self { fragments }
    }

    /// Build a whitelist from an optional raw value; absent means empty.
    pub fn from_option(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Check whether any of the given addresses contains a fragment.
    pub fn allows(&self, candidates: &[&str], primary: Option<&str>) -> bool {
        whitelist_allows(self, candidates, primary)
    }
}

impl From<String> for Whitelist {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Whitelist> for String {
    fn from(whitelist: Whitelist) -> Self {
        whitelist.fragments.join(", ")
    }
}

/// Returns true if the whitelist is empty, or if `primary` or any candidate
/// contains one of the whitelist fragments.
pub fn whitelist_allows(whitelist: &Whitelist, candidates: &[&str], primary: Option<&str>) -> bool {
    if whitelist.is_empty() {
        return true;
    }

    whitelist.fragments.iter().any(|fragment| {
        primary.is_some_and(|address| address.contains(fragment.as_str()))
            || candidates
                .iter()
                .any(|address| address.contains(fragment.as_str()))
    })
}

/// Replace every `.` in an event name with `_`.
pub fn normalize_event_name(raw: &str) -> String {
    raw.replace('.', "_")
}
