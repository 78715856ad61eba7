// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the webhook gate.
//!
//! Generators for addresses, user agents and event payloads, request
//! builders, and an outcome tally for probing the admission pipeline.

pub mod generators;
pub mod metrics;
pub mod requests;
