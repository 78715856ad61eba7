// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome tallies for request runs against the admission pipeline.

use std::collections::HashMap;
use std::fmt;
use webhook_gate::gatekeeper::{AdmissionResult, RejectionReason};

/// Classified result of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Admitted,
    DomainBlocked,
    IpBlocked,
    BotBlocked,
    AuthBlocked,
}

impl From<&AdmissionResult> for Outcome {
    fn from(result: &AdmissionResult) -> Self {
        match result.rejection().map(|r| r.reason) {
            None => Outcome::Admitted,
            Some(RejectionReason::Domain) => Outcome::DomainBlocked,
            Some(RejectionReason::Ip) => Outcome::IpBlocked,
            Some(RejectionReason::Bot) => Outcome::BotBlocked,
            Some(RejectionReason::Auth(_)) => Outcome::AuthBlocked,
        }
    }
}

/// Counts of request outcomes.
#[derive(Debug, Default)]
pub struct OutcomeTally {
    counts: HashMap<Outcome, usize>,
    total: usize,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        *self.counts.entry(outcome).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn block_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        1.0 - self.count(Outcome::Admitted) as f64 / self.total as f64
    }
}

impl fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Request Report ===")?;
        writeln!(f, "Total:          {}", self.total)?;
        for outcome in [
            Outcome::Admitted,
            Outcome::DomainBlocked,
            Outcome::IpBlocked,
            Outcome::BotBlocked,
            Outcome::AuthBlocked,
        ] {
            writeln!(f, "{:<15} {}", format!("{:?}:", outcome), self.count(outcome))?;
        }
        write!(f, "Block rate:     {:.1}%", self.block_rate() * 100.0)
    }
}
