// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Hand-off of routed events to whatever consumes the output channels.

use crate::error::{GateError, Result};
use crate::router::ChannelOutputs;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// A routed event ready for consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    /// Index of the populated channel
    pub channel: usize,
    /// Label of the populated channel
    pub label: String,
    /// One item list per channel of the topology
    pub outputs: ChannelOutputs,
}

/// Consumer of delivered channel outputs.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    async fn deliver(&self, delivery: Delivery) -> Result<()>;
}

/// Sink that records deliveries in the log.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

#[async_trait]
impl ChannelSink for TracingSink {
    async fn deliver(&self, delivery: Delivery) -> Result<()> {
        let items = delivery
            .outputs
            .channels()
            .get(delivery.channel)
            .map(Vec::len)
            .unwrap_or(0);
        info!(
            channel = delivery.channel,
            label = %delivery.label,
            channels = delivery.outputs.len(),
            items,
            "Event delivered"
        );
        Ok(())
    }
}

/// Sink publishing deliveries to in-process subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<Arc<Delivery>>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Delivery>> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl ChannelSink for BroadcastSink {
    async fn deliver(&self, delivery: Delivery) -> Result<()> {
        self.sender
            .send(Arc::new(delivery))
            .map(|_| ())
            .map_err(|_| GateError::Delivery("no active subscribers".to_string()))
    }
}
