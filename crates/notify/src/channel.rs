//! Real-time push channel addressed by user identity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::broadcast;

/// Per-user buffer; a slow subscriber lags rather than blocking senders.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("User {0} has no active real-time connection")]
    NotConnected(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Narrow `send` contract the dispatcher depends on.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    async fn send(&self, user_id: &str, event: &str, payload: Value) -> Result<(), DeliveryError>;
}

/// One pushed message as seen by a connected client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RealtimeMessage {
    pub event: String,
    pub payload: Value,
}

/// In-process [`RealtimeChannel`] with one broadcast channel per user.
///
/// Every receiver returned by [`UserChannelHub::connect`] sees the messages
/// sent to that user after it connected. Nothing is queued for users with
/// no live receiver.
#[derive(Default)]
pub struct UserChannelHub {
    senders: parking_lot::RwLock<HashMap<String, broadcast::Sender<RealtimeMessage>>>,
}

impl UserChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, user_id: &str) -> broadcast::Receiver<RealtimeMessage> {
        let mut senders = self.senders.write();
        senders
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub fn is_connected(&self, user_id: &str) -> bool {
        self.senders
            .read()
            .get(user_id)
            .map(|tx| tx.receiver_count() > 0)
            .unwrap_or(false)
    }

    /// Forget users whose receivers have all been dropped.
    pub fn prune(&self) -> usize {
        let mut senders = self.senders.write();
        let before = senders.len();
        senders.retain(|_, tx| tx.receiver_count() > 0);
        before - senders.len()
    }
}

#[async_trait]
impl RealtimeChannel for UserChannelHub {
    async fn send(&self, user_id: &str, event: &str, payload: Value) -> Result<(), DeliveryError> {
        let sender = self.senders.read().get(user_id).cloned();
        let Some(sender) = sender else {
            return Err(DeliveryError::NotConnected(user_id.to_string()));
        };

        let message = RealtimeMessage {
            event: event.to_string(),
            payload,
        };
        sender
            .send(message)
            .map(|_| ())
            .map_err(|_| DeliveryError::NotConnected(user_id.to_string()))
    }
}
