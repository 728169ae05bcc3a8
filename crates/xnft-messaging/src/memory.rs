//! # In-Memory Messaging Port
//!
//! A [`MessagingPort`] that keeps every queue in process memory and also
//! acts for the remote domain: [`consume_on_remote`] handles an outbound
//! message the way the remote bridge would, and [`send_from_remote`]
//! queues a message from the remote bridge for local consumption.
//!
//! ## State Machine (outbound)
//!
//! ```text
//! Pending ──(consume_on_remote)──▶ Consumed
//!    │
//!    └──(start_cancellation, delay, try_cancel)──▶ Cancelled
//! ```
//!
//! A started cancellation does not freeze the message. The remote side may
//! still consume it until `try_cancel` succeeds; whichever happens first
//! wins and the other fails.
//!
//! [`consume_on_remote`]: InMemoryMessagingPort::consume_on_remote
//! [`send_from_remote`]: InMemoryMessagingPort::send_from_remote

use std::collections::BTreeMap;
use std::sync::Arc;

use xnft_core::{Address, Clock, Felt, SystemClock, Timestamp};

use crate::config::PortConfig;
use crate::error::PortError;
use crate::message::{InboundMessage, MessageHash, OutboundMessage, OutboundReceipt, OutboundStatus};
use crate::port::MessagingPort;

#[derive(Debug, Clone)]
struct OutboundEntry {
    message: OutboundMessage,
    status: OutboundStatus,
}

/// The in-memory port.
pub struct InMemoryMessagingPort {
    config: PortConfig,
    clock: Arc<dyn Clock>,
    nonces: BTreeMap<Address, u64>,
    outbound: BTreeMap<MessageHash, OutboundEntry>,
    inbound: BTreeMap<MessageHash, u64>,
}

impl std::fmt::Debug for InMemoryMessagingPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryMessagingPort")
            .field("config", &self.config)
            .field("outbound", &self.outbound.len())
            .field("inbound", &self.inbound.len())
            .finish()
    }
}

impl InMemoryMessagingPort {
    /// A port reading time from `clock`.
    pub fn new(config: PortConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            nonces: BTreeMap::new(),
            outbound: BTreeMap::new(),
            inbound: BTreeMap::new(),
        }
    }

    /// A port on the system clock.
    pub fn with_system_clock(config: PortConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// The active configuration.
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// The outbound message stored under `hash`.
    pub fn outbound_message(&self, hash: &MessageHash) -> Option<&OutboundMessage> {
        self.outbound.get(hash).map(|e| &e.message)
    }

    /// Every outbound message still pending, in hash order.
    pub fn pending_outbound(&self) -> Vec<&OutboundMessage> {
        self.outbound
            .values()
            .filter(|e| !e.status.is_terminal())
            .map(|e| &e.message)
            .collect()
    }

    /// Handle a pending outbound message on the remote side.
    ///
    /// Fails with [`PortError::NotFound`] if the message is unknown,
    /// cancelled, or already consumed.
    pub fn consume_on_remote(&mut self, hash: &MessageHash) -> Result<OutboundMessage, PortError> {
        let entry = self
            .outbound
            .get_mut(hash)
            .filter(|e| !e.status.is_terminal())
            .ok_or(PortError::NotFound { hash: *hash })?;
        entry.status = OutboundStatus::Consumed;
        tracing::debug!(%hash, nonce = entry.message.nonce, "outbound message consumed on remote");
        Ok(entry.message.clone())
    }

    /// Queue a message from `from` on the remote domain to `to` locally.
    pub fn send_from_remote(
        &mut self,
        from: Felt,
        to: Address,
        payload: Vec<Felt>,
    ) -> Result<MessageHash, PortError> {
        self.check_payload(&payload)?;
        let hash = InboundMessage { from, to, payload }.hash();
        let count = self.inbound.entry(hash).or_insert(0);
        *count += 1;
        tracing::debug!(%hash, pending = *count, "inbound message queued from remote");
        Ok(hash)
    }

    fn check_payload(&self, payload: &[Felt]) -> Result<(), PortError> {
        if payload.len() > self.config.max_payload_len {
            return Err(PortError::PayloadTooLarge {
                len: payload.len(),
                max: self.config.max_payload_len,
            });
        }
        Ok(())
    }

    fn live_entry(&mut self, hash: &MessageHash) -> Result<&mut OutboundEntry, PortError> {
        let entry = self
            .outbound
            .get_mut(hash)
            .ok_or(PortError::NotFound { hash: *hash })?;
        match entry.status {
            OutboundStatus::Pending { .. } => Ok(entry),
            OutboundStatus::Consumed => Err(PortError::AlreadyConsumed { hash: *hash }),
            OutboundStatus::Cancelled => Err(PortError::NotFound { hash: *hash }),
        }
    }
}

impl MessagingPort for InMemoryMessagingPort {
    fn send_to_remote(
        &mut self,
        sender: &Address,
        recipient: &Felt,
        selector: &Felt,
        payload: &[Felt],
    ) -> Result<OutboundReceipt, PortError> {
        self.check_payload(payload)?;
        let nonce = self.next_nonce(sender);
        let message = OutboundMessage {
            sender: *sender,
            recipient: *recipient,
            nonce,
            selector: *selector,
            payload: payload.to_vec(),
        };
        let hash = message.hash();
        self.nonces.insert(*sender, nonce + 1);
        self.outbound.insert(
            hash,
            OutboundEntry {
                message,
                status: OutboundStatus::Pending {
                    cancellation_started_at: None,
                },
            },
        );
        tracing::debug!(%hash, nonce, sender = %sender, "outbound message queued");
        Ok(OutboundReceipt { hash, nonce })
    }

    fn start_cancellation(&mut self, message: &OutboundMessage) -> Result<Timestamp, PortError> {
        let now = self.clock.now();
        let hash = message.hash();
        let entry = self.live_entry(&hash)?;
        entry.status = OutboundStatus::Pending {
            cancellation_started_at: Some(now),
        };
        tracing::debug!(%hash, at = %now, "outbound cancellation started");
        Ok(now)
    }

    fn try_cancel(&mut self, message: &OutboundMessage) -> Result<(), PortError> {
        let now = self.clock.now();
        let delay = self.config.cancellation_delay_secs;
        let hash = message.hash();
        let entry = self.live_entry(&hash)?;
        let started = match entry.status {
            OutboundStatus::Pending {
                cancellation_started_at: Some(at),
            } => at,
            _ => return Err(PortError::CancellationNotRequested { hash }),
        };
        let ready_at = started.plus_secs(delay);
        if now < ready_at {
            return Err(PortError::CancellationNotAllowedYet { hash, ready_at });
        }
        entry.status = OutboundStatus::Cancelled;
        tracing::debug!(%hash, "outbound message cancelled");
        Ok(())
    }

    fn inbound_pending(&self, message: &InboundMessage) -> u64 {
        self.inbound.get(&message.hash()).copied().unwrap_or(0)
    }

    fn try_consume(&mut self, message: &InboundMessage) -> Result<MessageHash, PortError> {
        let hash = message.hash();
        match self.inbound.get_mut(&hash) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.inbound.remove(&hash);
                }
                tracing::debug!(%hash, "inbound message consumed");
                Ok(hash)
            }
            _ => Err(PortError::NotFound { hash }),
        }
    }

    fn outbound_status(&self, hash: &MessageHash) -> Option<OutboundStatus> {
        self.outbound.get(hash).map(|e| e.status)
    }

    fn next_nonce(&self, sender: &Address) -> u64 {
        self.nonces.get(sender).copied().unwrap_or(0)
    }
}
