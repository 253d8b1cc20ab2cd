// ABOUTME: Collects concatenated message parts by originator and reference until every part arrives
// ABOUTME: Stale or displaced partial sets are evicted and reported rather than silently dropped

use crate::datatypes::Address;
use crate::message::Message;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Reassembly settings
///
/// # Examples
///
/// ```rust
/// use sms_tpdu::reassembly::ReassemblyConfig;
/// use std::time::Duration;
///
/// let config = ReassemblyConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_max_pending(128);
/// ```
#[derive(Debug, Clone)]
pub struct ReassemblyConfig {
    /// A partial set with no new part for this long is discarded (default: 5 minutes)
    pub timeout: Duration,
    /// Partial sets held at once; the least recently touched is discarded
    /// to make room (default: 1024). Also bounds the discards queued
    /// between sweeps.
    pub max_pending: usize,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            max_pending: 1024,
        }
    }
}

impl ReassemblyConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending.max(1);
        self
    }
}

/// A message whose parts have all arrived, text joined in part order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompleteMessage {
    pub address: Option<Address>,
    /// Concatenation reference; `None` for single-part messages
    pub reference: Option<u16>,
    pub text: String,
    /// The parts in ascending part order
    pub parts: Vec<Message>,
}

/// Why a partial set was given up on
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// No part arrived within the timeout
    Expired,
    /// A part announced a different total for the same reference
    Superseded,
    /// The pending table was full
    CapacityExceeded,
}

/// Report of a partial set that will never complete
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncompleteMessageDiscarded {
    pub address: Address,
    pub reference: u16,
    pub received: usize,
    pub expected: u8,
    pub reason: DiscardReason,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReassemblyKey {
    address: Address,
    reference: u16,
}

#[derive(Debug)]
struct PartialSet {
    total: u8,
    parts: BTreeMap<u8, Message>,
    first_seen: Instant,
    last_arrival: Instant,
}

#[derive(Debug, Default)]
struct ReassemblyState {
    pending: HashMap<ReassemblyKey, PartialSet>,
    /// Discards found while accepting parts, handed out by the next sweep
    discarded: VecDeque<IncompleteMessageDiscarded>,
}

fn discarded(
    key: ReassemblyKey,
    set: PartialSet,
    reason: DiscardReason,
) -> IncompleteMessageDiscarded {
    tracing::warn!(
        "discarding incomplete message from {} ref {}: {} of {} parts ({:?}, pending {:?})",
        key.address,
        key.reference,
        set.parts.len(),
        set.total,
        reason,
        set.first_seen.elapsed()
    );
    IncompleteMessageDiscarded {
        address: key.address,
        reference: key.reference,
        received: set.parts.len(),
        expected: set.total,
        reason,
    }
}

impl ReassemblyState {
    /// Queues a discard for the next sweep, dropping the oldest queued
    /// report once `limit` are waiting
    fn queue(&mut self, event: IncompleteMessageDiscarded, limit: usize) {
        while self.discarded.len() >= limit.max(1) {
            if let Some(dropped) = self.discarded.pop_front() {
                tracing::warn!(
                    "discard queue full, report for {} ref {} dropped",
                    dropped.address,
                    dropped.reference
                );
            }
        }
        self.discarded.push_back(event);
    }

    fn evict_least_recent(&mut self, limit: usize) {
        let oldest = self
            .pending
            .iter()
            .min_by_key(|(_, set)| set.last_arrival)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            if let Some(set) = self.pending.remove(&key) {
                let event = discarded(key, set, DiscardReason::CapacityExceeded);
                self.queue(event, limit);
            }
        }
    }
}

/// Thread-safe multi-part message reassembler
///
/// Parts are keyed by the address the TPDU carries and the concatenation
/// reference, so two senders using the same reference never mix.
#[derive(Debug)]
pub struct Reassembler {
    config: ReassemblyConfig,
    state: Mutex<ReassemblyState>,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(ReassemblyConfig::default())
    }
}

impl Reassembler {
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ReassemblyState::default()),
        }
    }

    pub fn config(&self) -> &ReassemblyConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ReassemblyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepts a decoded message, returning the complete message once its
    /// last part arrives
    pub fn submit(&self, message: Message) -> Option<CompleteMessage> {
        self.submit_at(message, Instant::now())
    }

    /// Like [`Reassembler::submit`] but keys the parts by `origin`, for
    /// Submit TPDUs whose originator is known only to the transport
    pub fn submit_from(&self, origin: Address, message: Message) -> Option<CompleteMessage> {
        self.accept(Some(origin), message, Instant::now())
    }

    pub fn submit_at(&self, message: Message, now: Instant) -> Option<CompleteMessage> {
        self.accept(None, message, now)
    }

    fn accept(
        &self,
        origin: Option<Address>,
        message: Message,
        now: Instant,
    ) -> Option<CompleteMessage> {
        let address = origin.or_else(|| message.address().cloned());
        let (Some(concat), Some(address)) = (message.concatenation(), address.clone()) else {
            return Some(CompleteMessage {
                address,
                reference: None,
                text: message.text().to_string(),
                parts: vec![message],
            });
        };

        let key = ReassemblyKey {
            address,
            reference: concat.reference,
        };

        let mut state = self.lock();
        let superseded = state
            .pending
            .get(&key)
            .is_some_and(|set| set.total != concat.total);
        if superseded {
            if let Some(stale) = state.pending.remove(&key) {
                let event = discarded(key.clone(), stale, DiscardReason::Superseded);
                state.queue(event, self.config.max_pending);
            }
        }
        if !state.pending.contains_key(&key) && state.pending.len() >= self.config.max_pending {
            state.evict_least_recent(self.config.max_pending);
        }

        let set = state.pending.entry(key.clone()).or_insert_with(|| PartialSet {
            total: concat.total,
            parts: BTreeMap::new(),
            first_seen: now,
            last_arrival: now,
        });
        if set.parts.insert(concat.part, message).is_some() {
            tracing::debug!(
                "duplicate part {} of {} from {} ref {} replaced",
                concat.part,
                concat.total,
                key.address,
                key.reference
            );
        }
        set.last_arrival = now;

        tracing::trace!(
            "part {} of {} from {} ref {} ({} held)",
            concat.part,
            concat.total,
            key.address,
            key.reference,
            set.parts.len()
        );

        if set.parts.len() < usize::from(set.total) {
            return None;
        }

        let set = state.pending.remove(&key)?;
        let parts: Vec<Message> = set.parts.into_values().collect();
        let text = parts.iter().map(Message::text).collect();
        Some(CompleteMessage {
            address: Some(key.address),
            reference: Some(key.reference),
            text,
            parts,
        })
    }

    /// Number of partial sets waiting for parts
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Discards partial sets idle longer than the timeout, returning them
    /// along with sets displaced since the last sweep
    pub fn evict_expired(&self) -> Vec<IncompleteMessageDiscarded> {
        self.evict_expired_at(Instant::now())
    }

    pub fn evict_expired_at(&self, now: Instant) -> Vec<IncompleteMessageDiscarded> {
        let timeout = self.config.timeout;
        let mut state = self.lock();

        let expired: Vec<ReassemblyKey> = state
            .pending
            .iter()
            .filter(|(_, set)| now.saturating_duration_since(set.last_arrival) > timeout)
            .map(|(key, _)| key.clone())
            .collect();
        let mut events: Vec<IncompleteMessageDiscarded> = state.discarded.drain(..).collect();
        for key in expired {
            if let Some(set) = state.pending.remove(&key) {
                events.push(discarded(key, set, DiscardReason::Expired));
            }
        }
        events
    }
}

/// Runs [`Reassembler::evict_expired`] every `interval` on a tokio task,
/// passing each discard to `on_discard`. Abort the handle to stop it.
pub fn spawn_eviction<F>(
    reassembler: Arc<Reassembler>,
    interval: Duration,
    mut on_discard: F,
) -> JoinHandle<()>
where
    F: FnMut(IncompleteMessageDiscarded) + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            for event in reassembler.evict_expired() {
                on_discard(event);
            }
        }
    })
}
