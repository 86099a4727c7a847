//! # Engine Event Bus
//!
//! Engine-level notifications (`Tick`, `BeforeRender`, `AfterRender`,
//! `TargetBlockChanged`) fan out to any number of subscribers:
//!
//! ```text
//! ┌──────────┐  publish  ┌──────────┐ ──> [bounded channel] ──> subscriber A
//! │  Engine  │─────────> │ EventBus │ ──> [bounded channel] ──> subscriber B
//! └──────────┘           └──────────┘ ──> [bounded channel] ──> ...
//! ```
//!
//! Each subscriber owns a bounded crossbeam channel. A full channel drops the
//! event for that subscriber only; the engine never blocks on a slow reader.
//! Subscribers whose receiver has been dropped are pruned on the next publish.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::targeting::TargetedBlock;

/// Notifications raised by the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineEvent {
    /// A simulation step finished (`dt` in milliseconds).
    Tick(f32),
    /// A render frame is about to be drawn (`dt` in milliseconds).
    BeforeRender(f32),
    /// A render frame has been drawn (`dt` in milliseconds).
    AfterRender(f32),
    /// The targeted block changed; `None` when nothing is targeted.
    TargetBlockChanged(Option<TargetedBlock>),
}

/// Outcome of a single non-blocking send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendStatus {
    /// The event was queued.
    Delivered,
    /// The channel was full; the event was dropped.
    Full,
    /// The receiver is gone.
    Disconnected,
}

/// Handle for sending events to one subscriber.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: Sender<EngineEvent>,
}

impl EventSender {
    /// Sends an event (non-blocking).
    #[inline]
    pub fn send(&self, event: EngineEvent) -> SendStatus {
        match self.sender.try_send(event) {
            Ok(()) => SendStatus::Delivered,
            Err(TrySendError::Full(_)) => SendStatus::Full,
            Err(TrySendError::Disconnected(_)) => SendStatus::Disconnected,
        }
    }
}

/// Handle for receiving engine events.
#[derive(Clone, Debug)]
pub struct EventReceiver {
    receiver: Receiver<EngineEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<EngineEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    ///
    /// Returns `None` if no events pending.
    #[inline]
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

/// Per-publish delivery counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Subscribers that received the event.
    pub delivered: usize,
    /// Subscribers whose channel was full.
    pub dropped: usize,
}

/// Fan-out bus for [`EngineEvent`]s.
#[derive(Debug)]
pub struct EventBus {
    subscribers: Vec<EventSender>,
    capacity: usize,
}

impl EventBus {
    /// Creates a bus whose subscriber channels hold `capacity` events each.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Adds a subscriber and returns its receiving end.
    pub fn subscribe(&mut self) -> EventReceiver {
        let (sender, receiver) = bounded(self.capacity);
        self.subscribers.push(EventSender { sender });
        EventReceiver { receiver }
    }

    /// Number of live subscribers (as of the last publish).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Sends `event` to every subscriber.
    pub fn publish(&mut self, event: EngineEvent) -> Delivery {
        let mut delivery = Delivery::default();
        self.subscribers.retain(|subscriber| match subscriber.send(event) {
            SendStatus::Delivered => {
                delivery.delivered += 1;
                true
            }
            SendStatus::Full => {
                // Slow reader: drop rather than stall the simulation.
                tracing::warn!("engine event channel full, dropping {:?}", event);
                delivery.dropped += 1;
                true
            }
            SendStatus::Disconnected => false,
        });
        delivery
    }
}
