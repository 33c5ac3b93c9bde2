// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Board Events
//
// In-memory event streaming over tokio broadcast channels. Events published
// with no subscriber attached are dropped; slow subscribers lose the oldest
// events once the channel capacity is exceeded.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::board::BoardId;
use crate::domain::events::{BoardEvent, EventPublisher};

/// Event bus for publishing and subscribing to board events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<BoardEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    fn send(&self, event: BoardEvent) {
        debug!("Publishing event: {:?}", event);

        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all board events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to events of a single board
    pub fn subscribe_board(&self, board_id: BoardId) -> BoardEventReceiver {
        BoardEventReceiver {
            receiver: self.sender.subscribe(),
            board_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: BoardEvent) {
        self.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

fn map_recv_error(err: broadcast::error::RecvError) -> EventBusError {
    match err {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all board events
pub struct EventReceiver {
    receiver: broadcast::Receiver<BoardEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<BoardEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<BoardEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver filtered to one board
pub struct BoardEventReceiver {
    receiver: broadcast::Receiver<BoardEvent>,
    board_id: BoardId,
}

impl BoardEventReceiver {
    /// Receive the next event for this board, skipping all others
    pub async fn recv(&mut self) -> Result<BoardEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if event.board_id() == &self.board_id {
                return Ok(event);
            }
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(board: &str) -> BoardEvent {
        BoardEvent::BoardDeleted {
            board_id: BoardId::from(board),
            deleted_by: crate::domain::user::User::new("u-alice", "Alice"),
        }
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.publish(deleted("b-1"));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.board_id(), &BoardId::from("b-1"));
        assert_eq!(received.name(), "board_deleted");
    }

    #[tokio::test]
    async fn test_board_event_filtering() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe_board(BoardId::from("b-2"));

        event_bus.publish(deleted("b-1"));
        event_bus.publish(deleted("b-2"));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.board_id(), &BoardId::from("b-2"));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut first = event_bus.subscribe();
        let mut second = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish(deleted("b-1"));

        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let event_bus = EventBus::default();
        event_bus.publish(deleted("b-1"));
        let mut late = event_bus.subscribe();
        assert!(matches!(late.try_recv(), Err(EventBusError::Empty)));
    }

    #[test]
    fn test_lagged_receiver() {
        let event_bus = EventBus::new(2);
        let mut receiver = event_bus.subscribe();
        for i in 0..4 {
            event_bus.publish(deleted(&format!("b-{i}")));
        }
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Lagged(2))));
    }
}
