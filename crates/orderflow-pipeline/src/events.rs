//! Pipeline event system for observability.
//!
//! Emits [`OrderEvent`]s via a [`tokio::sync::broadcast`] channel so that
//! external observers (loggers, alert relays, reports) can follow a run
//! without coupling to the executor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderflow_types::{OrderId, OrderStatus};

use crate::notify::Notifier;

/// Events emitted while orders move through a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
    RunStarted {
        run_id: String,
        pipeline_name: String,
        step_count: usize,
    },
    OrderStarted {
        order_id: OrderId,
        status: OrderStatus,
    },
    OrderFinished {
        order_id: OrderId,
        status: OrderStatus,
        amount: Decimal,
        finished_at: DateTime<Utc>,
    },
    Notification {
        message: String,
    },
    RunCompleted {
        run_id: String,
        processed: usize,
        errored: usize,
        duration_ms: u64,
    },
}

/// Event emitter wrapping a broadcast sender.
#[derive(Clone)]
pub struct EventEmitter {
    sender: tokio::sync::broadcast::Sender<OrderEvent>,
}

impl EventEmitter {
    /// Create a new emitter with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    ///
    /// If there are no active receivers the event is silently dropped.
    pub fn emit(&self, event: OrderEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Step alerts become [`OrderEvent::Notification`] events.
impl Notifier for EventEmitter {
    fn notify(&self, message: &str) {
        self.emit(OrderEvent::Notification {
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emitter_sends_and_receives() {
        let emitter = EventEmitter::new(16);
        let mut rx = emitter.subscribe();

        emitter.emit(OrderEvent::OrderStarted {
            order_id: OrderId(1001),
            status: OrderStatus::Created,
        });

        match rx.recv().await.unwrap() {
            OrderEvent::OrderStarted { order_id, status } => {
                assert_eq!(order_id, OrderId(1001));
                assert_eq!(status, OrderStatus::Created);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn emit_with_no_subscribers_does_not_panic() {
        let emitter = EventEmitter::new(16);
        emitter.emit(OrderEvent::Notification {
            message: "nobody listening".into(),
        });
    }

    #[test]
    fn notifier_impl_emits_notification() {
        let emitter = EventEmitter::default();
        let mut rx = emitter.subscribe();

        emitter.notify("Failed to process order 1002");

        match rx.try_recv().unwrap() {
            OrderEvent::Notification { message } => {
                assert_eq!(message, "Failed to process order 1002")
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn event_serialization_round_trip() {
        let event = OrderEvent::OrderFinished {
            order_id: OrderId(7),
            status: OrderStatus::Processed,
            amount: Decimal::new(328125, 2),
            finished_at: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();

        match deserialized {
            OrderEvent::OrderFinished {
                order_id,
                status,
                amount,
                ..
            } => {
                assert_eq!(order_id, OrderId(7));
                assert_eq!(status, OrderStatus::Processed);
                assert_eq!(amount, Decimal::new(328125, 2));
            }
            other => panic!("unexpected variant after round-trip: {:?}", other),
        }
    }
}
