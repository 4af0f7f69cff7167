//! Pipeline executor: runs orders through a built pipeline and reports on the run.
//!
//! Orders are processed one at a time, in input order. Each order is threaded
//! through the full pipeline before the next one starts.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use orderflow_types::{Order, OrderStatus, Result};

use crate::definition::{Pipeline, PipelineDefinition, Strategy};
use crate::events::{EventEmitter, OrderEvent};
use crate::notify::Notifier;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Owns a built pipeline and the event channel its steps report to.
pub struct PipelineExecutor {
    name: String,
    step_count: usize,
    pipeline: Pipeline,
    events: EventEmitter,
}

/// The result of a completed run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub pipeline: String,
    pub strategy: Strategy,
    pub processed: usize,
    pub errored: usize,
    /// Orders that ended in a non-terminal status.
    pub unfinished: usize,
    pub orders: Vec<Order>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// PipelineExecutor
// ---------------------------------------------------------------------------

impl PipelineExecutor {
    /// Build an executor whose step alerts go to the executor's event channel.
    pub fn new(definition: &PipelineDefinition) -> Result<Self> {
        Self::with_events(definition, EventEmitter::default())
    }

    /// Build an executor that reports to an existing event channel.
    ///
    /// Step alerts are sent on the same channel as lifecycle events, so a
    /// subscriber that falls more than the channel capacity behind loses them.
    pub fn with_events(definition: &PipelineDefinition, events: EventEmitter) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = Arc::new(events.clone());
        Self::with_notifier(definition, events, notifier)
    }

    /// Build an executor that sends lifecycle events to `events` and step
    /// alerts to `notifier`.
    pub fn with_notifier(
        definition: &PipelineDefinition,
        events: EventEmitter,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let pipeline = Pipeline::build(definition, notifier)?;
        Ok(Self {
            name: definition.name.clone(),
            step_count: definition.steps.len(),
            pipeline,
            events,
        })
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn strategy(&self) -> Strategy {
        self.pipeline.strategy()
    }

    /// Thread a single order through the pipeline.
    pub fn process(&self, order: Order) -> Order {
        self.events.emit(OrderEvent::OrderStarted {
            order_id: order.id,
            status: order.status,
        });

        let order = self.pipeline.process(order);

        tracing::debug!(
            order_id = %order.id,
            status = %order.status,
            amount = %order.amount,
            "Order finished"
        );
        self.events.emit(OrderEvent::OrderFinished {
            order_id: order.id,
            status: order.status,
            amount: order.amount,
            finished_at: Utc::now(),
        });
        order
    }

    /// Process `orders` sequentially and summarise the outcome.
    pub fn run<I>(&self, orders: I) -> RunSummary
    where
        I: IntoIterator<Item = Order>,
    {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();

        self.events.emit(OrderEvent::RunStarted {
            run_id: run_id.clone(),
            pipeline_name: self.name.clone(),
            step_count: self.step_count,
        });
        tracing::info!(
            run_id = %run_id,
            pipeline = %self.name,
            strategy = %self.strategy(),
            "Run started"
        );

        let orders: Vec<Order> = orders.into_iter().map(|o| self.process(o)).collect();

        let processed = count_status(&orders, OrderStatus::Processed);
        let errored = count_status(&orders, OrderStatus::Error);
        let unfinished = orders.iter().filter(|o| !o.status.is_terminal()).count();
        let duration_ms = clock.elapsed().as_millis() as u64;

        self.events.emit(OrderEvent::RunCompleted {
            run_id: run_id.clone(),
            processed,
            errored,
            duration_ms,
        });
        tracing::info!(
            run_id = %run_id,
            processed,
            errored,
            unfinished,
            duration_ms,
            "Run completed"
        );

        RunSummary {
            run_id,
            pipeline: self.name.clone(),
            strategy: self.strategy(),
            processed,
            errored,
            unfinished,
            orders,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

fn count_status(orders: &[Order], status: OrderStatus) -> usize {
    orders.iter().filter(|o| o.status == status).count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
