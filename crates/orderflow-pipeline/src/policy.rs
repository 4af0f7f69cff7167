//! Order-processing workflow policy: step kinds, guards, and transitions.
//!
//! ```text
//! CREATED -> IN_PROGRESS -> { PROCESSED | ERROR }
//! ```
//!
//! | kind               | guard       | effect                                   |
//! |--------------------|-------------|------------------------------------------|
//! | `Initialize`       | CREATED     | status -> IN_PROGRESS                    |
//! | `AggregateAmount`  | IN_PROGRESS | amount = sum of lines                    |
//! | `ApplyTax`         | IN_PROGRESS | amount *= 1 + rate / 100                 |
//! | `Verify`           | IN_PROGRESS | amount <= 0 -> ERROR                     |
//! | `ProcessPayment`   | IN_PROGRESS | status -> PROCESSED                      |
//! | `HandleError`      | ERROR       | alert through the notifier               |
//! | `Complete`         | PROCESSED   | completion notice through the notifier   |
//!
//! Guards are checked when a step runs, against the status left by the
//! previous step, so an order that turns `ERROR` during verification skips
//! payment and is still picked up by `HandleError` later in the same run.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderflow_types::{Order, OrderStatus};

use crate::compose::{gated, transform, Transform};
use crate::notify::Notifier;
use crate::pricing::{self, RoundingPolicy, TaxRate};
use crate::step::GuardedStep;

/// `true` when a step guarded by `guard` should fire for an order in `status`.
pub fn admits(guard: OrderStatus, status: OrderStatus) -> bool {
    guard == status
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Initialize,
    AggregateAmount,
    ApplyTax {
        rate: TaxRate,
        #[serde(default)]
        rounding: RoundingPolicy,
    },
    Verify,
    ProcessPayment,
    HandleError,
    Complete,
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Initialize => "initialize",
            StepKind::AggregateAmount => "aggregate_amount",
            StepKind::ApplyTax { .. } => "apply_tax",
            StepKind::Verify => "verify",
            StepKind::ProcessPayment => "process_payment",
            StepKind::HandleError => "handle_error",
            StepKind::Complete => "complete",
        }
    }

    /// The status an order must be in for this step to fire.
    pub fn guard(&self) -> OrderStatus {
        match self {
            StepKind::Initialize => OrderStatus::Created,
            StepKind::AggregateAmount
            | StepKind::ApplyTax { .. }
            | StepKind::Verify
            | StepKind::ProcessPayment => OrderStatus::InProgress,
            StepKind::HandleError => OrderStatus::Error,
            StepKind::Complete => OrderStatus::Processed,
        }
    }

    /// The unguarded effect of this step.
    pub fn action(&self, notifier: Arc<dyn Notifier>) -> Transform {
        match self.clone() {
            StepKind::Initialize => transform(|mut order: Order| {
                tracing::info!(order_id = %order.id, "Start processing order");
                order.status = OrderStatus::InProgress;
                order
            }),
            StepKind::AggregateAmount => transform(|order: Order| {
                tracing::info!(order_id = %order.id, "Setting amount of order");
                pricing::aggregate_amount(order)
            }),
            StepKind::ApplyTax { rate, rounding } => transform(move |order: Order| {
                tracing::info!(order_id = %order.id, rate = %rate.0, "Applying tax to order");
                pricing::apply_tax(order, rate, rounding)
            }),
            StepKind::Verify => transform(|mut order: Order| {
                tracing::info!(order_id = %order.id, amount = %order.amount, "Verify order");
                if order.amount <= Decimal::ZERO {
                    order.status = OrderStatus::Error;
                }
                order
            }),
            StepKind::ProcessPayment => transform(|mut order: Order| {
                tracing::info!(order_id = %order.id, "Processing payment of order");
                order.status = OrderStatus::Processed;
                order
            }),
            StepKind::HandleError => transform(move |order: Order| {
                notifier.notify(&format!(
                    "Failed to process order {}: amount {}",
                    order.id, order.amount
                ));
                order
            }),
            StepKind::Complete => transform(move |order: Order| {
                tracing::info!(order_id = %order.id, "Finished processing order");
                notifier.notify(&format!(
                    "Order {} processed: amount {}",
                    order.id, order.amount
                ));
                order
            }),
        }
    }

    /// This step as a [`GuardedStep`] for the chain strategy.
    pub fn into_step(&self, notifier: Arc<dyn Notifier>) -> GuardedStep {
        GuardedStep::from_transform(self.name(), self.guard(), self.action(notifier))
    }

    /// This step as a gated [`Transform`] for the composed strategy.
    pub fn into_transform(&self, notifier: Arc<dyn Notifier>) -> Transform {
        gated(self.guard(), self.action(notifier))
    }
}

/// initialize -> aggregate -> verify -> pay -> handle error -> complete
pub fn standard_workflow() -> Vec<StepKind> {
    vec![
        StepKind::Initialize,
        StepKind::AggregateAmount,
        StepKind::Verify,
        StepKind::ProcessPayment,
        StepKind::HandleError,
        StepKind::Complete,
    ]
}

/// [`standard_workflow`] with a tax step right after aggregation.
pub fn taxed_workflow(rate: TaxRate, rounding: RoundingPolicy) -> Vec<StepKind> {
    let mut steps = standard_workflow();
    steps.insert(2, StepKind::ApplyTax { rate, rounding });
    steps
}
