//! Processing step trait, dynamic dispatch wrapper, and the guarded step.

use orderflow_types::{Order, OrderStatus};

use crate::compose::{transform, Transform};
use crate::policy::admits;

// ---------------------------------------------------------------------------
// OrderStep trait
// ---------------------------------------------------------------------------

pub trait OrderStep: Send + Sync {
    /// Step identifier used in logs (e.g. "initialize", "verify").
    fn name(&self) -> &str;

    /// Process one order and return the (possibly updated) order.
    ///
    /// A step that does not apply to the order must return it unchanged.
    fn apply(&self, order: Order) -> Order;
}

// ---------------------------------------------------------------------------
// DynStep: object-safe wrapper
// ---------------------------------------------------------------------------

pub struct DynStep(Box<dyn OrderStep>);

impl DynStep {
    pub fn new(step: impl OrderStep + 'static) -> Self {
        Self(Box::new(step))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn apply(&self, order: Order) -> Order {
        self.0.apply(order)
    }
}

impl std::fmt::Debug for DynStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DynStep").field(&self.name()).finish()
    }
}

// ---------------------------------------------------------------------------
// GuardedStep
// ---------------------------------------------------------------------------

/// A step whose action only runs while the order is in `guard` status.
pub struct GuardedStep {
    name: String,
    guard: OrderStatus,
    action: Transform,
}

impl GuardedStep {
    pub fn new<F>(name: impl Into<String>, guard: OrderStatus, action: F) -> Self
    where
        F: Fn(Order) -> Order + Send + Sync + 'static,
    {
        Self::from_transform(name, guard, transform(action))
    }

    pub fn from_transform(name: impl Into<String>, guard: OrderStatus, action: Transform) -> Self {
        Self {
            name: name.into(),
            guard,
            action,
        }
    }
}

impl OrderStep for GuardedStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, order: Order) -> Order {
        if admits(self.guard, order.status) {
            (self.action)(order)
        } else {
            tracing::debug!(
                step = %self.name,
                order_id = %order.id,
                status = %order.status,
                guard = %self.guard,
                "Guard not satisfied, passing order through"
            );
            order
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
