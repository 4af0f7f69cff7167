//! Ordered chain of processing steps with a single entry point.
//!
//! Steps are kept in an owned `Vec` in append order. `append` always adds at
//! the tail, so the first step appended is the entry point. `process` threads
//! the order through every step in turn; each step sees the result of the one
//! before it.

use std::sync::Arc;

use orderflow_types::{Order, OrderStatus};

use crate::compose::Transform;
use crate::notify::Notifier;
use crate::policy::StepKind;
use crate::step::{DynStep, GuardedStep, OrderStep};

#[derive(Debug, Default)]
pub struct StepChain {
    steps: Vec<DynStep>,
}

impl StepChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `step` at the tail and return the chain (builder style).
    pub fn append(mut self, step: impl OrderStep + 'static) -> Self {
        self.push(step);
        self
    }

    /// Append `step` at the tail in place.
    pub fn push(&mut self, step: impl OrderStep + 'static) {
        self.steps.push(DynStep::new(step));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(DynStep::name).collect()
    }

    /// Run `order` through every step, head to tail. An empty chain returns
    /// the order unchanged.
    pub fn process(&self, order: Order) -> Order {
        self.steps.iter().fold(order, |order, step| step.apply(order))
    }

    /// Build a chain of guarded policy steps, in the given order.
    pub fn from_kinds<'a, I>(kinds: I, notifier: Arc<dyn Notifier>) -> Self
    where
        I: IntoIterator<Item = &'a StepKind>,
    {
        kinds.into_iter().fold(Self::new(), |chain, kind| {
            chain.append(kind.into_step(notifier.clone()))
        })
    }
}

impl OrderStep for StepChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn apply(&self, order: Order) -> Order {
        self.process(order)
    }
}

/// Build a chain from `(guard, action)` pairs, preserving their order.
///
/// Steps are named `step-1`, `step-2`, ... in logs.
pub fn build_chain<I>(steps: I) -> StepChain
where
    I: IntoIterator<Item = (OrderStatus, Transform)>,
{
    steps
        .into_iter()
        .enumerate()
        .fold(StepChain::new(), |chain, (i, (guard, action))| {
            chain.append(GuardedStep::from_transform(
                format!("step-{}", i + 1),
                guard,
                action,
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use rust_decimal::Decimal;

    use crate::compose::transform;
    use crate::notify::NullNotifier;
    use crate::policy::standard_workflow;

    /// Step that records its name in a shared log whenever it fires.
    fn tracing_step(name: &'static str, guard: OrderStatus, log: Arc<Mutex<Vec<&'static str>>>) -> GuardedStep {
        GuardedStep::new(name, guard, move |order: Order| {
            log.lock().unwrap().push(name);
            order
        })
    }

    #[test]
    fn empty_chain_is_identity() {
        let chain = StepChain::new();
        assert!(chain.is_empty());
        let input = Order::new(1).with_lines([1, 2]);
        assert_eq!(chain.process(input.clone()), input);
    }

    #[test]
    fn append_to_empty_chain_makes_head_and_tail() {
        let chain = StepChain::new().append(GuardedStep::new(
            "only",
            OrderStatus::Created,
            |o: Order| o.with_status(OrderStatus::InProgress),
        ));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.step_names(), vec!["only"]);
        assert_eq!(chain.process(Order::new(1)).status, OrderStatus::InProgress);
    }

    #[test]
    fn steps_run_in_append_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = StepChain::new()
            .append(tracing_step("a", OrderStatus::Created, log.clone()))
            .append(tracing_step("b", OrderStatus::Created, log.clone()));
        chain.push(tracing_step("c", OrderStatus::Created, log.clone()));

        chain.process(Order::new(1));

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(chain.step_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn later_steps_observe_earlier_mutations() {
        let chain = build_chain(vec![
            (
                OrderStatus::Created,
                transform(|o: Order| o.with_status(OrderStatus::InProgress)),
            ),
            (
                OrderStatus::InProgress,
                transform(|o: Order| o.with_amount(10)),
            ),
        ]);
        let out = chain.process(Order::new(1));
        assert_eq!(out.status, OrderStatus::InProgress);
        assert_eq!(out.amount, Decimal::from(10));
        assert_eq!(chain.step_names(), vec!["step-1", "step-2"]);
    }

    #[test]
    fn chain_nests_as_a_step() {
        let inner = StepChain::from_kinds(&standard_workflow()[..2], Arc::new(NullNotifier));
        let outer = StepChain::new().append(inner);
        let out = outer.process(Order::new(5).with_lines([2, 3]));
        assert_eq!(out.status, OrderStatus::InProgress);
        assert_eq!(out.amount, Decimal::from(5));
    }
}
