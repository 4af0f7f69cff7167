//! Composition of pure `Order -> Order` transforms.
//!
//! [`compose`] folds an ordered list of transforms into a single one, starting
//! from [`identity`] and associating with [`and_then`]:
//!
//! ```text
//! compose([f1, f2, ..., fn])(x) == fn(...f2(f1(x)))
//! ```
//!
//! Transforms are unconditional. A caller that needs status gating wraps the
//! transform with [`gated`].

use std::sync::Arc;

use orderflow_types::{Order, OrderStatus};

use crate::policy::admits;

/// A shareable, reusable order transform.
pub type Transform = Arc<dyn Fn(Order) -> Order + Send + Sync>;

/// Wrap a closure as a [`Transform`].
pub fn transform<F>(f: F) -> Transform
where
    F: Fn(Order) -> Order + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The transform that returns its input unchanged.
pub fn identity() -> Transform {
    Arc::new(|order: Order| order)
}

/// `and_then(f, g)(x) == g(f(x))`.
pub fn and_then(first: Transform, second: Transform) -> Transform {
    Arc::new(move |order: Order| second(first(order)))
}

/// Left fold of `transforms` into one transform. An empty input yields [`identity`].
pub fn compose<I>(transforms: I) -> Transform
where
    I: IntoIterator<Item = Transform>,
{
    transforms.into_iter().fold(identity(), and_then)
}

/// Embed a status guard inside a transform: the inner transform only runs
/// when the order's status at call time equals `guard`.
pub fn gated(guard: OrderStatus, inner: Transform) -> Transform {
    Arc::new(move |order: Order| {
        if admits(guard, order.status) {
            inner(order)
        } else {
            order
        }
    })
}
