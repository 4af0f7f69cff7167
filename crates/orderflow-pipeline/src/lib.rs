//! Status-gated order-processing pipeline.
//!
//! This crate implements the orderflow pipeline in two equivalent styles:
//! a [`StepChain`] of guarded steps, and a single [`Transform`] composed from
//! pure order transforms. Both are built from the same workflow policy
//! ([`StepKind`]) and agree on every order. Pipeline definitions can be loaded
//! from JSON, validated with lint rules, and run through a [`PipelineExecutor`].

pub mod chain;
pub mod compose;
pub mod definition;
pub mod engine;
pub mod events;
pub mod notify;
pub mod policy;
pub mod pricing;
pub mod step;
pub mod validation;

pub use chain::{build_chain, StepChain};
pub use compose::{and_then, compose, gated, identity, transform, Transform};
pub use definition::{Pipeline, PipelineDefinition, Strategy};
pub use engine::{PipelineExecutor, RunSummary};
pub use events::{EventEmitter, OrderEvent};
pub use notify::{Notifier, NullNotifier, RecordingNotifier, TracingNotifier};
pub use policy::{admits, standard_workflow, taxed_workflow, StepKind};
pub use pricing::{aggregate_amount, aggregation, apply_tax, tax, RoundingMode, RoundingPolicy, TaxRate};
pub use step::{DynStep, GuardedStep, OrderStep};
pub use validation::{validate, validate_or_raise, Diagnostic, LintRule, Severity};
