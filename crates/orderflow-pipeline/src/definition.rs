//! Pipeline definitions loaded from JSON and the runnable [`Pipeline`] built from them.
//!
//! ```json
//! {
//!   "name": "checkout",
//!   "strategy": "chain",
//!   "steps": [
//!     { "kind": "initialize" },
//!     { "kind": "aggregate_amount" },
//!     { "kind": "apply_tax", "rate": "9.375", "rounding": { "scale": 2 } },
//!     { "kind": "verify" },
//!     { "kind": "process_payment" },
//!     { "kind": "handle_error" },
//!     { "kind": "complete" }
//!   ]
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use orderflow_types::{Order, OrderflowError, Result};

use crate::chain::StepChain;
use crate::compose::{compose, Transform};
use crate::notify::Notifier;
use crate::policy::{standard_workflow, StepKind};
use crate::validation::validate_or_raise;

/// How the steps of a definition are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// A [`StepChain`] of guarded steps.
    #[default]
    Chain,
    /// One [`Transform`] folded from gated step transforms.
    Composed,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Chain => f.write_str("chain"),
            Strategy::Composed => f.write_str("composed"),
        }
    }
}

impl FromStr for Strategy {
    type Err = OrderflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chain" => Ok(Strategy::Chain),
            "composed" => Ok(Strategy::Composed),
            other => Err(OrderflowError::Configuration(format!(
                "unknown strategy '{other}' (expected 'chain' or 'composed')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    #[serde(default)]
    pub strategy: Strategy,
    pub steps: Vec<StepKind>,
}

impl PipelineDefinition {
    pub fn new(name: impl Into<String>, strategy: Strategy, steps: Vec<StepKind>) -> Self {
        Self {
            name: name.into(),
            strategy,
            steps,
        }
    }

    /// The six-step order workflow, assembled with `strategy`.
    pub fn standard(strategy: Strategy) -> Self {
        Self::new("standard", strategy, standard_workflow())
    }

    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| {
            OrderflowError::Configuration(format!("invalid pipeline definition: {e}"))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A built, reusable pipeline.
pub enum Pipeline {
    Chain(StepChain),
    Composed(Transform),
}

impl Pipeline {
    /// Validate `definition` and assemble it. Steps that alert use `notifier`.
    pub fn build(definition: &PipelineDefinition, notifier: Arc<dyn Notifier>) -> Result<Self> {
        validate_or_raise(definition)?;

        let pipeline = match definition.strategy {
            Strategy::Chain => Pipeline::Chain(StepChain::from_kinds(&definition.steps, notifier)),
            Strategy::Composed => Pipeline::Composed(compose(
                definition
                    .steps
                    .iter()
                    .map(|kind| kind.into_transform(notifier.clone())),
            )),
        };
        tracing::debug!(
            pipeline = %definition.name,
            strategy = %definition.strategy,
            steps = definition.steps.len(),
            "Pipeline built"
        );
        Ok(pipeline)
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Pipeline::Chain(_) => Strategy::Chain,
            Pipeline::Composed(_) => Strategy::Composed,
        }
    }

    /// Thread `order` through the whole pipeline.
    pub fn process(&self, order: Order) -> Order {
        match self {
            Pipeline::Chain(chain) => chain.process(order),
            Pipeline::Composed(transform) => transform(order),
        }
    }
}
