//! Pipeline definition validation: lint rules and diagnostics.
//!
//! Call [`validate`] for advisory diagnostics or [`validate_or_raise`] to fail
//! on the first `Error`-severity issue.

use std::collections::HashSet;

use rust_decimal::Decimal;

use orderflow_types::{OrderflowError, Result};

use crate::definition::PipelineDefinition;
use crate::policy::StepKind;
use crate::pricing::MAX_SCALE;

// ---------------------------------------------------------------------------
// Diagnostic types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub step_index: Option<usize>,
    pub fix: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

// ---------------------------------------------------------------------------
// LintRule trait
// ---------------------------------------------------------------------------

pub trait LintRule: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, definition: &PipelineDefinition) -> Vec<Diagnostic>;
}

fn position(steps: &[StepKind], name: &str) -> Option<usize> {
    steps.iter().position(|s| s.name() == name)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

struct NonEmptyRule;
impl LintRule for NonEmptyRule {
    fn name(&self) -> &str { "non_empty" }
    fn apply(&self, definition: &PipelineDefinition) -> Vec<Diagnostic> {
        if definition.steps.is_empty() {
            vec![Diagnostic {
                rule: self.name().into(),
                severity: Severity::Warning,
                message: format!(
                    "Pipeline '{}' has no steps; orders pass through unchanged",
                    definition.name
                ),
                step_index: None,
                fix: Some("Add at least one step".into()),
            }]
        } else {
            vec![]
        }
    }
}

struct TaxRateRangeRule;
impl LintRule for TaxRateRangeRule {
    fn name(&self) -> &str { "tax_rate_range" }
    fn apply(&self, definition: &PipelineDefinition) -> Vec<Diagnostic> {
        definition
            .steps
            .iter()
            .enumerate()
            .filter_map(|(i, step)| match step {
                StepKind::ApplyTax { rate, .. } if rate.0 < Decimal::ZERO => Some(Diagnostic {
                    rule: self.name().into(),
                    severity: Severity::Error,
                    message: format!("Step {} has a negative tax rate ({}%)", i + 1, rate.0),
                    step_index: Some(i),
                    fix: Some("Use a tax rate of 0 or more".into()),
                }),
                _ => None,
            })
            .collect()
    }
}

struct RoundingScaleRule;
impl LintRule for RoundingScaleRule {
    fn name(&self) -> &str { "rounding_scale" }
    fn apply(&self, definition: &PipelineDefinition) -> Vec<Diagnostic> {
        definition
            .steps
            .iter()
            .enumerate()
            .filter_map(|(i, step)| match step {
                StepKind::ApplyTax { rounding, .. } => match rounding.scale {
                    Some(scale) if scale > MAX_SCALE => Some(Diagnostic {
                        rule: self.name().into(),
                        severity: Severity::Error,
                        message: format!(
                            "Step {} rounds to {} decimal places; at most {} are supported",
                            i + 1,
                            scale,
                            MAX_SCALE
                        ),
                        step_index: Some(i),
                        fix: Some(format!("Use a rounding scale between 0 and {MAX_SCALE}")),
                    }),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }
}

struct DuplicateStepRule;
impl LintRule for DuplicateStepRule {
    fn name(&self) -> &str { "duplicate_step" }
    fn apply(&self, definition: &PipelineDefinition) -> Vec<Diagnostic> {
        let mut seen = HashSet::new();
        definition
            .steps
            .iter()
            .enumerate()
            // Stacked taxes are legitimate; every other step should appear once.
            .filter(|(_, step)| !matches!(step, StepKind::ApplyTax { .. }))
            .filter(|(_, step)| !seen.insert(step.name()))
            .map(|(i, step)| Diagnostic {
                rule: self.name().into(),
                severity: Severity::Warning,
                message: format!("Step {} repeats '{}'", i + 1, step.name()),
                step_index: Some(i),
                fix: Some(format!("Remove the extra '{}' step", step.name())),
            })
            .collect()
    }
}

struct VerifyBeforePaymentRule;
impl LintRule for VerifyBeforePaymentRule {
    fn name(&self) -> &str { "verify_before_payment" }
    fn apply(&self, definition: &PipelineDefinition) -> Vec<Diagnostic> {
        let Some(payment) = position(&definition.steps, "process_payment") else {
            return vec![];
        };
        match position(&definition.steps, "verify") {
            Some(verify) if verify < payment => vec![],
            _ => vec![Diagnostic {
                rule: self.name().into(),
                severity: Severity::Warning,
                message: "Payment is processed without a preceding 'verify' step; \
                          non-positive orders will be charged"
                    .into(),
                step_index: Some(payment),
                fix: Some("Add a 'verify' step before 'process_payment'".into()),
            }],
        }
    }
}

struct AggregateBeforeTaxRule;
impl LintRule for AggregateBeforeTaxRule {
    fn name(&self) -> &str { "aggregate_before_tax" }
    fn apply(&self, definition: &PipelineDefinition) -> Vec<Diagnostic> {
        let Some(tax) = position(&definition.steps, "apply_tax") else {
            return vec![];
        };
        match position(&definition.steps, "aggregate_amount") {
            Some(aggregate) if aggregate < tax => vec![],
            Some(aggregate) => vec![Diagnostic {
                rule: self.name().into(),
                severity: Severity::Warning,
                message: format!(
                    "Tax (step {}) runs before aggregation (step {}); aggregation overwrites the taxed amount",
                    tax + 1,
                    aggregate + 1
                ),
                step_index: Some(tax),
                fix: Some("Move 'apply_tax' after 'aggregate_amount'".into()),
            }],
            None => vec![Diagnostic {
                rule: self.name().into(),
                severity: Severity::Info,
                message: "Tax is applied to the incoming amount; no aggregation step is present"
                    .into(),
                step_index: Some(tax),
                fix: None,
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

fn built_in_rules() -> Vec<Box<dyn LintRule>> {
    vec![
        Box::new(NonEmptyRule),
        Box::new(TaxRateRangeRule),
        Box::new(RoundingScaleRule),
        Box::new(DuplicateStepRule),
        Box::new(VerifyBeforePaymentRule),
        Box::new(AggregateBeforeTaxRule),
    ]
}

/// Run all built-in lint rules and return every diagnostic.
pub fn validate(definition: &PipelineDefinition) -> Vec<Diagnostic> {
    built_in_rules()
        .iter()
        .flat_map(|rule| rule.apply(definition))
        .collect()
}

/// Run all lint rules and fail on the first `Error`-severity diagnostic.
///
/// Returns the full diagnostic list when no errors are present.
pub fn validate_or_raise(definition: &PipelineDefinition) -> Result<Vec<Diagnostic>> {
    let diagnostics = validate(definition);
    if let Some(err) = diagnostics.iter().find(|d| d.severity == Severity::Error) {
        let message = format!("[{}] {}", err.rule, err.message);
        return Err(match err.step_index.and_then(|i| definition.steps.get(i)) {
            Some(step) => OrderflowError::InvalidStep {
                step: step.name().to_string(),
                message,
            },
            None => OrderflowError::Configuration(message),
        });
    }
    Ok(diagnostics)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Strategy;
    use crate::policy::standard_workflow;
    use crate::pricing::{RoundingMode, RoundingPolicy, TaxRate};

    fn def(steps: Vec<StepKind>) -> PipelineDefinition {
        PipelineDefinition::new("test", Strategy::Chain, steps)
    }

    fn tax(rate: i64) -> StepKind {
        StepKind::ApplyTax {
            rate: TaxRate::percent(Decimal::from(rate)),
            rounding: RoundingPolicy::exact(),
        }
    }

    fn rules_fired(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.rule.as_str()).collect()
    }

    #[test]
    fn standard_workflow_is_clean() {
        assert!(validate(&def(standard_workflow())).is_empty());
    }

    #[test]
    fn empty_pipeline_warns() {
        let diags = validate_or_raise(&def(vec![])).unwrap();
        assert_eq!(rules_fired(&diags), vec!["non_empty"]);
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn negative_tax_rate_is_error() {
        let diags = validate(&def(vec![StepKind::AggregateAmount, tax(-5)]));
        assert_eq!(rules_fired(&diags), vec!["tax_rate_range"]);
        assert_eq!(diags[0].step_index, Some(1));

        let err = validate_or_raise(&def(vec![StepKind::AggregateAmount, tax(-5)])).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, OrderflowError::InvalidStep { ref step, .. } if step == "apply_tax"));
        assert!(err.to_string().contains("tax_rate_range"));
    }

    #[test]
    fn oversized_rounding_scale_is_error() {
        let step = StepKind::ApplyTax {
            rate: TaxRate::percent(Decimal::from(5)),
            rounding: RoundingPolicy::to_scale(40, RoundingMode::HalfUp),
        };
        let diags = validate(&def(vec![StepKind::AggregateAmount, step]));
        assert_eq!(rules_fired(&diags), vec!["rounding_scale"]);
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn duplicate_steps_warn_but_stacked_tax_does_not() {
        let diags = validate(&def(vec![
            StepKind::Initialize,
            StepKind::Initialize,
            StepKind::AggregateAmount,
            tax(5),
            tax(2),
        ]));
        assert_eq!(rules_fired(&diags), vec!["duplicate_step"]);
        assert_eq!(diags[0].step_index, Some(1));
    }

    #[test]
    fn payment_without_verify_warns() {
        let diags = validate(&def(vec![
            StepKind::Initialize,
            StepKind::ProcessPayment,
            StepKind::Verify,
        ]));
        assert_eq!(rules_fired(&diags), vec!["verify_before_payment"]);
    }

    #[test]
    fn tax_before_aggregation_warns() {
        let diags = validate(&def(vec![tax(5), StepKind::AggregateAmount]));
        assert_eq!(rules_fired(&diags), vec!["aggregate_before_tax"]);
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn tax_without_aggregation_is_info() {
        let diags = validate(&def(vec![tax(5)]));
        assert_eq!(rules_fired(&diags), vec!["aggregate_before_tax"]);
        assert_eq!(diags[0].severity, Severity::Info);
        assert!(validate_or_raise(&def(vec![tax(5)])).is_ok());
    }
}
