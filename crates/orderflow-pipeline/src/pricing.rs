//! Pure pricing transforms: line aggregation and tax.
//!
//! All arithmetic is exact decimal. Rounding only happens when a
//! [`RoundingPolicy`] with a scale is configured.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use orderflow_types::Order;

use crate::compose::{transform, Transform};

/// Largest scale `rust_decimal` can represent.
pub const MAX_SCALE: u32 = 28;

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    #[default]
    HalfEven,
    HalfUp,
    HalfDown,
    Down,
    Up,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfDown => RoundingStrategy::MidpointTowardZero,
            RoundingMode::Down => RoundingStrategy::ToZero,
            RoundingMode::Up => RoundingStrategy::AwayFromZero,
        }
    }
}

/// How a computed amount is rounded. The default (`scale: None`) keeps the
/// exact result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundingPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default)]
    pub mode: RoundingMode,
}

impl RoundingPolicy {
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn to_scale(scale: u32, mode: RoundingMode) -> Self {
        Self {
            scale: Some(scale),
            mode,
        }
    }

    pub fn apply(&self, value: Decimal) -> Decimal {
        match self.scale {
            Some(scale) => value.round_dp_with_strategy(scale, self.mode.strategy()),
            None => value,
        }
    }
}

// ---------------------------------------------------------------------------
// Tax rate
// ---------------------------------------------------------------------------

/// A tax rate expressed as a percentage, e.g. `9.375` for 9.375 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(pub Decimal);

impl TaxRate {
    pub fn percent(rate: Decimal) -> Self {
        Self(rate)
    }

    /// `1 + rate / 100`
    pub fn multiplier(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED + Decimal::ONE
    }
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// Set `amount` to the sum of the order lines.
///
/// On decimal overflow the amount is left unchanged and the problem is logged.
pub fn aggregate_amount(mut order: Order) -> Order {
    match order.line_total() {
        Some(total) => order.amount = total,
        None => {
            tracing::error!(
                order_id = %order.id,
                lines = order.order_lines.len(),
                "Order line total overflowed; amount left unchanged"
            );
        }
    }
    order
}

/// Multiply `amount` by the tax multiplier, then apply `rounding`.
///
/// On decimal overflow the amount is left unchanged and the problem is logged.
pub fn apply_tax(mut order: Order, rate: TaxRate, rounding: RoundingPolicy) -> Order {
    match order.amount.checked_mul(rate.multiplier()) {
        Some(taxed) => order.amount = rounding.apply(taxed),
        None => {
            tracing::error!(
                order_id = %order.id,
                amount = %order.amount,
                rate = %rate.0,
                "Tax computation overflowed; amount left unchanged"
            );
        }
    }
    order
}

/// [`aggregate_amount`] as a [`Transform`].
pub fn aggregation() -> Transform {
    transform(aggregate_amount)
}

/// [`apply_tax`] as a [`Transform`].
pub fn tax(rate: TaxRate, rounding: RoundingPolicy) -> Transform {
    transform(move |order| apply_tax(order, rate, rounding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn multiplier_divides_by_hundred_and_adds_one() {
        assert_eq!(TaxRate::percent(dec("9.375")).multiplier(), dec("1.09375"));
        assert_eq!(TaxRate::percent(Decimal::ZERO).multiplier(), Decimal::ONE);
    }

    #[test]
    fn aggregate_sums_lines() {
        let order = aggregate_amount(Order::new(1).with_lines([1000, 2000]));
        assert_eq!(order.amount, Decimal::from(3000));
    }

    #[test]
    fn aggregate_handles_discount_lines() {
        let order = aggregate_amount(Order::new(2).with_lines([1000, -2000]));
        assert_eq!(order.amount, Decimal::from(-1000));
    }

    #[test]
    fn aggregate_overwrites_previous_amount() {
        let order = aggregate_amount(Order::new(3).with_amount(42).with_line(5));
        assert_eq!(order.amount, Decimal::from(5));
    }

    #[test]
    fn tax_is_exact_by_default() {
        let order = apply_tax(
            Order::new(1).with_amount(3000),
            TaxRate::percent(dec("9.375")),
            RoundingPolicy::exact(),
        );
        assert_eq!(order.amount, dec("3281.25"));
    }

    #[test]
    fn tax_rounds_when_scale_configured() {
        let rate = TaxRate::percent(dec("9.375"));
        let base = Order::new(1).with_amount(dec("10.01"));
        // 10.01 * 1.09375 = 10.9484375
        let exact = apply_tax(base.clone(), rate, RoundingPolicy::exact());
        assert_eq!(exact.amount, dec("10.9484375"));

        let rounded = apply_tax(base.clone(), rate, RoundingPolicy::to_scale(2, RoundingMode::HalfEven));
        assert_eq!(rounded.amount, dec("10.95"));

        let truncated = apply_tax(base, rate, RoundingPolicy::to_scale(2, RoundingMode::Down));
        assert_eq!(truncated.amount, dec("10.94"));
    }

    #[test]
    fn rounding_modes_differ_on_midpoint() {
        let value = dec("2.5");
        let at = |mode| RoundingPolicy::to_scale(0, mode).apply(value);
        assert_eq!(at(RoundingMode::HalfEven), dec("2"));
        assert_eq!(at(RoundingMode::HalfUp), dec("3"));
        assert_eq!(at(RoundingMode::HalfDown), dec("2"));
        assert_eq!(at(RoundingMode::Down), dec("2"));
        assert_eq!(at(RoundingMode::Up), dec("3"));
    }

    #[test]
    fn tax_overflow_leaves_amount_unchanged() {
        let order = Order::new(1).with_amount(Decimal::MAX);
        let taxed = apply_tax(order, TaxRate::percent(dec("50")), RoundingPolicy::exact());
        assert_eq!(taxed.amount, Decimal::MAX);
    }

    #[test]
    fn aggregate_overflow_leaves_amount_unchanged() {
        let order = Order::new(9)
            .with_amount(7)
            .with_lines([Decimal::MAX, Decimal::MAX]);
        let out = aggregate_amount(order);
        assert_eq!(out.amount, Decimal::from(7));
        assert_eq!(out.order_lines.len(), 2);
    }

    #[test]
    fn rounding_policy_deserializes_with_defaults() {
        let policy: RoundingPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, RoundingPolicy::exact());

        let policy: RoundingPolicy =
            serde_json::from_str(r#"{"scale": 2, "mode": "half_up"}"#).unwrap();
        assert_eq!(policy, RoundingPolicy::to_scale(2, RoundingMode::HalfUp));
    }
}
