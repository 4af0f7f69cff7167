//! Shared types and errors for the orderflow pipeline.
//!
//! This crate provides the foundational types used across the other orderflow crates:
//! - `OrderflowError`: unified error taxonomy
//! - `Order` / `OrderLine`: the record threaded through a pipeline
//! - `OrderStatus`: the closed set of workflow states

use std::fmt;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unified error type for all orderflow subsystems.
///
/// Only construction-time problems surface here. An order that fails
/// verification is a domain state (`OrderStatus::Error`), not an error value.
#[derive(Debug, thiserror::Error)]
pub enum OrderflowError {
    #[error("Pipeline configuration error: {0}")]
    Configuration(String),

    #[error("Step '{step}' is invalid: {message}")]
    InvalidStep { step: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrderflowError {
    /// Returns `true` for errors caused by a malformed pipeline definition.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OrderflowError::Configuration(_) | OrderflowError::InvalidStep { .. }
        )
    }
}

/// A convenience alias for `Result<T, OrderflowError>`.
pub type Result<T> = std::result::Result<T, OrderflowError>;

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Created,
    InProgress,
    Processed,
    Error,
}

impl OrderStatus {
    /// `Processed` and `Error` have no outgoing transition in the workflow.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Processed | OrderStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Processed => "PROCESSED",
            OrderStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Order / OrderLine
// ---------------------------------------------------------------------------

/// Opaque order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A single purchase (positive) or discount (negative) line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub amount: Decimal,
}

impl OrderLine {
    pub fn new(amount: impl Into<Decimal>) -> Self {
        Self {
            amount: amount.into(),
        }
    }
}

/// The record threaded through a pipeline.
///
/// `amount` starts at zero and is derived from `order_lines` once an
/// aggregation step has run; later steps (tax) may change it deliberately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub order_lines: Vec<OrderLine>,
}

impl Order {
    /// A fresh `Created` order with no lines and a zero amount.
    pub fn new(id: u64) -> Self {
        Self {
            id: OrderId(id),
            status: OrderStatus::Created,
            amount: Decimal::ZERO,
            order_lines: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_amount(mut self, amount: impl Into<Decimal>) -> Self {
        self.amount = amount.into();
        self
    }

    pub fn with_line(mut self, amount: impl Into<Decimal>) -> Self {
        self.order_lines.push(OrderLine::new(amount));
        self
    }

    pub fn with_lines<I, D>(mut self, amounts: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Decimal>,
    {
        self.order_lines
            .extend(amounts.into_iter().map(OrderLine::new));
        self
    }

    /// Sum of all line amounts, independent of the current `amount`.
    ///
    /// Returns `None` when the sum does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.order_lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.amount))
    }

    /// Read a JSON array of orders from `path`.
    pub fn load_all(path: &Path) -> Result<Vec<Order>> {
        let data = std::fs::read_to_string(path)?;
        let orders: Vec<Order> = serde_json::from_str(&data)?;
        Ok(orders)
    }

    /// Write `orders` to `path` as a pretty-printed JSON array.
    pub fn save_all(orders: &[Order], path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(orders)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
