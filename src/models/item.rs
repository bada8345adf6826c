//! Shopping items and their unit of measure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unit of measure for an item's quantity.
///
/// The enumeration is fixed: items are either counted or weighed.
/// Fractional quantities are only meaningful for weighed items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    /// Count-based ("2 units of soap").
    #[default]
    #[serde(rename = "unit")]
    Unit,
    /// Weight-based ("1.5 kg of rice").
    #[serde(rename = "kg")]
    Kilogram,
}

impl Unit {
    /// Whether quantities in this unit may be fractional.
    pub fn allows_fractional(&self) -> bool {
        matches!(self, Unit::Kilogram)
    }

    /// The wire representation used by the data service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Unit => "unit",
            Unit::Kilogram => "kg",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error parsing a unit from user input.
#[derive(Debug, Error)]
#[error("unknown unit '{0}', expected 'unit' or 'kg'")]
pub struct UnitParseError(pub String);

impl FromStr for Unit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unit" | "un" => Ok(Unit::Unit),
            "kg" | "kilogram" | "kilo" => Ok(Unit::Kilogram),
            other => Err(UnitParseError(other.to_string())),
        }
    }
}

/// A purchasable entry within a shopping list.
///
/// `completed_at` is set exactly when `completed` transitions to true and
/// cleared when it transitions back to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    /// Positive; fractional only when the unit is weight-based.
    pub quantity: f64,
    pub unit: Unit,
    /// Unit price, non-negative.
    pub price: f64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ShoppingItem {
    /// Line total: quantity times unit price.
    pub fn line_total(&self) -> f64 {
        self.quantity * self.price
    }
}
