//! Derived spend statistics over a list's items.
//!
//! Stats are never persisted and never maintained incrementally: they are
//! recomputed on every read from the authoritative in-memory item set, so
//! correctness depends only on that set being accurate.

use serde::{Deserialize, Serialize};

use super::ShoppingItem;

/// Aggregate counts and monetary sums for a set of items.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShoppingListStats {
    /// Total number of items.
    pub total_items: usize,
    /// Number of completed (bought) items.
    pub completed_items: usize,
    /// Sum of quantity times price over all items.
    pub total_value: f64,
    /// Sum of quantity times price over completed items only.
    pub completed_value: f64,
}

/// Computes stats from an item set. Pure; no remote call.
pub fn compute_stats(items: &[ShoppingItem]) -> ShoppingListStats {
    let total_items = items.len();
    let completed_items = items.iter().filter(|i| i.completed).count();
    let total_value = items.iter().map(|i| i.line_total()).sum();
    let completed_value = items
        .iter()
        .filter(|i| i.completed)
        .map(|i| i.line_total())
        .sum();

    ShoppingListStats {
        total_items,
        completed_items,
        total_value,
        completed_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;
    use chrono::Utc;
    use uuid::Uuid;

    fn item(name: &str, qty: f64, unit: Unit, price: f64, completed: bool) -> ShoppingItem {
        ShoppingItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            quantity: qty,
            unit,
            price,
            completed,
            created_at: Utc::now(),
            completed_at: completed.then(Utc::now),
        }
    }

    #[test]
    fn test_empty_set() {
        let stats = compute_stats(&[]);
        assert_eq!(stats, ShoppingListStats::default());
    }

    #[test]
    fn test_totals_sum_line_totals() {
        let items = vec![
            item("Milk", 1.0, Unit::Unit, 4.5, false),
            item("Rice", 2.0, Unit::Kilogram, 5.0, true),
            item("Soap", 3.0, Unit::Unit, 2.0, true),
        ];

        let stats = compute_stats(&items);
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.completed_items, 2);
        assert!((stats.total_value - 20.5).abs() < 1e-9);
        assert!((stats.completed_value - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_completed_value_only_counts_completed() {
        let items = vec![
            item("Milk", 1.0, Unit::Unit, 4.5, false),
            item("Bread", 2.0, Unit::Unit, 3.0, false),
        ];

        let stats = compute_stats(&items);
        assert_eq!(stats.completed_items, 0);
        assert_eq!(stats.completed_value, 0.0);
        assert!((stats.total_value - 10.5).abs() < 1e-9);
    }
}
