//! Domain models shared between the stores and the backend boundary.

pub mod item;
pub mod list;
pub mod stats;

pub use item::{ShoppingItem, Unit, UnitParseError};
pub use list::{ShareGrant, ShoppingList};
pub use stats::{compute_stats, ShoppingListStats};
