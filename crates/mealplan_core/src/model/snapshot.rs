//! Portable snapshot of every persisted entity.
//!
//! # Invariants
//! - `format_version` identifies the wire shape; readers refuse newer versions.
//! - A snapshot is plain data; file handling belongs to callers.

use crate::model::grocery::GroceryList;
use crate::model::item::Item;
use crate::model::pantry::PantryItem;
use crate::model::recipe::Recipe;
use crate::model::schedule::ScheduledMeal;
use serde::{Deserialize, Serialize};

/// Current snapshot wire format.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Export/import envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    /// Unix epoch milliseconds.
    pub exported_at: i64,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub scheduled_meals: Vec<ScheduledMeal>,
    #[serde(default)]
    pub pantry: Vec<PantryItem>,
    #[serde(default)]
    pub grocery_lists: Vec<GroceryList>,
}

impl Snapshot {
    /// Total number of top-level records.
    pub fn record_count(&self) -> usize {
        self.items.len()
            + self.recipes.len()
            + self.scheduled_meals.len()
            + self.pantry.len()
            + self.grocery_lists.len()
    }
}
