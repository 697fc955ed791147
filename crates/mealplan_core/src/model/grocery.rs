//! Grocery list snapshot model.
//!
//! # Invariants
//! - A list is a point-in-time snapshot: item names and categories are copied
//!   at generation time and never follow later catalog edits.
//! - `(item_id, unit)` is unique within one list.
//! - `purchased` is the only field mutated after generation.

use crate::model::item::{ItemCategory, ItemId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for grocery lists.
pub type GroceryListId = Uuid;

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range with `start > end` contains no days.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }
}

/// One shopping line of a generated list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryListItem {
    pub item_id: ItemId,
    pub item_name: String,
    pub category: ItemCategory,
    /// Net quantity still to buy, always > 0.
    pub quantity: f64,
    pub unit: String,
    pub purchased: bool,
}

/// Persisted grocery list snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryList {
    pub id: GroceryListId,
    pub date_range: DateRange,
    /// Unix epoch milliseconds.
    pub generated_at: i64,
    pub items: Vec<GroceryListItem>,
}

impl GroceryList {
    /// Returns the line for `(item_id, unit)`, if present.
    pub fn line(&self, item_id: ItemId, unit: &str) -> Option<&GroceryListItem> {
        self.items
            .iter()
            .find(|line| line.item_id == item_id && line.unit == unit)
    }

    /// Number of lines not yet marked purchased.
    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|line| !line.purchased).count()
    }
}
