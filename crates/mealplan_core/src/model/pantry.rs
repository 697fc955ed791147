//! Pantry stock domain model.
//!
//! # Invariants
//! - One row per item; restocking accumulates into the same row.
//! - `quantity` is never negative.
//! - `expiration_date` is informational and never affects aggregation math.

use crate::model::item::ItemId;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// On-hand stock for one catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryItem {
    pub item_id: ItemId,
    pub quantity: f64,
    pub unit: String,
    pub expiration_date: Option<NaiveDate>,
}

impl PantryItem {
    /// Applies a signed delta, clamping the result at zero.
    ///
    /// Physical stock cannot be negative, so over-consumption empties the row
    /// instead of failing.
    pub fn apply_delta(&mut self, delta: f64) {
        self.quantity = (self.quantity + delta).max(0.0);
    }

    /// Returns whether the item expires within `[today, today + days]`.
    pub fn expires_within(&self, today: NaiveDate, days: u32) -> bool {
        match self.expiration_date {
            Some(expiration) => {
                let horizon = today
                    .checked_add_days(Days::new(u64::from(days)))
                    .unwrap_or(NaiveDate::MAX);
                expiration >= today && expiration <= horizon
            }
            None => false,
        }
    }
}
