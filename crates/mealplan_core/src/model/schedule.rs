//! Scheduled meal domain model.
//!
//! # Invariants
//! - `date` is a calendar day without time component.
//! - `portion_multiplier` is finite and strictly positive; `1.0` means the
//!   recipe is cooked as written.
//! - Deleting a scheduled meal never touches its recipe.

use crate::model::recipe::{is_positive, MealType, RecipeId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for scheduled meals.
pub type ScheduledMealId = Uuid;

/// Assignment of one recipe to a calendar day and meal slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMeal {
    pub id: ScheduledMealId,
    pub recipe_id: RecipeId,
    pub date: NaiveDate,
    pub meal_type: MealType,
    #[serde(default = "default_portion_multiplier")]
    pub portion_multiplier: f64,
    pub notes: Option<String>,
}

fn default_portion_multiplier() -> f64 {
    1.0
}

impl ScheduledMeal {
    /// Creates a meal with a generated ID and the default portion multiplier.
    pub fn new(recipe_id: RecipeId, date: NaiveDate, meal_type: MealType) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipe_id,
            date,
            meal_type,
            portion_multiplier: default_portion_multiplier(),
            notes: None,
        }
    }

    /// Returns whether the multiplier is usable for aggregation math.
    pub fn has_valid_multiplier(&self) -> bool {
        is_positive(self.portion_multiplier)
    }

    /// Returns whether this meal falls inside the inclusive day range.
    pub fn is_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date >= start && self.date <= end
    }
}
