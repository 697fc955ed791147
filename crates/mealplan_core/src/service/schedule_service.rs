//! Meal schedule use-case service.
//!
//! # Responsibility
//! - Parse and validate calendar input before meals are stored.
//! - Guard recipe references and the optional per-slot cap.
//!
//! # Invariants
//! - Range queries never return meals outside `[start, end]`.
//! - Unscheduling is idempotent.
//! - Meals referencing deleted recipes stay readable.

use crate::calendar::{parse_day, CalendarError};
use crate::model::recipe::{is_positive, MealType, RecipeId};
use crate::model::schedule::{ScheduledMeal, ScheduledMealId};
use crate::repo::recipe_repo::RecipeRepository;
use crate::repo::schedule_repo::ScheduleRepository;
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input for `ScheduleService::schedule_meal`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleMealRequest {
    /// Calendar day as `YYYY-MM-DD`.
    pub date: String,
    pub meal_type: MealType,
    pub recipe_id: RecipeId,
    /// Defaults to `1.0`.
    pub portion_multiplier: Option<f64>,
    pub notes: Option<String>,
}

impl ScheduleMealRequest {
    pub fn new(date: impl Into<String>, meal_type: MealType, recipe_id: RecipeId) -> Self {
        Self {
            date: date.into(),
            meal_type,
            recipe_id,
            portion_multiplier: None,
            notes: None,
        }
    }
}

/// Errors from schedule operations.
#[derive(Debug)]
pub enum ScheduleError {
    /// Input is not a `YYYY-MM-DD` calendar day.
    InvalidDate(String),
    UnknownRecipe(RecipeId),
    /// Portion multiplier or servings is zero, negative or not finite.
    NegativeQuantity(f64),
    /// Configured cap for `(date, meal_type)` is reached.
    SlotFull {
        date: NaiveDate,
        meal_type: MealType,
        limit: u32,
    },
    MealNotFound(ScheduledMealId),
    Repo(RepoError),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::UnknownRecipe(id) => write!(f, "unknown recipe: {id}"),
            Self::NegativeQuantity(value) => {
                write!(f, "portion must be a finite value > 0, got {value}")
            }
            Self::SlotFull {
                date,
                meal_type,
                limit,
            } => write!(f, "{date} {meal_type} already has {limit} meal(s)"),
            Self::MealNotFound(id) => write!(f, "scheduled meal not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ScheduleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "scheduled meal",
                id,
            } => Self::MealNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<CalendarError> for ScheduleError {
    fn from(value: CalendarError) -> Self {
        match value {
            CalendarError::InvalidDate(input) => Self::InvalidDate(input),
            other => Self::InvalidDate(other.to_string()),
        }
    }
}

/// Schedule service facade.
pub struct ScheduleService<S: ScheduleRepository, R: RecipeRepository> {
    schedule: S,
    recipes: R,
    max_meals_per_slot: Option<u32>,
}

impl<S: ScheduleRepository, R: RecipeRepository> ScheduleService<S, R> {
    /// Creates a service without a per-slot cap.
    pub fn new(schedule: S, recipes: R) -> Self {
        Self {
            schedule,
            recipes,
            max_meals_per_slot: None,
        }
    }

    /// Caps how many meals one `(date, meal_type)` slot may hold.
    pub fn with_slot_limit(mut self, limit: Option<u32>) -> Self {
        self.max_meals_per_slot = limit;
        self
    }

    /// Assigns a recipe to a day and meal slot.
    pub fn schedule_meal(
        &self,
        request: ScheduleMealRequest,
    ) -> Result<ScheduledMeal, ScheduleError> {
        let date = parse_day(&request.date)?;
        let multiplier = request.portion_multiplier.unwrap_or(1.0);
        if !is_positive(multiplier) {
            return Err(ScheduleError::NegativeQuantity(multiplier));
        }
        if !self.recipes.recipe_exists(request.recipe_id)? {
            return Err(ScheduleError::UnknownRecipe(request.recipe_id));
        }
        if let Some(limit) = self.max_meals_per_slot {
            if self.schedule.count_in_slot(date, request.meal_type)? >= limit {
                return Err(ScheduleError::SlotFull {
                    date,
                    meal_type: request.meal_type,
                    limit,
                });
            }
        }

        let mut meal = ScheduledMeal::new(request.recipe_id, date, request.meal_type);
        meal.portion_multiplier = multiplier;
        meal.notes = clean_notes(request.notes);
        self.schedule.insert_meal(&meal)?;

        info!(
            "event=meal_schedule module=schedule status=ok meal_type={} multiplier={}",
            meal.meal_type, meal.portion_multiplier
        );
        Ok(meal)
    }

    /// Schedules a recipe scaled to `servings` people.
    ///
    /// The portion multiplier is `servings / recipe.servings`.
    pub fn schedule_meal_for_servings(
        &self,
        date: &str,
        meal_type: MealType,
        recipe_id: RecipeId,
        servings: u32,
        notes: Option<String>,
    ) -> Result<ScheduledMeal, ScheduleError> {
        let recipe = self
            .recipes
            .get_recipe(recipe_id)?
            .ok_or(ScheduleError::UnknownRecipe(recipe_id))?;
        let multiplier = f64::from(servings) / f64::from(recipe.servings);

        self.schedule_meal(ScheduleMealRequest {
            date: date.to_string(),
            meal_type,
            recipe_id,
            portion_multiplier: Some(multiplier),
            notes,
        })
    }

    /// Removes a meal. Returns `false` when nothing was removed.
    pub fn unschedule_meal(&self, id: ScheduledMealId) -> Result<bool, ScheduleError> {
        Ok(self.schedule.delete_meal(id)?)
    }

    /// Updates notes and/or portion multiplier; `None` keeps the stored value.
    ///
    /// Blank notes clear the stored notes.
    pub fn update_meal(
        &self,
        id: ScheduledMealId,
        notes: Option<String>,
        portion_multiplier: Option<f64>,
    ) -> Result<ScheduledMeal, ScheduleError> {
        let mut meal = self
            .schedule
            .get_meal(id)?
            .ok_or(ScheduleError::MealNotFound(id))?;

        if let Some(multiplier) = portion_multiplier {
            if !is_positive(multiplier) {
                return Err(ScheduleError::NegativeQuantity(multiplier));
            }
            meal.portion_multiplier = multiplier;
        }
        if let Some(notes) = notes {
            meal.notes = clean_notes(Some(notes));
        }

        self.schedule.update_meal(&meal)?;
        Ok(meal)
    }

    pub fn get_meal(&self, id: ScheduledMealId) -> Result<Option<ScheduledMeal>, ScheduleError> {
        Ok(self.schedule.get_meal(id)?)
    }

    /// Meals in the inclusive range; `start > end` yields nothing.
    pub fn meals_in_range(
        &self,
        start: &str,
        end: &str,
        meal_type: Option<MealType>,
    ) -> Result<Vec<ScheduledMeal>, ScheduleError> {
        let start = parse_day(start)?;
        let end = parse_day(end)?;
        self.meals_between(start, end, meal_type)
    }

    /// Same as `meals_in_range` with parsed days.
    pub fn meals_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        meal_type: Option<MealType>,
    ) -> Result<Vec<ScheduledMeal>, ScheduleError> {
        Ok(self.schedule.list_in_range(start, end, meal_type)?)
    }

    pub fn meals_on_date(&self, date: &str) -> Result<Vec<ScheduledMeal>, ScheduleError> {
        let day = parse_day(date)?;
        self.meals_between(day, day, None)
    }

    /// Removes every scheduled meal; returns how many were removed.
    pub fn clear_schedule(&self) -> Result<usize, ScheduleError> {
        let removed = self.schedule.clear()?;
        info!("event=schedule_clear module=schedule status=ok removed={removed}");
        Ok(removed)
    }
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
