//! Grocery list use-case service.
//!
//! # Responsibility
//! - Load schedule, catalog and pantry state for a date window.
//! - Run aggregation and persist the result as a list snapshot.
//! - Track purchased flags on generated lists.
//!
//! # Invariants
//! - One stored list per exact date range; regenerating reuses its id.
//! - Regeneration keeps `purchased` for every surviving `(item_id, unit)`.
//! - Stored lists never change when the catalog changes later.

use crate::calendar::{parse_day, CalendarError};
use crate::grocery::{aggregate, Aggregation, AggregationInputs, AggregationWarning, CoveredLine};
use crate::model::grocery::{DateRange, GroceryList, GroceryListId};
use crate::model::item::{Item, ItemId};
use crate::model::normalize::normalize_unit;
use crate::model::pantry::PantryItem;
use crate::model::recipe::{Recipe, RecipeId};
use crate::repo::grocery_repo::GroceryRepository;
use crate::repo::item_repo::{ItemListQuery, ItemRepository};
use crate::repo::pantry_repo::PantryRepository;
use crate::repo::recipe_repo::{RecipeListQuery, RecipeRepository};
use crate::repo::schedule_repo::ScheduleRepository;
use crate::repo::RepoError;
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from grocery list operations.
#[derive(Debug)]
pub enum GroceryError {
    InvalidDate(String),
    /// `start` lies after `end`.
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    ListNotFound(GroceryListId),
    LineNotFound {
        list_id: GroceryListId,
        item_id: ItemId,
        unit: String,
    },
    Repo(RepoError),
}

impl Display for GroceryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::InvalidDateRange { start, end } => {
                write!(f, "date range start {start} is after end {end}")
            }
            Self::ListNotFound(id) => write!(f, "grocery list not found: {id}"),
            Self::LineNotFound {
                list_id,
                item_id,
                unit,
            } => write!(f, "grocery list {list_id} has no line for {item_id} in `{unit}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GroceryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for GroceryError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CalendarError> for GroceryError {
    fn from(value: CalendarError) -> Self {
        match value {
            CalendarError::InvalidDate(input) => Self::InvalidDate(input),
            other => Self::InvalidDate(other.to_string()),
        }
    }
}

/// Result of a persisted generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GroceryReport {
    pub list: GroceryList,
    /// Pairs fully covered by pantry stock; not part of `list`.
    pub covered: Vec<CoveredLine>,
    pub warnings: Vec<AggregationWarning>,
    /// Priced total of `list`; `None` when a line has no estimate.
    pub estimated_total: Option<f64>,
}

/// Grocery service facade over every repository aggregation reads from.
pub struct GroceryService<S, R, I, P, G>
where
    S: ScheduleRepository,
    R: RecipeRepository,
    I: ItemRepository,
    P: PantryRepository,
    G: GroceryRepository,
{
    schedule: S,
    recipes: R,
    items: I,
    pantry: P,
    lists: G,
}

impl<S, R, I, P, G> GroceryService<S, R, I, P, G>
where
    S: ScheduleRepository,
    R: RecipeRepository,
    I: ItemRepository,
    P: PantryRepository,
    G: GroceryRepository,
{
    pub fn new(schedule: S, recipes: R, items: I, pantry: P, lists: G) -> Self {
        Self {
            schedule,
            recipes,
            items,
            pantry,
            lists,
        }
    }

    /// Aggregates `[start, end]` and stores the list.
    ///
    /// Regenerating the same range replaces the computed lines in place.
    pub fn generate_grocery_list(
        &self,
        start: &str,
        end: &str,
    ) -> Result<GroceryReport, GroceryError> {
        let range = parse_range(start, end)?;
        if range.is_empty() {
            return Err(GroceryError::InvalidDateRange {
                start: range.start,
                end: range.end,
            });
        }

        let aggregation = self.compute(range)?;
        let previous = self.lists.find_by_range(range)?;

        let mut items = aggregation.to_list_items();
        if let Some(previous) = previous.as_ref() {
            for line in &mut items {
                line.purchased = previous
                    .line(line.item_id, &line.unit)
                    .is_some_and(|old| old.purchased);
            }
        }

        let list = GroceryList {
            id: previous.as_ref().map_or_else(Uuid::new_v4, |list| list.id),
            date_range: range,
            generated_at: Utc::now().timestamp_millis(),
            items,
        };
        self.lists.save_list(&list)?;

        log_warnings(&aggregation.warnings);
        info!(
            "event=grocery_generate module=grocery status=ok lines={} covered={} warnings={} regenerated={}",
            list.items.len(),
            aggregation.covered.len(),
            aggregation.warnings.len(),
            previous.is_some()
        );

        Ok(GroceryReport {
            list,
            covered: aggregation.covered,
            warnings: aggregation.warnings,
            estimated_total: aggregation.estimated_total,
        })
    }

    /// Aggregates without storing anything. An inverted range is empty.
    pub fn preview(&self, start: &str, end: &str) -> Result<Aggregation, GroceryError> {
        let range = parse_range(start, end)?;
        if range.is_empty() {
            return Ok(Aggregation::default());
        }
        self.compute(range)
    }

    /// Marks one line as bought or not; returns the updated list.
    pub fn set_purchased(
        &self,
        list_id: GroceryListId,
        item_id: ItemId,
        unit: &str,
        purchased: bool,
    ) -> Result<GroceryList, GroceryError> {
        if self.lists.get_list(list_id)?.is_none() {
            return Err(GroceryError::ListNotFound(list_id));
        }

        let unit = normalize_unit(unit).unwrap_or_default();
        match self.lists.set_purchased(list_id, item_id, &unit, purchased) {
            Ok(()) => {}
            Err(RepoError::NotFound { .. }) => {
                return Err(GroceryError::LineNotFound {
                    list_id,
                    item_id,
                    unit,
                })
            }
            Err(err) => return Err(err.into()),
        }

        self.lists
            .get_list(list_id)?
            .ok_or(GroceryError::ListNotFound(list_id))
    }

    pub fn get_list(&self, id: GroceryListId) -> Result<Option<GroceryList>, GroceryError> {
        Ok(self.lists.get_list(id)?)
    }

    /// Stored lists, newest range first.
    pub fn list_lists(&self) -> Result<Vec<GroceryList>, GroceryError> {
        Ok(self.lists.list_lists()?)
    }

    /// Deletes a list. Returns `false` when it did not exist.
    pub fn delete_list(&self, id: GroceryListId) -> Result<bool, GroceryError> {
        Ok(self.lists.delete_list(id)?)
    }

    fn compute(&self, range: DateRange) -> Result<Aggregation, GroceryError> {
        let meals = self.schedule.list_in_range(range.start, range.end, None)?;

        let recipes: HashMap<RecipeId, Recipe> = self
            .recipes
            .list_recipes(&RecipeListQuery::default())?
            .into_iter()
            .map(|recipe| (recipe.id, recipe))
            .collect();
        let items: HashMap<ItemId, Item> = self
            .items
            .list_items(&ItemListQuery::default())?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();
        let pantry: HashMap<ItemId, PantryItem> = self
            .pantry
            .list_stock()?
            .into_iter()
            .map(|row| (row.item_id, row))
            .collect();

        Ok(aggregate(AggregationInputs {
            meals: &meals,
            recipes: &recipes,
            items: &items,
            pantry: &pantry,
        }))
    }
}

fn parse_range(start: &str, end: &str) -> Result<DateRange, GroceryError> {
    Ok(DateRange::new(parse_day(start)?, parse_day(end)?))
}

fn log_warnings(warnings: &[AggregationWarning]) {
    for warning in warnings {
        warn!(
            "event=grocery_warning module=grocery status=warn code={} detail={}",
            warning.code(),
            warning
        );
    }
}
