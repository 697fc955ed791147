//! Requirement summation and pantry netting.
//!
//! Steps:
//! 1. Resolve each meal's recipe; combos expand into their components,
//!    multiplied by each component's servings multiplier.
//! 2. Scale every ingredient line by the meal's portion multiplier.
//! 3. Sum per `(item_id, normalized unit)` in meal order.
//! 4. Net against pantry stock of the same item in a compatible unit,
//!    floored at zero.
//! 5. Split results into lines still to buy and lines fully covered.
//! 6. Price lines whose unit matches the item's default unit.

use crate::model::grocery::GroceryListItem;
use crate::model::item::{Item, ItemCategory, ItemId};
use crate::model::normalize::{normalize_unit, units_compatible};
use crate::model::pantry::PantryItem;
use crate::model::recipe::{Recipe, RecipeId, RecipeKind};
use crate::model::schedule::{ScheduledMeal, ScheduledMealId};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Net quantities at or below this value count as fully covered.
///
/// Absorbs float residue such as `0.1 + 0.2 - 0.3`.
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Read-only lookups the aggregator needs.
#[derive(Debug, Clone, Copy)]
pub struct AggregationInputs<'a> {
    /// Meals to aggregate, already filtered to the target range.
    pub meals: &'a [ScheduledMeal],
    pub recipes: &'a HashMap<RecipeId, Recipe>,
    pub items: &'a HashMap<ItemId, Item>,
    pub pantry: &'a HashMap<ItemId, PantryItem>,
}

/// Non-fatal problem found while aggregating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationWarning {
    /// A meal (or one of its combo components) points at a missing recipe.
    UnknownRecipe {
        meal_id: ScheduledMealId,
        recipe_id: RecipeId,
    },
    /// A recipe line points at a missing catalog item; the line was skipped.
    UnknownItem { recipe_id: RecipeId, item_id: ItemId },
    /// Pantry stock exists but in another unit; it was not netted.
    IncompatibleUnit {
        item_id: ItemId,
        required_unit: String,
        pantry_unit: String,
    },
    /// A combo expands into itself; the repeated branch was cut.
    ComboCycle { recipe_id: RecipeId },
    /// A meal's portion multiplier is zero, negative or not finite; the meal
    /// was skipped.
    InvalidMultiplier { meal_id: ScheduledMealId, value: f64 },
}

impl Display for AggregationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRecipe { meal_id, recipe_id } => {
                write!(f, "meal {meal_id} references unknown recipe {recipe_id}")
            }
            Self::UnknownItem { recipe_id, item_id } => {
                write!(f, "recipe {recipe_id} references unknown item {item_id}")
            }
            Self::IncompatibleUnit {
                item_id,
                required_unit,
                pantry_unit,
            } => write!(
                f,
                "item {item_id} is needed in `{required_unit}` but stocked in `{pantry_unit}`"
            ),
            Self::ComboCycle { recipe_id } => {
                write!(f, "combo recipe {recipe_id} expands into itself")
            }
            Self::InvalidMultiplier { meal_id, value } => {
                write!(f, "meal {meal_id} has unusable portion multiplier {value}")
            }
        }
    }
}

impl AggregationWarning {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownRecipe { .. } => "unknown_recipe",
            Self::UnknownItem { .. } => "unknown_item",
            Self::IncompatibleUnit { .. } => "incompatible_unit",
            Self::ComboCycle { .. } => "combo_cycle",
            Self::InvalidMultiplier { .. } => "invalid_multiplier",
        }
    }
}

/// One `(item, unit)` pair that still needs buying.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub category: ItemCategory,
    pub unit: String,
    /// Gross requirement before pantry netting.
    pub required: f64,
    /// Pantry stock subtracted from `required`.
    pub pantry_applied: f64,
    /// Net quantity to buy, always above `QUANTITY_EPSILON`.
    pub quantity: f64,
    /// `quantity * cost_per_unit`; `None` without a price or when `unit`
    /// differs from the item's default unit.
    pub estimated_cost: Option<f64>,
}

/// One `(item, unit)` pair fully covered by pantry stock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoveredLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub unit: String,
    pub required: f64,
    pub pantry_available: f64,
}

/// Aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    /// Sorted by category shopping rank, item name (case-insensitive), unit.
    pub lines: Vec<AggregatedLine>,
    /// Same ordering as `lines`.
    pub covered: Vec<CoveredLine>,
    /// Deduplicated, in discovery order.
    pub warnings: Vec<AggregationWarning>,
    /// Sum of line costs; `None` as soon as one line has no estimate.
    pub estimated_total: Option<f64>,
}

impl Default for Aggregation {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            covered: Vec::new(),
            warnings: Vec::new(),
            estimated_total: Some(0.0),
        }
    }
}

impl Aggregation {
    /// Converts the lines to fresh (unpurchased) grocery list lines.
    pub fn to_list_items(&self) -> Vec<GroceryListItem> {
        self.lines
            .iter()
            .map(|line| GroceryListItem {
                item_id: line.item_id,
                item_name: line.item_name.clone(),
                category: line.category,
                quantity: line.quantity,
                unit: line.unit.clone(),
                purchased: false,
            })
            .collect()
    }
}

/// Aggregates ingredient requirements for `inputs.meals`.
pub fn aggregate(inputs: AggregationInputs<'_>) -> Aggregation {
    let mut collector = Collector {
        inputs,
        totals: Vec::new(),
        index: HashMap::new(),
        warnings: Vec::new(),
    };

    for meal in inputs.meals {
        if !meal.has_valid_multiplier() {
            collector.warn(AggregationWarning::InvalidMultiplier {
                meal_id: meal.id,
                value: meal.portion_multiplier,
            });
            continue;
        }
        match inputs.recipes.get(&meal.recipe_id) {
            Some(recipe) => {
                let mut stack = Vec::new();
                collector.expand(meal.id, recipe, meal.portion_multiplier, &mut stack);
            }
            None => collector.warn(AggregationWarning::UnknownRecipe {
                meal_id: meal.id,
                recipe_id: meal.recipe_id,
            }),
        }
    }

    collector.finish()
}

struct Collector<'a> {
    inputs: AggregationInputs<'a>,
    /// `(item_id, unit, quantity)` in first-seen order.
    totals: Vec<(ItemId, String, f64)>,
    index: HashMap<(ItemId, String), usize>,
    warnings: Vec<AggregationWarning>,
}

impl Collector<'_> {
    fn expand(
        &mut self,
        meal_id: ScheduledMealId,
        recipe: &Recipe,
        factor: f64,
        stack: &mut Vec<RecipeId>,
    ) {
        if stack.contains(&recipe.id) {
            self.warn(AggregationWarning::ComboCycle {
                recipe_id: recipe.id,
            });
            return;
        }
        stack.push(recipe.id);

        match recipe.kind {
            RecipeKind::Basic => {
                for line in &recipe.ingredients {
                    if !self.inputs.items.contains_key(&line.item_id) {
                        self.warn(AggregationWarning::UnknownItem {
                            recipe_id: recipe.id,
                            item_id: line.item_id,
                        });
                        continue;
                    }
                    let unit = normalize_unit(&line.unit).unwrap_or_else(|| line.unit.clone());
                    self.add(line.item_id, unit, line.quantity * factor);
                }
            }
            RecipeKind::Combo => {
                let recipes = self.inputs.recipes;
                for component in &recipe.components {
                    match recipes.get(&component.recipe_id) {
                        Some(child) => self.expand(
                            meal_id,
                            child,
                            factor * component.servings_multiplier,
                            stack,
                        ),
                        None => self.warn(AggregationWarning::UnknownRecipe {
                            meal_id,
                            recipe_id: component.recipe_id,
                        }),
                    }
                }
            }
        }

        stack.pop();
    }

    fn add(&mut self, item_id: ItemId, unit: String, quantity: f64) {
        let key = (item_id, unit);
        match self.index.get(&key) {
            Some(&position) => self.totals[position].2 += quantity,
            None => {
                self.index.insert(key.clone(), self.totals.len());
                self.totals.push((key.0, key.1, quantity));
            }
        }
    }

    fn warn(&mut self, warning: AggregationWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    fn finish(mut self) -> Aggregation {
        let mut lines = Vec::new();
        let mut covered = Vec::new();
        let totals = std::mem::take(&mut self.totals);
        let items = self.inputs.items;
        let pantry = self.inputs.pantry;

        for (item_id, unit, required) in totals {
            // Presence was checked while collecting.
            let Some(item) = items.get(&item_id) else {
                continue;
            };

            let available = match pantry.get(&item_id) {
                Some(stock) if units_compatible(&stock.unit, &unit) => stock.quantity.max(0.0),
                Some(stock) => {
                    self.warn(AggregationWarning::IncompatibleUnit {
                        item_id,
                        required_unit: unit.clone(),
                        pantry_unit: stock.unit.clone(),
                    });
                    0.0
                }
                None => 0.0,
            };

            let net = (required - available).max(0.0);
            if net > QUANTITY_EPSILON {
                let estimated_cost = estimate_cost(item, &unit, net);
                lines.push(AggregatedLine {
                    item_id,
                    item_name: item.name.clone(),
                    category: item.category,
                    unit,
                    required,
                    pantry_applied: required - net,
                    quantity: net,
                    estimated_cost,
                });
            } else {
                covered.push((
                    item.category,
                    CoveredLine {
                        item_id,
                        item_name: item.name.clone(),
                        unit,
                        required,
                        pantry_available: available,
                    },
                ));
            }
        }

        lines.sort_by(|left, right| {
            sort_key(left.category, &left.item_name, &left.unit, left.item_id).cmp(&sort_key(
                right.category,
                &right.item_name,
                &right.unit,
                right.item_id,
            ))
        });
        covered.sort_by(|(left_category, left), (right_category, right)| {
            sort_key(*left_category, &left.item_name, &left.unit, left.item_id).cmp(&sort_key(
                *right_category,
                &right.item_name,
                &right.unit,
                right.item_id,
            ))
        });

        let estimated_total: Option<f64> = lines.iter().map(|line| line.estimated_cost).sum();

        Aggregation {
            lines,
            covered: covered.into_iter().map(|(_, line)| line).collect(),
            warnings: self.warnings,
            estimated_total,
        }
    }
}

fn estimate_cost(item: &Item, unit: &str, quantity: f64) -> Option<f64> {
    if !units_compatible(&item.default_unit, unit) {
        return None;
    }
    item.cost_per_unit.map(|cost| cost * quantity)
}

fn sort_key<'a>(
    category: ItemCategory,
    name: &str,
    unit: &'a str,
    item_id: ItemId,
) -> (u8, String, &'a str, ItemId) {
    (category.shopping_rank(), name.to_lowercase(), unit, item_id)
}
