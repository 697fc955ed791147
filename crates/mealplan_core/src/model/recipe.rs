//! Recipe domain model.
//!
//! # Responsibility
//! - Define recipes, their ingredient lines and combo components.
//! - Validate recipe shape according to its stored kind.
//!
//! # Invariants
//! - `kind` is decided once at creation and never re-inferred from fields.
//! - `Basic` recipes own ingredient lines and no components.
//! - `Combo` recipes own at least one component and no ingredient lines.
//! - Quantities and multipliers are finite and strictly positive.

use crate::model::item::ItemId;
use crate::model::normalize::{normalize_labels, normalize_name, normalize_unit};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for recipes.
pub type RecipeId = Uuid;

/// Meal slot of a day. Declaration order is the in-day display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [Self::Breakfast, Self::Lunch, Self::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            _ => None,
        }
    }
}

impl Display for MealType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored recipe shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeKind {
    /// Recipe with its own ingredient lines.
    Basic,
    /// Recipe assembled from other recipes.
    Combo,
}

impl RecipeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Combo => "combo",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "basic" => Some(Self::Basic),
            "combo" => Some(Self::Combo),
            _ => None,
        }
    }
}

impl Display for RecipeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingredient line of a basic recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub item_id: ItemId,
    pub quantity: f64,
    pub unit: String,
}

/// One sub-recipe reference of a combo recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboComponent {
    pub recipe_id: RecipeId,
    pub servings_multiplier: f64,
}

/// Canonical recipe record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub servings: u32,
    pub meal_type: MealType,
    /// Minutes.
    pub prep_time: u32,
    /// Minutes.
    pub cook_time: u32,
    /// Relative preference used by planning UIs; `1.0` is neutral.
    pub preference_weight: f64,
    pub kind: RecipeKind,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub components: Vec<ComboComponent>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Validation errors for recipe write paths.
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeValidationError {
    BlankTitle,
    ZeroServings,
    InvalidPreferenceWeight(f64),
    /// Ingredient quantity is zero, negative or not finite.
    NegativeQuantity { position: usize, value: f64 },
    BlankUnit { position: usize },
    /// Component multiplier is zero, negative or not finite.
    InvalidMultiplier { position: usize, value: f64 },
    BasicWithComponents,
    ComboWithIngredients,
    ComboWithoutComponents,
    SelfReference,
}

impl Display for RecipeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "recipe title must not be blank"),
            Self::ZeroServings => write!(f, "recipe servings must be greater than zero"),
            Self::InvalidPreferenceWeight(value) => {
                write!(f, "preference weight must be a finite value >= 0, got {value}")
            }
            Self::NegativeQuantity { position, value } => write!(
                f,
                "ingredient #{position} quantity must be greater than zero, got {value}"
            ),
            Self::BlankUnit { position } => {
                write!(f, "ingredient #{position} unit must not be blank")
            }
            Self::InvalidMultiplier { position, value } => write!(
                f,
                "component #{position} servings multiplier must be greater than zero, got {value}"
            ),
            Self::BasicWithComponents => write!(f, "basic recipe must not have components"),
            Self::ComboWithIngredients => {
                write!(f, "combo recipe must not have its own ingredient lines")
            }
            Self::ComboWithoutComponents => {
                write!(f, "combo recipe requires at least one component")
            }
            Self::SelfReference => write!(f, "combo recipe must not reference itself"),
        }
    }
}

impl Error for RecipeValidationError {}

impl Recipe {
    /// Creates an empty basic recipe with neutral scheduling metadata.
    pub fn basic(title: &str, meal_type: MealType, servings: u32) -> Self {
        Self::empty(RecipeKind::Basic, title, meal_type, servings)
    }

    /// Creates an empty combo recipe; components are added afterwards.
    pub fn combo(title: &str, meal_type: MealType, servings: u32) -> Self {
        Self::empty(RecipeKind::Combo, title, meal_type, servings)
    }

    fn empty(kind: RecipeKind, title: &str, meal_type: MealType, servings: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            servings,
            meal_type,
            prep_time: 0,
            cook_time: 0,
            preference_weight: 1.0,
            kind,
            ingredients: Vec::new(),
            components: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Appends one ingredient line.
    pub fn with_ingredient(mut self, item_id: ItemId, quantity: f64, unit: &str) -> Self {
        self.ingredients.push(RecipeIngredient {
            item_id,
            quantity,
            unit: unit.to_string(),
        });
        self
    }

    /// Appends one combo component.
    pub fn with_component(mut self, recipe_id: RecipeId, servings_multiplier: f64) -> Self {
        self.components.push(ComboComponent {
            recipe_id,
            servings_multiplier,
        });
        self
    }

    /// Total active time in minutes.
    pub fn total_time(&self) -> u32 {
        self.prep_time.saturating_add(self.cook_time)
    }

    /// Normalizes title, units and labels in place, then validates.
    pub fn normalize(&mut self) -> Result<(), RecipeValidationError> {
        self.title = normalize_name(&self.title).ok_or(RecipeValidationError::BlankTitle)?;
        for (position, line) in self.ingredients.iter_mut().enumerate() {
            line.unit = normalize_unit(&line.unit)
                .ok_or(RecipeValidationError::BlankUnit { position })?;
        }
        self.labels = normalize_labels(&self.labels);
        self.validate()
    }

    /// Checks shape invariants for the stored kind.
    pub fn validate(&self) -> Result<(), RecipeValidationError> {
        if self.title.trim().is_empty() {
            return Err(RecipeValidationError::BlankTitle);
        }
        if self.servings == 0 {
            return Err(RecipeValidationError::ZeroServings);
        }
        if !self.preference_weight.is_finite() || self.preference_weight < 0.0 {
            return Err(RecipeValidationError::InvalidPreferenceWeight(
                self.preference_weight,
            ));
        }

        match self.kind {
            RecipeKind::Basic => {
                if !self.components.is_empty() {
                    return Err(RecipeValidationError::BasicWithComponents);
                }
            }
            RecipeKind::Combo => {
                if !self.ingredients.is_empty() {
                    return Err(RecipeValidationError::ComboWithIngredients);
                }
                if self.components.is_empty() {
                    return Err(RecipeValidationError::ComboWithoutComponents);
                }
            }
        }

        for (position, line) in self.ingredients.iter().enumerate() {
            if !is_positive(line.quantity) {
                return Err(RecipeValidationError::NegativeQuantity {
                    position,
                    value: line.quantity,
                });
            }
            if line.unit.trim().is_empty() {
                return Err(RecipeValidationError::BlankUnit { position });
            }
        }

        for (position, component) in self.components.iter().enumerate() {
            if component.recipe_id == self.id {
                return Err(RecipeValidationError::SelfReference);
            }
            if !is_positive(component.servings_multiplier) {
                return Err(RecipeValidationError::InvalidMultiplier {
                    position,
                    value: component.servings_multiplier,
                });
            }
        }

        Ok(())
    }
}

/// Returns whether `value` is finite and strictly positive.
pub fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
