//! Catalog item domain model.
//!
//! # Responsibility
//! - Define the purchasable item record referenced by recipes and pantry rows.
//! - Validate item fields before they reach persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `name` is non-blank with collapsed whitespace; uniqueness (case-insensitive)
//!   is enforced at write time by the catalog.
//! - `default_unit` is stored normalized.

use crate::model::normalize::{normalize_labels, normalize_name, normalize_unit};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for catalog items.
pub type ItemId = Uuid;

/// Shopping category used to group grocery lines.
///
/// Grocery lines follow `shopping_rank`, not declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Produce,
    Dairy,
    Meat,
    Seafood,
    Pantry,
    Spices,
    Beverages,
    Frozen,
    Bakery,
    Grains,
    Other,
}

impl ItemCategory {
    /// Storage/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Produce => "produce",
            Self::Dairy => "dairy",
            Self::Meat => "meat",
            Self::Seafood => "seafood",
            Self::Pantry => "pantry",
            Self::Spices => "spices",
            Self::Beverages => "beverages",
            Self::Frozen => "frozen",
            Self::Bakery => "bakery",
            Self::Grains => "grains",
            Self::Other => "other",
        }
    }

    /// Parses the storage representation. Unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "produce" => Some(Self::Produce),
            "dairy" => Some(Self::Dairy),
            "meat" => Some(Self::Meat),
            "seafood" => Some(Self::Seafood),
            "pantry" => Some(Self::Pantry),
            "spices" => Some(Self::Spices),
            "beverages" => Some(Self::Beverages),
            "frozen" => Some(Self::Frozen),
            "bakery" => Some(Self::Bakery),
            "grains" => Some(Self::Grains),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Position in a store walk: produce, meat counter, dairy, then shelves.
    pub fn shopping_rank(self) -> u8 {
        match self {
            Self::Produce => 0,
            Self::Meat => 1,
            Self::Seafood => 2,
            Self::Dairy => 3,
            Self::Bakery => 4,
            Self::Grains => 5,
            Self::Pantry => 6,
            Self::Spices => 7,
            Self::Frozen => 8,
            Self::Beverages => 9,
            Self::Other => 10,
        }
    }
}

impl Display for ItemCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical catalog record for one purchasable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category: ItemCategory,
    pub default_unit: String,
    /// Price per `default_unit`, informational only.
    pub cost_per_unit: Option<f64>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Validation errors for item write paths.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemValidationError {
    BlankName,
    BlankUnit,
    InvalidCost(f64),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "item name must not be blank"),
            Self::BlankUnit => write!(f, "item default unit must not be blank"),
            Self::InvalidCost(value) => {
                write!(f, "item cost must be a finite value >= 0, got {value}")
            }
        }
    }
}

impl Error for ItemValidationError {}

impl Item {
    /// Creates a new item with a generated stable ID and normalized fields.
    pub fn new(
        name: &str,
        category: ItemCategory,
        default_unit: &str,
    ) -> Result<Self, ItemValidationError> {
        Self::with_id(Uuid::new_v4(), name, category, default_unit)
    }

    /// Creates an item with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: ItemId,
        name: &str,
        category: ItemCategory,
        default_unit: &str,
    ) -> Result<Self, ItemValidationError> {
        let mut item = Self {
            id,
            name: name.to_string(),
            category,
            default_unit: default_unit.to_string(),
            cost_per_unit: None,
            labels: Vec::new(),
        };
        item.normalize()?;
        Ok(item)
    }

    /// Normalizes name, unit and labels in place, then validates.
    pub fn normalize(&mut self) -> Result<(), ItemValidationError> {
        self.name = normalize_name(&self.name).ok_or(ItemValidationError::BlankName)?;
        self.default_unit =
            normalize_unit(&self.default_unit).ok_or(ItemValidationError::BlankUnit)?;
        self.labels = normalize_labels(&self.labels);
        self.validate()
    }

    /// Checks field-level invariants without mutating.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::BlankName);
        }
        if self.default_unit.trim().is_empty() {
            return Err(ItemValidationError::BlankUnit);
        }
        if let Some(cost) = self.cost_per_unit {
            if !cost.is_finite() || cost < 0.0 {
                return Err(ItemValidationError::InvalidCost(cost));
            }
        }
        Ok(())
    }
}
