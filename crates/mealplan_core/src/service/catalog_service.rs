//! Item and recipe catalog use-case service.
//!
//! # Responsibility
//! - Normalize catalog input before it reaches the repositories.
//! - Check cross-entity references that SQLite does not enforce.
//! - Apply the recipe delete policy to the meal schedule.
//!
//! # Invariants
//! - Basic recipes reference existing items only.
//! - Combo components reference existing recipes only.
//! - A recipe keeps the kind it was created with.

use crate::model::item::{Item, ItemId, ItemValidationError};
use crate::model::normalize::normalize_label;
use crate::model::recipe::{Recipe, RecipeId, RecipeKind, RecipeValidationError};
use crate::repo::item_repo::{ItemListQuery, ItemRepository};
use crate::repo::recipe_repo::{RecipeListQuery, RecipeRepository};
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// What happens to scheduled meals when their recipe is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecipeDeletePolicy {
    /// Leave meals in place; aggregation reports them as unknown recipes.
    #[default]
    KeepSchedule,
    /// Remove every meal that references the recipe.
    CascadeSchedule,
}

/// Outcome of a recipe delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeDeleteOutcome {
    /// `false` when the recipe did not exist.
    pub deleted: bool,
    pub meals_removed: usize,
}

/// Errors from catalog operations.
#[derive(Debug)]
pub enum CatalogError {
    InvalidItem(ItemValidationError),
    InvalidRecipe(RecipeValidationError),
    /// Another item already uses this name (case-insensitive).
    DuplicateItemName(String),
    ItemNotFound(ItemId),
    RecipeNotFound(RecipeId),
    /// Basic recipe line points at a missing item.
    UnknownItem { recipe_id: RecipeId, item_id: ItemId },
    /// Combo component points at a missing recipe.
    UnknownRecipe {
        recipe_id: RecipeId,
        component_id: RecipeId,
    },
    /// Update attempted to switch between basic and combo.
    RecipeKindChange {
        recipe_id: RecipeId,
        stored: RecipeKind,
        requested: RecipeKind,
    },
    Repo(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidItem(err) => write!(f, "{err}"),
            Self::InvalidRecipe(err) => write!(f, "{err}"),
            Self::DuplicateItemName(name) => write!(f, "item name already exists: `{name}`"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::RecipeNotFound(id) => write!(f, "recipe not found: {id}"),
            Self::UnknownItem { recipe_id, item_id } => {
                write!(f, "recipe {recipe_id} references unknown item {item_id}")
            }
            Self::UnknownRecipe {
                recipe_id,
                component_id,
            } => write!(
                f,
                "combo {recipe_id} references unknown recipe {component_id}"
            ),
            Self::RecipeKindChange {
                recipe_id,
                stored,
                requested,
            } => write!(
                f,
                "recipe {recipe_id} is `{stored}` and cannot become `{requested}`"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidItem(err) => Some(err),
            Self::InvalidRecipe(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ItemValidation(err) => Self::InvalidItem(err),
            RepoError::RecipeValidation(err) => Self::InvalidRecipe(err),
            RepoError::DuplicateName(name) => Self::DuplicateItemName(name),
            RepoError::NotFound {
                entity: "item",
                id,
            } => Self::ItemNotFound(id),
            RepoError::NotFound {
                entity: "recipe",
                id,
            } => Self::RecipeNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ItemValidationError> for CatalogError {
    fn from(value: ItemValidationError) -> Self {
        Self::InvalidItem(value)
    }
}

impl From<RecipeValidationError> for CatalogError {
    fn from(value: RecipeValidationError) -> Self {
        Self::InvalidRecipe(value)
    }
}

/// Catalog service facade over item and recipe repositories.
pub struct CatalogService<I: ItemRepository, R: RecipeRepository> {
    items: I,
    recipes: R,
}

impl<I: ItemRepository, R: RecipeRepository> CatalogService<I, R> {
    /// Creates a service from repository implementations.
    pub fn new(items: I, recipes: R) -> Self {
        Self { items, recipes }
    }

    /// Normalizes and stores a new item; returns the stored form.
    pub fn create_item(&self, mut item: Item) -> Result<Item, CatalogError> {
        item.normalize()?;
        let id = self.items.create_item(&item)?;
        self.items.get_item(id)?.ok_or(CatalogError::ItemNotFound(id))
    }

    /// Replaces name, category, unit, cost and labels of an existing item.
    pub fn update_item(&self, mut item: Item) -> Result<Item, CatalogError> {
        item.normalize()?;
        self.items.update_item(&item)?;
        self.items
            .get_item(item.id)?
            .ok_or(CatalogError::ItemNotFound(item.id))
    }

    pub fn get_item(&self, id: ItemId) -> Result<Option<Item>, CatalogError> {
        Ok(self.items.get_item(id)?)
    }

    pub fn find_item_by_name(&self, name: &str) -> Result<Option<Item>, CatalogError> {
        Ok(self.items.find_item_by_name(name)?)
    }

    /// Lists items; the label filter is normalized like stored labels.
    pub fn list_items(&self, query: &ItemListQuery) -> Result<Vec<Item>, CatalogError> {
        let mut query = query.clone();
        query.label = query.label.as_deref().and_then(normalize_label);
        query.name_contains = query
            .name_contains
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Ok(self.items.list_items(&query)?)
    }

    /// Deletes an item. Returns `false` when it did not exist.
    ///
    /// Recipe lines that reference the item are kept and surface as
    /// aggregation warnings; the pantry row is removed with the item.
    pub fn delete_item(&self, id: ItemId) -> Result<bool, CatalogError> {
        let deleted = self.items.delete_item(id)?;
        if deleted {
            info!("event=item_delete module=catalog status=ok item_id={id}");
        }
        Ok(deleted)
    }

    /// Normalizes, checks references and stores a new recipe.
    pub fn create_recipe(&self, mut recipe: Recipe) -> Result<Recipe, CatalogError> {
        recipe.normalize()?;
        self.ensure_references(&recipe)?;
        let id = self.recipes.create_recipe(&recipe)?;
        info!(
            "event=recipe_create module=catalog status=ok recipe_id={id} kind={}",
            recipe.kind
        );
        self.recipes
            .get_recipe(id)?
            .ok_or(CatalogError::RecipeNotFound(id))
    }

    /// Replaces an existing recipe. The stored kind cannot change.
    pub fn update_recipe(&self, mut recipe: Recipe) -> Result<Recipe, CatalogError> {
        let stored = self
            .recipes
            .get_recipe(recipe.id)?
            .ok_or(CatalogError::RecipeNotFound(recipe.id))?;
        if stored.kind != recipe.kind {
            return Err(CatalogError::RecipeKindChange {
                recipe_id: recipe.id,
                stored: stored.kind,
                requested: recipe.kind,
            });
        }

        recipe.normalize()?;
        self.ensure_references(&recipe)?;
        self.recipes.update_recipe(&recipe)?;
        self.recipes
            .get_recipe(recipe.id)?
            .ok_or(CatalogError::RecipeNotFound(recipe.id))
    }

    pub fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>, CatalogError> {
        Ok(self.recipes.get_recipe(id)?)
    }

    pub fn list_recipes(&self, query: &RecipeListQuery) -> Result<Vec<Recipe>, CatalogError> {
        let mut query = query.clone();
        query.label = query.label.as_deref().and_then(normalize_label);
        Ok(self.recipes.list_recipes(&query)?)
    }

    /// Deletes a recipe and applies `policy` to meals that reference it.
    pub fn delete_recipe(
        &self,
        id: RecipeId,
        policy: RecipeDeletePolicy,
    ) -> Result<RecipeDeleteOutcome, CatalogError> {
        let combos = self.recipes.combos_using(id)?;
        if !combos.is_empty() {
            warn!(
                "event=recipe_delete module=catalog status=warn recipe_id={id} combo_refs={}",
                combos.len()
            );
        }

        let (deleted, meals_removed) = match policy {
            RecipeDeletePolicy::KeepSchedule => (self.recipes.delete_recipe(id)?, 0),
            RecipeDeletePolicy::CascadeSchedule => self.recipes.delete_recipe_with_meals(id)?,
        };

        info!(
            "event=recipe_delete module=catalog status=ok recipe_id={id} deleted={deleted} meals_removed={meals_removed}"
        );
        Ok(RecipeDeleteOutcome {
            deleted,
            meals_removed,
        })
    }

    fn ensure_references(&self, recipe: &Recipe) -> Result<(), CatalogError> {
        for line in &recipe.ingredients {
            if self.items.get_item(line.item_id)?.is_none() {
                return Err(CatalogError::UnknownItem {
                    recipe_id: recipe.id,
                    item_id: line.item_id,
                });
            }
        }
        for component in &recipe.components {
            if !self.recipes.recipe_exists(component.recipe_id)? {
                return Err(CatalogError::UnknownRecipe {
                    recipe_id: recipe.id,
                    component_id: component.recipe_id,
                });
            }
        }
        Ok(())
    }
}
