//! Whole-database export and import.
//!
//! # Responsibility
//! - Export every entity as one plain `Snapshot` value.
//! - Validate a snapshot fully before it replaces stored data.
//! - Store names, units and labels in the same normalized form the services
//!   write.
//! - Convert snapshots to and from JSON.
//!
//! # Invariants
//! - A rejected import leaves stored data untouched.
//! - Only `SNAPSHOT_FORMAT_VERSION` is accepted.
//! - References the live database tolerates (recipe lines to deleted items,
//!   meals of deleted recipes) are accepted and counted, not rejected.

use crate::model::grocery::DateRange;
use crate::model::item::{ItemId, ItemValidationError};
use crate::model::normalize::{name_key, normalize_name, normalize_unit};
use crate::model::recipe::{is_positive, RecipeId, RecipeValidationError};
use crate::model::snapshot::{Snapshot, SNAPSHOT_FORMAT_VERSION};
use crate::repo::snapshot_repo::{read_snapshot, replace_all};
use crate::repo::RepoError;
use chrono::Utc;
use log::{info, warn};
use rusqlite::Connection;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from snapshot export and import.
#[derive(Debug)]
pub enum SnapshotError {
    UnsupportedVersion(u32),
    DuplicateId { entity: &'static str, id: Uuid },
    DuplicateItemName(String),
    DuplicateListRange(DateRange),
    InvalidItem(ItemValidationError),
    InvalidRecipe(RecipeValidationError),
    /// Record fails a field-level rule outside the model validators.
    InvalidRecord {
        entity: &'static str,
        id: Uuid,
        reason: String,
    },
    /// Pantry row points at an item missing from the snapshot.
    UnknownItem(ItemId),
    Json(serde_json::Error),
    Repo(RepoError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedVersion(version) => write!(
                f,
                "unsupported snapshot format version {version}; expected {SNAPSHOT_FORMAT_VERSION}"
            ),
            Self::DuplicateId { entity, id } => write!(f, "duplicate {entity} id {id}"),
            Self::DuplicateItemName(name) => write!(f, "duplicate item name `{name}`"),
            Self::DuplicateListRange(range) => write!(
                f,
                "more than one grocery list for {} to {}",
                range.start, range.end
            ),
            Self::InvalidItem(err) => write!(f, "{err}"),
            Self::InvalidRecipe(err) => write!(f, "{err}"),
            Self::InvalidRecord { entity, id, reason } => {
                write!(f, "invalid {entity} {id}: {reason}")
            }
            Self::UnknownItem(id) => write!(f, "pantry references unknown item {id}"),
            Self::Json(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidItem(err) => Some(err),
            Self::InvalidRecipe(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SnapshotError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Record counts of a completed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub items: usize,
    pub recipes: usize,
    pub scheduled_meals: usize,
    pub pantry: usize,
    pub grocery_lists: usize,
    /// Recipe lines, combo components and meals pointing at absent records.
    pub dangling_references: usize,
}

/// Reads every stored entity into a snapshot stamped with the current time.
pub fn export_snapshot(conn: &Connection) -> Result<Snapshot, SnapshotError> {
    let snapshot = read_snapshot(conn, Utc::now().timestamp_millis())?;
    info!(
        "event=snapshot_export module=snapshot status=ok records={}",
        snapshot.record_count()
    );
    Ok(snapshot)
}

/// Validates `snapshot` and replaces all stored data with it atomically.
pub fn import_snapshot(
    conn: &mut Connection,
    snapshot: &Snapshot,
) -> Result<ImportSummary, SnapshotError> {
    let (normalized, summary) = match prepare_snapshot(snapshot) {
        Ok(prepared) => prepared,
        Err(err) => {
            warn!("event=snapshot_import module=snapshot status=rejected reason={err}");
            return Err(err);
        }
    };

    replace_all(conn, &normalized)?;
    info!(
        "event=snapshot_import module=snapshot status=ok records={} dangling={}",
        snapshot.record_count(),
        summary.dangling_references
    );
    Ok(summary)
}

/// Checks every record and reference without touching storage.
///
/// Records are checked in normalized form, so `validate_snapshot` accepts
/// exactly what `import_snapshot` would store.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<ImportSummary, SnapshotError> {
    prepare_snapshot(snapshot).map(|(_, summary)| summary)
}

fn prepare_snapshot(snapshot: &Snapshot) -> Result<(Snapshot, ImportSummary), SnapshotError> {
    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(snapshot.format_version));
    }
    let mut normalized = snapshot.clone();
    normalize_records(&mut normalized)?;
    let summary = check_records(&normalized)?;
    Ok((normalized, summary))
}

fn normalize_records(snapshot: &mut Snapshot) -> Result<(), SnapshotError> {
    for item in &mut snapshot.items {
        item.normalize().map_err(SnapshotError::InvalidItem)?;
    }
    for recipe in &mut snapshot.recipes {
        recipe.normalize().map_err(SnapshotError::InvalidRecipe)?;
    }
    for row in &mut snapshot.pantry {
        row.unit = normalize_unit(&row.unit).ok_or_else(|| SnapshotError::InvalidRecord {
            entity: "pantry item",
            id: row.item_id,
            reason: "blank unit".to_string(),
        })?;
    }
    for list in &mut snapshot.grocery_lists {
        for line in &mut list.items {
            line.unit = normalize_unit(&line.unit).ok_or_else(|| SnapshotError::InvalidRecord {
                entity: "grocery list",
                id: list.id,
                reason: format!("blank unit for item {}", line.item_id),
            })?;
            if let Some(name) = normalize_name(&line.item_name) {
                line.item_name = name;
            }
        }
    }
    Ok(())
}

fn check_records(snapshot: &Snapshot) -> Result<ImportSummary, SnapshotError> {
    let mut dangling = 0;

    let mut item_ids = HashSet::new();
    let mut item_names = HashSet::new();
    for item in &snapshot.items {
        if !item_ids.insert(item.id) {
            return Err(SnapshotError::DuplicateId {
                entity: "item",
                id: item.id,
            });
        }
        if !item_names.insert(name_key(&item.name)) {
            return Err(SnapshotError::DuplicateItemName(item.name.clone()));
        }
    }

    let mut recipe_ids: HashSet<RecipeId> = HashSet::new();
    for recipe in &snapshot.recipes {
        if !recipe_ids.insert(recipe.id) {
            return Err(SnapshotError::DuplicateId {
                entity: "recipe",
                id: recipe.id,
            });
        }
    }
    for recipe in &snapshot.recipes {
        dangling += recipe
            .ingredients
            .iter()
            .filter(|line| !item_ids.contains(&line.item_id))
            .count();
        dangling += recipe
            .components
            .iter()
            .filter(|component| !recipe_ids.contains(&component.recipe_id))
            .count();
    }

    let mut meal_ids = HashSet::new();
    for meal in &snapshot.scheduled_meals {
        if !meal_ids.insert(meal.id) {
            return Err(SnapshotError::DuplicateId {
                entity: "scheduled meal",
                id: meal.id,
            });
        }
        if !meal.has_valid_multiplier() {
            return Err(SnapshotError::InvalidRecord {
                entity: "scheduled meal",
                id: meal.id,
                reason: format!("portion multiplier {}", meal.portion_multiplier),
            });
        }
        if !recipe_ids.contains(&meal.recipe_id) {
            dangling += 1;
        }
    }

    let mut stocked = HashSet::new();
    for row in &snapshot.pantry {
        if !item_ids.contains(&row.item_id) {
            return Err(SnapshotError::UnknownItem(row.item_id));
        }
        if !stocked.insert(row.item_id) {
            return Err(SnapshotError::DuplicateId {
                entity: "pantry item",
                id: row.item_id,
            });
        }
        if !row.quantity.is_finite() || row.quantity < 0.0 {
            return Err(SnapshotError::InvalidRecord {
                entity: "pantry item",
                id: row.item_id,
                reason: format!("quantity {} in `{}`", row.quantity, row.unit),
            });
        }
    }

    let mut list_ids = HashSet::new();
    let mut ranges = HashSet::new();
    for list in &snapshot.grocery_lists {
        if !list_ids.insert(list.id) {
            return Err(SnapshotError::DuplicateId {
                entity: "grocery list",
                id: list.id,
            });
        }
        if !ranges.insert(list.date_range) {
            return Err(SnapshotError::DuplicateListRange(list.date_range));
        }
        if list.date_range.is_empty() {
            return Err(SnapshotError::InvalidRecord {
                entity: "grocery list",
                id: list.id,
                reason: "start date after end date".to_string(),
            });
        }
        let mut lines = HashSet::new();
        for line in &list.items {
            if !is_positive(line.quantity) {
                return Err(SnapshotError::InvalidRecord {
                    entity: "grocery list",
                    id: list.id,
                    reason: format!("line quantity {} for item {}", line.quantity, line.item_id),
                });
            }
            if !lines.insert((line.item_id, line.unit.as_str())) {
                return Err(SnapshotError::InvalidRecord {
                    entity: "grocery list",
                    id: list.id,
                    reason: format!("duplicate line for item {} in `{}`", line.item_id, line.unit),
                });
            }
        }
    }

    Ok(ImportSummary {
        items: snapshot.items.len(),
        recipes: snapshot.recipes.len(),
        scheduled_meals: snapshot.scheduled_meals.len(),
        pantry: snapshot.pantry.len(),
        grocery_lists: snapshot.grocery_lists.len(),
        dangling_references: dangling,
    })
}

/// Serializes a snapshot as pretty-printed JSON.
pub fn to_json(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Parses a snapshot from JSON. Does not validate references.
pub fn from_json(input: &str) -> Result<Snapshot, SnapshotError> {
    Ok(serde_json::from_str(input)?)
}
