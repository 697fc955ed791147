//! Whole-database snapshot reads and atomic replacement.
//!
//! # Invariants
//! - `replace_all` either swaps every table's content or changes nothing.
//! - Reads use the same row decoders as the per-aggregate repositories.

use crate::model::snapshot::{Snapshot, SNAPSHOT_FORMAT_VERSION};
use crate::repo::grocery_repo::{insert_list, GroceryRepository, SqliteGroceryRepository};
use crate::repo::item_repo::{insert_item, ItemListQuery, ItemRepository, SqliteItemRepository};
use crate::repo::pantry_repo::{upsert_stock, PantryRepository, SqlitePantryRepository};
use crate::repo::recipe_repo::{
    insert_recipe, RecipeListQuery, RecipeRepository, SqliteRecipeRepository,
};
use crate::repo::schedule_repo::{insert_meal, ScheduleRepository, SqliteScheduleRepository};
use crate::repo::RepoResult;
use rusqlite::{Connection, TransactionBehavior};

/// Reads every entity into a snapshot stamped with `exported_at`.
pub fn read_snapshot(conn: &Connection, exported_at: i64) -> RepoResult<Snapshot> {
    Ok(Snapshot {
        format_version: SNAPSHOT_FORMAT_VERSION,
        exported_at,
        items: SqliteItemRepository::try_new(conn)?.list_items(&ItemListQuery::default())?,
        recipes: SqliteRecipeRepository::try_new(conn)?
            .list_recipes(&RecipeListQuery::default())?,
        scheduled_meals: SqliteScheduleRepository::try_new(conn)?.list_all()?,
        pantry: SqlitePantryRepository::try_new(conn)?.list_stock()?,
        grocery_lists: SqliteGroceryRepository::try_new(conn)?.list_lists()?,
    })
}

/// Replaces all planner data with the snapshot content in one transaction.
///
/// Callers validate references beforehand; this function only enforces
/// row-level constraints.
pub fn replace_all(conn: &mut Connection, snapshot: &Snapshot) -> RepoResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute_batch(
        "DELETE FROM grocery_lists;
         DELETE FROM scheduled_meals;
         DELETE FROM pantry_items;
         DELETE FROM recipes;
         DELETE FROM items;",
    )?;

    for item in &snapshot.items {
        insert_item(&tx, item)?;
    }
    for recipe in &snapshot.recipes {
        insert_recipe(&tx, recipe)?;
    }
    for meal in &snapshot.scheduled_meals {
        insert_meal(&tx, meal)?;
    }
    for row in &snapshot.pantry {
        upsert_stock(&tx, row)?;
    }
    for list in &snapshot.grocery_lists {
        insert_list(&tx, list)?;
    }

    tx.commit()?;
    Ok(())
}
