//! Recipe repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist recipes with their ordered ingredient lines, combo components
//!   and labels.
//!
//! # Invariants
//! - A recipe and all of its child rows are written in one transaction.
//! - A cascading delete removes the recipe and its scheduled meals in one
//!   transaction.
//! - Ingredient and component order is preserved through `position`.
//! - Listing is deterministic: `title COLLATE NOCASE ASC, id ASC`.

use crate::model::recipe::{
    ComboComponent, MealType, Recipe, RecipeId, RecipeIngredient, RecipeKind,
};
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const RECIPE_SELECT_SQL: &str = "SELECT
    id,
    title,
    servings,
    meal_type,
    prep_time,
    cook_time,
    preference_weight,
    kind
FROM recipes";

/// Query options for listing recipes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeListQuery {
    pub meal_type: Option<MealType>,
    pub kind: Option<RecipeKind>,
    /// Exact (normalized) label match.
    pub label: Option<String>,
}

/// Repository interface for recipe catalog operations.
pub trait RecipeRepository {
    fn create_recipe(&self, recipe: &Recipe) -> RepoResult<RecipeId>;
    /// Replaces the recipe row and all child rows.
    fn update_recipe(&self, recipe: &Recipe) -> RepoResult<()>;
    fn get_recipe(&self, id: RecipeId) -> RepoResult<Option<Recipe>>;
    fn list_recipes(&self, query: &RecipeListQuery) -> RepoResult<Vec<Recipe>>;
    fn recipe_exists(&self, id: RecipeId) -> RepoResult<bool>;
    /// Returns ids of combo recipes that list `id` as a component.
    fn combos_using(&self, id: RecipeId) -> RepoResult<Vec<RecipeId>>;
    /// Returns `false` when no row existed.
    fn delete_recipe(&self, id: RecipeId) -> RepoResult<bool>;
    /// Deletes the recipe and every scheduled meal that references it.
    ///
    /// Returns whether the recipe existed and how many meals were removed.
    /// On error nothing is removed.
    fn delete_recipe_with_meals(&self, id: RecipeId) -> RepoResult<(bool, usize)>;
}

/// SQLite-backed recipe repository.
pub struct SqliteRecipeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecipeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[
                "recipes",
                "recipe_ingredients",
                "recipe_components",
                "recipe_labels",
                "scheduled_meals",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl RecipeRepository for SqliteRecipeRepository<'_> {
    fn create_recipe(&self, recipe: &Recipe) -> RepoResult<RecipeId> {
        let tx = self.conn.unchecked_transaction()?;
        insert_recipe(&tx, recipe)?;
        tx.commit()?;
        Ok(recipe.id)
    }

    fn update_recipe(&self, recipe: &Recipe) -> RepoResult<()> {
        recipe.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE recipes
             SET
                title = ?2,
                servings = ?3,
                meal_type = ?4,
                prep_time = ?5,
                cook_time = ?6,
                preference_weight = ?7,
                kind = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                recipe.id.to_string(),
                recipe.title.as_str(),
                recipe.servings,
                recipe.meal_type.as_str(),
                recipe.prep_time,
                recipe.cook_time,
                recipe.preference_weight,
                recipe.kind.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "recipe",
                id: recipe.id,
            });
        }

        let id_text = recipe.id.to_string();
        for table_sql in [
            "DELETE FROM recipe_ingredients WHERE recipe_id = ?1;",
            "DELETE FROM recipe_components WHERE combo_id = ?1;",
            "DELETE FROM recipe_labels WHERE recipe_id = ?1;",
        ] {
            tx.execute(table_sql, [id_text.as_str()])?;
        }
        insert_children(&tx, recipe)?;
        tx.commit()?;
        Ok(())
    }

    fn get_recipe(&self, id: RecipeId) -> RepoResult<Option<Recipe>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECIPE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_recipe_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_recipes(&self, query: &RecipeListQuery) -> RepoResult<Vec<Recipe>> {
        let mut sql = format!("{RECIPE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(meal_type) = query.meal_type {
            sql.push_str(" AND meal_type = ?");
            bind_values.push(Value::Text(meal_type.as_str().to_string()));
        }

        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }

        if let Some(label) = query.label.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM recipe_labels rl
                    WHERE rl.recipe_id = recipes.id
                      AND rl.label = ?
                )",
            );
            bind_values.push(Value::Text(label.clone()));
        }

        sql.push_str(" ORDER BY title COLLATE NOCASE ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut recipes = Vec::new();
        while let Some(row) = rows.next()? {
            recipes.push(parse_recipe_row(self.conn, row)?);
        }
        Ok(recipes)
    }

    fn recipe_exists(&self, id: RecipeId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM recipes WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn combos_using(&self, id: RecipeId) -> RepoResult<Vec<RecipeId>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT combo_id
             FROM recipe_components
             WHERE recipe_id = ?1
             ORDER BY combo_id ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut combos = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            combos.push(parse_uuid(&value, "recipe_components.combo_id")?);
        }
        Ok(combos)
    }

    fn delete_recipe(&self, id: RecipeId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn delete_recipe_with_meals(&self, id: RecipeId) -> RepoResult<(bool, usize)> {
        let tx = self.conn.unchecked_transaction()?;
        let meals_removed = tx.execute(
            "DELETE FROM scheduled_meals WHERE recipe_id = ?1;",
            [id.to_string()],
        )?;
        let changed = tx.execute("DELETE FROM recipes WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok((changed > 0, meals_removed))
    }
}

/// Inserts one recipe with all child rows on an open connection or transaction.
pub(crate) fn insert_recipe(conn: &Connection, recipe: &Recipe) -> RepoResult<()> {
    recipe.validate()?;

    conn.execute(
        "INSERT INTO recipes (
            id,
            title,
            servings,
            meal_type,
            prep_time,
            cook_time,
            preference_weight,
            kind
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            recipe.id.to_string(),
            recipe.title.as_str(),
            recipe.servings,
            recipe.meal_type.as_str(),
            recipe.prep_time,
            recipe.cook_time,
            recipe.preference_weight,
            recipe.kind.as_str(),
        ],
    )?;

    insert_children(conn, recipe)
}

fn insert_children(conn: &Connection, recipe: &Recipe) -> RepoResult<()> {
    let id_text = recipe.id.to_string();

    for (position, line) in recipe.ingredients.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, position, item_id, quantity, unit)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id_text.as_str(),
                position as i64,
                line.item_id.to_string(),
                line.quantity,
                line.unit.as_str(),
            ],
        )?;
    }

    for (position, component) in recipe.components.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_components (combo_id, position, recipe_id, servings_multiplier)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id_text.as_str(),
                position as i64,
                component.recipe_id.to_string(),
                component.servings_multiplier,
            ],
        )?;
    }

    for label in &recipe.labels {
        conn.execute(
            "INSERT OR IGNORE INTO recipe_labels (recipe_id, label) VALUES (?1, ?2);",
            params![id_text.as_str(), label.as_str()],
        )?;
    }

    Ok(())
}

fn parse_recipe_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Recipe> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "recipes.id")?;

    let meal_type_text: String = row.get("meal_type")?;
    let meal_type = MealType::parse(&meal_type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid meal type `{meal_type_text}` in recipes.meal_type"
        ))
    })?;

    let kind_text: String = row.get("kind")?;
    let kind = RecipeKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid recipe kind `{kind_text}` in recipes.kind"))
    })?;

    let recipe = Recipe {
        id,
        title: row.get("title")?,
        servings: row.get("servings")?,
        meal_type,
        prep_time: row.get("prep_time")?,
        cook_time: row.get("cook_time")?,
        preference_weight: row.get("preference_weight")?,
        kind,
        ingredients: load_ingredients(conn, &id_text)?,
        components: load_components(conn, &id_text)?,
        labels: load_labels(conn, &id_text)?,
    };
    recipe.validate()?;
    Ok(recipe)
}

fn load_ingredients(conn: &Connection, recipe_id: &str) -> RepoResult<Vec<RecipeIngredient>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, quantity, unit
         FROM recipe_ingredients
         WHERE recipe_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([recipe_id])?;
    let mut lines = Vec::new();
    while let Some(row) = rows.next()? {
        let item_text: String = row.get("item_id")?;
        lines.push(RecipeIngredient {
            item_id: parse_uuid(&item_text, "recipe_ingredients.item_id")?,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
        });
    }
    Ok(lines)
}

fn load_components(conn: &Connection, combo_id: &str) -> RepoResult<Vec<ComboComponent>> {
    let mut stmt = conn.prepare(
        "SELECT recipe_id, servings_multiplier
         FROM recipe_components
         WHERE combo_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([combo_id])?;
    let mut components = Vec::new();
    while let Some(row) = rows.next()? {
        let recipe_text: String = row.get("recipe_id")?;
        components.push(ComboComponent {
            recipe_id: parse_uuid(&recipe_text, "recipe_components.recipe_id")?,
            servings_multiplier: row.get("servings_multiplier")?,
        });
    }
    Ok(components)
}

fn load_labels(conn: &Connection, recipe_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT label
         FROM recipe_labels
         WHERE recipe_id = ?1
         ORDER BY label ASC;",
    )?;
    let mut rows = stmt.query([recipe_id])?;
    let mut labels = Vec::new();
    while let Some(row) = rows.next()? {
        labels.push(row.get(0)?);
    }
    Ok(labels)
}
