//! Scheduled meal repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist `(date, meal_type) -> recipe` assignments.
//! - Serve inclusive date-range queries in a stable order.
//!
//! # Invariants
//! - Days are stored as zero-padded `YYYY-MM-DD` text so lexical order is
//!   calendar order.
//! - Range results are ordered by date, then meal type
//!   (breakfast < lunch < dinner), then insertion sequence.

use crate::calendar::format_day;
use crate::model::recipe::MealType;
use crate::model::schedule::{ScheduledMeal, ScheduledMealId};
use crate::repo::{ensure_tables, parse_stored_day, parse_uuid, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const MEAL_SELECT_SQL: &str = "SELECT
    id,
    recipe_id,
    meal_date,
    meal_type,
    portion_multiplier,
    notes
FROM scheduled_meals";

const MEAL_ORDER_SQL: &str = " ORDER BY
    meal_date ASC,
    CASE meal_type
        WHEN 'breakfast' THEN 0
        WHEN 'lunch' THEN 1
        WHEN 'dinner' THEN 2
        ELSE 3
    END ASC,
    seq ASC";

/// Repository interface for meal schedule operations.
pub trait ScheduleRepository {
    fn insert_meal(&self, meal: &ScheduledMeal) -> RepoResult<ScheduledMealId>;
    /// Updates notes and portion multiplier of an existing meal.
    fn update_meal(&self, meal: &ScheduledMeal) -> RepoResult<()>;
    fn get_meal(&self, id: ScheduledMealId) -> RepoResult<Option<ScheduledMeal>>;
    /// Returns `false` when no row existed.
    fn delete_meal(&self, id: ScheduledMealId) -> RepoResult<bool>;
    /// Inclusive range query; `start > end` yields no rows.
    fn list_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        meal_type: Option<MealType>,
    ) -> RepoResult<Vec<ScheduledMeal>>;
    /// Every scheduled meal in stable order.
    fn list_all(&self) -> RepoResult<Vec<ScheduledMeal>>;
    fn count_in_slot(&self, date: NaiveDate, meal_type: MealType) -> RepoResult<u32>;
    fn clear(&self) -> RepoResult<usize>;
}

/// SQLite-backed schedule repository.
pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["scheduled_meals"])?;
        Ok(Self { conn })
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn insert_meal(&self, meal: &ScheduledMeal) -> RepoResult<ScheduledMealId> {
        insert_meal(self.conn, meal)?;
        Ok(meal.id)
    }

    fn update_meal(&self, meal: &ScheduledMeal) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE scheduled_meals
             SET
                portion_multiplier = ?2,
                notes = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                meal.id.to_string(),
                meal.portion_multiplier,
                meal.notes.as_deref(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "scheduled meal",
                id: meal.id,
            });
        }
        Ok(())
    }

    fn get_meal(&self, id: ScheduledMealId) -> RepoResult<Option<ScheduledMeal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEAL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_meal_row(row)?));
        }
        Ok(None)
    }

    fn delete_meal(&self, id: ScheduledMealId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM scheduled_meals WHERE id = ?1;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn list_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        meal_type: Option<MealType>,
    ) -> RepoResult<Vec<ScheduledMeal>> {
        if start > end {
            return Ok(Vec::new());
        }

        let mut sql = format!("{MEAL_SELECT_SQL} WHERE meal_date >= ? AND meal_date <= ?");
        let mut bind_values: Vec<Value> = vec![
            Value::Text(format_day(start)),
            Value::Text(format_day(end)),
        ];

        if let Some(meal_type) = meal_type {
            sql.push_str(" AND meal_type = ?");
            bind_values.push(Value::Text(meal_type.as_str().to_string()));
        }
        sql.push_str(MEAL_ORDER_SQL);

        self.query_meals(&sql, bind_values)
    }

    fn list_all(&self) -> RepoResult<Vec<ScheduledMeal>> {
        self.query_meals(&format!("{MEAL_SELECT_SQL}{MEAL_ORDER_SQL}"), Vec::new())
    }

    fn count_in_slot(&self, date: NaiveDate, meal_type: MealType) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM scheduled_meals
             WHERE meal_date = ?1 AND meal_type = ?2;",
            params![format_day(date), meal_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn clear(&self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM scheduled_meals;", [])?;
        Ok(removed)
    }
}

impl SqliteScheduleRepository<'_> {
    fn query_meals(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<ScheduledMeal>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut meals = Vec::new();
        while let Some(row) = rows.next()? {
            meals.push(parse_meal_row(row)?);
        }
        Ok(meals)
    }
}

/// Inserts one scheduled meal on an open connection or transaction.
pub(crate) fn insert_meal(conn: &Connection, meal: &ScheduledMeal) -> RepoResult<()> {
    if !meal.has_valid_multiplier() {
        return Err(RepoError::InvalidData(format!(
            "portion multiplier must be greater than zero, got {}",
            meal.portion_multiplier
        )));
    }

    conn.execute(
        "INSERT INTO scheduled_meals (
            id,
            recipe_id,
            meal_date,
            meal_type,
            portion_multiplier,
            notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            meal.id.to_string(),
            meal.recipe_id.to_string(),
            format_day(meal.date),
            meal.meal_type.as_str(),
            meal.portion_multiplier,
            meal.notes.as_deref(),
        ],
    )?;
    Ok(())
}

fn parse_meal_row(row: &Row<'_>) -> RepoResult<ScheduledMeal> {
    let id_text: String = row.get("id")?;
    let recipe_text: String = row.get("recipe_id")?;
    let date_text: String = row.get("meal_date")?;
    let meal_type_text: String = row.get("meal_type")?;

    let meal_type = MealType::parse(&meal_type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid meal type `{meal_type_text}` in scheduled_meals.meal_type"
        ))
    })?;

    Ok(ScheduledMeal {
        id: parse_uuid(&id_text, "scheduled_meals.id")?,
        recipe_id: parse_uuid(&recipe_text, "scheduled_meals.recipe_id")?,
        date: parse_stored_day(&date_text, "scheduled_meals.meal_date")?,
        meal_type,
        portion_multiplier: row.get("portion_multiplier")?,
        notes: row.get("notes")?,
    })
}
