//! Grocery list repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist generated grocery list snapshots and their lines.
//! - Expose the `purchased` toggle, the only post-generation mutation.
//!
//! # Invariants
//! - At most one list per exact `(start, end)` range.
//! - Saving a list replaces all of its lines in one transaction.
//! - Line order is preserved through `position`.

use crate::calendar::format_day;
use crate::model::grocery::{DateRange, GroceryList, GroceryListId, GroceryListItem};
use crate::model::item::{ItemCategory, ItemId};
use crate::repo::{
    bool_to_int, ensure_tables, parse_bool, parse_stored_day, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const LIST_SELECT_SQL: &str = "SELECT
    id,
    start_date,
    end_date,
    generated_at
FROM grocery_lists";

/// Repository interface for grocery list snapshots.
pub trait GroceryRepository {
    fn find_by_range(&self, range: DateRange) -> RepoResult<Option<GroceryList>>;
    fn get_list(&self, id: GroceryListId) -> RepoResult<Option<GroceryList>>;
    /// All lists, newest range first.
    fn list_lists(&self) -> RepoResult<Vec<GroceryList>>;
    /// Inserts the list or replaces an existing list with the same id.
    fn save_list(&self, list: &GroceryList) -> RepoResult<()>;
    fn set_purchased(
        &self,
        list_id: GroceryListId,
        item_id: ItemId,
        unit: &str,
        purchased: bool,
    ) -> RepoResult<()>;
    /// Returns `false` when no row existed.
    fn delete_list(&self, id: GroceryListId) -> RepoResult<bool>;
}

/// SQLite-backed grocery list repository.
pub struct SqliteGroceryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroceryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["grocery_lists", "grocery_list_items"])?;
        Ok(Self { conn })
    }
}

impl GroceryRepository for SqliteGroceryRepository<'_> {
    fn find_by_range(&self, range: DateRange) -> RepoResult<Option<GroceryList>> {
        let id_text: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM grocery_lists WHERE start_date = ?1 AND end_date = ?2;",
                params![format_day(range.start), format_day(range.end)],
                |row| row.get(0),
            )
            .optional()?;
        match id_text {
            Some(value) => self.get_list(parse_uuid(&value, "grocery_lists.id")?),
            None => Ok(None),
        }
    }

    fn get_list(&self, id: GroceryListId) -> RepoResult<Option<GroceryList>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LIST_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_lists(&self) -> RepoResult<Vec<GroceryList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             ORDER BY start_date DESC, end_date DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(self.conn, row)?);
        }
        Ok(lists)
    }

    fn save_list(&self, list: &GroceryList) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM grocery_lists WHERE id = ?1;",
            [list.id.to_string()],
        )?;
        insert_list(&tx, list)?;
        tx.commit()?;
        Ok(())
    }

    fn set_purchased(
        &self,
        list_id: GroceryListId,
        item_id: ItemId,
        unit: &str,
        purchased: bool,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE grocery_list_items
             SET purchased = ?4
             WHERE list_id = ?1 AND item_id = ?2 AND unit = ?3;",
            params![
                list_id.to_string(),
                item_id.to_string(),
                unit,
                bool_to_int(purchased),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "grocery list line",
                id: item_id,
            });
        }
        Ok(())
    }

    fn delete_list(&self, id: GroceryListId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM grocery_lists WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

/// Inserts one list with its lines on an open connection or transaction.
pub(crate) fn insert_list(conn: &Connection, list: &GroceryList) -> RepoResult<()> {
    let id_text = list.id.to_string();
    conn.execute(
        "INSERT INTO grocery_lists (id, start_date, end_date, generated_at)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            id_text.as_str(),
            format_day(list.date_range.start),
            format_day(list.date_range.end),
            list.generated_at,
        ],
    )?;

    for (position, line) in list.items.iter().enumerate() {
        conn.execute(
            "INSERT INTO grocery_list_items (
                list_id,
                position,
                item_id,
                item_name,
                category,
                quantity,
                unit,
                purchased
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id_text.as_str(),
                position as i64,
                line.item_id.to_string(),
                line.item_name.as_str(),
                line.category.as_str(),
                line.quantity,
                line.unit.as_str(),
                bool_to_int(line.purchased),
            ],
        )?;
    }
    Ok(())
}

fn parse_list_row(conn: &Connection, row: &Row<'_>) -> RepoResult<GroceryList> {
    let id_text: String = row.get("id")?;
    let start_text: String = row.get("start_date")?;
    let end_text: String = row.get("end_date")?;

    Ok(GroceryList {
        id: parse_uuid(&id_text, "grocery_lists.id")?,
        date_range: DateRange::new(
            parse_stored_day(&start_text, "grocery_lists.start_date")?,
            parse_stored_day(&end_text, "grocery_lists.end_date")?,
        ),
        generated_at: row.get("generated_at")?,
        items: load_lines(conn, &id_text)?,
    })
}

fn load_lines(conn: &Connection, list_id: &str) -> RepoResult<Vec<GroceryListItem>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, item_name, category, quantity, unit, purchased
         FROM grocery_list_items
         WHERE list_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([list_id])?;
    let mut lines = Vec::new();
    while let Some(row) = rows.next()? {
        let item_text: String = row.get("item_id")?;
        let category_text: String = row.get("category")?;
        let category = ItemCategory::parse(&category_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid category `{category_text}` in grocery_list_items.category"
            ))
        })?;
        lines.push(GroceryListItem {
            item_id: parse_uuid(&item_text, "grocery_list_items.item_id")?,
            item_name: row.get("item_name")?,
            category,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            purchased: parse_bool(row.get("purchased")?, "grocery_list_items.purchased")?,
        });
    }
    Ok(lines)
}
