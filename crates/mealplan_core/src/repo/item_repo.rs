//! Item catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `items` and `item_labels`.
//! - Enforce case-insensitive name uniqueness at write time.
//!
//! # Invariants
//! - Write paths call `Item::validate()` before SQL mutations.
//! - `items.name_key` always equals `name_key(items.name)`; uniqueness and
//!   name lookups go through it, not through SQLite's ASCII-only NOCASE.
//! - Listing is deterministic: `name_key ASC, id ASC`.

use crate::model::item::{Item, ItemCategory, ItemId, ItemValidationError};
use crate::model::normalize::name_key;
use crate::repo::{
    ensure_tables, is_unique_violation, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    category,
    default_unit,
    cost_per_unit
FROM items";

/// Query options for listing items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListQuery {
    pub category: Option<ItemCategory>,
    /// Exact (normalized) label match.
    pub label: Option<String>,
    /// Case-insensitive substring match on name, Unicode letters included.
    pub name_contains: Option<String>,
}

/// Repository interface for item catalog operations.
pub trait ItemRepository {
    fn create_item(&self, item: &Item) -> RepoResult<ItemId>;
    fn update_item(&self, item: &Item) -> RepoResult<()>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    fn find_item_by_name(&self, name: &str) -> RepoResult<Option<Item>>;
    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>>;
    /// Returns `false` when no row existed.
    fn delete_item(&self, id: ItemId) -> RepoResult<bool>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["items", "item_labels"])?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, item: &Item) -> RepoResult<ItemId> {
        let tx = self.conn.unchecked_transaction()?;
        insert_item(&tx, item)?;
        tx.commit()?;
        Ok(item.id)
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        item.validate()?;
        let key = item_key(item)?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx
            .execute(
                "UPDATE items
                 SET
                    name = ?2,
                    name_key = ?6,
                    category = ?3,
                    default_unit = ?4,
                    cost_per_unit = ?5,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    item.id.to_string(),
                    item.name.as_str(),
                    item.category.as_str(),
                    item.default_unit.as_str(),
                    item.cost_per_unit,
                    key,
                ],
            )
            .map_err(|err| map_name_conflict(err, &item.name))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "item",
                id: item.id,
            });
        }

        tx.execute(
            "DELETE FROM item_labels WHERE item_id = ?1;",
            [item.id.to_string()],
        )?;
        insert_labels(&tx, item)?;
        tx.commit()?;
        Ok(())
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn find_item_by_name(&self, name: &str) -> RepoResult<Option<Item>> {
        let Some(key) = name_key(name) else {
            return Ok(None);
        };
        let id_text: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM items WHERE name_key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        match id_text {
            Some(value) => self.get_item(parse_uuid(&value, "items.id")?),
            None => Ok(None),
        }
    }

    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>> {
        let mut sql = format!("{ITEM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }

        if let Some(label) = query.label.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM item_labels il
                    WHERE il.item_id = items.id
                      AND il.label = ?
                )",
            );
            bind_values.push(Value::Text(label.clone()));
        }

        if let Some(fragment) = query.name_contains.as_ref() {
            sql.push_str(" AND instr(name_key, ?) > 0");
            bind_values.push(Value::Text(fragment.to_lowercase()));
        }

        sql.push_str(" ORDER BY name_key ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(self.conn, row)?);
        }
        Ok(items)
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

/// Inserts one item and its labels on an open connection or transaction.
pub(crate) fn insert_item(conn: &Connection, item: &Item) -> RepoResult<()> {
    item.validate()?;
    let key = item_key(item)?;

    conn.execute(
        "INSERT INTO items (
            id,
            name,
            name_key,
            category,
            default_unit,
            cost_per_unit
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            item.id.to_string(),
            item.name.as_str(),
            key,
            item.category.as_str(),
            item.default_unit.as_str(),
            item.cost_per_unit,
        ],
    )
    .map_err(|err| map_name_conflict(err, &item.name))?;

    insert_labels(conn, item)
}

fn insert_labels(conn: &Connection, item: &Item) -> RepoResult<()> {
    for label in &item.labels {
        conn.execute(
            "INSERT OR IGNORE INTO item_labels (item_id, label) VALUES (?1, ?2);",
            params![item.id.to_string(), label.as_str()],
        )?;
    }
    Ok(())
}

fn item_key(item: &Item) -> RepoResult<String> {
    name_key(&item.name).ok_or_else(|| ItemValidationError::BlankName.into())
}

fn map_name_conflict(err: rusqlite::Error, name: &str) -> RepoError {
    if is_unique_violation(&err) {
        RepoError::DuplicateName(name.to_string())
    } else {
        err.into()
    }
}

fn parse_item_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Item> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "items.id")?;

    let category_text: String = row.get("category")?;
    let category = ItemCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in items.category"
        ))
    })?;

    let item = Item {
        id,
        name: row.get("name")?,
        category,
        default_unit: row.get("default_unit")?,
        cost_per_unit: row.get("cost_per_unit")?,
        labels: load_labels(conn, &id_text)?,
    };
    item.validate()?;
    Ok(item)
}

fn load_labels(conn: &Connection, item_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT label
         FROM item_labels
         WHERE item_id = ?1
         ORDER BY label ASC;",
    )?;
    let mut rows = stmt.query([item_id])?;
    let mut labels = Vec::new();
    while let Some(row) = rows.next()? {
        labels.push(row.get(0)?);
    }
    Ok(labels)
}
