//! Pantry stock repository contracts and SQLite implementation.
//!
//! # Invariants
//! - At most one row per item (`item_id` is the primary key).
//! - Stored quantities are never negative.
//! - Pantry rows disappear with their catalog item (`ON DELETE CASCADE`).

use crate::calendar::format_day;
use crate::model::item::ItemId;
use crate::model::pantry::PantryItem;
use crate::repo::{ensure_tables, parse_stored_day, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const PANTRY_SELECT_SQL: &str = "SELECT
    item_id,
    quantity,
    unit,
    expiration_date
FROM pantry_items";

/// Repository interface for pantry stock.
pub trait PantryRepository {
    fn get_stock(&self, item_id: ItemId) -> RepoResult<Option<PantryItem>>;
    /// Inserts or replaces the row for `row.item_id`.
    fn upsert_stock(&self, row: &PantryItem) -> RepoResult<()>;
    /// Returns `false` when no row existed.
    fn delete_stock(&self, item_id: ItemId) -> RepoResult<bool>;
    fn list_stock(&self) -> RepoResult<Vec<PantryItem>>;
}

/// SQLite-backed pantry repository.
pub struct SqlitePantryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePantryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["pantry_items"])?;
        Ok(Self { conn })
    }
}

impl PantryRepository for SqlitePantryRepository<'_> {
    fn get_stock(&self, item_id: ItemId) -> RepoResult<Option<PantryItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PANTRY_SELECT_SQL} WHERE item_id = ?1;"))?;
        let mut rows = stmt.query([item_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_pantry_row(row)?));
        }
        Ok(None)
    }

    fn upsert_stock(&self, row: &PantryItem) -> RepoResult<()> {
        upsert_stock(self.conn, row)
    }

    fn delete_stock(&self, item_id: ItemId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM pantry_items WHERE item_id = ?1;",
            [item_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn list_stock(&self) -> RepoResult<Vec<PantryItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PANTRY_SELECT_SQL}
             ORDER BY item_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut stock = Vec::new();
        while let Some(row) = rows.next()? {
            stock.push(parse_pantry_row(row)?);
        }
        Ok(stock)
    }
}

/// Inserts or replaces one pantry row on an open connection or transaction.
pub(crate) fn upsert_stock(conn: &Connection, row: &PantryItem) -> RepoResult<()> {
    if !row.quantity.is_finite() || row.quantity < 0.0 {
        return Err(RepoError::InvalidData(format!(
            "pantry quantity must be a finite value >= 0, got {}",
            row.quantity
        )));
    }

    conn.execute(
        "INSERT INTO pantry_items (item_id, quantity, unit, expiration_date)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(item_id) DO UPDATE SET
            quantity = excluded.quantity,
            unit = excluded.unit,
            expiration_date = excluded.expiration_date,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            row.item_id.to_string(),
            row.quantity,
            row.unit.as_str(),
            row.expiration_date.map(format_day),
        ],
    )?;
    Ok(())
}

fn parse_pantry_row(row: &Row<'_>) -> RepoResult<PantryItem> {
    let item_text: String = row.get("item_id")?;
    let expiration_date = match row.get::<_, Option<String>>("expiration_date")? {
        Some(value) => Some(parse_stored_day(&value, "pantry_items.expiration_date")?),
        None => None,
    };

    Ok(PantryItem {
        item_id: parse_uuid(&item_text, "pantry_items.item_id")?,
        quantity: row.get("quantity")?,
        unit: row.get("unit")?,
        expiration_date,
    })
}
