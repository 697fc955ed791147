//! Pantry stock use-case service.
//!
//! # Responsibility
//! - Restock and consume on-hand quantities.
//! - Report stock that expires soon.
//!
//! # Invariants
//! - Quantities are clamped at zero; over-consumption never fails.
//! - A row keeps its unit; deltas in another unit are rejected.
//! - Stock rows exist only for catalog items.

use crate::model::item::ItemId;
use crate::model::normalize::normalize_unit;
use crate::model::pantry::PantryItem;
use crate::repo::item_repo::ItemRepository;
use crate::repo::pantry_repo::PantryRepository;
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from pantry operations.
#[derive(Debug)]
pub enum PantryError {
    UnknownItem(ItemId),
    /// Stock exists in another unit; no conversion is attempted.
    IncompatibleUnit {
        item_id: ItemId,
        stocked_unit: String,
        requested_unit: String,
    },
    /// Quantity or delta is negative (where not allowed) or not finite.
    NegativeQuantity(f64),
    /// Unit is blank after normalization.
    BlankUnit,
    Repo(RepoError),
}

impl Display for PantryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownItem(id) => write!(f, "unknown item: {id}"),
            Self::IncompatibleUnit {
                item_id,
                stocked_unit,
                requested_unit,
            } => write!(
                f,
                "item {item_id} is stocked in `{stocked_unit}`, not `{requested_unit}`"
            ),
            Self::NegativeQuantity(value) => write!(f, "invalid pantry quantity: {value}"),
            Self::BlankUnit => write!(f, "pantry unit must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PantryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PantryError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Pantry service facade.
pub struct PantryService<P: PantryRepository, I: ItemRepository> {
    pantry: P,
    items: I,
}

impl<P: PantryRepository, I: ItemRepository> PantryService<P, I> {
    pub fn new(pantry: P, items: I) -> Self {
        Self { pantry, items }
    }

    /// Adds `delta` (negative consumes) to the stock of `item_id`.
    ///
    /// Creates the row when absent. The result is clamped at zero.
    pub fn adjust_quantity(
        &self,
        item_id: ItemId,
        delta: f64,
        unit: &str,
    ) -> Result<PantryItem, PantryError> {
        if !delta.is_finite() {
            return Err(PantryError::NegativeQuantity(delta));
        }
        let unit = normalize_unit(unit).ok_or(PantryError::BlankUnit)?;
        self.ensure_item(item_id)?;

        let mut row = match self.pantry.get_stock(item_id)? {
            Some(existing) => {
                if existing.unit != unit {
                    return Err(PantryError::IncompatibleUnit {
                        item_id,
                        stocked_unit: existing.unit,
                        requested_unit: unit,
                    });
                }
                existing
            }
            None => PantryItem {
                item_id,
                quantity: 0.0,
                unit,
                expiration_date: None,
            },
        };

        row.apply_delta(delta);
        self.pantry.upsert_stock(&row)?;
        debug!(
            "event=pantry_adjust module=pantry status=ok item_id={item_id} delta={delta} quantity={}",
            row.quantity
        );
        Ok(row)
    }

    /// Replaces the stock row of `item_id`.
    pub fn set_stock(
        &self,
        item_id: ItemId,
        quantity: f64,
        unit: &str,
        expiration_date: Option<NaiveDate>,
    ) -> Result<PantryItem, PantryError> {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(PantryError::NegativeQuantity(quantity));
        }
        let unit = normalize_unit(unit).ok_or(PantryError::BlankUnit)?;
        self.ensure_item(item_id)?;

        let row = PantryItem {
            item_id,
            quantity,
            unit,
            expiration_date,
        };
        self.pantry.upsert_stock(&row)?;
        Ok(row)
    }

    /// Removes the stock row. Returns `false` when none existed.
    pub fn remove(&self, item_id: ItemId) -> Result<bool, PantryError> {
        Ok(self.pantry.delete_stock(item_id)?)
    }

    pub fn get(&self, item_id: ItemId) -> Result<Option<PantryItem>, PantryError> {
        Ok(self.pantry.get_stock(item_id)?)
    }

    pub fn list(&self) -> Result<Vec<PantryItem>, PantryError> {
        Ok(self.pantry.list_stock()?)
    }

    /// Rows expiring within `[today, today + days]`, soonest first.
    pub fn expiring_soon(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<PantryItem>, PantryError> {
        let mut rows: Vec<PantryItem> = self
            .pantry
            .list_stock()?
            .into_iter()
            .filter(|row| row.expires_within(today, days))
            .collect();
        rows.sort_by_key(|row| (row.expiration_date, row.item_id));
        Ok(rows)
    }

    fn ensure_item(&self, item_id: ItemId) -> Result<(), PantryError> {
        match self.items.get_item(item_id)? {
            Some(_) => Ok(()),
            None => Err(PantryError::UnknownItem(item_id)),
        }
    }
}
