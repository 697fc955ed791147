//! Core domain logic for the meal planner.
//! This crate is the single source of truth for catalog, schedule, pantry and
//! grocery invariants.

pub mod calendar;
pub mod config;
pub mod db;
pub mod grocery;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use calendar::{is_today, local_today, month_grid, parse_day, CalendarError, MonthGrid};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use grocery::{aggregate, Aggregation, AggregationInputs, AggregationWarning};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::grocery::{DateRange, GroceryList, GroceryListId, GroceryListItem};
pub use model::item::{Item, ItemCategory, ItemId};
pub use model::pantry::PantryItem;
pub use model::recipe::{MealType, Recipe, RecipeId, RecipeKind};
pub use model::schedule::{ScheduledMeal, ScheduledMealId};
pub use model::snapshot::{Snapshot, SNAPSHOT_FORMAT_VERSION};
pub use repo::{RepoError, RepoResult};
pub use service::catalog_service::{CatalogError, CatalogService, RecipeDeletePolicy};
pub use service::grocery_service::{GroceryError, GroceryReport, GroceryService};
pub use service::pantry_service::{PantryError, PantryService};
pub use service::schedule_service::{ScheduleError, ScheduleMealRequest, ScheduleService};
pub use service::snapshot_service::{export_snapshot, import_snapshot, SnapshotError};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
