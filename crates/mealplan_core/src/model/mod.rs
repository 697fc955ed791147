//! Domain model for catalog, schedule, pantry and grocery data.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own write-time validation rules for every persisted entity.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID assigned at creation.
//! - Units and labels are stored in normalized form only.
//! - Calendar days carry no time component.

pub mod grocery;
pub mod item;
pub mod normalize;
pub mod pantry;
pub mod recipe;
pub mod schedule;
pub mod snapshot;
