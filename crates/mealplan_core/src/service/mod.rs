//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep CLI and rendering layers decoupled from storage details.

pub mod catalog_service;
pub mod grocery_service;
pub mod pantry_service;
pub mod schedule_service;
pub mod snapshot_service;
