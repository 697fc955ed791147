//! Grocery requirement aggregation.
//!
//! # Responsibility
//! - Turn scheduled meals into consolidated per-item shopping needs.
//! - Keep the math a pure function of its inputs so it can be exercised
//!   without storage.
//!
//! # Invariants
//! - Quantities are grouped by `(item_id, normalized unit)`; units are never
//!   converted into each other.
//! - Missing references degrade to warnings, never to hard failures.

pub mod aggregate;

pub use aggregate::{
    aggregate, AggregatedLine, Aggregation, AggregationInputs, AggregationWarning, CoveredLine,
    QUANTITY_EPSILON,
};
