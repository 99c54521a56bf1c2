//! kf-core: stable foundation for kinflow.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - convert (unit-string conversion between compatible units)
//! - numeric (Real + tolerances + float helpers + physical constants)
//! - indices (sorted index-set utilities)
//! - error (shared error types)

pub mod convert;
pub mod error;
pub mod indices;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use convert::{Dimension, UnitError, convert, convertible};
pub use error::{KfError, KfResult};
pub use indices::{Indices, difference, intersect, is_disjoint, range, unify};
pub use numeric::*;
pub use units::*;
