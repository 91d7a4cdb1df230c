//! # mp2grg-core: power network case models
//!
//! Data structures shared by both translation directions:
//!
//! - [`case`] - the flat, array-indexed case (MATPOWER version 2 layout)
//! - [`grg`] - the hierarchical document: voltage points, voltage levels,
//!   substations, mapping layers, market and operation constraints
//! - [`topology`] - switch-aware queries over a hierarchical document
//!   (voltage-point collapsing, isolated/active points, voltage-level lookup)
//! - [`diagnostics`] - warnings collected during a translation call
//! - [`error`] - the fatal error taxonomy
//! - [`units`] - angle and per-unit conversions
//!
//! ## Example
//!
//! ```
//! use mp2grg_core::case::{Branch, Status};
//!
//! let branch = Branch {
//!     index: 0,
//!     f_bus: 1,
//!     t_bus: 2,
//!     br_r: 0.0,
//!     br_x: 0.05,
//!     br_b: 0.0,
//!     rate_a: 100.0,
//!     rate_b: 0.0,
//!     rate_c: 0.0,
//!     tap: 0.978,
//!     shift: 0.0,
//!     br_status: 1,
//!     angmin: -60.0,
//!     angmax: 60.0,
//! };
//! assert!(branch.is_transformer());
//! assert_eq!(branch.status(), Status::On);
//! assert_eq!(branch.rates(), 1);
//! ```
//!
//! The `mp2grg-io` crate builds on these models to parse and write both
//! formats and to translate between them.

pub mod case;
pub mod diagnostics;
pub mod error;
pub mod grg;
pub mod topology;
pub mod units;

pub use case::{
    Branch, Bus, BusName, BusType, Case, CostModelKind, DcLine, Generator, GeneratorCost, Status,
};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{TranslateError, TranslateResult};
pub use grg::{Component, GrgDocument};
pub use units::{BaseMva, Degrees, Radians};
