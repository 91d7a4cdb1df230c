//! # mp2grg-io: MATPOWER / GRG translation
//!
//! Reads and writes both power network formats and translates between them.
//!
//! ## Quick Start: Translate a MATPOWER Case
//!
//! ```rust,no_run
//! use mp2grg_core::Diagnostics;
//! use mp2grg_io::{encode_case, parse_matpower_file, write_grg_string, EncodeOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut diag = Diagnostics::new();
//!     let case = parse_matpower_file("case14.m", &mut diag)?;
//!     let doc = encode_case(&case, &EncodeOptions::default(), &mut diag)?;
//!     println!("{}", write_grg_string(&doc)?);
//!     eprintln!("{}", diag.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! ### Formats
//! - [`matpower`] - MATPOWER `.m` parser and writer
//! - [`grg_json`] - GRG JSON reader and writer (sorted keys)
//!
//! ### Translation
//! - [`encode`] - flat case to hierarchical document: identifiers, breakers,
//!   substations, mappings, market and operation constraints
//! - [`decode`] - hierarchical document to flat case: mapping layers,
//!   voltage-point collapsing, bus merging, rating and cost reconstruction
//! - [`cost`] - `gencost` rows to market cost functions and back
//!
//! ### Checks
//! - [`validate`] - reference checks over a hierarchical document
//! - [`diff`] - field-by-field comparison of two flat cases
//!
//! ## Error Handling
//!
//! Every entry point returns [`mp2grg_core::TranslateResult`]. Recoverable
//! data problems do not fail a call; they are collected as warnings in the
//! [`mp2grg_core::Diagnostics`] passed in by the caller.

pub mod cost;
pub mod decode;
pub mod diff;
pub mod encode;
pub mod grg_json;
pub mod matpower;
pub mod validate;

pub use decode::{decode_document, DecodeOptions};
pub use diff::{diff_cases, CaseDifference};
pub use encode::{encode_case, EncodeOptions};
pub use grg_json::{read_grg_file, read_grg_str, write_grg_file, write_grg_string};
pub use matpower::{
    parse_matpower_file, parse_matpower_string, write_matpower_case, write_matpower_file,
};
pub use validate::validate_document;
