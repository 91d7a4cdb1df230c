//! MATPOWER version 2 text format
//!
//! [`parser`] reads `.m` case files into a [`Case`](mp2grg_core::Case),
//! [`writer`] renders a case back to text. [`convert`] holds the checked
//! float-to-integer conversions used for id and code columns.

pub mod convert;
pub mod parser;
pub mod writer;

pub use parser::{parse_matpower_file, parse_matpower_string, parse_matrix, Matrix, Row};
pub use writer::{write_matpower, write_matpower_case, write_matpower_file};
