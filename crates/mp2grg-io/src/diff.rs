//! Field-by-field comparison of two flat cases.
//!
//! Records are compared through their serialized form, so every field of
//! every table takes part without a hand-written comparison per record.
//! Numbers are equal within [`TOLERANCE`], relative to the larger magnitude
//! once it exceeds 1.

use std::fmt;

use mp2grg_core::Case;
use serde_json::Value;

pub const TOLERANCE: f64 = 1e-9;

/// One disagreement between two cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDifference {
    /// Location such as `bus[3].vm` or `gencost` for a count mismatch
    pub path: String,
    pub left: String,
    pub right: String,
}

impl fmt::Display for CaseDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} != {}", self.path, self.left, self.right)
    }
}

/// Every difference between `left` and `right`; empty when they agree.
pub fn diff_cases(left: &Case, right: &Case) -> Vec<CaseDifference> {
    let mut out = Vec::new();
    match (serde_json::to_value(left), serde_json::to_value(right)) {
        (Ok(l), Ok(r)) => diff_values("", &l, &r, &mut out),
        (l, r) => out.push(CaseDifference {
            path: String::new(),
            left: describe_serialization(l),
            right: describe_serialization(r),
        }),
    }
    out
}

fn describe_serialization(result: serde_json::Result<Value>) -> String {
    match result {
        Ok(_) => "serializable".to_string(),
        Err(err) => format!("not serializable: {}", err),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn diff_values(path: &str, left: &Value, right: &Value, out: &mut Vec<CaseDifference>) {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            for (key, lv) in l {
                let rv = r.get(key).unwrap_or(&Value::Null);
                diff_values(&join(path, key), lv, rv, out);
            }
            for (key, rv) in r {
                if !l.contains_key(key) {
                    diff_values(&join(path, key), &Value::Null, rv, out);
                }
            }
        }
        (Value::Array(l), Value::Array(r)) => {
            if l.len() != r.len() {
                out.push(CaseDifference {
                    path: path.to_string(),
                    left: format!("{} records", l.len()),
                    right: format!("{} records", r.len()),
                });
            }
            for (i, (lv, rv)) in l.iter().zip(r).enumerate() {
                diff_values(&format!("{}[{}]", path, i), lv, rv, out);
            }
        }
        (Value::Number(l), Value::Number(r)) => {
            if let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) {
                if !numbers_agree(a, b) {
                    out.push(CaseDifference {
                        path: path.to_string(),
                        left: l.to_string(),
                        right: r.to_string(),
                    });
                }
            }
        }
        (l, r) if l != r => out.push(CaseDifference {
            path: path.to_string(),
            left: l.to_string(),
            right: r.to_string(),
        }),
        _ => {}
    }
}

fn numbers_agree(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp2grg_core::case::{fixtures, BusType};

    fn case() -> Case {
        fixtures::case(
            vec![fixtures::bus(1, BusType::Reference), fixtures::bus(2, BusType::Pq)],
            vec![fixtures::generator(0, 1)],
            vec![fixtures::branch(0, 1, 2)],
        )
    }

    #[test]
    fn test_identical_cases_agree() {
        assert!(diff_cases(&case(), &case()).is_empty());
    }

    #[test]
    fn test_tolerance() {
        let mut other = case();
        other.bus[1].vm = 1.0 + 1e-12;
        other.gen[0].pmax = 40.0 * (1.0 + 1e-11);
        assert!(diff_cases(&case(), &other).is_empty());

        other.bus[1].vm = 1.001;
        let diffs = diff_cases(&case(), &other);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "bus[1].vm");
    }

    #[test]
    fn test_count_and_field_mismatches() {
        let mut other = case();
        other.name = "other".to_string();
        other.branch.push(fixtures::branch(1, 2, 1));
        other.bus[0].bus_type = BusType::Pv;

        let diffs = diff_cases(&case(), &other);
        let paths: Vec<&str> = diffs.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"name"));
        assert!(paths.contains(&"branch"));
        assert!(paths.contains(&"bus[0].bus_type"));
        assert_eq!(diffs.len(), 3);
        assert!(diffs.iter().any(|d| d.to_string() == "branch: 1 records != 2 records"));
    }

    #[test]
    fn test_optional_table_presence() {
        let mut other = case();
        other.gencost = Some(Vec::new());
        let diffs = diff_cases(&case(), &other);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "gencost");
    }
}
