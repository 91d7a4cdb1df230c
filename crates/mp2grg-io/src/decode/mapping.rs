//! Mapping layer selection and lookups.
//!
//! Layers are merged into one path-to-value table before decoding. A path
//! set by several layers keeps the value of the last one; when both values
//! are objects their fields are merged instead, again with the later layer
//! winning on each field.

use mp2grg_core::grg::{GrgDocument, Mapping, SwitchStatus};
use mp2grg_core::topology::StatusAssignment;
use mp2grg_core::Diagnostics;
use serde_json::Value;

/// Merge the selected layers, or every layer when `selection` is `None`.
pub fn merge_layers(
    doc: &GrgDocument,
    selection: Option<&[String]>,
    diag: &mut Diagnostics,
) -> Mapping {
    let names: Vec<&str> = match selection {
        Some(names) => names.iter().map(String::as_str).collect(),
        None => doc.mappings.keys().map(String::as_str).collect(),
    };

    let mut merged = Mapping::new();
    for name in names {
        let Some(layer) = doc.mappings.get(name) else {
            diag.add_warning("decode", &format!("mapping layer '{}' not found", name));
            continue;
        };
        for (key, value) in layer {
            match (merged.get_mut(key), value) {
                (Some(Value::Object(existing)), Value::Object(update)) => {
                    for (field, v) in update {
                        existing.insert(field.clone(), v.clone());
                    }
                }
                _ => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
    }
    merged
}

/// Switch states from `<switch>/status` entries.
pub fn status_assignment(mapping: &Mapping, diag: &mut Diagnostics) -> StatusAssignment {
    let mut status = StatusAssignment::new();
    for (key, value) in mapping {
        let Some(component) = key.strip_suffix("/status") else {
            continue;
        };
        if component.contains('/') {
            continue;
        }
        match serde_json::from_value::<SwitchStatus>(value.clone()) {
            Ok(state) => {
                status.insert(component.to_string(), state);
            }
            Err(_) => diag.add_warning_with_entity(
                "decode",
                &format!("ignoring status value {}", value),
                key,
            ),
        }
    }
    status
}

/// Numeric field of an object entry, e.g. `("gen_1/output", "active")`.
pub fn field(mapping: &Mapping, key: &str, name: &str) -> Option<f64> {
    mapping.get(key)?.get(name)?.as_f64()
}

/// Numeric entry, e.g. `"transformer_1/tap_changer/position"`.
pub fn scalar(mapping: &Mapping, key: &str) -> Option<f64> {
    mapping.get(key)?.as_f64()
}
