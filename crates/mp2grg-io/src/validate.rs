//! Structural validation of GRG documents.
//!
//! [`validate_document`] checks the references a document makes between its
//! parts: component ids, voltage points, substations, groups, mapping keys,
//! operation constraints and cost inputs. Every problem is reported as an
//! error in the `validation` category; an empty collector means the
//! document is consistent.

use std::collections::{BTreeMap, BTreeSet};

use mp2grg_core::grg::{Component, GrgDocument};
use mp2grg_core::topology::all_components;
use mp2grg_core::Diagnostics;
use serde_json::Value;

const CATEGORY: &str = "validation";

/// Check a document and report every inconsistency found.
pub fn validate_document(doc: &GrgDocument) -> Diagnostics {
    let mut diag = Diagnostics::new();

    if !doc.network.per_unit {
        diag.add_error(CATEGORY, "network data must be given in per unit");
    }

    let ids = check_component_ids(&doc.network.components, &mut diag);
    let owner = check_voltage_points(doc, &mut diag);

    for component in all_components(doc) {
        for link in component.links() {
            if !owner.contains_key(link) {
                diag.add_error_with_entity(
                    CATEGORY,
                    &format!("link '{}' is not a voltage point of any voltage level", link),
                    component.id(),
                );
            }
        }
        match component {
            Component::Switch(switch) if switch.link_1 == switch.link_2 => {
                diag.add_error_with_entity(
                    CATEGORY,
                    "switch endpoints must be two different voltage points",
                    &switch.id,
                );
            }
            Component::Substation(substation) => {
                check_substation(substation, &owner, &mut diag);
            }
            _ => {}
        }
    }

    for (name, group) in &doc.groups {
        for member in &group.component_ids {
            if !ids.contains(member.as_str()) {
                diag.add_error_with_entity(
                    CATEGORY,
                    &format!("group member '{}' is not a component", member),
                    name,
                );
            }
        }
    }

    for (layer, mapping) in &doc.mappings {
        for key in mapping.keys() {
            check_path(key, &ids, &format!("mapping {}", layer), &mut diag);
        }
    }

    if let Some(constraints) = &doc.operation_constraints {
        for (key, range) in constraints {
            check_path(key, &ids, "operation constraint", &mut diag);
            if range.lb() > range.ub() {
                diag.add_error_with_entity(
                    CATEGORY,
                    &format!("range lower bound {} exceeds upper bound {}", range.lb(), range.ub()),
                    key,
                );
            }
        }
    }

    if let Some(market) = &doc.market {
        for (key, function) in &market.operational_costs {
            check_path(function.input(), &ids, &format!("cost {}", key), &mut diag);
        }
    }

    match serde_json::to_value(&doc.network.components) {
        Ok(value) => check_ranges(&value, "network/components", &mut diag),
        Err(err) => diag.add_error(CATEGORY, &format!("components not serializable: {}", err)),
    }

    diag
}

/// Ids must match their map keys and be unique across the whole document.
fn check_component_ids<'a>(
    components: &'a BTreeMap<String, Component>,
    diag: &mut Diagnostics,
) -> BTreeSet<&'a str> {
    fn walk<'a>(
        components: &'a BTreeMap<String, Component>,
        seen: &mut BTreeSet<&'a str>,
        diag: &mut Diagnostics,
    ) {
        for (key, component) in components {
            if key != component.id() {
                diag.add_error_with_entity(
                    CATEGORY,
                    &format!("component stored under key '{}'", key),
                    component.id(),
                );
            }
            if !seen.insert(component.id()) {
                diag.add_error_with_entity(CATEGORY, "duplicate component id", component.id());
            }
            if let Some(children) = component.children() {
                walk(children, seen, diag);
            }
        }
    }

    let mut seen = BTreeSet::new();
    walk(components, &mut seen, diag);
    seen
}

/// Each voltage point belongs to exactly one voltage level.
fn check_voltage_points<'a>(
    doc: &'a GrgDocument,
    diag: &mut Diagnostics,
) -> BTreeMap<&'a str, &'a str> {
    let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
    for component in all_components(doc) {
        if let Component::VoltageLevel(vl) = component {
            for vp in &vl.voltage_points {
                if let Some(previous) = owner.insert(vp.as_str(), vl.id.as_str()) {
                    diag.add_error_with_entity(
                        CATEGORY,
                        &format!("voltage point also declared by {}", previous),
                        vp,
                    );
                }
            }
        }
    }
    owner
}

/// Transformers inside a substation connect voltage levels of that substation.
fn check_substation(
    substation: &mp2grg_core::grg::Substation,
    owner: &BTreeMap<&str, &str>,
    diag: &mut Diagnostics,
) {
    let levels: BTreeSet<&str> = substation
        .substation_components
        .values()
        .filter(|c| matches!(c, Component::VoltageLevel(_)))
        .map(Component::id)
        .collect();

    for component in substation.substation_components.values() {
        let Component::TwoWindingTransformer(transformer) = component else {
            continue;
        };
        // the breaker side of each link is declared on the bus voltage level
        for link in [&transformer.link_1, &transformer.link_2] {
            if let Some(vl) = owner.get(link.as_str()) {
                if !levels.contains(vl) {
                    diag.add_error_with_entity(
                        CATEGORY,
                        &format!(
                            "transformer endpoint {} lies outside substation {}",
                            link, substation.id
                        ),
                        &transformer.id,
                    );
                }
            }
        }
    }
}

/// `<component id>/<field>...` must start with a known component.
fn check_path(path: &str, ids: &BTreeSet<&str>, context: &str, diag: &mut Diagnostics) {
    let component = path.split('/').next().unwrap_or_default();
    if !ids.contains(component) {
        diag.add_error_with_entity(
            CATEGORY,
            &format!("{} refers to unknown component '{}'", context, component),
            path,
        );
    }
}

/// Every `{"var": {"lb": .., "ub": ..}}` range must have `lb <= ub`.
fn check_ranges(value: &Value, path: &str, diag: &mut Diagnostics) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(var)) = map.get("var") {
                if let (Some(lb), Some(ub)) = (
                    var.get("lb").and_then(bound_value),
                    var.get("ub").and_then(bound_value),
                ) {
                    if lb > ub {
                        diag.add_error_with_entity(
                            CATEGORY,
                            &format!("range lower bound {} exceeds upper bound {}", lb, ub),
                            path,
                        );
                    }
                }
            }
            for (key, child) in map {
                check_ranges(child, &format!("{}/{}", path, key), diag);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                check_ranges(child, &format!("{}/{}", path, i), diag);
            }
        }
        _ => {}
    }
}

fn bound_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s == "Inf" => Some(f64::INFINITY),
        Value::String(s) if s == "-Inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}
