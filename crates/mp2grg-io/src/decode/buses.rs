//! Bus table: merged bus components with their loads and shunts.

use std::collections::BTreeMap;

use mp2grg_core::case::{Bus, BusName, BusType};
use mp2grg_core::grg::{self, GroupKind, GrgDocument, Quantity};
use mp2grg_core::units::Radians;
use mp2grg_core::{Diagnostics, TranslateError, TranslateResult};

use super::mapping::field;
use super::DecodeContext;

const CATEGORY: &str = "decode";

/// Decode every bus, numbered and sorted by bus number.
///
/// Bus components whose voltage points collapse to one node are merged into
/// a single record, as are the loads and shunts attached to that node.
pub fn decode_buses(
    ctx: &DecodeContext<'_>,
    diag: &mut Diagnostics,
) -> TranslateResult<(Vec<Bus>, Vec<BusName>)> {
    let mut buses: BTreeMap<usize, Vec<&grg::Bus>> = BTreeMap::new();
    for bus in &ctx.cbt.bus {
        buses.entry(ctx.bus_number(&bus.link)?).or_default().push(bus);
    }
    let mut loads: BTreeMap<usize, Vec<&grg::Load>> = BTreeMap::new();
    for load in &ctx.cbt.load {
        loads.entry(ctx.bus_number(&load.link)?).or_default().push(load);
    }
    let mut shunts: BTreeMap<usize, Vec<&grg::Shunt>> = BTreeMap::new();
    for shunt in &ctx.cbt.shunt {
        shunts.entry(ctx.bus_number(&shunt.link)?).or_default().push(shunt);
    }

    let mut generating: Vec<usize> = Vec::new();
    let gen_links = ctx
        .cbt
        .generator
        .iter()
        .map(|g| g.link.as_str())
        .chain(ctx.cbt.synchronous_condenser.iter().map(|c| c.link.as_str()));
    for link in gen_links {
        if ctx.is_active(link) {
            generating.push(ctx.bus_number(link)?);
        }
    }

    let areas = group_codes(ctx.doc, GroupKind::Area, diag);
    let zones = group_codes(ctx.doc, GroupKind::Zone, diag);

    let mut records = Vec::with_capacity(buses.len());
    let mut names = Vec::with_capacity(buses.len());
    for (bus_i, members) in &buses {
        let bus_i = *bus_i;
        if members.len() > 1 {
            let ids: Vec<&str> = members.iter().map(|b| b.id.as_str()).collect();
            diag.add_warning_with_entity(
                "merge",
                &format!("merging buses {} into bus {}", ids.join(", "), bus_i),
                &bus_i.to_string(),
            );
        }

        let bus_type = bus_type(ctx, members, generating.contains(&bus_i), diag);

        let (pd, qd) = demand(ctx, bus_i, loads.get(&bus_i).map(Vec::as_slice).unwrap_or(&[]), diag);
        let (gs, bs) = admittance(bus_i, shunts.get(&bus_i).map(Vec::as_slice).unwrap_or(&[]), diag);

        let area = member_code(members, &areas, "area", diag);
        let zone = member_code(members, &zones, "zone", diag);
        let base_kv = base_kv(ctx, members, diag)?;

        let vmin = members
            .iter()
            .map(|b| b.voltage.magnitude.lb())
            .fold(f64::NEG_INFINITY, f64::max);
        let vmax = members
            .iter()
            .map(|b| b.voltage.magnitude.ub())
            .fold(f64::INFINITY, f64::min);

        let (vm, va) = voltage(ctx, members);

        records.push(Bus {
            bus_i,
            bus_type,
            pd: ctx.physical(pd),
            qd: ctx.physical(qd),
            gs: ctx.physical(gs),
            bs: ctx.physical(bs),
            area,
            vm,
            va: ctx.round(Radians(va).to_degrees().value()),
            base_kv,
            zone,
            vmax,
            vmin,
        });
        names.push(BusName {
            bus_i,
            name: members.iter().map(|b| b.id.as_str()).collect::<Vec<_>>().join("-"),
        });
    }

    Ok((records, names))
}

/// Type derived from the node: generating, isolated or reference.
///
/// A `matpower_bus_type` hint on a bus component overrides the derived
/// type.
fn bus_type(
    ctx: &DecodeContext<'_>,
    members: &[&grg::Bus],
    generating: bool,
    diag: &mut Diagnostics,
) -> BusType {
    let mut derived = BusType::Pq;
    if generating {
        derived = BusType::Pv;
    }
    if members.iter().any(|b| !ctx.is_active(&b.link)) {
        derived = BusType::Isolated;
    }
    if members.iter().any(|b| b.reference == Some(true)) {
        derived = BusType::Reference;
    }

    let mut bus_type = derived;
    for bus in members {
        let Some(code) = bus.matpower_bus_type else {
            continue;
        };
        match BusType::try_from(code) {
            Ok(hint) if hint != derived => {
                diag.add_warning_with_entity(
                    CATEGORY,
                    &format!(
                        "bus type {} differs from the derived type {}, keeping {}",
                        code,
                        derived.code(),
                        code
                    ),
                    &bus.id,
                );
                bus_type = hint;
            }
            Ok(_) => {}
            Err(err) => diag.add_warning_with_entity(CATEGORY, &err.to_string(), &bus.id),
        }
    }
    bus_type
}

/// Summed per-unit demand of the loads at a node.
fn demand(
    ctx: &DecodeContext<'_>,
    bus_i: usize,
    loads: &[&grg::Load],
    diag: &mut Diagnostics,
) -> (f64, f64) {
    if loads.len() > 1 {
        diag.add_warning_with_entity(
            "merge",
            &format!("merging {} loads into bus {}", loads.len(), bus_i),
            &bus_i.to_string(),
        );
    }

    let mut total = (0.0, 0.0);
    for load in loads {
        let key = format!("{}/demand", load.id);
        for (value, name, sum) in [
            (load.demand.active, "active", &mut total.0),
            (load.demand.reactive, "reactive", &mut total.1),
        ] {
            match value {
                Quantity::Fixed(v) => *sum += v,
                Quantity::Variable(_) => match field(&ctx.mapping, &key, name) {
                    Some(v) => *sum += v,
                    None => diag.add_warning_with_entity(
                        CATEGORY,
                        &format!("no {} demand value found for abstract demand", name),
                        &load.id,
                    ),
                },
            }
        }
    }
    total
}

/// Summed per-unit admittance of the fixed shunts at a node.
fn admittance(bus_i: usize, shunts: &[&grg::Shunt], diag: &mut Diagnostics) -> (f64, f64) {
    if shunts.len() > 1 {
        diag.add_warning_with_entity(
            "merge",
            &format!("merging {} shunts into bus {}", shunts.len(), bus_i),
            &bus_i.to_string(),
        );
    }

    let mut total = (0.0, 0.0);
    for shunt in shunts {
        match (shunt.shunt.conductance, shunt.shunt.susceptance) {
            (Quantity::Fixed(g), Quantity::Fixed(b)) => {
                total.0 += g;
                total.1 += b;
            }
            _ => diag.add_warning_with_entity(
                CATEGORY,
                "skipping shunt with variable admittance",
                &shunt.id,
            ),
        }
    }
    total
}

/// Area or zone code of each grouped component.
///
/// Codes come from the groups' `source_id` when all of them have a numeric
/// one, otherwise groups are numbered from 1 in id order.
fn group_codes<'a>(
    doc: &'a GrgDocument,
    kind: GroupKind,
    diag: &mut Diagnostics,
) -> BTreeMap<&'a str, i64> {
    let groups: Vec<_> = doc.groups.values().filter(|g| g.kind == kind).collect();
    let sources: Option<Vec<i64>> = groups
        .iter()
        .map(|g| g.source_id.as_deref()?.parse().ok())
        .collect();
    let codes = sources.unwrap_or_else(|| (1..=groups.len() as i64).collect());

    let label = kind_label(kind);
    let mut lookup = BTreeMap::new();
    for (group, code) in groups.iter().zip(codes) {
        for member in &group.component_ids {
            if let Some(kept) = lookup.get(member.as_str()) {
                diag.add_warning_with_entity(
                    CATEGORY,
                    &format!("component is in multiple {}s, only {} will be used", label, kept),
                    member,
                );
            } else {
                lookup.insert(member.as_str(), code);
            }
        }
    }
    lookup
}

fn kind_label(kind: GroupKind) -> &'static str {
    match kind {
        GroupKind::Area => "area",
        GroupKind::Zone => "zone",
    }
}

/// Group code of a merged bus, 0 when none of its components is grouped.
fn member_code(
    members: &[&grg::Bus],
    codes: &BTreeMap<&str, i64>,
    label: &str,
    diag: &mut Diagnostics,
) -> i64 {
    let mut code = 0;
    for bus in members {
        if let Some(&c) = codes.get(bus.id.as_str()) {
            if code != 0 && c != code {
                diag.add_warning_with_entity(
                    CATEGORY,
                    &format!("inconsistent bus {}s found, keeping {}", label, code),
                    &bus.id,
                );
            } else {
                code = c;
            }
        }
    }
    code
}

/// Base kV from the voltage level declaring each bus point.
///
/// `mp_base_kv` takes precedence over the nominal value so a case written
/// with a zero base kV reads back unchanged.
fn base_kv(
    ctx: &DecodeContext<'_>,
    members: &[&grg::Bus],
    diag: &mut Diagnostics,
) -> TranslateResult<f64> {
    let mut base_kv: Option<f64> = None;
    for bus in members {
        let level = ctx.levels.get(bus.link.as_str()).ok_or_else(|| {
            TranslateError::internal(format!("bus {} is not in a voltage level", bus.id))
        })?;
        let value = level
            .voltage
            .mp_base_kv
            .unwrap_or(level.voltage.nominal_value);
        match base_kv {
            Some(kept) if kept != value => diag.add_warning_with_entity(
                CATEGORY,
                &format!("inconsistent bus base kV values found, keeping {}", kept),
                &bus.id,
            ),
            Some(_) => {}
            None => base_kv = Some(value),
        }
    }
    Ok(base_kv.unwrap_or(1.0))
}

/// Average starting voltage of the merged buses; angle in radians.
fn voltage(ctx: &DecodeContext<'_>, members: &[&grg::Bus]) -> (f64, f64) {
    let mut magnitudes = Vec::new();
    let mut angles = Vec::new();
    for bus in members {
        let key = format!("{}/voltage", bus.id);
        if let Some(vm) = field(&ctx.mapping, &key, "magnitude") {
            magnitudes.push(vm);
        }
        if let Some(va) = field(&ctx.mapping, &key, "angle") {
            angles.push(va);
        }
    }
    let mean = |values: &[f64], default: f64| {
        if values.is_empty() {
            default
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };
    (mean(&magnitudes, 1.0), mean(&angles, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeOptions;
    use mp2grg_core::grg::{Component, Group, Range};
    use serde_json::json;

    /// Two buses joined by a closed disconnector, plus a lone bus.
    fn doc() -> GrgDocument {
        serde_json::from_value(json!({
            "grg_version": "1.6",
            "network": {
                "type": "network", "subtype": "bus_breaker", "id": "merge",
                "per_unit": true, "base_mva": 100.0,
                "components": {
                    "vl_a": {
                        "type": "voltage_level", "id": "vl_a",
                        "voltage": {"lower_limit": 0.9, "upper_limit": 1.1, "nominal_value": 138.0},
                        "voltage_points": ["a1", "a2", "a3"],
                        "voltage_level_components": {
                            "bus_a1": {
                                "type": "bus", "id": "bus_a1", "link": "a1",
                                "voltage": {"magnitude": {"var": {"lb": 0.9, "ub": 1.1}},
                                            "angle": {"var": {"lb": "-Inf", "ub": "Inf"}}}
                            },
                            "bus_a2": {
                                "type": "bus", "id": "bus_a2", "link": "a2",
                                "voltage": {"magnitude": {"var": {"lb": 0.95, "ub": 1.05}},
                                            "angle": {"var": {"lb": "-Inf", "ub": "Inf"}}}
                            },
                            "disconnector": {
                                "type": "switch", "id": "disconnector",
                                "link_1": "a1", "link_2": "a2", "status": {"var": ["off", "on"]}
                            },
                            "breaker": {
                                "type": "switch", "id": "breaker", "subtype": "breaker",
                                "link_1": "a2", "link_2": "a3", "status": {"var": ["off", "on"]}
                            },
                            "load_1": {
                                "type": "load", "id": "load_1", "link": "a3",
                                "demand": {"active": {"var": {"lb": 0.0, "ub": 1.0}}, "reactive": 0.2}
                            },
                            "shunt_1": {
                                "type": "shunt", "id": "shunt_1", "link": "a1",
                                "shunt": {"conductance": 0.0, "susceptance": 0.19}
                            }
                        }
                    },
                    "vl_b": {
                        "type": "voltage_level", "id": "vl_b",
                        "voltage": {"lower_limit": 0.9, "upper_limit": 1.1, "nominal_value": 1.0, "mp_base_kv": 0.0},
                        "voltage_points": ["b1"],
                        "voltage_level_components": {
                            "bus_b1": {
                                "type": "bus", "id": "bus_b1", "link": "b1", "reference": true,
                                "voltage": {"magnitude": {"var": {"lb": 0.9, "ub": 1.1}},
                                            "angle": {"var": {"lb": "-Inf", "ub": "Inf"}}}
                            }
                        }
                    }
                }
            },
            "mappings": {
                "starting_points": {
                    "bus_a1/voltage": {"magnitude": 1.0, "angle": 0.1},
                    "bus_a2/voltage": {"magnitude": 1.02, "angle": 0.3},
                    "load_1/demand": {"active": 0.5}
                },
                "breakers_assignment": {"disconnector/status": "on", "breaker/status": "on"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_closed_switch_merges_buses() {
        let doc = doc();
        let mut diag = Diagnostics::new();
        let ctx = DecodeContext::new(&doc, &DecodeOptions::default(), &mut diag);
        let (buses, names) = decode_buses(&ctx, &mut diag).unwrap();

        assert_eq!(buses.len(), 2);
        let merged = &buses[0];
        assert_eq!(merged.bus_i, 1);
        assert_eq!(merged.pd, 50.0);
        assert_eq!(merged.qd, 20.0);
        assert_eq!(merged.bs, 19.0);
        assert_eq!(merged.vmin, 0.95);
        assert_eq!(merged.vmax, 1.05);
        assert!((merged.vm - 1.01).abs() < 1e-12);
        assert!((merged.va - 0.2f64.to_degrees()).abs() < 1e-9);
        assert_eq!(merged.base_kv, 138.0);
        assert_eq!(names[0].name, "bus_a1-bus_a2");
        assert!(diag.warnings().any(|i| i.category == "merge"));

        let lone = &buses[1];
        assert_eq!(lone.bus_type, BusType::Reference);
        assert_eq!(lone.base_kv, 0.0);
        assert_eq!(lone.vm, 1.0);
    }

    #[test]
    fn test_open_switch_keeps_buses_apart() {
        let mut doc = doc();
        doc.mappings
            .get_mut("breakers_assignment")
            .unwrap()
            .insert("disconnector/status".to_string(), json!("off"));
        let mut diag = Diagnostics::new();
        let ctx = DecodeContext::new(&doc, &DecodeOptions::default(), &mut diag);
        let (buses, _) = decode_buses(&ctx, &mut diag).unwrap();

        assert_eq!(buses.len(), 3);
        // the disconnector was the only switch on a1
        assert_eq!(buses[0].bus_type, BusType::Isolated);
        assert_eq!(buses[0].bs, 19.0);
        assert_eq!(buses[1].pd, 50.0);
    }

    #[test]
    fn test_missing_abstract_demand_warns() {
        let mut doc = doc();
        doc.mappings.get_mut("starting_points").unwrap().remove("load_1/demand");
        let mut diag = Diagnostics::new();
        let ctx = DecodeContext::new(&doc, &DecodeOptions::default(), &mut diag);
        let (buses, _) = decode_buses(&ctx, &mut diag).unwrap();
        assert_eq!(buses[0].pd, 0.0);
        assert!(diag.warnings().any(|i| i.message.contains("active demand")));
    }

    #[test]
    fn test_bus_type_hint_and_groups() {
        let mut doc = doc();
        if let Some(Component::VoltageLevel(vl)) = doc.network.components.get_mut("vl_b") {
            if let Some(Component::Bus(bus)) = vl.voltage_level_components.get_mut("bus_b1") {
                bus.matpower_bus_type = Some(2);
                bus.voltage.magnitude = Range::new(0.94, 1.06);
            }
        }
        for (id, code, members) in [
            ("area_1", "7", vec!["bus_a1", "bus_b1"]),
            ("area_2", "9", vec!["bus_b1"]),
        ] {
            doc.groups.insert(
                id.to_string(),
                Group {
                    kind: GroupKind::Area,
                    name: None,
                    source_id: Some(code.to_string()),
                    component_ids: members.into_iter().map(str::to_string).collect(),
                },
            );
        }

        let mut diag = Diagnostics::new();
        let ctx = DecodeContext::new(&doc, &DecodeOptions::default(), &mut diag);
        let (buses, _) = decode_buses(&ctx, &mut diag).unwrap();

        assert_eq!(buses[1].bus_type, BusType::Pv);
        assert_eq!(buses[1].vmin, 0.94);
        assert_eq!(buses[0].area, 7);
        assert_eq!(buses[1].area, 7);
        assert_eq!(buses[0].zone, 0);
        assert!(diag.warnings().any(|i| i.message.contains("multiple areas")));
        assert!(diag.warnings().any(|i| i.message.contains("derived type")));
    }
}
