//! Flat case to hierarchical document.
//!
//! [`encode_case`] assigns identifiers, builds one voltage level per bus,
//! puts a breaker between every device and its bus, clusters buses joined
//! by transformers into substations, and records operating points, breaker
//! states, costs and angle constraints alongside the components.
//!
//! ```no_run
//! use mp2grg_core::Diagnostics;
//! use mp2grg_io::encode::{encode_case, EncodeOptions};
//! use mp2grg_io::matpower::parse_matpower_file;
//!
//! let mut diag = Diagnostics::new();
//! let case = parse_matpower_file("case14.m", &mut diag)?;
//! let doc = encode_case(&case, &EncodeOptions::default(), &mut diag)?;
//! assert_eq!(doc.network.id, case.name);
//! # Ok::<(), mp2grg_core::TranslateError>(())
//! ```

pub mod ids;
pub mod records;
pub mod substations;
pub mod switches;

use std::collections::BTreeMap;

use mp2grg_core::case::{Bus, Case, Status};
use mp2grg_core::grg::{
    default_units, Component, Group, GroupKind, GrgDocument, Mapping, Market, Network, Range,
    Substation, SwitchStatus, VoltageLevel, BREAKERS_ASSIGNMENT, GRG_VERSION, STARTING_POINTS,
};
use mp2grg_core::units::Degrees;
use mp2grg_core::{BaseMva, Diagnostics, TranslateError, TranslateResult};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::cost::{cost_input, cost_key, cost_to_function};
use crate::validate::validate_document;

pub use ids::ComponentIds;
pub use substations::{cluster_substations, Substations};
pub use switches::{combined_status, insert_switches, Inserted, InsertedSwitch, SwitchCounter};

pub const NETWORK_SUBTYPE: &str = "bus_breaker";
pub const DESCRIPTION: &str =
    "Translated from Matpower data v2 by mp2grg.  No model description is available in this format.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Leave out optional subtypes (load, shunt and line kinds)
    pub omit_subtypes: bool,
    /// Return the document even when it fails validation
    pub skip_validation: bool,
}

/// Translate a flat case into a hierarchical document.
///
/// Fails with [`TranslateError::InvalidDocument`], carrying the document,
/// when the result does not validate.
pub fn encode_case(
    case: &Case,
    options: &EncodeOptions,
    diag: &mut Diagnostics,
) -> TranslateResult<GrgDocument> {
    let base = BaseMva(case.base_mva);
    let ids = ComponentIds::assign(case);
    let buses: BTreeMap<usize, &Bus> = case.bus.iter().map(|b| (b.bus_i, b)).collect();
    let bus = |bus_i: usize| {
        buses
            .get(&bus_i)
            .copied()
            .ok_or_else(|| TranslateError::internal(format!("unknown bus {}", bus_i)))
    };

    if options.omit_subtypes && !case.bus.is_empty() {
        diag.add_warning(
            "encode",
            "subtypes cannot be omitted on buses, bus components carry none",
        );
    }

    let mut builder = Builder::new(&ids);
    let mut starting_points = Mapping::new();

    for b in &case.bus {
        let vp = ids.voltage_point_id(b.bus_i)?;
        let vl_id = ids.voltage_level_id(b.bus_i)?;
        builder
            .levels
            .insert(b.bus_i, records::voltage_level(b, vl_id, vp, diag));

        let bus_id = ids.bus_id(b.bus_i)?;
        builder.place(b.bus_i, records::bus(b, bus_id, vp))?;
        starting_points.insert(
            format!("{}/voltage", bus_id),
            json!({
                "magnitude": b.vm,
                "angle": Degrees(b.va).to_radians().value(),
            }),
        );

        if let Some(load_id) = ids.load.get(&b.bus_i) {
            let load = records::load(b, load_id, vp, base, options.omit_subtypes);
            let load = builder.attach(load, &[b.bus_i], b.status().into())?;
            builder.place(b.bus_i, load)?;
            starting_points.insert(
                format!("{}/demand", load_id),
                json!({
                    "active": base.to_pu(b.pd),
                    "reactive": base.to_pu(b.qd),
                }),
            );
        }

        if let Some(shunt_id) = ids.shunt.get(&b.bus_i) {
            let shunt = records::shunt(b, shunt_id, vp, base, options.omit_subtypes);
            let shunt = builder.attach(shunt, &[b.bus_i], b.status().into())?;
            builder.place(b.bus_i, shunt)?;
        }
    }

    for (gen, gen_id) in case.gen.iter().zip(&ids.generator) {
        let vp = ids.voltage_point_id(gen.gen_bus)?;
        let status = combined_status([gen.status(), bus(gen.gen_bus)?.status()]);
        let component = records::generator(gen, gen_id, vp, base);
        let component = builder.attach(component, &[gen.gen_bus], status)?;
        builder.place(gen.gen_bus, component)?;

        let output = if gen.is_synchronous_condenser() {
            json!({ "reactive": base.to_pu(gen.qg) })
        } else {
            json!({
                "active": base.to_pu(gen.pg),
                "reactive": base.to_pu(gen.qg),
            })
        };
        starting_points.insert(format!("{}/output", gen_id), output);
    }

    let mut top_level: BTreeMap<String, Component> = BTreeMap::new();

    for (dc, dc_id) in case.dcline.iter().flatten().zip(&ids.dc_line) {
        let links = (
            ids.voltage_point_id(dc.f_bus)?,
            ids.voltage_point_id(dc.t_bus)?,
        );
        let status =
            combined_status([dc.status(), bus(dc.f_bus)?.status(), bus(dc.t_bus)?.status()]);
        let component = records::dc_line(dc, dc_id, links, base);
        let component = builder.attach(component, &[dc.f_bus, dc.t_bus], status)?;
        top_level.insert(dc_id.clone(), component);

        starting_points.insert(
            format!("{}/output_1", dc_id),
            json!({
                "vf": dc.vf,
                "active": base.to_pu(dc.pf),
                "reactive": base.to_pu(dc.qf),
            }),
        );
        starting_points.insert(
            format!("{}/output_2", dc_id),
            json!({
                "vt": dc.vt,
                "active": base.to_pu(dc.pt),
                "reactive": base.to_pu(dc.qt),
            }),
        );
    }

    let branch_status = |f_bus: usize, t_bus: usize, own: Status| -> TranslateResult<SwitchStatus> {
        Ok(combined_status([own, bus(f_bus)?.status(), bus(t_bus)?.status()]))
    };

    for (branch, branch_id) in case.branch.iter().zip(&ids.branch) {
        if branch.is_transformer() {
            continue;
        }
        let links = (
            ids.voltage_point_id(branch.f_bus)?,
            ids.voltage_point_id(branch.t_bus)?,
        );
        let status = branch_status(branch.f_bus, branch.t_bus, branch.status())?;
        let line = records::ac_line(branch, branch_id, links, base, options.omit_subtypes);
        let line = builder.attach(line, &[branch.f_bus, branch.t_bus], status)?;
        top_level.insert(branch_id.clone(), line);
    }

    let substations = cluster_substations(&case.bus, &case.branch);
    substations.check(&case.branch)?;

    let mut substation_components: Vec<BTreeMap<String, Component>> =
        vec![BTreeMap::new(); substations.members.len()];
    for (branch, branch_id) in case.branch.iter().zip(&ids.branch) {
        if !branch.is_transformer() {
            continue;
        }
        let links = (
            ids.voltage_point_id(branch.f_bus)?,
            ids.voltage_point_id(branch.t_bus)?,
        );
        let status = branch_status(branch.f_bus, branch.t_bus, branch.status())?;
        let transformer = records::transformer(branch, branch_id, links, base);
        let transformer = builder.attach(transformer, &[branch.f_bus, branch.t_bus], status)?;
        substation_components[substations.of_bus(branch.f_bus)?]
            .insert(branch_id.clone(), transformer);
        starting_points.insert(format!("{}/tap_changer/position", branch_id), json!(0));
    }

    let Builder {
        mut levels,
        breakers,
        counter,
        ..
    } = builder;

    for (k, (members, mut components)) in substations
        .members
        .iter()
        .zip(substation_components)
        .enumerate()
    {
        for bus_i in members {
            let vl = levels
                .remove(bus_i)
                .ok_or_else(|| TranslateError::internal(format!("bus {} has no voltage level", bus_i)))?;
            components.insert(vl.id.clone(), Component::VoltageLevel(vl));
        }
        let id = ids.substation(k + 1);
        top_level.insert(
            id.clone(),
            Component::Substation(Substation {
                id,
                substation_components: components,
            }),
        );
    }

    let groups = groups(case, &ids)?;
    let market = market(case, &ids, base);

    let operation_constraints = case
        .branch
        .iter()
        .zip(&ids.branch)
        .map(|(branch, id)| {
            (
                format!("{}/angle_difference", id),
                Range::new(
                    Degrees(branch.angmin).to_radians().value(),
                    Degrees(branch.angmax).to_radians().value(),
                ),
            )
        })
        .collect();

    let mut mappings = BTreeMap::new();
    mappings.insert(STARTING_POINTS.to_string(), starting_points);
    mappings.insert(BREAKERS_ASSIGNMENT.to_string(), breakers);

    let doc = GrgDocument {
        grg_version: GRG_VERSION.to_string(),
        units: default_units(),
        network: Network {
            kind: "network".to_string(),
            subtype: NETWORK_SUBTYPE.to_string(),
            id: case.name.clone(),
            per_unit: true,
            description: DESCRIPTION.to_string(),
            base_mva: case.base_mva,
            components: top_level,
        },
        groups,
        mappings,
        market: Some(market),
        operation_constraints: Some(operation_constraints),
    };

    info!(
        case = %case.name,
        substations = substations.members.len(),
        switches = counter.issued(),
        "encoded case"
    );

    if !options.skip_validation {
        let report = validate_document(&doc);
        if report.has_errors() {
            debug!(issues = report.error_count(), "encoded document failed validation");
            return Err(TranslateError::InvalidDocument {
                issues: report.issues.iter().map(ToString::to_string).collect(),
                document: Box::new(doc),
            });
        }
    }

    Ok(doc)
}

/// Voltage levels under construction and the breakers placed so far.
struct Builder<'a> {
    ids: &'a ComponentIds,
    levels: BTreeMap<usize, VoltageLevel>,
    counter: SwitchCounter,
    breakers: Mapping,
}

impl<'a> Builder<'a> {
    fn new(ids: &'a ComponentIds) -> Self {
        Builder {
            ids,
            levels: BTreeMap::new(),
            counter: SwitchCounter::new(),
            breakers: Mapping::new(),
        }
    }

    fn level(&mut self, bus_i: usize) -> TranslateResult<&mut VoltageLevel> {
        self.levels
            .get_mut(&bus_i)
            .ok_or_else(|| TranslateError::internal(format!("bus {} has no voltage level", bus_i)))
    }

    fn place(&mut self, bus_i: usize, component: Component) -> TranslateResult<()> {
        self.level(bus_i)?
            .voltage_level_components
            .insert(component.id().to_string(), component);
        Ok(())
    }

    /// Insert breakers on the device links; `buses` lists the bus of each link.
    fn attach(
        &mut self,
        device: Component,
        buses: &[usize],
        status: SwitchStatus,
    ) -> TranslateResult<Component> {
        let Inserted { device, switches } = insert_switches(device, &mut self.counter, self.ids);
        for (inserted, bus_i) in switches.into_iter().zip(buses) {
            self.breakers.insert(
                format!("{}/status", inserted.switch.id),
                status_value(status),
            );
            let level = self.level(*bus_i)?;
            level.voltage_points.push(inserted.new_point);
            level.voltage_level_components.insert(
                inserted.switch.id.clone(),
                Component::Switch(inserted.switch),
            );
        }
        Ok(device)
    }
}

fn status_value(status: SwitchStatus) -> Value {
    match status {
        SwitchStatus::On => Value::from("on"),
        SwitchStatus::Off => Value::from("off"),
    }
}

/// Area and zone groups, each listing its buses in case order.
fn groups(case: &Case, ids: &ComponentIds) -> TranslateResult<BTreeMap<String, Group>> {
    let mut groups = BTreeMap::new();
    for (kind, table) in [(GroupKind::Area, &ids.area), (GroupKind::Zone, &ids.zone)] {
        for (code, group_id) in table {
            let component_ids = case
                .bus
                .iter()
                .filter(|b| match kind {
                    GroupKind::Area => b.area == *code,
                    GroupKind::Zone => b.zone == *code,
                })
                .map(|b| ids.bus_id(b.bus_i).map(str::to_string))
                .collect::<TranslateResult<Vec<_>>>()?;
            groups.insert(
                group_id.clone(),
                Group {
                    kind,
                    name: Some(code.to_string()),
                    source_id: Some(code.to_string()),
                    component_ids,
                },
            );
        }
    }
    Ok(groups)
}

/// One cost function per `gencost` row.
///
/// Rows past the generator count price reactive output. Condensers produce
/// no active power, so their active rows are dropped.
fn market(case: &Case, ids: &ComponentIds, base: BaseMva) -> Market {
    let mut market = Market::default();
    let gen_count = case.gen.len();
    if gen_count == 0 {
        return market;
    }
    for cost in case.gencost.iter().flatten() {
        let reactive = cost.index >= gen_count;
        let gen_index = cost.index % gen_count;
        let gen = &case.gen[gen_index];
        if !reactive && gen.is_synchronous_condenser() {
            continue;
        }
        let gen_id = &ids.generator[gen_index];
        market.operational_costs.insert(
            cost_key(gen_id, reactive),
            cost_to_function(cost, base, cost_input(gen_id, reactive)),
        );
    }
    market
}
