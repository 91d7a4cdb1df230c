//! Topology queries over hierarchical documents.
//!
//! Switches are the only components whose state changes the electrical
//! topology. Given a status assignment for switches these helpers answer:
//! which voltage points are electrically the same node, which are cut off,
//! and which voltage level declares a voltage point.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::unionfind::UnionFind;

use crate::grg::{
    AcLine, Bus, Component, DcLine, Generator, GrgDocument, Load, Shunt, Substation, Switch,
    SwitchStatus, SynchronousCondenser, TwoWindingTransformer, VoltageLevel,
};

/// Switch id to assigned status, usually taken from `<switch>/status` mapping entries
pub type StatusAssignment = BTreeMap<String, SwitchStatus>;

/// Every component of a document grouped by kind, containers walked recursively.
#[derive(Debug, Default)]
pub struct ComponentsByType<'a> {
    pub bus: Vec<&'a Bus>,
    pub load: Vec<&'a Load>,
    pub shunt: Vec<&'a Shunt>,
    pub generator: Vec<&'a Generator>,
    pub synchronous_condenser: Vec<&'a SynchronousCondenser>,
    pub switch: Vec<&'a Switch>,
    pub ac_line: Vec<&'a AcLine>,
    pub two_winding_transformer: Vec<&'a TwoWindingTransformer>,
    pub dc_line: Vec<&'a DcLine>,
    pub voltage_level: Vec<&'a VoltageLevel>,
    pub substation: Vec<&'a Substation>,
}

impl<'a> ComponentsByType<'a> {
    fn collect(&mut self, components: &'a BTreeMap<String, Component>) {
        for component in components.values() {
            match component {
                Component::Bus(c) => self.bus.push(c),
                Component::Load(c) => self.load.push(c),
                Component::Shunt(c) => self.shunt.push(c),
                Component::Generator(c) => self.generator.push(c),
                Component::SynchronousCondenser(c) => self.synchronous_condenser.push(c),
                Component::Switch(c) => self.switch.push(c),
                Component::AcLine(c) => self.ac_line.push(c),
                Component::TwoWindingTransformer(c) => self.two_winding_transformer.push(c),
                Component::DcLine(c) => self.dc_line.push(c),
                Component::VoltageLevel(vl) => {
                    self.voltage_level.push(vl);
                    self.collect(&vl.voltage_level_components);
                }
                Component::Substation(ss) => {
                    self.substation.push(ss);
                    self.collect(&ss.substation_components);
                }
            }
        }
    }

    /// Number of non-container components
    pub fn device_count(&self) -> usize {
        self.bus.len()
            + self.load.len()
            + self.shunt.len()
            + self.generator.len()
            + self.synchronous_condenser.len()
            + self.switch.len()
            + self.ac_line.len()
            + self.two_winding_transformer.len()
            + self.dc_line.len()
    }
}

pub fn components_by_type(doc: &GrgDocument) -> ComponentsByType<'_> {
    let mut cbt = ComponentsByType::default();
    cbt.collect(&doc.network.components);
    cbt
}

/// Every component of the document with its id, containers included.
pub fn all_components(doc: &GrgDocument) -> Vec<&Component> {
    fn walk<'a>(components: &'a BTreeMap<String, Component>, out: &mut Vec<&'a Component>) {
        for component in components.values() {
            out.push(component);
            if let Some(children) = component.children() {
                walk(children, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(&doc.network.components, &mut out);
    out
}

/// Status of a switch: the assignment wins, then a fixed status on the
/// component, else closed.
pub fn switch_status(switch: &Switch, status: &StatusAssignment) -> SwitchStatus {
    status
        .get(&switch.id)
        .copied()
        .or_else(|| switch.status.fixed())
        .unwrap_or(SwitchStatus::On)
}

/// Maps each voltage point to the voltage level that declares it.
pub fn voltage_level_by_voltage_point(doc: &GrgDocument) -> BTreeMap<&str, &VoltageLevel> {
    let mut lookup = BTreeMap::new();
    for vl in components_by_type(doc).voltage_level {
        for vp in &vl.voltage_points {
            lookup.insert(vp.as_str(), vl);
        }
    }
    lookup
}

/// Every voltage point of the document: declared ones and linked ones.
fn voltage_points(doc: &GrgDocument) -> BTreeSet<&str> {
    let mut points = BTreeSet::new();
    for component in all_components(doc) {
        if let Component::VoltageLevel(vl) = component {
            points.extend(vl.voltage_points.iter().map(String::as_str));
        }
        points.extend(component.links());
    }
    points
}

/// Collapse voltage points into electrical nodes numbered from 0.
///
/// Breakers always join their endpoints since they only isolate a device;
/// other switches join their endpoints when closed. Nodes owning a bus are
/// numbered first, in bus id order, then the remaining nodes in order of
/// their smallest voltage point id.
pub fn collapse_voltage_points<'a>(
    doc: &'a GrgDocument,
    status: &StatusAssignment,
) -> BTreeMap<&'a str, usize> {
    let points: Vec<&str> = voltage_points(doc).into_iter().collect();
    let index: HashMap<&str, usize> = points.iter().enumerate().map(|(i, p)| (*p, i)).collect();

    let cbt = components_by_type(doc);
    let mut uf = UnionFind::<usize>::new(points.len());
    for switch in &cbt.switch {
        if switch.is_breaker() || switch_status(switch, status) == SwitchStatus::On {
            if let (Some(&a), Some(&b)) = (
                index.get(switch.link_1.as_str()),
                index.get(switch.link_2.as_str()),
            ) {
                uf.union(a, b);
            }
        }
    }

    let mut numbering: HashMap<usize, usize> = HashMap::new();
    let mut buses = cbt.bus.clone();
    buses.sort_by(|a, b| a.id.cmp(&b.id));
    for bus in buses {
        if let Some(&i) = index.get(bus.link.as_str()) {
            let next = numbering.len();
            numbering.entry(uf.find(i)).or_insert(next);
        }
    }
    // points are sorted, so the first point seen of a group is its smallest id
    for i in 0..points.len() {
        let next = numbering.len();
        numbering.entry(uf.find(i)).or_insert(next);
    }

    points
        .iter()
        .enumerate()
        .map(|(i, p)| (*p, numbering[&uf.find(i)]))
        .collect()
}

/// Voltage points cut off by open switches.
///
/// A point is isolated when at least one switch touches it and every switch
/// touching it is open.
pub fn isolated_voltage_points<'a>(
    doc: &'a GrgDocument,
    status: &StatusAssignment,
) -> BTreeSet<&'a str> {
    let mut touching: BTreeMap<&str, Vec<SwitchStatus>> = BTreeMap::new();
    for switch in components_by_type(doc).switch {
        let state = switch_status(switch, status);
        touching.entry(switch.link_1.as_str()).or_default().push(state);
        touching.entry(switch.link_2.as_str()).or_default().push(state);
    }

    touching
        .into_iter()
        .filter(|(_, states)| states.iter().all(|s| *s == SwitchStatus::Off))
        .map(|(vp, _)| vp)
        .collect()
}

/// Every voltage point that is not isolated.
pub fn active_voltage_points<'a>(
    doc: &'a GrgDocument,
    status: &StatusAssignment,
) -> BTreeSet<&'a str> {
    let isolated = isolated_voltage_points(doc, status);
    voltage_points(doc)
        .into_iter()
        .filter(|vp| !isolated.contains(vp))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grg::*;

    fn vl(id: &str, points: &[&str], components: Vec<Component>) -> Component {
        Component::VoltageLevel(VoltageLevel {
            id: id.to_string(),
            voltage: NominalVoltage {
                lower_limit: 0.9,
                upper_limit: 1.1,
                nominal_value: 230.0,
                mp_base_kv: None,
            },
            voltage_points: points.iter().map(|p| p.to_string()).collect(),
            voltage_level_components: components
                .into_iter()
                .map(|c| (c.id().to_string(), c))
                .collect(),
        })
    }

    fn bus(id: &str, link: &str) -> Component {
        Component::Bus(Bus {
            id: id.to_string(),
            source_id: None,
            link: link.to_string(),
            voltage: BusVoltage {
                magnitude: Range::new(0.9, 1.1),
                angle: Range::unbounded(),
            },
            reference: None,
            matpower_bus_type: None,
        })
    }

    fn switch(id: &str, a: &str, b: &str, subtype: Option<&str>) -> Component {
        Component::Switch(Switch {
            id: id.to_string(),
            subtype: subtype.map(str::to_string),
            link_1: a.to_string(),
            link_2: b.to_string(),
            status: StatusValue::binary(),
        })
    }

    fn doc(components: Vec<Component>) -> GrgDocument {
        GrgDocument {
            grg_version: GRG_VERSION.to_string(),
            units: default_units(),
            network: Network {
                kind: "network".to_string(),
                subtype: "bus_breaker".to_string(),
                id: "test".to_string(),
                per_unit: true,
                description: String::new(),
                base_mva: 100.0,
                components: components
                    .into_iter()
                    .map(|c| (c.id().to_string(), c))
                    .collect(),
            },
            groups: BTreeMap::new(),
            mappings: BTreeMap::new(),
            market: None,
            operation_constraints: None,
        }
    }

    /// Two buses in one substation joined by a disconnector, each with a
    /// breaker to a device point.
    fn two_bus_doc() -> GrgDocument {
        doc(vec![Component::Substation(Substation {
            id: "substation_1".to_string(),
            substation_components: [
                vl(
                    "voltage_level_1",
                    &["vp_1", "vp_s1"],
                    vec![bus("bus_1", "vp_1"), switch("switch_1", "vp_1", "vp_s1", Some("breaker"))],
                ),
                vl(
                    "voltage_level_2",
                    &["vp_2", "vp_s2"],
                    vec![
                        bus("bus_2", "vp_2"),
                        switch("switch_2", "vp_2", "vp_s2", Some("breaker")),
                        switch("switch_3", "vp_1", "vp_2", Some("disconnector")),
                    ],
                ),
            ]
            .into_iter()
            .map(|c| (c.id().to_string(), c))
            .collect(),
        })])
    }

    #[test]
    fn test_components_by_type_walks_containers() {
        let d = two_bus_doc();
        let cbt = components_by_type(&d);
        assert_eq!(cbt.bus.len(), 2);
        assert_eq!(cbt.switch.len(), 3);
        assert_eq!(cbt.voltage_level.len(), 2);
        assert_eq!(cbt.substation.len(), 1);
        assert_eq!(cbt.device_count(), 5);
    }

    #[test]
    fn test_collapse_open_disconnector() {
        let d = two_bus_doc();
        let mut status = StatusAssignment::new();
        status.insert("switch_3".to_string(), SwitchStatus::Off);
        status.insert("switch_1".to_string(), SwitchStatus::Off);

        let nodes = collapse_voltage_points(&d, &status);
        assert_eq!(nodes["vp_1"], 0);
        // breakers join regardless of status
        assert_eq!(nodes["vp_s1"], 0);
        assert_eq!(nodes["vp_2"], 1);
        assert_eq!(nodes["vp_s2"], 1);
    }

    #[test]
    fn test_collapse_closed_disconnector() {
        let d = two_bus_doc();
        let nodes = collapse_voltage_points(&d, &StatusAssignment::new());
        assert_eq!(nodes["vp_1"], nodes["vp_2"]);
        assert_eq!(nodes.values().max(), Some(&0));
    }

    #[test]
    fn test_isolated_and_active() {
        let d = two_bus_doc();
        let mut status = StatusAssignment::new();
        status.insert("switch_1".to_string(), SwitchStatus::Off);

        let isolated = isolated_voltage_points(&d, &status);
        assert!(isolated.contains("vp_s1"));
        assert!(!isolated.contains("vp_1"));

        let active = active_voltage_points(&d, &status);
        assert!(active.contains("vp_1"));
        assert!(!active.contains("vp_s1"));
    }

    #[test]
    fn test_voltage_level_lookup() {
        let d = two_bus_doc();
        let lookup = voltage_level_by_voltage_point(&d);
        assert_eq!(lookup["vp_s2"].id, "voltage_level_2");
        assert_eq!(lookup.len(), 4);
    }

    #[test]
    fn test_switch_status_resolution() {
        let sw = Switch {
            id: "switch_9".to_string(),
            subtype: None,
            link_1: "a".to_string(),
            link_2: "b".to_string(),
            status: StatusValue::Fixed(SwitchStatus::Off),
        };
        assert_eq!(switch_status(&sw, &StatusAssignment::new()), SwitchStatus::Off);

        let mut status = StatusAssignment::new();
        status.insert("switch_9".to_string(), SwitchStatus::On);
        assert_eq!(switch_status(&sw, &status), SwitchStatus::On);
    }
}
