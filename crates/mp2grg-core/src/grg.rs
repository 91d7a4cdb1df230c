//! Hierarchical (GRG) network document model.
//!
//! Devices connect to named voltage points. Voltage points are grouped into
//! voltage levels, voltage levels into substations. Operating values live in
//! named mapping layers instead of on the components, so the same topology
//! can be paired with several operating points.
//!
//! Every component kind is a variant of the closed [`Component`] enum,
//! serialized with its `type` tag. Range bounds and limit durations may be
//! infinite; they are written as the strings `"Inf"` / `"-Inf"`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Format version written into encoded documents
pub const GRG_VERSION: &str = "1.6";

/// Default unit table written into encoded documents
pub fn default_units() -> BTreeMap<String, String> {
    [
        ("active_power", "per_unit"),
        ("reactive_power", "per_unit"),
        ("apparent_power", "per_unit"),
        ("voltage_magnitude", "per_unit"),
        ("nominal_voltage", "kV"),
        ("angle", "radian"),
        ("impedance", "per_unit"),
        ("admittance", "per_unit"),
        ("current", "per_unit"),
        ("duration", "second"),
        ("cost", "dollar"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Serde helpers for bounds that may be infinite.
pub mod bound {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *value == f64::INFINITY {
            serializer.serialize_str("Inf")
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str("-Inf")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(BoundVisitor)
    }

    struct BoundVisitor;

    impl<'de> Visitor<'de> for BoundVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or \"Inf\" / \"-Inf\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "Inf" | "inf" | "Infinity" => Ok(f64::INFINITY),
                "-Inf" | "-inf" | "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other
                    .parse::<f64>()
                    .map_err(|_| E::custom(format!("invalid bound '{}'", other))),
            }
        }
    }
}

// =============================================================================
// Value shapes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(with = "bound")]
    pub lb: f64,
    #[serde(with = "bound")]
    pub ub: f64,
}

/// A variable range, serialized as `{"var": {"lb": .., "ub": ..}}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub var: Bounds,
}

impl Range {
    pub fn new(lb: f64, ub: f64) -> Self {
        Range {
            var: Bounds { lb, ub },
        }
    }

    pub fn unbounded() -> Self {
        Range::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn fixed(value: f64) -> Self {
        Range::new(value, value)
    }

    pub fn lb(&self) -> f64 {
        self.var.lb
    }

    pub fn ub(&self) -> f64 {
        self.var.ub
    }
}

/// A value that is either fixed or left abstract as a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Fixed(f64),
    Variable(Range),
}

impl Quantity {
    pub fn fixed(&self) -> Option<f64> {
        match self {
            Quantity::Fixed(v) => Some(*v),
            Quantity::Variable(_) => None,
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, Quantity::Variable(_))
    }

    pub fn min_value(&self) -> f64 {
        match self {
            Quantity::Fixed(v) => *v,
            Quantity::Variable(r) => r.lb(),
        }
    }

    pub fn max_value(&self) -> f64 {
        match self {
            Quantity::Fixed(v) => *v,
            Quantity::Variable(r) => r.ub(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchStatus {
    On,
    Off,
}

impl From<crate::case::Status> for SwitchStatus {
    fn from(status: crate::case::Status) -> Self {
        match status {
            crate::case::Status::On => SwitchStatus::On,
            crate::case::Status::Off => SwitchStatus::Off,
        }
    }
}

/// Switch status: fixed, or a variable over the allowed states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Fixed(SwitchStatus),
    Variable { var: Vec<SwitchStatus> },
}

impl StatusValue {
    pub fn binary() -> Self {
        StatusValue::Variable {
            var: vec![SwitchStatus::Off, SwitchStatus::On],
        }
    }

    pub fn fixed(&self) -> Option<SwitchStatus> {
        match self {
            StatusValue::Fixed(s) => Some(*s),
            StatusValue::Variable { .. } => None,
        }
    }
}

// =============================================================================
// Component payloads
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BusVoltage {
    pub magnitude: Range,
    pub angle: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub active: Quantity,
    pub reactive: Quantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Admittance {
    pub conductance: Quantity,
    pub susceptance: Quantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedAdmittance {
    pub conductance: f64,
    pub susceptance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impedance {
    pub resistance: f64,
    pub reactance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOutput {
    pub active: Range,
    pub reactive: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactiveOutput {
    pub reactive: Range,
}

/// One rung of a thermal or current limit ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    /// Seconds the limit may be sustained; infinite for the continuous rating
    #[serde(with = "bound")]
    pub duration: f64,
    pub min: f64,
    pub max: f64,
    pub report: String,
}

impl Limit {
    pub fn new(duration: f64, max: f64) -> Self {
        Limit {
            duration,
            min: 0.0,
            max,
            report: "off".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeImpedance {
    pub resistance: Range,
    pub reactance: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeAdmittance {
    pub conductance: Range,
    pub susceptance: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeTransform {
    pub tap_ratio: Range,
    pub angle_shift: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub tap_ratio: f64,
    /// Radians
    pub angle_shift: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapStep {
    pub position: i64,
    pub impedance: Impedance,
    pub shunt: FixedAdmittance,
    pub transform: Transform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapChanger {
    pub position: Range,
    pub impedance: RangeImpedance,
    pub shunt: RangeAdmittance,
    pub transform: RangeTransform,
    pub steps: Vec<TapStep>,
}

impl TapChanger {
    /// The step selected by a tap position setpoint.
    pub fn step(&self, position: i64) -> Option<&TapStep> {
        self.steps.iter().find(|s| s.position == position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcLosses {
    pub min: f64,
    pub max: f64,
    pub c_0: f64,
    pub c_1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NominalVoltage {
    pub lower_limit: f64,
    pub upper_limit: f64,
    /// kV
    pub nominal_value: f64,
    /// Original MATPOWER base kV when `nominal_value` had to be substituted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp_base_kv: Option<f64>,
}

// =============================================================================
// Components
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub link: String,
    pub voltage: BusVoltage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<bool>,
    /// Bus type hint that overrides the derived type when decoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matpower_bus_type: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub link: String,
    pub demand: Demand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shunt {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub link: String,
    pub shunt: Admittance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbase: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apf: Option<f64>,
    pub output: GeneratorOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchronousCondenser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbase: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apf: Option<f64>,
    pub output: ReactiveOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub link_1: String,
    pub link_2: String,
    pub status: StatusValue,
}

impl Switch {
    pub fn is_breaker(&self) -> bool {
        self.subtype.as_deref() == Some("breaker")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcLine {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub link_1: String,
    pub link_2: String,
    pub impedance: Impedance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shunt_1: Option<FixedAdmittance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shunt_2: Option<FixedAdmittance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_limits_1: Option<Vec<Limit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_limits_2: Option<Vec<Limit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_limits_1: Option<Vec<Limit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_limits_2: Option<Vec<Limit>>,
    /// Number of MATPOWER ratings that were populated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWindingTransformer {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub link_1: String,
    pub link_2: String,
    pub tap_changer: TapChanger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_limits_1: Option<Vec<Limit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_limits_2: Option<Vec<Limit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_limits_1: Option<Vec<Limit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_limits_2: Option<Vec<Limit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcLine {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub link_1: String,
    pub link_2: String,
    pub resistance: f64,
    pub losses_1: DcLosses,
    pub losses_2: DcLosses,
    pub output_1: ReactiveOutput,
    pub output_2: ReactiveOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageLevel {
    pub id: String,
    pub voltage: NominalVoltage,
    pub voltage_points: Vec<String>,
    pub voltage_level_components: BTreeMap<String, Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub id: String,
    pub substation_components: BTreeMap<String, Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Bus(Bus),
    Load(Load),
    Shunt(Shunt),
    Generator(Generator),
    SynchronousCondenser(SynchronousCondenser),
    Switch(Switch),
    AcLine(AcLine),
    TwoWindingTransformer(TwoWindingTransformer),
    DcLine(DcLine),
    VoltageLevel(VoltageLevel),
    Substation(Substation),
}

impl Component {
    pub fn id(&self) -> &str {
        match self {
            Component::Bus(c) => &c.id,
            Component::Load(c) => &c.id,
            Component::Shunt(c) => &c.id,
            Component::Generator(c) => &c.id,
            Component::SynchronousCondenser(c) => &c.id,
            Component::Switch(c) => &c.id,
            Component::AcLine(c) => &c.id,
            Component::TwoWindingTransformer(c) => &c.id,
            Component::DcLine(c) => &c.id,
            Component::VoltageLevel(c) => &c.id,
            Component::Substation(c) => &c.id,
        }
    }

    /// The `type` tag as written in documents
    pub fn type_name(&self) -> &'static str {
        match self {
            Component::Bus(_) => "bus",
            Component::Load(_) => "load",
            Component::Shunt(_) => "shunt",
            Component::Generator(_) => "generator",
            Component::SynchronousCondenser(_) => "synchronous_condenser",
            Component::Switch(_) => "switch",
            Component::AcLine(_) => "ac_line",
            Component::TwoWindingTransformer(_) => "two_winding_transformer",
            Component::DcLine(_) => "dc_line",
            Component::VoltageLevel(_) => "voltage_level",
            Component::Substation(_) => "substation",
        }
    }

    /// Voltage points this component connects to, in link order.
    pub fn links(&self) -> Vec<&str> {
        match self {
            Component::Bus(c) => vec![&c.link],
            Component::Load(c) => vec![&c.link],
            Component::Shunt(c) => vec![&c.link],
            Component::Generator(c) => vec![&c.link],
            Component::SynchronousCondenser(c) => vec![&c.link],
            Component::Switch(c) => vec![&c.link_1, &c.link_2],
            Component::AcLine(c) => vec![&c.link_1, &c.link_2],
            Component::TwoWindingTransformer(c) => vec![&c.link_1, &c.link_2],
            Component::DcLine(c) => vec![&c.link_1, &c.link_2],
            Component::VoltageLevel(_) | Component::Substation(_) => Vec::new(),
        }
    }

    pub fn has_link(&self) -> bool {
        !self.links().is_empty()
    }

    /// Only switches carry an on/off status variable
    pub fn has_status(&self) -> bool {
        matches!(self, Component::Switch(_))
    }

    /// Whether operating values for this component live in a mapping layer
    pub fn has_setpoint(&self) -> bool {
        matches!(
            self,
            Component::Bus(_)
                | Component::Load(_)
                | Component::Generator(_)
                | Component::SynchronousCondenser(_)
                | Component::TwoWindingTransformer(_)
                | Component::DcLine(_)
        )
    }

    /// Nested component map of containers
    pub fn children(&self) -> Option<&BTreeMap<String, Component>> {
        match self {
            Component::VoltageLevel(vl) => Some(&vl.voltage_level_components),
            Component::Substation(ss) => Some(&ss.substation_components),
            _ => None,
        }
    }

    /// Return the component with every link rewritten by `f`.
    pub fn map_links(self, mut f: impl FnMut(String) -> String) -> Self {
        match self {
            Component::Bus(mut c) => {
                c.link = f(c.link);
                Component::Bus(c)
            }
            Component::Load(mut c) => {
                c.link = f(c.link);
                Component::Load(c)
            }
            Component::Shunt(mut c) => {
                c.link = f(c.link);
                Component::Shunt(c)
            }
            Component::Generator(mut c) => {
                c.link = f(c.link);
                Component::Generator(c)
            }
            Component::SynchronousCondenser(mut c) => {
                c.link = f(c.link);
                Component::SynchronousCondenser(c)
            }
            Component::Switch(mut c) => {
                c.link_1 = f(c.link_1);
                c.link_2 = f(c.link_2);
                Component::Switch(c)
            }
            Component::AcLine(mut c) => {
                c.link_1 = f(c.link_1);
                c.link_2 = f(c.link_2);
                Component::AcLine(c)
            }
            Component::TwoWindingTransformer(mut c) => {
                c.link_1 = f(c.link_1);
                c.link_2 = f(c.link_2);
                Component::TwoWindingTransformer(c)
            }
            Component::DcLine(mut c) => {
                c.link_1 = f(c.link_1);
                c.link_2 = f(c.link_2);
                Component::DcLine(c)
            }
            container @ (Component::VoltageLevel(_) | Component::Substation(_)) => container,
        }
    }
}

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: String,
    pub id: String,
    pub per_unit: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_base_mva")]
    pub base_mva: f64,
    pub components: BTreeMap<String, Component>,
}

fn default_base_mva() -> f64 {
    100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Area,
    Zone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "type")]
    pub kind: GroupKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub component_ids: Vec<String>,
}

/// One mapping layer: path (`<component>/<field>`) to value
pub type Mapping = BTreeMap<String, serde_json::Value>;

pub const STARTING_POINTS: &str = "starting_points";
pub const BREAKERS_ASSIGNMENT: &str = "breakers_assignment";

/// Hierarchical cost function of one generator output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CostFunction {
    /// Coefficients lowest degree first, per-unit input
    Polynomial {
        input: String,
        coefficients: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        startup: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shutdown: Option<f64>,
    },
    /// `[power, cost]` breakpoints, per-unit power
    PiecewiseLinear {
        input: String,
        points: Vec<[f64; 2]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        startup: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shutdown: Option<f64>,
    },
}

impl CostFunction {
    pub fn input(&self) -> &str {
        match self {
            CostFunction::Polynomial { input, .. } | CostFunction::PiecewiseLinear { input, .. } => {
                input
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    #[serde(default)]
    pub operational_costs: BTreeMap<String, CostFunction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrgDocument {
    pub grg_version: String,
    #[serde(default)]
    pub units: BTreeMap<String, String>,
    pub network: Network,
    #[serde(default)]
    pub groups: BTreeMap<String, Group>,
    #[serde(default)]
    pub mappings: BTreeMap<String, Mapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<Market>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_constraints: Option<BTreeMap<String, Range>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_range_infinite_bounds() {
        let r = Range::unbounded();
        let v = serde_json::to_value(r).unwrap();
        assert_eq!(v, json!({"var": {"lb": "-Inf", "ub": "Inf"}}));

        let back: Range = serde_json::from_value(v).unwrap();
        assert!(back.lb().is_infinite() && back.lb() < 0.0);
        assert!(back.ub().is_infinite() && back.ub() > 0.0);
    }

    #[test]
    fn test_range_accepts_integers() {
        let r: Range = serde_json::from_value(json!({"var": {"lb": 0, "ub": 2}})).unwrap();
        assert_eq!(r, Range::new(0.0, 2.0));
    }

    #[test]
    fn test_quantity_untagged() {
        let fixed: Quantity = serde_json::from_value(json!(0.5)).unwrap();
        assert_eq!(fixed.fixed(), Some(0.5));

        let var: Quantity =
            serde_json::from_value(json!({"var": {"lb": 0.0, "ub": 1.0}})).unwrap();
        assert!(var.is_abstract());
        assert_eq!(var.max_value(), 1.0);
    }

    #[test]
    fn test_component_tagging() {
        let value = json!({
            "type": "switch",
            "id": "switch_01",
            "subtype": "breaker",
            "link_1": "voltage_point_1",
            "link_2": "voltage_point_switch_01",
            "status": {"var": ["off", "on"]}
        });
        let comp: Component = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(comp.type_name(), "switch");
        assert!(comp.has_status());
        assert!(!comp.has_setpoint());
        assert_eq!(comp.links(), vec!["voltage_point_1", "voltage_point_switch_01"]);
        assert_eq!(serde_json::to_value(&comp).unwrap(), value);
    }

    #[test]
    fn test_fixed_switch_status() {
        let status: StatusValue = serde_json::from_value(json!("off")).unwrap();
        assert_eq!(status.fixed(), Some(SwitchStatus::Off));
        assert_eq!(StatusValue::binary().fixed(), None);
    }

    #[test]
    fn test_map_links_is_pure() {
        let load = Component::Load(Load {
            id: "load_1".to_string(),
            subtype: None,
            link: "voltage_point_1".to_string(),
            demand: Demand {
                active: Quantity::Fixed(0.1),
                reactive: Quantity::Fixed(0.0),
            },
        });
        let moved = load.clone().map_links(|_| "voltage_point_switch_1".to_string());
        assert_eq!(load.links(), vec!["voltage_point_1"]);
        assert_eq!(moved.links(), vec!["voltage_point_switch_1"]);
    }

    #[test]
    fn test_limit_duration() {
        let limits = vec![Limit::new(f64::INFINITY, 4.0), Limit::new(900.0, 5.0)];
        let v = serde_json::to_value(&limits).unwrap();
        assert_eq!(v[0]["duration"], json!("Inf"));
        assert_eq!(v[1]["duration"], json!(900.0));
    }

    #[test]
    fn test_cost_function_tag() {
        let cost: CostFunction = serde_json::from_value(json!({
            "type": "polynomial",
            "input": "gen_1/output/active",
            "coefficients": [0.0, 1400.0, 0.0]
        }))
        .unwrap();
        assert_eq!(cost.input(), "gen_1/output/active");
    }
}
