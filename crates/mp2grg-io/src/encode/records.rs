//! Translation of single flat records into document components.
//!
//! These functions only shape data; identifiers and voltage points are
//! resolved by the caller, and links still point at bus voltage points
//! (breakers are inserted afterwards).

use mp2grg_core::case::{self, BusType};
use mp2grg_core::grg::{
    AcLine, Admittance, BusVoltage, Component, DcLine, DcLosses, Demand, FixedAdmittance,
    Generator, GeneratorOutput, Impedance, Limit, Load, NominalVoltage, Quantity, Range,
    RangeAdmittance, RangeImpedance, RangeTransform, ReactiveOutput, Shunt, SynchronousCondenser,
    TapChanger, TapStep, Transform, TwoWindingTransformer, VoltageLevel,
};
use mp2grg_core::units::Degrees;
use mp2grg_core::{BaseMva, Diagnostics};

/// Durations of the three rating tiers, in seconds.
pub const LONG_TERM: f64 = f64::INFINITY;
pub const SHORT_TERM: f64 = 14400.0;
pub const EMERGENCY: f64 = 900.0;

/// Voltage level of one bus, holding only the bus voltage point for now.
pub fn voltage_level(
    bus: &case::Bus,
    id: &str,
    voltage_point: &str,
    diag: &mut Diagnostics,
) -> VoltageLevel {
    let (nominal_value, mp_base_kv) = if bus.base_kv == 0.0 {
        diag.add_warning_with_entity(
            "encode",
            &format!(
                "bus {} has a base kV of 0, using a nominal voltage of 1.0",
                bus.bus_i
            ),
            id,
        );
        (1.0, Some(0.0))
    } else {
        (bus.base_kv, None)
    };

    VoltageLevel {
        id: id.to_string(),
        voltage: NominalVoltage {
            lower_limit: bus.vmin,
            upper_limit: bus.vmax,
            nominal_value,
            mp_base_kv,
        },
        voltage_points: vec![voltage_point.to_string()],
        voltage_level_components: Default::default(),
    }
}

pub fn bus(bus: &case::Bus, id: &str, voltage_point: &str) -> Component {
    Component::Bus(mp2grg_core::grg::Bus {
        id: id.to_string(),
        source_id: Some(bus.bus_i.to_string()),
        link: voltage_point.to_string(),
        voltage: BusVoltage {
            magnitude: Range::new(bus.vmin, bus.vmax),
            angle: Range::unbounded(),
        },
        reference: (bus.bus_type == BusType::Reference).then_some(true),
        matpower_bus_type: None,
    })
}

pub fn load(
    bus: &case::Bus,
    id: &str,
    voltage_point: &str,
    base: BaseMva,
    omit_subtype: bool,
) -> Component {
    Component::Load(Load {
        id: id.to_string(),
        subtype: (!omit_subtype).then(|| "withdrawal".to_string()),
        link: voltage_point.to_string(),
        demand: Demand {
            active: Quantity::Fixed(base.to_pu(bus.pd)),
            reactive: Quantity::Fixed(base.to_pu(bus.qd)),
        },
    })
}

pub fn shunt(
    bus: &case::Bus,
    id: &str,
    voltage_point: &str,
    base: BaseMva,
    omit_subtype: bool,
) -> Component {
    let subtype = if bus.bs >= 0.0 { "inductor" } else { "capacitor" };
    Component::Shunt(Shunt {
        id: id.to_string(),
        subtype: (!omit_subtype).then(|| subtype.to_string()),
        link: voltage_point.to_string(),
        shunt: Admittance {
            conductance: Quantity::Fixed(base.to_pu(bus.gs)),
            susceptance: Quantity::Fixed(base.to_pu(bus.bs)),
        },
    })
}

/// A generator, or a synchronous condenser when it cannot produce active power.
pub fn generator(gen: &case::Generator, id: &str, voltage_point: &str, base: BaseMva) -> Component {
    let reactive = Range::new(base.to_pu(gen.qmin), base.to_pu(gen.qmax));
    let apf = (gen.apf != 0.0).then_some(gen.apf);
    if gen.is_synchronous_condenser() {
        Component::SynchronousCondenser(SynchronousCondenser {
            id: id.to_string(),
            source_id: Some(gen.index.to_string()),
            link: voltage_point.to_string(),
            mbase: Some(gen.mbase),
            vg: Some(gen.vg),
            apf,
            output: ReactiveOutput { reactive },
        })
    } else {
        Component::Generator(Generator {
            id: id.to_string(),
            source_id: Some(gen.index.to_string()),
            link: voltage_point.to_string(),
            mbase: Some(gen.mbase),
            vg: Some(gen.vg),
            apf,
            output: GeneratorOutput {
                active: Range::new(base.to_pu(gen.pmin), base.to_pu(gen.pmax)),
                reactive,
            },
        })
    }
}

/// Rating ladder of a branch in per unit.
///
/// The long-term rating is always present; the short-term and emergency
/// ratings follow only when they raise the previous tier.
pub fn thermal_limits(branch: &case::Branch, base: BaseMva) -> Vec<Limit> {
    let rate_a = base.to_pu(branch.rate_a);
    let rate_b = base.to_pu(branch.rate_b);
    let rate_c = base.to_pu(branch.rate_c);

    let mut limits = vec![Limit::new(LONG_TERM, rate_a)];
    if rate_b != 0.0 && rate_b > rate_a {
        limits.push(Limit::new(SHORT_TERM, rate_b));
    }
    if rate_c != 0.0 && rate_c > rate_a && (limits.len() == 1 || rate_c > rate_b) {
        limits.push(Limit::new(EMERGENCY, rate_c));
    }
    limits
}

pub fn ac_line(
    branch: &case::Branch,
    id: &str,
    links: (&str, &str),
    base: BaseMva,
    omit_subtype: bool,
) -> Component {
    let limits = thermal_limits(branch, base);
    let half_charging = FixedAdmittance {
        conductance: 0.0,
        susceptance: branch.br_b / 2.0,
    };
    Component::AcLine(AcLine {
        id: id.to_string(),
        source_id: Some(branch.index.to_string()),
        subtype: (!omit_subtype).then(|| "overhead".to_string()),
        link_1: links.0.to_string(),
        link_2: links.1.to_string(),
        impedance: Impedance {
            resistance: branch.br_r,
            reactance: branch.br_x,
        },
        shunt_1: Some(half_charging),
        shunt_2: Some(half_charging),
        thermal_limits_1: Some(limits.clone()),
        thermal_limits_2: Some(limits),
        current_limits_1: None,
        current_limits_2: None,
        rates: Some(branch.rates()),
    })
}

/// A transformer with a single fixed tap step at position 0.
pub fn transformer(branch: &case::Branch, id: &str, links: (&str, &str), base: BaseMva) -> Component {
    // a phase shifter written with tap 0 means unity ratio
    let tap_ratio = if branch.tap == 0.0 { 1.0 } else { branch.tap };
    let angle_shift = Degrees(branch.shift).to_radians().value();
    let limits = thermal_limits(branch, base);

    Component::TwoWindingTransformer(TwoWindingTransformer {
        id: id.to_string(),
        source_id: Some(branch.index.to_string()),
        link_1: links.0.to_string(),
        link_2: links.1.to_string(),
        tap_changer: TapChanger {
            position: Range::fixed(0.0),
            impedance: RangeImpedance {
                resistance: Range::fixed(branch.br_r),
                reactance: Range::fixed(branch.br_x),
            },
            shunt: RangeAdmittance {
                conductance: Range::fixed(0.0),
                susceptance: Range::fixed(branch.br_b),
            },
            transform: RangeTransform {
                tap_ratio: Range::fixed(tap_ratio),
                angle_shift: Range::fixed(angle_shift),
            },
            steps: vec![TapStep {
                position: 0,
                impedance: Impedance {
                    resistance: branch.br_r,
                    reactance: branch.br_x,
                },
                shunt: FixedAdmittance {
                    conductance: 0.0,
                    susceptance: branch.br_b,
                },
                transform: Transform {
                    tap_ratio,
                    angle_shift,
                },
            }],
        },
        thermal_limits_1: Some(limits.clone()),
        thermal_limits_2: Some(limits),
        current_limits_1: None,
        current_limits_2: None,
        rates: Some(branch.rates()),
    })
}

/// Per-terminal active power bounds `([min_1, max_1], [min_2, max_2])` in MW.
///
/// The flat record bounds the sending end only, with the receiving end
/// given by `p_2 = loss0 - p_1 (1 - loss1)`. Negative bounds describe flow
/// in the reverse direction and are solved for on the other terminal.
pub fn dc_line_bounds(dc: &case::DcLine) -> ([f64; 2], [f64; 2]) {
    let forward = |p1: f64| dc.loss0 - p1 * (1.0 - dc.loss1);
    let backward = |p2: f64| (-p2 + dc.loss0) / (1.0 - dc.loss1);

    match (dc.pmin >= 0.0, dc.pmax >= 0.0) {
        (true, true) => (
            [dc.pmin, dc.pmax],
            [forward(dc.pmax), forward(dc.pmin)],
        ),
        (true, false) => {
            let min_2 = dc.pmax;
            ([dc.pmin, backward(min_2)], [min_2, forward(dc.pmin)])
        }
        (false, true) => {
            let max_2 = -dc.pmin;
            ([backward(max_2), dc.pmax], [forward(dc.pmax), max_2])
        }
        (false, false) => {
            let max_2 = -dc.pmin;
            let min_2 = dc.pmax;
            ([backward(max_2), backward(min_2)], [min_2, max_2])
        }
    }
}

pub fn dc_line(dc: &case::DcLine, id: &str, links: (&str, &str), base: BaseMva) -> Component {
    let ([min_1, max_1], [min_2, max_2]) = dc_line_bounds(dc);
    Component::DcLine(DcLine {
        id: id.to_string(),
        source_id: Some(dc.index.to_string()),
        link_1: links.0.to_string(),
        link_2: links.1.to_string(),
        resistance: 0.0,
        losses_1: DcLosses {
            min: base.to_pu(min_1),
            max: base.to_pu(max_1),
            c_0: 0.0,
            c_1: 0.0,
        },
        losses_2: DcLosses {
            min: base.to_pu(min_2),
            max: base.to_pu(max_2),
            c_0: dc.loss0,
            c_1: dc.loss1,
        },
        output_1: ReactiveOutput {
            reactive: Range::new(base.to_pu(dc.qminf), base.to_pu(dc.qmaxf)),
        },
        output_2: ReactiveOutput {
            reactive: Range::new(base.to_pu(dc.qmint), base.to_pu(dc.qmaxt)),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp2grg_core::case::fixtures;

    const BASE: BaseMva = BaseMva(100.0);

    fn dcline(pmin: f64, pmax: f64) -> case::DcLine {
        case::DcLine {
            index: 0,
            f_bus: 1,
            t_bus: 2,
            br_status: 1,
            pf: 10.0,
            pt: 8.9,
            qf: 0.0,
            qt: 0.0,
            vf: 1.01,
            vt: 1.0,
            pmin,
            pmax,
            qminf: -10.0,
            qmaxf: 10.0,
            qmint: -10.0,
            qmaxt: 10.0,
            loss0: 1.0,
            loss1: 0.5,
        }
    }

    #[test]
    fn test_bus_reference_flag() {
        let reference = fixtures::bus(4, BusType::Reference);
        match bus(&reference, "bus_4", "voltage_point_4") {
            Component::Bus(b) => {
                assert_eq!(b.reference, Some(true));
                assert_eq!(b.source_id.as_deref(), Some("4"));
                assert_eq!(b.voltage.magnitude, Range::new(0.9, 1.1));
                assert!(b.voltage.angle.lb().is_infinite());
            }
            other => panic!("unexpected {other:?}"),
        }
        match bus(&fixtures::bus(1, BusType::Pv), "bus_1", "vp") {
            Component::Bus(b) => assert_eq!(b.reference, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_zero_base_kv_substitution() {
        let mut b = fixtures::bus(3, BusType::Pq);
        b.base_kv = 0.0;
        let mut diag = Diagnostics::new();
        let vl = voltage_level(&b, "voltage_level_3", "voltage_point_3", &mut diag);
        assert_eq!(vl.voltage.nominal_value, 1.0);
        assert_eq!(vl.voltage.mp_base_kv, Some(0.0));
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_shunt_subtype_by_sign() {
        let mut b = fixtures::bus(1, BusType::Pq);
        b.bs = -19.0;
        match shunt(&b, "shunt_1", "vp", BASE, false) {
            Component::Shunt(s) => {
                assert_eq!(s.subtype.as_deref(), Some("capacitor"));
                assert_eq!(s.shunt.susceptance, Quantity::Fixed(-0.19));
            }
            other => panic!("unexpected {other:?}"),
        }
        b.bs = 0.0;
        b.gs = 1.0;
        match shunt(&b, "shunt_1", "vp", BASE, false) {
            Component::Shunt(s) => assert_eq!(s.subtype.as_deref(), Some("inductor")),
            other => panic!("unexpected {other:?}"),
        }
        match shunt(&b, "shunt_1", "vp", BASE, true) {
            Component::Shunt(s) => assert_eq!(s.subtype, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_condenser_has_reactive_output_only() {
        let mut gen = fixtures::generator(2, 3);
        gen.pg = 0.0;
        gen.pmax = 0.0;
        gen.pmin = 0.0;
        gen.apf = 0.2;
        match generator(&gen, "sync_cond_1", "vp", BASE) {
            Component::SynchronousCondenser(c) => {
                assert_eq!(c.output.reactive, Range::new(-0.3, 0.3));
                assert_eq!(c.apf, Some(0.2));
                assert_eq!(c.source_id.as_deref(), Some("2"));
            }
            other => panic!("unexpected {other:?}"),
        }
        match generator(&fixtures::generator(0, 1), "gen_1", "vp", BASE) {
            Component::Generator(g) => {
                assert_eq!(g.output.active, Range::new(0.0, 0.4));
                assert_eq!(g.apf, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_limit_ladder() {
        let mut branch = fixtures::branch(0, 1, 2);
        branch.rate_a = 100.0;
        branch.rate_b = 120.0;
        branch.rate_c = 150.0;
        let limits = thermal_limits(&branch, BASE);
        let durations: Vec<f64> = limits.iter().map(|l| l.duration).collect();
        assert_eq!(durations, vec![LONG_TERM, SHORT_TERM, EMERGENCY]);
        assert_eq!(limits[2].max, 1.5);

        // equal tiers are dropped
        branch.rate_b = 100.0;
        branch.rate_c = 100.0;
        assert_eq!(thermal_limits(&branch, BASE).len(), 1);

        // emergency above long-term but below short-term is dropped
        branch.rate_b = 150.0;
        branch.rate_c = 120.0;
        assert_eq!(thermal_limits(&branch, BASE).len(), 2);

        // without a short-term tier the emergency tier follows long-term
        branch.rate_b = 0.0;
        let limits = thermal_limits(&branch, BASE);
        assert_eq!(limits.len(), 2);
        assert_eq!(limits[1].duration, EMERGENCY);
    }

    #[test]
    fn test_phase_shifter_with_zero_tap() {
        let mut branch = fixtures::branch(0, 1, 2);
        branch.tap = 0.0;
        branch.shift = 30.0;
        match transformer(&branch, "transformer_1", ("a", "b"), BASE) {
            Component::TwoWindingTransformer(t) => {
                let step = t.tap_changer.step(0).unwrap();
                assert_eq!(step.transform.tap_ratio, 1.0);
                assert!((step.transform.angle_shift - std::f64::consts::PI / 6.0).abs() < 1e-12);
                assert_eq!(step.shunt.susceptance, 0.02);
                assert_eq!(t.tap_changer.position, Range::fixed(0.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ac_line_splits_charging() {
        match ac_line(&fixtures::branch(0, 1, 2), "line_1", ("a", "b"), BASE, false) {
            Component::AcLine(l) => {
                assert_eq!(l.shunt_1.unwrap().susceptance, 0.01);
                assert_eq!(l.subtype.as_deref(), Some("overhead"));
                assert_eq!(l.rates, Some(3));
                assert_eq!(Component::AcLine(l.clone()).links(), vec!["a", "b"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_dc_line_bound_quadrants() {
        // forward flow
        let (one, two) = dc_line_bounds(&dcline(2.0, 10.0));
        assert_eq!(one, [2.0, 10.0]);
        assert_eq!(two, [1.0 - 10.0 * 0.5, 1.0 - 2.0 * 0.5]);

        // reverse flow
        let (one, two) = dc_line_bounds(&dcline(-10.0, -2.0));
        assert_eq!(two, [-2.0, 10.0]);
        assert_eq!(one, [(-10.0 + 1.0) / 0.5, (2.0 + 1.0) / 0.5]);

        // both directions
        let (one, two) = dc_line_bounds(&dcline(-4.0, 6.0));
        assert_eq!(one, [(-4.0 + 1.0) / 0.5, 6.0]);
        assert_eq!(two, [1.0 - 6.0 * 0.5, 4.0]);

        let (one, two) = dc_line_bounds(&dcline(3.0, -1.0));
        assert_eq!(one, [3.0, (1.0 + 1.0) / 0.5]);
        assert_eq!(two, [-1.0, 1.0 - 3.0 * 0.5]);
    }

    #[test]
    fn test_dc_line_per_unit() {
        match dc_line(&dcline(0.0, 100.0), "dc_line_1", ("a", "b"), BASE) {
            Component::DcLine(d) => {
                assert_eq!(d.losses_1.max, 1.0);
                assert_eq!(d.losses_2.c_0, 1.0);
                assert_eq!(d.losses_2.c_1, 0.5);
                assert_eq!(d.losses_1.c_1, 0.0);
                assert_eq!(d.output_2.reactive, Range::new(-0.1, 0.1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
