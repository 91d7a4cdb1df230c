//! Branch table: ac lines and two-winding transformers.

use std::collections::BTreeMap;

use mp2grg_core::case::{Branch, Bus};
use mp2grg_core::grg::{Limit, TwoWindingTransformer};
use mp2grg_core::units::Radians;
use mp2grg_core::{Diagnostics, TranslateError, TranslateResult};

use super::mapping::scalar;
use super::numbering::index_lookup;
use super::DecodeContext;
use crate::encode::records::{EMERGENCY, LONG_TERM, SHORT_TERM};

const CATEGORY: &str = "decode";

/// Angle difference bounds used when a branch has no constraint.
pub const DEFAULT_ANGLE_LIMIT: f64 = 60.0;

/// Decode lines and transformers, sorted by index.
///
/// Transformers without a usable tap position are skipped with a warning.
pub fn decode_branches(
    ctx: &DecodeContext<'_>,
    buses: &[Bus],
    diag: &mut Diagnostics,
) -> TranslateResult<Vec<Branch>> {
    let lines = &ctx.cbt.ac_line;
    let transformers = &ctx.cbt.two_winding_transformer;
    let index = index_lookup(&[
        lines.iter().map(|l| (l.id.as_str(), l.source_id.as_deref())).collect(),
        transformers
            .iter()
            .map(|t| (t.id.as_str(), t.source_id.as_deref()))
            .collect(),
    ]);
    let buses: BTreeMap<usize, &Bus> = buses.iter().map(|b| (b.bus_i, b)).collect();

    let mut branches = Vec::with_capacity(lines.len() + transformers.len());

    for line in lines {
        let mut branch = endpoints(ctx, &index, &line.id, (&line.link_1, &line.link_2))?;
        branch.br_r = line.impedance.resistance;
        branch.br_x = line.impedance.reactance;

        let shunts = [line.shunt_1, line.shunt_2];
        if shunts.iter().flatten().any(|s| s.conductance != 0.0) {
            diag.add_warning_with_entity(
                CATEGORY,
                "line shunt conductance is not supported, it will be ignored",
                &line.id,
            );
        }
        let susceptance: Vec<f64> = shunts.iter().map(|s| s.map_or(0.0, |s| s.susceptance)).collect();
        if susceptance[0] != susceptance[1] {
            diag.add_warning_with_entity(
                CATEGORY,
                "asymmetric line charging is not supported, using the total",
                &line.id,
            );
        }
        branch.br_b = susceptance.iter().sum();

        let limits = LimitSet {
            thermal: line.thermal_limits_1.as_deref(),
            current: line.current_limits_1.as_deref(),
            rates: line.rates,
        };
        set_ratings(ctx, &mut branch, &limits, &buses, &line.id, diag);
        set_angles(ctx, &mut branch, &line.id);
        branches.push(branch);
    }

    for transformer in transformers {
        let Some(mut branch) = transformer_branch(ctx, &index, transformer, diag)? else {
            continue;
        };
        let limits = LimitSet {
            thermal: transformer.thermal_limits_1.as_deref(),
            current: transformer.current_limits_1.as_deref(),
            rates: transformer.rates,
        };
        set_ratings(ctx, &mut branch, &limits, &buses, &transformer.id, diag);
        set_angles(ctx, &mut branch, &transformer.id);
        branches.push(branch);
    }

    branches.sort_by_key(|b| b.index);
    Ok(branches)
}

/// A branch with index, buses and status filled in and everything else zero.
fn endpoints(
    ctx: &DecodeContext<'_>,
    index: &BTreeMap<&str, usize>,
    id: &str,
    links: (&str, &str),
) -> TranslateResult<Branch> {
    let index = index
        .get(id)
        .copied()
        .ok_or_else(|| TranslateError::internal(format!("branch {} has no index", id)))?;
    let on = ctx.is_active(links.0) && ctx.is_active(links.1);
    Ok(Branch {
        index,
        f_bus: ctx.bus_number(links.0)?,
        t_bus: ctx.bus_number(links.1)?,
        br_r: 0.0,
        br_x: 0.0,
        br_b: 0.0,
        rate_a: 0.0,
        rate_b: 0.0,
        rate_c: 0.0,
        tap: 0.0,
        shift: 0.0,
        br_status: i32::from(on),
        angmin: -DEFAULT_ANGLE_LIMIT,
        angmax: DEFAULT_ANGLE_LIMIT,
    })
}

fn transformer_branch(
    ctx: &DecodeContext<'_>,
    index: &BTreeMap<&str, usize>,
    transformer: &TwoWindingTransformer,
    diag: &mut Diagnostics,
) -> TranslateResult<Option<Branch>> {
    let key = format!("{}/tap_changer/position", transformer.id);
    let Some(position) = scalar(&ctx.mapping, &key).filter(|p| p.fract() == 0.0) else {
        diag.add_warning_with_entity(
            CATEGORY,
            "no tap changer position found, skipping transformer",
            &transformer.id,
        );
        return Ok(None);
    };
    let Some(step) = transformer.tap_changer.step(position as i64) else {
        diag.add_warning_with_entity(
            CATEGORY,
            &format!("no tap changer step at position {}, skipping transformer", position),
            &transformer.id,
        );
        return Ok(None);
    };

    let mut branch = endpoints(
        ctx,
        index,
        &transformer.id,
        (&transformer.link_1, &transformer.link_2),
    )?;
    branch.br_r = step.impedance.resistance;
    branch.br_x = step.impedance.reactance;
    branch.br_b = step.shunt.susceptance;
    branch.tap = step.transform.tap_ratio;
    branch.shift = ctx.round(Radians(step.transform.angle_shift).to_degrees().value());
    Ok(Some(branch))
}

/// Rating ladders of the from side of a branch.
struct LimitSet<'a> {
    thermal: Option<&'a [Limit]>,
    current: Option<&'a [Limit]>,
    rates: Option<u8>,
}

/// Long-term, short-term and emergency maxima of a ladder.
///
/// A missing short-term entry repeats the long-term one and a missing
/// emergency entry repeats the short-term one.
fn ladder(limits: &[Limit]) -> [f64; 3] {
    let at = |duration: f64| limits.iter().find(|l| l.duration == duration).map(|l| l.max);
    let a = at(LONG_TERM).unwrap_or(f64::INFINITY);
    let b = at(SHORT_TERM).unwrap_or(a);
    let c = at(EMERGENCY).unwrap_or(b);
    [a, b, c]
}

fn set_ratings(
    ctx: &DecodeContext<'_>,
    branch: &mut Branch,
    limits: &LimitSet<'_>,
    buses: &BTreeMap<usize, &Bus>,
    id: &str,
    diag: &mut Diagnostics,
) {
    let thermal = limits.thermal.map(ladder);
    let current = limits.current.map(|currents| {
        // current limits are scaled by the highest voltage allowed at either end
        let vmax = [branch.f_bus, branch.t_bus]
            .iter()
            .filter_map(|b| buses.get(b).map(|bus| bus.vmax))
            .fold(f64::NEG_INFINITY, f64::max);
        let vmax = if vmax.is_finite() { vmax } else { 1.0 };
        ladder(currents).map(|c| c * vmax)
    });

    let mut rates = match (thermal, current) {
        (Some(t), Some(c)) => [t[0].min(c[0]), t[1].min(c[1]), t[2].min(c[2])],
        (Some(r), None) | (None, Some(r)) => r,
        (None, None) => {
            diag.add_warning_with_entity(
                "rating",
                "no thermal or current limits found, ratings set to 0",
                id,
            );
            [f64::INFINITY; 3]
        }
    };

    if let Some(count) = limits.rates {
        for rate in rates.iter_mut().skip(usize::from(count)) {
            *rate = 0.0;
        }
    }
    let [a, b, c] = rates.map(|r| if r.is_finite() { ctx.physical(r) } else { 0.0 });
    branch.rate_a = a;
    branch.rate_b = b;
    branch.rate_c = c;
}

fn set_angles(ctx: &DecodeContext<'_>, branch: &mut Branch, id: &str) {
    let key = format!("{}/angle_difference", id);
    if let Some(range) = ctx
        .doc
        .operation_constraints
        .as_ref()
        .and_then(|constraints| constraints.get(&key))
    {
        branch.angmin = ctx.round(Radians(range.lb()).to_degrees().value());
        branch.angmax = ctx.round(Radians(range.ub()).to_degrees().value());
    }
}
