//! Generator and cost tables.

use std::collections::BTreeMap;

use mp2grg_core::case::{Generator, GeneratorCost};
use mp2grg_core::{Diagnostics, TranslateError, TranslateResult};

use super::mapping::field;
use super::numbering::index_lookup;
use super::DecodeContext;
use crate::cost::{
    cost_key, function_to_cost, losses_cost, zero_cost, ACTIVE_INPUT_SUFFIX, REACTIVE_INPUT_SUFFIX,
};

/// Decode generators and condensers, sorted by index, with their costs.
///
/// Costs come from the market when it holds any function. Otherwise every
/// generator gets a unit linear cost if `add_costs` is set, and the case
/// has no cost table if not.
pub fn decode_generators(
    ctx: &DecodeContext<'_>,
    add_costs: bool,
    diag: &mut Diagnostics,
) -> TranslateResult<(Vec<Generator>, Option<Vec<GeneratorCost>>)> {
    let generators = &ctx.cbt.generator;
    let condensers = &ctx.cbt.synchronous_condenser;
    let index = index_lookup(&[
        generators
            .iter()
            .map(|g| (g.id.as_str(), g.source_id.as_deref()))
            .collect(),
        condensers
            .iter()
            .map(|c| (c.id.as_str(), c.source_id.as_deref()))
            .collect(),
    ]);
    let index_of = |id: &str| {
        index
            .get(id)
            .copied()
            .ok_or_else(|| TranslateError::internal(format!("generator {} has no index", id)))
    };

    let mut records = Vec::with_capacity(generators.len() + condensers.len());
    // id, index, condenser
    let mut ids: Vec<(&str, usize, bool)> = Vec::with_capacity(records.capacity());

    for g in generators {
        let output = format!("{}/output", g.id);
        let record = Generator {
            index: index_of(&g.id)?,
            gen_bus: ctx.bus_number(&g.link)?,
            pg: ctx.physical(field(&ctx.mapping, &output, "active").unwrap_or(0.0)),
            qg: ctx.physical(field(&ctx.mapping, &output, "reactive").unwrap_or(0.0)),
            qmax: ctx.physical(g.output.reactive.ub()),
            qmin: ctx.physical(g.output.reactive.lb()),
            vg: g.vg.unwrap_or(1.0),
            mbase: g.mbase.unwrap_or(ctx.base.value()),
            gen_status: i32::from(ctx.is_active(&g.link)),
            pmax: ctx.physical(g.output.active.ub()),
            pmin: ctx.physical(g.output.active.lb()),
            apf: g.apf.unwrap_or(0.0),
        };
        ids.push((g.id.as_str(), record.index, false));
        records.push(record);
    }

    for c in condensers {
        let output = format!("{}/output", c.id);
        let record = Generator {
            index: index_of(&c.id)?,
            gen_bus: ctx.bus_number(&c.link)?,
            pg: 0.0,
            qg: ctx.physical(field(&ctx.mapping, &output, "reactive").unwrap_or(0.0)),
            qmax: ctx.physical(c.output.reactive.ub()),
            qmin: ctx.physical(c.output.reactive.lb()),
            vg: c.vg.unwrap_or(0.0),
            mbase: c.mbase.unwrap_or(ctx.base.value()),
            gen_status: i32::from(ctx.is_active(&c.link)),
            pmax: 0.0,
            pmin: 0.0,
            apf: c.apf.unwrap_or(0.0),
        };
        ids.push((c.id.as_str(), record.index, true));
        records.push(record);
    }

    records.sort_by_key(|g| g.index);

    let market = ctx
        .doc
        .market
        .as_ref()
        .map(|m| &m.operational_costs)
        .filter(|costs| !costs.is_empty());

    let costs = match market {
        Some(functions) => Some(market_costs(ctx, functions, &ids, diag)?),
        None if add_costs => Some(records.iter().map(|g| losses_cost(g.index)).collect()),
        None => None,
    };

    Ok((records, costs))
}

/// One active cost row per generator, then reactive rows offset by the
/// generator count.
fn market_costs(
    ctx: &DecodeContext<'_>,
    functions: &BTreeMap<String, mp2grg_core::grg::CostFunction>,
    ids: &[(&str, usize, bool)],
    diag: &mut Diagnostics,
) -> TranslateResult<Vec<GeneratorCost>> {
    let gen_count = ids.len();
    let mut costs = Vec::with_capacity(gen_count);

    for (id, index, condenser) in ids {
        match functions.get(&cost_key(id, false)) {
            Some(function) => costs.push(function_to_cost(
                function,
                *index,
                ACTIVE_INPUT_SUFFIX,
                ctx.base,
                ctx.precision,
            )?),
            None => {
                // condensers never carry an active cost
                if !condenser {
                    diag.add_warning_with_entity(
                        "cost",
                        "missing cost information, using a zero cost",
                        id,
                    );
                }
                costs.push(zero_cost(*index));
            }
        }
    }

    for (id, index, _) in ids {
        if let Some(function) = functions.get(&cost_key(id, true)) {
            costs.push(function_to_cost(
                function,
                index + gen_count,
                REACTIVE_INPUT_SUFFIX,
                ctx.base,
                ctx.precision,
            )?);
        }
    }

    costs.sort_by_key(|c| c.index);
    Ok(costs)
}
