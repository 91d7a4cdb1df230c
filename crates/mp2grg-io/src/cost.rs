//! Generator cost conversion between `gencost` rows and market cost functions.
//!
//! MATPOWER polynomial costs are stored highest degree first in physical
//! units ($/h as a function of MW). Market cost functions are lowest degree
//! first and take per-unit power as input, so coefficient `i` scales by
//! `base_mva^i`. Piecewise-linear breakpoints scale only their power
//! coordinate.

use mp2grg_core::case::{CostModelKind, GeneratorCost};
use mp2grg_core::grg::CostFunction;
use mp2grg_core::units::round_to;
use mp2grg_core::{BaseMva, TranslateError, TranslateResult};

pub const ACTIVE_INPUT_SUFFIX: &str = "/output/active";
pub const REACTIVE_INPUT_SUFFIX: &str = "/output/reactive";

/// Market key of a generator cost function.
pub fn cost_key(generator_id: &str, reactive: bool) -> String {
    if reactive {
        format!("{}_reactive_cost", generator_id)
    } else {
        generator_id.to_string()
    }
}

/// Setpoint path a cost function takes as input.
pub fn cost_input(generator_id: &str, reactive: bool) -> String {
    let suffix = if reactive {
        REACTIVE_INPUT_SUFFIX
    } else {
        ACTIVE_INPUT_SUFFIX
    };
    format!("{}{}", generator_id, suffix)
}

/// Convert a `gencost` row into a market cost function.
pub fn cost_to_function(cost: &GeneratorCost, base: BaseMva, input: String) -> CostFunction {
    let base = base.value();
    match cost.model {
        CostModelKind::Polynomial => {
            let coefficients = cost
                .cost
                .iter()
                .rev()
                .enumerate()
                .map(|(degree, c)| c * base.powi(degree as i32))
                .collect();
            CostFunction::Polynomial {
                input,
                coefficients,
                startup: Some(cost.startup),
                shutdown: Some(cost.shutdown),
            }
        }
        CostModelKind::PiecewiseLinear => {
            let points = cost
                .cost
                .chunks_exact(2)
                .map(|pair| [pair[0] / base, pair[1]])
                .collect();
            CostFunction::PiecewiseLinear {
                input,
                points,
                startup: Some(cost.startup),
                shutdown: Some(cost.shutdown),
            }
        }
    }
}

/// Convert a market cost function back into a `gencost` row.
///
/// `expected_suffix` is the input path suffix the caller resolved the cost
/// for; a function wired to another setpoint is rejected.
pub fn function_to_cost(
    function: &CostFunction,
    index: usize,
    expected_suffix: &str,
    base: BaseMva,
    precision: u32,
) -> TranslateResult<GeneratorCost> {
    if !function.input().ends_with(expected_suffix) {
        return Err(TranslateError::internal(format!(
            "cost function input '{}' does not end with '{}'",
            function.input(),
            expected_suffix
        )));
    }

    let base = base.value();
    match function {
        CostFunction::Polynomial {
            coefficients,
            startup,
            shutdown,
            ..
        } => {
            let mut cost: Vec<f64> = coefficients
                .iter()
                .enumerate()
                .map(|(degree, c)| round_to(c / base.powi(degree as i32), precision))
                .collect();
            cost.reverse();
            Ok(GeneratorCost {
                index,
                model: CostModelKind::Polynomial,
                startup: startup.unwrap_or(0.0),
                shutdown: shutdown.unwrap_or(0.0),
                ncost: cost.len(),
                cost,
            })
        }
        CostFunction::PiecewiseLinear {
            points,
            startup,
            shutdown,
            ..
        } => Ok(GeneratorCost {
            index,
            model: CostModelKind::PiecewiseLinear,
            startup: startup.unwrap_or(0.0),
            shutdown: shutdown.unwrap_or(0.0),
            ncost: points.len(),
            cost: points
                .iter()
                .flat_map(|[p, c]| [round_to(p * base, precision), *c])
                .collect(),
        }),
    }
}

/// Placeholder for a generator without cost information.
pub fn zero_cost(index: usize) -> GeneratorCost {
    GeneratorCost {
        index,
        model: CostModelKind::Polynomial,
        startup: 0.0,
        shutdown: 0.0,
        ncost: 3,
        cost: vec![0.0; 3],
    }
}

/// Linear cost of one per MW, used when costs are forced onto a case.
pub fn losses_cost(index: usize) -> GeneratorCost {
    GeneratorCost {
        cost: vec![0.0, 1.0, 0.0],
        ..zero_cost(index)
    }
}
