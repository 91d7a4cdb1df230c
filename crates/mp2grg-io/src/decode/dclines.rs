//! Dc line table.

use mp2grg_core::case::DcLine;
use mp2grg_core::{TranslateError, TranslateResult};

use super::mapping::field;
use super::numbering::index_lookup;
use super::DecodeContext;

/// Decode dc lines sorted by index, or `None` when the document has none.
///
/// The transfer bounds are read from the sending side, so lines whose
/// bounds change sign are not restored to their written form.
pub fn decode_dc_lines(ctx: &DecodeContext<'_>) -> TranslateResult<Option<Vec<DcLine>>> {
    let lines = &ctx.cbt.dc_line;
    if lines.is_empty() {
        return Ok(None);
    }
    let index = index_lookup(&[lines
        .iter()
        .map(|l| (l.id.as_str(), l.source_id.as_deref()))
        .collect()]);

    let mut records = Vec::with_capacity(lines.len());
    for line in lines {
        let index = index
            .get(line.id.as_str())
            .copied()
            .ok_or_else(|| TranslateError::internal(format!("dc line {} has no index", line.id)))?;
        let side_1 = format!("{}/output_1", line.id);
        let side_2 = format!("{}/output_2", line.id);
        let setpoint = |key: &str, name: &str| field(&ctx.mapping, key, name).unwrap_or(0.0);
        let on = ctx.is_active(&line.link_1) && ctx.is_active(&line.link_2);

        records.push(DcLine {
            index,
            f_bus: ctx.bus_number(&line.link_1)?,
            t_bus: ctx.bus_number(&line.link_2)?,
            br_status: i32::from(on),
            pf: ctx.physical(setpoint(&side_1, "active")),
            pt: ctx.physical(setpoint(&side_2, "active")),
            qf: ctx.physical(setpoint(&side_1, "reactive")),
            qt: ctx.physical(setpoint(&side_2, "reactive")),
            vf: setpoint(&side_1, "vf"),
            vt: setpoint(&side_2, "vt"),
            pmin: ctx.physical(line.losses_1.min),
            pmax: ctx.physical(line.losses_1.max),
            qminf: ctx.physical(line.output_1.reactive.lb()),
            qmaxf: ctx.physical(line.output_1.reactive.ub()),
            qmint: ctx.physical(line.output_2.reactive.lb()),
            qmaxt: ctx.physical(line.output_2.reactive.ub()),
            loss0: line.losses_1.c_0 + line.losses_2.c_0,
            loss1: line.losses_1.c_1 + line.losses_2.c_1,
        });
    }

    records.sort_by_key(|l| l.index);
    Ok(Some(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeOptions;
    use crate::encode::records::dc_line_bounds;
    use crate::encode::{encode_case, EncodeOptions};
    use mp2grg_core::case::{fixtures, BusType};
    use mp2grg_core::Diagnostics;

    fn dc_line(index: usize, pmin: f64) -> DcLine {
        DcLine {
            index,
            f_bus: 1,
            t_bus: 2,
            br_status: 1,
            pf: 10.0,
            pt: 9.0,
            qf: 1.0,
            qt: -1.0,
            vf: 1.01,
            vt: 1.0,
            pmin,
            pmax: 100.0,
            qminf: -10.0,
            qmaxf: 10.0,
            qmint: -20.0,
            qmaxt: 20.0,
            loss0: 1.0,
            loss1: 0.01,
        }
    }

    fn decode(dclines: Option<Vec<DcLine>>) -> Option<Vec<DcLine>> {
        let mut case = fixtures::case(
            vec![fixtures::bus(1, BusType::Reference), fixtures::bus(2, BusType::Pq)],
            vec![fixtures::generator(0, 1)],
            vec![fixtures::branch(0, 1, 2)],
        );
        case.dcline = dclines;
        let mut diag = Diagnostics::new();
        let doc = encode_case(&case, &EncodeOptions::default(), &mut diag).unwrap();
        let ctx = DecodeContext::new(&doc, &DecodeOptions::default(), &mut diag);
        decode_dc_lines(&ctx).unwrap()
    }

    #[test]
    fn test_forward_dc_lines_read_back() {
        let lines = vec![dc_line(0, 0.0), dc_line(1, 5.0)];
        assert_eq!(decode(Some(lines.clone())), Some(lines));
    }

    #[test]
    fn test_no_dc_lines() {
        assert_eq!(decode(None), None);
    }

    #[test]
    fn test_reverse_bounds_come_from_sending_side() {
        let line = dc_line(0, -20.0);
        let ([min_1, max_1], _) = dc_line_bounds(&line);
        let decoded = decode(Some(vec![line])).unwrap();

        // pmin is the sending side minimum solved from the loss model:
        // (-20 + loss0) / (1 - loss1) = -19 / 0.99
        let expected = -19.0 / 0.99;
        assert!((min_1 - expected).abs() < 1e-12);
        assert!((decoded[0].pmin - expected).abs() < 1e-9, "{}", decoded[0].pmin);
        assert_eq!(decoded[0].pmax, max_1);
        assert_eq!(decoded[0].pmax, 100.0);
    }
}
