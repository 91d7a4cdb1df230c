//! MATPOWER .m writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use mp2grg_core::case::Case;
use mp2grg_core::{TranslateError, TranslateResult};

/// Render a case as MATPOWER text.
pub fn write_matpower_case(case: &Case) -> TranslateResult<String> {
    let mut buffer = Vec::new();
    write_matpower(case, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| TranslateError::internal(e.to_string()))
}

/// Write a case to a .m file.
pub fn write_matpower_file(case: &Case, path: impl AsRef<Path>) -> TranslateResult<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    write_matpower(case, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Write a case as MATPOWER text to any writer.
pub fn write_matpower<W: Write>(case: &Case, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "function mpc = {}", case.name)?;
    writeln!(out)?;
    writeln!(out, "mpc.version = '{}';", case.version)?;
    writeln!(out, "mpc.baseMVA = {};", num(case.base_mva))?;
    writeln!(out)?;

    writeln!(out, "%% bus data")?;
    writeln!(
        out,
        "%\tbus_i\ttype\tPd\tQd\tGs\tBs\tarea\tVm\tVa\tbaseKV\tzone\tVmax\tVmin"
    )?;
    writeln!(out, "mpc.bus = [")?;
    for bus in &case.bus {
        write!(out, "\t{}\t{}", bus.bus_i, bus.bus_type.code())?;
        write_values(out, &[bus.pd, bus.qd, bus.gs, bus.bs])?;
        write!(out, "\t{}", bus.area)?;
        write_values(out, &[bus.vm, bus.va, bus.base_kv])?;
        write!(out, "\t{}", bus.zone)?;
        write_values(out, &[bus.vmax, bus.vmin])?;
        writeln!(out, ";")?;
    }
    writeln!(out, "];")?;
    writeln!(out)?;

    let with_apf = case.gen.iter().any(|g| g.apf != 0.0);
    writeln!(out, "%% generator data")?;
    if with_apf {
        writeln!(
            out,
            "%\tbus\tPg\tQg\tQmax\tQmin\tVg\tmBase\tstatus\tPmax\tPmin\tPc1\tPc2\tQc1min\tQc1max\tQc2min\tQc2max\tramp_agc\tramp_10\tramp_30\tramp_q\tapf"
        )?;
    } else {
        writeln!(
            out,
            "%\tbus\tPg\tQg\tQmax\tQmin\tVg\tmBase\tstatus\tPmax\tPmin"
        )?;
    }
    writeln!(out, "mpc.gen = [")?;
    for gen in &case.gen {
        write!(out, "\t{}", gen.gen_bus)?;
        write_values(out, &[gen.pg, gen.qg, gen.qmax, gen.qmin, gen.vg, gen.mbase])?;
        write!(out, "\t{}", gen.gen_status)?;
        write_values(out, &[gen.pmax, gen.pmin])?;
        if with_apf {
            write_values(out, &[0.0; 10])?;
            write_values(out, &[gen.apf])?;
        }
        writeln!(out, ";")?;
    }
    writeln!(out, "];")?;
    writeln!(out)?;

    writeln!(out, "%% branch data")?;
    writeln!(
        out,
        "%\tfbus\ttbus\tr\tx\tb\trateA\trateB\trateC\tratio\tangle\tstatus\tangmin\tangmax"
    )?;
    writeln!(out, "mpc.branch = [")?;
    for branch in &case.branch {
        write!(out, "\t{}\t{}", branch.f_bus, branch.t_bus)?;
        write_values(
            out,
            &[
                branch.br_r,
                branch.br_x,
                branch.br_b,
                branch.rate_a,
                branch.rate_b,
                branch.rate_c,
                branch.tap,
                branch.shift,
            ],
        )?;
        write!(out, "\t{}", branch.br_status)?;
        write_values(out, &[branch.angmin, branch.angmax])?;
        writeln!(out, ";")?;
    }
    writeln!(out, "];")?;

    if let Some(gencost) = &case.gencost {
        writeln!(out)?;
        writeln!(out, "%% generator cost data")?;
        writeln!(out, "%\tmodel\tstartup\tshutdown\tn\tcost...")?;
        writeln!(out, "mpc.gencost = [")?;
        for cost in gencost {
            write!(out, "\t{}", cost.model.code())?;
            write_values(out, &[cost.startup, cost.shutdown])?;
            write!(out, "\t{}", cost.ncost)?;
            write_values(out, &cost.cost)?;
            writeln!(out, ";")?;
        }
        writeln!(out, "];")?;
    }

    if let Some(dclines) = &case.dcline {
        writeln!(out)?;
        writeln!(out, "%% dcline data")?;
        writeln!(
            out,
            "%\tf_bus\tt_bus\tbr_status\tpf\tpt\tqf\tqt\tvf\tvt\tpmin\tpmax\tqminf\tqmaxf\tqmint\tqmaxt\tloss0\tloss1"
        )?;
        writeln!(out, "mpc.dcline = [")?;
        for dc in dclines {
            write!(out, "\t{}\t{}\t{}", dc.f_bus, dc.t_bus, dc.br_status)?;
            write_values(
                out,
                &[
                    dc.pf, dc.pt, dc.qf, dc.qt, dc.vf, dc.vt, dc.pmin, dc.pmax, dc.qminf,
                    dc.qmaxf, dc.qmint, dc.qmaxt, dc.loss0, dc.loss1,
                ],
            )?;
            writeln!(out, ";")?;
        }
        writeln!(out, "];")?;
    }

    if let Some(names) = &case.bus_name {
        writeln!(out)?;
        writeln!(out, "%% bus names")?;
        writeln!(out, "mpc.bus_name = {{")?;
        for name in names {
            writeln!(out, "\t'{}';", name.name.replace('\'', "''"))?;
        }
        writeln!(out, "}};")?;
    }

    Ok(())
}

fn write_values<W: Write>(out: &mut W, values: &[f64]) -> std::io::Result<()> {
    for value in values {
        write!(out, "\t{}", num(*value))?;
    }
    Ok(())
}

/// Shortest round-trip formatting, with MATPOWER's spelling of non-finite values.
fn num(value: f64) -> String {
    if value == f64::INFINITY {
        "Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{}", value)
    }
}
