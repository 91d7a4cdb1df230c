//! MATPOWER .m file parser
//!
//! Parses MATPOWER version 2 case files: the `function mpc = <name>` header,
//! `mpc.version`, `mpc.baseMVA`, numeric matrix blocks (`mpc.bus`,
//! `mpc.gen`, `mpc.branch`, `mpc.gencost`, `mpc.dcline`) and the
//! `mpc.bus_name` cell block. Any other matrix is skipped with a warning.

use std::fs;
use std::path::Path;

use mp2grg_core::case::{
    Branch, Bus, BusName, BusType, Case, CostModelKind, DcLine, Generator, GeneratorCost,
};
use mp2grg_core::{Diagnostics, TranslateError, TranslateResult};
use tracing::debug;

use super::convert::{safe_f64_to_i32, safe_f64_to_i64, safe_f64_to_usize};

/// One row of a numeric matrix, with the 1-based line it started on
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub line: usize,
    pub values: Vec<f64>,
}

/// A parsed `mpc.<name> = [ ... ];` block
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub name: String,
    pub rows: Vec<Row>,
    /// Number of source lines the block spans
    pub line_count: usize,
}

/// A parsed `mpc.<name> = { ... };` cell block of strings
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    pub name: String,
    pub values: Vec<String>,
    pub line_count: usize,
}

/// Parse a MATPOWER .m file
pub fn parse_matpower_file(path: impl AsRef<Path>, diag: &mut Diagnostics) -> TranslateResult<Case> {
    let content = fs::read_to_string(path.as_ref())?;
    parse_matpower_string(&content, diag)
}

/// Parse MATPOWER content from a string
pub fn parse_matpower_string(content: &str, diag: &mut Diagnostics) -> TranslateResult<Case> {
    let lines: Vec<&str> = content.lines().collect();

    let mut name = None;
    let mut version = None;
    let mut base_mva = None;
    let mut matrices = Vec::new();
    let mut cells = Vec::new();

    let mut index = 0;
    while index < lines.len() {
        let line = strip_comment(lines[index]).trim();
        if line.is_empty() {
            index += 1;
            continue;
        }

        if line.starts_with("function") && line.contains("mpc") {
            name = assignment_value(line);
        } else if line.starts_with("mpc.version") {
            version = assignment_value(line);
        } else if line.starts_with("mpc.baseMVA") {
            let value = assignment_value(line).unwrap_or_default();
            base_mva = Some(value.parse::<f64>().map_err(|_| {
                TranslateError::parse(index + 1, format!("invalid baseMVA '{}'", value))
            })?);
        } else if line.starts_with("mpc.") && line.contains('[') {
            let matrix = parse_matrix(&lines, index)?;
            index += matrix.line_count;
            matrices.push(matrix);
            continue;
        } else if line.starts_with("mpc.") && line.contains('{') {
            let cell = parse_cell_array(&lines, index)?;
            index += cell.line_count;
            cells.push(cell);
            continue;
        }
        index += 1;
    }

    let mut case = Case {
        name: name.unwrap_or_else(|| "case".to_string()),
        version: version.unwrap_or_else(|| "2".to_string()),
        base_mva: base_mva.unwrap_or(100.0),
        bus: Vec::new(),
        gen: Vec::new(),
        branch: Vec::new(),
        gencost: None,
        dcline: None,
        bus_name: None,
    };

    let mut found_bus = false;
    for matrix in &matrices {
        match matrix.name.as_str() {
            "mpc.bus" => {
                found_bus = true;
                case.bus = matrix.rows.iter().map(parse_bus_row).collect::<TranslateResult<_>>()?;
            }
            "mpc.gen" => {
                case.gen = matrix
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| parse_gen_row(i, row))
                    .collect::<TranslateResult<_>>()?;
            }
            "mpc.branch" => {
                case.branch = matrix
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| parse_branch_row(i, row))
                    .collect::<TranslateResult<_>>()?;
            }
            "mpc.gencost" => {
                case.gencost = Some(
                    matrix
                        .rows
                        .iter()
                        .enumerate()
                        .map(|(i, row)| parse_gencost_row(i, row))
                        .collect::<TranslateResult<_>>()?,
                );
            }
            "mpc.dcline" => {
                case.dcline = Some(
                    matrix
                        .rows
                        .iter()
                        .enumerate()
                        .map(|(i, row)| parse_dcline_row(i, row))
                        .collect::<TranslateResult<_>>()?,
                );
            }
            other => diag.add_warning(
                "parse",
                &format!("unrecognized data matrix named '{}': data was ignored", other),
            ),
        }
    }

    if !found_bus {
        return Err(TranslateError::parse(lines.len(), "mpc.bus matrix not found"));
    }

    for cell in cells {
        if cell.name == "mpc.bus_name" {
            if cell.values.len() != case.bus.len() {
                return Err(TranslateError::InvalidCase(format!(
                    "bus_name has {} entries for {} buses",
                    cell.values.len(),
                    case.bus.len()
                )));
            }
            case.bus_name = Some(
                case.bus
                    .iter()
                    .zip(cell.values)
                    .map(|(bus, name)| BusName {
                        bus_i: bus.bus_i,
                        name,
                    })
                    .collect(),
            );
        } else {
            diag.add_warning(
                "parse",
                &format!("unrecognized data cell named '{}': data was ignored", cell.name),
            );
        }
    }

    case.validate()?;

    debug!(
        name = %case.name,
        buses = case.bus.len(),
        gens = case.gen.len(),
        branches = case.branch.len(),
        "parsed MATPOWER case"
    );

    Ok(case)
}

/// Parse the numeric matrix whose header is on `lines[start]`.
pub fn parse_matrix(lines: &[&str], start: usize) -> TranslateResult<Matrix> {
    let header = strip_comment(lines[start]);
    let (name, rest) = split_block_header(header, '[')
        .ok_or_else(|| TranslateError::parse(start + 1, "expected matrix assignment"))?;

    let mut rows = Vec::new();
    let mut current: Option<Row> = None;

    let mut index = start;
    let mut text = rest;
    loop {
        let (body, closed) = match text.find(']') {
            Some(end) => (&text[..end], true),
            None => (text, false),
        };

        for (i, segment) in body.split(';').enumerate() {
            if i > 0 {
                // ';' ends the current row
                if let Some(row) = current.take() {
                    rows.push(row);
                }
            }
            for token in segment.split(|c: char| c.is_whitespace() || c == ',') {
                if token.is_empty() {
                    continue;
                }
                let value = token.parse::<f64>().map_err(|_| {
                    TranslateError::parse(
                        index + 1,
                        format!("invalid number '{}' in {}", token, name),
                    )
                })?;
                current
                    .get_or_insert_with(|| Row {
                        line: index + 1,
                        values: Vec::new(),
                    })
                    .values
                    .push(value);
            }
        }
        // a line break also ends the row
        if let Some(row) = current.take() {
            rows.push(row);
        }

        if closed {
            break;
        }
        index += 1;
        if index >= lines.len() {
            return Err(TranslateError::parse(
                start + 1,
                format!("matrix {} is not terminated", name),
            ));
        }
        text = strip_comment(lines[index]);
    }

    Ok(Matrix {
        name,
        rows,
        line_count: index - start + 1,
    })
}

/// Parse the string cell block whose header is on `lines[start]`.
pub fn parse_cell_array(lines: &[&str], start: usize) -> TranslateResult<CellArray> {
    let header = strip_comment(lines[start]);
    let (name, rest) = split_block_header(header, '{')
        .ok_or_else(|| TranslateError::parse(start + 1, "expected cell assignment"))?;

    let mut values = Vec::new();
    let mut index = start;
    let mut text = rest;
    loop {
        let (body, closed) = match text.find('}') {
            Some(end) => (&text[..end], true),
            None => (text, false),
        };
        values.extend(quoted_strings(body));

        if closed {
            break;
        }
        index += 1;
        if index >= lines.len() {
            return Err(TranslateError::parse(
                start + 1,
                format!("cell array {} is not terminated", name),
            ));
        }
        text = strip_comment(lines[index]);
    }

    Ok(CellArray {
        name,
        values,
        line_count: index - start + 1,
    })
}

/// `mpc.bus = [ 1 2 ...` -> ("mpc.bus", " 1 2 ...")
fn split_block_header(header: &str, open: char) -> Option<(String, &str)> {
    let (lhs, rhs) = header.split_once('=')?;
    let (_, rest) = rhs.split_once(open)?;
    Some((lhs.trim().to_string(), rest))
}

/// Right-hand side of `key = value;` without quotes or the trailing `;`
fn assignment_value(line: &str) -> Option<String> {
    let (_, rhs) = line.split_once('=')?;
    let value = rhs
        .trim()
        .trim_end_matches(';')
        .trim()
        .trim_matches(|c| c == '\'' || c == '"');
    Some(value.to_string())
}

/// Drop a `%` comment, ignoring `%` inside quoted strings.
fn strip_comment(line: &str) -> &str {
    let mut in_quote = false;
    for (i, c) in line.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '%' if !in_quote => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Single-quoted strings in `text`; `''` is an escaped quote.
fn quoted_strings(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            continue;
        }
        let mut value = String::new();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    value.push('\'');
                } else {
                    break;
                }
            } else {
                value.push(c);
            }
        }
        out.push(value);
    }
    out
}

fn require_columns(row: &Row, matrix: &str, columns: usize) -> TranslateResult<()> {
    if row.values.len() < columns {
        return Err(TranslateError::parse(
            row.line,
            format!(
                "{} row has {} columns, expected at least {}",
                matrix,
                row.values.len(),
                columns
            ),
        ));
    }
    Ok(())
}

fn cell_error(row: &Row, what: &str) -> impl FnOnce(anyhow::Error) -> TranslateError {
    let line = row.line;
    let what = what.to_string();
    move |err| TranslateError::parse(line, format!("invalid {}: {}", what, err))
}

fn parse_bus_row(row: &Row) -> TranslateResult<Bus> {
    require_columns(row, "bus", 13)?;
    let v = &row.values;
    let code = safe_f64_to_i32(v[1]).map_err(cell_error(row, "bus_type"))?;
    let bus_type = BusType::try_from(code)
        .map_err(|_| TranslateError::parse(row.line, format!("invalid bus_type {}", code)))?;
    Ok(Bus {
        bus_i: safe_f64_to_usize(v[0]).map_err(cell_error(row, "bus_i"))?,
        bus_type,
        pd: v[2],
        qd: v[3],
        gs: v[4],
        bs: v[5],
        area: safe_f64_to_i64(v[6]).map_err(cell_error(row, "area"))?,
        vm: v[7],
        va: v[8],
        base_kv: v[9],
        zone: safe_f64_to_i64(v[10]).map_err(cell_error(row, "zone"))?,
        vmax: v[11],
        vmin: v[12],
    })
}

fn parse_gen_row(index: usize, row: &Row) -> TranslateResult<Generator> {
    require_columns(row, "gen", 10)?;
    let v = &row.values;
    Ok(Generator {
        index,
        gen_bus: safe_f64_to_usize(v[0]).map_err(cell_error(row, "gen_bus"))?,
        pg: v[1],
        qg: v[2],
        qmax: v[3],
        qmin: v[4],
        vg: v[5],
        mbase: v[6],
        gen_status: safe_f64_to_i32(v[7]).map_err(cell_error(row, "gen_status"))?,
        pmax: v[8],
        pmin: v[9],
        apf: v.get(20).copied().unwrap_or(0.0),
    })
}

fn parse_branch_row(index: usize, row: &Row) -> TranslateResult<Branch> {
    require_columns(row, "branch", 13)?;
    let v = &row.values;
    Ok(Branch {
        index,
        f_bus: safe_f64_to_usize(v[0]).map_err(cell_error(row, "f_bus"))?,
        t_bus: safe_f64_to_usize(v[1]).map_err(cell_error(row, "t_bus"))?,
        br_r: v[2],
        br_x: v[3],
        br_b: v[4],
        rate_a: v[5],
        rate_b: v[6],
        rate_c: v[7],
        tap: v[8],
        shift: v[9],
        br_status: safe_f64_to_i32(v[10]).map_err(cell_error(row, "br_status"))?,
        angmin: v[11],
        angmax: v[12],
    })
}

fn parse_gencost_row(index: usize, row: &Row) -> TranslateResult<GeneratorCost> {
    require_columns(row, "gencost", 4)?;
    let v = &row.values;
    let model = CostModelKind::try_from(safe_f64_to_i32(v[0]).map_err(cell_error(row, "model"))?)?;
    let ncost = safe_f64_to_usize(v[3]).map_err(cell_error(row, "ncost"))?;
    let expected = GeneratorCost::expected_len(model, ncost);
    require_columns(row, "gencost", 4 + expected)?;
    Ok(GeneratorCost {
        index,
        model,
        startup: v[1],
        shutdown: v[2],
        ncost,
        cost: v[4..4 + expected].to_vec(),
    })
}

fn parse_dcline_row(index: usize, row: &Row) -> TranslateResult<DcLine> {
    require_columns(row, "dcline", 17)?;
    let v = &row.values;
    Ok(DcLine {
        index,
        f_bus: safe_f64_to_usize(v[0]).map_err(cell_error(row, "f_bus"))?,
        t_bus: safe_f64_to_usize(v[1]).map_err(cell_error(row, "t_bus"))?,
        br_status: safe_f64_to_i32(v[2]).map_err(cell_error(row, "br_status"))?,
        pf: v[3],
        pt: v[4],
        qf: v[5],
        qt: v[6],
        vf: v[7],
        vt: v[8],
        pmin: v[9],
        pmax: v[10],
        qminf: v[11],
        qmaxf: v[12],
        qmint: v[13],
        qmaxt: v[14],
        loss0: v[15],
        loss1: v[16],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASE3: &str = r#"
function mpc = case3_dc
%% three buses, one dc line
mpc.version = '2';
mpc.baseMVA = 100.0;

%% bus data
%	bus_i	type	Pd	Qd	Gs	Bs	area	Vm	Va	baseKV	zone	Vmax	Vmin
mpc.bus = [
	1	3	0.0	0.0	0.0	0.0	1	1.0	0.0	230.0	1	1.1	0.9;
	2	1	90.0	30.0	0.0	0.0	1	1.0	0.0	230.0	1	1.1	0.9;
	3	2	0.0	0.0	0.0	0.0	1	1.0	0.0	230.0	1	1.1	0.9;
];

mpc.gen = [
	1	50.0	0.0	100.0	-100.0	1.0	100.0	1	200.0	0.0;
	3	40.0	0.0	100.0	-100.0	1.0	100.0	1	200.0	0.0	0 0 0 0 0 0 0 0 0 0	0.5;
];

mpc.branch = [
	1	2	0.01	0.1	0.02	100	100	100	0	0	1	-30	30;
];

mpc.gencost = [
	2	0	0	3	0.01	10	5;
	1	0	0	2	0	0	200	4000	99	99;
];

mpc.dcline = [
	2	3	1	10	8.9	0	0	1.01	1.0	1	100	-10	10	-10	10	1	0.01;
];

mpc.areas = [
	1	1;
];

mpc.bus_name = {
	'North';
	'It''s south';
	'East';
};
"#;

    #[test]
    fn test_parse_full_case() {
        let mut diag = Diagnostics::new();
        let case = parse_matpower_string(CASE3, &mut diag).expect("parse matpower string");

        assert_eq!(case.name, "case3_dc");
        assert_eq!(case.version, "2");
        assert_eq!(case.base_mva, 100.0);
        assert_eq!(case.bus.len(), 3);
        assert_eq!(case.gen.len(), 2);
        assert_eq!(case.branch.len(), 1);

        assert_eq!(case.bus[0].bus_type, BusType::Reference);
        assert_eq!(case.bus[1].pd, 90.0);
        assert_eq!(case.gen[0].apf, 0.0);
        assert_eq!(case.gen[1].apf, 0.5);
        assert_eq!(case.gen[1].index, 1);

        let costs = case.gencost.as_ref().unwrap();
        assert_eq!(costs[0].cost, vec![0.01, 10.0, 5.0]);
        // trailing values past 2*ncost are dropped
        assert_eq!(costs[1].model, CostModelKind::PiecewiseLinear);
        assert_eq!(costs[1].cost, vec![0.0, 0.0, 200.0, 4000.0]);

        let dclines = case.dcline.as_ref().unwrap();
        assert_eq!(dclines[0].loss1, 0.01);

        let names = case.bus_name.as_ref().unwrap();
        assert_eq!(names[1].name, "It's south");
        assert_eq!(names[2].bus_i, 3);

        assert_eq!(diag.warning_count(), 1);
        assert!(diag.issues[0].message.contains("mpc.areas"));
    }

    #[test]
    fn test_parse_matrix_rows_on_one_line() {
        let lines = ["mpc.x = [1 2; 3 4];", "after"];
        let matrix = parse_matrix(&lines, 0).unwrap();
        assert_eq!(matrix.name, "mpc.x");
        assert_eq!(matrix.line_count, 1);
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[1].values, vec![3.0, 4.0]);
    }

    #[test]
    fn test_parse_matrix_line_count() {
        let lines = ["mpc.x = [", "  1 2 % note", "", "  3 4;", "];", "tail"];
        let matrix = parse_matrix(&lines, 0).unwrap();
        assert_eq!(matrix.line_count, 5);
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[1].line, 4);
    }

    #[test]
    fn test_reject_non_numeric_cell() {
        let content = r#"
mpc.bus = [
    1   3   0.0  0.0  0.0  0.0  1  1.0  0.0  230.0  1  1.1  0.9;
    2   1   x1   0.0  0.0  0.0  1  1.0  0.0  230.0  1  1.1  0.9;
];
"#;
        let err = parse_matpower_string(content, &mut Diagnostics::new()).unwrap_err();
        match err {
            TranslateError::Parse { line, message } => {
                assert_eq!(line, 4);
                assert!(message.contains("x1"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_reject_negative_bus_id() {
        let content = r#"
mpc.bus = [
    -1   2   0.0     0.0     0.0   0.0   1   1.0   0.0   230.0   1   1.1   0.9;
];
"#;
        let err = parse_matpower_string(content, &mut Diagnostics::new())
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid bus_i"));
    }

    #[test]
    fn test_reject_unterminated_matrix() {
        let content = "mpc.bus = [\n 1 3 0 0 0 0 1 1 0 230 1 1.1 0.9;\n";
        let err = parse_matpower_string(content, &mut Diagnostics::new()).unwrap_err();
        assert!(err.to_string().contains("not terminated"));
    }

    #[test]
    fn test_unsupported_cost_model() {
        let content = r#"
mpc.bus = [
    1   3   0.0  0.0  0.0  0.0  1  1.0  0.0  230.0  1  1.1  0.9;
];
mpc.gen = [
    1   0.0   0.0   10.0   -10.0   1.0   100.0   1   40.0   0.0;
];
mpc.gencost = [
    3   0   0   2   1   2;
];
"#;
        let err = parse_matpower_string(content, &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedCostModel(3)));
    }

    #[test]
    fn test_missing_bus_matrix() {
        let err = parse_matpower_string("mpc.baseMVA = 100;", &mut Diagnostics::new())
            .unwrap_err();
        assert!(err.to_string().contains("mpc.bus matrix not found"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_matpower_file("does/not/exist.m", &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, TranslateError::Io(_)));
    }
}
