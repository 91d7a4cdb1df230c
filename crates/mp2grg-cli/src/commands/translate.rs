use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use mp2grg_core::{Diagnostics, Severity, TranslateError};
use mp2grg_io::{
    decode_document, diff_cases, encode_case, parse_matpower_file, read_grg_file,
    write_grg_string, write_matpower_case,
};
use tracing::{error, info, warn};

use mp2grg_cli::{InputKind, Settings};

/// Result of one translation run; `false` maps to a failing exit code.
pub type Success = bool;

pub fn handle(
    path: &Path,
    idempotent: bool,
    settings: &Settings,
    out: &mut impl Write,
    err_out: &mut impl Write,
) -> Result<Success> {
    let kind = InputKind::from_path(path)
        .ok_or_else(|| anyhow!("file extension not recognized: {}", path.display()))?;

    let mut diag = Diagnostics::new();
    // nothing reaches stdout when strict mode rejects the run
    let mut buffer = Vec::new();
    let outcome = match (kind, idempotent) {
        (InputKind::Matpower, false) => encode(path, settings, &mut diag, &mut buffer, err_out),
        (InputKind::Matpower, true) => round_trip(path, settings, &mut diag, &mut buffer, err_out),
        (InputKind::Grg, _) => decode(path, settings, &mut diag, &mut buffer),
    };

    report(&diag);
    let success = outcome?;
    if settings.strict {
        diag.escalate()?;
    }
    out.write_all(&buffer)?;
    Ok(success)
}

fn encode(
    path: &Path,
    settings: &Settings,
    diag: &mut Diagnostics,
    out: &mut impl Write,
    err_out: &mut impl Write,
) -> Result<Success> {
    let case = parse_matpower_file(path, diag)
        .with_context(|| format!("reading MATPOWER case {}", path.display()))?;
    match encode_case(&case, &settings.encode, diag) {
        Ok(doc) => {
            writeln!(out, "{}", write_grg_string(&doc)?)?;
            Ok(true)
        }
        Err(err) => encode_failed(err, out, err_out),
    }
}

/// The rejected document goes to stderr and a `null` result to stdout.
fn encode_failed(
    err: TranslateError,
    out: &mut impl Write,
    err_out: &mut impl Write,
) -> Result<Success> {
    let (issues, document) = match err {
        TranslateError::InvalidDocument { issues, document } => (issues, document),
        other => return Err(other.into()),
    };
    for issue in &issues {
        error!("{}", issue);
    }
    writeln!(err_out, "{}", write_grg_string(&document)?)?;
    writeln!(out, "null")?;
    error!("incorrect grg data representation ({} issue(s))", issues.len());
    Ok(false)
}

fn round_trip(
    path: &Path,
    settings: &Settings,
    diag: &mut Diagnostics,
    out: &mut impl Write,
    err_out: &mut impl Write,
) -> Result<Success> {
    let case = parse_matpower_file(path, diag)
        .with_context(|| format!("reading MATPOWER case {}", path.display()))?;
    let doc = match encode_case(&case, &settings.encode, diag) {
        Ok(doc) => doc,
        Err(err) => return encode_failed(err, out, err_out),
    };
    let decoded = decode_document(&doc, &settings.decode, diag)?;

    let differences = diff_cases(&case, &decoded);
    let idempotent = differences.is_empty();
    writeln!(out, "idempotent: {}", idempotent)?;
    if !idempotent {
        writeln!(out, "{} difference(s)", differences.len())?;
        for difference in &differences {
            writeln!(out, "  {}", difference)?;
        }
    }
    info!(case = %case.name, differences = differences.len(), "round trip finished");
    Ok(idempotent)
}

fn decode(
    path: &Path,
    settings: &Settings,
    diag: &mut Diagnostics,
    out: &mut impl Write,
) -> Result<Success> {
    let doc = read_grg_file(path)
        .with_context(|| format!("reading GRG document {}", path.display()))?;
    let case = decode_document(&doc, &settings.decode, diag)?;
    write!(out, "{}", write_matpower_case(&case)?)?;
    Ok(true)
}

fn report(diag: &Diagnostics) {
    for issue in &diag.issues {
        match issue.severity {
            Severity::Warning => warn!("{}", issue),
            Severity::Error => error!("{}", issue),
        }
    }
    if diag.has_issues() {
        info!("{}", diag.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp2grg_cli::{Cli, Mp2grgConfig};
    use clap::Parser;
    use std::path::PathBuf;

    fn settings() -> Settings {
        let cli = Cli::parse_from(["mp2grg", "case.m"]);
        Settings::resolve(&cli, Mp2grgConfig::default()).unwrap()
    }

    fn case5() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../test_data/matpower/pglib_opf_case5_pjm.m")
    }

    #[test]
    fn test_unknown_extension() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let result = handle(Path::new("case.raw"), false, &settings(), &mut out, &mut err);
        assert!(result.unwrap_err().to_string().contains("file extension not recognized"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_encode_then_decode() {
        let dir = tempfile::tempdir().unwrap();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        assert!(handle(&case5(), false, &settings(), &mut out, &mut err).unwrap());
        assert!(err.is_empty());

        let json = dir.path().join("case5.json");
        std::fs::write(&json, &out).unwrap();
        let mut text = Vec::new();
        assert!(handle(&json, false, &settings(), &mut text, &mut err).unwrap());
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("function mpc = pglib_opf_case5_pjm"));
        assert!(text.contains("mpc.gencost = ["));
    }

    #[test]
    fn test_round_trip_report() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        assert!(handle(&case5(), true, &settings(), &mut out, &mut err).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "idempotent: true\n");
    }
}
