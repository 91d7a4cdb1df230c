use clap::{CommandFactory, Parser, ValueHint};
use std::path::{Path, PathBuf};

/// Translate power network cases between MATPOWER and GRG JSON.
///
/// A `.m` file is encoded into a GRG document, a `.json` file is decoded
/// into a MATPOWER case. The result is written to stdout; diagnostics go to
/// stderr.
#[derive(Parser, Debug)]
#[command(name = "mp2grg", author, version, about, long_about = None)]
pub struct Cli {
    /// MATPOWER case (.m) or GRG document (.json)
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Mapping layers to apply when decoding, in order (default: all)
    #[arg(short, long, num_args = 1..)]
    pub mappings: Option<Vec<String>>,

    /// Encode and decode a MATPOWER case and report any difference
    #[arg(short, long)]
    pub idempotent: bool,

    /// Leave optional subtypes out of the encoded document
    #[arg(long)]
    pub omit_subtypes: bool,

    /// Print the encoded document even when it fails validation
    #[arg(long)]
    pub skip_validation: bool,

    /// Give every generator a linear cost when the document has none
    #[arg(long)]
    pub add_generator_costs: bool,

    /// Write bus names built from the merged bus ids
    #[arg(long)]
    pub add_bus_names: bool,

    /// Fail when translation produced any warning
    #[arg(long)]
    pub strict: bool,

    /// TOML configuration file; flags given here take precedence
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Set the logging level
    #[arg(long)]
    pub log_level: Option<tracing::Level>,
}

/// Input format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Matpower,
    Grg,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "m" => Some(InputKind::Matpower),
            "json" => Some(InputKind::Grg),
            _ => None,
        }
    }
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli_command().debug_assert();
    }

    #[test]
    fn test_input_kind_by_extension() {
        assert_eq!(InputKind::from_path(Path::new("case14.m")), Some(InputKind::Matpower));
        assert_eq!(InputKind::from_path(Path::new("dir/case.json")), Some(InputKind::Grg));
        assert_eq!(InputKind::from_path(Path::new("case.raw")), None);
        assert_eq!(InputKind::from_path(Path::new("case")), None);
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "mp2grg",
            "case.json",
            "-m",
            "starting_points",
            "breakers_assignment",
            "--add-bus-names",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.file, PathBuf::from("case.json"));
        assert_eq!(
            cli.mappings,
            Some(vec!["starting_points".to_string(), "breakers_assignment".to_string()])
        );
        assert!(cli.add_bus_names);
        assert!(!cli.idempotent);
        assert_eq!(cli.log_level, Some(tracing::Level::DEBUG));
    }
}
