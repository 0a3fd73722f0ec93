use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "pepforge contributors",
    version,
    about = "pepforge CLI - Locate, label and repair the peptide backbone of amino-acid residues in TRIPOS MOL2 files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to process input files in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Label the backbone atoms of every residue in one or more MOL2 files.
    Label(LabelArgs),
    /// Print or export the neighbor templates used to recognize backbone atoms.
    Templates(TemplatesArgs),
}

/// Arguments for the `label` subcommand.
#[derive(Args, Debug)]
pub struct LabelArgs {
    // --- Core Arguments ---
    /// Input MOL2 files.
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Output file for a single input, or output directory for several.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Labeling Overrides ---
    /// Residue context: auto, individual, n-terminus, c-terminus or amide-linked.
    #[arg(long, value_name = "CONTEXT")]
    pub context: Option<String>,

    /// Only label these substructure ids (comma separated).
    #[arg(short, long = "residues", value_name = "ID,...", value_delimiter = ',')]
    pub residues: Option<Vec<usize>>,

    /// Do not add a third hydrogen to a two-hydrogen N-terminus.
    #[arg(long)]
    pub no_repair: bool,

    /// Replace the built-in neighbor templates with a TOML template file.
    #[arg(short, long, value_name = "PATH")]
    pub templates: Option<PathBuf>,

    // --- Output Overrides ---
    /// Molecule name written to the MOLECULE section.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Write a CSV report of every residue to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S labeling.context=n-terminus
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `templates` subcommand.
#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Write the templates to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Validate and print a template file instead of the built-in set.
    #[arg(long, value_name = "PATH")]
    pub from: Option<PathBuf>,
}
