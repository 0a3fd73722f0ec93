use crate::cli::LabelArgs;
use crate::config::{AppConfig, build_config};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use pepforge::{
    core::io::{mol2::Mol2File, traits::MolecularFile},
    engine::progress::ProgressReporter,
    workflows::{self, label::ResidueReport, report},
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const OUTPUT_SUFFIX: &str = "labeled";
const UNNAMED_MOLECULE: &str = "****";

struct FileOutcome {
    output: PathBuf,
    found: usize,
    reports: Vec<ResidueReport>,
    missing_residues: Vec<usize>,
}

pub fn run(args: LabelArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args)?;
    let outputs = plan_outputs(&app.inputs, &app.output)?;

    println!("Labeling {} structure(s)...", app.inputs.len());
    let progress_handler = CliProgressHandler::new();

    let outcomes: Vec<Result<FileOutcome>> = app
        .inputs
        .par_iter()
        .zip(outputs.par_iter())
        .map(|(input, output)| label_file(input, output, &app, &progress_handler))
        .collect();
    progress_handler.finish();

    let mut report_entries = Vec::with_capacity(outcomes.len());
    let mut failures = 0usize;
    for (input, outcome) in app.inputs.iter().zip(outcomes) {
        match outcome {
            Ok(outcome) => {
                println!(
                    "✓ {}: backbone found in {}/{} residue(s), written to {}",
                    input.display(),
                    outcome.found,
                    outcome.reports.len(),
                    outcome.output.display()
                );
                if !outcome.missing_residues.is_empty() {
                    println!(
                        "  Requested residue(s) not present: {:?}",
                        outcome.missing_residues
                    );
                }
                report_entries.push((input.display().to_string(), outcome.reports));
            }
            Err(e) => {
                error!("Failed to label {:?}: {}", input, e);
                eprintln!("✗ {}: {}", input.display(), e);
                failures += 1;
            }
        }
    }

    if let Some(report_path) = &app.report_path {
        info!("Writing residue report to {:?}", report_path);
        report::write_csv_to_path(report_path, &report_entries)?;
        println!("Report written to: {}", report_path.display());
    }

    if failures > 0 {
        return Err(CliError::Other(anyhow::anyhow!(
            "{} of {} structure(s) could not be labeled",
            failures,
            app.inputs.len()
        )));
    }
    Ok(())
}

fn label_file(
    input: &Path,
    output: &Path,
    app: &AppConfig,
    progress_handler: &CliProgressHandler,
) -> Result<FileOutcome> {
    info!("Loading input structure from {:?}", input);
    let (molecule, mut metadata) =
        Mol2File::read_from_path(input).map_err(|e| CliError::FileParsing {
            path: input.to_path_buf(),
            source: e.into(),
        })?;

    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let result = workflows::label::run(&molecule, &app.core_config, &reporter)?;
    if !result.all_found() {
        warn!(
            "{:?}: backbone found in {} of {} residue(s).",
            input,
            result.found_count(),
            result.reports.len()
        );
    }

    match &app.molecule_name {
        Some(name) => metadata.name = name.clone(),
        None if metadata.name == UNNAMED_MOLECULE => {
            if let Some(stem) = input.file_stem() {
                metadata.name = stem.to_string_lossy().to_string();
            }
        }
        None => {}
    }
    if let Some(banner) = &app.banner {
        metadata.banner = banner.clone();
    }

    info!("Writing labeled structure to {:?}", output);
    Mol2File::write_to_path(&result.molecule, &metadata, output).map_err(|e| {
        CliError::FileParsing {
            path: output.to_path_buf(),
            source: e.into(),
        }
    })?;

    Ok(FileOutcome {
        output: output.to_path_buf(),
        found: result.found_count(),
        reports: result.reports,
        missing_residues: result.missing_residues,
    })
}

/// Output path for each input, in input order.
///
/// A single input is written to `output` unless it names an existing
/// directory. Several inputs always go into the directory `output`, which is
/// created if needed, as `<stem>.labeled.mol2`.
fn plan_outputs(inputs: &[PathBuf], output: &Path) -> Result<Vec<PathBuf>> {
    if inputs.len() == 1 && !output.is_dir() {
        return Ok(vec![output.to_path_buf()]);
    }

    std::fs::create_dir_all(output)?;
    let mut seen = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .ok_or_else(|| {
                    CliError::Argument(format!("Input path {:?} has no file name", input))
                })?;
            let path = output.join(format!("{}.{}.mol2", stem, OUTPUT_SUFFIX));
            if !seen.insert(path.clone()) {
                return Err(CliError::Argument(format!(
                    "Several inputs would be written to {:?}; rename them or label them separately",
                    path
                )));
            }
            Ok(path)
        })
        .collect()
}
