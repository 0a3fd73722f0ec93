use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::LabelArgs;
use crate::error::{CliError, Result};
use pepforge::engine::config as core_config;
use pepforge::engine::templates::{Context, TemplateSet};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

pub fn build_config(args: &LabelArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let labeling_file = file_config.labeling.take().unwrap_or_default();
    let output_file = file_config.output.take().unwrap_or_default();

    let context = parse_context_selection(
        args.context
            .as_deref()
            .or(labeling_file.context.as_deref())
            .unwrap_or(defaults.context.as_str()),
    )?;

    let residues = match args.residues.clone().or(labeling_file.residues) {
        Some(ids) => core_config::ResidueSelection::List(ids),
        None => core_config::ResidueSelection::All,
    };

    let repair_n_terminus = if args.no_repair {
        false
    } else {
        labeling_file
            .repair_n_terminus
            .unwrap_or(defaults.repair_n_terminus)
    };

    let templates = match args.templates.clone().or(labeling_file.templates_path) {
        Some(path) => {
            info!("Loading neighbor templates from {:?}", path);
            TemplateSet::load(&path)?
        }
        None => TemplateSet::builtin(),
    };

    let core_config = core_config::LabelingConfigBuilder::new()
        .residues(residues)
        .context(context)
        .templates(templates)
        .repair_n_terminus(repair_n_terminus)
        .build()?;

    let report_path = args.report.clone().or(output_file.report_path);
    debug!(?report_path, repair_n_terminus, "Configuration assembled.");

    Ok(AppConfig {
        inputs: args.inputs.clone(),
        output: args.output.clone(),
        core_config,
        molecule_name: args.name.clone().or(output_file.name),
        banner: output_file.banner,
        report_path,
    })
}

fn parse_context_selection(value: &str) -> Result<core_config::ContextSelection> {
    if value.trim().eq_ignore_ascii_case("auto") {
        return Ok(core_config::ContextSelection::Auto);
    }
    Context::from_str(value)
        .map(core_config::ContextSelection::Fixed)
        .map_err(|e| CliError::Config(e.to_string()))
}

fn parse_residue_list(key: &str, value: &str) -> Result<Vec<usize>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| {
                CliError::Config(format!("Invalid integer value for {}: {}", key, s))
            })
        })
        .collect()
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "labeling.context" => {
                config
                    .labeling
                    .get_or_insert_with(Default::default)
                    .context = Some(value_str.to_string());
            }
            "labeling.residues" => {
                config
                    .labeling
                    .get_or_insert_with(Default::default)
                    .residues = Some(parse_residue_list(key, value_str)?);
            }
            "labeling.repair-n-terminus" => {
                config
                    .labeling
                    .get_or_insert_with(Default::default)
                    .repair_n_terminus = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid boolean value for {}: {}", key, value_str))
                })?);
            }
            "labeling.templates-path" => {
                config
                    .labeling
                    .get_or_insert_with(Default::default)
                    .templates_path = Some(PathBuf::from(value_str));
            }
            "output.name" => {
                config.output.get_or_insert_with(Default::default).name =
                    Some(value_str.to_string());
            }
            "output.report-path" => {
                config
                    .output
                    .get_or_insert_with(Default::default)
                    .report_path = Some(PathBuf::from(value_str));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
