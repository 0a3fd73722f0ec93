use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileLabelingConfig {
    pub context: Option<String>,
    pub residues: Option<Vec<usize>>,
    pub repair_n_terminus: Option<bool>,
    pub templates_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileOutputConfig {
    pub name: Option<String>,
    pub banner: Option<Vec<String>>,
    pub report_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub labeling: Option<FileLabelingConfig>,
    pub output: Option<FileOutputConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: FileConfig = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.resolve_relative_paths(path.parent().unwrap_or_else(|| Path::new("")));
        Ok(config)
    }

    // Paths in a config file are relative to the file, not the working directory.
    fn resolve_relative_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(templates) = self
            .labeling
            .as_mut()
            .and_then(|l| l.templates_path.as_mut())
        {
            resolve(templates);
        }
        if let Some(report) = self.output.as_mut().and_then(|o| o.report_path.as_mut()) {
            resolve(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn full_file_parses_with_kebab_case_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pepforge.toml");
        fs::write(
            &path,
            r#"
[labeling]
context = "n-terminus"
residues = [1, 2]
repair-n-terminus = false
templates-path = "templates.toml"

[output]
name = "GLY"
banner = ["line one"]
report-path = "/tmp/report.csv"
"#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let labeling = config.labeling.unwrap();
        assert_eq!(labeling.context.as_deref(), Some("n-terminus"));
        assert_eq!(labeling.residues, Some(vec![1, 2]));
        assert_eq!(labeling.repair_n_terminus, Some(false));
        assert_eq!(labeling.templates_path, Some(dir.path().join("templates.toml")));

        let output = config.output.unwrap();
        assert_eq!(output.name.as_deref(), Some("GLY"));
        assert_eq!(output.banner, Some(vec!["line one".to_string()]));
        assert_eq!(output.report_path, Some(PathBuf::from("/tmp/report.csv")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[labeling]\nrepair = true\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = FileConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
