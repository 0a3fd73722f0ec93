use pepforge::engine::config as core_config;
use std::path::PathBuf;

pub struct AppConfig {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub core_config: core_config::LabelingConfig,
    /// Replaces the molecule name read from each input.
    pub molecule_name: Option<String>,
    /// Replaces the comment banner read from each input.
    pub banner: Option<Vec<String>>,
    pub report_path: Option<PathBuf>,
}
