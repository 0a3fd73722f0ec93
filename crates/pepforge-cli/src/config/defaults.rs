pub struct DefaultsConfig {
    pub context: String,
    pub repair_n_terminus: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            context: "auto".to_string(),
            repair_n_terminus: true,
        }
    }
}
