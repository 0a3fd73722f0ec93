use super::templates::{Context, TemplateSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Which residues of a structure are labeled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResidueSelection {
    #[default]
    All,
    List(Vec<usize>),
}

impl ResidueSelection {
    /// Filters `available` (ascending substructure ids) down to the selection.
    ///
    /// Listed ids that are not present are returned in the second vector so
    /// callers can report them.
    pub fn resolve(&self, available: &[usize]) -> (Vec<usize>, Vec<usize>) {
        match self {
            ResidueSelection::All => (available.to_vec(), Vec::new()),
            ResidueSelection::List(ids) => {
                let mut selected: Vec<usize> = ids.clone();
                selected.sort_unstable();
                selected.dedup();
                selected
                    .into_iter()
                    .partition(|id| available.binary_search(id).is_ok())
            }
        }
    }
}

/// How the residue context passed to the locator is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextSelection {
    /// Infer from the residue's position among all substructures.
    #[default]
    Auto,
    Fixed(Context),
}

impl ContextSelection {
    /// Context for `subst_id` given every substructure id of the structure.
    ///
    /// With [`ContextSelection::Auto`], a lone residue is [`Context::Individual`],
    /// the lowest id is the N-terminus, the highest the C-terminus and anything
    /// in between is amide-linked on both sides.
    pub fn context_for(&self, subst_id: usize, all_ids: &[usize]) -> Context {
        match self {
            ContextSelection::Fixed(context) => *context,
            ContextSelection::Auto => {
                let first = all_ids.iter().min().copied();
                let last = all_ids.iter().max().copied();
                match (first, last) {
                    (Some(first), Some(last)) if first == last => Context::Individual,
                    (Some(first), _) if subst_id == first => Context::NTerminus,
                    (_, Some(last)) if subst_id == last => Context::CTerminus,
                    (None, _) | (_, None) => Context::Individual,
                    _ => Context::AmideLinked,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelingConfig {
    pub residues: ResidueSelection,
    pub context: ContextSelection,
    pub templates: TemplateSet,
    pub repair_n_terminus: bool,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            residues: ResidueSelection::All,
            context: ContextSelection::Auto,
            templates: TemplateSet::builtin(),
            repair_n_terminus: true,
        }
    }
}

#[derive(Default)]
pub struct LabelingConfigBuilder {
    residues: Option<ResidueSelection>,
    context: Option<ContextSelection>,
    templates: Option<TemplateSet>,
    repair_n_terminus: Option<bool>,
}

impl LabelingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn residues(mut self, selection: ResidueSelection) -> Self {
        self.residues = Some(selection);
        self
    }
    pub fn context(mut self, selection: ContextSelection) -> Self {
        self.context = Some(selection);
        self
    }
    pub fn templates(mut self, templates: TemplateSet) -> Self {
        self.templates = Some(templates);
        self
    }
    pub fn repair_n_terminus(mut self, enabled: bool) -> Self {
        self.repair_n_terminus = Some(enabled);
        self
    }

    pub fn build(self) -> Result<LabelingConfig, ConfigError> {
        let residues = self.residues.unwrap_or_default();
        if let ResidueSelection::List(ids) = &residues {
            if ids.is_empty() {
                return Err(ConfigError::InvalidParameter {
                    name: "residues",
                    reason: "residue list is empty".into(),
                });
            }
            if ids.contains(&0) {
                return Err(ConfigError::InvalidParameter {
                    name: "residues",
                    reason: "substructure ids start at 1".into(),
                });
            }
        }
        Ok(LabelingConfig {
            residues,
            context: self.context.unwrap_or_default(),
            templates: self.templates.unwrap_or_default(),
            repair_n_terminus: self.repair_n_terminus.unwrap_or(true),
        })
    }
}
