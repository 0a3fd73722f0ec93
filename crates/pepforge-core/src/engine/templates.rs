use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// The backbone position an atom is being tested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Nitrogen,
    AlphaCarbon,
    CarbonylCarbon,
}

impl Role {
    /// Number of neighbors a template of this role must leave unconsumed.
    ///
    /// A Cα keeps one slot for its side chain (or the second Hα of glycine).
    pub fn residual_len(self) -> usize {
        match self {
            Role::Nitrogen | Role::CarbonylCarbon => 0,
            Role::AlphaCarbon => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Nitrogen => "nitrogen",
            Role::AlphaCarbon => "alpha-carbon",
            Role::CarbonylCarbon => "carbonyl-carbon",
        })
    }
}

/// Where a residue sits relative to the chain it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Context {
    /// A free amino acid: free amine and free carboxylate.
    Individual,
    /// First residue of a chain: free amine, amide-linked carbonyl.
    NTerminus,
    /// Last residue of a chain: amide nitrogen, free carboxylate.
    CTerminus,
    /// Inside a chain: amide nitrogen and amide-linked carbonyl.
    AmideLinked,
}

impl Context {
    pub const ALL: [Context; 4] = [
        Context::Individual,
        Context::NTerminus,
        Context::CTerminus,
        Context::AmideLinked,
    ];

    pub fn has_free_amine(self) -> bool {
        matches!(self, Context::Individual | Context::NTerminus)
    }

    pub fn has_free_carboxylate(self) -> bool {
        matches!(self, Context::Individual | Context::CTerminus)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Context::Individual => "individual",
            Context::NTerminus => "n-terminus",
            Context::CTerminus => "c-terminus",
            Context::AmideLinked => "amide-linked",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown residue context '{0}' (expected individual, n-terminus, c-terminus or amide-linked)")]
pub struct ParseContextError(pub String);

impl FromStr for Context {
    type Err = ParseContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "individual" => Ok(Context::Individual),
            "n-terminus" | "nterminus" => Ok(Context::NTerminus),
            "c-terminus" | "cterminus" => Ok(Context::CTerminus),
            "amide-linked" | "amide" => Ok(Context::AmideLinked),
            _ => Err(ParseContextError(s.to_string())),
        }
    }
}

/// Ordered neighbor-type multisets for one role, per context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ContextTemplates {
    pub individual: Vec<Vec<String>>,
    pub n_terminus: Vec<Vec<String>>,
    pub c_terminus: Vec<Vec<String>>,
    pub amide_linked: Vec<Vec<String>>,
}

impl ContextTemplates {
    pub fn for_context(&self, context: Context) -> &[Vec<String>] {
        match context {
            Context::Individual => &self.individual,
            Context::NTerminus => &self.n_terminus,
            Context::CTerminus => &self.c_terminus,
            Context::AmideLinked => &self.amide_linked,
        }
    }

    fn from_tables(
        individual: &[&[&str]],
        n_terminus: &[&[&str]],
        c_terminus: &[&[&str]],
        amide_linked: &[&[&str]],
    ) -> Self {
        let owned = |table: &[&[&str]]| -> Vec<Vec<String>> {
            table
                .iter()
                .map(|t| t.iter().map(|s| s.to_string()).collect())
                .collect()
        };
        Self {
            individual: owned(individual),
            n_terminus: owned(n_terminus),
            c_terminus: owned(c_terminus),
            amide_linked: owned(amide_linked),
        }
    }
}

const NITROGEN_FREE_AMINE: &[&[&str]] = &[
    &["C.3", "H", "H"],
    &["C.3", "H", "H", "H"],
    &["C.3", "C.3", "H"],
    &["C.3", "C.3", "H", "H"],
];
const NITROGEN_AMIDE: &[&[&str]] = &[&["C.3", "C.2", "H"], &["C.3", "C.3", "C.2"]];

const ALPHA_CARBON_FREE_AMINE: &[&[&str]] = &[&["C.2", "H", "N.3"], &["C.2", "H", "N.4"]];
const ALPHA_CARBON_AMIDE: &[&[&str]] = &[&["C.2", "H", "N.am"]];

const CARBONYL_FREE_ACID: &[&[&str]] = &[
    &["O.2", "O.3", "C.3"],
    &["O.co2", "O.co2", "O.co2", "C.3"],
];
const CARBONYL_AMIDE: &[&[&str]] = &[&["O.2", "N.am", "C.3"], &["O.2", "O.3", "C.3"]];
const CARBONYL_AMIDE_LINKED: &[&[&str]] = &[&["O.2", "N.am", "C.3"]];

#[derive(Debug, Error)]
pub enum TemplateLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Template {index} for {role} in context {context} is empty")]
    EmptyTemplate {
        role: Role,
        context: Context,
        index: usize,
    },
}

/// Indices of `neighbor_types` left over after removing one occurrence of
/// each element of `template`.
///
/// Returns `None` if some template element has no remaining occurrence.
pub fn match_residual<S: AsRef<str>>(neighbor_types: &[S], template: &[String]) -> Option<Vec<usize>> {
    let mut consumed = vec![false; neighbor_types.len()];
    for wanted in template {
        let slot = neighbor_types
            .iter()
            .enumerate()
            .position(|(i, t)| !consumed[i] && t.as_ref() == wanted)?;
        consumed[slot] = true;
    }
    Some(
        consumed
            .iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .map(|(i, _)| i)
            .collect(),
    )
}

/// The full set of neighbor templates consulted by the backbone locator.
///
/// Tables are immutable once built. The default set covers the twenty
/// standard amino acids; a replacement can be read from TOML to support
/// non-standard residues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TemplateSet {
    pub nitrogen: ContextTemplates,
    pub alpha_carbon: ContextTemplates,
    pub carbonyl_carbon: ContextTemplates,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateSet {
    pub fn builtin() -> Self {
        Self {
            nitrogen: ContextTemplates::from_tables(
                NITROGEN_FREE_AMINE,
                NITROGEN_FREE_AMINE,
                NITROGEN_AMIDE,
                NITROGEN_AMIDE,
            ),
            alpha_carbon: ContextTemplates::from_tables(
                ALPHA_CARBON_FREE_AMINE,
                ALPHA_CARBON_FREE_AMINE,
                ALPHA_CARBON_AMIDE,
                ALPHA_CARBON_AMIDE,
            ),
            carbonyl_carbon: ContextTemplates::from_tables(
                CARBONYL_FREE_ACID,
                CARBONYL_AMIDE,
                CARBONYL_FREE_ACID,
                CARBONYL_AMIDE_LINKED,
            ),
        }
    }

    pub fn load(path: &Path) -> Result<Self, TemplateLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| TemplateLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let set: Self = toml::from_str(&content).map_err(|e| TemplateLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> Result<(), TemplateLoadError> {
        for role in [Role::Nitrogen, Role::AlphaCarbon, Role::CarbonylCarbon] {
            for context in Context::ALL {
                if let Some(index) = self.templates(role, context).iter().position(Vec::is_empty) {
                    return Err(TemplateLoadError::EmptyTemplate {
                        role,
                        context,
                        index,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn templates(&self, role: Role, context: Context) -> &[Vec<String>] {
        match role {
            Role::Nitrogen => self.nitrogen.for_context(context),
            Role::AlphaCarbon => self.alpha_carbon.for_context(context),
            Role::CarbonylCarbon => self.carbonyl_carbon.for_context(context),
        }
    }

    /// Finds the first template of `(role, context)` that `neighbor_types` satisfies.
    ///
    /// # Return
    ///
    /// The index of the matching template together with the indices of the
    /// neighbors it left unconsumed, or `None` when no template matches.
    pub fn first_match<S: AsRef<str>>(
        &self,
        neighbor_types: &[S],
        role: Role,
        context: Context,
    ) -> Option<(usize, Vec<usize>)> {
        if neighbor_types.is_empty() {
            return None;
        }
        self.templates(role, context)
            .iter()
            .enumerate()
            .find_map(|(index, template)| {
                if neighbor_types.len() != template.len() + role.residual_len() {
                    return None;
                }
                match_residual(neighbor_types, template)
                    .filter(|residual| residual.len() == role.residual_len())
                    .map(|residual| (index, residual))
            })
    }

    pub fn matches<S: AsRef<str>>(&self, neighbor_types: &[S], role: Role, context: Context) -> bool {
        self.first_match(neighbor_types, role, context).is_some()
    }

    /// Renders the set as TOML in the format accepted by [`TemplateSet::load`].
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Shorthand for [`TemplateSet::matches`].
pub fn matches<S: AsRef<str>>(
    neighbor_types: &[S],
    role: Role,
    context: Context,
    templates: &TemplateSet,
) -> bool {
    templates.matches(neighbor_types, role, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn set() -> TemplateSet {
        TemplateSet::builtin()
    }

    #[test]
    fn nitrogen_free_amine_matches_in_any_order() {
        assert!(set().matches(&["H", "C.3", "H"], Role::Nitrogen, Context::Individual));
        assert!(set().matches(&["H", "H", "H", "C.3"], Role::Nitrogen, Context::NTerminus));
    }

    #[test]
    fn nitrogen_rejects_leftover_neighbors() {
        assert!(!set().matches(&["C.3", "H", "H", "O.3"], Role::Nitrogen, Context::Individual));
    }

    #[test]
    fn amide_nitrogen_requires_carbonyl_neighbor() {
        assert!(set().matches(&["C.2", "C.3", "H"], Role::Nitrogen, Context::CTerminus));
        assert!(!set().matches(&["C.3", "H", "H"], Role::Nitrogen, Context::AmideLinked));
    }

    #[test]
    fn proline_like_nitrogen_matches_second_template() {
        let (index, residual) = set()
            .first_match(&["C.3", "C.3", "H"], Role::Nitrogen, Context::Individual)
            .unwrap();
        assert_eq!(index, 2);
        assert!(residual.is_empty());
    }

    #[test]
    fn alpha_carbon_allows_exactly_one_residual() {
        let (_, residual) = set()
            .first_match(&["N.3", "C.2", "C.3", "H"], Role::AlphaCarbon, Context::Individual)
            .unwrap();
        assert_eq!(residual, vec![2]);

        assert!(!set().matches(&["N.3", "C.2", "H"], Role::AlphaCarbon, Context::Individual));
        assert!(!set().matches(
            &["N.3", "C.2", "H", "H", "H"],
            Role::AlphaCarbon,
            Context::Individual
        ));
    }

    #[test]
    fn alpha_carbon_residual_is_not_validated_by_type() {
        assert!(set().matches(&["N.am", "C.2", "H", "S.3"], Role::AlphaCarbon, Context::AmideLinked));
    }

    #[test]
    fn carbonyl_templates_depend_on_context() {
        let carboxylate = ["C.3", "O.co2", "O.co2", "O.co2"];
        assert!(set().matches(&carboxylate, Role::CarbonylCarbon, Context::Individual));
        assert!(!set().matches(&carboxylate, Role::CarbonylCarbon, Context::NTerminus));

        let amide = ["N.am", "O.2", "C.3"];
        assert!(set().matches(&amide, Role::CarbonylCarbon, Context::AmideLinked));
        assert!(!set().matches(&amide, Role::CarbonylCarbon, Context::CTerminus));
    }

    #[test]
    fn empty_neighbor_list_never_matches() {
        let empty: [&str; 0] = [];
        for context in Context::ALL {
            for role in [Role::Nitrogen, Role::AlphaCarbon, Role::CarbonylCarbon] {
                assert!(!matches(&empty, role, context, &set()));
            }
        }
    }

    #[test]
    fn match_residual_consumes_one_occurrence_per_element() {
        let template = vec!["H".to_string(), "H".to_string()];
        assert_eq!(match_residual(&["H", "C.3", "H", "H"], &template), Some(vec![1, 3]));
        assert_eq!(match_residual(&["H", "C.3"], &template), None);
    }

    #[test]
    fn context_parses_and_displays_kebab_case() {
        for context in Context::ALL {
            assert_eq!(context.to_string().parse::<Context>().unwrap(), context);
        }
        assert_eq!("N_TERMINUS".parse::<Context>().unwrap(), Context::NTerminus);
        assert!("middle".parse::<Context>().is_err());
    }

    #[test]
    fn free_amine_and_carboxylate_contexts() {
        assert!(Context::Individual.has_free_amine());
        assert!(Context::NTerminus.has_free_amine());
        assert!(!Context::CTerminus.has_free_amine());
        assert!(Context::CTerminus.has_free_carboxylate());
        assert!(!Context::AmideLinked.has_free_carboxylate());
    }

    #[test]
    fn builtin_set_survives_toml_dump_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("templates.toml");
        fs::write(&path, set().to_toml_string().unwrap()).unwrap();

        let loaded = TemplateSet::load(&path).unwrap();
        assert_eq!(loaded, set());
    }

    #[test]
    fn load_accepts_custom_templates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[nitrogen]
individual = [["C.3", "H", "H"]]
n-terminus = [["C.3", "H", "H"]]
c-terminus = [["C.3", "C.2", "H"]]
amide-linked = [["C.3", "C.2", "H"]]

[alpha-carbon]
individual = [["C.2", "H", "N.3"]]
n-terminus = [["C.2", "H", "N.3"]]
c-terminus = [["C.2", "H", "N.am"]]
amide-linked = [["C.2", "C.3", "N.am"]]

[carbonyl-carbon]
individual = [["O.2", "O.3", "C.3"]]
n-terminus = [["O.2", "N.am", "C.3"]]
c-terminus = [["O.2", "O.3", "C.3"]]
amide-linked = [["O.2", "N.am", "C.3"]]
"#,
        )
        .unwrap();

        let loaded = TemplateSet::load(&path).unwrap();
        assert!(loaded.matches(&["N.am", "C.2", "C.3", "C.3"], Role::AlphaCarbon, Context::AmideLinked));
        assert!(!loaded.matches(&["N.am", "C.2", "H", "H"], Role::AlphaCarbon, Context::AmideLinked));
    }

    #[test]
    fn load_fails_for_missing_file() {
        let result = TemplateSet::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(TemplateLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[nitrogen\nindividual = [").unwrap();
        assert!(matches!(TemplateSet::load(&path), Err(TemplateLoadError::Toml { .. })));
    }

    #[test]
    fn load_rejects_empty_templates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        let mut custom = set();
        custom.carbonyl_carbon.amide_linked.push(Vec::new());
        fs::write(&path, custom.to_toml_string().unwrap()).unwrap();

        match TemplateSet::load(&path) {
            Err(TemplateLoadError::EmptyTemplate {
                role,
                context,
                index,
            }) => {
                assert_eq!(role, Role::CarbonylCarbon);
                assert_eq!(context, Context::AmideLinked);
                assert_eq!(index, 1);
            }
            other => panic!("expected EmptyTemplate, got {:?}", other),
        }
    }
}
