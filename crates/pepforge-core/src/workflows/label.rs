use crate::core::models::molecule::Molecule;
use crate::engine::config::LabelingConfig;
use crate::engine::editor::IdMap;
use crate::engine::error::EngineError;
use crate::engine::locator::{LocateFailure, Locator};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::templates::Context;
use std::fmt;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidueStatus {
    Found,
    NotFound { reason: LocateFailure },
    Failed { reason: String },
}

impl ResidueStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ResidueStatus::Found => "found",
            ResidueStatus::NotFound { .. } => "not-found",
            ResidueStatus::Failed { .. } => "failed",
        }
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            ResidueStatus::Found => None,
            ResidueStatus::NotFound { reason } => Some(reason.to_string()),
            ResidueStatus::Failed { reason } => Some(reason.clone()),
        }
    }
}

impl fmt::Display for ResidueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{} ({})", self.label(), reason),
            None => f.write_str(self.label()),
        }
    }
}

/// Per-residue outcome of [`run`]. Atom ids refer to the final molecule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueReport {
    pub subst_id: usize,
    pub subst_name: String,
    pub context: Context,
    pub status: ResidueStatus,
    pub backbone: Vec<usize>,
    pub nitrogen_hydrogens: Vec<usize>,
    pub hydroxyl_oxygens: Vec<usize>,
    pub resolved_oxygens: Vec<usize>,
    pub repaired: bool,
}

impl ResidueReport {
    fn remap(&mut self, map: &IdMap) {
        self.backbone = map.remap_atoms(&self.backbone);
        self.nitrogen_hydrogens = map.remap_atoms(&self.nitrogen_hydrogens);
        self.hydroxyl_oxygens = map.remap_atoms(&self.hydroxyl_oxygens);
        self.resolved_oxygens = map.remap_atoms(&self.resolved_oxygens);
    }
}

#[derive(Debug, Clone)]
pub struct LabelingResult {
    pub molecule: Molecule,
    pub reports: Vec<ResidueReport>,
    /// Requested substructure ids that the structure does not contain.
    pub missing_residues: Vec<usize>,
}

impl LabelingResult {
    pub fn found_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.status == ResidueStatus::Found)
            .count()
    }

    pub fn all_found(&self) -> bool {
        self.missing_residues.is_empty() && self.found_count() == self.reports.len()
    }
}

/// Labels the backbone of every selected residue.
///
/// Residues are processed in ascending substructure order, each on the
/// molecule produced by the previous one. A residue whose search errors is
/// reported as [`ResidueStatus::Failed`] and the molecule from before it is
/// kept; the batch always runs to the end.
///
/// # Errors
///
/// Returns [`EngineError::Precondition`] only when the structure has no atoms.
#[instrument(skip_all, name = "labeling_workflow")]
pub fn run(
    molecule: &Molecule,
    config: &LabelingConfig,
    reporter: &ProgressReporter,
) -> Result<LabelingResult, EngineError> {
    if molecule.atoms().is_empty() {
        return Err(EngineError::Precondition {
            operation: "label",
            reason: "structure has no atoms".into(),
        });
    }

    let all_ids = molecule.substructure_ids();
    let (selected, missing_residues) = config.residues.resolve(&all_ids);
    for subst_id in &missing_residues {
        warn!(subst_id, "Requested residue is not present in the structure.");
    }

    let locator = Locator::new(&config.templates).repair_n_terminus(config.repair_n_terminus);
    let mut working = molecule.clone();
    let mut reports: Vec<ResidueReport> = Vec::with_capacity(selected.len());

    reporter.report(Progress::LabelingStart {
        total_residues: selected.len() as u64,
    });
    for subst_id in selected {
        reporter.report(Progress::ResidueStart { subst_id });
        let context = config.context.context_for(subst_id, &all_ids);
        let subst_name = working
            .residue_atoms(subst_id)
            .next()
            .map(|a| a.subst_name.clone())
            .unwrap_or_default();

        let report = match locator.locate(working.clone(), subst_id, context) {
            Ok(outcome) => {
                if let Some(map) = &outcome.renumbering {
                    for earlier in reports.iter_mut() {
                        earlier.remap(map);
                    }
                }
                working = outcome.molecule;
                let record = outcome.record;
                let status = match record.failure {
                    None if record.found => ResidueStatus::Found,
                    Some(reason) => ResidueStatus::NotFound { reason },
                    None => ResidueStatus::Failed {
                        reason: "search ended without a result".into(),
                    },
                };
                ResidueReport {
                    subst_id,
                    subst_name,
                    context,
                    status,
                    backbone: record.backbone,
                    nitrogen_hydrogens: record.nitrogen_hydrogens,
                    hydroxyl_oxygens: record.hydroxyl_oxygens,
                    resolved_oxygens: record.resonance_oxygens,
                    repaired: record.repaired,
                }
            }
            Err(e) => {
                warn!(subst_id, error = %e, "Residue labeling failed; keeping previous structure.");
                ResidueReport {
                    subst_id,
                    subst_name,
                    context,
                    status: ResidueStatus::Failed {
                        reason: e.to_string(),
                    },
                    backbone: Vec::new(),
                    nitrogen_hydrogens: Vec::new(),
                    hydroxyl_oxygens: Vec::new(),
                    resolved_oxygens: Vec::new(),
                    repaired: false,
                }
            }
        };

        info!(subst_id, %context, status = %report.status, "Residue processed.");
        reporter.report(Progress::ResidueFinish {
            subst_id,
            found: report.status == ResidueStatus::Found,
        });
        reports.push(report);
    }
    reporter.report(Progress::LabelingFinish);

    Ok(LabelingResult {
        molecule: working,
        reports,
        missing_residues,
    })
}

/// Lowest and highest substructure ids that carry backbone atoms.
///
/// These are the residues a chain-assembly step treats as N- and C-terminus.
pub fn terminal_residues(molecule: &Molecule) -> Option<(usize, usize)> {
    let grouped = molecule.backbone_atoms_by_residue();
    let first = grouped.keys().next().copied()?;
    let last = grouped.keys().next_back().copied()?;
    Some((first, last))
}
