use super::carboxylate::{Resolution, needs_resolution, resolve_carboxylate};
use super::editor::IdMap;
use super::error::EngineError;
use super::neighbors::neighbors;
use super::protonation::protonate_n_terminus;
use super::templates::{Context, Role, TemplateSet};
use crate::core::models::atom::AtomStatus;
use crate::core::models::molecule::Molecule;
use crate::core::utils::identifiers::{
    ALPHA_CARBON_TYPE, CARBONYL_CARBON_TYPE, CARBONYL_OXYGEN_TYPE, HYDROGEN_TYPE,
    HYDROXYL_OXYGEN_TYPE, is_backbone_nitrogen_type,
};
use itertools::Itertools;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// The furthest stage a failed search reached.
///
/// Variants are ordered by depth so the most informative reason across all
/// candidates can be kept with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocateFailure {
    /// The residue has no atom typed `N.3`, `N.4` or `N.am`.
    NoCandidateNitrogen,
    /// No candidate nitrogen matched a nitrogen template.
    NitrogenMismatch,
    /// A nitrogen matched, but none of its `C.3` neighbors qualified as Cα.
    AlphaCarbonMismatch,
    /// A Cα qualified, but none of its `C.2` neighbors matched a carbonyl template.
    CarbonylMismatch,
}

impl fmt::Display for LocateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocateFailure::NoCandidateNitrogen => "no candidate backbone nitrogen",
            LocateFailure::NitrogenMismatch => "no nitrogen matched its templates",
            LocateFailure::AlphaCarbonMismatch => "no alpha carbon matched its templates",
            LocateFailure::CarbonylMismatch => "no carbonyl carbon matched its templates",
        })
    }
}

/// Result of one backbone search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackboneRecord {
    pub found: bool,
    /// `[N, Cα, C]`, followed by the carbonyl `O.2` when there is one.
    pub backbone: Vec<usize>,
    pub nitrogen_hydrogens: Vec<usize>,
    pub hydroxyl_oxygens: Vec<usize>,
    /// Oxygens that were `O.co2` before the carboxylate was resolved.
    pub resonance_oxygens: Vec<usize>,
    /// Distinct `C.3` atoms bonded to the nitrogen.
    pub nitrogen_carbons: usize,
    /// Whether the N-terminus was protonated on the way.
    pub repaired: bool,
    pub failure: Option<LocateFailure>,
}

impl BackboneRecord {
    fn not_found(failure: LocateFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn nitrogen(&self) -> Option<usize> {
        self.backbone.first().copied()
    }

    pub fn alpha_carbon(&self) -> Option<usize> {
        self.backbone.get(1).copied()
    }

    pub fn carbonyl_carbon(&self) -> Option<usize> {
        self.backbone.get(2).copied()
    }

    pub fn carbonyl_oxygen(&self) -> Option<usize> {
        self.backbone.get(3).copied()
    }
}

#[derive(Debug, Clone)]
pub struct LocateOutcome {
    pub molecule: Molecule,
    pub record: BackboneRecord,
    /// Set when a repair renumbered the atom table; maps input ids to output ids.
    pub renumbering: Option<IdMap>,
}

/// Searches one residue for its N–Cα–C(=O) backbone.
///
/// The search walks candidate nitrogens in atom-table order, then their
/// `C.3` neighbors, then the `C.2` neighbors of an accepted Cα, and stops
/// at the first complete match. Carboxylate resolution is tried on a copy
/// and kept only when the carbonyl template then matches, so a failed search
/// hands back the molecule it was given.
#[derive(Debug, Clone, Copy)]
pub struct Locator<'a> {
    templates: &'a TemplateSet,
    repair_n_terminus: bool,
}

impl<'a> Locator<'a> {
    pub fn new(templates: &'a TemplateSet) -> Self {
        Self {
            templates,
            repair_n_terminus: true,
        }
    }

    /// Enables or disables protonation of a two-hydrogen N-terminus.
    pub fn repair_n_terminus(mut self, enabled: bool) -> Self {
        self.repair_n_terminus = enabled;
        self
    }

    /// Locates and labels the backbone of residue `subst_id`.
    ///
    /// For a free amine whose nitrogen carries only two hydrogens and a
    /// single `C.3`, the N-terminus is protonated and the search repeated
    /// once on the repaired molecule. A secondary ammonium such as proline's
    /// is already complete and is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ResidueNotFound`] for an empty residue,
    /// [`EngineError::RepairPostcondition`] if the repeated search does not
    /// find a three-hydrogen nitrogen, and propagates graph errors such as
    /// [`EngineError::UnresolvedAtomReference`].
    #[instrument(skip_all, name = "locate_backbone", fields(subst_id = subst_id, context = %context))]
    pub fn locate(
        &self,
        molecule: Molecule,
        subst_id: usize,
        context: Context,
    ) -> Result<LocateOutcome, EngineError> {
        let (molecule, record) = self.locate_once(molecule, subst_id, context)?;

        let needs_repair = record.found
            && self.repair_n_terminus
            && context.has_free_amine()
            && record.nitrogen_hydrogens.len() == 2
            && record.nitrogen_carbons == 1;
        if !needs_repair {
            if !record.found {
                warn!(failure = ?record.failure, "Backbone not found.");
            }
            return Ok(LocateOutcome {
                molecule,
                record,
                renumbering: None,
            });
        }

        let (Some(nitrogen_id), Some(alpha_id)) = (record.nitrogen(), record.alpha_carbon()) else {
            return Err(EngineError::Internal(
                "found backbone is missing its nitrogen or alpha carbon".into(),
            ));
        };
        info!(nitrogen_id, "N-terminus carries two hydrogens; protonating and retrying.");
        let protonation = protonate_n_terminus(molecule, nitrogen_id, alpha_id)?;
        let (molecule, mut retried) = self.locate_once(protonation.molecule, subst_id, context)?;

        let expected_nitrogen = protonation.id_map.atom(nitrogen_id);
        if !retried.found || retried.nitrogen() != expected_nitrogen {
            return Err(EngineError::RepairPostcondition {
                nitrogen_id,
                reason: match retried.failure {
                    Some(failure) => format!("repeated search failed: {}", failure),
                    None => "repeated search settled on a different nitrogen".into(),
                },
            });
        }
        if retried.nitrogen_hydrogens.len() != 3 {
            return Err(EngineError::RepairPostcondition {
                nitrogen_id,
                reason: format!(
                    "nitrogen carries {} hydrogens after repair",
                    retried.nitrogen_hydrogens.len()
                ),
            });
        }

        let mut resonance = protonation.id_map.remap_atoms(&record.resonance_oxygens);
        resonance.extend(retried.resonance_oxygens.drain(..));
        retried.resonance_oxygens = unique_in_order(resonance);
        retried.repaired = true;

        Ok(LocateOutcome {
            molecule,
            record: retried,
            renumbering: Some(protonation.id_map),
        })
    }

    /// Runs the search once, without the N-terminus repair.
    pub fn locate_once(
        &self,
        molecule: Molecule,
        subst_id: usize,
        context: Context,
    ) -> Result<(Molecule, BackboneRecord), EngineError> {
        if molecule.residue_atoms(subst_id).next().is_none() {
            return Err(EngineError::ResidueNotFound { subst_id });
        }

        let candidates: Vec<usize> = molecule
            .residue_atoms(subst_id)
            .filter(|a| is_backbone_nitrogen_type(&a.atom_type))
            .map(|a| a.id)
            .collect();
        if candidates.is_empty() {
            debug!("Residue has no candidate nitrogen.");
            return Ok((
                molecule,
                BackboneRecord::not_found(LocateFailure::NoCandidateNitrogen),
            ));
        }

        let mut deepest = LocateFailure::NitrogenMismatch;
        for nitrogen_id in candidates {
            let n_neighbors = neighbors(&molecule, nitrogen_id)?;
            if !self
                .templates
                .matches(&n_neighbors.types, Role::Nitrogen, context)
            {
                debug!(nitrogen_id, types = ?n_neighbors.types, "Nitrogen rejected.");
                continue;
            }
            debug!(nitrogen_id, "Nitrogen accepted.");

            for alpha_id in unique_in_order(n_neighbors.ids_of(ALPHA_CARBON_TYPE)) {
                let ca_neighbors = neighbors(&molecule, alpha_id)?;
                let Some((_, residual)) =
                    self.templates
                        .first_match(&ca_neighbors.types, Role::AlphaCarbon, context)
                else {
                    debug!(alpha_id, types = ?ca_neighbors.types, "Alpha carbon rejected.");
                    deepest = deepest.max(LocateFailure::AlphaCarbonMismatch);
                    continue;
                };
                if residual.iter().any(|i| ca_neighbors.ids[*i] == nitrogen_id) {
                    debug!(alpha_id, "Alpha carbon rejected: residual neighbor is the nitrogen.");
                    deepest = deepest.max(LocateFailure::AlphaCarbonMismatch);
                    continue;
                }
                debug!(alpha_id, "Alpha carbon accepted.");

                for carbon_id in unique_in_order(ca_neighbors.ids_of(CARBONYL_CARBON_TYPE)) {
                    match self.match_carbonyl(&molecule, carbon_id, context)? {
                        CarbonylMatch::Rejected => {
                            deepest = deepest.max(LocateFailure::CarbonylMismatch);
                        }
                        CarbonylMatch::Accepted => {
                            return complete(molecule, [nitrogen_id, alpha_id, carbon_id], Vec::new());
                        }
                        CarbonylMatch::AcceptedAfterResolution(resolution) => {
                            let resonance = resolution.resolved_oxygens();
                            return complete(
                                resolution.molecule,
                                [nitrogen_id, alpha_id, carbon_id],
                                resonance,
                            );
                        }
                    }
                }
            }
        }

        debug!(failure = ?deepest, "Search exhausted all candidates.");
        Ok((molecule, BackboneRecord::not_found(deepest)))
    }

    fn match_carbonyl(
        &self,
        molecule: &Molecule,
        carbon_id: usize,
        context: Context,
    ) -> Result<CarbonylMatch, EngineError> {
        if needs_resolution(molecule, carbon_id)? {
            let resolution = resolve_carboxylate(molecule.clone(), carbon_id, context)?;
            let types = neighbors(&resolution.molecule, carbon_id)?.types;
            if self
                .templates
                .matches(&types, Role::CarbonylCarbon, context)
            {
                debug!(carbon_id, "Carbonyl carbon accepted after carboxylate resolution.");
                return Ok(CarbonylMatch::AcceptedAfterResolution(resolution));
            }
            debug!(carbon_id, types = ?types, "Carbonyl carbon rejected; discarding resolution.");
            return Ok(CarbonylMatch::Rejected);
        }

        let types = neighbors(molecule, carbon_id)?.types;
        if self
            .templates
            .matches(&types, Role::CarbonylCarbon, context)
        {
            debug!(carbon_id, "Carbonyl carbon accepted.");
            Ok(CarbonylMatch::Accepted)
        } else {
            debug!(carbon_id, types = ?types, "Carbonyl carbon rejected.");
            Ok(CarbonylMatch::Rejected)
        }
    }
}

enum CarbonylMatch {
    Rejected,
    Accepted,
    AcceptedAfterResolution(Resolution),
}

fn complete(
    mut molecule: Molecule,
    [nitrogen_id, alpha_id, carbon_id]: [usize; 3],
    resonance_oxygens: Vec<usize>,
) -> Result<(Molecule, BackboneRecord), EngineError> {
    let c_neighbors = neighbors(&molecule, carbon_id)?;
    let mut backbone = vec![nitrogen_id, alpha_id, carbon_id];
    backbone.extend(c_neighbors.first_of(CARBONYL_OXYGEN_TYPE));

    for atom_id in &backbone {
        molecule
            .atom_mut(*atom_id)
            .ok_or(EngineError::AtomNotFound { atom_id: *atom_id })?
            .status = AtomStatus::Backbone;
    }

    let n_neighbors = neighbors(&molecule, nitrogen_id)?;
    let record = BackboneRecord {
        found: true,
        nitrogen_hydrogens: unique_in_order(n_neighbors.ids_of(HYDROGEN_TYPE)),
        nitrogen_carbons: unique_in_order(n_neighbors.ids_of(ALPHA_CARBON_TYPE)).len(),
        hydroxyl_oxygens: unique_in_order(c_neighbors.ids_of(HYDROXYL_OXYGEN_TYPE)),
        resonance_oxygens,
        backbone,
        repaired: false,
        failure: None,
    };
    info!(backbone = ?record.backbone, "Backbone located.");
    Ok((molecule, record))
}

fn unique_in_order(ids: Vec<usize>) -> Vec<usize> {
    ids.into_iter().unique().collect()
}

/// Shorthand for [`Locator::locate`] with N-terminus repair enabled.
pub fn locate_backbone(
    molecule: Molecule,
    subst_id: usize,
    context: Context,
    templates: &TemplateSet,
) -> Result<LocateOutcome, EngineError> {
    Locator::new(templates).locate(molecule, subst_id, context)
}
