use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::{Atom, AtomStatus};
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondType};
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, warn};

const SECTION_PREFIX: &str = "@<TRIPOS>";
const DEFAULT_MOLECULE_TYPE: &str = "SMALL";
const DEFAULT_CHARGE_TYPE: &str = "NO_CHARGES";

/// Column layout of the `@<TRIPOS>ATOM` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomSchema {
    /// `id name x y z type subst_id subst_name charge`
    Basic,
    /// [`AtomSchema::Basic`] followed by a status column.
    WithStatus,
}

impl AtomSchema {
    pub fn columns(self) -> usize {
        match self {
            AtomSchema::Basic => 9,
            AtomSchema::WithStatus => 10,
        }
    }

    pub fn from_column_count(count: usize) -> Option<Self> {
        match count {
            9 => Some(AtomSchema::Basic),
            10 => Some(AtomSchema::WithStatus),
            _ => None,
        }
    }
}

/// Column layout of the `@<TRIPOS>BOND` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondSchema {
    /// `id origin target type`
    Basic,
    /// [`BondSchema::Basic`] followed by a status column.
    WithStatus,
}

impl BondSchema {
    pub fn columns(self) -> usize {
        match self {
            BondSchema::Basic => 4,
            BondSchema::WithStatus => 5,
        }
    }

    pub fn from_column_count(count: usize) -> Option<Self> {
        match count {
            4 => Some(BondSchema::Basic),
            5 => Some(BondSchema::WithStatus),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mol2Metadata {
    pub name: String,
    pub molecule_type: String,
    pub charge_type: String,
    /// Comment lines written above the `MOLECULE` section, without the leading `#`.
    pub banner: Vec<String>,
    pub atom_schema: Option<AtomSchema>,
    pub bond_schema: Option<BondSchema>,
    /// `SUBSTRUCTURE` records as read. The writer regenerates this section from
    /// the atom table, so these are informational only.
    pub substructure_lines: Vec<String>,
}

impl Default for Mol2Metadata {
    fn default() -> Self {
        Self {
            name: "****".to_string(),
            molecule_type: DEFAULT_MOLECULE_TYPE.to_string(),
            charge_type: DEFAULT_CHARGE_TYPE.to_string(),
            banner: vec![format!("Created by pepforge {}", env!("CARGO_PKG_VERSION"))],
            atom_schema: None,
            bond_schema: None,
            substructure_lines: Vec::new(),
        }
    }
}

impl Mol2Metadata {
    /// Metadata for writing a structure under a new molecule name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum Mol2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Missing required section: @<TRIPOS>{0}")]
    MissingSection(&'static str),
    #[error(
        "Malformed {section} record on line {line}: found {found} columns, expected {expected}"
    )]
    MalformedColumnCount {
        line: usize,
        section: &'static str,
        found: usize,
        expected: String,
    },
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: Mol2ParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

#[derive(Debug, Error)]
pub enum Mol2ParseErrorKind {
    #[error("Invalid integer in field '{field}' (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float in field '{field}' (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Invalid bond type '{0}'")]
    InvalidBondType(String),
    #[error("Atom id must be positive")]
    ZeroAtomId,
    #[error("Duplicate atom id {0}")]
    DuplicateAtomId(usize),
    #[error("Bond {bond_id} connects atom {atom_id} to itself")]
    SelfLoop { bond_id: usize, atom_id: usize },
    #[error("Molecule name line is missing")]
    MissingMoleculeName,
    #[error("UNITY_ATOM_ATTR header must be 'atom_id count'")]
    InvalidUnityHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Molecule,
    Atom,
    UnityAtomAttr,
    Bond,
    Substructure,
    Other,
}

fn parse_usize(token: &str, field: &'static str, line: usize) -> Result<usize, Mol2Error> {
    token.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidInt {
            field,
            value: token.into(),
        },
    })
}

fn parse_f64(token: &str, field: &'static str, line: usize) -> Result<f64, Mol2Error> {
    token.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidFloat {
            field,
            value: token.into(),
        },
    })
}

fn parse_atom_line(tokens: &[&str], schema: AtomSchema, line: usize) -> Result<Atom, Mol2Error> {
    let id = parse_usize(tokens[0], "atom_id", line)?;
    if id == 0 {
        return Err(Mol2Error::Parse {
            line,
            kind: Mol2ParseErrorKind::ZeroAtomId,
        });
    }
    let position = Point3::new(
        parse_f64(tokens[2], "x", line)?,
        parse_f64(tokens[3], "y", line)?,
        parse_f64(tokens[4], "z", line)?,
    );
    let mut atom = Atom::new(id, tokens[1], tokens[5], position)
        .in_substructure(parse_usize(tokens[6], "subst_id", line)?, tokens[7]);
    atom.charge = parse_f64(tokens[8], "charge", line)?;
    atom.status = match schema {
        AtomSchema::Basic => AtomStatus::None,
        AtomSchema::WithStatus => tokens[9].parse().unwrap_or_else(|_| {
            debug!(line, status = tokens[9], "Discarding unrecognized atom status.");
            AtomStatus::None
        }),
    };
    Ok(atom)
}

fn parse_bond_line(tokens: &[&str], schema: BondSchema, line: usize) -> Result<Bond, Mol2Error> {
    let id = parse_usize(tokens[0], "bond_id", line)?;
    let origin = parse_usize(tokens[1], "origin_atom_id", line)?;
    let target = parse_usize(tokens[2], "target_atom_id", line)?;
    if origin == target {
        return Err(Mol2Error::Parse {
            line,
            kind: Mol2ParseErrorKind::SelfLoop {
                bond_id: id,
                atom_id: origin,
            },
        });
    }
    let bond_type: BondType = tokens[3].parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidBondType(tokens[3].to_string()),
    })?;
    let mut bond = Bond::new(id, origin, target, bond_type);
    if schema == BondSchema::WithStatus {
        bond.status_bits = tokens[4].to_string();
    }
    Ok(bond)
}

const FIELD_WIDTH: usize = 9;

/// Empty text fields would shift the column count on re-read.
fn or_placeholder(field: &str) -> &str {
    if field.trim().is_empty() { "****" } else { field }
}

/// A text field cut to the column width.
fn column_field(field: &str) -> &str {
    let field = or_placeholder(field);
    match field.char_indices().nth(FIELD_WIDTH) {
        Some((end, _)) => &field[..end],
        None => field,
    }
}

pub struct Mol2File;

impl MolecularFile for Mol2File {
    type Metadata = Mol2Metadata;
    type Error = Mol2Error;

    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let mut metadata = Mol2Metadata {
            banner: Vec::new(),
            ..Default::default()
        };
        let mut atoms: Vec<Atom> = Vec::new();
        let mut bonds: Vec<Bond> = Vec::new();
        let mut seen_atom_ids = HashSet::new();
        let mut seen_sections: HashSet<&'static str> = HashSet::new();

        let mut unity_attributes: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        let mut unity_pending: Option<(usize, usize)> = None;

        let mut section = Section::None;
        let mut molecule_lines_seen = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if let Some(comment) = trimmed.strip_prefix('#') {
                if section == Section::None && !comment.trim().is_empty() {
                    metadata.banner.push(comment.trim().to_string());
                }
                continue;
            }

            if let Some(header) = trimmed.strip_prefix(SECTION_PREFIX) {
                section = match header.trim() {
                    "MOLECULE" => {
                        seen_sections.insert("MOLECULE");
                        molecule_lines_seen = 0;
                        Section::Molecule
                    }
                    "ATOM" => {
                        seen_sections.insert("ATOM");
                        Section::Atom
                    }
                    "UNITY_ATOM_ATTR" => Section::UnityAtomAttr,
                    "BOND" => {
                        seen_sections.insert("BOND");
                        Section::Bond
                    }
                    "SUBSTRUCTURE" => Section::Substructure,
                    other => {
                        debug!(section = other, "Skipping unsupported MOL2 section.");
                        Section::Other
                    }
                };
                continue;
            }

            match section {
                Section::Molecule => {
                    molecule_lines_seen += 1;
                    match molecule_lines_seen {
                        1 => {
                            if trimmed.is_empty() {
                                return Err(Mol2Error::Parse {
                                    line: line_num,
                                    kind: Mol2ParseErrorKind::MissingMoleculeName,
                                });
                            }
                            metadata.name = trimmed.to_string();
                        }
                        3 if !trimmed.is_empty() => metadata.molecule_type = trimmed.to_string(),
                        4 if !trimmed.is_empty() => metadata.charge_type = trimmed.to_string(),
                        _ => {}
                    }
                }
                _ if trimmed.is_empty() => {}
                Section::Atom => {
                    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
                    let schema = match metadata.atom_schema {
                        Some(schema) => schema,
                        None => {
                            let schema = AtomSchema::from_column_count(tokens.len()).ok_or(
                                Mol2Error::MalformedColumnCount {
                                    line: line_num,
                                    section: "ATOM",
                                    found: tokens.len(),
                                    expected: "9 or 10".into(),
                                },
                            )?;
                            metadata.atom_schema = Some(schema);
                            schema
                        }
                    };
                    if tokens.len() != schema.columns() {
                        return Err(Mol2Error::MalformedColumnCount {
                            line: line_num,
                            section: "ATOM",
                            found: tokens.len(),
                            expected: schema.columns().to_string(),
                        });
                    }
                    let atom = parse_atom_line(&tokens, schema, line_num)?;
                    if !seen_atom_ids.insert(atom.id) {
                        return Err(Mol2Error::Parse {
                            line: line_num,
                            kind: Mol2ParseErrorKind::DuplicateAtomId(atom.id),
                        });
                    }
                    atoms.push(atom);
                }
                Section::UnityAtomAttr => match unity_pending {
                    Some((atom_id, remaining)) => {
                        unity_attributes
                            .entry(atom_id)
                            .or_default()
                            .push(trimmed.to_string());
                        unity_pending = (remaining > 1).then_some((atom_id, remaining - 1));
                    }
                    None => {
                        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
                        let (atom_id, count) = match tokens.as_slice() {
                            [id, count] => (
                                parse_usize(id, "atom_id", line_num)?,
                                parse_usize(count, "num_attributes", line_num)?,
                            ),
                            _ => {
                                return Err(Mol2Error::Parse {
                                    line: line_num,
                                    kind: Mol2ParseErrorKind::InvalidUnityHeader,
                                });
                            }
                        };
                        unity_attributes.entry(atom_id).or_default();
                        unity_pending = (count > 0).then_some((atom_id, count));
                    }
                },
                Section::Bond => {
                    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
                    let schema = match metadata.bond_schema {
                        Some(schema) => schema,
                        None => {
                            let schema = BondSchema::from_column_count(tokens.len()).ok_or(
                                Mol2Error::MalformedColumnCount {
                                    line: line_num,
                                    section: "BOND",
                                    found: tokens.len(),
                                    expected: "4 or 5".into(),
                                },
                            )?;
                            metadata.bond_schema = Some(schema);
                            schema
                        }
                    };
                    if tokens.len() != schema.columns() {
                        return Err(Mol2Error::MalformedColumnCount {
                            line: line_num,
                            section: "BOND",
                            found: tokens.len(),
                            expected: schema.columns().to_string(),
                        });
                    }
                    bonds.push(parse_bond_line(&tokens, schema, line_num)?);
                }
                Section::Substructure => metadata.substructure_lines.push(trimmed.to_string()),
                Section::None | Section::Other => {}
            }
        }

        for required in ["MOLECULE", "ATOM", "BOND"] {
            if !seen_sections.contains(required) {
                return Err(Mol2Error::MissingSection(required));
            }
        }

        let mut index_by_id: HashMap<usize, usize> = HashMap::new();
        for (index, atom) in atoms.iter().enumerate() {
            index_by_id.insert(atom.id, index);
        }
        for (atom_id, lines) in unity_attributes {
            let index = index_by_id.get(&atom_id).ok_or_else(|| {
                Mol2Error::Inconsistency(format!(
                    "UNITY_ATOM_ATTR references unknown atom {}",
                    atom_id
                ))
            })?;
            atoms[*index].unity_attributes = lines;
        }

        for bond in &bonds {
            for endpoint in [bond.origin, bond.target] {
                if !index_by_id.contains_key(&endpoint) {
                    warn!(
                        bond_id = bond.id,
                        atom_id = endpoint,
                        "Bond references an atom that is not in the ATOM section."
                    );
                }
            }
        }

        if metadata.banner.is_empty() {
            metadata.banner = Mol2Metadata::default().banner;
        }

        debug!(
            atoms = atoms.len(),
            bonds = bonds.len(),
            name = %metadata.name,
            "Parsed MOL2 structure."
        );
        Ok((Molecule::from_tables(atoms, bonds), metadata))
    }

    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let atom_ids: HashSet<usize> = molecule.atoms().iter().map(|a| a.id).collect();
        for bond in molecule.bonds() {
            for endpoint in [bond.origin, bond.target] {
                if !atom_ids.contains(&endpoint) {
                    return Err(Mol2Error::Inconsistency(format!(
                        "Bond {} references missing atom {}",
                        bond.id, endpoint
                    )));
                }
            }
        }

        writeln!(writer, "#")?;
        for line in &metadata.banner {
            writeln!(writer, "# {}", line)?;
        }
        writeln!(writer, "#")?;

        writeln!(writer, "{}MOLECULE", SECTION_PREFIX)?;
        writeln!(writer, "{}", metadata.name)?;
        writeln!(writer, "{} {}", molecule.max_atom_id(), molecule.max_bond_id())?;
        writeln!(writer, "{}", metadata.molecule_type)?;
        writeln!(writer, "{}", metadata.charge_type)?;

        writeln!(writer, "{}ATOM", SECTION_PREFIX)?;
        for atom in molecule.atoms() {
            writeln!(
                writer,
                " {:>7} {:<9} {:>9.4} {:>9.4} {:>9.4} {:<9} {:>9} {:<9} {:>9.4} {:>9}",
                atom.id,
                column_field(&atom.name),
                atom.position.x,
                atom.position.y,
                atom.position.z,
                column_field(&atom.atom_type),
                atom.subst_id,
                column_field(&atom.subst_name),
                atom.charge,
                column_field(&atom.status.to_string())
            )?;
        }

        if molecule.atoms().iter().any(|a| !a.unity_attributes.is_empty()) {
            writeln!(writer, "{}UNITY_ATOM_ATTR", SECTION_PREFIX)?;
            for atom in molecule.atoms().iter().filter(|a| !a.unity_attributes.is_empty()) {
                writeln!(writer, "{} {}", atom.id, atom.unity_attributes.len())?;
                for attribute in &atom.unity_attributes {
                    writeln!(writer, "{}", attribute)?;
                }
            }
        }

        writeln!(writer, "{}BOND", SECTION_PREFIX)?;
        let with_status = molecule.bonds().iter().any(|b| !b.status_bits.is_empty());
        for bond in molecule.bonds() {
            let status = if with_status {
                column_field(&bond.status_bits)
            } else {
                ""
            };
            let line = format!(
                " {:>9} {:>9} {:>9} {:<9} {:>9}",
                bond.id,
                bond.origin,
                bond.target,
                column_field(&bond.bond_type.to_string()),
                status
            );
            writeln!(writer, "{}", line.trim_end())?;
        }

        writeln!(writer, "{}SUBSTRUCTURE", SECTION_PREFIX)?;
        let mut written = HashSet::new();
        for atom in molecule.atoms() {
            if written.insert(atom.subst_id) {
                writeln!(
                    writer,
                    " {:>7} {:<9} {:>9} RESIDUE",
                    atom.subst_id,
                    column_field(&atom.subst_name),
                    atom.id
                )?;
            }
        }
        Ok(())
    }
}
