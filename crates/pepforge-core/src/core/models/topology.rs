use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// SYBYL bond types as written in the MOL2 `BOND` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondType {
    Single,
    Double,
    Triple,
    Aromatic,
    Amide,
    Dummy,
    Unknown,
    NotConnected,
}

impl Default for BondType {
    fn default() -> Self {
        BondType::Single
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid bond type string: '{0}'")]
pub struct ParseBondTypeError(pub String);

impl FromStr for BondType {
    type Err = ParseBondTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "single" => Ok(Self::Single),
            "2" | "double" => Ok(Self::Double),
            "3" | "triple" => Ok(Self::Triple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            "am" | "amide" => Ok(Self::Amide),
            "du" => Ok(Self::Dummy),
            "un" => Ok(Self::Unknown),
            "nc" => Ok(Self::NotConnected),
            _ => Err(ParseBondTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "1",
                Self::Double => "2",
                Self::Triple => "3",
                Self::Aromatic => "ar",
                Self::Amide => "am",
                Self::Dummy => "du",
                Self::Unknown => "un",
                Self::NotConnected => "nc",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    pub id: usize,           // Serial id of the bond record
    pub origin: usize,       // Id of the origin atom
    pub target: usize,       // Id of the target atom
    pub bond_type: BondType, // SYBYL bond type
    pub status_bits: String, // Raw status column, empty when absent
}

impl Bond {
    pub fn new(id: usize, origin: usize, target: usize, bond_type: BondType) -> Self {
        Self {
            id,
            origin,
            target,
            bond_type,
            status_bits: String::new(),
        }
    }

    pub fn contains(&self, atom_id: usize) -> bool {
        self.origin == atom_id || self.target == atom_id
    }

    /// Returns the endpoint opposite to `atom_id`, or `None` if the bond does not touch it.
    pub fn partner(&self, atom_id: usize) -> Option<usize> {
        if self.origin == atom_id {
            Some(self.target)
        } else if self.target == atom_id {
            Some(self.origin)
        } else {
            None
        }
    }

    /// The endpoints as an unordered pair, smaller id first.
    pub fn atom_pair(&self) -> (usize, usize) {
        (self.origin.min(self.target), self.origin.max(self.target))
    }

    pub fn connects(&self, a: usize, b: usize) -> bool {
        self.atom_pair() == (a.min(b), a.max(b))
    }
}
