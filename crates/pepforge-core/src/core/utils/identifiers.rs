use phf::{Set, phf_set};

/// SYBYL types a backbone nitrogen may carry (free amine, ammonium, amide).
static BACKBONE_NITROGEN_TYPES: Set<&'static str> = phf_set! {
    "N.3", "N.4", "N.am",
};

pub const ALPHA_CARBON_TYPE: &str = "C.3";
pub const CARBONYL_CARBON_TYPE: &str = "C.2";
pub const HYDROGEN_TYPE: &str = "H";
pub const CARBOXYLATE_OXYGEN_TYPE: &str = "O.co2";
pub const CARBONYL_OXYGEN_TYPE: &str = "O.2";
pub const HYDROXYL_OXYGEN_TYPE: &str = "O.3";

pub fn is_backbone_nitrogen_type(atom_type: &str) -> bool {
    BACKBONE_NITROGEN_TYPES.contains(atom_type.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backbone_nitrogen_types_are_recognized() {
        assert!(is_backbone_nitrogen_type("N.3"));
        assert!(is_backbone_nitrogen_type("N.4"));
        assert!(is_backbone_nitrogen_type("N.am"));
        assert!(is_backbone_nitrogen_type(" N.am "));
    }

    #[test]
    fn non_backbone_nitrogen_types_are_rejected() {
        assert!(!is_backbone_nitrogen_type("N.ar"));
        assert!(!is_backbone_nitrogen_type("N.pl3"));
        assert!(!is_backbone_nitrogen_type("N.2"));
        assert!(!is_backbone_nitrogen_type("C.3"));
    }
}
