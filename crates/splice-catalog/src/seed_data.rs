use splice_core::PartRole;

use crate::part::Part;

/// The built-in part palette, one canonical part per role.
pub fn builtin_parts() -> Vec<Part> {
    vec![
        Part::new_builtin(
            "Generic Part",
            "part",
            PartRole::Unspecified,
            Some("A part with no specific role"),
        ),
        Part::new_builtin(
            "Promoter",
            "promoter",
            PartRole::Promoter,
            Some("Initiates transcription downstream"),
        ),
        Part::new_builtin(
            "Ribosome Binding Site",
            "rbs",
            PartRole::Rbs,
            Some("Recruits the ribosome for translation"),
        ),
        Part::new_builtin(
            "Coding Sequence",
            "cds",
            PartRole::Cds,
            Some("Protein coding region"),
        ),
        Part::new_builtin(
            "Terminator",
            "terminator",
            PartRole::Terminator,
            Some("Stops transcription"),
        ),
        Part::new_builtin("Gene", "gene", PartRole::Gene, None),
        Part::new_builtin("Operator", "operator", PartRole::Operator, None),
        Part::new_builtin("Insulator", "insulator", PartRole::Insulator, None),
        Part::new_builtin(
            "Origin of Replication",
            "ori",
            PartRole::Ori,
            Some("Replication start for the host"),
        ),
        Part::new_builtin(
            "Primer Binding Site",
            "primer_site",
            PartRole::PrimerBinding,
            None,
        ),
        Part::new_builtin(
            "Restriction Site",
            "restriction_site",
            PartRole::RestrictionSite,
            None,
        ),
        Part::new_builtin(
            "Circular Backbone",
            "backbone",
            PartRole::CircularBackbone,
            Some("Circular vector backbone; pinned to the first canvas slot"),
        ),
        Part::new_builtin(
            "Assembly Scar",
            "scar",
            PartRole::Scar,
            Some("Filler covering sequence left between annotated parts"),
        ),
    ]
}
