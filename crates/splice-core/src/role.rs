use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartRole {
    Promoter,
    Rbs,
    Cds,
    Terminator,
    Gene,
    Operator,
    Insulator,
    Ori,
    PrimerBinding,
    RestrictionSite,
    CircularBackbone,
    Scar,
    #[serde(other)]
    Unspecified,
}

impl PartRole {
    /// Map a Sequence Ontology accession to a role. Unknown terms classify
    /// as `Unspecified` rather than failing.
    pub fn from_so_term(term: &str) -> Self {
        match term.trim_start_matches("http://identifiers.org/so/") {
            "SO:0000167" => PartRole::Promoter,
            "SO:0000139" => PartRole::Rbs,
            "SO:0000316" => PartRole::Cds,
            "SO:0000141" => PartRole::Terminator,
            "SO:0000704" => PartRole::Gene,
            "SO:0000057" => PartRole::Operator,
            "SO:0000627" => PartRole::Insulator,
            "SO:0000296" => PartRole::Ori,
            "SO:0005850" => PartRole::PrimerBinding,
            "SO:0001687" => PartRole::RestrictionSite,
            "SO:0000755" => PartRole::CircularBackbone,
            "SO:0001953" => PartRole::Scar,
            _ => PartRole::Unspecified,
        }
    }

    pub fn so_term(&self) -> &'static str {
        match self {
            PartRole::Promoter => "SO:0000167",
            PartRole::Rbs => "SO:0000139",
            PartRole::Cds => "SO:0000316",
            PartRole::Terminator => "SO:0000141",
            PartRole::Gene => "SO:0000704",
            PartRole::Operator => "SO:0000057",
            PartRole::Insulator => "SO:0000627",
            PartRole::Ori => "SO:0000296",
            PartRole::PrimerBinding => "SO:0005850",
            PartRole::RestrictionSite => "SO:0001687",
            PartRole::CircularBackbone => "SO:0000755",
            PartRole::Scar => "SO:0001953",
            PartRole::Unspecified => "SO:0000110",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PartRole::Promoter => "Promoter",
            PartRole::Rbs => "Ribosome Binding Site",
            PartRole::Cds => "Coding Sequence",
            PartRole::Terminator => "Terminator",
            PartRole::Gene => "Gene",
            PartRole::Operator => "Operator",
            PartRole::Insulator => "Insulator",
            PartRole::Ori => "Origin of Replication",
            PartRole::PrimerBinding => "Primer Binding Site",
            PartRole::RestrictionSite => "Restriction Site",
            PartRole::CircularBackbone => "Circular Backbone",
            PartRole::Scar => "Assembly Scar",
            PartRole::Unspecified => "Generic Part",
        }
    }

    pub fn default_color(&self) -> &'static str {
        match self {
            PartRole::Promoter => "#2dd4a8",
            PartRole::Rbs => "#67e8f9",
            PartRole::Cds => "#5b9cf5",
            PartRole::Terminator => "#ef6b6b",
            PartRole::Gene => "#60a5fa",
            PartRole::Ori | PartRole::CircularBackbone => "#f0b429",
            PartRole::Operator => "#a78bfa",
            PartRole::PrimerBinding => "#f472b6",
            _ => "#9a9ba3",
        }
    }

    /// The circular-vector backbone role is the only one allowed to occupy
    /// the pinned first slot of a canvas, and only once.
    pub fn is_backbone(&self) -> bool {
        matches!(self, PartRole::CircularBackbone)
    }
}
