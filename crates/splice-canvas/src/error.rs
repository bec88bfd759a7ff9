use splice_document::DocumentError;
use thiserror::Error;
use uuid::Uuid;

use crate::gate::ReadOnlyReason;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("'{display_id}' would add a second circular backbone")]
    DuplicateBackbone { display_id: String },
    #[error("'{display_id}' is registry-owned and the fork was declined")]
    NotEditable { display_id: String },
    #[error("design is read-only: {}", format_reasons(.reasons))]
    ReadOnly { reasons: Vec<ReadOnlyReason> },
    #[error("no element with id {0} on the canvas")]
    UnknownElement(Uuid),
    #[error("element index {0} is out of bounds")]
    InvalidIndex(usize),
    #[error("no element is selected")]
    NoSelection,
    #[error("cannot focus from the current selection and zoom state")]
    CannotFocus,
    #[error("document has several root definitions; a root must be chosen")]
    AmbiguousRoot { candidates: Vec<Uuid> },
    #[error("'{display_id}' has no stored sequence to cover with scars")]
    NoStoredSequence { display_id: String },
    #[error("annotated range [{start}, {end}] falls outside the stored sequence ({stored_len} bp)")]
    RangeBeyondSequence {
        start: u64,
        end: u64,
        stored_len: usize,
    },
    #[error("annotation {0} is bound to a component and is not a feature")]
    NotAFeature(Uuid),
    #[error("sequence contains characters outside A/C/G/T/N")]
    InvalidSequence,
    #[error(transparent)]
    Document(#[from] DocumentError),
}

fn format_reasons(reasons: &[ReadOnlyReason]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
