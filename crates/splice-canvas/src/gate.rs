use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why the canvas is currently read-only. Detection is pure; resolution
/// happens through the [`EditGate`] the caller injects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ReadOnlyReason {
    /// The canvas definition lives outside the editable namespace and must
    /// be forked before mutation.
    RegistryOwned { namespace: String },
    /// The stored sequence is longer than the union of the children's
    /// annotated ranges, so length bookkeeping would lose data.
    UncoveredSequence { stored_len: usize, covered_len: usize },
    /// A structural child has no Range or Cut location, making
    /// length-based reconciliation impossible.
    MissingPreciseLocation { component: Uuid },
}

impl std::fmt::Display for ReadOnlyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadOnlyReason::RegistryOwned { namespace } => {
                write!(f, "definition is owned by registry namespace {namespace}")
            }
            ReadOnlyReason::UncoveredSequence {
                stored_len,
                covered_len,
            } => write!(
                f,
                "stored sequence ({stored_len} bp) exceeds annotated coverage ({covered_len} bp)"
            ),
            ReadOnlyReason::MissingPreciseLocation { component } => {
                write!(f, "component {component} has no precise location")
            }
        }
    }
}

/// Outcome of a sequence-derivation conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// Retain the stored, longer sequence; abort this derivation pass.
    Keep,
    /// Replace the stored sequence with the shorter implied one.
    Overwrite,
}

/// What to do when the implied sequence is shorter than the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Consult the edit gate; an unresolved answer keeps the stored
    /// sequence.
    Ask,
    Overwrite,
    Keep,
}

/// Caller-supplied capability resolving conditions the core detects but
/// must not decide by itself: forking registry-owned definitions,
/// overriding read-only mode, and sequence-shortening conflicts.
///
/// Every default answer is the conservative one, so a headless caller can
/// use [`DenyGate`] and never lose data.
pub trait EditGate {
    /// May the definition with this display id be forked into the editable
    /// namespace?
    fn confirm_fork(&mut self, _display_id: &str) -> bool {
        false
    }

    /// May editing proceed despite the listed read-only conditions?
    fn allow_read_only_edit(&mut self, _reasons: &[ReadOnlyReason]) -> bool {
        false
    }

    /// The implied sequence is shorter than the stored one; which wins?
    fn resolve_conflict(&mut self, _stored_len: usize, _implied_len: usize) -> ConflictChoice {
        ConflictChoice::Keep
    }
}

/// The headless gate: denies forks and overrides, keeps stored sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyGate;

impl EditGate for DenyGate {}

/// A gate that accepts every fork and override; conflicts still keep the
/// stored sequence unless the policy says otherwise. Meant for tests and
/// scripted pipelines that own their documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowGate;

impl EditGate for AllowGate {
    fn confirm_fork(&mut self, _display_id: &str) -> bool {
        true
    }

    fn allow_read_only_edit(&mut self, _reasons: &[ReadOnlyReason]) -> bool {
        true
    }
}
