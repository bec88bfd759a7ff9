use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Change notifications queued for the UI layer. The queue is drained via
/// [`Design::take_events`](crate::Design::take_events); the core never
/// calls back into the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DesignEvent {
    /// A document (or a new root) was loaded onto the canvas.
    DesignLoaded { canvas: Uuid },
    /// The element sequence or a derived artifact changed.
    DesignChanged,
    /// The selected element changed.
    SelectionChanged { selected: Option<Uuid> },
    /// Focus moved one level deeper (definition or feature zoom).
    FocusedIn { canvas: Uuid },
    /// Focus moved one level up.
    FocusedOut { canvas: Uuid },
    /// The set of visible features changed.
    PartVisibilityChanged,
}
