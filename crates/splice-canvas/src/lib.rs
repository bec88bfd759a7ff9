//! Canvas state and hierarchical consistency engine.
//!
//! A [`Design`](design::Design) owns the design document and keeps the
//! ordered element list shown on the canvas coherent with three derived
//! artifacts of the displayed definition: its assembled sequence, the
//! per-element position annotations, and the pairwise precedence
//! constraints. It also drives hierarchical zoom through nested part
//! definitions and overlapping feature ranges.

pub mod design;
pub mod element;
pub mod engine;
pub mod error;
pub mod events;
pub mod gate;
pub mod navigator;
pub mod variants;

pub use design::{Design, DesignConfig, OrderSource};
pub use element::{DesignElement, ElementKind, FeatureSpan};
pub use error::CanvasError;
pub use events::DesignEvent;
pub use gate::{AllowGate, ConflictChoice, ConflictPolicy, DenyGate, EditGate, ReadOnlyReason};
pub use navigator::ZoomLevel;
