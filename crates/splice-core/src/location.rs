use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Inline,
    ReverseComplement,
}

impl Orientation {
    pub fn flipped(&self) -> Self {
        match self {
            Orientation::Inline => Orientation::ReverseComplement,
            Orientation::ReverseComplement => Orientation::Inline,
        }
    }

    pub fn is_reverse(&self) -> bool {
        *self == Orientation::ReverseComplement
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Inline
    }
}

/// The placement of an annotation on its parent's sequence.
///
/// `Range` and `Cut` are precise locations; `Generic` records orientation
/// only and carries no coordinates. Coordinates are 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    Range {
        start: u64,
        end: u64,
        orientation: Orientation,
    },
    Cut {
        at: u64,
        orientation: Orientation,
    },
    Generic {
        orientation: Orientation,
    },
}

impl Location {
    pub fn range(start: u64, end: u64) -> Self {
        Location::Range {
            start,
            end,
            orientation: Orientation::Inline,
        }
    }

    pub fn generic() -> Self {
        Location::Generic {
            orientation: Orientation::Inline,
        }
    }

    pub fn is_precise(&self) -> bool {
        !matches!(self, Location::Generic { .. })
    }

    pub fn start(&self) -> Option<u64> {
        match self {
            Location::Range { start, .. } => Some(*start),
            Location::Cut { at, .. } => Some(*at),
            Location::Generic { .. } => None,
        }
    }

    pub fn end(&self) -> Option<u64> {
        match self {
            Location::Range { end, .. } => Some(*end),
            Location::Cut { at, .. } => Some(*at),
            Location::Generic { .. } => None,
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self {
            Location::Range { orientation, .. }
            | Location::Cut { orientation, .. }
            | Location::Generic { orientation } => *orientation,
        }
    }

    pub fn with_orientation(self, o: Orientation) -> Self {
        match self {
            Location::Range { start, end, .. } => Location::Range {
                start,
                end,
                orientation: o,
            },
            Location::Cut { at, .. } => Location::Cut { at, orientation: o },
            Location::Generic { .. } => Location::Generic { orientation: o },
        }
    }

    pub fn flip(&mut self) {
        *self = self.with_orientation(self.orientation().flipped());
    }
}
