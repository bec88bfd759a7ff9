use serde::{Deserialize, Serialize};
use splice_core::PartRole;

/// A catalog entry: the canonical descriptor for one kind of canvas part.
///
/// Parts are what the palette offers the user — a display name, the role
/// the part carries, and rendering hints. The built-in table covers the
/// standard genetic vocabulary; users can register custom parts on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Database primary key (auto-assigned on insert); 0 for in-memory parts.
    pub id: i64,
    /// Human-readable name shown in the palette (e.g. "Promoter").
    pub name: String,
    /// Base used when allocating display ids for instances of this part.
    pub display_id_base: String,
    /// Role classification this part confers on elements created from it.
    pub role: PartRole,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Hex colour used when rendering this part on the canvas.
    pub color: Option<String>,
    /// Whether this part ships with the application (true) or was added by
    /// the user (false).
    pub is_builtin: bool,
}

impl Part {
    /// Convenience constructor for seed / test data.
    pub fn new_builtin(
        name: impl Into<String>,
        display_id_base: impl Into<String>,
        role: PartRole,
        description: Option<&str>,
    ) -> Self {
        Self {
            id: 0, // assigned by DB
            name: name.into(),
            display_id_base: display_id_base.into(),
            role,
            description: description.map(String::from),
            color: Some(role.default_color().to_string()),
            is_builtin: true,
        }
    }
}
