pub mod db;
pub mod part;
pub mod seed_data;

pub use part::Part;

use splice_core::PartRole;

/// In-memory role → part lookup used by the canvas to classify loaded
/// elements and to back the palette. Pure read-only table.
#[derive(Debug, Clone)]
pub struct Catalog {
    parts: Vec<Part>,
}

impl Catalog {
    pub fn with_builtins() -> Self {
        Self {
            parts: seed_data::builtin_parts(),
        }
    }

    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// The canonical part for a role. Uncatalogued roles fall back to the
    /// generic part; `None` only for an empty catalog.
    pub fn part_for_role(&self, role: PartRole) -> Option<&Part> {
        self.parts
            .iter()
            .find(|p| p.role == role)
            .or_else(|| self.parts.iter().find(|p| p.role == PartRole::Unspecified))
            .or_else(|| self.parts.first())
    }

    /// Pick the displayable role for an element given the roles its
    /// annotation and definition declare. First catalogued role wins;
    /// everything else classifies as generic.
    pub fn classify(&self, roles: &[PartRole]) -> PartRole {
        roles
            .iter()
            .copied()
            .find(|r| self.parts.iter().any(|p| p.role == *r))
            .unwrap_or(PartRole::Unspecified)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_for_role() {
        let catalog = Catalog::with_builtins();
        assert_eq!(
            catalog.part_for_role(PartRole::Cds).unwrap().name,
            "Coding Sequence"
        );
        // backbone resolves to its own entry, not the generic fallback
        assert_eq!(
            catalog.part_for_role(PartRole::CircularBackbone).unwrap().role,
            PartRole::CircularBackbone
        );
    }

    #[test]
    fn test_classify_prefers_catalogued_roles() {
        let catalog = Catalog::with_builtins();
        assert_eq!(
            catalog.classify(&[PartRole::Promoter, PartRole::Cds]),
            PartRole::Promoter
        );
        assert_eq!(catalog.classify(&[]), PartRole::Unspecified);
    }
}
