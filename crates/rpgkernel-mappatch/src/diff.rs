//! Summary counts of what a patch changed, shared by preview and apply.

use serde::{Deserialize, Serialize};

/// Counts of tiles/structures/regions/annotations added, changed, or
/// removed by a patch. Preview computes this without mutating; apply
/// computes it from the actual commit — the two must agree for the same
/// script run against the same starting state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchDiff {
    /// Tiles created where none existed before.
    pub tiles_added: u32,
    /// Existing tiles whose fields changed.
    pub tiles_changed: u32,
    /// Tiles removed.
    pub tiles_removed: u32,
    /// Structures placed.
    pub structures_added: u32,
    /// Structures relocated.
    pub structures_changed: u32,
    /// Structures removed.
    pub structures_removed: u32,
    /// Regions created.
    pub regions_added: u32,
    /// Regions whose classification changed.
    pub regions_changed: u32,
    /// Regions removed.
    pub regions_removed: u32,
    /// Annotations attached.
    pub annotations_added: u32,
}

impl PatchDiff {
    /// Whether this diff represents any actual change at all.
    #[must_use]
    pub const fn is_nonzero(self) -> bool {
        self.tiles_added > 0
            || self.tiles_changed > 0
            || self.tiles_removed > 0
            || self.structures_added > 0
            || self.structures_changed > 0
            || self.structures_removed > 0
            || self.regions_added > 0
            || self.regions_changed > 0
            || self.regions_removed > 0
            || self.annotations_added > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_diff_is_zero() {
        assert!(!PatchDiff::default().is_nonzero());
    }

    #[test]
    fn any_nonzero_field_counts() {
        let diff = PatchDiff { structures_added: 1, ..PatchDiff::default() };
        assert!(diff.is_nonzero());
    }
}
