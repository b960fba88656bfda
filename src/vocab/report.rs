//! Summary of a vocabulary build.

use serde::Serialize;
use std::fmt;

/// What each name list contributed to the vocabulary.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VocabularyReport {
    /// Final number of classes.
    pub size: usize,
    /// Per-list contributions, in priority order.
    pub sources: Vec<SourceContribution>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceContribution {
    /// Human-readable label for the list (e.g. `builtin:coco`).
    pub label: String,
    /// Raw names in the list, blanks excluded.
    pub total: usize,
    /// Names that received a new index.
    pub added: usize,
    /// Names that normalized onto an index an earlier list (or an earlier
    /// entry of the same list) already owned.
    pub already_present: usize,
    /// Subset of `already_present` whose raw spelling differed from the
    /// spelling that first claimed the index.
    pub aliased: usize,
}

impl VocabularyReport {
    /// Total number of cross-spelling unifications across all lists.
    pub fn aliased_count(&self) -> usize {
        self.sources.iter().map(|source| source.aliased).sum()
    }
}

impl fmt::Display for VocabularyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vocabulary: {} classes", self.size)?;
        for source in &self.sources {
            writeln!(
                f,
                "  {}: {} names, {} added, {} already present ({} aliased)",
                source.label, source.total, source.added, source.already_present, source.aliased
            )?;
        }

        let aliased = self.aliased_count();
        if aliased > 0 {
            writeln!(
                f,
                "Note: {} differently spelled name(s) were unified onto earlier indices; run with -vv to list them",
                aliased
            )?;
        }
        Ok(())
    }
}
