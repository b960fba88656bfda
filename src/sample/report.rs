use serde::Serialize;
use std::fmt;

use super::{SampleOptions, Selection};
use crate::ir::ClassIndex;

#[derive(Clone, Debug, Default, Serialize)]
pub struct SampleReport {
    pub split: String,
    pub total: usize,
    pub fraction: f64,
    pub seed: u64,
    pub min_per_class: usize,
    /// Size of the seeded draw.
    pub drawn: usize,
    pub repair_additions: usize,
    pub final_size: usize,
    pub class_count: usize,
    pub initial_coverage: usize,
    pub final_coverage: usize,
    pub uncoverable: Vec<ClassIndex>,
    pub under_covered: Vec<ClassIndex>,
    pub images_copied: usize,
    pub labels_copied: usize,
}

impl SampleReport {
    pub(crate) fn from_selection(
        split: &str,
        total: usize,
        class_count: usize,
        opts: &SampleOptions,
        selection: &Selection,
    ) -> Self {
        Self {
            split: split.to_string(),
            total,
            fraction: opts.fraction,
            seed: opts.seed,
            min_per_class: opts.min_per_class,
            drawn: selection.drawn,
            repair_additions: selection.repairs.len(),
            final_size: selection.ids.len(),
            class_count,
            initial_coverage: selection.initial_coverage,
            final_coverage: selection.final_coverage,
            uncoverable: selection.uncoverable.clone(),
            under_covered: selection.under_covered.clone(),
            images_copied: 0,
            labels_copied: 0,
        }
    }
}

fn join_classes(classes: &[ClassIndex]) -> String {
    classes
        .iter()
        .map(ClassIndex::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for SampleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} of {} images (fraction {}, seed {})",
            self.split, self.final_size, self.total, self.fraction, self.seed
        )?;
        writeln!(
            f,
            "  drawn {}, added {} for coverage",
            self.drawn, self.repair_additions
        )?;
        writeln!(
            f,
            "  coverage {}/{} -> {}/{}",
            self.initial_coverage, self.class_count, self.final_coverage, self.class_count
        )?;
        if !self.uncoverable.is_empty() {
            writeln!(
                f,
                "  uncoverable (no occurrences): {}",
                join_classes(&self.uncoverable)
            )?;
        }
        if !self.under_covered.is_empty() {
            writeln!(
                f,
                "  below {} item(s) per class: {}",
                self.min_per_class,
                join_classes(&self.under_covered)
            )?;
        }
        writeln!(
            f,
            "  copied {} images, {} labels",
            self.images_copied, self.labels_copied
        )
    }
}
