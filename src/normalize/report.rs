//! Per-source, per-split conversion counts.
//!
//! Operators compare these numbers across runs to spot silent data loss, so
//! every record that does not make it into the output is attributed to a
//! [`SkipReason`] or to `images_dropped_empty`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Why a record (image or single annotation) was left out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The record's image file does not exist.
    MissingImage,
    /// Dimensions were absent from metadata and probing the image failed.
    UnreadableDimensions,
    /// The class name or source-local index has no vocabulary entry.
    UnmappedClass,
    /// The entity carried none of the accepted box types.
    NoUsableBox,
    /// The entity's tag is outside the configured allow-set.
    FilteredTag,
    /// The box has no area left after clipping to the image.
    DegenerateBox,
    /// The row could not be parsed.
    MalformedRow,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingImage => "missing_image",
            SkipReason::UnreadableDimensions => "unreadable_dimensions",
            SkipReason::UnmappedClass => "unmapped_class",
            SkipReason::NoUsableBox => "no_usable_box",
            SkipReason::FilteredTag => "filtered_tag",
            SkipReason::DegenerateBox => "degenerate_box",
            SkipReason::MalformedRow => "malformed_row",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct NormalizeReport {
    pub source: String,
    pub split: String,
    /// Image-level records read from the source.
    pub records: usize,
    pub images_written: usize,
    pub labels_written: usize,
    pub annotations_written: usize,
    /// Images left out because no annotation survived.
    pub images_dropped_empty: usize,
    /// Images whose size had to be read from the file header.
    pub dimension_probes: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl NormalizeReport {
    pub fn new(source: impl Into<String>, split: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            split: split.into(),
            ..Default::default()
        }
    }

    pub fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn skipped_count(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

impl fmt::Display for NormalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}/{}: {} records -> {} images, {} labels, {} annotations",
            self.source,
            self.split,
            self.records,
            self.images_written,
            self.labels_written,
            self.annotations_written
        )?;

        if self.images_dropped_empty > 0 {
            writeln!(
                f,
                "  {} image(s) dropped with no valid annotations",
                self.images_dropped_empty
            )?;
        }
        if self.dimension_probes > 0 {
            writeln!(
                f,
                "  {} image size(s) read from file headers",
                self.dimension_probes
            )?;
        }
        for (reason, count) in &self.skipped {
            writeln!(f, "  skipped {}: {}", reason, count)?;
        }
        Ok(())
    }
}
