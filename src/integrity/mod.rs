//! Image/label pairing for a corpus split.
//!
//! After pruning, every image stem has exactly one image and one non-empty
//! label file, and every label file has an image. When several images share
//! a stem (`a.jpg`, `a.png`), the first in sorted order is kept. Hidden files are never touched. Running the
//! filter twice changes nothing the second time.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::UnilabelError;
use crate::ir::label_file::has_annotations;
use crate::ir::layout::{has_extension, list_visible_files, stem_of, LABEL_EXTENSION};
use crate::ir::CorpusLayout;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub split: String,
    pub images_before: usize,
    pub labels_before: usize,
    pub paired: usize,
    pub empty_labels_removed: usize,
    pub orphan_images_removed: usize,
    pub orphan_labels_removed: usize,
    /// Extra images sharing a paired stem.
    pub duplicate_images_removed: usize,
}

impl PruneReport {
    pub fn removed(&self) -> usize {
        self.empty_labels_removed
            + self.orphan_images_removed
            + self.orphan_labels_removed
            + self.duplicate_images_removed
    }
}

impl fmt::Display for PruneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} images, {} labels -> {} pairs",
            self.split, self.images_before, self.labels_before, self.paired
        )?;
        if self.removed() > 0 {
            writeln!(
                f,
                "  removed {} orphan image(s), {} orphan label(s), {} empty label(s)",
                self.orphan_images_removed, self.orphan_labels_removed, self.empty_labels_removed
            )?;
        }
        if self.duplicate_images_removed > 0 {
            writeln!(
                f,
                "  removed {} duplicate image(s) sharing a stem",
                self.duplicate_images_removed
            )?;
        }
        Ok(())
    }
}

/// Deletes unpaired files in one split of `layout`.
pub fn prune_split(layout: &CorpusLayout, split: &str) -> Result<PruneReport, UnilabelError> {
    let mut report = PruneReport {
        split: split.to_string(),
        ..Default::default()
    };

    let images = stem_map(list_visible_files(&layout.images_dir(split))?);
    let labels = stem_map(
        list_visible_files(&layout.labels_dir(split))?
            .into_iter()
            .filter(|path| has_extension(path, &[LABEL_EXTENSION]))
            .collect(),
    );
    report.images_before = images.values().map(Vec::len).sum();
    report.labels_before = labels.values().map(Vec::len).sum();

    let mut usable_labels = BTreeSet::new();
    for (stem, paths) in &labels {
        for path in paths {
            if has_annotations(path)? {
                usable_labels.insert(stem.clone());
            } else {
                remove_if_present(path)?;
                report.empty_labels_removed += 1;
            }
        }
    }

    for (stem, paths) in &images {
        if usable_labels.contains(stem) {
            report.paired += 1;
            for path in paths.iter().skip(1) {
                remove_if_present(path)?;
                report.duplicate_images_removed += 1;
            }
            continue;
        }
        for path in paths {
            remove_if_present(path)?;
            report.orphan_images_removed += 1;
        }
    }

    for stem in &usable_labels {
        if images.contains_key(stem) {
            continue;
        }
        if let Some(paths) = labels.get(stem) {
            for path in paths {
                remove_if_present(path)?;
                report.orphan_labels_removed += 1;
            }
        }
    }

    info!(
        "{}: pruned {} file(s), {} pairs remain",
        layout.root.join(split).display(),
        report.removed(),
        report.paired
    );
    Ok(report)
}

/// Stem -> files sharing it. Two images may share a stem (`a.jpg`, `a.png`).
fn stem_map(paths: Vec<PathBuf>) -> BTreeMap<String, Vec<PathBuf>> {
    let mut map: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in paths {
        if let Some(stem) = stem_of(&path) {
            map.entry(stem).or_default().push(path);
        }
    }
    map
}

fn remove_if_present(path: &Path) -> Result<(), UnilabelError> {
    debug!("removing {}", path.display());
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(UnilabelError::io_at(path)(err)),
    }
}
