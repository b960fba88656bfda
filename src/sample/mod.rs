//! Coverage-preserving subset sampling.
//!
//! A seeded uniform draw of `floor(N * fraction)` identifiers is followed by
//! a greedy repair pass that adds identifiers until every class that occurs
//! anywhere in the split appears in at least `min_per_class` sampled items.
//! Repairs only ever add; the draw is never shrunk.

mod report;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

pub use report::SampleReport;

use crate::error::UnilabelError;
use crate::ir::label_file::read_label_classes;
use crate::ir::layout::{list_visible_files, stem_of, transfer_file};
use crate::ir::{ClassIndex, CorpusLayout, TransferMode};

/// Sampling options.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleOptions {
    /// Share of the split to draw, in `(0, 1]`.
    pub fraction: f64,
    pub seed: u64,
    /// Target number of sampled items per class.
    pub min_per_class: usize,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            fraction: 0.25,
            seed: 42,
            min_per_class: 1,
        }
    }
}

/// Validate sampling options before running.
pub fn validate_sample_options(opts: &SampleOptions) -> Result<(), UnilabelError> {
    if !(opts.fraction > 0.0 && opts.fraction <= 1.0) {
        return Err(UnilabelError::InvalidSampleParams {
            message: format!(
                "fraction must be in the interval (0.0, 1.0], got {}",
                opts.fraction
            ),
        });
    }

    if opts.min_per_class == 0 {
        return Err(UnilabelError::InvalidSampleParams {
            message: "min_per_class must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Size of the initial draw: `floor(total * fraction)`.
pub fn target_count(total: usize, fraction: f64) -> usize {
    ((total as f64 * fraction).floor() as usize).min(total)
}

/// One identifier with the distinct classes in its label file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageItem {
    pub id: String,
    pub classes: BTreeSet<ClassIndex>,
}

impl CoverageItem {
    pub fn new(id: impl Into<String>, classes: impl IntoIterator<Item = ClassIndex>) -> Self {
        Self {
            id: id.into(),
            classes: classes.into_iter().collect(),
        }
    }
}

/// Result of draw plus repair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected identifiers, sorted.
    pub ids: Vec<String>,
    pub drawn: usize,
    /// Identifiers added by the repair pass, in the order they were added.
    pub repairs: Vec<String>,
    pub initial_coverage: usize,
    pub final_coverage: usize,
    /// Sampled-item count per class after repair.
    pub class_counts: Vec<usize>,
    /// Classes with no occurrence anywhere in the split.
    pub uncoverable: Vec<ClassIndex>,
    /// Classes that occur but in fewer than `min_per_class` items overall.
    pub under_covered: Vec<ClassIndex>,
}

fn sorted_ids(items: &[CoverageItem]) -> Vec<&str> {
    let mut ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
    ids.sort_unstable();
    ids
}

/// Draws `k` identifiers uniformly without replacement.
///
/// Identifiers are sorted before shuffling so the draw depends only on the
/// identifier set and the seed.
pub fn draw_initial(items: &[CoverageItem], k: usize, seed: u64) -> Vec<String> {
    let mut ids = sorted_ids(items);
    let mut rng = StdRng::seed_from_u64(seed);
    ids.shuffle(&mut rng);
    ids.truncate(k);

    let mut drawn: Vec<String> = ids.into_iter().map(str::to_string).collect();
    drawn.sort();
    drawn
}

/// Runs the seeded draw followed by the coverage repair.
pub fn select_with_coverage(
    items: &[CoverageItem],
    class_count: usize,
    opts: &SampleOptions,
) -> Result<Selection, UnilabelError> {
    validate_sample_options(opts)?;

    let k = target_count(items.len(), opts.fraction);
    let drawn = draw_initial(items, k, opts.seed);
    Ok(repair_coverage(items, class_count, &drawn, opts.min_per_class))
}

/// Adds identifiers to `initial` until each class reaches `min_per_class`
/// sampled items or runs out of candidates.
///
/// The classes below target are fixed right after the draw and repaired in
/// increasing index order. Each scans the identifiers once in sorted order and
/// adds at least its first not-yet-sampled carrier, even when an earlier repair
/// already brought it up to target. Items added for one class count towards
/// every class they contain.
pub fn repair_coverage(
    items: &[CoverageItem],
    class_count: usize,
    initial: &[String],
    min_per_class: usize,
) -> Selection {
    let mut order: Vec<&CoverageItem> = items.iter().collect();
    order.sort_by(|a, b| a.id.cmp(&b.id));

    let mut selected: BTreeSet<&str> = initial.iter().map(String::as_str).collect();
    let mut counts = vec![0usize; class_count];
    let mut available = vec![0usize; class_count];

    for item in &order {
        let in_sample = selected.contains(item.id.as_str());
        for class in &item.classes {
            if let Some(slot) = available.get_mut(class.as_usize()) {
                *slot += 1;
                if in_sample {
                    counts[class.as_usize()] += 1;
                }
            }
        }
    }

    let initial_coverage = counts.iter().filter(|count| **count > 0).count();
    let missing: Vec<usize> = (0..class_count)
        .filter(|idx| counts[*idx] < min_per_class)
        .collect();
    let mut repairs = Vec::new();

    for class_idx in missing {
        let class = ClassIndex::new(class_idx as u32);
        let mut added = 0usize;

        for item in &order {
            if added > 0 && counts[class_idx] >= min_per_class {
                break;
            }
            if !item.classes.contains(&class) || selected.contains(item.id.as_str()) {
                continue;
            }

            selected.insert(item.id.as_str());
            repairs.push(item.id.clone());
            added += 1;
            for other in &item.classes {
                if let Some(count) = counts.get_mut(other.as_usize()) {
                    *count += 1;
                }
            }
            debug!("added {} for class {}", item.id, class);
        }
    }

    let mut uncoverable = Vec::new();
    let mut under_covered = Vec::new();
    for class_idx in 0..class_count {
        let class = ClassIndex::new(class_idx as u32);
        if available[class_idx] == 0 {
            uncoverable.push(class);
        } else if counts[class_idx] < min_per_class {
            under_covered.push(class);
        }
    }

    Selection {
        ids: selected.into_iter().map(str::to_string).collect(),
        drawn: initial.len(),
        repairs,
        initial_coverage,
        final_coverage: counts.iter().filter(|count| **count > 0).count(),
        class_counts: counts,
        uncoverable,
        under_covered,
    }
}

/// Samples one split of `input` into `output`.
///
/// Identifiers are image stems. Each selected image is transferred together
/// with its label file, if any.
pub fn sample_split(
    input: &CorpusLayout,
    output: &CorpusLayout,
    split: &str,
    class_count: usize,
    opts: &SampleOptions,
    transfer: TransferMode,
) -> Result<SampleReport, UnilabelError> {
    validate_sample_options(opts)?;

    let mut images: BTreeMap<String, PathBuf> = BTreeMap::new();
    for path in list_visible_files(&input.images_dir(split))? {
        if let Some(stem) = stem_of(&path) {
            images.entry(stem).or_insert(path);
        }
    }

    let mut items = Vec::with_capacity(images.len());
    for stem in images.keys() {
        let classes = read_label_classes(&input.label_path(split, stem), class_count)?;
        items.push(CoverageItem {
            id: stem.clone(),
            classes,
        });
    }

    let selection = select_with_coverage(&items, class_count, opts)?;
    if !selection.uncoverable.is_empty() {
        warn!(
            "{}: {} class(es) never occur and cannot be covered",
            split,
            selection.uncoverable.len()
        );
    }

    output.ensure_split(split)?;
    let mut report = SampleReport::from_selection(split, items.len(), class_count, opts, &selection);

    for id in &selection.ids {
        let Some(image_src) = images.get(id) else {
            continue;
        };
        let Some(file_name) = image_src.file_name() else {
            continue;
        };
        transfer_file(image_src, &output.images_dir(split).join(file_name), transfer)?;
        report.images_copied += 1;

        let label_src = input.label_path(split, id);
        if label_src.is_file() {
            let label_dst = output.label_path(split, id);
            fs::copy(&label_src, &label_dst).map_err(UnilabelError::io_at(&label_dst))?;
            report.labels_copied += 1;
        }
    }

    info!(
        "{}: sampled {} of {} ({} drawn, {} added for coverage), {}/{} classes covered",
        split,
        report.final_size,
        report.total,
        report.drawn,
        report.repair_additions,
        report.final_coverage,
        class_count
    );
    Ok(report)
}
