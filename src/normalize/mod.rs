//! Source normalizers: one submodule per raw annotation family.
//!
//! Every normalizer reads its source's native layout, maps class names (or
//! source-local indices) through the [`Vocabulary`], converts geometry into
//! canonical [`BoxAnnotation`]s, and writes each surviving image plus its
//! label file into a [`CorpusLayout`]. Images whose annotations are all
//! dropped are not written at all.
//!
//! Lookups that touch the filesystem return [`Resolved`], which separates a
//! per-record skip from an error that aborts the run.

mod coco;
mod crowdhuman;
mod open_images;
mod report;
mod voc;
mod yolo;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use crowdhuman::NativeBox;
pub use report::{NormalizeReport, SkipReason};

use crate::error::UnilabelError;
use crate::ir::label_file::write_label_file;
use crate::ir::layout::{find_image_for_stem, transfer_file};
use crate::ir::{
    AnnotatedImage, BBox, BoxAnnotation, ClassIndex, CorpusLayout, Normalized, TransferMode,
};
use crate::vocab::Vocabulary;

/// Outcome of a lookup at an I/O boundary.
#[derive(Debug)]
pub enum Resolved<T> {
    Found(T),
    /// The current record is skipped; processing continues.
    Recoverable(SkipReason),
    /// The operation aborts.
    Fatal(UnilabelError),
}

/// Raw annotation family of a source, with its family-specific options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum SourceFormat {
    /// `annotations/instances_<split>.json` plus `images/<split>/`.
    Coco,
    /// `annotation_<split>.odgt` plus `images/`.
    CrowdHuman {
        #[serde(default = "default_crowdhuman_tags")]
        tags: Vec<String>,
    },
    /// `Annotations/*.xml` plus `JPEGImages/`; split locally.
    Voc {
        #[serde(default = "default_val_fraction")]
        val_fraction: f64,
    },
    /// `<split>/data/`, `<split>/labels/detections.csv`,
    /// `<split>/metadata/classes.csv`.
    OpenImages,
    /// `images/<split>/` plus `labels/<split>/*.txt` indexed by a private
    /// class list.
    Yolo {
        #[serde(default)]
        names: Option<PathBuf>,
    },
}

fn default_crowdhuman_tags() -> Vec<String> {
    vec!["person".to_string()]
}

fn default_val_fraction() -> f64 {
    0.2
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Coco => "coco",
            SourceFormat::CrowdHuman { .. } => "crowd_human",
            SourceFormat::Voc { .. } => "voc",
            SourceFormat::OpenImages => "open_images",
            SourceFormat::Yolo { .. } => "yolo",
        }
    }
}

/// One configured input dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Name used for the converted directory and as the merge prefix.
    pub name: String,
    pub root: PathBuf,
    #[serde(flatten)]
    pub format: SourceFormat,
    /// Output split name -> native split name. Unlisted splits map to
    /// themselves.
    #[serde(default)]
    pub splits: BTreeMap<String, String>,
}

impl SourceConfig {
    pub fn native_split<'a>(&'a self, split: &'a str) -> &'a str {
        self.splits.get(split).map(String::as_str).unwrap_or(split)
    }

    /// First of `splits` whose native name is `native`.
    pub fn output_split_for<'s>(&self, splits: &'s [String], native: &str) -> Option<&'s str> {
        splits
            .iter()
            .map(String::as_str)
            .find(|split| self.native_split(split) == native)
    }

    pub(crate) fn resolve_paths(&mut self, base: &Path) {
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
        if let SourceFormat::Yolo {
            names: Some(names),
        } = &mut self.format
        {
            if names.is_relative() {
                *names = base.join(&*names);
            }
        }
    }
}

/// Knobs shared by every source.
#[derive(Clone, Copy, Debug)]
pub struct NormalizeOptions {
    pub transfer: TransferMode,
    /// Seed for sources that have to split locally.
    pub seed: u64,
}

/// Converts one source into `output`, one report per written split.
pub fn normalize_source(
    source: &SourceConfig,
    vocabulary: &Vocabulary,
    output: &CorpusLayout,
    splits: &[String],
    options: NormalizeOptions,
) -> Result<Vec<NormalizeReport>, UnilabelError> {
    info!(
        "normalizing {} ({}) from {}",
        source.name,
        source.format.as_str(),
        source.root.display()
    );

    let writer = CorpusWriter::new(output.clone(), options.transfer);
    let ctx = SourceContext {
        name: &source.name,
        root: &source.root,
        vocabulary,
        writer: &writer,
    };

    let reports = match &source.format {
        SourceFormat::Coco => splits
            .iter()
            .map(|split| coco::convert_split(&ctx, split, source.native_split(split)))
            .collect::<Result<Vec<_>, _>>()?,
        SourceFormat::CrowdHuman { tags } => splits
            .iter()
            .map(|split| {
                crowdhuman::convert_split(&ctx, split, source.native_split(split), tags)
            })
            .collect::<Result<Vec<_>, _>>()?,
        SourceFormat::Voc { val_fraction } => {
            let targets = voc::PartitionTargets {
                train: source.output_split_for(splits, voc::TRAIN),
                val: source.output_split_for(splits, voc::VAL),
            };
            voc::convert(&ctx, *val_fraction, options.seed, targets)?
        }
        SourceFormat::OpenImages => splits
            .iter()
            .map(|split| open_images::convert_split(&ctx, split, source.native_split(split)))
            .collect::<Result<Vec<_>, _>>()?,
        SourceFormat::Yolo { names } => {
            let remap = yolo::load_remap(&source.root, names.as_deref(), vocabulary)?;
            splits
                .iter()
                .map(|split| yolo::convert_split(&ctx, split, source.native_split(split), &remap))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    for report in &reports {
        info!(
            "{}/{}: {} images, {} annotations written",
            report.source, report.split, report.images_written, report.annotations_written
        );
    }
    Ok(reports)
}

/// Everything a source submodule needs besides its own options.
pub(crate) struct SourceContext<'a> {
    pub name: &'a str,
    pub root: &'a Path,
    pub vocabulary: &'a Vocabulary,
    pub writer: &'a CorpusWriter,
}

impl SourceContext<'_> {
    pub fn report(&self, split: &str) -> NormalizeReport {
        NormalizeReport::new(self.name, split)
    }
}

/// Writes converted images and label files into one corpus.
pub(crate) struct CorpusWriter {
    layout: CorpusLayout,
    transfer: TransferMode,
}

impl CorpusWriter {
    pub fn new(layout: CorpusLayout, transfer: TransferMode) -> Self {
        Self { layout, transfer }
    }

    /// Places the image and its label file, or counts the image as dropped
    /// when no annotation survived. Returns whether anything was written.
    pub fn emit(
        &self,
        split: &str,
        image: &AnnotatedImage,
        source_image: &Path,
        report: &mut NormalizeReport,
    ) -> Result<bool, UnilabelError> {
        if image.is_empty() {
            debug!("{}: no annotations left, dropping", image.stem);
            report.images_dropped_empty += 1;
            return Ok(false);
        }

        self.layout.ensure_split(split)?;
        let image_dst = self.layout.images_dir(split).join(&image.file_name);
        transfer_file(source_image, &image_dst, self.transfer)?;
        report.images_written += 1;

        let label_dst = self.layout.label_path(split, &image.stem);
        write_label_file(&label_dst, &image.annotations)?;
        report.labels_written += 1;
        report.annotations_written += image.annotations.len();

        Ok(true)
    }
}

/// Appends a box to `image`, or counts it as degenerate.
pub(crate) fn push_box(
    image: &mut AnnotatedImage,
    class: ClassIndex,
    bbox: &BBox<Normalized>,
    report: &mut NormalizeReport,
) {
    match BoxAnnotation::from_normalized(class, bbox) {
        Some(annotation) => image.annotations.push(annotation),
        None => report.skip(SkipReason::DegenerateBox),
    }
}

/// Resolves a path that must name an existing file.
pub(crate) fn existing_file(path: PathBuf) -> Resolved<PathBuf> {
    if path.is_file() {
        Resolved::Found(path)
    } else {
        debug!("image not found: {}", path.display());
        Resolved::Recoverable(SkipReason::MissingImage)
    }
}

/// Finds `<dir>/<stem>.<ext>` for the first matching extension.
///
/// An absent `dir` is a layout error: annotations exist for images that
/// cannot be anywhere.
pub(crate) fn locate_image(dir: &Path, stem: &str, extensions: &[&str]) -> Resolved<PathBuf> {
    if !dir.is_dir() {
        return Resolved::Fatal(UnilabelError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: "image directory does not exist".to_string(),
        });
    }

    match find_image_for_stem(dir, stem, extensions) {
        Some(path) => Resolved::Found(path),
        None => {
            debug!("no image for {} in {}", stem, dir.display());
            Resolved::Recoverable(SkipReason::MissingImage)
        }
    }
}

/// Uses declared dimensions when both are positive, otherwise reads them from
/// the image header.
pub(crate) fn resolve_dimensions(
    declared: Option<(f64, f64)>,
    image_path: &Path,
    report: &mut NormalizeReport,
) -> Resolved<(f64, f64)> {
    if let Some((width, height)) = declared {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            return Resolved::Found((width, height));
        }
    }

    match probe_dimensions(image_path) {
        Ok((width, height)) if width > 0 && height > 0 => {
            report.dimension_probes += 1;
            Resolved::Found((f64::from(width), f64::from(height)))
        }
        Ok(_) => {
            warn!("{}: image header reports a zero size", image_path.display());
            Resolved::Recoverable(SkipReason::UnreadableDimensions)
        }
        Err(err) => {
            warn!("{err}");
            Resolved::Recoverable(SkipReason::UnreadableDimensions)
        }
    }
}

fn probe_dimensions(path: &Path) -> Result<(u32, u32), UnilabelError> {
    let size = imagesize::size(path).map_err(|source| UnilabelError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width = u32::try_from(size.width).unwrap_or(0);
    let height = u32::try_from(size.height).unwrap_or(0);
    Ok((width, height))
}

/// Converts probed or declared float dimensions for [`AnnotatedImage`].
pub(crate) fn dims_u32((width, height): (f64, f64)) -> (u32, u32) {
    (width.round() as u32, height.round() as u32)
}
