//! Pascal VOC XML annotations.
//!
//! VOC ships no train/val split of its own. Every usable sample is collected
//! first, then the samples are ordered by stem, shuffled with the configured
//! seed, and the first `floor(n * (1 - val_fraction))` become the `train`
//! partition; the rest become `val`. Each partition is written to the output
//! split whose native name is `train` or `val`. A non-empty partition with no
//! such output split is counted and not written.
//!
//! Records rejected before the partition (missing image, unreadable size, no
//! annotations left) are counted in a separate report whose split is
//! [`UNSPLIT`].

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use roxmltree::Node;
use tracing::{info, warn};

use super::{
    dims_u32, locate_image, push_box, resolve_dimensions, NormalizeReport, Resolved,
    SkipReason, SourceContext,
};
use crate::error::UnilabelError;
use crate::ir::layout::{file_name_of, has_extension, list_visible_files, stem_of};
use crate::ir::{AnnotatedImage, BBox, Pixel};

/// Split label of the report that holds pre-partition rejections.
pub const UNSPLIT: &str = "unsplit";

/// Native names of the two local partitions.
pub const TRAIN: &str = "train";
pub const VAL: &str = "val";

/// Output splits the `train` and `val` partitions are written to.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct PartitionTargets<'a> {
    pub train: Option<&'a str>,
    pub val: Option<&'a str>,
}

const VOC_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug)]
struct ParsedVocFile {
    size: Option<(f64, f64)>,
    objects: Vec<Option<ParsedVocObject>>,
}

#[derive(Debug)]
struct ParsedVocObject {
    name: String,
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

struct Sample {
    image: AnnotatedImage,
    image_path: PathBuf,
}

pub(super) fn convert(
    ctx: &SourceContext<'_>,
    val_fraction: f64,
    seed: u64,
    targets: PartitionTargets<'_>,
) -> Result<Vec<NormalizeReport>, UnilabelError> {
    let annotations_dir = ctx.root.join("Annotations");
    if !annotations_dir.is_dir() {
        return Err(UnilabelError::LayoutInvalid {
            path: ctx.root.to_path_buf(),
            message: "expected an Annotations/ directory".to_string(),
        });
    }
    let images_dir = discover_images_dir(ctx.root)?;

    let mut unsplit = ctx.report(UNSPLIT);
    let mut samples = collect_samples(ctx, &annotations_dir, &images_dir, &mut unsplit)?;

    samples.sort_by(|a, b| a.image.stem.cmp(&b.image.stem));
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let n_train = train_count(samples.len(), val_fraction);
    info!(
        "{}: {} usable samples, {} train / {} val",
        ctx.name,
        samples.len(),
        n_train,
        samples.len() - n_train
    );

    let mut reports = vec![unsplit];
    let partitions = [
        (TRAIN, targets.train, &samples[..n_train]),
        (VAL, targets.val, &samples[n_train..]),
    ];
    for (partition, target, chunk) in partitions {
        let Some(split) = target else {
            if !chunk.is_empty() {
                warn!(
                    "{}: no configured split reads VOC partition '{}', {} sample(s) not written",
                    ctx.name,
                    partition,
                    chunk.len()
                );
                let mut report = ctx.report(partition);
                report.records = chunk.len();
                reports.push(report);
            }
            continue;
        };

        let mut report = ctx.report(split);
        for sample in chunk {
            report.records += 1;
            ctx.writer
                .emit(split, &sample.image, &sample.image_path, &mut report)?;
        }
        reports.push(report);
    }

    Ok(reports)
}

pub(crate) fn train_count(total: usize, val_fraction: f64) -> usize {
    let n_train = (total as f64 * (1.0 - val_fraction)).floor() as usize;
    n_train.min(total)
}

fn discover_images_dir(root: &Path) -> Result<PathBuf, UnilabelError> {
    ["JPEGImages", "images"]
        .iter()
        .map(|name| root.join(name))
        .find(|dir| dir.is_dir())
        .ok_or_else(|| UnilabelError::LayoutInvalid {
            path: root.to_path_buf(),
            message: "expected a JPEGImages/ or images/ directory".to_string(),
        })
}

fn collect_samples(
    ctx: &SourceContext<'_>,
    annotations_dir: &Path,
    images_dir: &Path,
    report: &mut NormalizeReport,
) -> Result<Vec<Sample>, UnilabelError> {
    let mut samples = Vec::new();

    for xml_path in list_visible_files(annotations_dir)?
        .into_iter()
        .filter(|path| has_extension(path, &["xml"]))
    {
        report.records += 1;
        let Some(stem) = stem_of(&xml_path) else {
            report.skip(SkipReason::MalformedRow);
            continue;
        };

        let parsed = parse_voc_file(&xml_path)?;

        let image_path = match locate_image(images_dir, &stem, &VOC_IMAGE_EXTENSIONS) {
            Resolved::Found(path) => path,
            Resolved::Recoverable(reason) => {
                report.skip(reason);
                continue;
            }
            Resolved::Fatal(err) => return Err(err),
        };

        let (width, height) = match resolve_dimensions(parsed.size, &image_path, report) {
            Resolved::Found(dims) => dims,
            Resolved::Recoverable(reason) => {
                report.skip(reason);
                continue;
            }
            Resolved::Fatal(err) => return Err(err),
        };

        let file_name = file_name_of(&image_path).unwrap_or_else(|| format!("{stem}.jpg"));
        let (w_px, h_px) = dims_u32((width, height));
        let mut image = AnnotatedImage::new(stem, file_name).with_dimensions(w_px, h_px);

        for object in parsed.objects {
            let Some(object) = object else {
                report.skip(SkipReason::MalformedRow);
                continue;
            };
            let Some(class) = ctx.vocabulary.lookup(&object.name) else {
                report.skip(SkipReason::UnmappedClass);
                continue;
            };

            let bbox = BBox::<Pixel>::from_xyxy(object.xmin, object.ymin, object.xmax, object.ymax)
                .to_normalized(width, height);
            push_box(&mut image, class, &bbox, report);
        }

        if image.is_empty() {
            report.images_dropped_empty += 1;
            continue;
        }
        samples.push(Sample { image, image_path });
    }

    Ok(samples)
}

fn parse_voc_file(path: &Path) -> Result<ParsedVocFile, UnilabelError> {
    let xml = fs::read_to_string(path).map_err(UnilabelError::io_at(path))?;
    parse_voc_str(&xml, path)
}

fn parse_voc_str(xml: &str, path: &Path) -> Result<ParsedVocFile, UnilabelError> {
    let document = roxmltree::Document::parse(xml).map_err(|source| UnilabelError::VocXmlParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(UnilabelError::VocXmlParse {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let size = child_element(annotation, "size").and_then(|size| {
        let width = child_f64(size, "width")?;
        let height = child_f64(size, "height")?;
        Some((width, height))
    });

    let objects = annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
        .map(parse_object)
        .collect();

    Ok(ParsedVocFile { size, objects })
}

/// `None` when the object lacks a name or a complete `<bndbox>`.
fn parse_object(object: Node<'_, '_>) -> Option<ParsedVocObject> {
    let name = child_text(object, "name")?;
    let bndbox = child_element(object, "bndbox")?;

    Some(ParsedVocObject {
        name,
        xmin: child_f64(bndbox, "xmin")?,
        ymin: child_f64(bndbox, "ymin")?,
        xmax: child_f64(bndbox, "xmax")?,
        ymax: child_f64(bndbox, "ymax")?,
    })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn child_f64(node: Node<'_, '_>, tag: &str) -> Option<f64> {
    child_text(node, tag).and_then(|raw| raw.parse::<f64>().ok())
}
