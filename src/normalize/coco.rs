//! COCO instance annotations.
//!
//! Boxes are `[x, y, width, height]` in absolute pixels. Width and height of
//! each image come from the JSON; zero or missing values are read from the
//! image header instead.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::{
    dims_u32, existing_file, push_box, resolve_dimensions, NormalizeReport, Resolved,
    SkipReason, SourceContext,
};
use crate::error::UnilabelError;
use crate::ir::layout::file_name_of;
use crate::ir::{AnnotatedImage, BBox, ClassIndex, Pixel};

#[derive(Debug, Deserialize)]
struct CocoFile {
    images: Vec<CocoImage>,

    #[serde(default)]
    annotations: Vec<CocoAnnotation>,

    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,

    #[serde(default)]
    width: f64,

    #[serde(default)]
    height: f64,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    image_id: u64,
    category_id: u64,
    bbox: [f64; 4],
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
}

fn annotations_path(root: &Path, native_split: &str) -> std::path::PathBuf {
    root.join("annotations")
        .join(format!("instances_{native_split}.json"))
}

fn read_coco_file(path: &Path) -> Result<CocoFile, UnilabelError> {
    let file = File::open(path).map_err(UnilabelError::io_at(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| UnilabelError::CocoJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn convert_split(
    ctx: &SourceContext<'_>,
    split: &str,
    native_split: &str,
) -> Result<NormalizeReport, UnilabelError> {
    let mut report = ctx.report(split);

    let json_path = annotations_path(ctx.root, native_split);
    if !json_path.is_file() {
        warn!(
            "{}: no annotations for split '{}' at {}, skipping",
            ctx.name,
            native_split,
            json_path.display()
        );
        return Ok(report);
    }
    let coco = read_coco_file(&json_path)?;

    let categories: BTreeMap<u64, Option<ClassIndex>> = coco
        .categories
        .iter()
        .map(|category| (category.id, ctx.vocabulary.lookup(&category.name)))
        .collect();
    let unmapped = categories.values().filter(|class| class.is_none()).count();
    if unmapped > 0 {
        info!(
            "{}: {} of {} categories have no vocabulary entry",
            ctx.name,
            unmapped,
            categories.len()
        );
    }

    let mut by_image: BTreeMap<u64, Vec<&CocoAnnotation>> = BTreeMap::new();
    for annotation in &coco.annotations {
        by_image
            .entry(annotation.image_id)
            .or_default()
            .push(annotation);
    }

    let images_dir = ctx.root.join("images").join(native_split);

    for image in &coco.images {
        report.records += 1;

        let relative = Path::new(&image.file_name);
        let (Some(stem), Some(file_name)) = (
            relative.file_stem().map(|s| s.to_string_lossy().into_owned()),
            file_name_of(relative),
        ) else {
            report.skip(SkipReason::MalformedRow);
            continue;
        };

        let image_path = match existing_file(images_dir.join(relative)) {
            Resolved::Found(path) => path,
            Resolved::Recoverable(reason) => {
                report.skip(reason);
                continue;
            }
            Resolved::Fatal(err) => return Err(err),
        };

        let (width, height) = match resolve_dimensions(
            Some((image.width, image.height)),
            &image_path,
            &mut report,
        ) {
            Resolved::Found(dims) => dims,
            Resolved::Recoverable(reason) => {
                report.skip(reason);
                continue;
            }
            Resolved::Fatal(err) => return Err(err),
        };

        let (w_px, h_px) = dims_u32((width, height));
        let mut annotated = AnnotatedImage::new(stem, file_name).with_dimensions(w_px, h_px);

        for annotation in by_image.get(&image.id).into_iter().flatten() {
            let Some(class) = categories.get(&annotation.category_id).copied().flatten() else {
                report.skip(SkipReason::UnmappedClass);
                continue;
            };

            let [x, y, w, h] = annotation.bbox;
            let bbox = BBox::<Pixel>::from_xywh(x, y, w, h).to_normalized(width, height);
            push_box(&mut annotated, class, &bbox, &mut report);
        }

        ctx.writer
            .emit(split, &annotated, &image_path, &mut report)?;
    }

    Ok(report)
}
