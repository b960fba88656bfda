//! Open Images detection exports (the FiftyOne zoo layout).
//!
//! Boxes are already fractions of the image size, so no image is ever
//! probed. Class ids are machine ids (`/m/...`) resolved through the split's
//! `metadata/classes.csv`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use super::{push_box, NormalizeReport, SkipReason, SourceContext};
use crate::error::UnilabelError;
use crate::ir::layout::{file_name_of, list_visible_files};
use crate::ir::{AnnotatedImage, BBox, ClassIndex, Normalized};
use crate::vocab::read_open_images_classes;

#[derive(Debug, Deserialize)]
struct DetectionRow {
    #[serde(rename = "ImageID")]
    image_id: String,

    #[serde(rename = "LabelName")]
    label_name: String,

    #[serde(rename = "XMin")]
    x_min: f64,

    #[serde(rename = "XMax")]
    x_max: f64,

    #[serde(rename = "YMin")]
    y_min: f64,

    #[serde(rename = "YMax")]
    y_max: f64,
}

/// Image id (file name up to the first dot) -> image path.
fn index_images(data_dir: &Path) -> Result<HashMap<String, PathBuf>, UnilabelError> {
    let mut index = HashMap::new();
    for path in list_visible_files(data_dir)? {
        let Some(name) = file_name_of(&path) else {
            continue;
        };
        let id = name.split('.').next().unwrap_or(&name).to_string();
        index.entry(id).or_insert(path);
    }
    Ok(index)
}

fn read_detections(path: &Path) -> Result<BTreeMap<String, Vec<DetectionRow>>, UnilabelError> {
    let csv_error = |source| UnilabelError::OpenImagesCsvParse {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut grouped: BTreeMap<String, Vec<DetectionRow>> = BTreeMap::new();
    for row in reader.deserialize() {
        let row: DetectionRow = row.map_err(csv_error)?;
        grouped.entry(row.image_id.clone()).or_default().push(row);
    }
    Ok(grouped)
}

pub(super) fn convert_split(
    ctx: &SourceContext<'_>,
    split: &str,
    native_split: &str,
) -> Result<NormalizeReport, UnilabelError> {
    let mut report = ctx.report(split);

    let split_dir = ctx.root.join(native_split);
    let data_dir = split_dir.join("data");
    if !data_dir.is_dir() {
        warn!(
            "{}: split '{}' not found at {}, skipping",
            ctx.name,
            native_split,
            split_dir.display()
        );
        return Ok(report);
    }

    let classes: HashMap<String, Option<ClassIndex>> =
        read_open_images_classes(&split_dir.join("metadata").join("classes.csv"))?
            .into_iter()
            .map(|(mid, display_name)| {
                let class = ctx.vocabulary.lookup(&display_name);
                (mid, class)
            })
            .collect();

    let images = index_images(&data_dir)?;
    let detections = read_detections(&split_dir.join("labels").join("detections.csv"))?;
    info!(
        "{}/{}: {} images on disk, {} annotated image ids",
        ctx.name,
        split,
        images.len(),
        detections.len()
    );

    for (image_id, rows) in &detections {
        report.records += 1;

        let Some(image_path) = images.get(image_id) else {
            report.skip(SkipReason::MissingImage);
            continue;
        };
        let file_name = file_name_of(image_path).unwrap_or_else(|| format!("{image_id}.jpg"));
        let mut annotated = AnnotatedImage::new(image_id.clone(), file_name);

        for row in rows {
            let Some(class) = classes.get(&row.label_name).copied().flatten() else {
                report.skip(SkipReason::UnmappedClass);
                continue;
            };

            let bbox = BBox::<Normalized>::from_xyxy(row.x_min, row.y_min, row.x_max, row.y_max);
            push_box(&mut annotated, class, &bbox, &mut report);
        }

        ctx.writer
            .emit(split, &annotated, image_path, &mut report)?;
    }

    Ok(report)
}
