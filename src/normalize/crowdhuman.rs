//! CrowdHuman ODGT: one JSON object per line, several box types per entity.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

use super::{
    dims_u32, locate_image, push_box, resolve_dimensions, NormalizeReport, Resolved,
    SkipReason, SourceContext,
};
use crate::error::UnilabelError;
use crate::ir::layout::file_name_of;
use crate::ir::{AnnotatedImage, BBox, Pixel};
use crate::vocab::normalize;

const ODGT_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Deserialize)]
struct OdgtRecord {
    #[serde(rename = "ID")]
    id: String,

    #[serde(default)]
    img_w: Option<f64>,

    #[serde(default)]
    img_h: Option<f64>,

    #[serde(default)]
    width: Option<f64>,

    #[serde(default)]
    height: Option<f64>,

    #[serde(default)]
    gtboxes: Vec<GtBox>,
}

#[derive(Debug, Default, Deserialize)]
struct GtBox {
    #[serde(default)]
    tag: String,

    #[serde(default)]
    fbox: Option<[f64; 4]>,

    #[serde(default)]
    vbox: Option<[f64; 4]>,

    #[serde(default)]
    hbox: Option<[f64; 4]>,
}

/// The box types an ODGT entity can carry, each `[x, y, w, h]` in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NativeBox {
    /// Full body, including occluded parts.
    Full([f64; 4]),
    /// Visible region only.
    Visible([f64; 4]),
    Head([f64; 4]),
}

impl NativeBox {
    pub fn xywh(&self) -> [f64; 4] {
        match self {
            NativeBox::Full(xywh) | NativeBox::Visible(xywh) | NativeBox::Head(xywh) => *xywh,
        }
    }
}

/// Picks the full box, then the visible box, then the head box.
fn select_box(entity: &GtBox) -> Option<NativeBox> {
    entity
        .fbox
        .map(NativeBox::Full)
        .or_else(|| entity.vbox.map(NativeBox::Visible))
        .or_else(|| entity.hbox.map(NativeBox::Head))
}

fn declared_dimensions(record: &OdgtRecord) -> Option<(f64, f64)> {
    let positive = |value: Option<f64>| value.filter(|v| *v > 0.0);
    let width = positive(record.img_w).or(positive(record.width))?;
    let height = positive(record.img_h).or(positive(record.height))?;
    Some((width, height))
}

fn odgt_path(root: &std::path::Path, native_split: &str) -> PathBuf {
    root.join(format!("annotation_{native_split}.odgt"))
}

pub(super) fn convert_split(
    ctx: &SourceContext<'_>,
    split: &str,
    native_split: &str,
    tags: &[String],
) -> Result<NormalizeReport, UnilabelError> {
    let mut report = ctx.report(split);

    let path = odgt_path(ctx.root, native_split);
    if !path.is_file() {
        warn!(
            "{}: no ODGT file for split '{}' at {}, skipping",
            ctx.name,
            native_split,
            path.display()
        );
        return Ok(report);
    }

    let allowed: BTreeSet<String> = tags.iter().map(|tag| normalize(tag)).collect();
    let images_dir = ctx.root.join("images");
    let reader = BufReader::new(File::open(&path).map_err(UnilabelError::io_at(&path))?);

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.map_err(UnilabelError::io_at(&path))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: OdgtRecord =
            serde_json::from_str(&line).map_err(|source| UnilabelError::OdgtParse {
                path: path.clone(),
                line: line_idx + 1,
                source,
            })?;
        report.records += 1;

        let image_path = match locate_image(&images_dir, &record.id, &ODGT_IMAGE_EXTENSIONS) {
            Resolved::Found(path) => path,
            Resolved::Recoverable(reason) => {
                report.skip(reason);
                continue;
            }
            Resolved::Fatal(err) => return Err(err),
        };

        let (width, height) =
            match resolve_dimensions(declared_dimensions(&record), &image_path, &mut report) {
                Resolved::Found(dims) => dims,
                Resolved::Recoverable(reason) => {
                    report.skip(reason);
                    continue;
                }
                Resolved::Fatal(err) => return Err(err),
            };

        let file_name = file_name_of(&image_path).unwrap_or_else(|| format!("{}.jpg", record.id));
        let (w_px, h_px) = dims_u32((width, height));
        let mut annotated =
            AnnotatedImage::new(record.id.clone(), file_name).with_dimensions(w_px, h_px);

        for entity in &record.gtboxes {
            let tag = normalize(&entity.tag);
            if !allowed.contains(&tag) {
                report.skip(SkipReason::FilteredTag);
                continue;
            }

            let Some(native) = select_box(entity) else {
                report.skip(SkipReason::NoUsableBox);
                continue;
            };

            let Some(class) = ctx.vocabulary.get(&tag) else {
                report.skip(SkipReason::UnmappedClass);
                continue;
            };

            let [x, y, w, h] = native.xywh();
            let bbox = BBox::<Pixel>::from_xywh(x, y, w, h).to_normalized(width, height);
            push_box(&mut annotated, class, &bbox, &mut report);
        }

        ctx.writer
            .emit(split, &annotated, &image_path, &mut report)?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_box_wins_over_visible_and_head() {
        let entity = GtBox {
            tag: "person".into(),
            fbox: Some([1.0, 1.0, 2.0, 2.0]),
            vbox: Some([3.0, 3.0, 1.0, 1.0]),
            hbox: Some([4.0, 4.0, 1.0, 1.0]),
        };
        assert_eq!(select_box(&entity), Some(NativeBox::Full([1.0, 1.0, 2.0, 2.0])));
    }

    #[test]
    fn fallback_order_is_visible_then_head() {
        let entity = GtBox {
            vbox: Some([3.0, 3.0, 1.0, 1.0]),
            hbox: Some([4.0, 4.0, 1.0, 1.0]),
            ..Default::default()
        };
        assert_eq!(select_box(&entity), Some(NativeBox::Visible([3.0, 3.0, 1.0, 1.0])));

        let entity = GtBox {
            hbox: Some([4.0, 4.0, 1.0, 1.0]),
            ..Default::default()
        };
        assert_eq!(select_box(&entity), Some(NativeBox::Head([4.0, 4.0, 1.0, 1.0])));

        assert_eq!(select_box(&GtBox::default()), None);
    }

    #[test]
    fn declared_dimensions_prefer_img_fields() {
        let record: OdgtRecord = serde_json::from_str(
            r#"{"ID": "a", "img_w": 0, "width": 640, "img_h": 480, "gtboxes": []}"#,
        )
        .expect("parse");
        assert_eq!(declared_dimensions(&record), Some((640.0, 480.0)));

        let record: OdgtRecord = serde_json::from_str(r#"{"ID": "b"}"#).expect("parse");
        assert_eq!(declared_dimensions(&record), None);
    }
}
