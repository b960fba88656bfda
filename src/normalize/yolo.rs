//! Pre-indexed YOLO labels (Objects365 exports and similar).
//!
//! Rows already carry normalized center/extent boxes, but their class ids
//! index the source's private class list. Each id is remapped through that
//! list into the vocabulary.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::{locate_image, push_box, NormalizeReport, Resolved, SkipReason, SourceContext};
use crate::error::UnilabelError;
use crate::ir::label_file::parse_label_line;
use crate::ir::layout::{
    has_extension, list_visible_files, stem_of, IMAGE_EXTENSIONS, LABEL_EXTENSION,
};
use crate::ir::{AnnotatedImage, BBox, ClassIndex, Normalized};
use crate::vocab::class_map::discover_class_map;
use crate::vocab::{read_class_map, Vocabulary};

/// Source-local class id -> vocabulary index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ClassRemap(Vec<Option<ClassIndex>>);

impl ClassRemap {
    pub fn from_names<S: AsRef<str>>(names: &[S], vocabulary: &Vocabulary) -> Self {
        Self(
            names
                .iter()
                .map(|name| vocabulary.lookup(name.as_ref()))
                .collect(),
        )
    }

    pub fn get(&self, local: u32) -> Option<ClassIndex> {
        self.0.get(local as usize).copied().flatten()
    }

    pub fn unmapped(&self) -> usize {
        self.0.iter().filter(|class| class.is_none()).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Reads the source's class list from `names` or the dataset root.
pub(super) fn load_remap(
    root: &Path,
    names: Option<&Path>,
    vocabulary: &Vocabulary,
) -> Result<ClassRemap, UnilabelError> {
    let path = match names {
        Some(path) => path.to_path_buf(),
        None => discover_class_map(root)?,
    };
    let local_names = read_class_map(&path)?;
    let remap = ClassRemap::from_names(&local_names, vocabulary);

    info!(
        "{}: {} local classes, {} without a vocabulary entry",
        path.display(),
        remap.len(),
        remap.unmapped()
    );
    Ok(remap)
}

pub(super) fn convert_split(
    ctx: &SourceContext<'_>,
    split: &str,
    native_split: &str,
    remap: &ClassRemap,
) -> Result<NormalizeReport, UnilabelError> {
    let mut report = ctx.report(split);

    let labels_dir = ctx.root.join("labels").join(native_split);
    let images_dir = ctx.root.join("images").join(native_split);
    if !labels_dir.is_dir() {
        warn!(
            "{}: no labels for split '{}' at {}, skipping",
            ctx.name,
            native_split,
            labels_dir.display()
        );
        return Ok(report);
    }

    for label_path in list_visible_files(&labels_dir)?
        .into_iter()
        .filter(|path| has_extension(path, &[LABEL_EXTENSION]))
    {
        report.records += 1;
        let Some(stem) = stem_of(&label_path) else {
            report.skip(SkipReason::MalformedRow);
            continue;
        };

        let image_path = match locate_image(&images_dir, &stem, &IMAGE_EXTENSIONS) {
            Resolved::Found(path) => path,
            Resolved::Recoverable(reason) => {
                report.skip(reason);
                continue;
            }
            Resolved::Fatal(err) => return Err(err),
        };

        let content = fs::read_to_string(&label_path).map_err(UnilabelError::io_at(&label_path))?;
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{stem}.jpg"));
        let mut annotated = AnnotatedImage::new(stem, file_name);

        for (line_idx, line) in content.lines().enumerate() {
            let row = match parse_label_line(line, &label_path, line_idx + 1) {
                Ok(Some(row)) => row,
                Ok(None) => continue,
                Err(err) => {
                    debug!("{err}");
                    report.skip(SkipReason::MalformedRow);
                    continue;
                }
            };

            let Some(class) = remap.get(row.class_id) else {
                debug!(
                    "{}:{}: local class {} has no vocabulary entry",
                    label_path.display(),
                    line_idx + 1,
                    row.class_id
                );
                report.skip(SkipReason::UnmappedClass);
                continue;
            };

            let bbox = BBox::<Normalized>::from_cxcywh(row.cx, row.cy, row.w, row.h);
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
    use crate::ir::{CorpusLayout, TransferMode};
    use crate::normalize::CorpusWriter;

    #[test]
    fn remap_drops_out_of_range_and_unknown_ids() {
        let vocab =
            Vocabulary::from_names(vec!["person".into(), "sneakers".into()]).expect("vocab");
        let remap = ClassRemap::from_names(&["Sneakers", "Lamp", "Person"], &vocab);

        assert_eq!(remap.get(0), Some(ClassIndex(1)));
        assert_eq!(remap.get(1), None);
        assert_eq!(remap.get(2), Some(ClassIndex(0)));
        assert_eq!(remap.get(3), None);
        assert_eq!(remap.unmapped(), 1);
    }

    #[test]
    fn convert_rewrites_indices_and_counts_malformed_rows() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path().join("o365");
        fs::create_dir_all(root.join("labels/train")).expect("mkdir");
        fs::create_dir_all(root.join("images/train")).expect("mkdir");
        fs::write(root.join("images/train/obj_1.jpg"), b"jpg").expect("write");
        fs::write(
            root.join("labels/train/obj_1.txt"),
            "0 0.5 0.5 0.2 0.2\n1 0.5 0.5 0.2 0.2\nbroken row\n2 0.25 0.25 0.1 0.1\n",
        )
        .expect("write");
        fs::write(root.join("labels/train/obj_2.txt"), "0 0.5 0.5 0.2 0.2\n").expect("write");

        let vocab =
            Vocabulary::from_names(vec!["person".into(), "sneakers".into()]).expect("vocab");
        let remap = ClassRemap::from_names(&["Sneakers", "Lamp", "Person"], &vocab);
        let out = temp.path().join("out");
        let writer = CorpusWriter::new(CorpusLayout::new(&out), TransferMode::Copy);
        let ctx = SourceContext {
            name: "objects365",
            root: &root,
            vocabulary: &vocab,
            writer: &writer,
        };

        let report = convert_split(&ctx, "train", "train", &remap).expect("convert");

        assert_eq!(report.records, 2);
        assert_eq!(report.images_written, 1);
        assert_eq!(report.annotations_written, 2);
        assert_eq!(report.skipped_count(SkipReason::UnmappedClass), 1);
        assert_eq!(report.skipped_count(SkipReason::MalformedRow), 1);
        assert_eq!(report.skipped_count(SkipReason::MissingImage), 1);

        let label = fs::read_to_string(out.join("labels/train/obj_1.txt")).expect("label");
        assert_eq!(
            label,
            "1 0.500000 0.500000 0.200000 0.200000\n0 0.250000 0.250000 0.100000 0.100000\n"
        );
    }
}
