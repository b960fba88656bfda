//! Union of several per-source corpora into one.
//!
//! Every destination name is `<source><sep><original>`, so two sources that
//! both contain `001.jpg` never collide as long as source names are unique.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::UnilabelError;
use crate::ir::layout::{file_name_of, list_visible_files, stem_of, transfer_file};
use crate::ir::{CorpusLayout, TransferMode};
use crate::vocab::NAME_SEPARATOR;

/// One named input corpus.
#[derive(Clone, Debug)]
pub struct MergeSource {
    pub name: String,
    pub layout: CorpusLayout,
}

impl MergeSource {
    pub fn new(name: impl Into<String>, layout: CorpusLayout) -> Self {
        Self {
            name: name.into(),
            layout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MergeOptions {
    pub separator: String,
    /// Skip images that have no label file instead of copying them alone.
    pub require_labels: bool,
    pub transfer: TransferMode,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            separator: NAME_SEPARATOR.to_string(),
            require_labels: false,
            transfer: TransferMode::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MergeReport {
    pub splits: Vec<SplitMergeReport>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SplitMergeReport {
    pub split: String,
    pub sources: Vec<SourceMergeCounts>,
    pub total_images: usize,
    pub total_labels: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceMergeCounts {
    pub source: String,
    pub images: usize,
    pub labels: usize,
    /// Images left out because `require_labels` was set and no label existed.
    pub unlabeled_skipped: usize,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for split in &self.splits {
            writeln!(
                f,
                "{}: {} images, {} labels",
                split.split, split.total_images, split.total_labels
            )?;
            for source in &split.sources {
                write!(
                    f,
                    "  {}: {} images, {} labels",
                    source.source, source.images, source.labels
                )?;
                if source.unlabeled_skipped > 0 {
                    write!(f, " ({} unlabeled skipped)", source.unlabeled_skipped)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Source names become file-name prefixes, so they must be non-empty,
/// unique, and free of path separators. No prefix `<name><sep>` may start
/// another, or `a` + `b_001.jpg` and `a_b` + `001.jpg` would share a
/// destination.
pub fn validate_source_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
    separator: &str,
) -> Result<(), UnilabelError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(UnilabelError::ConfigInvalid {
                message: "source names must not be empty".to_string(),
            });
        }
        if name.contains('/') || name.contains('\\') {
            return Err(UnilabelError::ConfigInvalid {
                message: format!("source name '{name}' must not contain path separators"),
            });
        }
        if seen.contains(name) {
            return Err(UnilabelError::ConfigInvalid {
                message: format!("duplicate source name '{name}'"),
            });
        }

        let prefix = format!("{name}{separator}");
        for other in &seen {
            let other_prefix = format!("{other}{separator}");
            if prefix.starts_with(&other_prefix) || other_prefix.starts_with(&prefix) {
                return Err(UnilabelError::ConfigInvalid {
                    message: format!(
                        "source names '{other}' and '{name}' produce overlapping prefixes \
                         '{other_prefix}' and '{prefix}'"
                    ),
                });
            }
        }
        seen.insert(name);
    }
    Ok(())
}

/// Copies every source's splits into `output` under prefixed names.
pub fn merge_corpora(
    sources: &[MergeSource],
    output: &CorpusLayout,
    splits: &[String],
    options: &MergeOptions,
) -> Result<MergeReport, UnilabelError> {
    validate_source_names(
        sources.iter().map(|source| source.name.as_str()),
        &options.separator,
    )?;
    if options.separator.contains('/') || options.separator.contains('\\') {
        return Err(UnilabelError::ConfigInvalid {
            message: format!(
                "merge separator '{}' must not contain path separators",
                options.separator
            ),
        });
    }

    let mut report = MergeReport::default();
    for split in splits {
        output.ensure_split(split)?;
        let mut split_report = SplitMergeReport {
            split: split.clone(),
            ..Default::default()
        };

        for source in sources {
            let counts = merge_one(source, output, split, options)?;
            split_report.total_images += counts.images;
            split_report.total_labels += counts.labels;
            split_report.sources.push(counts);
        }

        info!(
            "merged {}: {} images, {} labels from {} source(s)",
            split,
            split_report.total_images,
            split_report.total_labels,
            sources.len()
        );
        report.splits.push(split_report);
    }

    Ok(report)
}

fn merge_one(
    source: &MergeSource,
    output: &CorpusLayout,
    split: &str,
    options: &MergeOptions,
) -> Result<SourceMergeCounts, UnilabelError> {
    let mut counts = SourceMergeCounts {
        source: source.name.clone(),
        ..Default::default()
    };

    let images_dir = source.layout.images_dir(split);
    let labels_dir = source.layout.labels_dir(split);
    if !images_dir.is_dir() || !labels_dir.is_dir() {
        warn!(
            "{}: no {} split under {}, contributing nothing",
            source.name,
            split,
            source.layout.root.display()
        );
        return Ok(counts);
    }

    let prefix = format!("{}{}", source.name, options.separator);
    for image_path in list_visible_files(&images_dir)? {
        let (Some(file_name), Some(stem)) = (file_name_of(&image_path), stem_of(&image_path))
        else {
            continue;
        };

        let label_src = source.layout.label_path(split, &stem);
        let has_label = label_src.is_file();
        if options.require_labels && !has_label {
            counts.unlabeled_skipped += 1;
            continue;
        }

        let image_dst = output.images_dir(split).join(format!("{prefix}{file_name}"));
        transfer_file(&image_path, &image_dst, options.transfer)?;
        counts.images += 1;

        if has_label {
            let label_dst = output.label_path(split, &format!("{prefix}{stem}"));
            fs::copy(&label_src, &label_dst).map_err(UnilabelError::io_at(&label_dst))?;
            counts.labels += 1;
        }
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn touch(path: PathBuf, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn source(root: &std::path::Path, name: &str) -> MergeSource {
        let layout = CorpusLayout::new(root.join(name));
        touch(layout.images_dir("train").join("001.jpg"), name);
        touch(layout.label_path("train", "001"), "0 0.5 0.5 0.1 0.1\n");
        MergeSource::new(name, layout)
    }

    #[test]
    fn same_stem_in_two_sources_gets_two_destinations() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let sources = vec![source(temp.path(), "src1"), source(temp.path(), "src2")];
        let output = CorpusLayout::new(temp.path().join("merged"));

        let report = merge_corpora(
            &sources,
            &output,
            &["train".to_string()],
            &MergeOptions {
                transfer: TransferMode::Copy,
                ..Default::default()
            },
        )
        .expect("merge");

        assert_eq!(report.splits[0].total_images, 2);
        assert_eq!(report.splits[0].total_labels, 2);
        assert_eq!(
            fs::read_to_string(output.images_dir("train").join("src1_001.jpg")).unwrap(),
            "src1"
        );
        assert_eq!(
            fs::read_to_string(output.images_dir("train").join("src2_001.jpg")).unwrap(),
            "src2"
        );
        assert!(output.label_path("train", "src2_001").is_file());
    }

    #[test]
    fn image_without_label_is_copied_unless_labels_are_required() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = source(temp.path(), "coco");
        touch(src.layout.images_dir("train").join("002.jpg"), "bare");

        let output = CorpusLayout::new(temp.path().join("loose"));
        let report = merge_corpora(
            std::slice::from_ref(&src),
            &output,
            &["train".to_string()],
            &MergeOptions::default(),
        )
        .expect("merge");
        assert_eq!(report.splits[0].sources[0].images, 2);
        assert_eq!(report.splits[0].sources[0].labels, 1);

        let output = CorpusLayout::new(temp.path().join("strict"));
        let report = merge_corpora(
            &[src],
            &output,
            &["train".to_string()],
            &MergeOptions {
                require_labels: true,
                ..Default::default()
            },
        )
        .expect("merge");
        assert_eq!(report.splits[0].sources[0].images, 1);
        assert_eq!(report.splits[0].sources[0].unlabeled_skipped, 1);
    }

    #[test]
    fn missing_split_contributes_zero() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = source(temp.path(), "voc");
        let output = CorpusLayout::new(temp.path().join("merged"));

        let report = merge_corpora(
            &[src],
            &output,
            &["val".to_string()],
            &MergeOptions::default(),
        )
        .expect("merge");
        assert_eq!(report.splits[0].total_images, 0);
        assert!(output.images_dir("val").is_dir());
    }

    #[test]
    fn rejects_bad_source_names() {
        assert!(validate_source_names(["a", "b"], "_").is_ok());
        assert!(validate_source_names(["a", "a"], "_").is_err());
        assert!(validate_source_names([""], "_").is_err());
        assert!(validate_source_names(["x/y"], "_").is_err());
    }

    #[test]
    fn rejects_names_whose_prefixes_overlap() {
        assert!(validate_source_names(["a", "a_b"], "_").is_err());
        assert!(validate_source_names(["a_b", "a"], "_").is_err());
        assert!(validate_source_names(["a", "a__"], "__").is_err());
        // "ab" does not start with "a_", so the names cannot collide.
        assert!(validate_source_names(["a", "ab"], "_").is_ok());
        assert!(validate_source_names(["coco", "coco_2017"], "-").is_ok());
    }

    #[test]
    fn overlapping_prefixes_fail_before_any_file_is_written() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let short = CorpusLayout::new(temp.path().join("a"));
        touch(short.images_dir("train").join("b_001.jpg"), "from a");
        touch(short.label_path("train", "b_001"), "0 0.5 0.5 0.1 0.1\n");
        let long = CorpusLayout::new(temp.path().join("a_b"));
        touch(long.images_dir("train").join("001.jpg"), "from a_b");
        touch(long.label_path("train", "001"), "1 0.5 0.5 0.1 0.1\n");

        let output = CorpusLayout::new(temp.path().join("merged"));
        let err = merge_corpora(
            &[MergeSource::new("a", short), MergeSource::new("a_b", long)],
            &output,
            &["train".to_string()],
            &MergeOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, UnilabelError::ConfigInvalid { .. }));
        assert!(!output.images_dir("train").join("a_b_001.jpg").exists());
    }
}
