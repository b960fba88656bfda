//! Pipeline configuration.
//!
//! One YAML file names the vocabulary lists, every source dataset, and the
//! destination roots. Relative paths are resolved against the directory of
//! the configuration file.
//!
//! ```yaml
//! vocabulary:
//!   path: work/master.names
//!   sources:
//!     - builtin: coco
//!     - yolo_class_map: raw/objects365/data.yaml
//! sources:
//!   - name: coco
//!     root: raw/coco
//!     format: coco
//!     splits: { train: train2017, val: val2017 }
//!   - name: crowdhuman
//!     root: raw/crowdhuman
//!     format: crowd_human
//! converted_root: work/converted
//! merged_root: work/merged
//! subset_root: work/subset
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::UnilabelError;
use crate::ir::{CorpusLayout, TransferMode};
use crate::merge::{validate_source_names, MergeOptions};
use crate::normalize::{NormalizeOptions, SourceConfig, SourceFormat};
use crate::sample::{validate_sample_options, SampleOptions};
use crate::vocab::{NameListSource, NAME_SEPARATOR};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub vocabulary: VocabularyConfig,

    #[serde(default = "default_splits")]
    pub splits: Vec<String>,

    /// Seed for the VOC split and the sampler draw.
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub transfer: TransferMode,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    pub converted_root: PathBuf,
    pub merged_root: PathBuf,
    pub subset_root: PathBuf,

    #[serde(default)]
    pub merge: MergeConfig,

    #[serde(default)]
    pub sample: SampleConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Where the vocabulary file is written and read back.
    pub path: PathBuf,
    /// Name lists in priority order.
    pub sources: Vec<NameListSource>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub require_labels: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            require_labels: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    #[serde(default = "default_fraction")]
    pub fraction: f64,
    #[serde(default = "default_min_per_class")]
    pub min_per_class: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            fraction: default_fraction(),
            min_per_class: default_min_per_class(),
        }
    }
}

fn default_splits() -> Vec<String> {
    vec!["train".to_string(), "val".to_string()]
}

fn default_seed() -> u64 {
    42
}

fn default_separator() -> String {
    NAME_SEPARATOR.to_string()
}

fn default_fraction() -> f64 {
    0.25
}

fn default_min_per_class() -> usize {
    1
}

impl PipelineConfig {
    /// Reads, resolves, and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, UnilabelError> {
        let data = fs::read_to_string(path).map_err(UnilabelError::io_at(path))?;
        let mut config: PipelineConfig =
            serde_yaml::from_str(&data).map_err(|source| UnilabelError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;

        let base = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.vocabulary.path);
        resolve(&mut self.converted_root);
        resolve(&mut self.merged_root);
        resolve(&mut self.subset_root);
        for list in &mut self.vocabulary.sources {
            list.resolve_paths(base);
        }
        for source in &mut self.sources {
            source.resolve_paths(base);
        }
    }

    /// Checks everything that can be checked without touching source data.
    pub fn validate(&self) -> Result<(), UnilabelError> {
        if self.vocabulary.sources.is_empty() {
            return Err(UnilabelError::ConfigInvalid {
                message: "vocabulary.sources must list at least one name list".to_string(),
            });
        }

        if self.splits.is_empty() {
            return Err(UnilabelError::ConfigInvalid {
                message: "at least one split is required".to_string(),
            });
        }
        let mut seen = BTreeSet::new();
        for split in &self.splits {
            if split.is_empty() || split.contains('/') || split.contains('\\') {
                return Err(UnilabelError::ConfigInvalid {
                    message: format!("invalid split name '{split}'"),
                });
            }
            if !seen.insert(split) {
                return Err(UnilabelError::ConfigInvalid {
                    message: format!("duplicate split '{split}'"),
                });
            }
        }

        if self.sources.is_empty() {
            return Err(UnilabelError::ConfigInvalid {
                message: "no sources configured".to_string(),
            });
        }
        validate_source_names(
            self.sources.iter().map(|source| source.name.as_str()),
            &self.merge.separator,
        )?;

        for source in &self.sources {
            if let SourceFormat::Voc { val_fraction } = source.format {
                if !(0.0..1.0).contains(&val_fraction) {
                    return Err(UnilabelError::ConfigInvalid {
                        message: format!(
                            "source '{}': val_fraction must be in [0.0, 1.0), got {}",
                            source.name, val_fraction
                        ),
                    });
                }
            }
            if let SourceFormat::CrowdHuman { tags } = &source.format {
                if tags.is_empty() {
                    return Err(UnilabelError::ConfigInvalid {
                        message: format!("source '{}': tags must not be empty", source.name),
                    });
                }
            }
        }

        if self.merge.separator.contains('/') || self.merge.separator.contains('\\') {
            return Err(UnilabelError::ConfigInvalid {
                message: format!(
                    "merge.separator '{}' must not contain path separators",
                    self.merge.separator
                ),
            });
        }

        validate_sample_options(&self.sample_options())
    }

    /// Looks up a configured source by name.
    pub fn source(&self, name: &str) -> Result<&SourceConfig, UnilabelError> {
        self.sources
            .iter()
            .find(|source| source.name == name)
            .ok_or_else(|| UnilabelError::UnknownSource(name.to_string()))
    }

    /// `<converted_root>/<source name>`.
    pub fn converted_layout(&self, source: &SourceConfig) -> CorpusLayout {
        CorpusLayout::new(self.converted_root.join(&source.name))
    }

    pub fn merged_layout(&self) -> CorpusLayout {
        CorpusLayout::new(&self.merged_root)
    }

    pub fn subset_layout(&self) -> CorpusLayout {
        CorpusLayout::new(&self.subset_root)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            transfer: self.transfer,
            seed: self.seed,
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            separator: self.merge.separator.clone(),
            require_labels: self.merge.require_labels,
            transfer: self.transfer,
        }
    }

    pub fn sample_options(&self) -> SampleOptions {
        SampleOptions {
            fraction: self.sample.fraction,
            seed: self.seed,
            min_per_class: self.sample.min_per_class,
        }
    }
}
