//! The unified class vocabulary.
//!
//! Several sources name their classes differently ("Traffic Light",
//! "traffic_light", "traffic light"). Every name is passed through
//! [`normalize`], and the normalized names of all configured lists are
//! concatenated in priority order. The first occurrence of a name claims the
//! next index; later occurrences map onto it.
//!
//! The resulting [`Vocabulary`] has no mutating API. It is persisted as a
//! newline-delimited file whose line order is the index order.

mod builtin;
pub mod class_map;
mod report;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use builtin::{BuiltinList, COCO_CLASSES, OBJECTS365_CLASSES, VOC_CLASSES};
pub use class_map::{read_class_map, write_data_yaml};
pub use report::{SourceContribution, VocabularyReport};

use crate::error::UnilabelError;
use crate::ir::ClassIndex;

/// Separator substituted for whitespace and path separators.
pub const NAME_SEPARATOR: char = '_';

/// Canonical form of a class name: trimmed, lower-cased, with every
/// whitespace character and `/` or `\` replaced by `_`.
///
/// `normalize(&normalize(x)) == normalize(x)` for every input.
pub fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                NAME_SEPARATOR
            } else {
                c
            }
        })
        .collect()
}

/// An ordered, duplicate-free list of normalized class names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    names: Vec<String>,
    index: HashMap<String, ClassIndex>,
}

impl Vocabulary {
    /// Builds a vocabulary from already-normalized names in index order.
    pub fn from_names(names: Vec<String>) -> Result<Self, UnilabelError> {
        Self::from_names_at(names, Path::new("<memory>"))
    }

    fn from_names_at(names: Vec<String>, origin: &Path) -> Result<Self, UnilabelError> {
        if names.is_empty() {
            return Err(UnilabelError::EmptyVocabulary);
        }

        let mut index = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            if normalize(name) != *name {
                return Err(UnilabelError::VocabularyInvalid {
                    path: origin.to_path_buf(),
                    message: format!(
                        "entry {} '{}' is not normalized (expected '{}')",
                        position,
                        name,
                        normalize(name)
                    ),
                });
            }

            let class = class_index_for(position)?;
            if index.insert(name.clone(), class).is_some() {
                return Err(UnilabelError::VocabularyInvalid {
                    path: origin.to_path_buf(),
                    message: format!("duplicate entry '{}' at line {}", name, position + 1),
                });
            }
        }

        Ok(Self { names, index })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed vocabulary; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, class: ClassIndex) -> Option<&str> {
        self.names.get(class.as_usize()).map(String::as_str)
    }

    /// Looks up an already-normalized name.
    pub fn get(&self, normalized: &str) -> Option<ClassIndex> {
        self.index.get(normalized).copied()
    }

    /// Normalizes a raw source name and looks it up.
    pub fn lookup(&self, raw: &str) -> Option<ClassIndex> {
        self.get(&normalize(raw))
    }
}

fn class_index_for(position: usize) -> Result<ClassIndex, UnilabelError> {
    u32::try_from(position)
        .map(ClassIndex::new)
        .map_err(|_| UnilabelError::ConfigInvalid {
            message: format!("vocabulary exceeds {} classes", u32::MAX),
        })
}

/// Accumulates name lists in priority order.
#[derive(Debug, Default)]
pub struct VocabularyBuilder {
    names: Vec<String>,
    // normalized name -> raw spelling that first claimed it
    first_spelling: HashMap<String, String>,
    report: VocabularyReport,
}

impl VocabularyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one list. Blank names are ignored.
    pub fn push_list<S: AsRef<str>>(&mut self, label: &str, raw_names: &[S]) -> &mut Self {
        let mut contribution = SourceContribution {
            label: label.to_string(),
            ..Default::default()
        };

        for raw in raw_names {
            let raw = raw.as_ref();
            let normalized = normalize(raw);
            if normalized.is_empty() {
                continue;
            }
            contribution.total += 1;

            match self.first_spelling.get(&normalized) {
                Some(first) => {
                    contribution.already_present += 1;
                    if first.trim() != raw.trim() {
                        contribution.aliased += 1;
                        debug!(
                            "{}: '{}' unified with earlier '{}' as '{}'",
                            label, raw, first, normalized
                        );
                    }
                }
                None => {
                    self.first_spelling
                        .insert(normalized.clone(), raw.to_string());
                    self.names.push(normalized);
                    contribution.added += 1;
                }
            }
        }

        self.report.sources.push(contribution);
        self
    }

    /// Freezes the accumulated names. An empty result is a configuration error.
    pub fn finish(self) -> Result<(Vocabulary, VocabularyReport), UnilabelError> {
        let mut report = self.report;
        let vocabulary = Vocabulary::from_names(self.names)?;
        report.size = vocabulary.len();
        Ok((vocabulary, report))
    }
}

/// Where one ordered name list comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameListSource {
    /// A list compiled into the binary.
    Builtin(BuiltinList),
    /// Newline-delimited names.
    NamesFile(PathBuf),
    /// Headerless `LabelName,DisplayName` CSV (Open Images `classes.csv`).
    OpenImagesCsv(PathBuf),
    /// YOLO `data.yaml` or `classes.txt`.
    YoloClassMap(PathBuf),
}

impl NameListSource {
    pub fn label(&self) -> String {
        match self {
            NameListSource::Builtin(list) => list.label().to_string(),
            NameListSource::NamesFile(path) => format!("names:{}", path.display()),
            NameListSource::OpenImagesCsv(path) => format!("open-images:{}", path.display()),
            NameListSource::YoloClassMap(path) => format!("yolo:{}", path.display()),
        }
    }

    /// Reads the raw (not yet normalized) names.
    pub fn load(&self) -> Result<Vec<String>, UnilabelError> {
        match self {
            NameListSource::Builtin(list) => {
                Ok(list.names().iter().map(|name| name.to_string()).collect())
            }
            NameListSource::NamesFile(path) => {
                let data = fs::read_to_string(path).map_err(UnilabelError::io_at(path))?;
                Ok(data
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect())
            }
            NameListSource::OpenImagesCsv(path) => Ok(read_open_images_classes(path)?
                .into_iter()
                .map(|(_, display_name)| display_name)
                .collect()),
            NameListSource::YoloClassMap(path) => read_class_map(path),
        }
    }

    pub(crate) fn resolve_paths(&mut self, base: &Path) {
        match self {
            NameListSource::Builtin(_) => {}
            NameListSource::NamesFile(path)
            | NameListSource::OpenImagesCsv(path)
            | NameListSource::YoloClassMap(path) => {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }
}

/// Builds the vocabulary from lists given in priority order.
pub fn build_vocabulary(
    sources: &[NameListSource],
) -> Result<(Vocabulary, VocabularyReport), UnilabelError> {
    if sources.is_empty() {
        return Err(UnilabelError::ConfigInvalid {
            message: "no vocabulary name lists configured".to_string(),
        });
    }

    let mut builder = VocabularyBuilder::new();
    for source in sources {
        let names = source.load()?;
        builder.push_list(&source.label(), &names);
    }
    builder.finish()
}

/// Reads a persisted vocabulary. Blank lines are skipped.
pub fn read_vocabulary(path: &Path) -> Result<Vocabulary, UnilabelError> {
    let data = fs::read_to_string(path).map_err(UnilabelError::io_at(path))?;
    let names: Vec<String> = data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    Vocabulary::from_names_at(names, path)
}

/// Writes one name per line in index order.
pub fn write_vocabulary(path: &Path, vocabulary: &Vocabulary) -> Result<(), UnilabelError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(UnilabelError::io_at(parent))?;
    }

    let mut data = vocabulary.names().join("\n");
    data.push('\n');
    fs::write(path, data).map_err(UnilabelError::io_at(path))
}

/// Reads Open Images `classes.csv` as `(LabelName, DisplayName)` pairs.
pub(crate) fn read_open_images_classes(
    path: &Path,
) -> Result<Vec<(String, String)>, UnilabelError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| UnilabelError::OpenImagesCsvParse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut pairs = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| UnilabelError::OpenImagesCsvParse {
            path: path.to_path_buf(),
            source,
        })?;

        match (record.get(0), record.get(1)) {
            (Some(label_name), Some(display_name)) => {
                pairs.push((label_name.to_string(), display_name.to_string()));
            }
            _ => {
                return Err(UnilabelError::NameListInvalid {
                    path: path.to_path_buf(),
                    message: format!("row {} needs LabelName and DisplayName", row_idx + 1),
                });
            }
        }
    }

    Ok(pairs)
}
