use std::path::PathBuf;
use thiserror::Error;

/// The main error type for unilabel operations.
#[derive(Debug, Error)]
pub enum UnilabelError {
    #[error("IO error at {path}: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read pipeline config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    #[error("Vocabulary is empty: no source produced any class names")]
    EmptyVocabulary,

    #[error("Invalid vocabulary file {path}: {message}")]
    VocabularyInvalid { path: PathBuf, message: String },

    #[error("Invalid class name list {path}: {message}")]
    NameListInvalid { path: PathBuf, message: String },

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse ODGT record in {path} at line {line}: {source}")]
    OdgtParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse Open Images CSV from {path}: {source}")]
    OpenImagesCsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse VOC XML from {path}: {message}")]
    VocXmlParse { path: PathBuf, message: String },

    #[error("Failed to parse YOLO data.yaml from {path}: {source}")]
    YoloDataYamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid YOLO classes.txt at {path}: {message}")]
    YoloClassesTxtInvalid { path: PathBuf, message: String },

    #[error("Failed to parse label file {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Invalid dataset layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Invalid sample parameters: {message}")]
    InvalidSampleParams { message: String },

    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[source] serde_json::Error),
}

impl UnilabelError {
    /// Wraps an IO error with the path it occurred at.
    pub(crate) fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| UnilabelError::IoAt { path, source }
    }
}
