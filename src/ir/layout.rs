//! The `images/<split>/` + `labels/<split>/` directory contract shared by
//! converted, merged, and sampled corpora.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::UnilabelError;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];
pub const LABEL_EXTENSION: &str = "txt";

/// A corpus root on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusLayout {
    pub root: PathBuf,
}

impl CorpusLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn images_dir(&self, split: &str) -> PathBuf {
        self.root.join("images").join(split)
    }

    pub fn labels_dir(&self, split: &str) -> PathBuf {
        self.root.join("labels").join(split)
    }

    pub fn label_path(&self, split: &str, stem: &str) -> PathBuf {
        self.labels_dir(split)
            .join(format!("{stem}.{LABEL_EXTENSION}"))
    }

    /// Creates both directories for `split`.
    pub fn ensure_split(&self, split: &str) -> Result<(), UnilabelError> {
        for dir in [self.images_dir(split), self.labels_dir(split)] {
            fs::create_dir_all(&dir).map_err(UnilabelError::io_at(&dir))?;
        }
        Ok(())
    }
}

/// How an image reaches the destination tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Hard link, falling back to a copy across filesystems.
    #[default]
    Link,
    Copy,
}

/// Places `src` at `dst` according to `mode`, replacing any existing `dst`.
pub fn transfer_file(src: &Path, dst: &Path, mode: TransferMode) -> Result<(), UnilabelError> {
    // dst may be a hard link to src from an earlier run; copying onto it
    // would truncate the source.
    match fs::remove_file(dst) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(UnilabelError::io_at(dst)(err)),
    }

    if mode == TransferMode::Link {
        match fs::hard_link(src, dst) {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(UnilabelError::io_at(src)(err));
            }
            // Cross-device links fall through to copy.
            Err(_) => {}
        }
    }

    fs::copy(src, dst)
        .map(|_| ())
        .map_err(UnilabelError::io_at(dst))
}

/// Lists the regular, non-hidden files directly inside `dir`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn list_visible_files(dir: &Path) -> Result<Vec<PathBuf>, UnilabelError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| UnilabelError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && !is_hidden(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// File stem as an owned string.
pub fn stem_of(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

pub fn file_name_of(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Finds `<dir>/<stem>.<ext>` trying `extensions` in order.
pub fn find_image_for_stem(dir: &Path, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}
