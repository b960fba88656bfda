//! Canonical YOLO-style label files: one `<stem>.txt` per image, one box per
//! line as `"<class> <cx> <cy> <w> <h>"`.
//!
//! A missing file and an empty file both mean "no annotations".

use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::ids::ClassIndex;
use super::model::BoxAnnotation;
use crate::error::UnilabelError;

/// A parsed label row before any class remapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRow {
    pub class_id: u32,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

/// Parses one label line. Blank lines yield `Ok(None)`.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<LabelRow>, UnilabelError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() != 5 {
        return Err(UnilabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: if tokens.len() < 5 {
                format!("expected 5 tokens, found {}", tokens.len())
            } else {
                "expected 5 tokens; segmentation/pose rows are not supported".to_string()
            },
        });
    }

    let class_id = tokens[0]
        .parse::<u32>()
        .map_err(|_| UnilabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(LabelRow {
        class_id,
        cx,
        cy,
        w,
        h,
    }))
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, UnilabelError> {
    raw.parse::<f64>()
        .map_err(|_| UnilabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
        })
}

/// Collects the distinct class indices in a label file.
///
/// An absent file yields an empty set. Class ids at or above `class_count`
/// are rejected.
pub fn read_label_classes(
    path: &Path,
    class_count: usize,
) -> Result<BTreeSet<ClassIndex>, UnilabelError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(err) => return Err(UnilabelError::io_at(path)(err)),
    };

    let mut classes = BTreeSet::new();
    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        let Some(row) = parse_label_line(line, path, line_num)? else {
            continue;
        };

        if row.class_id as usize >= class_count {
            return Err(UnilabelError::LabelParse {
                path: path.to_path_buf(),
                line: line_num,
                message: format!(
                    "class_id {} is out of range for vocabulary with {} class(es)",
                    row.class_id, class_count
                ),
            });
        }
        classes.insert(ClassIndex(row.class_id));
    }

    Ok(classes)
}

/// Returns true when a label file exists and holds at least one box line.
pub fn has_annotations(path: &Path) -> Result<bool, UnilabelError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.lines().any(|line| !line.trim().is_empty())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(UnilabelError::io_at(path)(err)),
    }
}

/// Writes annotations as canonical label lines.
pub fn write_label_file(path: &Path, annotations: &[BoxAnnotation]) -> Result<(), UnilabelError> {
    let file = fs::File::create(path).map_err(UnilabelError::io_at(path))?;
    let mut writer = BufWriter::new(file);
    for annotation in annotations {
        writeln!(writer, "{}", annotation.to_label_line()).map_err(UnilabelError::io_at(path))?;
    }
    writer.flush().map_err(UnilabelError::io_at(path))
}
