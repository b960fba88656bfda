//! YOLO class maps: `data.yaml` (`names:` as a list or an index mapping) and
//! `classes.txt` (one name per line).
//!
//! These are read for sources that ship pre-indexed labels, and written for
//! the corpora this crate produces so that a trainer can consume them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::Vocabulary;
use crate::error::UnilabelError;

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

/// Reads a class list from a `data.yaml`/`.yml` file or a plain text list.
pub fn read_class_map(path: &Path) -> Result<Vec<String>, UnilabelError> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        read_data_yaml_names(path)
    } else {
        read_classes_txt(path)
    }
}

/// Locates the class map of a YOLO dataset root, preferring `data.yaml`.
pub fn discover_class_map(root: &Path) -> Result<PathBuf, UnilabelError> {
    let data_yaml = root.join("data.yaml");
    if data_yaml.is_file() {
        return Ok(data_yaml);
    }

    let classes_txt = root.join("classes.txt");
    if classes_txt.is_file() {
        return Ok(classes_txt);
    }

    Err(UnilabelError::LayoutInvalid {
        path: root.to_path_buf(),
        message: "no data.yaml or classes.txt found for pre-indexed labels".to_string(),
    })
}

fn read_data_yaml_names(path: &Path) -> Result<Vec<String>, UnilabelError> {
    let data = fs::read_to_string(path).map_err(UnilabelError::io_at(path))?;
    let parsed: DataYaml =
        serde_yaml::from_str(&data).map_err(|source| UnilabelError::YoloDataYamlParse {
            path: path.to_path_buf(),
            source,
        })?;

    let names = match parsed.names {
        DataYamlNames::Sequence(names) => names,
        DataYamlNames::Mapping(mapping) => {
            let Some(max_index) = mapping.keys().max().copied() else {
                return Ok(Vec::new());
            };
            // Gaps keep their position so that later indices stay aligned.
            let mut names = vec![String::new(); max_index + 1];
            for (index, name) in mapping {
                names[index] = name;
            }
            for (index, name) in names.iter_mut().enumerate() {
                if name.trim().is_empty() {
                    *name = format!("class_{}", index);
                }
            }
            names
        }
    };

    Ok(names)
}

fn read_classes_txt(path: &Path) -> Result<Vec<String>, UnilabelError> {
    let data = fs::read_to_string(path).map_err(UnilabelError::io_at(path))?;
    let mut names = Vec::new();

    for (line_idx, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            // A trailing blank line is harmless; an interior one would shift indices.
            if data.lines().skip(line_idx).all(|rest| rest.trim().is_empty()) {
                break;
            }
            return Err(UnilabelError::YoloClassesTxtInvalid {
                path: path.to_path_buf(),
                message: format!("line {} is empty", line_idx + 1),
            });
        }
        names.push(trimmed.to_string());
    }

    Ok(names)
}

/// Writes the `data.yaml` a YOLO trainer expects at a corpus root.
pub fn write_data_yaml(
    corpus_root: &Path,
    splits: &[String],
    vocabulary: &Vocabulary,
) -> Result<(), UnilabelError> {
    let mut yaml = format!(
        "path: {}\n",
        yaml_single_quoted(&corpus_root.to_string_lossy())
    );
    for split in splits {
        yaml.push_str(&format!(
            "{}: {}\n",
            split,
            yaml_single_quoted(&format!("images/{split}"))
        ));
    }
    yaml.push_str(&format!("nc: {}\n", vocabulary.len()));
    yaml.push_str("names:\n");
    for (idx, name) in vocabulary.names().iter().enumerate() {
        yaml.push_str(&format!("  {}: {}\n", idx, yaml_single_quoted(name)));
    }

    fs::create_dir_all(corpus_root).map_err(UnilabelError::io_at(corpus_root))?;
    let path = corpus_root.join("data.yaml");
    fs::write(&path, yaml).map_err(UnilabelError::io_at(&path))
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_yaml_mapping_fills_gaps() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("data.yaml");
        fs::write(&path, "names:\n  0: Person\n  2: Traffic Light\n").expect("write yaml");

        let names = read_class_map(&path).expect("read class map");
        assert_eq!(names, vec!["Person", "class_1", "Traffic Light"]);
    }

    #[test]
    fn data_yaml_sequence_is_read_in_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("objects365.yml");
        fs::write(&path, "names:\n  - Person\n  - Sneakers\n").expect("write yaml");

        assert_eq!(
            read_class_map(&path).expect("read"),
            vec!["Person", "Sneakers"]
        );
    }

    #[test]
    fn classes_txt_rejects_interior_blank_line() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("classes.txt");
        fs::write(&path, "cat\n\ndog\n").expect("write classes");

        let err = read_class_map(&path).unwrap_err();
        assert!(matches!(err, UnilabelError::YoloClassesTxtInvalid { .. }));

        fs::write(&path, "cat\ndog\n\n").expect("write classes");
        assert_eq!(read_class_map(&path).expect("read"), vec!["cat", "dog"]);
    }

    #[test]
    fn discover_prefers_data_yaml() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("classes.txt"), "a\n").expect("write");
        fs::write(temp.path().join("data.yaml"), "names: [a]\n").expect("write");

        let found = discover_class_map(temp.path()).expect("discover");
        assert!(found.ends_with("data.yaml"));
    }

    #[test]
    fn data_yaml_lists_splits_and_quoted_names() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let vocabulary =
            Vocabulary::from_names(vec!["person".to_string(), "o'clock".to_string()])
                .expect("vocabulary");

        write_data_yaml(
            temp.path(),
            &["train".to_string(), "val".to_string()],
            &vocabulary,
        )
        .expect("write data yaml");

        let yaml = fs::read_to_string(temp.path().join("data.yaml")).expect("read");
        assert!(yaml.contains("train: 'images/train'\n"));
        assert!(yaml.contains("val: 'images/val'\n"));
        assert!(yaml.contains("nc: 2\n"));
        assert!(yaml.contains("  0: 'person'\n"));
        assert!(yaml.contains("  1: 'o''clock'\n"));
    }
}
