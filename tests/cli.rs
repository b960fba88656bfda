mod common;

use std::fs;

use assert_cmd::Command;
use common::{write_text, write_yolo_labels};
use predicates::prelude::*;

const CONFIG: &str = "\
vocabulary:
  path: work/master.names
  sources:
    - builtin: voc
    - names_file: extra.names
sources:
  - name: o365
    root: raw/o365
    format: yolo
converted_root: work/converted
merged_root: work/merged
subset_root: work/subset
";

fn write_config(root: &std::path::Path) -> std::path::PathBuf {
    write_text(&root.join("extra.names"), "Person\nSneakers\n");
    let path = root.join("pipeline.yaml");
    write_text(&path, CONFIG);
    path
}

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("unilabel").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("unilabel").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("unilabel 0.1.0\n");
}

#[test]
fn vocab_writes_master_names_file() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path());

    let mut cmd = Command::cargo_bin("unilabel").unwrap();
    cmd.args(["vocab", "--config"]).arg(&config);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Vocabulary: 21 classes"));

    let names = fs::read_to_string(temp.path().join("work/master.names")).unwrap();
    let lines: Vec<&str> = names.lines().collect();
    assert_eq!(lines.len(), 21);
    assert_eq!(lines[0], "aeroplane");
    assert_eq!(lines[20], "sneakers");
}

#[test]
fn vocab_reads_config_from_env() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path());

    let mut cmd = Command::cargo_bin("unilabel").unwrap();
    cmd.arg("vocab").env("UNILABEL_CONFIG", &config);
    cmd.assert().success();
    assert!(temp.path().join("work/master.names").is_file());
}

#[test]
fn vocab_json_output_is_valid_json() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path());

    let mut cmd = Command::cargo_bin("unilabel").unwrap();
    cmd.args(["--output", "json", "vocab", "--config"]).arg(&config);
    let output = cmd.assert().success().get_output().stdout.clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["size"], 21);
    assert_eq!(report["sources"][1]["already_present"], 1);
}

#[test]
fn prune_removes_orphans_under_root() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("corpus");
    write_text(&root.join("images/train/a.jpg"), "jpeg");
    write_text(&root.join("images/train/b.jpg"), "jpeg");
    write_yolo_labels(&root.join("labels/train"), "b", &[0]);
    write_yolo_labels(&root.join("labels/train"), "c", &[0]);

    let mut cmd = Command::cargo_bin("unilabel").unwrap();
    cmd.args(["prune", "--split", "train"]).arg(&root);
    cmd.assert().success();

    assert!(!root.join("images/train/a.jpg").exists());
    assert!(root.join("images/train/b.jpg").exists());
    assert!(!root.join("labels/train/c.txt").exists());
}

#[test]
fn convert_unknown_source_fails() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path());

    let mut cmd = Command::cargo_bin("unilabel").unwrap();
    cmd.args(["convert", "--source", "imagenet", "--config"])
        .arg(&config);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("imagenet"));
}

#[test]
fn missing_config_fails() {
    let temp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("unilabel").unwrap();
    cmd.args(["run", "--config"])
        .arg(temp.path().join("nope.yaml"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn sample_rejects_out_of_range_fraction() {
    let temp = tempfile::tempdir().unwrap();
    let config = write_config(temp.path());

    let mut cmd = Command::cargo_bin("unilabel").unwrap();
    cmd.args(["sample", "--fraction", "1.5", "--config"])
        .arg(&config);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("fraction"));
}
