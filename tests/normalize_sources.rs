mod common;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use common::{file_names, vocabulary, write_bmp, write_text};
use unilabel::ir::{CorpusLayout, TransferMode};
use unilabel::normalize::{
    normalize_source, NormalizeOptions, SkipReason, SourceConfig, SourceFormat,
};
use unilabel::UnilabelError;

fn options() -> NormalizeOptions {
    NormalizeOptions {
        transfer: TransferMode::Copy,
        seed: 42,
    }
}

fn source(name: &str, root: PathBuf, format: SourceFormat) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        root,
        format,
        splits: BTreeMap::new(),
    }
}

fn splits(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn crowdhuman_probes_missing_dimensions_and_filters_tags() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().join("crowdhuman");
    write_bmp(&root.join("images/273271,1a0d6000b9e1f5b7.jpg"), 200, 100);
    write_bmp(&root.join("images/284193,faa9000f2678b5e.png"), 50, 50);

    let odgt = [
        r#"{"ID": "273271,1a0d6000b9e1f5b7", "gtboxes": [
            {"tag": "person", "fbox": [20, 10, 40, 20], "vbox": [0, 0, 1, 1]},
            {"tag": "mask", "fbox": [0, 0, 10, 10]},
            {"tag": "person"}
        ]}"#
        .replace('\n', " "),
        r#"{"ID": "284193,faa9000f2678b5e", "img_w": 50, "img_h": 50, "gtboxes": [{"tag": "mask", "hbox": [1, 1, 5, 5]}]}"#.to_string(),
        r#"{"ID": "missing", "gtboxes": []}"#.to_string(),
    ]
    .join("\n");
    write_text(&root.join("annotation_val.odgt"), &odgt);

    let out = CorpusLayout::new(temp.path().join("out"));
    let reports = normalize_source(
        &source(
            "crowdhuman",
            root,
            SourceFormat::CrowdHuman {
                tags: vec!["Person".to_string()],
            },
        ),
        &vocabulary(&["person", "car"]),
        &out,
        &splits(&["val"]),
        options(),
    )
    .expect("normalize");

    let report = &reports[0];
    assert_eq!(report.records, 3);
    assert_eq!(report.images_written, 1);
    assert_eq!(report.images_dropped_empty, 1);
    assert_eq!(report.dimension_probes, 1);
    assert_eq!(report.skipped_count(SkipReason::FilteredTag), 2);
    assert_eq!(report.skipped_count(SkipReason::NoUsableBox), 1);
    assert_eq!(report.skipped_count(SkipReason::MissingImage), 1);

    let label = fs::read_to_string(out.label_path("val", "273271,1a0d6000b9e1f5b7"))
        .expect("label written");
    assert_eq!(label, "0 0.200000 0.200000 0.200000 0.200000\n");
    assert_eq!(
        file_names(&out.images_dir("val")),
        vec!["273271,1a0d6000b9e1f5b7.jpg"]
    );
}

#[test]
fn crowdhuman_malformed_line_is_fatal() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().join("crowdhuman");
    fs::create_dir_all(root.join("images")).expect("mkdir");
    write_text(&root.join("annotation_train.odgt"), "{\"ID\": \"a\"}\n{not json\n");

    let err = normalize_source(
        &source(
            "crowdhuman",
            root,
            SourceFormat::CrowdHuman {
                tags: vec!["person".to_string()],
            },
        ),
        &vocabulary(&["person"]),
        &CorpusLayout::new(temp.path().join("out")),
        &splits(&["train"]),
        options(),
    )
    .unwrap_err();

    assert!(matches!(err, UnilabelError::OdgtParse { line: 2, .. }));
}

fn write_voc_sample(root: &std::path::Path, stem: &str, class: &str) {
    write_bmp(&root.join(format!("JPEGImages/{stem}.jpg")), 100, 100);
    write_text(
        &root.join(format!("Annotations/{stem}.xml")),
        &format!(
            "<annotation><size><width>100</width><height>100</height></size>\
             <object><name>{class}</name><bndbox>\
             <xmin>10</xmin><ymin>10</ymin><xmax>50</xmax><ymax>50</ymax>\
             </bndbox></object></annotation>"
        ),
    );
}

#[test]
fn voc_splits_valid_samples_deterministically() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().join("voc");
    for i in 0..10 {
        write_voc_sample(&root, &format!("2008_{i:06}"), "dog");
    }
    write_voc_sample(&root, "2008_999999", "unicorn");

    let config = source("voc", root, SourceFormat::Voc { val_fraction: 0.2 });
    let vocab = vocabulary(&["person", "dog"]);

    let first_out = CorpusLayout::new(temp.path().join("first"));
    let reports =
        normalize_source(&config, &vocab, &first_out, &splits(&["train", "val"]), options())
            .expect("normalize");

    let by_split: BTreeMap<&str, _> = reports
        .iter()
        .map(|report| (report.split.as_str(), report))
        .collect();
    assert_eq!(by_split["unsplit"].records, 11);
    assert_eq!(by_split["unsplit"].images_dropped_empty, 1);
    assert_eq!(by_split["unsplit"].skipped_count(SkipReason::UnmappedClass), 1);
    assert_eq!(by_split["train"].images_written, 8);
    assert_eq!(by_split["val"].images_written, 2);

    let second_out = CorpusLayout::new(temp.path().join("second"));
    normalize_source(&config, &vocab, &second_out, &splits(&["train", "val"]), options())
        .expect("normalize again");

    assert_eq!(
        file_names(&first_out.images_dir("val")),
        file_names(&second_out.images_dir("val"))
    );
    assert_eq!(
        fs::read_to_string(first_out.label_path("train", &stem_of_first(&first_out)))
            .expect("label"),
        "1 0.300000 0.300000 0.400000 0.400000\n"
    );
}

#[test]
fn voc_partitions_follow_configured_split_names() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().join("voc");
    for i in 0..5 {
        write_voc_sample(&root, &format!("2009_{i:06}"), "dog");
    }

    let mut config = source("voc", root, SourceFormat::Voc { val_fraction: 0.2 });
    config.splits.insert("training".to_string(), "train".to_string());
    config.splits.insert("validation".to_string(), "val".to_string());

    let out = CorpusLayout::new(temp.path().join("out"));
    let reports = normalize_source(
        &config,
        &vocabulary(&["dog"]),
        &out,
        &splits(&["training", "validation"]),
        options(),
    )
    .expect("normalize");

    let written: BTreeMap<&str, usize> = reports
        .iter()
        .map(|report| (report.split.as_str(), report.images_written))
        .collect();
    assert_eq!(written["training"], 4);
    assert_eq!(written["validation"], 1);
    assert_eq!(file_names(&out.images_dir("training")).len(), 4);
    assert_eq!(file_names(&out.labels_dir("validation")).len(), 1);
    assert!(!out.images_dir("train").exists());
    assert!(!out.images_dir("val").exists());
}

#[test]
fn voc_partition_without_output_split_is_counted_not_written() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().join("voc");
    for i in 0..5 {
        write_voc_sample(&root, &format!("2010_{i:06}"), "dog");
    }

    let config = source("voc", root, SourceFormat::Voc { val_fraction: 0.2 });
    let out = CorpusLayout::new(temp.path().join("out"));
    let reports = normalize_source(
        &config,
        &vocabulary(&["dog"]),
        &out,
        &splits(&["train"]),
        options(),
    )
    .expect("normalize");

    let val = reports
        .iter()
        .find(|report| report.split == "val")
        .expect("val partition reported");
    assert_eq!(val.records, 1);
    assert_eq!(val.images_written, 0);
    assert_eq!(file_names(&out.images_dir("train")).len(), 4);
    assert!(!out.images_dir("val").exists());
}

fn stem_of_first(layout: &CorpusLayout) -> String {
    let first = file_names(&layout.labels_dir("train"))
        .into_iter()
        .next()
        .expect("at least one train label");
    first.trim_end_matches(".txt").to_string()
}

#[test]
fn open_images_skips_missing_split_and_converts_present_one() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().join("openimages");
    write_text(&root.join("train/data/000a1249af2bc5f0.jpg"), "jpeg bytes");
    write_text(&root.join("train/data/000b2d1a3e9c0f11.jpg"), "jpeg bytes");
    write_text(
        &root.join("train/metadata/classes.csv"),
        "/m/01g317,Person\n/m/0k4j,Car\n/m/0dzct,Human face\n",
    );
    write_text(
        &root.join("train/labels/detections.csv"),
        "ImageID,Source,LabelName,Confidence,XMin,XMax,YMin,YMax,IsOccluded\n\
         000a1249af2bc5f0,xclick,/m/01g317,1,0.1,0.5,0.2,0.6,0\n\
         000a1249af2bc5f0,xclick,/m/0dzct,1,0.2,0.3,0.2,0.3,0\n\
         000a1249af2bc5f0,xclick,/m/0k4j,1,0.9,1.3,0.0,0.2,0\n\
         000b2d1a3e9c0f11,xclick,/m/0k4j,1,0.4,0.4,0.1,0.9,0\n\
         ffffffffffffffff,xclick,/m/0k4j,1,0.1,0.2,0.1,0.2,0\n",
    );

    let out = CorpusLayout::new(temp.path().join("out"));
    let reports = normalize_source(
        &source("openimages", root, SourceFormat::OpenImages),
        &vocabulary(&["person", "car"]),
        &out,
        &splits(&["train", "val"]),
        options(),
    )
    .expect("normalize");

    let train = &reports[0];
    assert_eq!(train.records, 3);
    assert_eq!(train.images_written, 1);
    assert_eq!(train.annotations_written, 2);
    assert_eq!(train.dimension_probes, 0);
    assert_eq!(train.skipped_count(SkipReason::UnmappedClass), 1);
    assert_eq!(train.skipped_count(SkipReason::DegenerateBox), 1);
    assert_eq!(train.skipped_count(SkipReason::MissingImage), 1);
    assert_eq!(train.images_dropped_empty, 1);

    // The car box is clipped at the right edge.
    let label = fs::read_to_string(out.label_path("train", "000a1249af2bc5f0")).expect("label");
    assert_eq!(
        label,
        "0 0.300000 0.400000 0.400000 0.400000\n1 0.950000 0.100000 0.100000 0.200000\n"
    );

    let val = &reports[1];
    assert_eq!(val.records, 0);
    assert!(!out.images_dir("val").exists());
}

#[test]
fn yolo_source_reads_class_map_from_root() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().join("objects365");
    write_text(&root.join("data.yaml"), "names:\n  0: Person\n  1: Sneakers\n  2: Lamp\n");
    write_text(&root.join("images/train/obj_000001.jpg"), "jpeg bytes");
    write_text(
        &root.join("labels/train/obj_000001.txt"),
        "1 0.5 0.5 0.2 0.2\n2 0.5 0.5 0.2 0.2\n",
    );

    let out = CorpusLayout::new(temp.path().join("out"));
    let mut config = source("objects365", root, SourceFormat::Yolo { names: None });
    config.splits.insert("train".to_string(), "train".to_string());

    let reports = normalize_source(
        &config,
        &vocabulary(&["person", "car", "sneakers"]),
        &out,
        &splits(&["train"]),
        options(),
    )
    .expect("normalize");

    assert_eq!(reports[0].annotations_written, 1);
    assert_eq!(
        fs::read_to_string(out.label_path("train", "obj_000001")).expect("label"),
        "2 0.500000 0.500000 0.200000 0.200000\n"
    );
}

#[test]
fn yolo_source_without_class_map_is_a_layout_error() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let err = normalize_source(
        &source("o365", temp.path().to_path_buf(), SourceFormat::Yolo { names: None }),
        &vocabulary(&["person"]),
        &CorpusLayout::new(temp.path().join("out")),
        &splits(&["train"]),
        options(),
    )
    .unwrap_err();

    assert!(matches!(err, UnilabelError::LayoutInvalid { .. }));
}
