#![allow(dead_code)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use unilabel::ir::ClassIndex;
use unilabel::sample::CoverageItem;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Raw class names the way datasets spell them: mixed case, spaces,
/// slashes, underscores, stray padding.
pub fn arb_raw_name() -> BoxedStrategy<String> {
    "[ ]{0,2}[A-Za-z][A-Za-z0-9 /_-]{0,16}[ ]{0,2}".boxed()
}

pub fn arb_name_list(max_len: usize) -> BoxedStrategy<Vec<String>> {
    prop::collection::vec(arb_raw_name(), 0..=max_len).boxed()
}

/// Items `item000..` each holding a subset of `0..class_count`.
pub fn arb_coverage_items(
    max_items: usize,
    class_count: u32,
) -> BoxedStrategy<Vec<CoverageItem>> {
    prop::collection::vec(
        prop::collection::btree_set(0..class_count, 0..=3usize),
        0..=max_items,
    )
    .prop_map(|sets| {
        sets.into_iter()
            .enumerate()
            .map(|(idx, classes)| CoverageItem {
                id: format!("item{idx:03}"),
                classes: classes.into_iter().map(ClassIndex::new).collect(),
            })
            .collect()
    })
    .boxed()
}

/// Classes that occur in at least one item.
pub fn occurring_classes(items: &[CoverageItem]) -> BTreeSet<ClassIndex> {
    items
        .iter()
        .flat_map(|item| item.classes.iter().copied())
        .collect()
}
