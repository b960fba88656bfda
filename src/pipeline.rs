//! End-to-end run: vocabulary, per-source conversion, pruning, merge, sample.
//!
//! Each stage is also callable on its own so that the CLI can resume a run
//! from the persisted vocabulary file.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::UnilabelError;
use crate::integrity::{prune_split, PruneReport};
use crate::merge::{merge_corpora, MergeReport, MergeSource};
use crate::normalize::{normalize_source, NormalizeReport};
use crate::sample::{sample_split, SampleOptions, SampleReport};
use crate::vocab::{
    build_vocabulary, write_data_yaml, write_vocabulary, Vocabulary, VocabularyReport,
};

#[derive(Clone, Debug, Default, Serialize)]
pub struct SourcePruneReport {
    pub source: String,
    #[serde(flatten)]
    pub prune: PruneReport,
}

/// Conversion of one or more sources plus pruning of their splits.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConvertReport {
    pub normalize: Vec<NormalizeReport>,
    pub prune: Vec<SourcePruneReport>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MergeStageReport {
    pub merge: MergeReport,
    pub prune: Vec<PruneReport>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SampleStageReport {
    pub splits: Vec<SampleReport>,
}

/// Reports of every stage, in execution order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PipelineReport {
    pub vocabulary: VocabularyReport,
    pub convert: ConvertReport,
    pub merge: MergeStageReport,
    pub sample: SampleStageReport,
}

/// Builds the vocabulary from the configured lists and writes it out.
pub fn build_and_write_vocabulary(
    config: &PipelineConfig,
) -> Result<(Vocabulary, VocabularyReport), UnilabelError> {
    let (vocabulary, report) = build_vocabulary(&config.vocabulary.sources)?;
    write_vocabulary(&config.vocabulary.path, &vocabulary)?;
    info!(
        "vocabulary: {} classes written to {}",
        vocabulary.len(),
        config.vocabulary.path.display()
    );
    Ok((vocabulary, report))
}

/// Converts configured sources into their own corpora under
/// `converted_root`, then prunes each split. `only` restricts the run to one
/// source.
pub fn convert_sources(
    config: &PipelineConfig,
    vocabulary: &Vocabulary,
    only: Option<&str>,
) -> Result<ConvertReport, UnilabelError> {
    let sources = match only {
        Some(name) => vec![config.source(name)?],
        None => config.sources.iter().collect(),
    };

    let mut report = ConvertReport::default();
    for source in sources {
        let layout = config.converted_layout(source);
        report.normalize.extend(normalize_source(
            source,
            vocabulary,
            &layout,
            &config.splits,
            config.normalize_options(),
        )?);

        for split in &config.splits {
            report.prune.push(SourcePruneReport {
                source: source.name.clone(),
                prune: prune_split(&layout, split)?,
            });
        }
    }

    Ok(report)
}

/// Merges the converted corpora, prunes the result, and writes its
/// `data.yaml`.
pub fn merge_converted(
    config: &PipelineConfig,
    vocabulary: &Vocabulary,
) -> Result<MergeStageReport, UnilabelError> {
    let sources: Vec<MergeSource> = config
        .sources
        .iter()
        .map(|source| MergeSource::new(source.name.clone(), config.converted_layout(source)))
        .collect();

    let merged = config.merged_layout();
    let merge = merge_corpora(&sources, &merged, &config.splits, &config.merge_options())?;

    let prune = config
        .splits
        .iter()
        .map(|split| prune_split(&merged, split))
        .collect::<Result<Vec<_>, _>>()?;

    write_data_yaml(&merged.root, &config.splits, vocabulary)?;
    Ok(MergeStageReport { merge, prune })
}

/// Samples every split of the merged corpus into `subset_root` and writes
/// the subset's `data.yaml`.
pub fn sample_merged(
    config: &PipelineConfig,
    vocabulary: &Vocabulary,
    opts: &SampleOptions,
) -> Result<SampleStageReport, UnilabelError> {
    let merged = config.merged_layout();
    let subset = config.subset_layout();

    let splits = config
        .splits
        .iter()
        .map(|split| sample_split(&merged, &subset, split, vocabulary.len(), opts, config.transfer))
        .collect::<Result<Vec<_>, _>>()?;

    write_data_yaml(&subset.root, &config.splits, vocabulary)?;
    Ok(SampleStageReport { splits })
}

/// Runs every stage in order.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport, UnilabelError> {
    config.validate()?;

    let (vocabulary, vocabulary_report) = build_and_write_vocabulary(config)?;
    let convert = convert_sources(config, &vocabulary, None)?;
    let merge = merge_converted(config, &vocabulary)?;
    let sample = sample_merged(config, &vocabulary, &config.sample_options())?;

    Ok(PipelineReport {
        vocabulary: vocabulary_report,
        convert,
        merge,
        sample,
    })
}

impl fmt::Display for ConvertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.normalize {
            write!(f, "{report}")?;
        }
        if !self.prune.is_empty() {
            writeln!(f, "Pruning")?;
            for report in &self.prune {
                write!(f, "  {}/{}", report.source, report.prune)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for MergeStageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.merge)?;
        writeln!(f, "Pruning")?;
        for report in &self.prune {
            write!(f, "  {report}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SampleStageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.splits {
            write!(f, "{report}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.vocabulary)?;
        writeln!(f, "\nConversion")?;
        write!(f, "{}", self.convert)?;
        writeln!(f, "\nMerge")?;
        write!(f, "{}", self.merge)?;
        writeln!(f, "\nSampling")?;
        write!(f, "{}", self.sample)
    }
}
