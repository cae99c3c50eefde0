//! Stage orchestration: merge → statistics → classification → levels → tree.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;
use serde::Serialize;

use super::classify::classify_all;
use super::fragment::{RawFragment, TextFragment};
use super::level::assign_levels;
use super::merge::merge_fragments;
use super::options::{AnalysisOptions, Preset};
use super::stats::{collect_statistics, CorpusStatistics};
use super::tree::{build_tree, TocEntry, TocTree};

/// Classified fragments of one document plus the baselines they were scored against.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub statistics: CorpusStatistics,
    /// Every fragment, classified, ordered by page then vertical position.
    pub fragments: Vec<TextFragment>,
}

/// Summary figures for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub total_fragments: usize,
    pub identified_headings: usize,
    /// Mean confidence of accepted headings, 0 when there are none.
    pub average_confidence: f32,
    pub headings_by_level: BTreeMap<u8, usize>,
    pub average_font_size: f32,
    pub bold_count: usize,
}

/// A parameter change worth trying when nothing was accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RelaxationHint {
    LowerThreshold { current: f32, suggested: f32 },
    UsePreset { preset: Preset },
    SkipFewerPages { skipped: BTreeSet<u32> },
}

impl fmt::Display for RelaxationHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelaxationHint::LowerThreshold { current, suggested } => write!(
                f,
                "lower min_confidence_threshold from {current:.2} to {suggested:.2}"
            ),
            RelaxationHint::UsePreset { preset } => write!(f, "try the {preset} preset"),
            RelaxationHint::SkipFewerPages { skipped } => {
                let pages: Vec<String> = skipped.iter().map(u32::to_string).collect();
                write!(f, "skip fewer pages (currently skipping {})", pages.join(","))
            }
        }
    }
}

/// Everything a caller needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct SemanticToc {
    pub tree: TocTree,
    pub report: AnalysisReport,
    /// Empty unless no heading was found.
    pub hints: Vec<RelaxationHint>,
}

/// Classify merged fragments and estimate heading levels.
///
/// Fragments that already carry a classification keep it.
pub fn analyze(mut fragments: Vec<TextFragment>, options: &AnalysisOptions) -> Analysis {
    let statistics = collect_statistics(&fragments);
    classify_all(&mut fragments, &statistics, options);

    fragments.sort_by(|a, b| a.page.cmp(&b.page).then(a.y.total_cmp(&b.y)));
    assign_levels(&mut fragments, options.max_heading_levels);

    let analysis = Analysis {
        statistics,
        fragments,
    };

    if options.debug {
        debug!("options: {}", options.describe());
        for line in analysis.diagnostic_lines() {
            debug!("{line}");
        }
        debug!(
            "identified {} headings among {} fragments",
            analysis.headings().count(),
            analysis.fragments.len()
        );
    }

    analysis
}

impl Analysis {
    /// Accepted headings in document order.
    pub fn headings(&self) -> impl Iterator<Item = &TextFragment> {
        self.fragments.iter().filter(|f| f.is_heading())
    }

    pub fn tree(&self) -> TocTree {
        build_tree(self.headings().map(TocEntry::from))
    }

    pub fn report(&self) -> AnalysisReport {
        let headings: Vec<&TextFragment> = self.headings().collect();

        let mut headings_by_level = BTreeMap::new();
        for heading in &headings {
            *headings_by_level.entry(heading.level()).or_insert(0) += 1;
        }

        AnalysisReport {
            total_fragments: self.fragments.len(),
            identified_headings: headings.len(),
            average_confidence: mean(headings.iter().map(|h| h.confidence())),
            headings_by_level,
            average_font_size: mean(self.fragments.iter().map(|f| f.font_size)),
            bold_count: self.fragments.iter().filter(|f| f.is_bold).count(),
        }
    }

    /// One line per fragment: verdict, confidence, level and the evidence behind it.
    pub fn diagnostic_lines(&self) -> Vec<String> {
        self.fragments
            .iter()
            .map(|f| {
                let Some(result) = f.classification.as_ref() else {
                    return format!("[p{}] {:?} unclassified", f.page, f.text);
                };
                let signals: Vec<&str> = result.signals.iter().map(|s| s.as_str()).collect();
                let exclusions: Vec<String> =
                    result.exclusions.iter().map(|e| e.to_string()).collect();
                format!(
                    "[p{}] {:?} heading={} confidence={:.2} level={} signals=[{}] exclusions=[{}]",
                    f.page,
                    f.text,
                    result.is_heading,
                    result.confidence,
                    result.level,
                    signals.join(","),
                    exclusions.join(",")
                )
            })
            .collect()
    }

    /// Suggestions for a run that found nothing. Empty when headings exist.
    pub fn relaxation_hints(&self, options: &AnalysisOptions) -> Vec<RelaxationHint> {
        if self.headings().next().is_some() {
            return Vec::new();
        }

        let mut hints = Vec::new();
        let floor = AnalysisOptions::relaxed().min_confidence_threshold;
        if options.min_confidence_threshold > floor {
            hints.push(RelaxationHint::LowerThreshold {
                current: options.min_confidence_threshold,
                suggested: floor,
            });
        }
        if *options != AnalysisOptions::relaxed() {
            hints.push(RelaxationHint::UsePreset {
                preset: Preset::Relaxed,
            });
        }
        if !options.skip_pages.is_empty() {
            hints.push(RelaxationHint::SkipFewerPages {
                skipped: options.skip_pages.clone(),
            });
        }
        hints
    }
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Run the whole pipeline over raw extraction output.
pub fn extract_toc(raw: Vec<RawFragment>, options: &AnalysisOptions) -> SemanticToc {
    let analysis = analyze(merge_fragments(raw, options), options);
    SemanticToc {
        tree: analysis.tree(),
        report: analysis.report(),
        hints: analysis.relaxation_hints(options),
    }
}
