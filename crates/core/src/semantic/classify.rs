//! Rule-table heading classifier.
//!
//! Each [`Rule`] inspects a fragment and reports at most one [`Finding`]:
//! either a positive [`Signal`] or an [`Exclusion`]. Every rule runs, in
//! table order, so the result lists all evidence found. Scoring is a separate
//! step over the collected signals, driven by [`SIGNAL_WEIGHTS`]:
//!
//! ```text
//! confidence = min(1.0, BASE_SCORE + sum(weight(signal)))   if no exclusions
//!            = 0.0                                          otherwise
//! ```

use super::fragment::{ClassificationResult, Exclusion, Signal, TextFragment};
use super::lexicon::{
    exclusion_patterns, find_action_verb, find_heading_keyword, numbering_patterns,
};
use super::options::AnalysisOptions;
use super::stats::CorpusStatistics;

/// Score every candidate starts with.
pub const BASE_SCORE: f32 = 0.1;

/// Weight of any signal missing from [`SIGNAL_WEIGHTS`].
pub const OTHER_SIGNAL_WEIGHT: f32 = 0.02;

pub const SIGNAL_WEIGHTS: &[(Signal, f32)] = &[
    (Signal::Numbering, 0.4),
    (Signal::HeadingKeyword, 0.3),
    (Signal::LargeFont, 0.2),
    (Signal::Bold, 0.15),
    (Signal::Standalone, 0.1),
    (Signal::Spacing, 0.1),
    (Signal::NoActionVerb, 0.05),
];

pub fn signal_weight(signal: Signal) -> f32 {
    SIGNAL_WEIGHTS
        .iter()
        .find(|(s, _)| *s == signal)
        .map_or(OTHER_SIGNAL_WEIGHT, |(_, w)| *w)
}

/// Confidence for a set of findings.
pub fn score(signals: &[Signal], exclusions: &[Exclusion]) -> f32 {
    if !exclusions.is_empty() {
        return 0.0;
    }
    let total = BASE_SCORE + signals.iter().map(|s| signal_weight(*s)).sum::<f32>();
    total.min(1.0)
}

/// What a single rule found.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    Signal(Signal),
    Exclusion(Exclusion),
}

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    /// The fragment text, trimmed.
    pub text: &'a str,
    pub fragment: &'a TextFragment,
    pub stats: &'a CorpusStatistics,
    pub options: &'a AnalysisOptions,
}

pub struct Rule {
    pub name: &'static str,
    pub check: fn(&RuleContext<'_>) -> Option<Finding>,
}

/// Evaluation order matters only for the order findings are listed in.
pub const RULES: &[Rule] = &[
    Rule {
        name: "length",
        check: check_length,
    },
    Rule {
        name: "action_verbs",
        check: check_action_verbs,
    },
    Rule {
        name: "heading_keywords",
        check: check_heading_keywords,
    },
    Rule {
        name: "numbering",
        check: check_numbering,
    },
    Rule {
        name: "font_size",
        check: check_font_size,
    },
    Rule {
        name: "bold",
        check: check_bold,
    },
    Rule {
        name: "standalone",
        check: check_standalone,
    },
    Rule {
        name: "spacing",
        check: check_spacing,
    },
    Rule {
        name: "denylist",
        check: check_denylist,
    },
];

fn check_length(ctx: &RuleContext<'_>) -> Option<Finding> {
    let length = ctx.text.chars().count();
    let finding = if length < ctx.options.min_heading_length {
        Finding::Exclusion(Exclusion::TooShort {
            length,
            min: ctx.options.min_heading_length,
        })
    } else if length > ctx.options.max_heading_length {
        Finding::Exclusion(Exclusion::TooLong {
            length,
            max: ctx.options.max_heading_length,
        })
    } else {
        Finding::Signal(Signal::LengthOk)
    };
    Some(finding)
}

fn check_action_verbs(ctx: &RuleContext<'_>) -> Option<Finding> {
    Some(match find_action_verb(ctx.text) {
        Some(word) => Finding::Exclusion(Exclusion::ActionVerb {
            word: word.to_string(),
        }),
        None => Finding::Signal(Signal::NoActionVerb),
    })
}

fn check_heading_keywords(ctx: &RuleContext<'_>) -> Option<Finding> {
    find_heading_keyword(ctx.text).map(|_| Finding::Signal(Signal::HeadingKeyword))
}

fn check_numbering(ctx: &RuleContext<'_>) -> Option<Finding> {
    numbering_patterns()
        .first_match(ctx.text)
        .map(|_| Finding::Signal(Signal::Numbering))
}

fn check_font_size(ctx: &RuleContext<'_>) -> Option<Finding> {
    // A zero average means there is no baseline to be larger than.
    let average = ctx.stats.average_font_size;
    let large =
        average > 0.0 && ctx.fragment.font_size > average * ctx.options.font_size_multiplier;
    large.then_some(Finding::Signal(Signal::LargeFont))
}

fn check_bold(ctx: &RuleContext<'_>) -> Option<Finding> {
    (ctx.fragment.is_bold && ctx.options.consider_bold_as_heading)
        .then_some(Finding::Signal(Signal::Bold))
}

fn check_standalone(ctx: &RuleContext<'_>) -> Option<Finding> {
    ctx.fragment
        .is_standalone
        .then_some(Finding::Signal(Signal::Standalone))
}

fn check_spacing(ctx: &RuleContext<'_>) -> Option<Finding> {
    let min = ctx.options.min_vertical_spacing;
    (ctx.fragment.space_before > min || ctx.fragment.space_after > min)
        .then_some(Finding::Signal(Signal::Spacing))
}

fn check_denylist(ctx: &RuleContext<'_>) -> Option<Finding> {
    exclusion_patterns().first_match(ctx.text).map(|pattern| {
        Finding::Exclusion(Exclusion::ObviousNonHeading {
            pattern: pattern.to_string(),
        })
    })
}

/// Classify one fragment against corpus statistics.
pub fn classify(
    fragment: &TextFragment,
    stats: &CorpusStatistics,
    options: &AnalysisOptions,
) -> ClassificationResult {
    let text = fragment.text.trim();
    if text.is_empty() {
        return ClassificationResult {
            exclusions: vec![Exclusion::EmptyText],
            ..ClassificationResult::default()
        };
    }

    let ctx = RuleContext {
        text,
        fragment,
        stats,
        options,
    };

    let mut signals = Vec::new();
    let mut exclusions = Vec::new();
    for rule in RULES {
        match (rule.check)(&ctx) {
            Some(Finding::Signal(signal)) => signals.push(signal),
            Some(Finding::Exclusion(exclusion)) => exclusions.push(exclusion),
            None => {}
        }
    }

    let confidence = score(&signals, &exclusions);
    ClassificationResult {
        is_heading: exclusions.is_empty() && confidence >= options.min_confidence_threshold,
        confidence,
        level: 0,
        signals,
        exclusions,
    }
}

/// Attach a classification to every fragment that does not carry one yet.
///
/// Fragments are never classified twice; an existing result is kept.
pub fn classify_all(
    fragments: &mut [TextFragment],
    stats: &CorpusStatistics,
    options: &AnalysisOptions,
) {
    for fragment in fragments.iter_mut() {
        if fragment.classification.is_none() {
            fragment.classification = Some(classify(fragment, stats, options));
        }
    }
}
