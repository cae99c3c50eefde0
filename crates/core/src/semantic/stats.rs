use serde::{Deserialize, Serialize};

use super::fragment::TextFragment;

/// Corpus-wide baselines the classifier normalises against.
///
/// The all-zero value is what an empty corpus produces; downstream
/// comparisons treat a zero average as "no baseline".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    pub count: usize,
    pub average_font_size: f32,
    pub max_font_size: f32,
    pub min_font_size: f32,
    pub bold_count: usize,
    /// Average length in characters.
    pub average_text_length: f32,
}

/// Compute baselines over every fragment with non-blank text.
pub fn collect_statistics(fragments: &[TextFragment]) -> CorpusStatistics {
    let valid: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .collect();

    if valid.is_empty() {
        return CorpusStatistics::default();
    }

    let n = valid.len() as f32;
    let size_sum: f32 = valid.iter().map(|f| f.font_size).sum();
    let length_sum: usize = valid.iter().map(|f| f.text.chars().count()).sum();

    CorpusStatistics {
        count: valid.len(),
        average_font_size: size_sum / n,
        max_font_size: valid.iter().map(|f| f.font_size).fold(f32::MIN, f32::max),
        min_font_size: valid.iter().map(|f| f.font_size).fold(f32::MAX, f32::min),
        bold_count: valid.iter().filter(|f| f.is_bold).count(),
        average_text_length: length_sum as f32 / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::fragment::RawFragment;

    fn fragment(text: &str, font_size: f32, is_bold: bool) -> TextFragment {
        TextFragment::from(RawFragment {
            text: text.to_string(),
            font_size,
            is_bold,
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let stats = collect_statistics(&[]);
        assert_eq!(stats, CorpusStatistics::default());
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average_font_size, 0.0);
        assert_eq!(stats.max_font_size, 0.0);
        assert_eq!(stats.min_font_size, 0.0);
        assert_eq!(stats.bold_count, 0);
        assert_eq!(stats.average_text_length, 0.0);
    }

    #[test]
    fn test_blank_fragments_only_is_all_zero() {
        let stats = collect_statistics(&[fragment("   ", 12.0, true)]);
        assert_eq!(stats, CorpusStatistics::default());
    }

    #[test]
    fn test_basic_statistics() {
        let fragments = vec![
            fragment("Heading", 18.0, true),
            fragment("Body text", 12.0, false),
            fragment("More body", 12.0, false),
            fragment("  ", 40.0, true),
        ];
        let stats = collect_statistics(&fragments);
        assert_eq!(stats.count, 3);
        assert!((stats.average_font_size - 14.0).abs() < 1e-4);
        assert!((stats.max_font_size - 18.0).abs() < f32::EPSILON);
        assert!((stats.min_font_size - 12.0).abs() < f32::EPSILON);
        assert_eq!(stats.bold_count, 1);
        // 7 + 9 + 9 characters.
        assert!((stats.average_text_length - 25.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_text_length_counts_characters() {
        let stats = collect_statistics(&[fragment("系统概述", 12.0, false)]);
        assert!((stats.average_text_length - 4.0).abs() < f32::EPSILON);
    }
}
