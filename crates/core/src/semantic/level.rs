use std::sync::OnceLock;

use regex::Regex;

use super::fragment::TextFragment;
use super::lexicon::CHINESE_NUMERALS;

/// Level implied by an explicit numbering prefix, if any.
///
/// `1.` → 1, `1.1 Background` → 2, `2.1.3 Subsystem` → 3, `1.2.3.` → 3.
/// `第…章` is level 1 and `第…节` is level 2.
pub fn level_from_numbering(text: &str) -> Option<u8> {
    static OUTLINE: OnceLock<Regex> = OnceLock::new();
    static CHAPTER: OnceLock<Regex> = OnceLock::new();
    static SECTION: OnceLock<Regex> = OnceLock::new();

    let text = text.trim_start();

    let outline = OUTLINE.get_or_init(|| {
        Regex::new(r"^(?:(\d+(?:\.\d+)+)(?:[.、]|\s|$)|(\d+)[.、])").unwrap()
    });
    if let Some(caps) = outline.captures(text) {
        let segments = caps
            .get(1)
            .map_or(1, |outline| outline.as_str().split('.').count());
        return Some(u8::try_from(segments).unwrap_or(u8::MAX));
    }

    let chapter = CHAPTER.get_or_init(|| {
        Regex::new(&format!(r"^第\s*[{CHINESE_NUMERALS}\d]+\s*章")).unwrap()
    });
    if chapter.is_match(text) {
        return Some(1);
    }

    let section = SECTION.get_or_init(|| {
        Regex::new(&format!(r"^第\s*[{CHINESE_NUMERALS}\d]+\s*节")).unwrap()
    });
    if section.is_match(text) {
        return Some(2);
    }

    None
}

/// Distinct sizes, largest first.
fn distinct_sizes_descending(headings: &[&TextFragment]) -> Vec<f32> {
    let mut sizes: Vec<f32> = headings.iter().map(|h| h.font_size).collect();
    sizes.sort_by(|a, b| b.total_cmp(a));
    sizes.dedup_by(|a, b| a.total_cmp(b).is_eq());
    sizes
}

/// Write an estimated level into every accepted heading in `fragments`.
///
/// Explicit numbering wins. Headings without numbering get the 1-based rank
/// of their font size among the distinct sizes of all accepted headings,
/// capped at `max_levels`. Fragments that are not headings are left alone.
pub fn assign_levels(fragments: &mut [TextFragment], max_levels: u8) {
    let sizes = {
        let headings: Vec<&TextFragment> = fragments.iter().filter(|f| f.is_heading()).collect();
        distinct_sizes_descending(&headings)
    };
    let max_levels = max_levels.max(1);

    for fragment in fragments.iter_mut().filter(|f| f.is_heading()) {
        let level = level_from_numbering(&fragment.text).unwrap_or_else(|| {
            let rank = sizes
                .iter()
                .position(|s| s.total_cmp(&fragment.font_size).is_eq())
                .map_or(1, |idx| idx + 1);
            u8::try_from(rank).unwrap_or(u8::MAX).min(max_levels)
        });
        if let Some(result) = fragment.classification.as_mut() {
            result.level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::fragment::{ClassificationResult, RawFragment};

    fn heading(text: &str, font_size: f32) -> TextFragment {
        let mut f = TextFragment::from(RawFragment {
            text: text.to_string(),
            font_size,
            ..Default::default()
        });
        f.classification = Some(ClassificationResult {
            is_heading: true,
            confidence: 0.5,
            ..ClassificationResult::default()
        });
        f
    }

    #[test]
    fn test_level_from_decimal_outline() {
        assert_eq!(level_from_numbering("1."), Some(1));
        assert_eq!(level_from_numbering("1. Introduction"), Some(1));
        assert_eq!(level_from_numbering("1.1 Background"), Some(2));
        assert_eq!(level_from_numbering("2.1.3 Subsystem"), Some(3));
        assert_eq!(level_from_numbering("1.2.3."), Some(3));
        assert_eq!(level_from_numbering("4.2"), Some(2));
        assert_eq!(level_from_numbering("3、概述"), Some(1));
    }

    #[test]
    fn test_level_from_chapter_markers() {
        assert_eq!(level_from_numbering("第一章 总则"), Some(1));
        assert_eq!(level_from_numbering("第 12 章"), Some(1));
        assert_eq!(level_from_numbering("第三节 部署"), Some(2));
    }

    #[test]
    fn test_level_without_numbering() {
        assert_eq!(level_from_numbering("Introduction"), None);
        assert_eq!(level_from_numbering("2024 Roadmap"), None);
        assert_eq!(level_from_numbering("第二部分"), None);
        assert_eq!(level_from_numbering("第零章"), None);
    }

    #[test]
    fn test_numbering_beats_font_rank() {
        let mut fragments = vec![
            heading("Overview", 20.0),
            heading("2.1.3 Subsystem", 24.0),
            heading("Details", 14.0),
        ];
        assign_levels(&mut fragments, 6);
        // 24 is the largest size, but the outline prefix decides.
        assert_eq!(fragments[1].level(), 3);
    }

    #[test]
    fn test_font_rank_levels() {
        let mut fragments = vec![
            heading("Overview", 20.0),
            heading("Details", 14.0),
            heading("Architecture", 20.0),
            heading("Notes", 16.0),
        ];
        assign_levels(&mut fragments, 6);
        let levels: Vec<u8> = fragments.iter().map(TextFragment::level).collect();
        assert_eq!(levels, vec![1, 3, 1, 2]);
    }

    #[test]
    fn test_font_rank_is_capped() {
        let mut fragments: Vec<TextFragment> = (0..5)
            .map(|i| heading(&format!("Heading {}", char::from(b'A' + i)), 30.0 - f32::from(i)))
            .collect();
        assign_levels(&mut fragments, 2);
        let levels: Vec<u8> = fragments.iter().map(TextFragment::level).collect();
        assert_eq!(levels, vec![1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_non_headings_are_untouched() {
        let mut body = heading("Body text", 10.0);
        if let Some(result) = body.classification.as_mut() {
            result.is_heading = false;
        }
        let mut fragments = vec![heading("Overview", 20.0), body];
        assign_levels(&mut fragments, 6);
        assert_eq!(fragments[0].level(), 1);
        assert_eq!(fragments[1].level(), 0);
    }
}
