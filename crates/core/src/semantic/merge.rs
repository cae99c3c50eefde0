//! Raw text units → line-level fragments.
//!
//! Extraction backends hand over runs that are often a word or a glyph
//! cluster wide. This module stitches runs that share a visual line back
//! together and then annotates each line with its vertical neighbourhood,
//! which the classifier later reads as layout evidence.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::fragment::{RawFragment, TextFragment};
use super::options::AnalysisOptions;

/// Two units whose `y` differ by at most this are on the same line.
pub const SAME_LINE_TOLERANCE: f32 = 3.0;

/// Maximum distance between the merged line's right edge and the next unit's
/// left edge for the two to be considered adjacent.
pub const ADJACENCY_TOLERANCE: f32 = 15.0;

/// Maximum font-size difference for two units to share a style.
pub const FONT_SIZE_TOLERANCE: f32 = 0.5;

/// Fragments closer than this vertically share a line for standalone checks.
pub const STANDALONE_BAND: f32 = 5.0;

/// Merged text shorter than this (in characters, after trimming) is noise.
const MIN_FRAGMENT_CHARS: usize = 2;

/// Horizontal gaps at least this wide get a separating space when merged.
const MIN_WORD_GAP: f32 = 1.5;

/// Returns `true` if `c` belongs to a script written without inter-word
/// spaces, so that no space is inserted when merging across it.
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        // CJK Unified Ideographs and Extension A
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        // CJK Compatibility Ideographs
        | 0xF900..=0xFAFF
        // Hiragana, Katakana
        | 0x3040..=0x30FF
        // Hangul Syllables
        | 0xAC00..=0xD7AF
        // CJK Symbols and Punctuation
        | 0x3000..=0x303F
        // Fullwidth Forms
        | 0xFF00..=0xFFEF
        // Thai, Lao
        | 0x0E00..=0x0EFF
    )
}

/// Order by `y`, then `x`. NaN coordinates sort after every finite value.
fn reading_order(a: &RawFragment, b: &RawFragment) -> Ordering {
    a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
}

/// Drop units that fall inside the header or footer band of their page.
///
/// Only applies when `options.ignore_header_footer` is set, and only on pages
/// whose height appears in `page_heights`.
pub fn strip_page_margins(
    raw: Vec<RawFragment>,
    page_heights: &BTreeMap<u32, f32>,
    options: &AnalysisOptions,
) -> Vec<RawFragment> {
    if !options.ignore_header_footer {
        return raw;
    }

    raw.into_iter()
        .filter(|unit| match page_heights.get(&unit.page) {
            Some(&height) => {
                unit.y >= options.header_height && unit.y <= height - options.footer_height
            }
            None => true,
        })
        .collect()
}

/// Merge raw units into line-level [`TextFragment`]s.
///
/// Units on pages listed in `options.skip_pages` are discarded up front.
/// Output is ordered by page, then by vertical position, with spacing and
/// standalone flags filled in by [`analyze_spacing`].
pub fn merge_fragments(raw: Vec<RawFragment>, options: &AnalysisOptions) -> Vec<TextFragment> {
    let mut pages: BTreeMap<u32, Vec<RawFragment>> = BTreeMap::new();
    for unit in raw {
        if options.skip_pages.contains(&unit.page) {
            continue;
        }
        pages.entry(unit.page).or_default().push(unit);
    }

    let mut merged: Vec<TextFragment> = Vec::new();
    for (_page, mut units) in pages {
        units.sort_by(reading_order);
        merged.extend(merge_page(units));
    }

    analyze_spacing(&mut merged);
    merged
}

/// A line being assembled, plus the position and size of the unit merged
/// into it most recently.
struct OpenLine {
    merged: RawFragment,
    last_y: f32,
    last_font_size: f32,
}

impl OpenLine {
    fn start(unit: RawFragment) -> Self {
        Self {
            last_y: unit.y,
            last_font_size: unit.font_size,
            merged: unit,
        }
    }

    /// Same line and same style as the previous unit, and adjacent to the
    /// right edge of everything merged so far.
    fn continues_with(&self, next: &RawFragment) -> bool {
        (next.y - self.last_y).abs() <= SAME_LINE_TOLERANCE
            && (next.x - self.merged.right()).abs() <= ADJACENCY_TOLERANCE
            && (next.font_size - self.last_font_size).abs() <= FONT_SIZE_TOLERANCE
    }

    /// Append `next`. The line keeps the first unit's `y` and height; its
    /// horizontal extent grows to cover both.
    fn absorb(&mut self, next: RawFragment) {
        let line = &mut self.merged;
        let gap = next.x - line.right();
        if gap >= MIN_WORD_GAP && needs_space(&line.text, &next.text) {
            line.text.push(' ');
        }
        line.text.push_str(&next.text);

        let left = line.x.min(next.x);
        let right = line.right().max(next.right());
        line.x = left;
        line.width = right - left;

        self.last_y = next.y;
        self.last_font_size = next.font_size;
    }
}

/// Merge one page's units, already sorted in reading order.
fn merge_page(units: Vec<RawFragment>) -> Vec<TextFragment> {
    let mut lines: Vec<TextFragment> = Vec::new();
    let mut open: Option<OpenLine> = None;

    for unit in units {
        if let Some(line) = open.as_mut() {
            if line.continues_with(&unit) {
                line.absorb(unit);
                continue;
            }
        }
        if let Some(done) = open.replace(OpenLine::start(unit)) {
            push_if_meaningful(&mut lines, done.merged);
        }
    }
    if let Some(done) = open {
        push_if_meaningful(&mut lines, done.merged);
    }

    lines
}

fn needs_space(left: &str, right: &str) -> bool {
    match (left.chars().next_back(), right.chars().next()) {
        (Some(l), Some(r)) => {
            !l.is_whitespace()
                && !r.is_whitespace()
                && !(is_spaceless_script_char(l) && is_spaceless_script_char(r))
        }
        _ => false,
    }
}

fn push_if_meaningful(lines: &mut Vec<TextFragment>, unit: RawFragment) {
    if unit.text.trim().chars().count() >= MIN_FRAGMENT_CHARS {
        lines.push(TextFragment::from(unit));
    }
}

/// Fill `is_standalone`, `space_before` and `space_after` for every fragment.
///
/// Fragments are reordered by page, then by `y` (stable, so fragments on the
/// same `y` keep their left-to-right order).
pub fn analyze_spacing(fragments: &mut [TextFragment]) {
    fragments.sort_by(|a, b| a.page.cmp(&b.page).then(a.y.total_cmp(&b.y)));

    let mut start = 0;
    while start < fragments.len() {
        let page = fragments[start].page;
        let end = fragments[start..]
            .iter()
            .position(|f| f.page != page)
            .map_or(fragments.len(), |offset| start + offset);
        annotate_page(&mut fragments[start..end]);
        start = end;
    }
}

fn annotate_page(page: &mut [TextFragment]) {
    let ys: Vec<f32> = page.iter().map(|f| f.y).collect();

    for (i, fragment) in page.iter_mut().enumerate() {
        let y = ys[i];
        fragment.is_standalone = !ys
            .iter()
            .enumerate()
            .any(|(j, &other)| j != i && (other - y).abs() < STANDALONE_BAND);
        fragment.space_before = if i > 0 { (y - ys[i - 1]).abs() } else { 0.0 };
        fragment.space_after = ys.get(i + 1).map_or(0.0, |&next| (next - y).abs());
    }
}
