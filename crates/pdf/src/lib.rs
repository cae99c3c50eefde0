use std::collections::BTreeMap;

use log::warn;
use thiserror::Error;

use parser::backend::{LopdfBackend, PageBox, PdfBackend};
use parser::text::{extract_page_runs, TextRun};
use pdftoc_core::semantic::merge::strip_page_margins;
use pdftoc_core::{AnalysisOptions, RawFragment, SemanticToc};

pub mod normalize;
pub mod parser;

/// Assumed page height when the MediaBox cannot be read (US Letter).
pub const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

const DEFAULT_PAGE_BOX: PageBox = PageBox {
    bottom: 0.0,
    top: DEFAULT_PAGE_HEIGHT,
};

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Decode PDF bytes into raw positioned text units, ready for the merger.
pub fn extract_raw_fragments(
    bytes: &[u8],
    options: &AnalysisOptions,
) -> Result<Vec<RawFragment>, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    Ok(extract_from_backend(&backend, options))
}

/// Build a table of contents from a PDF's text layout alone.
///
/// Finding no headings is not an error: the result then carries an empty tree
/// and a list of relaxation hints.
pub fn extract_toc(bytes: &[u8], options: &AnalysisOptions) -> Result<SemanticToc, PdfError> {
    let raw = extract_raw_fragments(bytes, options)?;
    Ok(pdftoc_core::extract_toc(raw, options))
}

/// Walk every page the options do not skip.
///
/// A page whose content cannot be decoded is dropped (and logged when
/// `options.debug` is set); the remaining pages are still returned.
pub fn extract_from_backend(
    backend: &dyn PdfBackend,
    options: &AnalysisOptions,
) -> Vec<RawFragment> {
    let mut raw = Vec::new();
    let mut heights = BTreeMap::new();

    for (page, page_id) in backend.pages() {
        if options.skip_pages.contains(&page) {
            continue;
        }
        let runs = match extract_page_runs(backend, page_id) {
            Ok(runs) => runs,
            Err(e) => {
                if options.debug {
                    warn!("skipping page {page}: {e}");
                }
                continue;
            }
        };
        let page_box = match backend.page_box(page_id) {
            Some(page_box) => {
                heights.insert(page, page_box.height());
                page_box
            }
            None => DEFAULT_PAGE_BOX,
        };
        raw.extend(runs_to_fragments(runs, page, page_box.top));
    }

    strip_page_margins(raw, &heights, options)
}

/// Flip runs into top-origin coordinates and normalise their text.
///
/// `page_top` is the upper edge of the MediaBox, so `y` is the distance
/// below it whatever the box's lower edge.
pub fn runs_to_fragments(runs: Vec<TextRun>, page: u32, page_top: f32) -> Vec<RawFragment> {
    runs.into_iter()
        .filter_map(|run| {
            let text = normalize::normalize_text(&run.text);
            if text.trim().is_empty() {
                return None;
            }
            Some(RawFragment {
                text,
                font_size: run.font_size,
                font_name: run.font_name,
                is_bold: run.is_bold,
                is_italic: run.is_italic,
                x: run.x,
                y: page_top - run.baseline,
                width: run.width,
                height: run.font_size,
                page,
            })
        })
        .collect()
}
