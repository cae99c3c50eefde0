//! Content stream → positioned text runs.
//!
//! A reduced PDF text-state machine. Glyph metrics are not consulted; widths
//! are estimated from the character count, which is precise enough for line
//! grouping downstream.
//!
//! | Operator | Action |
//! |----------|--------|
//! | `BT` / `ET` | Reset the text and line matrices / no-op |
//! | `Tf` | Font and size |
//! | `Tm` | Set text matrix |
//! | `Td` / `TD` | Translate line (`TD` also sets leading) |
//! | `T*` / `TL` | Next line / set leading |
//! | `Tc` `Tw` `Tz` `Ts` | Char spacing, word spacing, horizontal scale, rise |
//! | `Tj` / `TJ` | Show string / show with kerning |
//! | `'` / `"` | Next line then show (`"` also sets spacing) |

use super::backend::{ContentOp, FontResource, PageId, PdfBackend, PdfValue};
use crate::PdfError;

/// Approximate glyph advance as a fraction of the font size.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Kerning displacements above this fraction of a glyph advance read as a word gap.
const TJ_WORD_GAP_RATIO: f32 = 0.3;

const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// A run of text shown by a single operator, in PDF user space (bottom-left origin).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
}

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    /// [a, b, c, d, tx, ty]
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
    is_bold: bool,
    is_italic: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
            is_bold: false,
            is_italic: false,
        }
    }
}

impl TextState {
    /// Rendered size: `font_size * sqrt(b² + d²)`.
    fn effective_font_size(&self) -> f32 {
        let [_, b, _, d, _, _] = self.text_matrix;
        (self.font_size * (b * b + d * d).sqrt()).abs()
    }

    fn glyph_advance(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn set_font(&mut self, key: Vec<u8>, base_font: &str, size: f32) {
        let upper = base_font.to_uppercase();
        self.is_bold = upper.contains("BOLD") || upper.contains("HEAVY") || upper.contains("BLACK");
        self.is_italic = upper.contains("ITALIC") || upper.contains("OBLIQUE");
        self.font_name = base_font.to_string();
        self.font_key = key;
        self.font_size = size;
    }

    /// Width the state machine advances by after showing `text`.
    fn advance_for(&self, text: &str) -> f32 {
        text.chars()
            .map(|ch| {
                let extra = if ch == ' ' { self.word_spacing } else { 0.0 };
                self.glyph_advance() + self.char_spacing + extra
            })
            .sum()
    }

    fn run(&self, text: String, x: f32, baseline: f32) -> TextRun {
        let width = text.chars().count() as f32 * self.glyph_advance();
        TextRun {
            text,
            x,
            baseline,
            width,
            font_size: self.effective_font_size(),
            font_name: self.font_name.clone(),
            is_bold: self.is_bold,
            is_italic: self.is_italic,
        }
    }
}

/// Walks one page's operators, accumulating [`TextRun`]s.
struct RunCollector<'a> {
    backend: &'a dyn PdfBackend,
    page: PageId,
    fonts: Vec<FontResource>,
    state: TextState,
    runs: Vec<TextRun>,
}

impl RunCollector<'_> {
    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "BT" => {
                self.state.text_matrix = IDENTITY_MATRIX;
                self.state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => self.set_font(&op.operands),
            "Tm" => {
                let values: Vec<f32> = (0..6).filter_map(|i| op.number(i)).collect();
                if let Ok(matrix) = <[f32; 6]>::try_from(values) {
                    self.state.text_matrix = matrix;
                    self.state.line_matrix = matrix;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    if op.operator == "TD" {
                        self.state.leading = -ty;
                    }
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => self.state.next_line(),
            "TL" => {
                if let Some(v) = op.number(0) {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = op.number(0) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.number(0) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = op.number(0) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = op.number(0) {
                    self.state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(operand) = op.operands.first() {
                    self.show(operand);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show_kerned(items);
                }
            }
            "'" => {
                self.state.next_line();
                if let Some(operand) = op.operands.first() {
                    self.show(operand);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac), Some(operand)) =
                    (op.number(0), op.number(1), op.operands.get(2))
                {
                    self.state.word_spacing = aw;
                    self.state.char_spacing = ac;
                    self.state.next_line();
                    self.show(operand);
                }
            }
            _ => {}
        }
    }

    fn set_font(&mut self, operands: &[PdfValue]) {
        let key = match operands.first() {
            Some(PdfValue::Name(n)) | Some(PdfValue::Str(n)) => n.clone(),
            _ => return,
        };
        let size = operands
            .get(1)
            .and_then(PdfValue::as_number)
            .unwrap_or(0.0);
        let base_font = self
            .fonts
            .iter()
            .find(|info| info.key == key)
            .and_then(|info| info.base_font.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());
        self.state.set_font(key, &base_font, size);
    }

    fn decode(&self, operand: &PdfValue) -> String {
        match operand {
            PdfValue::Str(bytes) => {
                self.backend.decode_text(self.page, &self.state.font_key, bytes)
            }
            _ => String::new(),
        }
    }

    fn position(&self) -> (f32, f32) {
        (
            self.state.text_matrix[4],
            self.state.text_matrix[5] + self.state.text_rise,
        )
    }

    fn show(&mut self, operand: &PdfValue) {
        let text = self.decode(operand);
        if text.is_empty() {
            return;
        }
        let (x, baseline) = self.position();
        let advance = self.state.advance_for(&text);
        self.runs.push(self.state.run(text, x, baseline));
        self.state.advance_x(advance);
    }

    /// One run per `TJ` array; large negative kerning becomes a space.
    fn show_kerned(&mut self, items: &[PdfValue]) {
        let (x, baseline) = self.position();
        let mut text = String::new();

        for item in items {
            if let PdfValue::Str(_) = item {
                let piece = self.decode(item);
                let advance = self.state.advance_for(&piece);
                text.push_str(&piece);
                self.state.advance_x(advance);
            } else if let Some(adjust) = item.as_number() {
                let dx = -adjust / 1000.0 * self.state.font_size * self.state.horiz_scale;
                if dx > self.state.glyph_advance() * TJ_WORD_GAP_RATIO
                    && !text.is_empty()
                    && !text.ends_with(' ')
                {
                    text.push(' ');
                }
                self.state.advance_x(dx);
            }
        }

        let text = text.trim_end().to_string();
        if !text.is_empty() {
            self.runs.push(self.state.run(text, x, baseline));
        }
    }
}

/// Decode one page's content stream into text runs.
pub fn extract_page_runs(backend: &dyn PdfBackend, page: PageId) -> Result<Vec<TextRun>, PdfError> {
    let content = backend.page_content(page)?;
    let ops = backend.decode_content(&content)?;

    let mut collector = RunCollector {
        backend,
        page,
        fonts: backend.page_fonts(page).unwrap_or_default(),
        state: TextState::default(),
        runs: Vec::new(),
    };
    for op in &ops {
        collector.apply(op);
    }
    Ok(collector.runs)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::parser::backend::{decode_pdf_string, PageBox};

    /// Serves pre-built operator lists keyed by page id.
    struct MockBackend {
        ops: Vec<ContentOp>,
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0))])
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<FontResource>, PdfError> {
            Ok(vec![
                FontResource {
                    key: b"F1".to_vec(),
                    base_font: Some("Helvetica".to_string()),
                },
                FontResource {
                    key: b"F2".to_vec(),
                    base_font: Some("Helvetica-BoldOblique".to_string()),
                },
            ])
        }

        fn page_content(&self, _page: PageId) -> Result<Vec<u8>, PdfError> {
            Ok(Vec::new())
        }

        fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
            Ok(self.ops.clone())
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            decode_pdf_string(bytes)
        }

        fn page_box(&self, _page: PageId) -> Option<PageBox> {
            Some(PageBox {
                bottom: 0.0,
                top: 792.0,
            })
        }
    }

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn name(n: &str) -> PdfValue {
        PdfValue::Name(n.as_bytes().to_vec())
    }

    fn string(s: &str) -> PdfValue {
        PdfValue::Str(s.as_bytes().to_vec())
    }

    fn runs(ops: Vec<ContentOp>) -> Vec<TextRun> {
        extract_page_runs(&MockBackend { ops }, (1, 0)).unwrap()
    }

    #[test]
    fn test_tj_positions_and_font() {
        let runs = runs(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F2"), PdfValue::Integer(18)]),
            op("Td", vec![PdfValue::Integer(72), PdfValue::Integer(700)]),
            op("Tj", vec![string("Overview")]),
            op("ET", vec![]),
        ]);
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.text, "Overview");
        assert_eq!((run.x, run.baseline), (72.0, 700.0));
        assert_eq!(run.font_size, 18.0);
        assert_eq!(run.width, 8.0 * 9.0);
        assert_eq!(run.font_name, "Helvetica-BoldOblique");
        assert!(run.is_bold && run.is_italic);
    }

    #[test]
    fn test_consecutive_tj_advance() {
        let runs = runs(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), PdfValue::Integer(10)]),
            op("Td", vec![PdfValue::Integer(100), PdfValue::Integer(500)]),
            op("Tj", vec![string("Hello")]),
            op("Tj", vec![string("World")]),
            op("ET", vec![]),
        ]);
        assert_eq!(runs[1].x, 125.0);
        assert!(!runs[0].is_bold);
    }

    #[test]
    fn test_leading_and_next_line_operators() {
        let runs = runs(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), PdfValue::Integer(12)]),
            op("TD", vec![PdfValue::Integer(72), PdfValue::Integer(-14)]),
            op("Tj", vec![string("first")]),
            op("T*", vec![]),
            op("Tj", vec![string("second")]),
            op("'", vec![string("third")]),
            op(
                "\"",
                vec![PdfValue::Integer(0), PdfValue::Integer(0), string("fourth")],
            ),
            op("ET", vec![]),
        ]);
        let baselines: Vec<f32> = runs.iter().map(|r| r.baseline).collect();
        assert_eq!(baselines, vec![-14.0, -28.0, -42.0, -56.0]);
        assert!(runs.iter().all(|r| r.x == 72.0));
    }

    #[test]
    fn test_tm_scales_font_size() {
        let runs = runs(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), PdfValue::Integer(1)]),
            op(
                "Tm",
                vec![
                    PdfValue::Integer(14),
                    PdfValue::Integer(0),
                    PdfValue::Integer(0),
                    PdfValue::Integer(14),
                    PdfValue::Integer(50),
                    PdfValue::Integer(600),
                ],
            ),
            op("Tj", vec![string("Scaled")]),
            op("ET", vec![]),
        ]);
        assert_eq!(runs[0].font_size, 14.0);
        assert_eq!((runs[0].x, runs[0].baseline), (50.0, 600.0));
    }

    #[test]
    fn test_tj_array_kerning_inserts_space() {
        let runs = runs(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), PdfValue::Integer(10)]),
            op(
                "TJ",
                vec![PdfValue::Array(vec![
                    string("Sys"),
                    PdfValue::Integer(-20),
                    string("tem"),
                    PdfValue::Integer(-400),
                    string("Design"),
                ])],
            ),
            op("ET", vec![]),
        ]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "System Design");
    }

    #[test]
    fn test_text_rise_and_unknown_font() {
        let runs = runs(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F9"), PdfValue::Real(9.5)]),
            op("Ts", vec![PdfValue::Integer(3)]),
            op("Td", vec![PdfValue::Integer(10), PdfValue::Integer(20)]),
            op("Tj", vec![string("note")]),
            op("ET", vec![]),
        ]);
        assert_eq!(runs[0].baseline, 23.0);
        assert_eq!(runs[0].font_name, "F9");
    }

    #[test]
    fn test_empty_strings_are_skipped() {
        let runs = runs(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), PdfValue::Integer(10)]),
            op("Tj", vec![string("")]),
            op("TJ", vec![PdfValue::Array(vec![PdfValue::Integer(-500)])]),
            op("ET", vec![]),
        ]);
        assert!(runs.is_empty());
    }
}
