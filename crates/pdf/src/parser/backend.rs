use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};

use crate::PdfError;

/// `(object number, generation)`, the same shape as `lopdf::ObjectId`.
pub type PageId = (u32, u16);

/// One entry of a page's `/Font` resource dictionary.
#[derive(Debug, Clone, Default)]
pub struct FontResource {
    /// Resource key as used by `Tf`, e.g. `b"F1"`.
    pub key: Vec<u8>,
    /// `/BaseFont`; weight and slant are read from it (`Helvetica-BoldOblique`).
    pub base_font: Option<String>,
}

/// Vertical extent of a page's MediaBox in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub bottom: f32,
    pub top: f32,
}

impl PageBox {
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

/// A content-stream operand, detached from lopdf's object model so the text
/// state machine can run against hand-built operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(PageId),
}

impl PdfValue {
    pub fn as_number(&self) -> Option<f32> {
        match *self {
            PdfValue::Integer(i) => Some(i as f32),
            PdfValue::Real(f) => Some(f),
            _ => None,
        }
    }
}

impl From<&Object> for PdfValue {
    /// Stream bodies are dropped; only the stream dictionary survives.
    fn from(obj: &Object) -> Self {
        let entries = |dict: &Dictionary| {
            PdfValue::Dict(dict.iter().map(|(k, v)| (k.clone(), v.into())).collect())
        };
        match obj {
            Object::Null => PdfValue::Null,
            Object::Boolean(b) => PdfValue::Bool(*b),
            Object::Integer(i) => PdfValue::Integer(*i),
            Object::Real(f) => PdfValue::Real(*f),
            Object::Name(n) => PdfValue::Name(n.clone()),
            Object::String(s, _) => PdfValue::Str(s.clone()),
            Object::Array(items) => PdfValue::Array(items.iter().map(PdfValue::from).collect()),
            Object::Dictionary(dict) => entries(dict),
            Object::Stream(stream) => entries(&stream.dict),
            Object::Reference(id) => PdfValue::Reference(*id),
        }
    }
}

/// An operator with its operands, in stream order.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn number(&self, idx: usize) -> Option<f32> {
        self.operands.get(idx).and_then(PdfValue::as_number)
    }
}

fn utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decode a PDF string without font information.
///
/// Tries UTF-16BE (BOM-prefixed), then UTF-8, and finally maps each byte to
/// the Latin-1 code point of the same value.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        return utf16be(rest);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => bytes.iter().copied().map(char::from).collect(),
    }
}

/// The slice of a parsed document that text extraction reads.
pub trait PdfBackend {
    /// Page number (1-based) to page object.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, PdfError>;

    /// Concatenated, decompressed content streams of the page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Turn the bytes of a string operand into text, given the `Tf` resource
    /// key that was active when it was shown.
    fn decode_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String;

    /// The page's MediaBox, inherited from ancestors when absent.
    fn page_box(&self, page: PageId) -> Option<PageBox>;
}

pub struct LopdfBackend {
    doc: Document,
}

impl LopdfBackend {
    /// Parse an in-memory PDF. Encrypted files are refused.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(Self { doc })
    }

    fn media_box(&self, node: &Dictionary) -> Option<Vec<f32>> {
        let Ok(value) = node.get(b"MediaBox") else {
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            return self.media_box(self.doc.get_dictionary(parent).ok()?);
        };
        let array = match value {
            Object::Reference(id) => self.doc.get_object(*id).ok()?.as_array().ok()?,
            direct => direct.as_array().ok()?,
        };
        array.iter().map(|n| PdfValue::from(n).as_number()).collect()
    }

    fn encoding_of(&self, page: PageId, font_key: &[u8]) -> Option<String> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let encoding = fonts.get(font_key)?.get(b"Encoding").ok()?.as_name().ok()?;
        Some(String::from_utf8_lossy(encoding).into_owned())
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("page {page:?} fonts: {e}")))?;

        let name_entry = |dict: &Dictionary, key: &[u8]| {
            let name = dict.get(key).ok()?.as_name().ok()?;
            Some(String::from_utf8_lossy(name).into_owned())
        };

        Ok(fonts
            .iter()
            .map(|(key, dict)| FontResource {
                key: key.clone(),
                base_font: name_entry(dict, b"BaseFont"),
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("page {page:?} content: {e}")))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content =
            Content::decode(data).map_err(|e| PdfError::Parse(format!("content stream: {e}")))?;

        Ok(content
            .operations
            .iter()
            .map(|op| ContentOp {
                operator: op.operator.clone(),
                operands: op.operands.iter().map(PdfValue::from).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String {
        // Identity-H/V: two-byte codes that usually line up with UTF-16BE.
        let two_byte = self
            .encoding_of(page, font_key)
            .is_some_and(|enc| enc.starts_with("Identity"));
        if two_byte && !bytes.is_empty() && bytes.len().is_multiple_of(2) {
            let text = utf16be(bytes);
            if text.chars().any(|c| c != '\u{FFFD}' && c != '\0') {
                return text;
            }
        }
        decode_pdf_string(bytes)
    }

    fn page_box(&self, page: PageId) -> Option<PageBox> {
        let node = self.doc.get_dictionary(page).ok()?;
        match *self.media_box(node)?.as_slice() {
            [_, lly, _, ury, ..] => Some(PageBox {
                bottom: lly.min(ury),
                top: lly.max(ury),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{dictionary, Stream};

    use super::*;

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string("Übersicht".as_bytes()), "Übersicht");
        // Lone 0xE9 is invalid UTF-8, so it falls through to Latin-1.
        assert_eq!(decode_pdf_string(b"caf\xE9"), "caf\u{00E9}");
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x7C, 0xFB, 0x7E, 0xDF]), "系统");
        assert_eq!(decode_pdf_string(&[]), "");
    }

    #[test]
    fn test_utf16_drops_dangling_byte() {
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x41, 0x00]), "A");
    }

    #[test]
    fn test_operand_numbers() {
        let op = ContentOp {
            operator: "Td".to_string(),
            operands: vec![PdfValue::Integer(72), PdfValue::Real(-14.5), PdfValue::Null],
        };
        assert_eq!(op.number(0), Some(72.0));
        assert_eq!(op.number(1), Some(-14.5));
        assert_eq!(op.number(2), None);
        assert_eq!(op.number(3), None);
    }

    #[test]
    fn test_stream_keeps_dictionary_only() {
        let mut dict = Dictionary::new();
        dict.set("Box", Object::Array(vec![Object::Integer(0), Object::Real(792.0)]));
        let stream = Object::Stream(Stream::new(dict, b"BT ET".to_vec()));

        assert_eq!(
            PdfValue::from(&stream),
            PdfValue::Dict(vec![(
                b"Box".to_vec(),
                PdfValue::Array(vec![PdfValue::Integer(0), PdfValue::Real(792.0)]),
            )])
        );
        assert_eq!(PdfValue::from(&Object::Reference((7, 0))), PdfValue::Reference((7, 0)));
    }

    #[test]
    fn test_page_box_inherits_offset_media_box() {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1_i64,
                "MediaBox" => vec![0.into(), 100.into(), 612.into(), 900.into()],
            }
            .into(),
        );
        let backend = LopdfBackend { doc };

        let page_box = backend.page_box(page_id).unwrap();
        assert_eq!(page_box.bottom, 100.0);
        assert_eq!(page_box.top, 900.0);
        assert_eq!(page_box.height(), 800.0);
    }

    #[test]
    fn test_load_rejects_non_pdf() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
