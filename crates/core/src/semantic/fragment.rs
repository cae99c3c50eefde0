use std::fmt;

use serde::{Deserialize, Serialize};

/// An unmerged run of text as delivered by a text-extraction backend.
///
/// Coordinates are top-origin: `y` grows downward from the top edge of the
/// page, so sorting by ascending `y` walks the page top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFragment {
    pub text: String,
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// 1-based page number.
    pub page: u32,
}

impl RawFragment {
    /// Right edge of the fragment's bounding box.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

impl Default for RawFragment {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 0.0,
            font_name: String::new(),
            is_bold: false,
            is_italic: false,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            page: 1,
        }
    }
}

/// A line-level unit of text produced by the merger.
///
/// The merger fills the layout fields, the classifier attaches a
/// [`ClassificationResult`] and the level estimator writes the level into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// 1-based page number.
    pub page: u32,
    /// No other fragment on the page sits within the standalone band.
    pub is_standalone: bool,
    /// Vertical distance to the previous fragment on the page, 0.0 if none.
    pub space_before: f32,
    /// Vertical distance to the next fragment on the page, 0.0 if none.
    pub space_after: f32,
    pub classification: Option<ClassificationResult>,
}

impl TextFragment {
    /// Whether the attached classification accepted this fragment.
    pub fn is_heading(&self) -> bool {
        self.classification.as_ref().is_some_and(|c| c.is_heading)
    }

    /// Estimated 1-based heading level, or 0 when none has been assigned.
    pub fn level(&self) -> u8 {
        self.classification.as_ref().map_or(0, |c| c.level)
    }

    pub fn confidence(&self) -> f32 {
        self.classification.as_ref().map_or(0.0, |c| c.confidence)
    }

    /// Strip layout annotations, yielding the unit the merger consumes.
    pub fn to_raw(&self) -> RawFragment {
        RawFragment {
            text: self.text.clone(),
            font_size: self.font_size,
            font_name: self.font_name.clone(),
            is_bold: self.is_bold,
            is_italic: self.is_italic,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            page: self.page,
        }
    }
}

impl From<RawFragment> for TextFragment {
    fn from(raw: RawFragment) -> Self {
        Self {
            text: raw.text,
            font_size: raw.font_size,
            font_name: raw.font_name,
            is_bold: raw.is_bold,
            is_italic: raw.is_italic,
            x: raw.x,
            y: raw.y,
            width: raw.width,
            height: raw.height,
            page: raw.page,
            is_standalone: false,
            space_before: 0.0,
            space_after: 0.0,
            classification: None,
        }
    }
}

impl fmt::Display for TextFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[page {}] {:?} font={} size={:.1} bold={}",
            self.page, self.text, self.font_name, self.font_size, self.is_bold
        )
    }
}

/// Positive evidence that a fragment is a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    LengthOk,
    NoActionVerb,
    HeadingKeyword,
    Numbering,
    LargeFont,
    Bold,
    Standalone,
    Spacing,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::LengthOk => "length_ok",
            Signal::NoActionVerb => "no_action_verb",
            Signal::HeadingKeyword => "heading_keyword",
            Signal::Numbering => "numbering",
            Signal::LargeFont => "large_font",
            Signal::Bold => "bold",
            Signal::Standalone => "standalone",
            Signal::Spacing => "spacing",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reason that rules a fragment out as a heading, whatever else it scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Exclusion {
    EmptyText,
    TooShort { length: usize, min: usize },
    TooLong { length: usize, max: usize },
    ActionVerb { word: String },
    ObviousNonHeading { pattern: String },
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::EmptyText => write!(f, "empty_text"),
            Exclusion::TooShort { length, min } => write!(f, "too_short({length} < {min})"),
            Exclusion::TooLong { length, max } => write!(f, "too_long({length} > {max})"),
            Exclusion::ActionVerb { word } => write!(f, "action_verb({word})"),
            Exclusion::ObviousNonHeading { pattern } => {
                write!(f, "obvious_non_heading({pattern})")
            }
        }
    }
}

/// Outcome of classifying a single fragment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_heading: bool,
    /// Score in `[0, 1]`; always 0 when any exclusion fired.
    pub confidence: f32,
    /// 1-based level set by the level estimator, 0 until then.
    pub level: u8,
    pub signals: Vec<Signal>,
    pub exclusions: Vec<Exclusion>,
}
