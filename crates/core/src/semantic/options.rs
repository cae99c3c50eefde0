//! Tunable knobs for the heading-detection pipeline.
//!
//! Four presets cover the common cases. Callers pick one and then override
//! individual fields, either directly on the struct or through a TOML file:
//!
//! ```toml
//! preset = "strict"
//! skip_pages = []
//! min_confidence_threshold = 0.45
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::OptionsError;

/// Named starting points for [`AnalysisOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    Default,
    Strict,
    Relaxed,
    Debug,
}

impl FromStr for Preset {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Preset::Default),
            "strict" => Ok(Preset::Strict),
            "relaxed" => Ok(Preset::Relaxed),
            "debug" => Ok(Preset::Debug),
            other => Err(OptionsError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Default => write!(f, "default"),
            Preset::Strict => write!(f, "strict"),
            Preset::Relaxed => write!(f, "relaxed"),
            Preset::Debug => write!(f, "debug"),
        }
    }
}

/// Configuration for one pipeline run. Read-only while the run is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Minimum heading length in characters (after trimming).
    pub min_heading_length: usize,
    /// Maximum heading length in characters (after trimming).
    pub max_heading_length: usize,
    /// A fragment is "large" when its size exceeds the corpus average times this.
    pub font_size_multiplier: f32,
    pub consider_bold_as_heading: bool,
    /// Gap above or below a fragment that counts as breathing room.
    pub min_vertical_spacing: f32,
    pub min_confidence_threshold: f32,
    pub max_heading_levels: u8,
    pub ignore_header_footer: bool,
    pub header_height: f32,
    pub footer_height: f32,
    /// Pages never handed to the merger, usually a printed contents page.
    pub skip_pages: BTreeSet<u32>,
    pub debug: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            min_heading_length: 3,
            max_heading_length: 100,
            font_size_multiplier: 1.1,
            consider_bold_as_heading: true,
            min_vertical_spacing: 5.0,
            min_confidence_threshold: 0.3,
            max_heading_levels: 6,
            ignore_header_footer: true,
            header_height: 50.0,
            footer_height: 50.0,
            skip_pages: BTreeSet::from([1, 2, 3]),
            debug: false,
        }
    }
}

impl AnalysisOptions {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Default => Self::default(),
            Preset::Strict => Self::strict(),
            Preset::Relaxed => Self::relaxed(),
            Preset::Debug => Self::debug(),
        }
    }

    /// Fewer, more certain headings.
    pub fn strict() -> Self {
        Self {
            min_heading_length: 5,
            max_heading_length: 80,
            font_size_multiplier: 1.3,
            min_confidence_threshold: 0.5,
            min_vertical_spacing: 8.0,
            ..Self::default()
        }
    }

    /// More headings, more noise.
    pub fn relaxed() -> Self {
        Self {
            min_heading_length: 2,
            max_heading_length: 150,
            font_size_multiplier: 1.05,
            min_confidence_threshold: 0.2,
            min_vertical_spacing: 2.0,
            ..Self::default()
        }
    }

    /// Low threshold plus per-fragment diagnostics.
    pub fn debug() -> Self {
        Self {
            debug: true,
            min_confidence_threshold: 0.1,
            ..Self::default()
        }
    }

    /// Parse options from TOML.
    ///
    /// An optional top-level `preset` key selects the starting point; every
    /// other key overrides the matching field. Unknown keys are rejected.
    pub fn from_toml_str(input: &str) -> Result<Self, OptionsError> {
        let file: OptionsFile = toml::from_str(input)?;
        let preset = match file.preset.as_deref() {
            Some(name) => name.parse()?,
            None => Preset::Default,
        };
        let mut options = Self::preset(preset);
        file.apply(&mut options);
        options.validate()?;
        Ok(options)
    }

    /// Read and parse an options file. See [`AnalysisOptions::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Reject combinations the pipeline cannot make sense of.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.min_heading_length > self.max_heading_length {
            return Err(OptionsError::Invalid(format!(
                "min_heading_length ({}) exceeds max_heading_length ({})",
                self.min_heading_length, self.max_heading_length
            )));
        }
        if self.max_heading_levels == 0 {
            return Err(OptionsError::Invalid(
                "max_heading_levels must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence_threshold) {
            return Err(OptionsError::Invalid(format!(
                "min_confidence_threshold must be within [0, 1], got {}",
                self.min_confidence_threshold
            )));
        }
        let non_negative = [
            ("font_size_multiplier", self.font_size_multiplier),
            ("min_vertical_spacing", self.min_vertical_spacing),
            ("header_height", self.header_height),
            ("footer_height", self.footer_height),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(OptionsError::Invalid(format!(
                    "{name} must be a finite, non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// One-line summary used in debug logging.
    pub fn describe(&self) -> String {
        let pages = self
            .skip_pages
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "threshold={:.2} font_multiplier={:.2} skip_pages=[{}]",
            self.min_confidence_threshold, self.font_size_multiplier, pages
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionsFile {
    preset: Option<String>,
    min_heading_length: Option<usize>,
    max_heading_length: Option<usize>,
    font_size_multiplier: Option<f32>,
    consider_bold_as_heading: Option<bool>,
    min_vertical_spacing: Option<f32>,
    min_confidence_threshold: Option<f32>,
    max_heading_levels: Option<u8>,
    ignore_header_footer: Option<bool>,
    header_height: Option<f32>,
    footer_height: Option<f32>,
    skip_pages: Option<BTreeSet<u32>>,
    debug: Option<bool>,
}

impl OptionsFile {
    fn apply(self, options: &mut AnalysisOptions) {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = self.$field {
                        options.$field = value;
                    }
                )*
            };
        }
        set!(
            min_heading_length,
            max_heading_length,
            font_size_multiplier,
            consider_bold_as_heading,
            min_vertical_spacing,
            min_confidence_threshold,
            max_heading_levels,
            ignore_header_footer,
            header_height,
            footer_height,
            skip_pages,
            debug,
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_values() {
        let o = AnalysisOptions::default();
        assert_eq!(o.min_heading_length, 3);
        assert_eq!(o.max_heading_length, 100);
        assert!((o.font_size_multiplier - 1.1).abs() < 1e-6);
        assert!(o.consider_bold_as_heading);
        assert!((o.min_confidence_threshold - 0.3).abs() < 1e-6);
        assert_eq!(o.max_heading_levels, 6);
        assert_eq!(o.skip_pages, BTreeSet::from([1, 2, 3]));
        assert!(!o.debug);
    }

    #[test]
    fn test_presets_override_only_their_fields() {
        let strict = AnalysisOptions::strict();
        assert_eq!(strict.min_heading_length, 5);
        assert!((strict.min_confidence_threshold - 0.5).abs() < 1e-6);
        assert_eq!(strict.max_heading_levels, 6);

        let relaxed = AnalysisOptions::relaxed();
        assert_eq!(relaxed.max_heading_length, 150);
        assert!((relaxed.min_vertical_spacing - 2.0).abs() < 1e-6);

        let debug = AnalysisOptions::debug();
        assert!(debug.debug);
        assert!((debug.min_confidence_threshold - 0.1).abs() < 1e-6);
        assert_eq!(debug.min_heading_length, 3);
    }

    #[test]
    fn test_preset_parse_and_display() {
        assert_eq!("Strict".parse::<Preset>().unwrap(), Preset::Strict);
        assert_eq!(Preset::Relaxed.to_string(), "relaxed");
        assert!(matches!(
            "loose".parse::<Preset>(),
            Err(OptionsError::UnknownPreset(name)) if name == "loose"
        ));
    }

    #[test]
    fn test_from_toml_preset_with_overrides() {
        let o = AnalysisOptions::from_toml_str(
            r#"
            preset = "strict"
            skip_pages = []
            min_confidence_threshold = 0.45
            "#,
        )
        .unwrap();
        assert_eq!(o.min_heading_length, 5);
        assert!(o.skip_pages.is_empty());
        assert!((o.min_confidence_threshold - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_from_toml_empty_is_default() {
        assert_eq!(
            AnalysisOptions::from_toml_str("").unwrap(),
            AnalysisOptions::default()
        );
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = AnalysisOptions::from_toml_str("min_confidence = 0.4").unwrap_err();
        assert!(matches!(err, OptionsError::Toml(_)));
    }

    #[test]
    fn test_from_toml_rejects_invalid_combination() {
        let err = AnalysisOptions::from_toml_str("min_heading_length = 200").unwrap_err();
        assert!(matches!(err, OptionsError::Invalid(_)));
    }

    #[test]
    fn test_validate_threshold_range() {
        let mut o = AnalysisOptions::default();
        o.min_confidence_threshold = 1.5;
        assert!(o.validate().is_err());
        o.min_confidence_threshold = 1.0;
        assert!(o.validate().is_ok());
        o.max_heading_levels = 0;
        assert!(o.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "preset = \"relaxed\"\ndebug = true").unwrap();
        let o = AnalysisOptions::load(file.path()).unwrap();
        assert!(o.debug);
        assert_eq!(o.min_heading_length, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AnalysisOptions::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, OptionsError::Io(_)));
    }

    #[test]
    fn test_describe() {
        let o = AnalysisOptions::default();
        assert_eq!(
            o.describe(),
            "threshold=0.30 font_multiplier=1.10 skip_pages=[1,2,3]"
        );
    }
}
