//! Core library for pdftoc
//!
//! This crate is the **Functional Core** of pdftoc: it turns positioned text
//! runs into a table of contents without touching any document format. The
//! `pdf` crate plays the shell role, decoding content streams into
//! [`RawFragment`]s and handing them over.
//!
//! ## Functional Core Principles
//!
//! - **Pure functions**: Same fragments and options always produce the same tree
//! - **No side effects**: The only I/O is [`AnalysisOptions::load`]
//! - **Testable**: Every stage is exercised with hand-built fragments
//!
//! # Module Organization
//!
//! - [`semantic::merge`]: Raw runs → line-level fragments with spacing annotations
//! - [`semantic::stats`]: Corpus-wide font baselines
//! - [`semantic::classify`]: Rule-table heading classifier
//! - [`semantic::level`]: Heading level estimation
//! - [`semantic::tree`]: Level-stack hierarchy builder
//! - [`semantic::pipeline`]: The stages wired together
//!
//! # Example Usage
//!
//! ```rust
//! use pdftoc_core::{extract_toc, AnalysisOptions, RawFragment};
//!
//! let options = AnalysisOptions {
//!     skip_pages: Default::default(),
//!     ..AnalysisOptions::default()
//! };
//! let raw = vec![RawFragment {
//!     text: "1. Introduction".to_string(),
//!     font_size: 16.0,
//!     y: 100.0,
//!     page: 1,
//!     ..Default::default()
//! }];
//!
//! let toc = extract_toc(raw, &options);
//! assert_eq!(toc.tree.len(), 1);
//! ```

use thiserror::Error;

pub mod semantic;

pub use semantic::fragment::{ClassificationResult, Exclusion, RawFragment, Signal, TextFragment};
pub use semantic::options::{AnalysisOptions, Preset};
pub use semantic::pipeline::{
    analyze, extract_toc, Analysis, AnalysisReport, RelaxationHint, SemanticToc,
};
pub use semantic::stats::CorpusStatistics;
pub use semantic::tree::{build_tree, NodeId, TocEntry, TocNode, TocTree};

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid options file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unknown preset: {0} (expected default, strict, relaxed or debug)")]
    UnknownPreset(String),
    #[error("Invalid options: {0}")]
    Invalid(String),
}
