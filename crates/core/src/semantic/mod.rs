/// Semantic heading detection.
///
/// Stages run leaves first: [`merge`] stitches raw runs into lines, [`stats`]
/// computes corpus baselines, [`classify`] scores each line, [`level`]
/// estimates nesting and [`tree`] folds accepted headings into a forest.
/// [`pipeline`] wires them together.
pub mod classify;
pub mod fragment;
pub mod level;
pub mod lexicon;
pub mod merge;
pub mod options;
pub mod pipeline;
pub mod stats;
pub mod tree;
