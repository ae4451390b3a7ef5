//! Normalized document model for extracted workbooks.
//!
//! These are plain serde structs populated by the extraction pipeline. The
//! backends convert workbook-specific representations (worksheet XML, live
//! application objects) into this format-agnostic tree, and the engine
//! serializes it for downstream tooling.

pub mod chart;
pub mod shape;
pub mod workbook;

pub use chart::*;
pub use shape::*;
pub use workbook::*;
