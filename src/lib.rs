//! # exstruct
//!
//! Structured-data extraction from Excel workbooks.
//!
//! Extracts cell contents, table regions, print areas, background color
//! maps, shapes, and charts into a normalized document tree serializable to
//! JSON. Table regions are
//! found by border-cluster detection: cells with visible borders are
//! clustered, merged into bounding rectangles, and trimmed to their content.
//!
//! Two backends feed the tree. Modern XML workbooks are read straight from
//! the package; a live-automation driver (supplied by the caller) covers
//! legacy binary workbooks and drawing objects. When a backend is
//! unavailable the output degrades with a logged warning instead of failing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use exstruct::extract;
//!
//! // Cells, table candidates, and print areas, no automation.
//! let workbook = extract("data.xlsx")?;
//! for (name, sheet) in workbook.sheets.iter() {
//!     println!("{}: {} tables", name, sheet.table_candidates.len());
//! }
//! # Ok::<(), exstruct::Error>(())
//! ```
//!
//! ## Engine API
//!
//! ```no_run
//! use exstruct::{Engine, ExtractMode, ExtractOptions};
//!
//! let mut engine = Engine::new(ExtractOptions {
//!     mode: ExtractMode::Light,
//!     ..ExtractOptions::default()
//! });
//! let json = engine.extract_json("data.xlsx")?;
//! # Ok::<(), exstruct::Error>(())
//! ```

pub mod automation;
pub mod container;
pub mod detect;
pub mod engine;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod table;
pub mod warn;
pub mod xlsx;

// Re-exports
pub use automation::{AutomationDriver, AutomationSession, SessionGuard};
pub use container::{Relationship, Relationships, WorkbookPackage};
pub use detect::{detect_format, WorkbookFormat};
pub use engine::{Engine, OutputOptions};
pub use error::{Error, Result};
pub use model::{
    CellRow, Chart, ChartSeries, Direction, PrintArea, Shape, SheetData, SheetMap, WorkbookData,
};
pub use pipeline::{ExtractMode, ExtractOptions};
pub use table::{DetectionConfig, Rect};
pub use warn::WarnRegistry;

use std::path::Path;

/// Extract a workbook in light mode: cells, table candidates, and print
/// areas, without automation.
pub fn extract(path: impl AsRef<Path>) -> Result<WorkbookData> {
    let mut warnings = WarnRegistry::new();
    pipeline::extract_workbook(
        path.as_ref(),
        &ExtractOptions::default(),
        None,
        &mut warnings,
    )
}

/// Extract a workbook with an automation driver backing the richer modes.
pub fn extract_with_driver(
    path: impl AsRef<Path>,
    options: &ExtractOptions,
    driver: &dyn AutomationDriver,
) -> Result<WorkbookData> {
    let mut warnings = WarnRegistry::new();
    pipeline::extract_workbook(path.as_ref(), options, Some(driver), &mut warnings)
}

/// Extract a workbook straight to a JSON string.
pub fn extract_json(path: impl AsRef<Path>) -> Result<String> {
    let workbook = extract(path)?;
    serde_json::to_string(&workbook).map_err(|e| Error::Serialize(e.to_string()))
}
