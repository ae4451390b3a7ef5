//! XLSX structured-file backend.
//!
//! Reads workbook content directly from the on-disk OOXML package: cell
//! values, border and fill styles, declared tables, and print areas. This is
//! the fast path for table detection; it needs no live spreadsheet
//! application.
//!
//! # Example
//!
//! ```no_run
//! use exstruct::xlsx::XlsxReader;
//!
//! let reader = XlsxReader::open("data.xlsx")?;
//! for name in reader.sheet_names() {
//!     let sheet = reader.read_sheet(name)?;
//!     println!("{}: {} x {}", name, sheet.max_row, sheet.max_col);
//! }
//! # Ok::<(), exstruct::Error>(())
//! ```

mod reader;
mod shared_strings;
mod styles;

pub use reader::{SheetContent, XlsxReader};
pub use shared_strings::SharedStrings;
pub use styles::{BorderDef, CellStyles};
