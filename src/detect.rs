//! Workbook format detection.
//!
//! Extraction dispatches on the workbook container format: modern XML-based
//! workbooks (`.xlsx`/`.xlsm`, ZIP packages) can be read by the structured
//! file backend, while the legacy binary format (`.xls`, OLE compound file)
//! requires the live-automation backend.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE compound file magic bytes (legacy BIFF workbooks).
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Detected workbook container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Office Open XML workbook (.xlsx)
    Xlsx,
    /// Macro-enabled Office Open XML workbook (.xlsm)
    Xlsm,
    /// Legacy binary BIFF workbook (.xls)
    Xls,
}

impl WorkbookFormat {
    /// Returns the canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            WorkbookFormat::Xlsx => "xlsx",
            WorkbookFormat::Xlsm => "xlsm",
            WorkbookFormat::Xls => "xls",
        }
    }

    /// Whether the structured-file backend can parse this format.
    ///
    /// The legacy binary format has no XML parts to read; only the
    /// live-automation backend can serve it.
    pub fn supports_file_backend(&self) -> bool {
        !matches!(self, WorkbookFormat::Xls)
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            WorkbookFormat::Xlsx => "Excel Workbook",
            WorkbookFormat::Xlsm => "Excel Macro-Enabled Workbook",
            WorkbookFormat::Xls => "Excel 97-2003 Workbook",
        }
    }
}

impl std::fmt::Display for WorkbookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the workbook format from a file extension.
///
/// Returns `Err(Error::UnknownFormat)` for missing or unrecognized
/// extensions; the caller decides whether that means falling back to the
/// automation backend or rejecting the file.
pub fn format_from_extension(path: impl AsRef<Path>) -> Result<WorkbookFormat> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(Error::UnknownFormat)?;

    match ext.as_str() {
        "xlsx" => Ok(WorkbookFormat::Xlsx),
        "xlsm" => Ok(WorkbookFormat::Xlsm),
        "xls" => Ok(WorkbookFormat::Xls),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

/// Detect the workbook format by sniffing file magic bytes.
///
/// ZIP magic indicates a modern OOXML package; the OLE compound-file header
/// indicates a legacy binary workbook. Used when the extension is missing or
/// contradicts the content.
pub fn format_from_magic(path: impl AsRef<Path>) -> Result<WorkbookFormat> {
    let mut file = File::open(path.as_ref())?;
    let mut header = [0u8; 8];
    let read = file.read(&mut header)?;

    if read >= 4 && header[..4] == ZIP_MAGIC {
        // Cannot distinguish xlsx from xlsm without reading content types;
        // both go through the same backend.
        return Ok(WorkbookFormat::Xlsx);
    }
    if read >= 8 && header == OLE_MAGIC {
        return Ok(WorkbookFormat::Xls);
    }

    Err(Error::UnknownFormat)
}

/// Detect the workbook format, preferring the extension and falling back to
/// magic-byte sniffing.
pub fn detect_format(path: impl AsRef<Path>) -> Result<WorkbookFormat> {
    match format_from_extension(path.as_ref()) {
        Ok(format) => Ok(format),
        Err(_) => format_from_magic(path),
    }
}
