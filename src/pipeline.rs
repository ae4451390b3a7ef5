//! Workbook extraction pipeline.
//!
//! Turns one workbook file into a [`WorkbookData`] tree: sparse cell rows,
//! table candidates, print areas, and (in the automation-backed modes)
//! shapes and charts. Backend failures degrade the output instead of
//! failing it; only a workbook with no usable backend at all is an error.

use std::collections::BTreeMap;
use std::path::Path;

use crate::automation::{AutomationDriver, AutomationSession, SessionGuard};
use crate::error::{Error, Result};
use crate::model::workbook::{CellRow, PrintArea, SheetData, WorkbookData};
use crate::table::grid::col_to_letters;
use crate::table::{self, DetectionConfig};
use crate::warn::WarnRegistry;
use crate::xlsx::XlsxReader;

/// How much of the workbook to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// Cells, table candidates, and print areas only; no automation.
    #[default]
    Light,
    /// Adds shapes with text and charts via the automation driver.
    Standard,
    /// Adds shape and chart geometry to the output.
    Verbose,
}

impl ExtractMode {
    pub fn uses_automation(&self) -> bool {
        !matches!(self, ExtractMode::Light)
    }

    /// Shape/chart sizes are visible in output only in verbose mode.
    pub fn shows_sizes(&self) -> bool {
        matches!(self, ExtractMode::Verbose)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtractMode::Light => "light",
            ExtractMode::Standard => "standard",
            ExtractMode::Verbose => "verbose",
        }
    }
}

impl std::str::FromStr for ExtractMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" => Ok(ExtractMode::Light),
            "standard" => Ok(ExtractMode::Standard),
            "verbose" => Ok(ExtractMode::Verbose),
            other => Err(Error::InvalidData(format!(
                "unknown extraction mode: {}",
                other
            ))),
        }
    }
}

/// Per-extraction options.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub mode: ExtractMode,
    /// Detection parameter overrides for this extraction only.
    pub table_params: Option<DetectionConfig>,
    /// Collect per-sheet background color maps.
    pub include_colors_map: bool,
    /// Compute page rectangles from automatic page breaks. Needs an
    /// automation session; the structured reader has no break positions.
    pub include_auto_page_breaks: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            mode: ExtractMode::default(),
            table_params: None,
            include_colors_map: true,
            include_auto_page_breaks: false,
        }
    }
}

/// Extract one workbook.
///
/// `driver` supplies the automation backend; pass `None` to run file-only.
/// Warnings raised along the way are deduplicated through `warnings`.
pub fn extract_workbook(
    path: &Path,
    options: &ExtractOptions,
    driver: Option<&dyn AutomationDriver>,
    warnings: &mut WarnRegistry,
) -> Result<WorkbookData> {
    let config = options.table_params.unwrap_or_default();
    let book_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let guard = open_session(path, options.mode, driver, warnings);
    let session = guard.as_ref().map(|g| g.session());

    let mut workbook = WorkbookData::new(book_name);

    match XlsxReader::open(path) {
        Ok(reader) => {
            for name in reader.sheet_names().into_iter().map(str::to_string) {
                let sheet = extract_sheet_from_reader(
                    &reader, path, &name, config, session, options, warnings,
                );
                workbook.sheets.insert(name, sheet);
            }
        }
        Err(e) => {
            let Some(session) = session else {
                return Err(Error::BackendUnavailable(format!(
                    "{}: structured reader failed ({}) and no automation session",
                    path.display(),
                    e
                )));
            };
            for name in session.sheet_names()? {
                let sheet =
                    extract_sheet_from_session(session, path, &name, config, options, warnings);
                workbook.sheets.insert(name, sheet);
            }
        }
    }

    Ok(workbook)
}

fn open_session<'a>(
    path: &Path,
    mode: ExtractMode,
    driver: Option<&'a dyn AutomationDriver>,
    warnings: &mut WarnRegistry,
) -> Option<SessionGuard> {
    if !mode.uses_automation() {
        return None;
    }
    let Some(driver) = driver else {
        warnings.warn_once(
            format!("automation-unavailable::{}", path.display()),
            format!(
                "{}: no automation driver, extracting cells and tables only",
                path.display()
            ),
        );
        return None;
    };
    match driver.open(path) {
        Ok(session) => Some(SessionGuard::new(session)),
        Err(e) => {
            warnings.warn_once(
                format!("automation-unavailable::{}", path.display()),
                format!(
                    "{}: automation open failed ({}), extracting cells and tables only",
                    path.display(),
                    e
                ),
            );
            None
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn extract_sheet_from_reader(
    reader: &XlsxReader,
    path: &Path,
    name: &str,
    config: DetectionConfig,
    session: Option<&dyn AutomationSession>,
    options: &ExtractOptions,
    warnings: &mut WarnRegistry,
) -> SheetData {
    let mut sheet = SheetData::default();

    match reader.read_sheet(name) {
        Ok(content) => {
            sheet.rows = content.cell_rows();
            sheet.table_candidates = table::detect_tables_in_sheet(reader, &content, config);
            if options.include_colors_map {
                sheet.colors_map = content.colors_map();
            }
        }
        Err(e) => {
            warnings.warn_once(
                format!("reader-parse-fallback::{}::{}", path.display(), name),
                format!(
                    "{}: sheet '{}' failed to parse ({}), falling back",
                    path.display(),
                    name,
                    e
                ),
            );
            if let Some(session) = session {
                sheet.rows = session_cell_rows(session, name);
                if options.include_colors_map {
                    sheet.colors_map = session_colors_map(session, name);
                }
            }
            sheet.table_candidates = table::detect_tables(path, name, config, session, warnings);
        }
    }

    sheet.print_areas = reader.print_areas(name);
    if let Some(session) = session {
        if options.include_auto_page_breaks {
            sheet.auto_print_areas = session_auto_page_breaks(session, path, name, warnings);
        }
        attach_drawings(&mut sheet, session, path, name, options, warnings);
    }
    sheet
}

fn extract_sheet_from_session(
    session: &dyn AutomationSession,
    path: &Path,
    name: &str,
    config: DetectionConfig,
    options: &ExtractOptions,
    warnings: &mut WarnRegistry,
) -> SheetData {
    let mut sheet = SheetData::default();
    sheet.rows = session_cell_rows(session, name);
    sheet.table_candidates = table::detect_tables(path, name, config, Some(session), warnings);
    sheet.print_areas = session.print_areas(name).unwrap_or_default();
    if options.include_colors_map {
        sheet.colors_map = session_colors_map(session, name);
    }
    if options.include_auto_page_breaks {
        sheet.auto_print_areas = session_auto_page_breaks(session, path, name, warnings);
    }
    attach_drawings(&mut sheet, session, path, name, options, warnings);
    sheet
}

/// Shapes and charts from the session, in the automation-backed modes. A
/// failed query warns once and leaves the collection empty.
fn attach_drawings(
    sheet: &mut SheetData,
    session: &dyn AutomationSession,
    path: &Path,
    name: &str,
    options: &ExtractOptions,
    warnings: &mut WarnRegistry,
) {
    if !options.mode.uses_automation() {
        return;
    }
    match session.shapes(name) {
        Ok(shapes) => sheet.shapes = shapes,
        Err(e) => {
            warnings.warn_once(
                format!("shape-extract-failed::{}::{}", path.display(), name),
                format!(
                    "{}: shape extraction failed on sheet '{}' ({})",
                    path.display(),
                    name,
                    e
                ),
            );
        }
    }
    match session.charts(name) {
        Ok(charts) => sheet.charts = charts,
        Err(e) => {
            warnings.warn_once(
                format!("chart-extract-failed::{}::{}", path.display(), name),
                format!(
                    "{}: chart extraction failed on sheet '{}' ({})",
                    path.display(),
                    name,
                    e
                ),
            );
        }
    }
}

/// Background colors via per-cell session reads. Failed reads are skipped.
fn session_colors_map(
    session: &dyn AutomationSession,
    sheet: &str,
) -> BTreeMap<String, Vec<String>> {
    let Ok((max_row, max_col)) = session.used_range_extents(sheet) else {
        return BTreeMap::new();
    };

    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in 1..=max_row {
        for col in 1..=max_col {
            let Ok(Some(color)) = session.cell_fill_color(sheet, row, col) else {
                continue;
            };
            map.entry(color)
                .or_default()
                .push(format!("{}{}", col_to_letters(col), row));
        }
    }
    map
}

/// Page rectangles from the session's automatic page breaks.
///
/// The sheet's print areas bound the pages; a sheet without one is bounded by
/// its used range. Each bounding area is split at the break rows and columns
/// into one rectangle per printed page.
fn session_auto_page_breaks(
    session: &dyn AutomationSession,
    path: &Path,
    sheet: &str,
    warnings: &mut WarnRegistry,
) -> Vec<PrintArea> {
    let mut areas = session.print_areas(sheet).unwrap_or_default();
    if areas.is_empty() {
        match session.used_range_extents(sheet) {
            Ok((max_row, max_col)) if max_row > 0 && max_col > 0 => {
                areas.push(PrintArea {
                    r1: 1,
                    c1: 0,
                    r2: max_row,
                    c2: max_col - 1,
                });
            }
            _ => return Vec::new(),
        }
    }

    let breaks = session
        .horizontal_page_breaks(sheet)
        .and_then(|h| session.vertical_page_breaks(sheet).map(|v| (h, v)));
    let (h_breaks, v_breaks) = match breaks {
        Ok(b) => b,
        Err(e) => {
            warnings.warn_once(
                format!("page-breaks-failed::{}::{}", path.display(), sheet),
                format!(
                    "{}: page break query failed on sheet '{}' ({})",
                    path.display(),
                    sheet,
                    e
                ),
            );
            return Vec::new();
        }
    };

    areas
        .iter()
        .flat_map(|area| split_area_by_breaks(*area, &h_breaks, &v_breaks))
        .collect()
}

/// Split one bounding area at the given break rows and columns. A break at
/// row or column `n` starts a new page at `n`; breaks outside the area are
/// ignored.
fn split_area_by_breaks(area: PrintArea, h_breaks: &[u32], v_breaks: &[u32]) -> Vec<PrintArea> {
    let min_row = area.r1;
    let max_row = area.r2;
    let min_col = area.c1 + 1;
    let max_col = area.c2 + 1;

    let mut rows = vec![min_row];
    rows.extend(
        h_breaks
            .iter()
            .copied()
            .filter(|r| min_row < *r && *r <= max_row),
    );
    rows.push(max_row + 1);
    rows.sort_unstable();
    rows.dedup();

    let mut cols = vec![min_col];
    cols.extend(
        v_breaks
            .iter()
            .copied()
            .filter(|c| min_col < *c && *c <= max_col),
    );
    cols.push(max_col + 1);
    cols.sort_unstable();
    cols.dedup();

    let mut pages = Vec::new();
    for i in 0..rows.len() - 1 {
        for j in 0..cols.len() - 1 {
            pages.push(PrintArea {
                r1: rows[i],
                c1: cols[j] - 1,
                r2: rows[i + 1] - 1,
                c2: cols[j + 1] - 2,
            });
        }
    }
    pages
}

/// Sparse cell rows via per-cell session reads. Failed reads and
/// whitespace-only values are dropped.
fn session_cell_rows(session: &dyn AutomationSession, sheet: &str) -> Vec<CellRow> {
    let Ok((max_row, max_col)) = session.used_range_extents(sheet) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for row in 1..=max_row {
        let mut cell_row = CellRow::new(row);
        for col in 1..=max_col {
            let Ok(value) = session.cell_value(sheet, row, col) else {
                continue;
            };
            if !value.trim().is_empty() {
                cell_row.c.insert(col - 1, value);
            }
        }
        if !cell_row.c.is_empty() {
            rows.push(cell_row);
        }
    }
    rows
}
