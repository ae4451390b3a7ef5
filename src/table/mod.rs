//! Table region detection.
//!
//! A table candidate is a rectangular region of bordered cells: the border
//! map marks every cell with a visible border edge, connected marks are
//! clustered and merged into bounding rectangles, and each rectangle is
//! trimmed inward to its content before being emitted as an A1 range string.
//!
//! Detection runs against ranked backends. Modern XML workbooks are read
//! straight from the package; legacy binary workbooks and anything the
//! reader cannot parse fall back to a live-automation session when one is
//! available. Fallbacks are logged once per cause and never surface as
//! errors: a sheet where every backend fails simply yields no candidates.

pub mod cluster;
pub mod config;
pub mod grid;
pub mod trim;

pub use cluster::{detect_border_clusters, merge_overlapping};
pub use config::DetectionConfig;
pub use grid::{BorderGrid, BorderMap, Rect};
pub use trim::{shrink_to_content, InsideBorderSource, NoInsideBorders};

use std::path::Path;

use crate::automation::AutomationSession;
use crate::detect::format_from_extension;
use crate::warn::WarnRegistry;
use crate::xlsx::XlsxReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    FileReader,
    Automation,
}

/// Detect table regions on one sheet, trying backends in rank order.
///
/// Declared tables (formal table annotations) come first, verbatim and
/// untrimmed; detected candidates follow in merge-list order. Returns an
/// empty list when every backend fails.
pub fn detect_tables(
    path: &Path,
    sheet: &str,
    config: DetectionConfig,
    session: Option<&dyn AutomationSession>,
    warnings: &mut WarnRegistry,
) -> Vec<String> {
    for backend in ranked_backends(path, warnings) {
        let attempt = match backend {
            Backend::FileReader => detect_with_reader(path, sheet, config, warnings),
            Backend::Automation => detect_with_automation(path, sheet, config, session, warnings),
        };
        if let Some(tables) = attempt {
            return tables;
        }
    }
    Vec::new()
}

/// Detect table regions on an already-open reader sheet.
///
/// The fast path for callers that hold a [`XlsxReader`]; no backend fallback.
pub fn detect_tables_in_sheet(
    reader: &XlsxReader,
    sheet: &crate::xlsx::SheetContent,
    config: DetectionConfig,
) -> Vec<String> {
    let mut tables = reader.declared_tables(sheet).unwrap_or_default();
    let map = sheet.border_map();
    tables.extend(detected_candidates(&map, config, |rect| {
        sheet.region_values(rect)
    }));
    tables
}

fn ranked_backends(path: &Path, warnings: &mut WarnRegistry) -> Vec<Backend> {
    match format_from_extension(path) {
        Ok(format) if format.supports_file_backend() => {
            vec![Backend::FileReader, Backend::Automation]
        }
        Ok(_) => {
            warnings.warn_once(
                format!("xls-fallback::{}", path.display()),
                format!(
                    "{}: legacy binary workbook, table detection needs automation",
                    path.display()
                ),
            );
            vec![Backend::Automation]
        }
        Err(_) => {
            warnings.warn_once(
                "unknown-format-fallback",
                format!(
                    "{}: unrecognized workbook format, trying automation",
                    path.display()
                ),
            );
            vec![Backend::Automation]
        }
    }
}

/// Cluster, merge, and trim candidates from a border map. `values` fetches
/// the materialized cell values of a rectangle.
fn detected_candidates(
    map: &BorderMap,
    config: DetectionConfig,
    values: impl Fn(&Rect) -> Vec<Vec<String>>,
) -> Vec<String> {
    let clusters = detect_border_clusters(&map.any, config.min_cluster_size);
    merge_overlapping(clusters)
        .into_iter()
        .filter_map(|rect| {
            let vals = values(&rect);
            shrink_to_content(rect, vals, &config, map)
        })
        .map(|rect| rect.to_a1())
        .collect()
}

fn detect_with_reader(
    path: &Path,
    sheet: &str,
    config: DetectionConfig,
    warnings: &mut WarnRegistry,
) -> Option<Vec<String>> {
    let reader = match XlsxReader::open(path) {
        Ok(r) => r,
        Err(e) => {
            warnings.warn_once(
                format!("reader-unavailable::{}", path.display()),
                format!("{}: structured reader failed to open ({})", path.display(), e),
            );
            return None;
        }
    };
    let content = match reader.read_sheet(sheet) {
        Ok(c) => c,
        Err(e) => {
            warnings.warn_once(
                format!("reader-parse-fallback::{}::{}", path.display(), sheet),
                format!(
                    "{}: sheet '{}' failed to parse ({}), falling back",
                    path.display(),
                    sheet,
                    e
                ),
            );
            return None;
        }
    };
    Some(detect_tables_in_sheet(&reader, &content, config))
}

fn detect_with_automation(
    path: &Path,
    sheet: &str,
    config: DetectionConfig,
    session: Option<&dyn AutomationSession>,
    warnings: &mut WarnRegistry,
) -> Option<Vec<String>> {
    let Some(session) = session else {
        warnings.warn_once(
            format!("automation-unavailable::{}", path.display()),
            format!(
                "{}: no automation session available for table detection",
                path.display()
            ),
        );
        return None;
    };

    let (max_row, max_col) = match session.used_range_extents(sheet) {
        Ok(extents) => extents,
        Err(e) => {
            warnings.warn_once(
                format!("automation-failed::{}::{}", path.display(), sheet),
                format!(
                    "{}: automation query failed on sheet '{}' ({})",
                    path.display(),
                    sheet,
                    e
                ),
            );
            return None;
        }
    };

    let mut tables = session.declared_tables(sheet).unwrap_or_default();
    let map = session_border_map(session, sheet, max_row, max_col);
    tables.extend(detected_candidates(&map, config, |rect| {
        session_region_values(session, sheet, rect)
    }));
    Some(tables)
}

/// Border map from per-cell automation queries. A failed query counts as "no
/// border" for that cell.
fn session_border_map(
    session: &dyn AutomationSession,
    sheet: &str,
    max_row: u32,
    max_col: u32,
) -> BorderMap {
    let mut map = BorderMap::new(max_row, max_col);
    for row in 1..=max_row {
        for col in 1..=max_col {
            let Ok(borders) = session.cell_borders(sheet, row, col) else {
                continue;
            };
            if borders.any_visible() {
                map.any.mark(row, col);
            }
            if borders.inside_vertical.is_visible() {
                map.inside_vertical.mark(row, col);
            }
            if borders.inside_horizontal.is_visible() {
                map.inside_horizontal.mark(row, col);
            }
        }
    }
    map
}

/// Materialize a rectangle's values through the session. A failed read
/// becomes an empty cell.
fn session_region_values(
    session: &dyn AutomationSession,
    sheet: &str,
    rect: &Rect,
) -> Vec<Vec<String>> {
    (rect.top..=rect.bottom)
        .map(|row| {
            (rect.left..=rect.right)
                .map(|col| session.cell_value(sheet, row, col).unwrap_or_default())
                .collect()
        })
        .collect()
}
