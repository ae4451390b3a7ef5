//! Extraction engine: options, output filters, JSON serialization.

use std::path::Path;

use crate::automation::AutomationDriver;
use crate::error::{Error, Result};
use crate::model::workbook::{SheetData, SheetMap, WorkbookData};
use crate::pipeline::{self, ExtractOptions};
use crate::warn::WarnRegistry;

/// Which collections appear in the serialized output.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub include_rows: bool,
    pub include_shapes: bool,
    pub include_charts: bool,
    pub include_tables: bool,
    /// None resolves from the mode: light excludes print areas, the
    /// automation-backed modes include them.
    pub include_print_areas: Option<bool>,
    pub include_colors_map: bool,
    /// Pretty-print the JSON output.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            include_rows: true,
            include_shapes: true,
            include_charts: true,
            include_tables: true,
            include_print_areas: None,
            include_colors_map: true,
            pretty: false,
        }
    }
}

/// Stateful extraction engine.
///
/// Holds the mode, output filters, optional automation driver, and the
/// warn-once registry shared across extractions, so repeated calls on the
/// same engine do not repeat fallback warnings.
pub struct Engine {
    options: ExtractOptions,
    output: OutputOptions,
    driver: Option<Box<dyn AutomationDriver>>,
    warnings: WarnRegistry,
}

impl Engine {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            output: OutputOptions::default(),
            driver: None,
            warnings: WarnRegistry::new(),
        }
    }

    pub fn with_driver(mut self, driver: Box<dyn AutomationDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn with_output(mut self, output: OutputOptions) -> Self {
        self.output = output;
        self
    }

    /// Extract a workbook with the output filters applied.
    pub fn extract(&mut self, path: impl AsRef<Path>) -> Result<WorkbookData> {
        let workbook = pipeline::extract_workbook(
            path.as_ref(),
            &self.options,
            self.driver.as_deref(),
            &mut self.warnings,
        )?;
        Ok(self.apply_filters(workbook))
    }

    /// Extract a workbook and serialize it to JSON.
    pub fn extract_json(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let workbook = self.extract(path)?;
        let json = if self.output.pretty {
            serde_json::to_string_pretty(&workbook)
        } else {
            serde_json::to_string(&workbook)
        };
        json.map_err(|e| Error::Serialize(e.to_string()))
    }

    /// Warnings accumulated so far.
    pub fn warnings(&self) -> &WarnRegistry {
        &self.warnings
    }

    fn apply_filters(&self, workbook: WorkbookData) -> WorkbookData {
        let sheets: SheetMap = workbook
            .sheets
            .iter()
            .map(|(name, sheet)| (name.to_string(), self.filter_sheet(sheet.clone())))
            .collect();
        WorkbookData {
            book_name: workbook.book_name,
            sheets,
        }
    }

    /// Resolved print-area toggle: an explicit setting wins, otherwise light
    /// mode drops them and the other modes keep them.
    fn include_print_areas(&self) -> bool {
        self.output
            .include_print_areas
            .unwrap_or(self.options.mode != crate::pipeline::ExtractMode::Light)
    }

    fn filter_sheet(&self, mut sheet: SheetData) -> SheetData {
        if !self.output.include_rows {
            sheet.rows.clear();
        }
        if !self.output.include_tables {
            sheet.table_candidates.clear();
        }
        if !self.include_print_areas() {
            sheet.print_areas.clear();
            sheet.auto_print_areas.clear();
        }
        if !self.output.include_colors_map {
            sheet.colors_map.clear();
        }

        if !self.output.include_shapes {
            sheet.shapes.clear();
        } else if !self.options.mode.shows_sizes() {
            sheet.shapes = sheet
                .shapes
                .into_iter()
                .map(|s| s.without_size())
                .collect();
        }

        if !self.output.include_charts {
            sheet.charts.clear();
        } else if !self.options.mode.shows_sizes() {
            sheet.charts = sheet
                .charts
                .into_iter()
                .map(|c| c.without_size())
                .collect();
        }

        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::shape::Shape;
    use crate::pipeline::ExtractMode;

    fn sample_sheet() -> SheetData {
        let mut shape = Shape::new("label", 10, 20);
        shape.w = Some(100);
        shape.h = Some(50);
        let mut colors = std::collections::BTreeMap::new();
        colors.insert("#FFCC00".to_string(), vec!["A1".to_string()]);
        SheetData {
            rows: vec![crate::model::workbook::CellRow::new(1)],
            shapes: vec![shape],
            table_candidates: vec!["A1:B2".to_string()],
            print_areas: vec![crate::model::workbook::PrintArea {
                r1: 1,
                c1: 0,
                r2: 2,
                c2: 1,
            }],
            colors_map: colors,
            ..SheetData::default()
        }
    }

    fn engine(mode: ExtractMode, output: OutputOptions) -> Engine {
        Engine::new(ExtractOptions {
            mode,
            ..ExtractOptions::default()
        })
        .with_output(output)
    }

    #[test]
    fn test_filters_drop_collections() {
        let e = engine(
            ExtractMode::Standard,
            OutputOptions {
                include_rows: false,
                include_tables: false,
                ..OutputOptions::default()
            },
        );
        let filtered = e.filter_sheet(sample_sheet());
        assert!(filtered.rows.is_empty());
        assert!(filtered.table_candidates.is_empty());
        assert_eq!(filtered.shapes.len(), 1);
    }

    #[test]
    fn test_print_areas_follow_mode_by_default() {
        let e = engine(ExtractMode::Light, OutputOptions::default());
        let filtered = e.filter_sheet(sample_sheet());
        assert!(filtered.print_areas.is_empty());

        let e = engine(ExtractMode::Standard, OutputOptions::default());
        let filtered = e.filter_sheet(sample_sheet());
        assert_eq!(filtered.print_areas.len(), 1);
    }

    #[test]
    fn test_explicit_print_area_setting_wins() {
        let e = engine(
            ExtractMode::Light,
            OutputOptions {
                include_print_areas: Some(true),
                ..OutputOptions::default()
            },
        );
        let filtered = e.filter_sheet(sample_sheet());
        assert_eq!(filtered.print_areas.len(), 1);

        let e = engine(
            ExtractMode::Verbose,
            OutputOptions {
                include_print_areas: Some(false),
                ..OutputOptions::default()
            },
        );
        let filtered = e.filter_sheet(sample_sheet());
        assert!(filtered.print_areas.is_empty());
    }

    #[test]
    fn test_colors_map_filter() {
        let e = engine(ExtractMode::Standard, OutputOptions::default());
        let filtered = e.filter_sheet(sample_sheet());
        assert_eq!(filtered.colors_map["#FFCC00"], vec!["A1".to_string()]);

        let e = engine(
            ExtractMode::Standard,
            OutputOptions {
                include_colors_map: false,
                ..OutputOptions::default()
            },
        );
        let filtered = e.filter_sheet(sample_sheet());
        assert!(filtered.colors_map.is_empty());
    }

    #[test]
    fn test_sizes_hidden_outside_verbose() {
        let e = engine(ExtractMode::Standard, OutputOptions::default());
        let filtered = e.filter_sheet(sample_sheet());
        assert_eq!(filtered.shapes[0].w, None);
        assert_eq!(filtered.shapes[0].h, None);

        let e = engine(ExtractMode::Verbose, OutputOptions::default());
        let filtered = e.filter_sheet(sample_sheet());
        assert_eq!(filtered.shapes[0].w, Some(100));
    }
}
