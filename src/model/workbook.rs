//! Workbook and sheet model structures.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A sparse row of cell values.
///
/// Only non-empty cells are kept: `c` maps 0-based column indices to the
/// stringified cell value. Rows with no non-empty cells are omitted from
/// `SheetData.rows` entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellRow {
    /// 1-based worksheet row number
    pub r: u32,
    /// 0-based column index -> cell text
    pub c: BTreeMap<u32, String>,
}

impl CellRow {
    /// Create an empty row at the given 1-based row number.
    pub fn new(r: u32) -> Self {
        Self {
            r,
            c: BTreeMap::new(),
        }
    }

    /// Check if the row carries no values.
    pub fn is_empty(&self) -> bool {
        self.c.is_empty()
    }
}

/// A rectangular print area.
///
/// Rows are 1-based, columns 0-based, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintArea {
    pub r1: u32,
    pub c1: u32,
    pub r2: u32,
    pub c2: u32,
}

/// Extracted content of a single worksheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetData {
    /// Sparse cell rows
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<CellRow>,

    /// Shapes placed on the sheet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<super::Shape>,

    /// Charts placed on the sheet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<super::Chart>,

    /// Detected and declared table regions as A1 range strings,
    /// declared tables first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table_candidates: Vec<String>,

    /// Print areas from workbook defined names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub print_areas: Vec<PrintArea>,

    /// Page rectangles computed from automatic page breaks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auto_print_areas: Vec<PrintArea>,

    /// Background color ("#RRGGBB") -> filled cell references in row-major
    /// order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub colors_map: BTreeMap<String, Vec<String>>,
}

/// Ordered map of sheet name to sheet data, preserving workbook order.
///
/// Serializes as a JSON object whose keys appear in workbook order.
#[derive(Debug, Clone, Default)]
pub struct SheetMap {
    entries: Vec<(String, SheetData)>,
}

impl SheetMap {
    /// Create an empty sheet map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet, replacing any existing sheet with the same name.
    pub fn insert(&mut self, name: impl Into<String>, sheet: SheetData) {
        let name = name.into();
        if let Some(existing) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = sheet;
        } else {
            self.entries.push((name, sheet));
        }
    }

    /// Get a sheet by name.
    pub fn get(&self, name: &str) -> Option<&SheetData> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Iterate sheets in workbook order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SheetData)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Number of sheets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no sheets.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, SheetData)> for SheetMap {
    fn from_iter<I: IntoIterator<Item = (String, SheetData)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, sheet) in iter {
            map.insert(name, sheet);
        }
        map
    }
}

impl Serialize for SheetMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, sheet) in &self.entries {
            map.serialize_entry(name, sheet)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SheetMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SheetMapVisitor;

        impl<'de> Visitor<'de> for SheetMapVisitor {
            type Value = SheetMap;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of sheet name to sheet data")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut map = SheetMap::new();
                while let Some((name, sheet)) = access.next_entry::<String, SheetData>()? {
                    map.insert(name, sheet);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(SheetMapVisitor)
    }
}

/// Extracted content of a whole workbook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkbookData {
    /// Workbook file name
    pub book_name: String,

    /// Per-sheet data in workbook order
    pub sheets: SheetMap,
}

impl WorkbookData {
    /// Create an empty workbook with the given name.
    pub fn new(book_name: impl Into<String>) -> Self {
        Self {
            book_name: book_name.into(),
            sheets: SheetMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_row_sparse() {
        let mut row = CellRow::new(3);
        assert!(row.is_empty());
        row.c.insert(0, "a".to_string());
        row.c.insert(4, "b".to_string());
        assert!(!row.is_empty());

        let json = serde_json::to_string(&row).unwrap();
        // Integer map keys become JSON strings.
        assert_eq!(json, r#"{"r":3,"c":{"0":"a","4":"b"}}"#);
    }

    #[test]
    fn test_sheet_map_preserves_order() {
        let mut map = SheetMap::new();
        map.insert("Zeta", SheetData::default());
        map.insert("Alpha", SheetData::default());

        let names: Vec<&str> = map.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Zeta", "Alpha"]);

        let wb = WorkbookData {
            book_name: "book.xlsx".to_string(),
            sheets: map,
        };
        let json = serde_json::to_string(&wb).unwrap();
        let zeta = json.find("Zeta").unwrap();
        let alpha = json.find("Alpha").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_sheet_map_insert_replaces() {
        let mut map = SheetMap::new();
        map.insert("Sheet1", SheetData::default());
        let mut updated = SheetData::default();
        updated.table_candidates.push("A1:B2".to_string());
        map.insert("Sheet1", updated);

        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get("Sheet1").unwrap().table_candidates,
            vec!["A1:B2".to_string()]
        );
    }

    #[test]
    fn test_empty_collections_omitted() {
        let sheet = SheetData::default();
        let json = serde_json::to_string(&sheet).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_workbook_roundtrip() {
        let mut wb = WorkbookData::new("book.xlsx");
        let mut sheet = SheetData::default();
        sheet.table_candidates.push("B2:D10".to_string());
        sheet.print_areas.push(PrintArea {
            r1: 1,
            c1: 0,
            r2: 2,
            c2: 1,
        });
        wb.sheets.insert("Sheet1", sheet);

        let json = serde_json::to_string(&wb).unwrap();
        let back: WorkbookData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.book_name, "book.xlsx");
        let sheet = back.sheets.get("Sheet1").unwrap();
        assert_eq!(sheet.table_candidates, vec!["B2:D10".to_string()]);
        assert_eq!(sheet.print_areas[0].r2, 2);
    }
}
