//! Chart model structures and SERIES formula parsing.

use serde::{Deserialize, Serialize};

/// One data series of a chart.
///
/// The range fields are extracted from the series' `=SERIES(...)` formula;
/// they stay `None` when the formula is absent or malformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Series display name
    pub name: String,

    /// Range feeding the series name, e.g. "Sheet1!$B$1"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_range: Option<String>,

    /// Range feeding the category (x) axis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_range: Option<String>,

    /// Range feeding the value (y) axis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_range: Option<String>,
}

impl ChartSeries {
    /// Build a series from its display name and raw SERIES formula.
    pub fn from_formula(name: impl Into<String>, formula: &str) -> Self {
        let (name_range, x_range, y_range) = match parse_series_formula(formula) {
            Some(parts) => parts,
            None => (None, None, None),
        };
        Self {
            name: name.into(),
            name_range,
            x_range,
            y_range,
        }
    }
}

/// A chart placed on a worksheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chart {
    /// Chart object name
    pub name: String,

    /// Chart type label, e.g. "line" or "column_clustered"
    pub chart_type: String,

    /// Chart title when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Y-axis title (empty when none)
    #[serde(default)]
    pub y_axis_title: String,

    /// Y-axis [min, max] scale when available
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub y_axis_range: Vec<f64>,

    /// Data series
    #[serde(default)]
    pub series: Vec<ChartSeries>,

    /// Left offset in points
    pub l: i64,

    /// Top offset in points
    pub t: i64,

    /// Set when the chart structure could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Width in points (verbose mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,

    /// Height in points (verbose mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
}

impl Chart {
    /// Strip size fields for non-verbose output.
    pub fn without_size(mut self) -> Self {
        self.w = None;
        self.h = None;
        self
    }
}

/// Parse an Excel `=SERIES(name, categories, values, order)` formula into
/// (name_range, x_range, y_range).
///
/// Arguments may be empty; sheet names may be single-quoted and contain
/// commas, so splitting respects quotes. Returns `None` when the formula is
/// not a SERIES call.
pub fn parse_series_formula(formula: &str) -> Option<(Option<String>, Option<String>, Option<String>)> {
    let trimmed = formula.trim().trim_start_matches('=');
    let upper = trimmed.to_ascii_uppercase();
    if !upper.starts_with("SERIES(") {
        return None;
    }
    let body = &trimmed["SERIES(".len()..];
    let body = body.strip_suffix(')').unwrap_or(body);

    let args = split_args_respecting_quotes(body);

    let arg = |i: usize| -> Option<String> {
        args.get(i)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    Some((arg(0), arg(1), arg(2)))
}

/// Split a comma-separated argument list, keeping commas inside single quotes
/// (escaped as '') intact.
fn split_args_respecting_quotes(raw: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quote = false;
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                if in_quote && chars.peek() == Some(&'\'') {
                    buf.push_str("''");
                    chars.next();
                    continue;
                }
                in_quote = !in_quote;
                buf.push(ch);
            }
            ',' if !in_quote => {
                parts.push(std::mem::take(&mut buf));
            }
            _ => buf.push(ch),
        }
    }
    parts.push(buf);
    parts
}
