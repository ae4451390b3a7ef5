//! Cell style resolution from xl/styles.xml.
//!
//! Worksheet cells reference a cell format (`s=` attribute) in `<cellXfs>`;
//! each format points at a `<border>` definition via `borderId` and a
//! `<fill>` definition via `fillId`. A border edge is visible when its
//! element carries a `style` attribute other than "none"; a fill contributes
//! a color when its pattern is not "none" and its foreground color carries
//! an explicit RGB value.

/// Edge presence for one `<border>` definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BorderDef {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
    /// Inside-vertical edge (between columns of a range)
    pub vertical: bool,
    /// Inside-horizontal edge (between rows of a range)
    pub horizontal: bool,
}

impl BorderDef {
    /// Any of the six edges is visible.
    pub fn any_edge(&self) -> bool {
        self.left || self.right || self.top || self.bottom || self.vertical || self.horizontal
    }

    /// An inside edge is visible.
    pub fn inside_edge(&self) -> bool {
        self.vertical || self.horizontal
    }
}

#[derive(Debug, Default)]
struct FillState {
    colorable: bool,
    color: Option<String>,
}

/// Border and fill information parsed from xl/styles.xml.
#[derive(Debug, Default)]
pub struct CellStyles {
    /// Border definitions in document order
    borders: Vec<BorderDef>,
    /// Fill colors ("#RRGGBB") in document order; None for pattern-less and
    /// non-RGB fills
    fills: Vec<Option<String>>,
    /// Cell format index -> borderId
    cell_xf_border_ids: Vec<usize>,
    /// Cell format index -> fillId
    cell_xf_fill_ids: Vec<usize>,
}

impl CellStyles {
    /// Parse cell styles from xl/styles.xml content.
    ///
    /// Unparseable sections simply yield no definitions; a cell whose style
    /// cannot be resolved is treated as borderless and fill-less.
    pub fn parse(xml: &str) -> Self {
        let mut styles = Self::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut in_borders = false;
        let mut in_fills = false;
        let mut in_cell_xfs = false;
        let mut current_border: Option<BorderDef> = None;
        let mut current_fill: Option<FillState> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(ref e)) => match e.name().as_ref() {
                    b"borders" => in_borders = true,
                    b"fills" => in_fills = true,
                    b"cellXfs" => in_cell_xfs = true,
                    b"border" if in_borders => current_border = Some(BorderDef::default()),
                    b"fill" if in_fills => current_fill = Some(FillState::default()),
                    b"patternFill" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.colorable = pattern_is_colorable(e);
                        }
                    }
                    b"fgColor" => {
                        if let Some(fill) = current_fill.as_mut() {
                            if fill.colorable {
                                fill.color = rgb_attr(e);
                            }
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        styles.cell_xf_border_ids.push(xf_id_attr(e, b"borderId"));
                        styles.cell_xf_fill_ids.push(xf_id_attr(e, b"fillId"));
                    }
                    name => {
                        if let Some(def) = current_border.as_mut() {
                            apply_edge(def, name, edge_is_visible(e));
                        }
                    }
                },
                Ok(quick_xml::events::Event::Empty(ref e)) => match e.name().as_ref() {
                    b"border" if in_borders => styles.borders.push(BorderDef::default()),
                    b"fill" if in_fills => styles.fills.push(None),
                    b"patternFill" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.colorable = pattern_is_colorable(e);
                        }
                    }
                    b"fgColor" => {
                        if let Some(fill) = current_fill.as_mut() {
                            if fill.colorable {
                                fill.color = rgb_attr(e);
                            }
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        styles.cell_xf_border_ids.push(xf_id_attr(e, b"borderId"));
                        styles.cell_xf_fill_ids.push(xf_id_attr(e, b"fillId"));
                    }
                    name => {
                        if let Some(def) = current_border.as_mut() {
                            apply_edge(def, name, edge_is_visible(e));
                        }
                    }
                },
                Ok(quick_xml::events::Event::End(ref e)) => match e.name().as_ref() {
                    b"borders" => in_borders = false,
                    b"fills" => in_fills = false,
                    b"cellXfs" => in_cell_xfs = false,
                    b"border" => {
                        if let Some(def) = current_border.take() {
                            styles.borders.push(def);
                        }
                    }
                    b"fill" => {
                        if let Some(fill) = current_fill.take() {
                            styles.fills.push(fill.color);
                        }
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(_) => break,
                _ => {}
            }
            buf.clear();
        }

        styles
    }

    /// Resolve a cell's `s=` style index to its border definition.
    pub fn border_for_style_index(&self, style_index: usize) -> Option<&BorderDef> {
        let border_id = self.cell_xf_border_ids.get(style_index)?;
        self.borders.get(*border_id)
    }

    /// Resolve a cell's `s=` style index to its fill color ("#RRGGBB").
    pub fn fill_for_style_index(&self, style_index: usize) -> Option<String> {
        let fill_id = self.cell_xf_fill_ids.get(style_index)?;
        self.fills.get(*fill_id)?.clone()
    }

    /// Number of parsed border definitions.
    pub fn border_count(&self) -> usize {
        self.borders.len()
    }

    /// Number of parsed fill definitions.
    pub fn fill_count(&self) -> usize {
        self.fills.len()
    }
}

fn apply_edge(def: &mut BorderDef, name: &[u8], visible: bool) {
    match name {
        b"left" => def.left = visible,
        b"right" => def.right = visible,
        b"top" => def.top = visible,
        b"bottom" => def.bottom = visible,
        b"vertical" => def.vertical = visible,
        b"horizontal" => def.horizontal = visible,
        _ => {}
    }
}

fn xf_id_attr(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> usize {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            if let Ok(id) = String::from_utf8_lossy(&attr.value).parse() {
                return id;
            }
        }
    }
    0
}

/// An edge element is visible when it has a style attribute other than
/// "none".
fn edge_is_visible(e: &quick_xml::events::BytesStart<'_>) -> bool {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"style" {
            let style = String::from_utf8_lossy(&attr.value);
            return !style.is_empty() && style != "none";
        }
    }
    false
}

/// A pattern fill contributes a color when its type is present and not
/// "none". The "gray125" default pattern stays colorable but carries no RGB
/// foreground, so it still resolves to no color.
fn pattern_is_colorable(e: &quick_xml::events::BytesStart<'_>) -> bool {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"patternType" {
            let pattern = String::from_utf8_lossy(&attr.value);
            return !pattern.is_empty() && pattern != "none";
        }
    }
    false
}

/// The rgb attribute as "#RRGGBB". ARGB values drop the alpha channel;
/// indexed and theme colors resolve to None.
fn rgb_attr(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"rgb" {
            let raw = String::from_utf8_lossy(&attr.value).to_uppercase();
            let rgb = match raw.len() {
                8 => &raw[2..],
                6 => &raw[..],
                _ => return None,
            };
            if rgb.chars().all(|c| c.is_ascii_hexdigit()) {
                return Some(format!("#{}", rgb));
            }
            return None;
        }
    }
    None
}
