//! Live-automation backend.
//!
//! Drives an already-installed spreadsheet application through an opaque
//! driver. This is the slow path; it handles legacy binary workbooks the
//! structured-file reader cannot, and exposes shapes and charts that are not
//! worth re-parsing from drawing XML.
//!
//! The crate ships no concrete driver. Callers supply an
//! [`AutomationDriver`] implementation (a COM bridge, a test mock); the
//! pipeline only talks to the traits here.

use std::path::Path;

use crate::error::Result;
use crate::model::chart::Chart;
use crate::model::shape::Shape;
use crate::model::workbook::PrintArea;

/// Line style sentinel the automation API reports for an absent border edge.
pub const LINE_STYLE_NONE: i32 = -4142;

/// Automation border edge indices.
pub const EDGE_LEFT: i32 = 7;
pub const EDGE_TOP: i32 = 8;
pub const EDGE_BOTTOM: i32 = 9;
pub const EDGE_RIGHT: i32 = 10;
pub const INSIDE_VERTICAL: i32 = 11;
pub const INSIDE_HORIZONTAL: i32 = 12;

/// One border edge as reported by the automation API.
///
/// Either property may be unobtainable on a given cell; a missing property
/// never fails the query, it just weakens the visibility test.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BorderEdge {
    pub line_style: Option<i32>,
    pub weight: Option<f64>,
}

impl BorderEdge {
    /// Visible when the line style is present and not the "none" sentinel,
    /// and the weight (when obtainable) is non-zero.
    pub fn is_visible(&self) -> bool {
        match self.line_style {
            Some(style) if style != LINE_STYLE_NONE => match self.weight {
                Some(w) => w != 0.0,
                None => true,
            },
            _ => false,
        }
    }
}

/// The six border edges of one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellBorders {
    pub left: BorderEdge,
    pub top: BorderEdge,
    pub bottom: BorderEdge,
    pub right: BorderEdge,
    pub inside_vertical: BorderEdge,
    pub inside_horizontal: BorderEdge,
}

impl CellBorders {
    pub fn any_visible(&self) -> bool {
        self.left.is_visible()
            || self.top.is_visible()
            || self.bottom.is_visible()
            || self.right.is_visible()
            || self.inside_vertical.is_visible()
            || self.inside_horizontal.is_visible()
    }
}

/// Factory for automation sessions.
pub trait AutomationDriver {
    /// Open a workbook, reusing an already-open session when the application
    /// has the file loaded, otherwise creating an invisible one.
    fn open(&self, path: &Path) -> Result<Box<dyn AutomationSession>>;
}

/// One live workbook session.
///
/// Sheet arguments are tab names. Row and column coordinates are 1-based.
pub trait AutomationSession {
    fn sheet_names(&self) -> Result<Vec<String>>;

    /// (max_row, max_col) of the sheet's used range.
    fn used_range_extents(&self, sheet: &str) -> Result<(u32, u32)>;

    fn cell_value(&self, sheet: &str, row: u32, col: u32) -> Result<String>;

    fn cell_borders(&self, sheet: &str, row: u32, col: u32) -> Result<CellBorders>;

    /// Background fill color of a cell as "#RRGGBB"; None when the cell has
    /// no solid fill.
    fn cell_fill_color(&self, sheet: &str, row: u32, col: u32) -> Result<Option<String>>;

    /// Range addresses of the sheet's formal table annotations.
    fn declared_tables(&self, sheet: &str) -> Result<Vec<String>>;

    fn shapes(&self, sheet: &str) -> Result<Vec<Shape>>;

    fn charts(&self, sheet: &str) -> Result<Vec<Chart>>;

    fn print_areas(&self, sheet: &str) -> Result<Vec<PrintArea>>;

    /// 1-based rows where a horizontal page break starts a new page.
    fn horizontal_page_breaks(&self, sheet: &str) -> Result<Vec<u32>>;

    /// 1-based columns where a vertical page break starts a new page.
    fn vertical_page_breaks(&self, sheet: &str) -> Result<Vec<u32>>;

    /// True when the driver attached to a workbook the user already had open.
    /// Such sessions are left running on teardown.
    fn reused_existing(&self) -> bool;

    /// Release the session. Called at most once.
    fn shutdown(&mut self) -> Result<()>;
}

/// Scopes a session to a borrow, guaranteeing teardown on every exit path.
///
/// Teardown failures are swallowed: a workbook that cannot be closed cleanly
/// must not turn a finished extraction into an error. Sessions that reused an
/// existing workbook are not shut down at all.
pub struct SessionGuard {
    session: Option<Box<dyn AutomationSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn AutomationSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn session(&self) -> &dyn AutomationSession {
        // Invariant: `session` is Some until drop.
        match &self.session {
            Some(s) => s.as_ref(),
            None => unreachable!("session taken before drop"),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            if session.reused_existing() {
                return;
            }
            if let Err(e) = session.shutdown() {
                log::warn!("automation session teardown failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_edge_visibility() {
        let absent = BorderEdge::default();
        assert!(!absent.is_visible());

        let none_sentinel = BorderEdge {
            line_style: Some(LINE_STYLE_NONE),
            weight: Some(2.0),
        };
        assert!(!none_sentinel.is_visible());

        let zero_weight = BorderEdge {
            line_style: Some(1),
            weight: Some(0.0),
        };
        assert!(!zero_weight.is_visible());

        let no_weight = BorderEdge {
            line_style: Some(1),
            weight: None,
        };
        assert!(no_weight.is_visible());

        let visible = BorderEdge {
            line_style: Some(1),
            weight: Some(2.0),
        };
        assert!(visible.is_visible());
    }

    #[test]
    fn test_cell_borders_aggregation() {
        let mut borders = CellBorders::default();
        assert!(!borders.any_visible());

        borders.inside_horizontal = BorderEdge {
            line_style: Some(1),
            weight: Some(1.0),
        };
        assert!(borders.any_visible());
    }

    struct TrackedSession {
        reused: bool,
        shut_down: Rc<Cell<bool>>,
        fail_shutdown: bool,
    }

    impl AutomationSession for TrackedSession {
        fn sheet_names(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }
        fn used_range_extents(&self, _sheet: &str) -> Result<(u32, u32)> {
            Ok((0, 0))
        }
        fn cell_value(&self, _sheet: &str, _row: u32, _col: u32) -> Result<String> {
            Ok(String::new())
        }
        fn cell_borders(&self, _sheet: &str, _row: u32, _col: u32) -> Result<CellBorders> {
            Ok(CellBorders::default())
        }
        fn cell_fill_color(&self, _sheet: &str, _row: u32, _col: u32) -> Result<Option<String>> {
            Ok(None)
        }
        fn declared_tables(&self, _sheet: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        fn shapes(&self, _sheet: &str) -> Result<Vec<Shape>> {
            Ok(vec![])
        }
        fn charts(&self, _sheet: &str) -> Result<Vec<Chart>> {
            Ok(vec![])
        }
        fn print_areas(&self, _sheet: &str) -> Result<Vec<PrintArea>> {
            Ok(vec![])
        }
        fn horizontal_page_breaks(&self, _sheet: &str) -> Result<Vec<u32>> {
            Ok(vec![])
        }
        fn vertical_page_breaks(&self, _sheet: &str) -> Result<Vec<u32>> {
            Ok(vec![])
        }
        fn reused_existing(&self) -> bool {
            self.reused
        }
        fn shutdown(&mut self) -> Result<()> {
            self.shut_down.set(true);
            if self.fail_shutdown {
                return Err(Error::Automation("close failed".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_guard_shuts_down_created_session() {
        let shut_down = Rc::new(Cell::new(false));
        {
            let _guard = SessionGuard::new(Box::new(TrackedSession {
                reused: false,
                shut_down: shut_down.clone(),
                fail_shutdown: false,
            }));
        }
        assert!(shut_down.get());
    }

    #[test]
    fn test_guard_leaves_reused_session_open() {
        let shut_down = Rc::new(Cell::new(false));
        {
            let _guard = SessionGuard::new(Box::new(TrackedSession {
                reused: true,
                shut_down: shut_down.clone(),
                fail_shutdown: false,
            }));
        }
        assert!(!shut_down.get());
    }

    #[test]
    fn test_guard_swallows_teardown_failure() {
        let shut_down = Rc::new(Cell::new(false));
        {
            let _guard = SessionGuard::new(Box::new(TrackedSession {
                reused: false,
                shut_down: shut_down.clone(),
                fail_shutdown: true,
            }));
        }
        // Drop completed without panicking despite the failure.
        assert!(shut_down.get());
    }
}
