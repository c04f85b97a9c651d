//! The capability set a worksheet hands to the function library.
//!
//! The context is read-only from the core's side: cell reads never fail
//! (unset cells are `Empty`), the clock and entropy source are fixed at
//! construction, and no function touches ambient process state.

use sheetcalc_common::Value;

/// Excel legacy grid height.
pub const MAX_ROW: u32 = 1_048_576;
/// Excel legacy grid width (column XFD).
pub const MAX_COL: u32 = 16_384;

pub trait CellContext: Send + Sync {
    /// Value at (row, col), both 1-based. `Empty` for unset cells.
    fn read(&self, row: u32, col: u32) -> Value;

    /// The cell the formula under evaluation lives in, if known. Used by
    /// ROW/COLUMN without arguments and relative R1C1 in INDIRECT.
    fn current_cell(&self) -> Option<(u32, u32)>;

    /// Current date-time as a serial. Implementations may freeze this for
    /// deterministic tests.
    fn now(&self) -> f64;

    /// Uniform sample in [0, 1). Concurrent-call safety is the provider's
    /// discipline.
    fn entropy(&self) -> f64;

    fn worksheet_bounds(&self) -> (u32, u32) {
        (MAX_ROW, MAX_COL)
    }

    /// True when (row, col) addresses a cell inside the worksheet.
    fn in_bounds(&self, row: u32, col: u32) -> bool {
        let (max_row, max_col) = self.worksheet_bounds();
        (1..=max_row).contains(&row) && (1..=max_col).contains(&col)
    }
}
