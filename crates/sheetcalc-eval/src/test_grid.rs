//! In-memory `CellContext` used by the test suites.

use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use sheetcalc_common::Value;

use crate::context::CellContext;
use crate::reference::{Notation, parse_reference};

/// A deterministic worksheet: sparse cells, frozen clock, seeded entropy.
pub struct TestGrid {
    cells: FxHashMap<(u32, u32), Value>,
    current: Option<(u32, u32)>,
    now: f64,
    rng: Mutex<SmallRng>,
}

impl Default for TestGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl TestGrid {
    pub fn new() -> Self {
        Self {
            cells: FxHashMap::default(),
            current: None,
            // 2024-01-01 12:00, an arbitrary frozen instant.
            now: 45_292.5,
            rng: Mutex::new(SmallRng::seed_from_u64(0x5EED)),
        }
    }

    pub fn set(&mut self, row: u32, col: u32, value: Value) -> &mut Self {
        self.cells.insert((row, col), value);
        self
    }

    /// Set a cell by A1 address; panics on malformed input (test-only API).
    pub fn set_a1(&mut self, addr: &str, value: Value) -> &mut Self {
        let r = parse_reference(addr, Notation::A1, None).expect("valid A1 address");
        self.set(r.row, r.col, value)
    }

    pub fn with_current_cell(mut self, row: u32, col: u32) -> Self {
        self.current = Some((row, col));
        self
    }

    pub fn with_now(mut self, serial: f64) -> Self {
        self.now = serial;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(SmallRng::seed_from_u64(seed));
        self
    }
}

impl CellContext for TestGrid {
    fn read(&self, row: u32, col: u32) -> Value {
        self.cells.get(&(row, col)).cloned().unwrap_or(Value::Empty)
    }

    fn current_cell(&self) -> Option<(u32, u32)> {
        self.current
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn entropy(&self) -> f64 {
        self.rng.lock().unwrap().r#gen::<f64>()
    }
}
