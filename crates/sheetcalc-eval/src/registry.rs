//! Case-insensitive function name → implementation table.
//!
//! The registry is built once (all builtins registered) and immutable
//! afterwards; `lookup` is O(1) on the uppercased name. Unknown names are
//! the compiler layer's `#NAME?` — the registry just returns `None`.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use sheetcalc_common::Value;

use crate::builtins;
use crate::context::CellContext;
use crate::function::FunctionDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(u16);

#[derive(Default)]
pub struct Registry {
    defs: Vec<FunctionDef>,
    by_name: FxHashMap<String, FunctionId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function. Duplicate names are a programming error.
    pub fn insert(&mut self, def: FunctionDef) {
        let key = def.name.to_uppercase();
        let id = FunctionId(self.defs.len() as u16);
        let prev = self.by_name.insert(key, id);
        debug_assert!(prev.is_none(), "duplicate function name {}", def.name);
        self.defs.push(def);
    }

    pub fn lookup(&self, name: &str) -> Option<FunctionId> {
        self.by_name.get(&name.to_uppercase()).copied()
    }

    pub fn get(&self, id: FunctionId) -> &FunctionDef {
        &self.defs[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.defs.iter().map(|d| d.name)
    }

    /// The process-wide registry with every builtin loaded.
    pub fn global() -> &'static Registry {
        static REG: Lazy<Registry> = Lazy::new(|| {
            let mut reg = Registry::new();
            builtins::load_builtins(&mut reg);
            reg
        });
        &REG
    }
}

/// Convenience: look a name up in the global registry.
pub fn lookup(name: &str) -> Option<FunctionId> {
    Registry::global().lookup(name)
}

/// Convenience used throughout the test suites: execute a builtin by name.
/// Panics on unknown names (the compiler layer owns `#NAME?`).
pub fn invoke(name: &str, ctx: &dyn CellContext, args: &[Value]) -> Value {
    let reg = Registry::global();
    let id = reg
        .lookup(name)
        .unwrap_or_else(|| panic!("unknown function {name}"));
    reg.get(id).execute(ctx, args)
}
