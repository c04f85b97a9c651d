//! Byte-indexed text functions (LENB, LEFTB, …) over the UTF-8 encoding
//! of the text. Indices are 1-based; slices that land inside a multi-byte
//! scalar snap to the nearest boundary that keeps the result valid UTF-8.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{int_arg, ok_num, ok_text, opt_int_arg, text_arg};
use crate::context::CellContext;
use crate::criteria::wildcard_search;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("LENB", 1, Some(1), FnCaps::PURE, lenb),
        FunctionDef::new("LEFTB", 1, Some(2), FnCaps::PURE, leftb),
        FunctionDef::new("RIGHTB", 1, Some(2), FnCaps::PURE, rightb),
        FunctionDef::new("MIDB", 3, Some(3), FnCaps::PURE, midb),
        FunctionDef::new("FINDB", 2, Some(3), FnCaps::PURE, findb),
        FunctionDef::new("SEARCHB", 2, Some(3), FnCaps::PURE, searchb),
        FunctionDef::new("REPLACEB", 4, Some(4), FnCaps::PURE, replaceb),
    ] {
        reg.insert(def);
    }
}

fn floor_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

fn lenb(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(text_arg(args, 0)?.len() as f64)
}

fn leftb(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let n = opt_int_arg(args, 1, 1)?;
    if n < 0 {
        return Err(ErrorKind::Value);
    }
    let end = floor_boundary(&s, n as usize);
    ok_text(s[..end].to_string())
}

fn rightb(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let n = opt_int_arg(args, 1, 1)?;
    if n < 0 {
        return Err(ErrorKind::Value);
    }
    let start = ceil_boundary(&s, s.len().saturating_sub(n as usize));
    ok_text(s[start..].to_string())
}

fn midb(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let start = int_arg(args, 1)?;
    let count = int_arg(args, 2)?;
    if start < 1 || count < 0 {
        return Err(ErrorKind::Value);
    }
    let lo = ceil_boundary(&s, start as usize - 1);
    let hi = floor_boundary(&s, (start as usize - 1).saturating_add(count as usize));
    if hi <= lo {
        return ok_text(String::new());
    }
    ok_text(s[lo..hi].to_string())
}

// Byte position of a case-sensitive match, 1-based.
fn findb(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let needle = text_arg(args, 0)?;
    let hay = text_arg(args, 1)?;
    let start = opt_int_arg(args, 2, 1)?;
    if start < 1 || start as usize > hay.len() + 1 {
        return Err(ErrorKind::Value);
    }
    let from = ceil_boundary(&hay, start as usize - 1);
    match hay[from..].find(&needle) {
        Some(pos) => ok_num((from + pos + 1) as f64),
        None => Err(ErrorKind::Value),
    }
}

// Byte position of a case-folded wildcard match, 1-based.
fn searchb(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let pattern = text_arg(args, 0)?;
    let hay = text_arg(args, 1)?;
    let start = opt_int_arg(args, 2, 1)?;
    if start < 1 || start as usize > hay.len() + 1 {
        return Err(ErrorKind::Value);
    }
    let from = ceil_boundary(&hay, start as usize - 1);
    let tail = &hay[from..];
    let char_pos = wildcard_search(&pattern, tail).ok_or(ErrorKind::Value)?;
    let byte_pos: usize = tail
        .char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(tail.len());
    ok_num((from + byte_pos + 1) as f64)
}

fn replaceb(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let start = int_arg(args, 1)?;
    let count = int_arg(args, 2)?;
    let new = text_arg(args, 3)?;
    if start < 1 || count < 0 {
        return Err(ErrorKind::Value);
    }
    let lo = floor_boundary(&s, start as usize - 1);
    let hi = ceil_boundary(&s, (start as usize - 1).saturating_add(count as usize));
    let mut out = String::with_capacity(s.len() + new.len());
    out.push_str(&s[..lo]);
    out.push_str(&new);
    out.push_str(&s[hi..]);
    ok_text(out)
}
