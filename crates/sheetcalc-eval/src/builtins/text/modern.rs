//! Modern text functions: TEXTBEFORE/TEXTAFTER with instance and match
//! modes, TEXTSPLIT's full array core, and the VALUETOTEXT/ARRAYTOTEXT
//! renderers.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{ok_text, opt_int_arg, text_arg};
use crate::coercion::to_integer;
use crate::context::CellContext;
use crate::criteria::fold_case;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;
use crate::shape::{ArrayResult, Shape};

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("TEXTBEFORE", 2, Some(6), FnCaps::PURE, textbefore),
        FunctionDef::new("TEXTAFTER", 2, Some(6), FnCaps::PURE, textafter),
        FunctionDef::new("TEXTSPLIT", 2, Some(3), FnCaps::PURE | FnCaps::ARRAY, textsplit_fn),
        FunctionDef::new("VALUETOTEXT", 1, Some(2), FnCaps::ERROR_AWARE, valuetotext),
        FunctionDef::new("ARRAYTOTEXT", 1, None, FnCaps::ERROR_AWARE, arraytotext),
    ] {
        reg.insert(def);
    }
}

/// Byte offsets of every delimiter occurrence, with optional case folding.
fn occurrences(text: &str, delim: &str, fold: bool) -> Vec<usize> {
    if delim.is_empty() {
        return Vec::new();
    }
    if !fold {
        return text.match_indices(delim).map(|(i, _)| i).collect();
    }
    // Case-folded scan over char windows, mapped back to byte offsets.
    let dchars: Vec<char> = delim.chars().collect();
    let tchars: Vec<(usize, char)> = text.char_indices().collect();
    let mut hits = Vec::new();
    'outer: for start in 0..tchars.len() {
        if start + dchars.len() > tchars.len() {
            break;
        }
        for (k, dc) in dchars.iter().enumerate() {
            let tc = tchars[start + k].1;
            if fold_case(&tc.to_string()) != fold_case(&dc.to_string()) {
                continue 'outer;
            }
        }
        hits.push(tchars[start].0);
    }
    hits
}

struct BeforeAfterArgs {
    text: String,
    delim: String,
    instance: i64,
    fold: bool,
    match_end: bool,
    if_not_found: Option<Value>,
}

fn before_after_args(args: &[Value]) -> Result<BeforeAfterArgs, ErrorKind> {
    let text = text_arg(args, 0)?;
    let delim = text_arg(args, 1)?;
    if delim.is_empty() {
        return Err(ErrorKind::Value);
    }
    let instance = opt_int_arg(args, 2, 1)?;
    if instance == 0 {
        return Err(ErrorKind::Value);
    }
    let match_mode = opt_int_arg(args, 3, 0)?;
    let match_end = opt_int_arg(args, 4, 0)? != 0;
    Ok(BeforeAfterArgs {
        text,
        delim,
        instance,
        fold: match_mode != 0,
        match_end,
        if_not_found: args.get(5).cloned(),
    })
}

/// Resolve the byte offset of the selected delimiter occurrence.
/// `Ok(None)` means the virtual end-of-text delimiter was selected.
fn select_occurrence(a: &BeforeAfterArgs) -> Result<Option<usize>, ErrorKind> {
    let mut hits = occurrences(&a.text, &a.delim, a.fold);
    let virtual_end = a.match_end;
    let count = hits.len() as i64 + i64::from(virtual_end);
    let idx = if a.instance > 0 { a.instance - 1 } else { count + a.instance };
    if idx < 0 || idx >= count {
        return Err(ErrorKind::Na);
    }
    if idx as usize == hits.len() {
        return Ok(None);
    }
    Ok(Some(hits.remove(idx as usize)))
}

fn textbefore(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let a = before_after_args(args)?;
    match select_occurrence(&a) {
        Ok(Some(at)) => ok_text(a.text[..at].to_string()),
        Ok(None) => ok_text(a.text.clone()),
        Err(ErrorKind::Na) => a.if_not_found.clone().ok_or(ErrorKind::Na),
        Err(e) => Err(e),
    }
}

fn textafter(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let a = before_after_args(args)?;
    match select_occurrence(&a) {
        Ok(Some(at)) => ok_text(a.text[at + a.delim.len()..].to_string()),
        Ok(None) => ok_text(String::new()),
        Err(ErrorKind::Na) => a.if_not_found.clone().ok_or(ErrorKind::Na),
        Err(e) => Err(e),
    }
}

/// Full TEXTSPLIT: column delimiter within rows, optional row delimiter
/// between them. Rows are padded to the widest with `#N/A`, Excel style.
pub fn textsplit(text: &str, col_delim: &str, row_delim: Option<&str>) -> Result<ArrayResult, ErrorKind> {
    if col_delim.is_empty() || row_delim.is_some_and(str::is_empty) {
        return Err(ErrorKind::Value);
    }
    let rows: Vec<&str> = match row_delim {
        Some(rd) => text.split(rd).collect(),
        None => vec![text],
    };
    let split_rows: Vec<Vec<&str>> = rows.iter().map(|r| r.split(col_delim).collect()).collect();
    let width = split_rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut values = Vec::with_capacity(split_rows.len() * width);
    for row in &split_rows {
        for c in 0..width {
            values.push(match row.get(c) {
                Some(piece) => Value::text(*piece),
                None => Value::Error(ErrorKind::Na),
            });
        }
    }
    Ok(ArrayResult::new(values, Shape::new(split_rows.len(), width)))
}

fn textsplit_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let text = text_arg(args, 0)?;
    let col_delim = text_arg(args, 1)?;
    let row_delim = match args.get(2) {
        None | Some(Value::Empty) => None,
        Some(v) => Some(v.as_text()?),
    };
    Ok(textsplit(&text, &col_delim, row_delim.as_deref())?.anchor())
}

/// Render a single value; format 1 quotes text and keeps the canonical
/// error strings.
fn render_value(v: &Value, concise: bool) -> String {
    match v {
        Value::Text(s) if !concise => format!("\"{s}\""),
        other => other.to_string(),
    }
}

fn valuetotext(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let format = match args.get(1) {
        None | Some(Value::Empty) => 0,
        Some(v) => to_integer(v)?,
    };
    if !(0..=1).contains(&format) {
        return Err(ErrorKind::Value);
    }
    ok_text(render_value(&args[0], format == 0))
}

// Flat convention: every argument is an element of the array.
fn arraytotext(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rendered: Vec<String> = args.iter().map(|v| render_value(v, true)).collect();
    ok_text(rendered.join(", "))
}
