//! The classic text functions: slicing, casing, searching, substitution,
//! and the TEXT/VALUE conversions. Positions are 1-based over Unicode
//! scalar values; the byte-indexed variants live in `bytes`.

use sheetcalc_common::{ErrorKind, Value, format_number, parse_invariant_number, serial_to_datetime};

use crate::builtins::utils::{
    int_arg, number_arg, ok_bool, ok_num, ok_text, opt_int_arg, text_arg,
};
use crate::coercion::parse_datetime_text;
use crate::context::CellContext;
use crate::criteria::wildcard_search;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

/// Excel's hard cap on cell text length.
const MAX_TEXT_LEN: usize = 32_767;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("CONCATENATE", 1, None, FnCaps::PURE, concat),
        FunctionDef::new("CONCAT", 1, None, FnCaps::PURE, concat),
        FunctionDef::new("LEFT", 1, Some(2), FnCaps::PURE, left),
        FunctionDef::new("RIGHT", 1, Some(2), FnCaps::PURE, right),
        FunctionDef::new("MID", 3, Some(3), FnCaps::PURE, mid),
        FunctionDef::new("LEN", 1, Some(1), FnCaps::PURE, len),
        FunctionDef::new("TRIM", 1, Some(1), FnCaps::PURE, trim),
        FunctionDef::new("CLEAN", 1, Some(1), FnCaps::PURE, clean),
        FunctionDef::new("UPPER", 1, Some(1), FnCaps::PURE, upper),
        FunctionDef::new("LOWER", 1, Some(1), FnCaps::PURE, lower),
        FunctionDef::new("PROPER", 1, Some(1), FnCaps::PURE, proper),
        FunctionDef::new("EXACT", 2, Some(2), FnCaps::PURE, exact),
        FunctionDef::new("FIND", 2, Some(3), FnCaps::PURE, find),
        FunctionDef::new("SEARCH", 2, Some(3), FnCaps::PURE, search),
        FunctionDef::new("SUBSTITUTE", 3, Some(4), FnCaps::PURE, substitute),
        FunctionDef::new("REPLACE", 4, Some(4), FnCaps::PURE, replace),
        FunctionDef::new("REPT", 2, Some(2), FnCaps::PURE, rept),
        FunctionDef::new("TEXTJOIN", 3, None, FnCaps::PURE, textjoin),
        FunctionDef::new("T", 1, Some(1), FnCaps::PURE, t_fn),
        FunctionDef::new("CHAR", 1, Some(1), FnCaps::PURE, char_fn),
        FunctionDef::new("CODE", 1, Some(1), FnCaps::PURE, code),
        FunctionDef::new("UNICHAR", 1, Some(1), FnCaps::PURE, unichar),
        FunctionDef::new("UNICODE", 1, Some(1), FnCaps::PURE, code),
        FunctionDef::new("VALUE", 1, Some(1), FnCaps::PURE, value_fn),
        FunctionDef::new("TEXT", 2, Some(2), FnCaps::PURE, text_format),
    ] {
        reg.insert(def);
    }
}

fn concat(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let mut out = String::new();
    for v in args {
        out.push_str(&v.as_text()?);
        if out.chars().count() > MAX_TEXT_LEN {
            return Err(ErrorKind::Value);
        }
    }
    ok_text(out)
}

fn left(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let n = opt_int_arg(args, 1, 1)?;
    if n < 0 {
        return Err(ErrorKind::Value);
    }
    ok_text(s.chars().take(n as usize).collect())
}

fn right(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let n = opt_int_arg(args, 1, 1)?;
    if n < 0 {
        return Err(ErrorKind::Value);
    }
    let total = s.chars().count();
    ok_text(s.chars().skip(total.saturating_sub(n as usize)).collect())
}

fn mid(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let start = int_arg(args, 1)?;
    let n = int_arg(args, 2)?;
    if start < 1 || n < 0 {
        return Err(ErrorKind::Value);
    }
    ok_text(s.chars().skip(start as usize - 1).take(n as usize).collect())
}

fn len(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(text_arg(args, 0)?.chars().count() as f64)
}

// Strips ends and collapses interior space runs, like Excel.
fn trim(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.trim_matches(' ').chars() {
        if c == ' ' {
            pending_space = true;
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    ok_text(out)
}

fn clean(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    ok_text(s.chars().filter(|&c| c as u32 >= 32).collect())
}

fn upper(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_text(text_arg(args, 0)?.to_uppercase())
}

fn lower(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_text(text_arg(args, 0)?.to_lowercase())
}

fn proper(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    ok_text(out)
}

fn exact(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(text_arg(args, 0)? == text_arg(args, 1)?)
}

// Case-sensitive, no wildcards.
fn find(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let needle = text_arg(args, 0)?;
    let hay = text_arg(args, 1)?;
    let start = opt_int_arg(args, 2, 1)?;
    let total = hay.chars().count();
    if start < 1 || start as usize > total + 1 {
        return Err(ErrorKind::Value);
    }
    let skip = start as usize - 1;
    let tail: String = hay.chars().skip(skip).collect();
    match tail.find(&needle) {
        Some(byte_pos) => {
            let chars_before = tail[..byte_pos].chars().count();
            ok_num((skip + chars_before + 1) as f64)
        }
        None => Err(ErrorKind::Value),
    }
}

// Case-insensitive with wildcards.
fn search(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let pattern = text_arg(args, 0)?;
    let hay = text_arg(args, 1)?;
    let start = opt_int_arg(args, 2, 1)?;
    let total = hay.chars().count();
    if start < 1 || start as usize > total + 1 {
        return Err(ErrorKind::Value);
    }
    let skip = start as usize - 1;
    let tail: String = hay.chars().skip(skip).collect();
    match wildcard_search(&pattern, &tail) {
        Some(pos) => ok_num((skip + pos + 1) as f64),
        None => Err(ErrorKind::Value),
    }
}

fn substitute(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let old = text_arg(args, 1)?;
    let new = text_arg(args, 2)?;
    if old.is_empty() {
        return ok_text(s);
    }
    match args.get(3) {
        None | Some(Value::Empty) => ok_text(s.replace(&old, &new)),
        Some(v) => {
            let instance = crate::coercion::to_integer(v)?;
            if instance < 1 {
                return Err(ErrorKind::Value);
            }
            let mut seen = 0i64;
            let mut from = 0usize;
            while let Some(pos) = s[from..].find(&old) {
                seen += 1;
                let at = from + pos;
                if seen == instance {
                    let mut out = String::with_capacity(s.len());
                    out.push_str(&s[..at]);
                    out.push_str(&new);
                    out.push_str(&s[at + old.len()..]);
                    return ok_text(out);
                }
                from = at + old.len().max(1);
            }
            ok_text(s)
        }
    }
}

// Character-indexed splice.
fn replace(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let start = int_arg(args, 1)?;
    let count = int_arg(args, 2)?;
    let new = text_arg(args, 3)?;
    if start < 1 || count < 0 {
        return Err(ErrorKind::Value);
    }
    let skip = start as usize - 1;
    let mut out: String = s.chars().take(skip).collect();
    out.push_str(&new);
    out.extend(s.chars().skip(skip + count as usize));
    ok_text(out)
}

fn rept(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    let n = int_arg(args, 1)?;
    if n < 0 {
        return Err(ErrorKind::Value);
    }
    if s.chars().count().saturating_mul(n as usize) > MAX_TEXT_LEN {
        return Err(ErrorKind::Value);
    }
    ok_text(s.repeat(n as usize))
}

// TEXTJOIN(delimiter, ignore_empty, text…)
fn textjoin(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let delim = text_arg(args, 0)?;
    let ignore_empty = crate::coercion::to_boolean_lenient(&args[1])?;
    let mut pieces = Vec::with_capacity(args.len() - 2);
    for v in &args[2..] {
        let s = v.as_text()?;
        if ignore_empty && s.is_empty() {
            continue;
        }
        pieces.push(s);
    }
    let out = pieces.join(&delim);
    if out.chars().count() > MAX_TEXT_LEN {
        return Err(ErrorKind::Value);
    }
    ok_text(out)
}

fn t_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(match &args[0] {
        Value::Text(s) => Value::text(s.clone()),
        _ => Value::text(""),
    })
}

fn char_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = int_arg(args, 0)?;
    if !(1..=255).contains(&n) {
        return Err(ErrorKind::Value);
    }
    let c = char::from_u32(n as u32).ok_or(ErrorKind::Value)?;
    ok_text(c.to_string())
}

fn unichar(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = int_arg(args, 0)?;
    if n < 1 {
        return Err(ErrorKind::Value);
    }
    let c = u32::try_from(n)
        .ok()
        .and_then(char::from_u32)
        .ok_or(ErrorKind::Value)?;
    ok_text(c.to_string())
}

fn code(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = text_arg(args, 0)?;
    match s.chars().next() {
        Some(c) => ok_num(c as u32 as f64),
        None => Err(ErrorKind::Value),
    }
}

// Numeric text, or date/time text, to a number.
fn value_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    match &args[0] {
        Value::Number(n) => ok_num(*n),
        Value::Empty => ok_num(0.0),
        Value::Text(s) => {
            if let Some(n) = parse_invariant_number(s) {
                return ok_num(n);
            }
            if let Some(stripped) = s.trim().strip_suffix('%') {
                if let Some(n) = parse_invariant_number(stripped) {
                    return ok_num(n / 100.0);
                }
            }
            parse_datetime_text(s).map(Value::Number).ok_or(ErrorKind::Value)
        }
        _ => Err(ErrorKind::Value),
    }
}

/* ───────────────────────── TEXT formatting ───────────────────────── */

fn text_format(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let fmt = text_arg(args, 1)?;
    // Text passes through untouched; only numbers are formatted.
    if let Value::Text(s) = &args[0] {
        if parse_invariant_number(s).is_none() {
            return ok_text(s.clone());
        }
    }
    let n = number_arg(args, 0)?;
    if fmt.eq_ignore_ascii_case("general") || fmt.is_empty() {
        return ok_text(format_number(n));
    }
    if is_date_format(&fmt) {
        return ok_text(format_date(n, &fmt)?);
    }
    ok_text(format_numeric(n, &fmt))
}

fn is_date_format(fmt: &str) -> bool {
    let lower = fmt.to_ascii_lowercase();
    lower.contains('y') || lower.contains('d') || lower.contains('h') || lower.contains('s')
        || (lower.contains('m') && !lower.contains('#') && !lower.contains('0'))
}

/// Numeric picture formats: optional thousands comma, 0/# digit slots,
/// trailing percent.
fn format_numeric(n: f64, fmt: &str) -> String {
    let percent = fmt.contains('%');
    let grouping = fmt.contains(',');
    let scaled = if percent { n * 100.0 } else { n };

    let decimals = fmt
        .split('.')
        .nth(1)
        .map(|tail| tail.chars().take_while(|&c| c == '0' || c == '#').count())
        .unwrap_or(0);

    let mut body = format!("{:.*}", decimals, scaled.abs());
    if grouping {
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i.to_string(), Some(f.to_string())),
            None => (body.clone(), None),
        };
        let mut grouped = String::new();
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        body = match frac_part {
            Some(f) => format!("{grouped}.{f}"),
            None => grouped,
        };
    }
    let sign = if scaled < 0.0 { "-" } else { "" };
    let suffix = if percent { "%" } else { "" };
    format!("{sign}{body}{suffix}")
}

/// Serial → formatted date text for the common y/m/d h:mm:ss pictures.
fn format_date(serial: f64, fmt: &str) -> Result<String, ErrorKind> {
    use chrono::{Datelike, Timelike};
    let dt = serial_to_datetime(serial).ok_or(ErrorKind::Value)?;
    let twelve_hour = fmt.to_ascii_uppercase().contains("AM/PM");
    let mut out = String::new();
    let chars: Vec<char> = fmt.chars().collect();
    let mut i = 0;
    let mut seen_hour = false;
    while i < chars.len() {
        let c = chars[i].to_ascii_lowercase();
        let run = chars[i..]
            .iter()
            .take_while(|ch| ch.to_ascii_lowercase() == c)
            .count();
        match c {
            'y' => {
                if run >= 4 {
                    out.push_str(&format!("{:04}", dt.year()));
                } else {
                    out.push_str(&format!("{:02}", dt.year() % 100));
                }
            }
            'm' => {
                // Minutes when an hour token came first, months otherwise.
                let v = if seen_hour { dt.minute() } else { dt.month() };
                if run >= 2 {
                    out.push_str(&format!("{v:02}"));
                } else {
                    out.push_str(&v.to_string());
                }
            }
            'd' => {
                if run >= 2 {
                    out.push_str(&format!("{:02}", dt.day()));
                } else {
                    out.push_str(&dt.day().to_string());
                }
            }
            'h' => {
                seen_hour = true;
                let h = if twelve_hour {
                    let h12 = dt.hour() % 12;
                    if h12 == 0 { 12 } else { h12 }
                } else {
                    dt.hour()
                };
                if run >= 2 {
                    out.push_str(&format!("{h:02}"));
                } else {
                    out.push_str(&h.to_string());
                }
            }
            's' => {
                if run >= 2 {
                    out.push_str(&format!("{:02}", dt.second()));
                } else {
                    out.push_str(&dt.second().to_string());
                }
            }
            'a' if chars[i..].len() >= 5
                && chars[i..i + 5]
                    .iter()
                    .collect::<String>()
                    .eq_ignore_ascii_case("am/pm") =>
            {
                out.push_str(if dt.hour() < 12 { "AM" } else { "PM" });
                i += 5;
                continue;
            }
            other => {
                for _ in 0..run {
                    out.push(other);
                }
            }
        }
        i += run;
    }
    Ok(out)
}
