//! A1 / R1C1 reference parsing and ADDRESS formatting.
//!
//! Both notations normalize to a 1-based `(row, col)` with anchor flags and
//! an optional sheet qualifier. Sheet names may be single-quoted with
//! embedded quotes doubled. Out-of-range rows/columns are `#REF!`.

use sheetcalc_common::ErrorKind;

use crate::context::{MAX_COL, MAX_ROW};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    A1,
    R1C1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRef {
    pub row: u32,
    pub col: u32,
    pub row_abs: bool,
    pub col_abs: bool,
    pub sheet: Option<String>,
}

/// Parse a reference in either notation. Relative R1C1 components need a
/// current cell; without one the parse is `#REF!`.
pub fn parse_reference(
    text: &str,
    notation: Notation,
    current: Option<(u32, u32)>,
) -> Result<ParsedRef, ErrorKind> {
    match notation {
        Notation::A1 => parse_a1(text),
        Notation::R1C1 => parse_r1c1(text, current),
    }
}

/* ───────────────────────── sheet qualifier ───────────────────────── */

fn split_sheet(text: &str) -> Result<(Option<String>, &str), ErrorKind> {
    let t = text.trim();
    if let Some(rest) = t.strip_prefix('\'') {
        // Quoted sheet name; embedded quotes are doubled.
        let mut name = String::new();
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if matches!(chars.peek(), Some((_, '\''))) {
                    chars.next();
                    name.push('\'');
                } else {
                    let tail = &rest[i + 1..];
                    let cell = tail.strip_prefix('!').ok_or(ErrorKind::Ref)?;
                    return Ok((Some(name), cell));
                }
            } else {
                name.push(c);
            }
        }
        Err(ErrorKind::Ref)
    } else if let Some(bang) = t.find('!') {
        let (name, cell) = t.split_at(bang);
        if name.is_empty() {
            return Err(ErrorKind::Ref);
        }
        Ok((Some(name.to_string()), &cell[1..]))
    } else {
        Ok((None, t))
    }
}

/* ───────────────────────── column letters ───────────────────────── */

/// 1-based column index → Excel letters (1 ⇒ A, 27 ⇒ AA, 16384 ⇒ XFD).
pub fn col_to_letters(col: u32) -> String {
    let mut n = col;
    let mut buf = Vec::new();
    while n > 0 {
        n -= 1;
        buf.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

/// Excel letters → 1-based column index. `None` for non-letters or
/// anything past XFD's width.
pub fn letters_to_col(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for c in s.bytes() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col * 26 + (c - b'A' + 1) as u32;
    }
    Some(col)
}

/* ───────────────────────── A1 ───────────────────────── */

pub fn parse_a1(text: &str) -> Result<ParsedRef, ErrorKind> {
    let (sheet, cell) = split_sheet(text)?;
    let bytes = cell.as_bytes();
    let mut i = 0;

    let col_abs = bytes.first() == Some(&b'$');
    if col_abs {
        i += 1;
    }
    let letters_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    let letters = &cell[letters_start..i];
    if letters.is_empty() {
        return Err(ErrorKind::Ref);
    }

    let row_abs = bytes.get(i) == Some(&b'$');
    if row_abs {
        i += 1;
    }
    let digits = &cell[i..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0') {
        return Err(ErrorKind::Ref);
    }

    let col = letters_to_col(&letters.to_ascii_uppercase()).ok_or(ErrorKind::Ref)?;
    let row: u32 = digits.parse().map_err(|_| ErrorKind::Ref)?;
    if col > MAX_COL || row > MAX_ROW {
        return Err(ErrorKind::Ref);
    }
    Ok(ParsedRef { row, col, row_abs, col_abs, sheet })
}

/* ───────────────────────── R1C1 ───────────────────────── */

enum R1c1Part {
    Same,
    Absolute(i64),
    Relative(i64),
}

fn parse_r1c1_part(s: &str) -> Result<R1c1Part, ErrorKind> {
    if s.is_empty() {
        return Ok(R1c1Part::Same);
    }
    if let Some(inner) = s.strip_prefix('[') {
        let inner = inner.strip_suffix(']').ok_or(ErrorKind::Ref)?;
        let n: i64 = inner.parse().map_err(|_| ErrorKind::Ref)?;
        return Ok(R1c1Part::Relative(n));
    }
    let n: i64 = s.parse().map_err(|_| ErrorKind::Ref)?;
    if n < 1 {
        return Err(ErrorKind::Ref);
    }
    Ok(R1c1Part::Absolute(n))
}

fn resolve_part(part: R1c1Part, current: Option<u32>, max: u32) -> Result<(u32, bool), ErrorKind> {
    let (idx, abs) = match part {
        R1c1Part::Absolute(n) => (n, true),
        R1c1Part::Same => (current.ok_or(ErrorKind::Ref)? as i64, false),
        R1c1Part::Relative(d) => (current.ok_or(ErrorKind::Ref)? as i64 + d, false),
    };
    if idx < 1 || idx > max as i64 {
        return Err(ErrorKind::Ref);
    }
    Ok((idx as u32, abs))
}

pub fn parse_r1c1(text: &str, current: Option<(u32, u32)>) -> Result<ParsedRef, ErrorKind> {
    let (sheet, cell) = split_sheet(text)?;
    let upper = cell.to_ascii_uppercase();
    let rest = upper.strip_prefix('R').ok_or(ErrorKind::Ref)?;
    // Split at the column marker; `[` guards against a C inside brackets,
    // which cannot occur since offsets are numeric.
    let c_pos = rest.find('C').ok_or(ErrorKind::Ref)?;
    let (row_part, col_part) = (&rest[..c_pos], &rest[c_pos + 1..]);

    let (row, row_abs) = resolve_part(
        parse_r1c1_part(row_part)?,
        current.map(|(r, _)| r),
        MAX_ROW,
    )?;
    let (col, col_abs) = resolve_part(
        parse_r1c1_part(col_part)?,
        current.map(|(_, c)| c),
        MAX_COL,
    )?;
    Ok(ParsedRef { row, col, row_abs, col_abs, sheet })
}

/* ───────────────────────── ADDRESS ───────────────────────── */

fn sheet_needs_quoting(name: &str) -> bool {
    name.is_empty()
        || name.chars().next().is_some_and(|c| c.is_ascii_digit())
        || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

fn quote_sheet(name: &str) -> String {
    if sheet_needs_quoting(name) {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

/// Format an address string the way ADDRESS does. `abs_num` 1–4 selects
/// `$C$R`, `C$R`, `$CR`, `CR`; out-of-domain components are `#VALUE!`.
pub fn format_address(
    row: u32,
    col: u32,
    abs_num: u8,
    a1: bool,
    sheet: Option<&str>,
) -> Result<String, ErrorKind> {
    if !(1..=4).contains(&abs_num) || row < 1 || row > MAX_ROW || col < 1 || col > MAX_COL {
        return Err(ErrorKind::Value);
    }
    let (col_abs, row_abs) = match abs_num {
        1 => (true, true),
        2 => (false, true),
        3 => (true, false),
        _ => (false, false),
    };

    let body = if a1 {
        format!(
            "{}{}{}{}",
            if col_abs { "$" } else { "" },
            col_to_letters(col),
            if row_abs { "$" } else { "" },
            row
        )
    } else {
        let r = if row_abs { format!("R{row}") } else { format!("R[{row}]") };
        let c = if col_abs { format!("C{col}") } else { format!("C[{col}]") };
        format!("{r}{c}")
    };

    Ok(match sheet {
        Some(name) => format!("{}!{}", quote_sheet(name), body),
        None => body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_basics() {
        let r = parse_a1("B7").unwrap();
        assert_eq!((r.row, r.col, r.row_abs, r.col_abs), (7, 2, false, false));
        let r = parse_a1("$AB$8").unwrap();
        assert_eq!((r.row, r.col, r.row_abs, r.col_abs), (8, 28, true, true));
        let r = parse_a1("xfd1048576").unwrap();
        assert_eq!((r.row, r.col), (1_048_576, 16_384));

        assert_eq!(parse_a1("XFE1"), Err(ErrorKind::Ref));
        assert_eq!(parse_a1("A0"), Err(ErrorKind::Ref));
        assert_eq!(parse_a1("A01"), Err(ErrorKind::Ref));
        assert_eq!(parse_a1("A1048577"), Err(ErrorKind::Ref));
        assert_eq!(parse_a1("7B"), Err(ErrorKind::Ref));
        assert_eq!(parse_a1(""), Err(ErrorKind::Ref));
    }

    #[test]
    fn a1_sheets() {
        let r = parse_a1("Data!C3").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Data"));
        let r = parse_a1("'My Sheet'!$C$2").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("My Sheet"));
        assert_eq!((r.row, r.col), (2, 3));
        let r = parse_a1("'O''Brien'!A1").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("O'Brien"));
        assert_eq!(parse_a1("'Unterminated!A1"), Err(ErrorKind::Ref));
        assert_eq!(parse_a1("!A1"), Err(ErrorKind::Ref));
    }

    #[test]
    fn r1c1_absolute_and_relative() {
        let r = parse_r1c1("R3C5", None).unwrap();
        assert_eq!((r.row, r.col, r.row_abs, r.col_abs), (3, 5, true, true));

        let r = parse_r1c1("R[-1]C[-1]", Some((3, 3))).unwrap();
        assert_eq!((r.row, r.col, r.row_abs, r.col_abs), (2, 2, false, false));

        let r = parse_r1c1("RC[2]", Some((4, 1))).unwrap();
        assert_eq!((r.row, r.col), (4, 3));

        assert_eq!(parse_r1c1("R[-1]C", None), Err(ErrorKind::Ref));
        assert_eq!(parse_r1c1("R[-5]C", Some((3, 3))), Err(ErrorKind::Ref));
        assert_eq!(parse_r1c1("R0C1", None), Err(ErrorKind::Ref));
        assert_eq!(parse_r1c1("RxC1", Some((1, 1))), Err(ErrorKind::Ref));
    }

    #[test]
    fn column_letter_round_trip() {
        for col in [1, 2, 26, 27, 52, 703, 16_384] {
            assert_eq!(letters_to_col(&col_to_letters(col)), Some(col));
        }
        assert_eq!(col_to_letters(16_384), "XFD");
        assert_eq!(letters_to_col("A"), Some(1));
        assert_eq!(letters_to_col(""), None);
        assert_eq!(letters_to_col("ABCD"), None);
    }

    #[test]
    fn address_formats() {
        assert_eq!(format_address(2, 3, 1, true, None).unwrap(), "$C$2");
        assert_eq!(format_address(2, 3, 2, true, None).unwrap(), "C$2");
        assert_eq!(format_address(2, 3, 3, true, None).unwrap(), "$C2");
        assert_eq!(format_address(2, 3, 4, true, None).unwrap(), "C2");
        assert_eq!(format_address(2, 3, 1, false, None).unwrap(), "R2C3");
        assert_eq!(format_address(2, 3, 4, false, None).unwrap(), "R[2]C[3]");
        assert_eq!(
            format_address(2, 3, 1, true, Some("My Sheet")).unwrap(),
            "'My Sheet'!$C$2"
        );
        assert_eq!(
            format_address(1, 1, 1, true, Some("Data")).unwrap(),
            "Data!$A$1"
        );
        assert_eq!(format_address(2, 3, 5, true, None), Err(ErrorKind::Value));
        assert_eq!(format_address(0, 3, 1, true, None), Err(ErrorKind::Value));
    }
}
