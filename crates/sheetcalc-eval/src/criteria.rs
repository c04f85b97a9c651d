//! Criterion parsing and matching for the *IF family, plus the shared
//! wildcard machinery used by SEARCH/SEARCHB and lookup functions.
//!
//! A criterion is a comparison prefix (`=`, `<>`, `<`, `<=`, `>`, `>=`)
//! followed by a literal, or a bare literal meaning equality. Text matching
//! is case-insensitive under Unicode simple case folding; `*` matches any
//! run of code points, `?` exactly one, and `~` escapes the next character.

use sheetcalc_common::{ErrorKind, Value, parse_invariant_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
pub struct Criterion {
    op: CmpOp,
    operand: Value,
}

impl Criterion {
    /// Build a criterion from the user-supplied value. Text is scanned for
    /// a comparison prefix; the remainder is re-typed (number, boolean,
    /// error literal, else text). Non-text values compare for equality.
    pub fn parse(v: &Value) -> Criterion {
        let Value::Text(s) = v else {
            return Criterion { op: CmpOp::Eq, operand: v.clone() };
        };
        let (op, rest) = split_op(s);
        let operand = retype_literal(rest);
        Criterion { op, operand }
    }

    /// Does `candidate` satisfy the criterion? Errors in the candidate
    /// propagate even when the comparison would have excluded the row.
    pub fn matches(&self, candidate: &Value) -> Result<bool, ErrorKind> {
        if let Value::Error(e) = candidate {
            return match &self.operand {
                // An explicit error literal criterion compares by kind.
                Value::Error(want) => Ok(match self.op {
                    CmpOp::Eq => e == want,
                    CmpOp::Ne => e != want,
                    _ => false,
                }),
                _ => Err(*e),
            };
        }

        Ok(match (&self.op, &self.operand) {
            (CmpOp::Eq, Value::Empty) => candidate.is_empty() || is_empty_text(candidate),
            (CmpOp::Ne, Value::Empty) => !(candidate.is_empty() || is_empty_text(candidate)),
            (op, operand) => match compare(candidate, operand) {
                Some(ord) => match op {
                    CmpOp::Eq => ord == 0,
                    CmpOp::Ne => ord != 0,
                    CmpOp::Lt => ord < 0,
                    CmpOp::Le => ord <= 0,
                    CmpOp::Gt => ord > 0,
                    CmpOp::Ge => ord >= 0,
                },
                // Incomparable kinds never match, except that `<>` is
                // satisfied by anything that is not equal.
                None => *op == CmpOp::Ne,
            },
        })
    }
}

fn split_op(s: &str) -> (CmpOp, &str) {
    if let Some(rest) = s.strip_prefix("<>") {
        (CmpOp::Ne, rest)
    } else if let Some(rest) = s.strip_prefix("<=") {
        (CmpOp::Le, rest)
    } else if let Some(rest) = s.strip_prefix(">=") {
        (CmpOp::Ge, rest)
    } else if let Some(rest) = s.strip_prefix('<') {
        (CmpOp::Lt, rest)
    } else if let Some(rest) = s.strip_prefix('>') {
        (CmpOp::Gt, rest)
    } else if let Some(rest) = s.strip_prefix('=') {
        (CmpOp::Eq, rest)
    } else {
        (CmpOp::Eq, s)
    }
}

fn retype_literal(s: &str) -> Value {
    if s.is_empty() {
        return Value::Empty;
    }
    if let Some(n) = parse_invariant_number(s) {
        return Value::Number(n);
    }
    match s.to_ascii_uppercase().as_str() {
        "TRUE" => return Value::Boolean(true),
        "FALSE" => return Value::Boolean(false),
        _ => {}
    }
    if let Some(kind) = ErrorKind::parse(s) {
        return Value::Error(kind);
    }
    Value::Text(s.to_string())
}

fn is_empty_text(v: &Value) -> bool {
    matches!(v, Value::Text(s) if s.is_empty())
}

/// Lenient three-way comparison: numbers (with boolean/numeric-text
/// coercion on the candidate side only when the operand is numeric),
/// case-folded text, booleans. `None` when the kinds are incomparable.
fn compare(candidate: &Value, operand: &Value) -> Option<i32> {
    match operand {
        Value::Number(rhs) => {
            let lhs = match candidate {
                Value::Number(n) => *n,
                Value::Boolean(_) | Value::Empty => return None,
                Value::Text(s) => parse_invariant_number(s)?,
                Value::Error(_) => return None,
            };
            Some(num_ord(lhs, *rhs))
        }
        Value::Text(pat) => match candidate {
            Value::Text(got) => {
                if has_wildcards(pat) {
                    Some(if wildcard_match(pat, got) { 0 } else { 1 })
                } else {
                    let a = fold_case(got);
                    let b = fold_case(pat);
                    Some(match a.cmp(&b) {
                        std::cmp::Ordering::Less => -1,
                        std::cmp::Ordering::Equal => 0,
                        std::cmp::Ordering::Greater => 1,
                    })
                }
            }
            _ => None,
        },
        Value::Boolean(rhs) => match candidate {
            Value::Boolean(lhs) => Some((*lhs as i32) - (*rhs as i32)),
            _ => None,
        },
        Value::Empty | Value::Error(_) => None,
    }
}

fn num_ord(a: f64, b: f64) -> i32 {
    if (a - b).abs() < 1e-12 {
        0
    } else if a < b {
        -1
    } else {
        1
    }
}

/* ───────────────────────── case folding ───────────────────────── */

/// Unicode simple case folding, approximated by full lowercasing. Shared
/// by SEARCH, SWITCH, criteria, and the lookup family.
pub fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

pub fn eq_fold(a: &str, b: &str) -> bool {
    fold_case(a) == fold_case(b)
}

fn char_eq_fold(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/* ───────────────────────── wildcards ───────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
    AnySeq,
    AnyChar,
    Lit(char),
}

fn tokenize(pattern: &str) -> Vec<Tok> {
    let mut toks = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '~' => {
                // Escape: the next character is literal; a trailing tilde
                // is dropped.
                if let Some(escaped) = chars.next() {
                    toks.push(Tok::Lit(escaped));
                }
            }
            '*' => {
                if toks.last() != Some(&Tok::AnySeq) {
                    toks.push(Tok::AnySeq);
                }
            }
            '?' => toks.push(Tok::AnyChar),
            other => toks.push(Tok::Lit(other)),
        }
    }
    toks
}

/// True when the pattern contains an unescaped `*` or `?`.
pub fn has_wildcards(pattern: &str) -> bool {
    tokenize(pattern)
        .iter()
        .any(|t| matches!(t, Tok::AnySeq | Tok::AnyChar))
}

/// Case-insensitive wildcard match over whole `text`. Iterative
/// backtracking on the last `*` seen, one code point per `?`.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let toks = tokenize(pattern);
    let chars: Vec<char> = text.chars().collect();

    let mut ti = 0usize;
    let mut si = 0usize;
    let mut backtrack: Vec<(usize, usize)> = Vec::new();
    loop {
        if ti == toks.len() && si == chars.len() {
            return true;
        }
        if ti < toks.len() {
            match toks[ti] {
                Tok::AnySeq => {
                    backtrack.push((ti, si + 1));
                    ti += 1;
                    continue;
                }
                Tok::AnyChar => {
                    if si < chars.len() {
                        ti += 1;
                        si += 1;
                        continue;
                    }
                }
                Tok::Lit(l) => {
                    if si < chars.len() && char_eq_fold(chars[si], l) {
                        ti += 1;
                        si += 1;
                        continue;
                    }
                }
            }
        }
        match backtrack.pop() {
            Some((star_tok, new_si)) if new_si <= chars.len() => {
                backtrack.push((star_tok, new_si + 1));
                ti = star_tok + 1;
                si = new_si;
            }
            _ => return false,
        }
    }
}

/// First char position (0-based) where the pattern matches a substring
/// beginning there — SEARCH's notion of a hit. Trailing text after the
/// match is allowed.
pub fn wildcard_search(pattern: &str, text: &str) -> Option<usize> {
    let toks = tokenize(pattern);
    let chars: Vec<char> = text.chars().collect();
    (0..=chars.len()).find(|&start| prefix_match(&toks, &chars[start..]))
}

/// Do the tokens consume some prefix of `chars`?
fn prefix_match(toks: &[Tok], chars: &[char]) -> bool {
    match toks.split_first() {
        None => true,
        Some((Tok::AnyChar, rest)) => {
            !chars.is_empty() && prefix_match(rest, &chars[1..])
        }
        Some((Tok::Lit(l), rest)) => {
            chars.first().is_some_and(|&c| char_eq_fold(c, *l)) && prefix_match(rest, &chars[1..])
        }
        Some((Tok::AnySeq, rest)) => {
            (0..=chars.len()).any(|skip| prefix_match(rest, &chars[skip..]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crit(s: &str) -> Criterion {
        Criterion::parse(&Value::text(s))
    }

    #[test]
    fn numeric_comparisons() {
        assert!(crit(">=10").matches(&Value::Number(10.0)).unwrap());
        assert!(!crit(">10").matches(&Value::Number(10.0)).unwrap());
        assert!(crit("<5").matches(&Value::Number(4.5)).unwrap());
        assert!(crit("5").matches(&Value::text("5")).unwrap());
        // Blanks are not numbers: a numeric bound never matches Empty.
        assert!(!crit("<5").matches(&Value::Empty).unwrap());
    }

    #[test]
    fn text_and_wildcards() {
        assert!(crit("alpha").matches(&Value::text("ALPHA")).unwrap());
        assert!(crit("al*").matches(&Value::text("alphabet")).unwrap());
        assert!(crit("a?c").matches(&Value::text("AbC")).unwrap());
        assert!(!crit("a?c").matches(&Value::text("abbc")).unwrap());
        assert!(crit("<>al*").matches(&Value::text("beta")).unwrap());
        assert!(crit("~*lit").matches(&Value::text("*lit")).unwrap());
        assert!(!crit("~*lit").matches(&Value::text("xlit")).unwrap());
        assert!(crit("a~~b").matches(&Value::text("a~b")).unwrap());
    }

    #[test]
    fn empty_criteria() {
        assert!(crit("").matches(&Value::Empty).unwrap());
        assert!(crit("=").matches(&Value::Empty).unwrap());
        assert!(!crit("").matches(&Value::Number(0.0)).unwrap());
        assert!(crit("<>").matches(&Value::Number(0.0)).unwrap());
        assert!(!crit("<>").matches(&Value::Empty).unwrap());
    }

    #[test]
    fn errors_propagate_from_candidates() {
        assert_eq!(
            crit(">1").matches(&Value::Error(ErrorKind::Div)),
            Err(ErrorKind::Div)
        );
        // ...unless the criterion itself names an error kind.
        assert_eq!(
            crit("#DIV/0!").matches(&Value::Error(ErrorKind::Div)),
            Ok(true)
        );
    }

    #[test]
    fn unicode_fold() {
        assert!(eq_fold("STRASSE", "strasse"));
        assert!(crit("über*").matches(&Value::text("ÜBERMUT")).unwrap());
    }

    #[test]
    fn wildcard_search_positions() {
        assert_eq!(wildcard_search("ana", "banana"), Some(1));
        assert_eq!(wildcard_search("n*s", "bananas"), Some(2));
        assert_eq!(wildcard_search("?a", "banana"), Some(0));
        assert_eq!(wildcard_search("A", "banana"), Some(1));
        assert_eq!(wildcard_search("z", "banana"), None);
        assert_eq!(wildcard_search("", "abc"), Some(0));
    }

    #[test]
    fn wildcard_backtracking() {
        assert!(wildcard_match("a*b*c", "axxbyyc"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("?", ""));
        assert!(wildcard_match("a*", "a"));
        assert!(!wildcard_match("*x", "abc"));
    }
}
