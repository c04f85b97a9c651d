//! Excel-style error kinds.
//!
//! Names are CamelCase (idiomatic Rust) while `Display` renders them exactly
//! as Excel shows them (`#DIV/0!`, …). The set is closed: eight canonical
//! kinds, no payloads, so an error fits in a single byte inside a `Value`.

use std::fmt;

/// All recognised Excel error codes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// `#NULL!` – empty range intersection.
    Null,
    /// `#DIV/0!` – division by zero or an empty statistical sample.
    Div,
    /// `#VALUE!` – wrong argument type or count.
    Value,
    /// `#REF!` – invalid or out-of-bounds cell reference.
    Ref,
    /// `#NAME?` – unknown function or name (reported by the compiler layer).
    Name,
    /// `#NUM!` – numeric domain violation or failed convergence.
    Num,
    /// `#N/A` – value not available to the function.
    Na,
    /// `#CALC!` – an array calculation produced no rows (FILTER/UNIQUE).
    Calc,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "#NULL!",
            Self::Div => "#DIV/0!",
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::Na => "#N/A",
            Self::Calc => "#CALC!",
        })
    }
}

impl ErrorKind {
    /// Parse the canonical Excel rendering back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_uppercase().as_str() {
            "#NULL!" => Self::Null,
            "#DIV/0!" => Self::Div,
            "#VALUE!" => Self::Value,
            "#REF!" => Self::Ref,
            "#NAME?" => Self::Name,
            "#NUM!" => Self::Num,
            "#N/A" => Self::Na,
            "#CALC!" => Self::Calc,
            _ => return None,
        })
    }

    /// `ERROR.TYPE` code: the 1-based position Excel assigns each kind.
    pub fn type_code(self) -> u8 {
        match self {
            Self::Null => 1,
            Self::Div => 2,
            Self::Value => 3,
            Self::Ref => 4,
            Self::Name => 5,
            Self::Num => 6,
            Self::Na => 7,
            Self::Calc => 14,
        }
    }
}

impl std::error::Error for ErrorKind {}

impl PartialEq<str> for ErrorKind {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for ErrorKind {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_excel_strings() {
        assert_eq!(ErrorKind::Null.to_string(), "#NULL!");
        assert_eq!(ErrorKind::Div.to_string(), "#DIV/0!");
        assert_eq!(ErrorKind::Value.to_string(), "#VALUE!");
        assert_eq!(ErrorKind::Ref.to_string(), "#REF!");
        assert_eq!(ErrorKind::Name.to_string(), "#NAME?");
        assert_eq!(ErrorKind::Num.to_string(), "#NUM!");
        assert_eq!(ErrorKind::Na.to_string(), "#N/A");
        assert_eq!(ErrorKind::Calc.to_string(), "#CALC!");
    }

    #[test]
    fn parse_round_trips() {
        for kind in [
            ErrorKind::Null,
            ErrorKind::Div,
            ErrorKind::Value,
            ErrorKind::Ref,
            ErrorKind::Name,
            ErrorKind::Num,
            ErrorKind::Na,
            ErrorKind::Calc,
        ] {
            assert_eq!(ErrorKind::parse(&kind.to_string()), Some(kind));
        }
        assert_eq!(ErrorKind::parse("#GETTING_DATA"), None);
        assert_eq!(ErrorKind::parse("#n/a"), Some(ErrorKind::Na));
    }
}
