//! Log record codec using nom
//!
//! Line format:
//! ```text
//! PUT <key> <value...>\n
//! DEL <key>\n
//! CLEAR\n
//! ```
//!
//! Keys are single whitespace-free tokens. A `PUT` value is everything after the
//! single space following the key, so it may contain spaces but never a line break.

use std::fmt;

use nom::{
    bytes::complete::take_till1,
    character::complete::{char, multispace0},
    combinator::{opt, rest},
    sequence::preceded,
    IResult,
};

use crate::error::{Error, Result};

/// A single mutation as recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'a> {
    /// Insert or overwrite `key`
    Put {
        /// Key written
        key: &'a str,
        /// New value
        value: &'a str,
    },
    /// Remove `key`
    Del {
        /// Key removed
        key: &'a str,
    },
    /// Drop every entry
    Clear,
}

impl Record<'_> {
    /// Operation keyword as it appears in the log
    pub fn op(&self) -> &'static str {
        match self {
            Record::Put { .. } => "PUT",
            Record::Del { .. } => "DEL",
            Record::Clear => "CLEAR",
        }
    }

    /// Encode the record as one newline-terminated log line
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // An empty value is written without the separator and replays as ""
            Record::Put { key, value } if value.is_empty() => write!(f, "PUT {}", key),
            Record::Put { key, value } => write!(f, "PUT {} {}", key, value),
            Record::Del { key } => write!(f, "DEL {}", key),
            Record::Clear => f.write_str("CLEAR"),
        }
    }
}

/// Check that a key survives a round trip through the log format
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(Error::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Check that a value survives a round trip through the log format
pub fn validate_value(key: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(Error::InvalidValue(key.to_string()));
    }
    Ok(())
}

fn token(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, take_till1(|c: char| c.is_ascii_whitespace()))(input)
}

fn put_value(input: &str) -> IResult<&str, &str> {
    preceded(opt(char(' ')), rest)(input)
}

/// Parse one log line (with or without its trailing newline)
pub fn parse_record(line: &str) -> Result<Record<'_>> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let (input, op) = token(line)?;
    match op {
        "PUT" => {
            let (input, key) = token(input)?;
            let (_, value) = put_value(input)?;
            Ok(Record::Put { key, value })
        }
        "DEL" => {
            let (_, key) = token(input)?;
            Ok(Record::Del { key })
        }
        "CLEAR" => Ok(Record::Clear),
        other => Err(Error::Parse(format!("Unknown operation: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_put() {
        let record = parse_record("PUT user:1 Alice\n").unwrap();
        assert_eq!(record, Record::Put { key: "user:1", value: "Alice" });
    }

    #[test]
    fn test_parse_put_value_with_spaces() {
        let record = parse_record("PUT city New York  City").unwrap();
        assert_eq!(record, Record::Put { key: "city", value: "New York  City" });
    }

    #[test]
    fn test_parse_put_keeps_extra_leading_space() {
        // Only the single separator is stripped
        let record = parse_record("PUT k  padded").unwrap();
        assert_eq!(record, Record::Put { key: "k", value: " padded" });
    }

    #[test]
    fn test_parse_put_empty_value() {
        let record = parse_record("PUT k\n").unwrap();
        assert_eq!(record, Record::Put { key: "k", value: "" });
    }

    #[test]
    fn test_parse_del_and_clear() {
        assert_eq!(parse_record("DEL k").unwrap(), Record::Del { key: "k" });
        assert_eq!(parse_record("DEL k trailing").unwrap(), Record::Del { key: "k" });
        assert_eq!(parse_record("CLEAR\n").unwrap(), Record::Clear);
        assert_eq!(parse_record("  CLEAR").unwrap(), Record::Clear);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse_record(""), Err(Error::Parse(_))));
        assert!(matches!(parse_record("\n"), Err(Error::Parse(_))));
        assert!(matches!(parse_record("PUT"), Err(Error::Parse(_))));
        assert!(matches!(parse_record("PUT   "), Err(Error::Parse(_))));
        assert!(matches!(parse_record("DEL"), Err(Error::Parse(_))));
        assert!(matches!(parse_record("SET k v"), Err(Error::Parse(_))));
        assert!(matches!(parse_record("put k v"), Err(Error::Parse(_))));
        assert!(matches!(parse_record("PUTX k v"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_encode_format() {
        assert_eq!(Record::Put { key: "a", value: "b c" }.encode(), "PUT a b c\n");
        assert_eq!(Record::Put { key: "a", value: "" }.encode(), "PUT a\n");
        assert_eq!(Record::Del { key: "a" }.encode(), "DEL a\n");
        assert_eq!(Record::Clear.encode(), "CLEAR\n");
    }

    #[test]
    fn test_encode_then_parse_preserves_edge_values() {
        for value in ["", " leading", "trailing ", "tab\tinside", "multi   space"] {
            let line = Record::Put { key: "k", value }.encode();
            assert_eq!(parse_record(&line).unwrap(), Record::Put { key: "k", value });
        }
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("user:42").is_ok());
        assert!(matches!(validate_key(""), Err(Error::InvalidKey(_))));
        assert!(matches!(validate_key("has space"), Err(Error::InvalidKey(_))));
        assert!(matches!(validate_key("tab\there"), Err(Error::InvalidKey(_))));
        assert!(matches!(validate_key("line\nbreak"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_validate_value() {
        assert!(validate_value("k", "spaces are fine").is_ok());
        assert!(validate_value("k", "").is_ok());
        assert!(matches!(validate_value("k", "two\nlines"), Err(Error::InvalidValue(_))));
        assert!(matches!(validate_value("k", "cr\r"), Err(Error::InvalidValue(_))));
    }
}
