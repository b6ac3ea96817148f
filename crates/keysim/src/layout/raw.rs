//! Keyboard-layout-editor "raw data" support.
//!
//! The editor's raw data is a relaxed JSON dialect: object keys are usually
//! unquoted, strings may use single quotes, trailing commas show up in
//! hand-edited files, and the outer `[...]` is left off. This module rewrites
//! such text into strict JSON so it can go through `serde_json`.

use crate::error::Result;
use serde_json::Value;

/// Parse raw data (or strict JSON) into a list of top-level entries.
pub fn parse_raw(text: &str) -> Result<Vec<Value>> {
    let normalized = normalize(text);
    let mut entries: Vec<Value> = serde_json::from_str(&format!("[{}]", normalized))?;

    // Text that already carried its outer brackets ends up nested one level
    // too deep: a single entry holding the rows, or holding only the
    // metadata object.
    let already_wrapped = entries.len() == 1
        && matches!(&entries[0], Value::Array(inner) if is_entry_list(inner));
    if already_wrapped {
        if let Some(Value::Array(inner)) = entries.pop() {
            return Ok(inner);
        }
    }

    Ok(entries)
}

/// Whether `inner` reads as top-level entries rather than a single row
fn is_entry_list(inner: &[Value]) -> bool {
    match inner {
        [] => true,
        [Value::Object(_), rest @ ..] => rest.iter().all(Value::is_array),
        _ => inner.iter().any(Value::is_array),
    }
}

/// Rewrite relaxed JSON into strict JSON.
///
/// Bare identifiers become quoted strings (except `true`, `false`, `null`),
/// single-quoted strings become double-quoted and trailing commas are dropped.
/// Anything else is copied unchanged and left for `serde_json` to judge.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut chars = text.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                out.push('"');
                copy_string(&mut chars, &mut out, c);
            }
            ',' => {
                let mut lookahead = chars.clone();
                while lookahead.peek().is_some_and(|c| c.is_whitespace()) {
                    lookahead.next();
                }
                if !matches!(lookahead.peek(), Some(']') | Some('}') | None) {
                    out.push(',');
                }
            }
            c if (c.is_ascii_alphabetic() || c == '_' || c == '$') && !in_number(&out) => {
                let mut ident = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' || next == '$' {
                        ident.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match ident.as_str() {
                    "true" | "false" | "null" => out.push_str(&ident),
                    _ => {
                        out.push('"');
                        out.push_str(&ident);
                        out.push('"');
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Exponent markers (`1e-3`) belong to the number before them.
fn in_number(out: &str) -> bool {
    out.ends_with(|p: char| p.is_ascii_digit() || p == '.')
}

/// Copy a string body up to the closing `quote`, re-escaping for double quotes.
fn copy_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, out: &mut String, quote: char) {
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            '"' if quote == '\'' => out.push_str("\\\""),
            c if c == quote => {
                out.push('"');
                return;
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    // Unterminated: leave it open so serde_json reports the position.
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unquoted_keys() {
        assert_eq!(normalize(r#"[{x:1,w:1.5},"Q"]"#), r#"[{"x":1,"w":1.5},"Q"]"#);
    }

    #[test]
    fn test_keywords_stay_bare() {
        assert_eq!(normalize("{d:true,g:false}"), r#"{"d":true,"g":false}"#);
    }

    #[test]
    fn test_single_quotes_and_embedded_double_quote() {
        assert_eq!(normalize(r#"['"\n\'']"#), r#"["\"\n'"]"#);
    }

    #[test]
    fn test_identifiers_inside_strings_untouched() {
        assert_eq!(normalize(r#"["Caps Lock","x:1"]"#), r#"["Caps Lock","x:1"]"#);
    }

    #[test]
    fn test_exponent_numbers_untouched() {
        assert_eq!(normalize("[{x:1e-1}]"), r#"[{"x":1e-1}]"#);
    }

    #[test]
    fn test_trailing_commas_dropped() {
        assert_eq!(normalize(r#"["Q","W",],"#), r#"["Q","W"]"#);
    }

    #[test]
    fn test_raw_rows_without_outer_brackets() {
        let rows = parse_raw(r#"["Q","W"],[{x:1},"A"]"#).unwrap();
        assert_eq!(rows, vec![json!(["Q", "W"]), json!([{"x": 1}, "A"])]);
    }

    #[test]
    fn test_strict_json_with_outer_brackets() {
        let rows = parse_raw(r#"[["Q"],["A"]]"#).unwrap();
        assert_eq!(rows, vec![json!(["Q"]), json!(["A"])]);
    }

    #[test]
    fn test_single_row() {
        let rows = parse_raw(r#"["Esc","F1"]"#).unwrap();
        assert_eq!(rows, vec![json!(["Esc", "F1"])]);
    }

    #[test]
    fn test_metadata_then_rows() {
        let rows = parse_raw(r#"{name:"tiny"},["Q"]"#).unwrap();
        assert_eq!(rows, vec![json!({"name": "tiny"}), json!(["Q"])]);
    }

    #[test]
    fn test_metadata_only_strict_and_raw_agree() {
        let strict = parse_raw(r#"[{"name":"x"}]"#).unwrap();
        let raw = parse_raw(r#"{name:"x"}"#).unwrap();
        assert_eq!(strict, vec![json!({"name": "x"})]);
        assert_eq!(strict, raw);

        let strict = parse_raw(r#"[{"name":"x"},["Q"]]"#).unwrap();
        assert_eq!(strict, parse_raw(r#"{name:"x"},["Q"]"#).unwrap());
    }

    #[test]
    fn test_single_row_starting_with_props_stays_a_row() {
        let rows = parse_raw(r#"[{x:1},"A"]"#).unwrap();
        assert_eq!(rows, vec![json!([{"x": 1}, "A"])]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_raw("").unwrap().is_empty());
        assert!(parse_raw("[]").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(parse_raw(r#"["Q""#).is_err());
    }
}
