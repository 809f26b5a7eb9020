//! Formula parser/compiler
//!
//! Turns a whitespace-delimited token string into an executable
//! [`Program`]. Classification per token, first match wins:
//!
//! 1. Numeric literal, optionally with an inline clock suffix
//! 2. `${name[,options]}` environment reference
//! 3. Operator keyword
//!
//! Anything else rejects the whole formula; a partial program is never
//! returned.

use tracing::debug;

use crate::error::{Result, RpnError};
use crate::ops::{self, Op};
use crate::program::{Node, Program};

/// Compile a formula into a program
///
/// # Example
/// ```
/// use rpn_logic::compile;
///
/// let program = compile("${doorbell} rising ${chime/enabled} &&").unwrap();
/// assert_eq!(program.len(), 4);
/// ```
pub fn compile(formula: &str) -> Result<Program> {
    let mut nodes = Vec::new();
    for token in formula.split_whitespace() {
        nodes.push(Node::new(classify(token)?));
    }
    Ok(Program::new(nodes))
}

fn classify(token: &str) -> Result<Op> {
    let bytes = token.as_bytes();
    if bytes[0].is_ascii_digit()
        || (bytes.len() > 1 && (bytes[0] == b'+' || bytes[0] == b'-') && bytes[1].is_ascii_digit())
    {
        return Ok(Op::Const(parse_literal(token)));
    }

    if let Some(inner) = token.strip_prefix("${").and_then(|t| t.strip_suffix('}')) {
        // the last comma separates the options
        let (name, options) = match inner.rsplit_once(',') {
            Some((name, options)) => (name, Some(options.to_string())),
            None => (inner, None),
        };
        return Ok(Op::Env {
            name: name.to_string(),
            options,
        });
    }

    if let Some(op) = ops::lookup(token) {
        return Ok(op);
    }

    debug!(token, "unknown token");
    Err(RpnError::unknown_token(token))
}

/// Parse a numeric literal with an optional inline clock suffix.
///
/// A boundary character in `:`/`h`/`'` reads a minutes field (divided by
/// 60), then one in `:`/`m`/`"` reads a seconds field (divided by 3600):
/// `2:30` and `2h30` both read as 2.5, `6:30:30` as 6.5083…. Characters
/// after the recognized fields are ignored, and a missing number after a
/// boundary contributes zero.
fn parse_literal(token: &str) -> f64 {
    let (mut value, mut rest) = scan_number(token);
    if let Some(boundary) = rest.chars().next() {
        if matches!(boundary, ':' | 'h' | '\'') {
            let (minutes, tail) = scan_number(&rest[1..]);
            value += minutes / 60.0;
            rest = tail;
        }
    }
    if let Some(boundary) = rest.chars().next() {
        if matches!(boundary, ':' | 'm' | '"') {
            let (seconds, _) = scan_number(&rest[1..]);
            value += seconds / 3600.0;
        }
    }
    value
}

/// Longest-prefix float scan
///
/// Returns the parsed value (0.0 when nothing parses) and the unconsumed
/// remainder.
fn scan_number(s: &str) -> (f64, &str) {
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start {
        return (0.0, s);
    }
    match s[..end].parse::<f64>() {
        Ok(value) => (value, &s[end..]),
        Err(_) => (0.0, s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(token: &str) -> f64 {
        match classify(token).unwrap() {
            Op::Const(value) => value,
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_literals() {
        assert_eq!(literal("42"), 42.0);
        assert_eq!(literal("3.5"), 3.5);
        assert_eq!(literal("-2"), -2.0);
        assert_eq!(literal("+0.25"), 0.25);
    }

    #[test]
    fn test_clock_suffix_literals() {
        assert_eq!(literal("2:30"), 2.5);
        assert_eq!(literal("2h30"), 2.5);
        assert_eq!(literal("2'30"), 2.5);
        assert!((literal("6:30:30") - (6.5 + 30.0 / 3600.0)).abs() < 1e-12);
        assert!((literal("1m30") - (1.0 + 30.0 / 3600.0)).abs() < 1e-12);
        // missing field after a boundary contributes zero
        assert_eq!(literal("7:"), 7.0);
        // unrecognized trailing characters are ignored
        assert_eq!(literal("5x"), 5.0);
    }

    #[test]
    fn test_env_reference_splitting() {
        match classify("${sensorA,opt1}").unwrap() {
            Op::Env { name, options } => {
                assert_eq!(name, "sensorA");
                assert_eq!(options.as_deref(), Some("opt1"));
            },
            other => panic!("expected env ref, got {:?}", other),
        }
        match classify("${sensorA}").unwrap() {
            Op::Env { name, options } => {
                assert_eq!(name, "sensorA");
                assert_eq!(options, None);
            },
            other => panic!("expected env ref, got {:?}", other),
        }
        // the *last* comma splits; empty options are allowed
        match classify("${a,b,c}").unwrap() {
            Op::Env { name, options } => {
                assert_eq!(name, "a,b");
                assert_eq!(options.as_deref(), Some("c"));
            },
            other => panic!("expected env ref, got {:?}", other),
        }
        match classify("${t,}").unwrap() {
            Op::Env { name, options } => {
                assert_eq!(name, "t");
                assert_eq!(options.as_deref(), Some(""));
            },
            other => panic!("expected env ref, got {:?}", other),
        }
    }

    #[test]
    fn test_sign_tokens_are_operators() {
        assert!(matches!(classify("-").unwrap(), Op::Sub));
        assert!(matches!(classify("+").unwrap(), Op::Add));
        assert!(matches!(classify("-x"), Err(_)));
    }

    #[test]
    fn test_unknown_token_rejects_formula() {
        let err = compile("1 2 frobnicate +").unwrap_err();
        assert_eq!(
            err,
            RpnError::UnknownToken {
                token: "frobnicate".into()
            }
        );
    }

    #[test]
    fn test_empty_formula_compiles_empty_program() {
        let program = compile("  \t ").unwrap();
        assert!(program.is_empty());
    }
}
