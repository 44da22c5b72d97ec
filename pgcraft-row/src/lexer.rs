//! Row-literal lexer.
//!
//! Tokenizes the PostgreSQL composite textual form `(v1,"v2",…)` into an
//! ordered list of tokens with quoting and escaping resolved. Positions are
//! byte offsets into the trimmed input, so parse errors point at the exact
//! offending byte.

use crate::error::{Error, RowResult};

/// A single parsed value from a row literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// The decoded value, with escapes processed.
    pub value: String,
    /// The original raw slice from the input, including surrounding quotes.
    pub raw: &'a str,
    /// Whether the value was quoted in the input.
    pub quoted: bool,
    /// Byte offset in the trimmed input where this token started.
    pub offset: usize,
}

/// Parse a row literal into tokens.
///
/// The outermost characters must be `(` and `)` after trimming whitespace.
/// An empty body yields zero tokens. A trailing comma is tolerated.
pub fn parse_row_literal(input: &str) -> RowResult<Vec<Token<'_>>> {
    let input = input.trim();

    if input.is_empty() {
        return Err(Error::EmptyInput);
    }
    if !input.starts_with('(') {
        return Err(Error::parse(0, "expected opening parenthesis '('"));
    }
    if !input.ends_with(')') {
        return Err(Error::parse(
            input.len() - 1,
            "expected closing parenthesis ')'",
        ));
    }

    let body = &input[1..input.len() - 1];
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Offsets start at 1, just past the opening paren.
    parse_tokens(body, 1)
}

fn parse_tokens(body: &str, start: usize) -> RowResult<Vec<Token<'_>>> {
    let bytes = body.as_bytes();
    let n = bytes.len();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < n {
        while pos < n && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= n {
            break;
        }

        let (token, next) = if bytes[pos] == b'"' {
            scan_quoted(body, pos, start)?
        } else {
            scan_unquoted(body, pos, start)?
        };
        pos = next;
        tokens.push(token);

        while pos < n && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        if pos < n {
            if bytes[pos] == b',' {
                // A trailing comma with nothing after it yields no token.
                pos += 1;
            } else {
                return Err(Error::parse(start + pos, "expected ',' or end of row"));
            }
        }
    }

    Ok(tokens)
}

/// Scan a quoted value beginning at `pos` (which must hold `"`).
fn scan_quoted(body: &str, pos: usize, start: usize) -> RowResult<(Token<'_>, usize)> {
    let bytes = body.as_bytes();
    let token_start = pos;
    let mut pos = pos + 1;
    let mut value: Vec<u8> = Vec::new();
    let mut escaped = false;

    while pos < bytes.len() {
        let b = bytes[pos];

        if escaped {
            match b {
                b'n' => value.push(b'\n'),
                b'r' => value.push(b'\r'),
                b't' => value.push(b'\t'),
                b'\\' => value.push(b'\\'),
                b'"' => value.push(b'"'),
                b',' => value.push(b','),
                b'0' => value.push(0),
                // Unknown escapes keep both the backslash and the byte.
                other => {
                    value.push(b'\\');
                    value.push(other);
                }
            }
            escaped = false;
            pos += 1;
            continue;
        }

        match b {
            b'\\' => {
                escaped = true;
                pos += 1;
            }
            b'"' => {
                // Doubled quote is the in-band escape for a literal quote.
                if pos + 1 < bytes.len() && bytes[pos + 1] == b'"' {
                    value.push(b'"');
                    pos += 2;
                    continue;
                }
                let raw = &body[token_start..pos + 1];
                let token = Token {
                    value: into_utf8(value, start + token_start)?,
                    raw,
                    quoted: true,
                    offset: start + token_start,
                };
                return Ok((token, pos + 1));
            }
            other => {
                value.push(other);
                pos += 1;
            }
        }
    }

    Err(Error::parse(start + token_start, "unclosed quoted string"))
}

/// Scan an unquoted value beginning at `pos`.
fn scan_unquoted(body: &str, pos: usize, start: usize) -> RowResult<(Token<'_>, usize)> {
    let bytes = body.as_bytes();
    let token_start = pos;
    let mut pos = pos;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b == b',' || b == b')' || b.is_ascii_whitespace() {
            break;
        }
        if b == b'"' {
            return Err(Error::parse(
                start + pos,
                "unexpected quote in unquoted value",
            ));
        }
        pos += 1;
    }

    let raw = &body[token_start..pos];
    let token = Token {
        value: raw.trim().to_owned(),
        raw,
        quoted: false,
        offset: start + token_start,
    };
    Ok((token, pos))
}

/// Escape sequences only ever splice ASCII bytes between intact UTF-8
/// sequences, so this conversion cannot fail on input that was `&str`.
fn into_utf8(value: Vec<u8>, offset: usize) -> RowResult<String> {
    String::from_utf8(value).map_err(|_| Error::parse(offset, "invalid utf-8 in quoted value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(input: &str) -> Vec<String> {
        parse_row_literal(input)
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_simple_row() {
        assert_eq!(values("(a,b,c)"), ["a", "b", "c"]);
    }

    #[test]
    fn test_quoted_values() {
        assert_eq!(
            values(r#"("123 Main St","Springfield",12345)"#),
            ["123 Main St", "Springfield", "12345"]
        );
    }

    #[test]
    fn test_empty_row() {
        assert!(parse_row_literal("()").unwrap().is_empty());
        assert!(parse_row_literal("(   )").unwrap().is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_row_literal("").unwrap_err(), Error::EmptyInput);
        assert_eq!(parse_row_literal("   ").unwrap_err(), Error::EmptyInput);
    }

    #[test]
    fn test_escape_sequences() {
        assert_eq!(values(r#"("a\nb","c\td","e\\f","g\"h","i\,j","k\0l")"#)[0], "a\nb");
        let vs = values(r#"("a\nb","c\td","e\\f","g\"h","i\,j","k\0l")"#);
        assert_eq!(vs[1], "c\td");
        assert_eq!(vs[2], "e\\f");
        assert_eq!(vs[3], "g\"h");
        assert_eq!(vs[4], "i,j");
        assert_eq!(vs[5], "k\0l");
    }

    #[test]
    fn test_unknown_escape_preserved() {
        assert_eq!(values(r#"("a\xb")"#), ["a\\xb"]);
    }

    #[test]
    fn test_doubled_quote() {
        assert_eq!(values(r#"("say ""hi""")"#), ["say \"hi\""]);
    }

    #[test]
    fn test_whitespace_around_tokens() {
        assert_eq!(values("( a , b )"), ["a", "b"]);
    }

    #[test]
    fn test_trailing_comma() {
        assert_eq!(values("(a,b,)"), ["a", "b"]);
    }

    #[test]
    fn test_raw_and_offsets() {
        let tokens = parse_row_literal(r#"(a,"b c",42)"#).unwrap();
        assert_eq!(tokens[0].raw, "a");
        assert_eq!(tokens[0].offset, 1);
        assert!(!tokens[0].quoted);
        assert_eq!(tokens[1].raw, "\"b c\"");
        assert_eq!(tokens[1].offset, 3);
        assert!(tokens[1].quoted);
        assert_eq!(tokens[2].raw, "42");
        assert_eq!(tokens[2].offset, 9);
    }

    #[test]
    fn test_missing_open_paren() {
        assert_eq!(
            parse_row_literal("a,b)").unwrap_err(),
            Error::parse(0, "expected opening parenthesis '('")
        );
    }

    #[test]
    fn test_missing_close_paren() {
        assert_eq!(
            parse_row_literal("(a,b").unwrap_err(),
            Error::parse(3, "expected closing parenthesis ')'")
        );
    }

    #[test]
    fn test_unclosed_quote() {
        assert_eq!(
            parse_row_literal(r#"(a,"bc)"#).unwrap_err(),
            Error::parse(3, "unclosed quoted string")
        );
    }

    #[test]
    fn test_stray_quote_in_unquoted() {
        assert_eq!(
            parse_row_literal(r#"(ab"c)"#).unwrap_err(),
            Error::parse(3, "unexpected quote in unquoted value")
        );
    }

    #[test]
    fn test_garbage_after_quoted_value() {
        // The byte right after the closing quote is where a separator was
        // expected.
        assert_eq!(
            parse_row_literal(r#"(a,"b)"c)"#).unwrap_err(),
            Error::parse(7, "expected ',' or end of row")
        );
    }

    #[test]
    fn test_multibyte_values() {
        assert_eq!(values("(héllo,\"wörld\")"), ["héllo", "wörld"]);
    }
}
