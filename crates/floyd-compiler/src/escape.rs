//! String-escape decoding for grammar literals.
//!
//! Shared by lowering for quoted literals and host-expression strings.
//! Supported escapes: `\n \r \t \b \f \v \0 \\ \' \" \xHH \uHHHH
//! \u{...}`.

/// Decodes a quoted literal, including its surrounding quotes.
pub fn unquote(raw: &str) -> Result<String, String> {
    if raw.len() < 2 {
        return Err("literal is too short".to_string());
    }
    decode(&raw[1..raw.len() - 1])
}

/// Decodes escape sequences in the body of a literal.
pub fn decode(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err("dangling backslash".to_string());
        };
        match esc {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(unicode_escape(&mut chars)?),
            other => return Err(format!("unknown escape `\\{other}`")),
        }
    }
    Ok(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char, String> {
    let mut value: u32 = 0;
    for _ in 0..digits {
        let d = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| "truncated hex escape".to_string())?;
        value = value * 16 + d;
    }
    char::from_u32(value).ok_or_else(|| format!("\\x{value:02x} is not a valid code point"))
}

fn unicode_escape(chars: &mut std::str::Chars<'_>) -> Result<char, String> {
    let mut peek = chars.clone();
    if peek.next() == Some('{') {
        // \u{...}
        chars.next();
        let mut value: u32 = 0;
        let mut count = 0;
        loop {
            match chars.next() {
                Some('}') => break,
                Some(c) => {
                    let d = c
                        .to_digit(16)
                        .ok_or_else(|| format!("bad hex digit `{c}` in unicode escape"))?;
                    value = value
                        .checked_mul(16)
                        .and_then(|v| v.checked_add(d))
                        .ok_or_else(|| "unicode escape out of range".to_string())?;
                    count += 1;
                    if count > 6 {
                        return Err("unicode escape out of range".to_string());
                    }
                }
                None => return Err("unterminated unicode escape".to_string()),
            }
        }
        if count == 0 {
            return Err("empty unicode escape".to_string());
        }
        char::from_u32(value).ok_or_else(|| format!("U+{value:X} is not a valid code point"))
    } else {
        hex_escape(chars, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(unquote("'foo'").unwrap(), "foo");
        assert_eq!(unquote("\"bar baz\"").unwrap(), "bar baz");
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(unquote(r"'\n\t\\'").unwrap(), "\n\t\\");
        assert_eq!(unquote(r"'\''").unwrap(), "'");
        assert_eq!(unquote(r#""\"""#).unwrap(), "\"");
    }

    #[test]
    fn hex_and_unicode_escapes() {
        assert_eq!(unquote(r"'\x41'").unwrap(), "A");
        assert_eq!(unquote(r"'A'").unwrap(), "A");
        assert_eq!(unquote(r"'\u{1F600}'").unwrap(), "\u{1F600}");
    }

    #[test]
    fn bad_escapes_are_errors() {
        assert!(unquote(r"'\q'").is_err());
        assert!(unquote(r"'\x4'").is_err());
        assert!(unquote(r"'\u{}'").is_err());
        assert!(unquote(r"'\u{110000}'").is_err());
    }
}
