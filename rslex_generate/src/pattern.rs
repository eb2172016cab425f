//! Module that encodes lex patterns as Rust string literals.
//!
//! Lex patterns use a few escapes the regex engine does not know, namely three digit octal
//! escapes and `\0`. These are decoded here. All other backslash sequences are kept, so that the
//! regex engine interprets them.

/// Encodes a lex pattern as Rust string literal, including the quotes.
///
/// The value of the literal is the regex text for the regex engine of the runtime.
/// The encoding never fails. Invalid regex syntax is detected when the decoded pattern is parsed.
///
/// ```
/// use rslex_generate::encode_pattern;
///
/// assert_eq!(encode_pattern(r#"a"b"#), r#""a\"b""#);
/// assert_eq!(encode_pattern(r"\101+"), r#""A+""#);
/// assert_eq!(encode_pattern(r"\d+"), r#""\\d+""#);
/// ```
pub fn encode_pattern(pattern: &str) -> String {
    let bytes = pattern.as_bytes();
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('"');
    let mut chars = pattern.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => {
                // Escape sequences only consume ASCII characters.
                let consumed = encode_escape(&bytes[i + 1..], &mut out);
                for _ in 0..consumed {
                    chars.next();
                }
            }
            c if (c as u32) < 0x20 => push_hex_escape(&mut out, c as u32),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Encodes the escape sequence after a backslash.
/// Returns the number of bytes consumed after the backslash.
fn encode_escape(rest: &[u8], out: &mut String) -> usize {
    match rest {
        // A trailing backslash is a literal backslash.
        [] => {
            out.push_str(r"\\\\");
            0
        }
        [a, b, c, ..] if is_octal_digit(*a) && is_octal_digit(*b) && is_octal_digit(*c) => {
            let value = (digit_value(*a, 8) << 6) | (digit_value(*b, 8) << 3) | digit_value(*c, 8);
            push_code_point(out, value);
            3
        }
        [b'0', ..] => {
            out.push_str(r"\x00");
            1
        }
        [b'x' | b'X', h, l, ..] if h.is_ascii_hexdigit() && l.is_ascii_hexdigit() => {
            let value = (digit_value(*h, 16) << 4) | digit_value(*l, 16);
            push_code_point(out, value);
            3
        }
        [b'\\', ..] => {
            out.push_str(r"\\\\");
            1
        }
        _ => {
            out.push_str(r"\\");
            0
        }
    }
}

#[inline]
fn is_octal_digit(d: u8) -> bool {
    (b'0'..=b'7').contains(&d)
}

#[inline]
fn digit_value(d: u8, radix: u32) -> u32 {
    char::from(d).to_digit(radix).unwrap_or_default()
}

/// Writes a decoded code point so that the regex engine matches it literally.
fn push_code_point(out: &mut String, value: u32) {
    match char::from_u32(value) {
        Some(c) if value >= 0x20 => {
            let mut buffer = [0; 4];
            for e in regex_syntax::escape(c.encode_utf8(&mut buffer)).chars() {
                match e {
                    '\\' => out.push_str(r"\\"),
                    '"' => out.push_str("\\\""),
                    e => out.push(e),
                }
            }
        }
        _ => push_hex_escape(out, value),
    }
}

fn push_hex_escape(out: &mut String, value: u32) {
    out.push_str(&format!("\\x{:02x}", value));
}
