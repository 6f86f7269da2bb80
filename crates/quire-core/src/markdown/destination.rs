//! CommonMark link destination parsing
//!
//! Image targets arrive exactly as written in the document. Two forms matter:
//!
//! ```text
//! ![a](<./my file.png>)     bracketed: spaces allowed, delimiters stripped
//! ![b](foo\(1\).png)        plain: backslash escapes punctuation
//! ```
//!
//! The transform is applied once to raw text. It is not idempotent (`\\(`
//! becomes `\(` and then `(`), so an already parsed value must never be fed
//! back in.

/// Parse a raw link destination into the path or URL it names.
///
/// Percent-encoded sequences are passed through untouched.
pub fn parse_destination(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace());

    let body = if trimmed.len() >= 2 && trimmed.starts_with('<') && trimmed.ends_with('>') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    unescape(body)
}

/// Single backslash-escape pass.
fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&next) if next.is_ascii_punctuation() => {
                out.push(next);
                chars.next();
            }
            _ => out.push('\\'),
        }
    }

    out
}
