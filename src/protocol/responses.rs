//! Shell response handling
//!
//! Defines reply codes and formatting.

/// Reply codes
pub const OK: u16 = 200;
pub const DATA: u16 = 213;
pub const GOODBYE: u16 = 221;
pub const SYNTAX_ERROR: u16 = 500;
pub const NOT_FOUND: u16 = 550;
pub const DENIED: u16 = 553;
pub const LOCKED: u16 = 554;

/// Format a single-line reply
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}

/// Format a multi-line reply: `code-` continuation lines, then `code End`
pub fn format_multiline<I, S>(code: u16, lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut reply = String::new();
    for line in lines {
        reply.push_str(&format!("{}-{}\r\n", code, line.as_ref()));
    }
    reply.push_str(&format_response(code, "End"));
    reply
}
