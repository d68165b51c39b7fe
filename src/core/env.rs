//! Dotenv parsing and surgical text edits.
//!
//! Rotation rewrites env files in place, so edits must be minimally
//! invasive: [`replace`] touches exactly one assignment's value and
//! [`append`] adds exactly one line. Everything else in the raw text --
//! comments, blank lines, ordering, unrelated keys -- stays byte-identical.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Read a file to a string, stripping a leading UTF-8 BOM.
///
/// A missing file surfaces as `Error::Io` with `NotFound` kind; callers
/// decide whether that is recoverable.
pub fn read_text(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)?;
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(text),
    }
}

/// Parse dotenv text into an ordered key/value list.
///
/// Tolerates comments, blank lines, `export ` prefixes, and single- or
/// double-quoted values. A duplicate key keeps its first position but takes
/// the last value. A line with no `=` or an invalid key name fails with
/// `Error::Parse` carrying the 1-based line number.
pub fn parse(text: &str) -> Result<Vec<(String, String)>> {
    let mut entries: Vec<(String, String)> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let assignment = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
        let Some((key, value)) = assignment.split_once('=') else {
            return Err(Error::Parse {
                line: idx + 1,
                content: raw_line.to_string(),
            });
        };

        let key = key.trim();
        if !is_valid_key(key) {
            return Err(Error::Parse {
                line: idx + 1,
                content: raw_line.to_string(),
            });
        }

        let value = clean_value(value.trim());
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key.to_string(), value)),
        }
    }

    Ok(entries)
}

/// Replace the value of the named assignment, leaving all other text
/// byte-identical.
///
/// Targets every assignment of `name` (a duplicated key is effectively its
/// last assignment, so all occurrences must agree), preserving leading
/// whitespace, an `export ` prefix, and the line ending. The new value is
/// written double-quoted. No-op when the name has no assignment in `text`.
pub fn replace(text: &str, name: &str, new_value: &str) -> String {
    let mut out = String::with_capacity(text.len() + new_value.len());

    for (i, segment) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !is_assignment_of(segment, name) {
            out.push_str(segment);
            continue;
        }

        let line = segment.strip_suffix('\r').unwrap_or(segment);
        let indent_len = line.len() - line.trim_start().len();
        out.push_str(&line[..indent_len]);
        if line.trim_start().starts_with("export ") {
            out.push_str("export ");
        }
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(new_value);
        out.push('"');
        if segment.ends_with('\r') {
            out.push('\r');
        }
    }

    out
}

/// Append one `NAME="value"` assignment line to the text.
///
/// Inserts a newline separator when the text does not already end with one.
/// Idempotency is not assumed; calling twice appends twice.
pub fn append(text: &str, name: &str, value: &str) -> String {
    let mut out = String::with_capacity(text.len() + name.len() + value.len() + 4);
    out.push_str(text);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(value);
    out.push_str("\"\n");
    out
}

/// Whether a line is an assignment of `name` (ignoring indentation and an
/// `export ` prefix).
fn is_assignment_of(segment: &str, name: &str) -> bool {
    let line = segment.strip_suffix('\r').unwrap_or(segment).trim_start();
    let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
    match line.split_once('=') {
        Some((key, _)) => key.trim() == name,
        None => false,
    }
}

/// Valid env key: starts with a letter or underscore, then alphanumerics
/// and underscores.
fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strip surrounding quotes, or a trailing ` # comment` from an unquoted
/// value.
fn clean_value(value: &str) -> String {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return value[1..value.len() - 1].to_string();
        }
    }
    match value.find(" #") {
        Some(pos) => value[..pos].trim_end().to_string(),
        None => value.to_string(),
    }
}
