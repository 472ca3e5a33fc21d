//! Split a permalink pattern into its top-level path segments.

use super::scan::group_end;
use crate::error::ConvertError;

/// Split `pattern` on every `/` that is a real path separator.
///
/// Returns borrowed slices into `pattern`; joining them with `/` gives the
/// pattern back. A `/` is *not* a separator when it is escaped, inside a quoted
/// span or a parenthesized argument list, part of `//`, or directly follows a
/// `:` (a block close such as `:/if`).
pub fn split(pattern: &str) -> Result<Vec<&str>, ConvertError> {
    let bytes = pattern.as_bytes();
    let mut segments = Vec::new();
    let mut seg_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' | b'(' => i = group_end(pattern, i, 0)?,
            b'/' if bytes.get(i + 1) == Some(&b'/') => i += 2,
            b':' if pattern[i + 1..].starts_with("//") => i += 3,
            b':' if bytes.get(i + 1) == Some(&b'/') => i += 2,
            b'/' => {
                segments.push(&pattern[seg_start..i]);
                i += 1;
                seg_start = i;
            }
            _ => i += 1,
        }
    }

    segments.push(&pattern[seg_start..]);
    Ok(segments)
}
