//! Pattern → Handlebars conversion.
//!
//! ```
//! assert_eq!(
//!     permalinks::convert(r#":date(file, "YYYY/MM/DD")/:stem/index.html"#).unwrap(),
//!     r#"{{date file "YYYY/MM/DD"}}/{{stem}}/index.html"#
//! );
//! ```

mod scan;
pub mod segment;
pub mod split;

use crate::error::ConvertError;
use segment::{ExprKind, Node, compile, parse_segment};

pub use segment::convert_segment;
pub use split::split;

/// Convert a full permalink pattern into a Handlebars template.
///
/// Plain text (including existing `{{…}}` syntax) passes through unchanged.
/// Any structural error aborts the whole conversion.
pub fn convert(pattern: &str) -> Result<String, ConvertError> {
    let segments = split(pattern)?;
    // Title-like patterns never carry a file extension.
    let peel = !pattern.starts_with(char::is_whitespace);
    let last = segments.len() - 1;

    let parsed = segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            log::trace!("segment {i}: {seg:?}");
            parse_segment(seg, peel && i == last)
        })
        .collect::<Result<Vec<_>, _>>()?;

    check_blocks(parsed.iter().flatten())?;

    let out = parsed
        .iter()
        .map(|nodes| compile(nodes))
        .collect::<Vec<_>>()
        .join("/");
    log::debug!("converted {pattern:?} -> {out:?}");
    Ok(out)
}

/// Verify that block opens and closes pair up like brackets.
fn check_blocks<'a>(nodes: impl Iterator<Item = &'a Node>) -> Result<(), ConvertError> {
    let mut open: Vec<&str> = Vec::new();

    for node in nodes {
        let Node::Expr(expr) = node else { continue };
        match expr.kind() {
            ExprKind::BlockOpen => open.push(expr.block_name()),
            ExprKind::BlockClose => {
                let found = expr.block_name();
                match open.pop() {
                    Some(expected) if expected == found => {}
                    Some(expected) => {
                        return Err(ConvertError::BlockMismatch {
                            expected: expected.to_owned(),
                            found: found.to_owned(),
                        });
                    }
                    None => {
                        return Err(ConvertError::UnopenedBlock {
                            found: found.to_owned(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    match open.pop() {
        Some(name) => Err(ConvertError::UnclosedBlock {
            name: name.to_owned(),
        }),
        None => Ok(()),
    }
}
