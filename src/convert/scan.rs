//! Quote and parenthesis matching shared by the splitter and the converter.

use crate::error::ConvertError;

/// Kind of construct left open while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Paren,
    Quote,
}

/// An open construct and the byte offset of its opener.
#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    start: usize,
}

impl Frame {
    fn unterminated(self, offset: usize) -> ConvertError {
        let position = offset + self.start;
        match self.kind {
            FrameKind::Paren => ConvertError::UnterminatedParen { position },
            FrameKind::Quote => ConvertError::UnterminatedQuote { position },
        }
    }
}

/// Find the end of the group opened at `src[start]`, which must be `(` or `"`.
///
/// Returns the byte offset just past the matching closer. Inside a paren group
/// nested parens and quoted spans are tracked on a frame stack; inside a quote
/// only an unescaped `"` closes. Error positions are reported relative to
/// `offset`, so callers scanning a slice can report pattern coordinates.
pub(crate) fn group_end(src: &str, start: usize, offset: usize) -> Result<usize, ConvertError> {
    let bytes = src.as_bytes();
    let kind = match bytes.get(start) {
        Some(b'(') => FrameKind::Paren,
        Some(b'"') => FrameKind::Quote,
        _ => return Ok(start),
    };

    let mut stack = vec![Frame { kind, start }];
    let mut i = start + 1;

    while i < bytes.len() {
        // Only ASCII bytes are significant; multi-byte sequences never match.
        let in_quote = stack.last().is_some_and(|f| f.kind == FrameKind::Quote);
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'"' if in_quote => {
                stack.pop();
            }
            b'"' => stack.push(Frame {
                kind: FrameKind::Quote,
                start: i,
            }),
            b'(' if !in_quote => stack.push(Frame {
                kind: FrameKind::Paren,
                start: i,
            }),
            b')' if !in_quote => {
                stack.pop();
            }
            _ => {}
        }
        i += 1;
        if stack.is_empty() {
            return Ok(i);
        }
    }

    // Report the outermost construct that never closed.
    Err(stack[0].unterminated(offset))
}
