//! Rewrite the placeholders of one path segment into Handlebars syntax.
//!
//! Conversion runs in two passes: [`tokenize`] produces a flat list of
//! [`Node`]s, then the last segment of a pattern gets its trailing file
//! extension peeled off the final expression before [`compile`] writes the
//! template text.

use super::scan::group_end;
use crate::error::ConvertError;

/// A parsed piece of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    /// Literal text, emitted verbatim.
    Text(String),
    /// A `:name(args)` placeholder.
    Expr(Expr),
}

/// One placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Expr {
    pub(crate) name: String,
    /// Normalized argument list; `Some("")` for an empty `()`.
    pub(crate) args: Option<String>,
}

/// What an expression turns into, decided by the first character of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExprKind {
    Variable,
    BlockOpen,
    BlockClose,
    Else,
    Partial,
    Decorator,
    Comment,
}

impl Expr {
    pub(crate) fn kind(&self) -> ExprKind {
        match self.name.chars().next() {
            Some('#') => ExprKind::BlockOpen,
            Some('/') => ExprKind::BlockClose,
            Some('^') => ExprKind::Else,
            Some('>') => ExprKind::Partial,
            Some('*') => ExprKind::Decorator,
            Some('!') => ExprKind::Comment,
            _ => ExprKind::Variable,
        }
    }

    /// Block name without its `#` or `/` marker.
    pub(crate) fn block_name(&self) -> &str {
        self.name.get(1..).unwrap_or_default()
    }

    fn write_to(&self, out: &mut String) {
        out.push_str("{{");
        match self.kind() {
            ExprKind::Else => {
                out.push_str("^}}");
                return;
            }
            ExprKind::Partial | ExprKind::Decorator => {
                out.push_str(&self.name[..1]);
                out.push(' ');
                out.push_str(&self.name[1..]);
            }
            _ => out.push_str(&self.name),
        }
        if let Some(args) = self.args.as_deref().filter(|a| !a.is_empty()) {
            out.push(' ');
            out.push_str(args);
        }
        out.push_str("}}");
    }
}

/// Convert a single segment.
///
/// `is_last` enables extension peeling on the final expression, so that
/// `:stem.html` becomes `{{stem}}.html` rather than a property lookup.
pub fn convert_segment(segment: &str, is_last: bool) -> Result<String, ConvertError> {
    let nodes = parse_segment(segment, is_last)?;
    Ok(compile(&nodes))
}

/// Tokenize and post-process a segment.
pub(crate) fn parse_segment(segment: &str, is_last: bool) -> Result<Vec<Node>, ConvertError> {
    let mut nodes = tokenize(segment)?;
    if is_last {
        peel_extension(&mut nodes);
    }
    Ok(nodes)
}

pub(crate) fn compile(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Expr(expr) => expr.write_to(&mut out),
        }
    }
    out
}

fn is_name_start(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | '!' | '*' | '>' | '^' | '/' | '#')
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | '!' | '*' | '>' | '^' | '.')
}

/// Whether the text after a `:` opens an expression.
fn starts_expression(rest: &str) -> bool {
    !rest.starts_with("//") && rest.chars().next().is_some_and(is_name_start)
}

fn tokenize(segment: &str) -> Result<Vec<Node>, ConvertError> {
    let mut nodes = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while let Some(ch) = segment[i..].chars().next() {
        match ch {
            '\\' => {
                i += 1;
                match segment[i..].chars().next() {
                    Some(escaped) => {
                        text.push(escaped);
                        i += escaped.len_utf8();
                    }
                    None => text.push('\\'),
                }
            }
            '"' => {
                let end = group_end(segment, i, 0)?;
                text.push_str(&segment[i..end]);
                i = end;
            }
            ':' if starts_expression(&segment[i + 1..]) => {
                let start = i + 1;
                let (expr, peeled, len) = parse_expression(&segment[start..], start)?;
                if !text.is_empty() {
                    nodes.push(Node::Text(std::mem::take(&mut text)));
                }
                nodes.push(Node::Expr(expr));
                text.push_str(peeled);
                i = start + len;
            }
            _ => {
                text.push(ch);
                i += ch.len_utf8();
            }
        }
    }

    if !text.is_empty() {
        nodes.push(Node::Text(text));
    }
    Ok(nodes)
}

/// Parse the expression at the start of `rest` (just past its `:`).
///
/// Returns the expression, any literal suffix peeled off its name, and the
/// number of bytes consumed.
fn parse_expression(rest: &str, offset: usize) -> Result<(Expr, &str, usize), ConvertError> {
    // `^` is an else marker on its own; what follows it is plain text.
    if rest.starts_with('^') {
        let expr = Expr {
            name: "^".to_owned(),
            args: None,
        };
        return Ok((expr, "", 1));
    }

    let mut end = 0;
    for (idx, c) in rest.char_indices() {
        let accepted = if idx == 0 {
            is_name_start(c)
        } else {
            is_name_char(c)
        };
        if !accepted || (c == '.' && rest[idx + 1..].starts_with(':')) {
            break;
        }
        end = idx + c.len_utf8();
    }
    let name = &rest[..end];

    if rest[end..].starts_with('(') {
        let close = group_end(rest, end, offset)?;
        let args = normalize_args(&rest[end + 1..close - 1], offset + end + 1)?;
        let expr = Expr {
            name: name.to_owned(),
            args: Some(args),
        };
        return Ok((expr, "", close));
    }

    let (name, peeled) = if name.starts_with('!') {
        (name, "")
    } else {
        peel_trailing(name)
    };
    let expr = Expr {
        name: name.to_owned(),
        args: None,
    };
    Ok((expr, peeled, end))
}

/// Split a dangling `.` or single `-` off the end of a name.
fn peel_trailing(name: &str) -> (&str, &str) {
    if name.len() < 2 {
        return (name, "");
    }
    if name.ends_with('.') || (name.ends_with('-') && !name.ends_with("--")) {
        let cut = name.len() - 1;
        return (&name[..cut], &name[cut..]);
    }
    (name, "")
}

/// Split an argument list on top-level commas and join with single spaces.
///
/// Quoted spans are kept intact and nested `( … )` sub-expressions are
/// normalized recursively.
fn normalize_args(inner: &str, offset: usize) -> Result<String, ConvertError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while let Some(ch) = inner[i..].chars().next() {
        match ch {
            '\\' => {
                let len = inner[i + 1..].chars().next().map_or(0, char::len_utf8);
                current.push_str(&inner[i..i + 1 + len]);
                i += 1 + len;
            }
            '"' => {
                let end = group_end(inner, i, offset)?;
                current.push_str(&inner[i..end]);
                i = end;
            }
            '(' => {
                let end = group_end(inner, i, offset)?;
                // `f(x)` becomes the sub-expression `(f x)`
                let head = current.trim_end_matches(is_name_char).len();
                let helper = current.split_off(head);
                let args = normalize_args(&inner[i + 1..end - 1], offset + i + 1)?;
                current.push('(');
                current.push_str(&helper);
                if !helper.is_empty() && !args.is_empty() {
                    current.push(' ');
                }
                current.push_str(&args);
                current.push(')');
                i = end;
            }
            ',' => {
                parts.push(std::mem::take(&mut current));
                i += 1;
            }
            _ => {
                current.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    parts.push(current);

    let args: Vec<&str> = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    Ok(args.join(" "))
}

/// Treat the last `.suffix` of the final plain variable as a file extension.
fn peel_extension(nodes: &mut Vec<Node>) {
    let Some(pos) = nodes.iter().rposition(|n| matches!(n, Node::Expr(_))) else {
        return;
    };
    let Node::Expr(expr) = &mut nodes[pos] else {
        return;
    };
    if expr.args.is_some() || expr.kind() != ExprKind::Variable {
        return;
    }
    let Some(dot) = expr.name.rfind('.') else {
        return;
    };
    if dot == 0 || dot + 1 == expr.name.len() {
        return;
    }

    let suffix = expr.name.split_off(dot);
    match nodes.get_mut(pos + 1) {
        Some(Node::Text(text)) => text.insert_str(0, &suffix),
        _ => nodes.insert(pos + 1, Node::Text(suffix)),
    }
}
