//! Error types for conversion and rendering.

use thiserror::Error;

/// Structural errors raised while converting a pattern to a template.
///
/// Any of these aborts the conversion of the whole pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("unterminated quote starting at byte {position}")]
    UnterminatedQuote { position: usize },

    #[error("unterminated parenthesis starting at byte {position}")]
    UnterminatedParen { position: usize },

    #[error(r#""{{{{#{expected}}}}}" does not match "{{{{/{found}}}}}""#)]
    BlockMismatch { expected: String, found: String },

    #[error(r#""{{{{/{found}}}}}" does not close any open block"#)]
    UnopenedBlock { found: String },

    #[error(r#""{{{{#{name}}}}}" is never closed"#)]
    UnclosedBlock { name: String },
}

/// Errors raised while formatting a permalink.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(r#"cannot resolve permalink variable: ":{name}""#)]
    UnresolvedVariable { name: String },

    #[error(transparent)]
    Render(#[from] handlebars::RenderError),

    #[error("preset `{name}` expands into itself")]
    PresetCycle { name: String },

    #[error("file has no permalink structure and none was given")]
    MissingStructure,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
