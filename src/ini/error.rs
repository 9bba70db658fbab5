use std::io;

use thiserror::Error;

/// Structural parse failure at the furthest point the recognizer reached.
///
/// `line` and `column` are zero based; `Display` shows them one based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}:{}: parse failed, parsing: {}", .line + 1, .column + 1, .rule_name)]
pub struct ParseError {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    /// The most specific grammar rule that failed there.
    pub rule_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("unexpected escape sequence: {0}")]
    Sequence(String),
    #[error("unexpected quote sequence: {0}")]
    Quote(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Escape(#[from] EscapeError),

    #[error("unexpected AST node: {0}")]
    InvalidAst(String),

    #[error("failed to read input: {0}")]
    Read(#[from] io::Error),
}
