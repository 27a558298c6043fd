//! Markup Lexer
//!
//! Tokenizes HTML-like source into the token stream consumed by `marq-parser`.
//! Works in three modes: document level (text, comments, declarations,
//! scriptlets), inside a tag (names, `=`, `/`, `>`), and inside an attribute
//! value. Whitespace inside tags is kept as hidden `TagWhitespace` tokens so
//! the token stream covers the source exactly.
//!
//! # Example
//!
//! ```
//! use marq_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("<br/>").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![TokenKind::TagOpen, TokenKind::TagName, TokenKind::TagSlashClose, TokenKind::Eof]
//! );
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Lexer error at line {line}, column {column}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
