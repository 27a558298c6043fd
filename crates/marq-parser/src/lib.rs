//! Markup Parser
//!
//! Builds a lossless concrete syntax tree from the token stream produced by
//! `marq-lexer`: declarations, elements, attributes, character data,
//! comments and scriptlets. The parser is a hand-written recursive descent
//! over nine grammar rules with bounded error recovery, so malformed input
//! still yields a (possibly partial) tree plus diagnostics.
//!
//! ```text
//! Scanner::tokenize → TokenCursor → grammar rules → NodeBuilder → Parse { tree, diagnostics }
//! ```
//!
//! # Example
//!
//! ```
//! let parse = marq_parser::parse("<p class=\"x\">hi</p>").unwrap();
//! assert!(parse.diagnostics().is_empty());
//! let p = parse.tree().nodes().next().unwrap();
//! assert_eq!(p.name(), Some("p"));
//! assert_eq!(parse.tree().text(), "<p class=\"x\">hi</p>");
//! ```

pub mod builder;
pub mod config;
pub mod cursor;
pub mod diagnostic;
mod grammar;
pub mod parser;
mod recovery;
pub mod tree;
pub mod visit;

pub use config::ParserConfig;
pub use cursor::{TokenCursor, TokenSource, VecSource};
pub use diagnostic::{Diagnostic, DiagnosticKind, Rule, Severity};
pub use parser::{Parse, Parser};
pub use tree::{Child, Node, NodeKind};
pub use visit::{dump, kinds, walk, TokenRole, Visitor};

/// Raised by a [`TokenSource`] to cancel a parse in progress.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("token source interrupted: {reason}")]
pub struct Interrupted {
    pub reason: String,
}

/// Failure to produce any tree at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lexer(#[from] marq_lexer::LexerError),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// Tokenize and parse source text with the default configuration.
pub fn parse(source: &str) -> Result<Parse, ParseError> {
    parse_with(source, ParserConfig::default())
}

/// Tokenize and parse source text.
pub fn parse_with(source: &str, config: ParserConfig) -> Result<Parse, ParseError> {
    let tokens = marq_lexer::Scanner::tokenize(source)?;
    let parse = Parser::with_config(VecSource::new(tokens), config).parse()?;
    Ok(parse)
}
