//! Parser driver.
//!
//! Owns the cursor, the node builder and the diagnostics for one parse. The
//! grammar rules live in `grammar.rs` and the recovery strategy in
//! `recovery.rs`; both are further `impl` blocks on [`Parser`].

use std::collections::HashMap;

use marq_lexer::{Span, Token, TokenKind};

use crate::builder::{Checkpoint, NodeBuilder, NodeHandle};
use crate::config::ParserConfig;
use crate::cursor::{Lexeme, TokenCursor, TokenSource, VecSource};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::tree::{Child, Node, NodeKind};
use crate::Interrupted;

/// Result of a parse: the document tree and everything reported on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Parse {
    tree: Node,
    diagnostics: Vec<Diagnostic>,
}

impl Parse {
    /// The `Document` root.
    pub fn tree(&self) -> &Node {
        &self.tree
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// False when a fatal diagnostic stopped the parse before the end of input.
    pub fn is_complete(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_fatal)
    }
}

/// Why a rule stopped without finishing.
#[derive(Debug)]
pub(crate) enum Abort {
    /// A fatal diagnostic has been recorded.
    Fatal,
    Interrupted(Interrupted),
}

impl From<Interrupted> for Abort {
    fn from(e: Interrupted) -> Self {
        Abort::Interrupted(e)
    }
}

pub(crate) type Step<T = ()> = Result<T, Abort>;

/// Restorable parser state for the one speculative decision in the grammar.
pub(crate) struct Mark {
    position: usize,
    checkpoint: Checkpoint,
    diagnostics: usize,
}

/// Markup parser.
///
/// Consumes a [`TokenSource`] and produces a [`Parse`]. Each parser owns all
/// of its state, so independent parses can run on separate threads.
pub struct Parser<S> {
    pub(crate) cursor: TokenCursor<S>,
    pub(crate) builder: NodeBuilder,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) config: ParserConfig,
    pub(crate) depth: usize,
    /// Whether the start tag whose `>` precedes a token position has a body.
    pub(crate) body_decisions: HashMap<usize, bool>,
}

impl Parser<VecSource> {
    /// Create a parser over already tokenized input.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self::new(VecSource::new(tokens))
    }
}

impl<S: TokenSource> Parser<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ParserConfig::default())
    }

    pub fn with_config(source: S, config: ParserConfig) -> Self {
        Self {
            cursor: TokenCursor::new(source),
            builder: NodeBuilder::new(),
            diagnostics: Vec::new(),
            config,
            depth: 0,
            body_decisions: HashMap::new(),
        }
    }

    /// Parse the whole input.
    ///
    /// Malformed input never fails: problems are reported as diagnostics and
    /// a fatal one leaves a partial tree. Only an interruption raised by the
    /// token source is returned as an error.
    pub fn parse(mut self) -> Result<Parse, Interrupted> {
        let tree = match self.document() {
            Ok(tree) => tree,
            Err(Abort::Fatal) => {
                log::debug!("parse abandoned with {} open nodes", self.builder.depth());
                self.builder.finish_partial().unwrap_or_else(|| {
                    Node::new(NodeKind::Document, None, Span::default(), Vec::new())
                })
            }
            Err(Abort::Interrupted(e)) => return Err(e),
        };

        Ok(Parse {
            tree,
            diagnostics: self.diagnostics,
        })
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    pub(crate) fn peek(&mut self, k: usize) -> Step<TokenKind> {
        Ok(self.cursor.peek(k)?)
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> Step<bool> {
        Ok(self.peek(0)? == kind)
    }

    pub(crate) fn at_any(&mut self, kinds: &[TokenKind]) -> Step<bool> {
        let current = self.peek(0)?;
        Ok(kinds.contains(&current))
    }

    /// `</`, the start of a close tag.
    pub(crate) fn at_close_tag(&mut self) -> Step<bool> {
        Ok(self.peek(0)? == TokenKind::TagOpen && self.peek(1)? == TokenKind::TagSlash)
    }

    pub(crate) fn current_span(&mut self) -> Step<Span> {
        Ok(self.cursor.current()?.span)
    }

    /// Open a node positioned at the current token.
    pub(crate) fn open(&mut self, kind: NodeKind) -> Step<NodeHandle> {
        let at = self.current_span()?;
        Ok(self.builder.open(kind, at))
    }

    /// Consume the current token into `node` and return it.
    pub(crate) fn bump(&mut self, node: &NodeHandle) -> Step<Token> {
        let lexeme = self.cursor.advance()?;
        Ok(self.accept(node, lexeme))
    }

    /// Attach a consumed token and its leading trivia to `node`.
    pub(crate) fn accept(&mut self, node: &NodeHandle, lexeme: Lexeme) -> Token {
        for trivia in lexeme.leading {
            self.builder.push(node, Child::Token(trivia));
        }
        self.builder.push(node, Child::Token(lexeme.token.clone()));
        lexeme.token
    }

    pub(crate) fn report(&mut self, kind: DiagnosticKind, span: Span) {
        let diagnostic = Diagnostic::new(kind, span);
        log::debug!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            position: self.cursor.position(),
            checkpoint: self.builder.checkpoint(),
            diagnostics: self.diagnostics.len(),
        }
    }

    pub(crate) fn reset(&mut self, mark: Mark) {
        self.cursor.reset(mark.position);
        self.builder.rollback(mark.checkpoint);
        self.diagnostics.truncate(mark.diagnostics);
    }
}
