//! Buffered token cursor with arbitrary lookahead.
//!
//! Hidden-channel tokens never show up in lookahead. They ride along with
//! the next significant token as its leading trivia and are handed to
//! whichever node consumes that token.

use marq_lexer::{Span, Token, TokenKind};

use crate::Interrupted;

/// A pull-based producer of tokens.
///
/// After the end of input a source must keep returning an `Eof` token. A
/// source may return [`Interrupted`] to cancel the parse; the parser stops
/// immediately and surfaces it to the caller.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Token, Interrupted>;
}

/// Token source over an already tokenized input.
#[derive(Debug)]
pub struct VecSource {
    tokens: std::vec::IntoIter<Token>,
    last: Span,
}

impl VecSource {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            last: Span::new(0, 0, 1, 1),
        }
    }
}

impl From<Vec<Token>> for VecSource {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

impl TokenSource for VecSource {
    fn next_token(&mut self) -> Result<Token, Interrupted> {
        match self.tokens.next() {
            Some(token) => {
                self.last = token.span;
                Ok(token)
            }
            None => {
                let at = Span::new(
                    self.last.end,
                    self.last.end,
                    self.last.line,
                    self.last.column,
                );
                Ok(Token::new(TokenKind::Eof, "", at))
            }
        }
    }
}

/// A significant token together with the hidden tokens that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub leading: Vec<Token>,
    pub token: Token,
}

/// Why `expect` did not consume.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CursorError {
    #[error("expected {expected}, found {found} at {span}")]
    Unexpected {
        expected: TokenKind,
        found: TokenKind,
        span: Span,
    },
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// Cursor over a [`TokenSource`].
///
/// Every pulled token stays buffered so that the position can be reset for
/// speculative parsing. Nothing is pulled past the first `Eof`; looking
/// further ahead keeps yielding that `Eof`.
pub struct TokenCursor<S> {
    source: S,
    buffer: Vec<Lexeme>,
    pos: usize,
    exhausted: bool,
}

impl<S: TokenSource> TokenCursor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            pos: 0,
            exhausted: false,
        }
    }

    /// Kind of the significant token `k` positions ahead (`0` is current).
    pub fn peek(&mut self, k: usize) -> Result<TokenKind, Interrupted> {
        Ok(self.lexeme(k)?.token.kind)
    }

    /// The current significant token.
    pub fn current(&mut self) -> Result<&Token, Interrupted> {
        Ok(&self.lexeme(0)?.token)
    }

    /// Consume and return the current token with its leading trivia. At the
    /// end of input this returns the `Eof` lexeme without moving.
    pub fn advance(&mut self) -> Result<Lexeme, Interrupted> {
        let lexeme = self.lexeme(0)?.clone();
        if !lexeme.token.is_eof() {
            self.pos += 1;
        }
        Ok(lexeme)
    }

    /// Consume the current token if it is of `kind`.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Lexeme, CursorError> {
        let (found, span) = {
            let token = self.current()?;
            (token.kind, token.span)
        };
        if found == kind {
            Ok(self.advance()?)
        } else {
            Err(CursorError::Unexpected {
                expected: kind,
                found,
                span,
            })
        }
    }

    /// Remove and return the trivia in front of the current token. Used to
    /// hand whitespace before `Eof` to the document.
    pub fn take_leading(&mut self) -> Result<Vec<Token>, Interrupted> {
        self.lexeme(0)?;
        let idx = self.index(0);
        Ok(std::mem::take(&mut self.buffer[idx].leading))
    }

    /// Index of the current significant token in the stream.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move back to a previously observed position.
    pub fn reset(&mut self, position: usize) {
        debug_assert!(position <= self.pos, "reset may only rewind");
        self.pos = position;
    }

    fn lexeme(&mut self, k: usize) -> Result<&Lexeme, Interrupted> {
        self.fill(self.pos + k)?;
        let idx = self.index(k);
        Ok(&self.buffer[idx])
    }

    fn index(&self, k: usize) -> usize {
        (self.pos + k).min(self.buffer.len() - 1)
    }

    /// Pull tokens until `upto` is buffered or the stream has ended.
    fn fill(&mut self, upto: usize) -> Result<(), Interrupted> {
        while self.buffer.len() <= upto && !self.exhausted {
            let mut leading = Vec::new();
            let token = loop {
                let token = self.source.next_token()?;
                if token.kind.is_trivia() {
                    leading.push(token);
                } else {
                    break token;
                }
            };
            self.exhausted = token.is_eof();
            self.buffer.push(Lexeme { leading, token });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cursor(source: &str) -> TokenCursor<VecSource> {
        TokenCursor::new(VecSource::new(marq_lexer::Scanner::tokenize(source).unwrap()))
    }

    struct Failing {
        left: usize,
    }

    impl TokenSource for Failing {
        fn next_token(&mut self) -> Result<Token, Interrupted> {
            if self.left == 0 {
                return Err(Interrupted {
                    reason: "stop".into(),
                });
            }
            self.left -= 1;
            Ok(Token::new(TokenKind::HtmlText, "x", Span::default()))
        }
    }

    #[test]
    fn test_peek_skips_trivia() {
        let mut c = cursor("<a  b>");
        assert_eq!(c.peek(0).unwrap(), TokenKind::TagOpen);
        assert_eq!(c.peek(1).unwrap(), TokenKind::TagName);
        assert_eq!(c.peek(2).unwrap(), TokenKind::TagName);
        assert_eq!(c.peek(3).unwrap(), TokenKind::TagClose);
        assert_eq!(c.peek(4).unwrap(), TokenKind::Eof);
        assert_eq!(c.peek(40).unwrap(), TokenKind::Eof);
    }

    #[test]
    fn test_advance_carries_leading_trivia() {
        let mut c = cursor("<a  b>");
        c.advance().unwrap();
        c.advance().unwrap();
        let b = c.advance().unwrap();
        assert_eq!(b.token.text, "b");
        assert_eq!(b.leading.len(), 1);
        assert_eq!(b.leading[0].text, "  ");
    }

    #[test]
    fn test_advance_stops_at_eof() {
        let mut c = cursor("x");
        c.advance().unwrap();
        assert_eq!(c.position(), 1);
        assert!(c.advance().unwrap().token.is_eof());
        assert!(c.advance().unwrap().token.is_eof());
        assert_eq!(c.position(), 1);
    }

    #[test]
    fn test_expect_mismatch_does_not_advance() {
        let mut c = cursor("<a>");
        let err = c.expect(TokenKind::TagName).unwrap_err();
        assert_eq!(
            err,
            CursorError::Unexpected {
                expected: TokenKind::TagName,
                found: TokenKind::TagOpen,
                span: Span::new(0, 1, 1, 1),
            }
        );
        assert_eq!(c.position(), 0);
        assert!(c.expect(TokenKind::TagOpen).is_ok());
        assert_eq!(c.position(), 1);
    }

    #[test]
    fn test_reset_replays_buffered_tokens() {
        let mut c = cursor("<a>b</a>");
        let mark = c.position();
        for _ in 0..4 {
            c.advance().unwrap();
        }
        c.reset(mark);
        assert_eq!(c.peek(0).unwrap(), TokenKind::TagOpen);
        assert_eq!(c.peek(3).unwrap(), TokenKind::HtmlText);
    }

    #[test]
    fn test_take_leading_before_eof() {
        let tokens = vec![
            Token::new(TokenKind::TagWhitespace, " ", Span::new(0, 1, 1, 1)),
            Token::new(TokenKind::Eof, "", Span::new(1, 1, 1, 2)),
        ];
        let mut c = TokenCursor::new(VecSource::new(tokens));
        assert_eq!(c.take_leading().unwrap().len(), 1);
        assert!(c.take_leading().unwrap().is_empty());
    }

    #[test]
    fn test_vec_source_synthesizes_eof() {
        let mut c = TokenCursor::new(VecSource::new(Vec::new()));
        assert_eq!(c.peek(0).unwrap(), TokenKind::Eof);
    }

    #[test]
    fn test_interruption_surfaces_from_lookahead() {
        let mut c = TokenCursor::new(Failing { left: 2 });
        assert_eq!(c.peek(1).unwrap(), TokenKind::HtmlText);
        let err = c.peek(2).unwrap_err();
        assert_eq!(err.reason, "stop");
    }
}
