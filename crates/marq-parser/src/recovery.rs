//! Error recovery.
//!
//! A failed `expect` reports the mismatch and then discards tokens until it
//! finds the one it wanted. It gives up at a synchronizing token, leaving a
//! zero-width missing token in the tree, and aborts the parse once the skip
//! budget is used up. Discarded tokens stay in the tree as skipped children,
//! so recovery never loses source text.

use marq_lexer::{Token, TokenKind};

use crate::builder::NodeHandle;
use crate::cursor::{CursorError, TokenSource};
use crate::diagnostic::{DiagnosticKind, Rule};
use crate::parser::{Abort, Parser, Step};
use crate::tree::Child;

/// Tokens that start or end a construct. Recovery stops here instead of
/// skipping them.
pub(crate) const SYNC: &[TokenKind] = &[
    TokenKind::TagOpen,
    TokenKind::TagClose,
    TokenKind::TagSlashClose,
    TokenKind::Scriptlet,
    TokenKind::HtmlComment,
    TokenKind::HtmlConditionalComment,
    TokenKind::Cdata,
    TokenKind::Eof,
];

impl<S: TokenSource> Parser<S> {
    /// Consume a token of `kind` into `node`, recovering if it is not there.
    /// Returns `None` when a missing token was substituted.
    pub(crate) fn expect(&mut self, node: &NodeHandle, kind: TokenKind) -> Step<Option<Token>> {
        match self.cursor.expect(kind) {
            Ok(lexeme) => Ok(Some(self.accept(node, lexeme))),
            Err(CursorError::Interrupted(e)) => Err(e.into()),
            Err(CursorError::Unexpected { .. }) => self.recover_expected(node, &[kind]),
        }
    }

    /// Like [`Parser::expect`] for a rule that matches any one of `kinds`.
    pub(crate) fn expect_one_of(
        &mut self,
        node: &NodeHandle,
        kinds: &[TokenKind],
    ) -> Step<Option<Token>> {
        if self.at_any(kinds)? {
            return self.bump(node).map(Some);
        }
        self.recover_expected(node, kinds)
    }

    fn recover_expected(&mut self, node: &NodeHandle, expected: &[TokenKind]) -> Step<Option<Token>> {
        let (found, span) = {
            let token = self.cursor.current()?;
            (token.kind, token.span)
        };
        self.report(
            DiagnosticKind::UnexpectedToken {
                expected: expected.to_vec(),
                found,
            },
            span,
        );

        let mut skipped = 0;
        loop {
            let current = self.peek(0)?;
            if expected.contains(&current) {
                log::debug!("resynchronized on {current} after skipping {skipped} tokens");
                return self.bump(node).map(Some);
            }
            if SYNC.contains(&current) {
                let at = self.current_span()?.empty_at_start();
                log::debug!("inserted missing {} at {at}", expected[0]);
                self.builder
                    .push(node, Child::Missing(Token::new(expected[0], "", at)));
                return Ok(None);
            }
            if skipped == self.config.max_skip {
                return self.exhausted(skipped);
            }
            self.skip(node)?;
            skipped += 1;
        }
    }

    /// Report that no alternative of `rule` starts with the current token.
    /// Nothing is consumed; the caller concludes its construct as it stands.
    pub(crate) fn no_viable(&mut self, rule: Rule, attempted: &[TokenKind]) -> Step {
        let (found, span) = {
            let token = self.cursor.current()?;
            (token.kind, token.span)
        };
        self.report(
            DiagnosticKind::NoViableAlternative {
                rule,
                attempted: attempted.to_vec(),
                found,
            },
            span,
        );
        Ok(())
    }

    /// Discard tokens that cannot continue the repetition being parsed, up to
    /// the next token in `resume` or the end of input. One diagnostic covers
    /// the whole run.
    pub(crate) fn skip_stray(&mut self, node: &NodeHandle, resume: &[TokenKind]) -> Step {
        let (found, span) = {
            let token = self.cursor.current()?;
            (token.kind, token.span)
        };
        let mut expected = resume.to_vec();
        expected.push(TokenKind::Eof);
        self.report(DiagnosticKind::UnexpectedToken { expected, found }, span);

        let mut skipped = 0;
        while !self.at_any(resume)? && !self.at(TokenKind::Eof)? {
            if skipped == self.config.max_skip {
                return self.exhausted(skipped);
            }
            self.skip(node)?;
            skipped += 1;
        }
        log::debug!("skipped {skipped} stray tokens");
        Ok(())
    }

    fn skip(&mut self, node: &NodeHandle) -> Step {
        let lexeme = self.cursor.advance()?;
        for trivia in lexeme.leading {
            self.builder.push(node, Child::Token(trivia));
        }
        log::trace!("skipping {}", lexeme.token.kind);
        self.builder.push(node, Child::Skipped(lexeme.token));
        Ok(())
    }

    fn exhausted<T>(&mut self, skipped: usize) -> Step<T> {
        let span = self.current_span()?;
        self.report(DiagnosticKind::RecoveryExhausted { skipped }, span);
        Err(Abort::Fatal)
    }
}
