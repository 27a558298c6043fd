use std::fmt;

use serde::Serialize;

/// A region of source text. `start`/`end` are byte offsets; `line` and
/// `column` locate `start` (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A zero-width span at the start of `self`.
    pub fn empty_at_start(self) -> Self {
        Self::new(self.start, self.start, self.line, self.column)
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Self {
        let first = if self.start <= other.start { self } else { other };
        Self::new(
            first.start,
            self.end.max(other.end),
            first.line,
            first.column,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token classification for markup source.
///
/// The set mirrors the three lexer modes: document level (declarations,
/// comments, text), inside a tag, and inside an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // Document level
    HtmlComment,
    HtmlConditionalComment,
    Xml,
    Cdata,
    Dtd,
    Scriptlet,
    SeaWs,
    TagOpen,
    /// An unterminated `<!--`.
    HtmlCommentOpen,
    HtmlText,

    // Inside a tag
    TagClose,
    TagSlashClose,
    TagSlash,
    TagEquals,
    TagName,
    TagWhitespace,

    // Inside an attribute value
    AttvalueValue,

    Eof,
}

impl TokenKind {
    /// Hidden-channel tokens that carry no grammatical meaning.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::TagWhitespace)
    }

    /// The literal for fixed-text tokens, the symbolic name otherwise.
    pub fn display_name(self) -> &'static str {
        match self {
            TokenKind::HtmlComment => "HTML_COMMENT",
            TokenKind::HtmlConditionalComment => "HTML_CONDITIONAL_COMMENT",
            TokenKind::Xml => "XML",
            TokenKind::Cdata => "CDATA",
            TokenKind::Dtd => "DTD",
            TokenKind::Scriptlet => "SCRIPTLET",
            TokenKind::SeaWs => "SEA_WS",
            TokenKind::TagOpen => "'<'",
            TokenKind::HtmlCommentOpen => "'<!--'",
            TokenKind::HtmlText => "HTML_TEXT",
            TokenKind::TagClose => "'>'",
            TokenKind::TagSlashClose => "'/>'",
            TokenKind::TagSlash => "'/'",
            TokenKind::TagEquals => "'='",
            TokenKind::TagName => "TAG_NAME",
            TokenKind::TagWhitespace => "TAG_WHITESPACE",
            TokenKind::AttvalueValue => "ATTVALUE_VALUE",
            TokenKind::Eof => "<EOF>",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A token produced by the markup lexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_names() {
        assert_eq!(TokenKind::TagOpen.to_string(), "'<'");
        assert_eq!(TokenKind::TagSlashClose.to_string(), "'/>'");
        assert_eq!(TokenKind::TagName.to_string(), "TAG_NAME");
        assert_eq!(TokenKind::Eof.to_string(), "<EOF>");
    }

    #[test]
    fn test_only_tag_whitespace_is_trivia() {
        assert!(TokenKind::TagWhitespace.is_trivia());
        assert!(!TokenKind::SeaWs.is_trivia());
        assert!(!TokenKind::HtmlText.is_trivia());
    }

    #[test]
    fn test_span_cover() {
        let a = Span::new(2, 5, 1, 3);
        let b = Span::new(7, 9, 2, 1);
        assert_eq!(a.cover(b), Span::new(2, 9, 1, 3));
        assert_eq!(b.cover(a), Span::new(2, 9, 1, 3));
    }
}
