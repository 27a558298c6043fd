use crate::token::{Span, Token, TokenKind};
use crate::LexerError;

/// Scanner mode determines which token set applies at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerMode {
    /// Default mode: text, comments, declarations, scriptlets, `<`.
    Document,
    /// After `<`: tag names, `=`, `/`, `/>`, `>`.
    Tag,
    /// After `=` inside a tag: exactly one attribute value.
    AttributeValue,
}

/// Markup source scanner.
///
/// Tokenizes markup into a flat stream of tokens whose texts, concatenated,
/// reproduce the source. Constructs that must be terminated (comments aside)
/// are reported as errors when the terminator is missing; an unterminated
/// `<!--` becomes a `HtmlCommentOpen` token so editors can keep going.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    mode: ScannerMode,
    start_offset: usize,
    start_line: usize,
    start_column: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            mode: ScannerMode::Document,
            start_offset: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Tokenize the entire source into a vector of tokens ending with `Eof`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }

    /// Scan all tokens from the source.
    fn scan_tokens(&mut self) -> Result<(), LexerError> {
        while !self.is_at_end() {
            self.begin();
            match self.mode {
                ScannerMode::Document => self.scan_document()?,
                ScannerMode::Tag => self.scan_tag()?,
                ScannerMode::AttributeValue => self.scan_attribute_value()?,
            }
        }

        self.begin();
        self.emit(TokenKind::Eof);
        Ok(())
    }

    // --- Document mode ---

    fn scan_document(&mut self) -> Result<(), LexerError> {
        if self.peek() != '<' {
            return self.scan_text();
        }

        if self.starts_with("<!--") {
            match self.find_after("<!--", "-->") {
                Some(end) => {
                    self.advance_to(end);
                    self.emit(TokenKind::HtmlComment);
                }
                None => {
                    self.advance_to(self.offset + "<!--".len());
                    self.emit(TokenKind::HtmlCommentOpen);
                }
            }
            return Ok(());
        }

        if self.starts_with("<![CDATA[") {
            return self.scan_delimited("<![CDATA[", "]]>", TokenKind::Cdata, "CDATA section");
        }
        if self.starts_with("<![") {
            return self.scan_delimited(
                "<![",
                "]>",
                TokenKind::HtmlConditionalComment,
                "conditional comment",
            );
        }
        if self.starts_with("<?xml") {
            return self.scan_delimited("<?xml", ">", TokenKind::Xml, "XML declaration");
        }
        if self.starts_with("<?") {
            return self.scan_delimited("<?", "?>", TokenKind::Scriptlet, "scriptlet");
        }
        if self.starts_with("<%") {
            return self.scan_delimited("<%", "%>", TokenKind::Scriptlet, "scriptlet");
        }
        if self.starts_with("<!") {
            return self.scan_delimited("<!", ">", TokenKind::Dtd, "declaration");
        }

        self.advance();
        self.emit(TokenKind::TagOpen);
        self.mode = ScannerMode::Tag;
        Ok(())
    }

    /// Scan a construct running from `open` to the first `close` after it.
    fn scan_delimited(
        &mut self,
        open: &str,
        close: &str,
        kind: TokenKind,
        what: &str,
    ) -> Result<(), LexerError> {
        match self.find_after(open, close) {
            Some(end) => {
                self.advance_to(end);
                self.emit(kind);
                Ok(())
            }
            None => Err(self.error_at_start(format!("Unterminated {what}"))),
        }
    }

    /// Scan a run of character data up to the next `<`.
    fn scan_text(&mut self) -> Result<(), LexerError> {
        while !self.is_at_end() && self.peek() != '<' {
            self.advance();
        }

        let text = &self.source[self.start_offset..self.offset];
        let kind = if is_sea_ws(text) {
            TokenKind::SeaWs
        } else {
            TokenKind::HtmlText
        };
        self.emit(kind);
        Ok(())
    }

    // --- Tag mode ---

    fn scan_tag(&mut self) -> Result<(), LexerError> {
        let ch = self.peek();

        match ch {
            ' ' | '\t' | '\r' | '\n' => {
                while matches!(self.peek(), ' ' | '\t' | '\r' | '\n') && !self.is_at_end() {
                    self.advance();
                }
                self.emit(TokenKind::TagWhitespace);
            }
            '>' => {
                self.advance();
                self.emit(TokenKind::TagClose);
                self.mode = ScannerMode::Document;
            }
            '/' if self.peek_next() == '>' => {
                self.advance();
                self.advance();
                self.emit(TokenKind::TagSlashClose);
                self.mode = ScannerMode::Document;
            }
            '/' => {
                self.advance();
                self.emit(TokenKind::TagSlash);
            }
            '=' => {
                self.advance();
                self.emit(TokenKind::TagEquals);
                self.mode = ScannerMode::AttributeValue;
            }
            c if is_name_start(c) => {
                while !self.is_at_end() && is_name_char(self.peek()) {
                    self.advance();
                }
                self.emit(TokenKind::TagName);
            }
            _ => return Err(self.error(format!("Unexpected character in tag: '{ch}'"))),
        }

        Ok(())
    }

    // --- Attribute value mode ---

    /// Scan one attribute value, including any leading spaces.
    fn scan_attribute_value(&mut self) -> Result<(), LexerError> {
        while self.peek() == ' ' && !self.is_at_end() {
            self.advance();
        }

        match self.peek() {
            quote @ ('"' | '\'') => {
                self.advance();
                while !self.is_at_end() && self.peek() != quote && self.peek() != '<' {
                    self.advance();
                }
                if self.peek() != quote || self.is_at_end() {
                    return Err(self.error_at_start("Unterminated attribute value".into()));
                }
                self.advance();
            }
            c if is_attribute_char(c) && !self.is_at_end() => {
                let digits_start = self.offset;
                while !self.is_at_end() && is_attribute_char(self.peek()) {
                    self.advance();
                }
                let scanned = &self.source[digits_start..self.offset];
                if self.peek() == '%' && scanned.bytes().all(|b| b.is_ascii_digit()) {
                    self.advance();
                } else if self.peek() == ' ' {
                    // An unquoted value may absorb one trailing space.
                    self.advance();
                }
            }
            _ => return Err(self.error("Expected attribute value".into())),
        }

        self.emit(TokenKind::AttvalueValue);
        self.mode = ScannerMode::Tag;
        Ok(())
    }

    // --- Helpers ---

    fn begin(&mut self) {
        self.start_offset = self.offset;
        self.start_line = self.line;
        self.start_column = self.column;
    }

    fn emit(&mut self, kind: TokenKind) {
        let span = Span::new(
            self.start_offset,
            self.offset,
            self.start_line,
            self.start_column,
        );
        let text = &self.source[self.start_offset..self.offset];
        self.tokens.push(Token::new(kind, text, span));
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.source[self.offset..].starts_with(pattern)
    }

    /// Byte offset just past the first `close` following `open` at the current
    /// position, if any.
    fn find_after(&self, open: &str, close: &str) -> Option<usize> {
        let from = self.offset + open.len();
        self.source[from..]
            .find(close)
            .map(|idx| from + idx + close.len())
    }

    fn advance_to(&mut self, byte_offset: usize) {
        while self.offset < byte_offset && !self.is_at_end() {
            self.advance();
        }
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.pos]
        }
    }

    fn peek_next(&self) -> char {
        if self.pos + 1 >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.pos + 1]
        }
    }

    fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }
        let ch = self.chars[self.pos];
        self.pos += 1;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    fn error_at_start(&self, message: String) -> LexerError {
        LexerError {
            message,
            line: self.start_line,
            column: self.start_column,
        }
    }
}

/// Whitespace made only of spaces, tabs and (`\r`-optional) newlines.
fn is_sea_ws(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\n' => i += 1,
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => i += 2,
            _ => return false,
        }
    }
    !bytes.is_empty()
}

fn is_name_start(c: char) -> bool {
    c == ':' || c.is_alphabetic()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || matches!(c, '-' | '_' | '.' | '\u{B7}')
}

fn is_attribute_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '_' | '.' | '/' | '+' | ',' | '?' | '=' | ':' | ';' | '#'
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        Scanner::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    // =========================================================================
    // Document level
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(kinds("hello world"), vec![TokenKind::HtmlText, TokenKind::Eof]);
    }

    #[test]
    fn test_whitespace_only_is_sea_ws() {
        assert_eq!(kinds(" \t\r\n  "), vec![TokenKind::SeaWs, TokenKind::Eof]);
    }

    #[test]
    fn test_lone_carriage_return_is_text() {
        assert_eq!(kinds(" \r "), vec![TokenKind::HtmlText, TokenKind::Eof]);
    }

    #[test]
    fn test_text_with_leading_whitespace_is_text() {
        assert_eq!(texts("\n  hi"), vec!["\n  hi", ""]);
        assert_eq!(kinds("\n  hi"), vec![TokenKind::HtmlText, TokenKind::Eof]);
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            kinds("<!-- a -- b -->"),
            vec![TokenKind::HtmlComment, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_comment_opens() {
        assert_eq!(
            kinds("<!-- never closed"),
            vec![TokenKind::HtmlCommentOpen, TokenKind::HtmlText, TokenKind::Eof]
        );
    }

    #[test]
    fn test_conditional_comment() {
        assert_eq!(
            kinds("<![if IE]>"),
            vec![TokenKind::HtmlConditionalComment, TokenKind::Eof]
        );
    }

    #[test]
    fn test_cdata_wins_over_conditional_comment() {
        assert_eq!(
            kinds("<![CDATA[x < y]]>"),
            vec![TokenKind::Cdata, TokenKind::Eof]
        );
    }

    #[test]
    fn test_xml_declaration() {
        assert_eq!(
            kinds("<?xml version=\"1.0\"?>"),
            vec![TokenKind::Xml, TokenKind::Eof]
        );
    }

    #[test]
    fn test_scriptlets() {
        assert_eq!(
            kinds("<?php echo 1; ?><% x %>"),
            vec![TokenKind::Scriptlet, TokenKind::Scriptlet, TokenKind::Eof]
        );
    }

    #[test]
    fn test_doctype() {
        assert_eq!(
            kinds("<!DOCTYPE html>\n"),
            vec![TokenKind::Dtd, TokenKind::SeaWs, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_scriptlet_is_error() {
        let err = Scanner::tokenize("a\n<?php echo").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
        assert!(err.message.contains("scriptlet"));
    }

    // =========================================================================
    // Tags
    // =========================================================================

    #[test]
    fn test_self_closing_tag() {
        assert_eq!(
            kinds("<img src=\"a.png\"/>"),
            vec![
                TokenKind::TagOpen,
                TokenKind::TagName,
                TokenKind::TagWhitespace,
                TokenKind::TagName,
                TokenKind::TagEquals,
                TokenKind::AttvalueValue,
                TokenKind::TagSlashClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_close_tag() {
        assert_eq!(
            kinds("</div>"),
            vec![
                TokenKind::TagOpen,
                TokenKind::TagSlash,
                TokenKind::TagName,
                TokenKind::TagClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_text_after_tag_returns_to_document_mode() {
        assert_eq!(
            kinds("<p>a b</p>"),
            vec![
                TokenKind::TagOpen,
                TokenKind::TagName,
                TokenKind::TagClose,
                TokenKind::HtmlText,
                TokenKind::TagOpen,
                TokenKind::TagSlash,
                TokenKind::TagName,
                TokenKind::TagClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_namespaced_and_dashed_names() {
        assert_eq!(
            texts("<svg:rect data-x.y>"),
            vec!["<", "svg:rect", " ", "data-x.y", ">", ""]
        );
    }

    #[test]
    fn test_unexpected_character_in_tag() {
        let err = Scanner::tokenize("<div @click>").unwrap_err();
        assert_eq!(err.column, 6);
        assert!(err.message.contains('@'));
    }

    // =========================================================================
    // Attribute values
    // =========================================================================

    #[test]
    fn test_single_quoted_value() {
        assert_eq!(texts("<a b='c d'>")[5], "'c d'");
    }

    #[test]
    fn test_value_keeps_leading_spaces() {
        assert_eq!(texts("<a b=  \"c\">")[5], "  \"c\"");
    }

    #[test]
    fn test_unquoted_value_absorbs_one_space() {
        assert_eq!(
            texts("<a href=/x/y  >"),
            vec!["<", "a", " ", "href", "=", "/x/y ", " ", ">", ""]
        );
    }

    #[test]
    fn test_percentage_value() {
        assert_eq!(texts("<td width=50%>")[5], "50%");
    }

    #[test]
    fn test_unterminated_quoted_value() {
        let err = Scanner::tokenize("<a href=\"x>").unwrap_err();
        assert!(err.message.contains("Unterminated attribute value"));
    }

    #[test]
    fn test_missing_value() {
        let err = Scanner::tokenize("<a href=>").unwrap_err();
        assert!(err.message.contains("Expected attribute value"));
    }

    // =========================================================================
    // Positions
    // =========================================================================

    #[test]
    fn test_spans_are_byte_offsets_with_line_columns() {
        let tokens = Scanner::tokenize("é\n<b>").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 3, 1, 1));
        assert_eq!(tokens[1].span, Span::new(3, 4, 2, 1));
        assert_eq!(tokens[2].span, Span::new(4, 5, 2, 2));
        assert_eq!(tokens[4].span, Span::new(6, 6, 2, 4));
    }

    #[test]
    fn test_token_texts_cover_source() {
        let source = "<?xml version=\"1.0\"?>\n<!DOCTYPE x>\n<r a=1 b><![CDATA[z]]><!--c--></r>\n";
        let rebuilt: String = Scanner::tokenize(source)
            .unwrap()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(rebuilt, source);
    }
}
