//! Grammar rules.
//!
//! One method per rule. Alternatives are chosen from the current token kind
//! against the FIRST sets below; the only place that looks further ahead is
//! the optional body of a start tag (see [`Parser::element_body`]).

use marq_lexer::TokenKind;

use crate::builder::NodeHandle;
use crate::cursor::TokenSource;
use crate::diagnostic::{DiagnosticKind, Rule};
use crate::parser::{Abort, Parser, Step};
use crate::tree::{Child, Node, NodeKind};

/// Tokens that can start `htmlElements`.
const ELEMENTS_FIRST: &[TokenKind] = &[
    TokenKind::Scriptlet,
    TokenKind::TagOpen,
    TokenKind::HtmlComment,
    TokenKind::HtmlConditionalComment,
    TokenKind::SeaWs,
];

const SCRIPTLET_OR_SEA_WS_FIRST: &[TokenKind] = &[TokenKind::Scriptlet, TokenKind::SeaWs];
const ELEMENT_FIRST: &[TokenKind] = &[TokenKind::TagOpen, TokenKind::Scriptlet];
const MISC_FIRST: &[TokenKind] = &[
    TokenKind::HtmlComment,
    TokenKind::HtmlConditionalComment,
    TokenKind::SeaWs,
];
const CHARDATA_FIRST: &[TokenKind] = &[TokenKind::HtmlText, TokenKind::SeaWs];
/// Tokens that can continue `htmlContent`; `</` ends it.
const CONTENT_FIRST: &[TokenKind] = &[
    TokenKind::HtmlText,
    TokenKind::SeaWs,
    TokenKind::TagOpen,
    TokenKind::Scriptlet,
    TokenKind::Cdata,
    TokenKind::HtmlComment,
    TokenKind::HtmlConditionalComment,
];
const COMMENT_FIRST: &[TokenKind] = &[TokenKind::HtmlComment, TokenKind::HtmlConditionalComment];
const TAG_END: &[TokenKind] = &[TokenKind::TagClose, TokenKind::TagSlashClose];

impl<S: TokenSource> Parser<S> {
    // =========================================================================
    // Document level
    // =========================================================================

    /// `scriptletOrSeaWs* XML? scriptletOrSeaWs* DTD? scriptletOrSeaWs* htmlElements*`
    pub(crate) fn document(&mut self) -> Step<Node> {
        let doc = self.open(NodeKind::Document)?;

        self.scriptlets_or_sea_ws(&doc)?;
        if self.at(TokenKind::Xml)? {
            self.bump(&doc)?;
        }
        self.scriptlets_or_sea_ws(&doc)?;
        if self.at(TokenKind::Dtd)? {
            self.bump(&doc)?;
        }
        self.scriptlets_or_sea_ws(&doc)?;

        loop {
            while self.at_any(ELEMENTS_FIRST)? {
                self.html_elements(&doc)?;
            }
            if self.at(TokenKind::Eof)? {
                break;
            }
            self.skip_stray(&doc, ELEMENTS_FIRST)?;
        }

        for trivia in self.cursor.take_leading()? {
            self.builder.push(&doc, Child::Token(trivia));
        }
        Ok(self.builder.close(doc))
    }

    fn scriptlets_or_sea_ws(&mut self, doc: &NodeHandle) -> Step {
        while self.at_any(SCRIPTLET_OR_SEA_WS_FIRST)? {
            self.scriptlet_or_sea_ws(doc)?;
        }
        Ok(())
    }

    fn scriptlet_or_sea_ws(&mut self, parent: &NodeHandle) -> Step {
        let node = self.open(NodeKind::ScriptletOrSeaWs)?;
        self.expect_one_of(&node, SCRIPTLET_OR_SEA_WS_FIRST)?;
        self.builder.close_into(node, parent);
        Ok(())
    }

    /// `htmlMisc* htmlElement htmlMisc*`, flattened into the document.
    fn html_elements(&mut self, doc: &NodeHandle) -> Step {
        while self.at_any(MISC_FIRST)? {
            self.html_misc(doc)?;
        }
        self.html_element(doc)?;
        while self.at_any(MISC_FIRST)? {
            self.html_misc(doc)?;
        }
        Ok(())
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn html_element(&mut self, parent: &NodeHandle) -> Step {
        match self.peek(0)? {
            TokenKind::TagOpen => self.tag_element(parent),
            TokenKind::Scriptlet => {
                let el = self.open(NodeKind::Element)?;
                self.bump(&el)?;
                self.builder.close_into(el, parent);
                Ok(())
            }
            _ => self.no_viable(Rule::HtmlElement, ELEMENT_FIRST),
        }
    }

    /// `< NAME attribute* ( > body? | /> )`
    fn tag_element(&mut self, parent: &NodeHandle) -> Step {
        self.enter_element()?;
        let el = self.open(NodeKind::Element)?;
        self.bump(&el)?;

        let name = self.expect(&el, TokenKind::TagName)?.map(|t| t.text);
        if let Some(name) = &name {
            self.builder.set_name(&el, name.as_str());
        }

        while self.at(TokenKind::TagName)? {
            self.html_attribute(&el)?;
        }

        match self.peek(0)? {
            TokenKind::TagClose => {
                self.bump(&el)?;
                self.element_body(&el, name.as_deref())?;
            }
            TokenKind::TagSlashClose => {
                self.bump(&el)?;
            }
            _ => self.no_viable(Rule::HtmlElement, TAG_END)?,
        }

        self.depth -= 1;
        self.builder.close_into(el, parent);
        Ok(())
    }

    fn enter_element(&mut self) -> Step {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            let span = self.current_span()?;
            let limit = self.config.max_depth;
            self.report(DiagnosticKind::NestingLimit { limit }, span);
            return Err(Abort::Fatal);
        }
        Ok(())
    }

    /// The optional `htmlContent </NAME>` after a start tag's `>`.
    ///
    /// When `</` follows immediately the body is empty. Otherwise the content
    /// is parsed speculatively. Content only stops at `</` or at the end of
    /// input, since stray tokens inside it are skipped. It is kept when it
    /// stops at `</`, or at the end of input after consuming something (the
    /// close tag is then reported missing). An element with nothing after
    /// `>` has no body, as in `<input disabled>`. The decision depends only
    /// on the token position, so it is remembered and never speculated twice.
    fn element_body(&mut self, el: &NodeHandle, name: Option<&str>) -> Step {
        if self.at_close_tag()? {
            let content = self.open(NodeKind::Content)?;
            self.builder.close_into(content, el);
            return self.close_tag(el, name);
        }

        let position = self.cursor.position();
        match self.body_decisions.get(&position).copied() {
            Some(true) => self.html_content(el)?,
            Some(false) => return Ok(()),
            None => {
                log::trace!(
                    "speculating on body of <{}> at token {position}",
                    name.unwrap_or("")
                );
                let mark = self.mark();
                self.html_content(el)?;
                let has_body = self.at_close_tag()?
                    || (self.at(TokenKind::Eof)? && self.cursor.position() > position);
                self.body_decisions.insert(position, has_body);
                if !has_body {
                    log::debug!(
                        "<{}> has no close tag, rewinding to token {position}",
                        name.unwrap_or("")
                    );
                    self.reset(mark);
                    return Ok(());
                }
            }
        }
        self.close_tag(el, name)
    }

    /// `< / NAME >`, checked against the start tag's name.
    fn close_tag(&mut self, el: &NodeHandle, open_name: Option<&str>) -> Step {
        if self.expect(el, TokenKind::TagOpen)?.is_none() {
            return Ok(());
        }
        self.expect(el, TokenKind::TagSlash)?;
        if let Some(close) = self.expect(el, TokenKind::TagName)? {
            if let Some(open_name) = open_name {
                if open_name != close.text {
                    self.report(
                        DiagnosticKind::TagMismatch {
                            open_name: open_name.to_string(),
                            close_name: close.text,
                        },
                        close.span,
                    );
                }
            }
        }
        self.expect(el, TokenKind::TagClose)?;
        Ok(())
    }

    fn html_attribute(&mut self, el: &NodeHandle) -> Step {
        let attr = self.open(NodeKind::Attribute)?;
        if let Some(name) = self.expect(&attr, TokenKind::TagName)? {
            self.builder.set_name(&attr, name.text);
        }
        if self.at(TokenKind::TagEquals)? {
            self.bump(&attr)?;
            self.expect(&attr, TokenKind::AttvalueValue)?;
        }
        self.builder.close_into(attr, el);
        Ok(())
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// `htmlChardata? ((htmlElement | CDATA | htmlComment) htmlChardata?)*`
    fn html_content(&mut self, el: &NodeHandle) -> Step {
        let content = self.open(NodeKind::Content)?;
        self.optional_chardata(&content)?;
        loop {
            match self.peek(0)? {
                TokenKind::TagOpen if self.peek(1)? == TokenKind::TagSlash => break,
                TokenKind::TagOpen | TokenKind::Scriptlet => self.html_element(&content)?,
                TokenKind::Cdata => {
                    self.bump(&content)?;
                }
                TokenKind::HtmlComment | TokenKind::HtmlConditionalComment => {
                    self.html_comment(&content)?
                }
                // Adjacent text runs only come from hand-built token streams.
                TokenKind::HtmlText | TokenKind::SeaWs => self.html_chardata(&content)?,
                TokenKind::Eof => break,
                // DTD, XML or an unterminated `<!--` inside a body.
                _ => self.skip_stray(&content, CONTENT_FIRST)?,
            }
            self.optional_chardata(&content)?;
        }
        self.builder.close_into(content, el);
        Ok(())
    }

    fn optional_chardata(&mut self, parent: &NodeHandle) -> Step {
        if self.at_any(CHARDATA_FIRST)? {
            self.html_chardata(parent)?;
        }
        Ok(())
    }

    fn html_chardata(&mut self, parent: &NodeHandle) -> Step {
        let node = self.open(NodeKind::CharData)?;
        self.expect_one_of(&node, CHARDATA_FIRST)?;
        self.builder.close_into(node, parent);
        Ok(())
    }

    fn html_misc(&mut self, parent: &NodeHandle) -> Step {
        let misc = self.open(NodeKind::Misc)?;
        match self.peek(0)? {
            TokenKind::SeaWs => {
                self.bump(&misc)?;
            }
            TokenKind::HtmlComment | TokenKind::HtmlConditionalComment => {
                self.html_comment(&misc)?
            }
            _ => self.no_viable(Rule::HtmlMisc, MISC_FIRST)?,
        }
        self.builder.close_into(misc, parent);
        Ok(())
    }

    fn html_comment(&mut self, parent: &NodeHandle) -> Step {
        let comment = self.open(NodeKind::Comment)?;
        self.expect_one_of(&comment, COMMENT_FIRST)?;
        self.builder.close_into(comment, parent);
        Ok(())
    }
}
