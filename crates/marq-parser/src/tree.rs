//! Concrete parse tree.
//!
//! One tagged [`Node`] type covers every grammar rule; tokens and child nodes
//! are interleaved in document order so that the tree is lossless.

use marq_lexer::{Span, Token, TokenKind};
use serde::Serialize;

use crate::visit::{self, TextCollector};

/// The grammar construct a node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// Root of every tree.
    Document,
    /// A scriptlet or whitespace run before the first element.
    ScriptletOrSeaWs,
    /// A tag element or a bare scriptlet in element position.
    Element,
    /// The body of an element between its start and close tags.
    Content,
    Attribute,
    CharData,
    /// Whitespace or a comment between elements.
    Misc,
    Comment,
}

/// One entry of a node's ordered child sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Child {
    Node(Node),
    /// A token the rule matched, including hidden whitespace.
    Token(Token),
    /// A zero-width token substituted during recovery.
    Missing(Token),
    /// A token discarded during recovery.
    Skipped(Token),
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Child::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Child::Node(node) => node.span,
            Child::Token(token) | Child::Missing(token) | Child::Skipped(token) => token.span,
        }
    }

    /// True for the children that carry grammatical meaning: nodes and
    /// matched, non-whitespace tokens.
    pub fn is_significant(&self) -> bool {
        match self {
            Child::Node(_) => true,
            Child::Token(token) => !token.kind.is_trivia(),
            Child::Missing(_) | Child::Skipped(_) => false,
        }
    }
}

/// A syntax tree node. Built once by the parser and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    span: Span,
    children: Vec<Child>,
}

impl Node {
    pub(crate) fn new(
        kind: NodeKind,
        name: Option<String>,
        span: Span,
        children: Vec<Child>,
    ) -> Self {
        Self {
            kind,
            name,
            span,
            children,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Tag name for elements (the start tag's name), attribute name for
    /// attributes.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// All children in document order.
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Children without hidden whitespace, missing or skipped tokens.
    pub fn significant_children(&self) -> impl Iterator<Item = &Child> {
        self.children.iter().filter(|c| c.is_significant())
    }

    /// Child nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(Child::as_node)
    }

    /// Matched tokens directly owned by this node.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(Child::as_token)
    }

    /// First matched token of the given kind directly owned by this node.
    pub fn token(&self, kind: TokenKind) -> Option<&Token> {
        self.tokens().find(|t| t.kind == kind)
    }

    /// First child node of the given kind.
    pub fn child(&self, kind: NodeKind) -> Option<&Node> {
        self.nodes().find(|n| n.kind == kind)
    }

    /// The body of an element, if it has one.
    pub fn content(&self) -> Option<&Node> {
        self.child(NodeKind::Content)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Node> {
        self.nodes().filter(|n| n.kind == NodeKind::Attribute)
    }

    /// Attribute value with surrounding quotes and padding removed. `None`
    /// for a value-less attribute or a node that is not an attribute.
    pub fn value(&self) -> Option<&str> {
        if self.kind != NodeKind::Attribute {
            return None;
        }
        self.token(TokenKind::AttvalueValue)
            .map(|t| unquote(t.text.trim()))
    }

    /// True for a `/>` element.
    pub fn is_self_closing(&self) -> bool {
        self.token(TokenKind::TagSlashClose).is_some()
    }

    /// The source text covered by this node: every matched and skipped token
    /// in document order.
    pub fn text(&self) -> String {
        let mut collector = TextCollector::default();
        visit::walk(self, &mut collector);
        collector.finish()
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tok(kind: TokenKind, text: &str, start: usize) -> Token {
        Token::new(kind, text, Span::new(start, start + text.len(), 1, start + 1))
    }

    fn attribute(value: &str) -> Node {
        Node::new(
            NodeKind::Attribute,
            Some("href".into()),
            Span::default(),
            vec![
                Child::Token(tok(TokenKind::TagName, "href", 0)),
                Child::Token(tok(TokenKind::TagEquals, "=", 4)),
                Child::Token(tok(TokenKind::AttvalueValue, value, 5)),
            ],
        )
    }

    #[test]
    fn test_value_strips_quotes_and_padding() {
        assert_eq!(attribute("\"a.png\"").value(), Some("a.png"));
        assert_eq!(attribute("  'x y'").value(), Some("x y"));
        assert_eq!(attribute("plain ").value(), Some("plain"));
        assert_eq!(attribute("\"\"").value(), Some(""));
    }

    #[test]
    fn test_value_only_on_attributes() {
        let node = Node::new(NodeKind::CharData, None, Span::default(), Vec::new());
        assert_eq!(node.value(), None);
    }

    #[test]
    fn test_significant_children_skip_trivia_and_recovery_tokens() {
        let node = Node::new(
            NodeKind::Element,
            Some("a".into()),
            Span::default(),
            vec![
                Child::Token(tok(TokenKind::TagOpen, "<", 0)),
                Child::Token(tok(TokenKind::TagWhitespace, " ", 1)),
                Child::Skipped(tok(TokenKind::TagSlash, "/", 2)),
                Child::Missing(tok(TokenKind::TagName, "", 3)),
            ],
        );
        assert_eq!(node.significant_children().count(), 1);
        assert_eq!(node.tokens().count(), 2);
        assert_eq!(node.text(), "< /");
    }
}
