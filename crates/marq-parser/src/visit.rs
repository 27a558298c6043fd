//! Tree traversal.
//!
//! [`walk`] drives a [`Visitor`] over a tree in document order. The stock
//! visitors here rebuild source text and render an indented dump.

use std::fmt::Write;

use marq_lexer::Token;

use crate::tree::{Child, Node, NodeKind};

/// How a token came to be in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    /// Matched by a rule, or hidden whitespace attached to a matched token.
    Matched,
    /// Substituted during recovery; its text is empty.
    Missing,
    /// Discarded during recovery.
    Skipped,
}

/// Callbacks for a depth-first traversal.
pub trait Visitor {
    /// Called before a node's children. Returning `false` skips them (and
    /// the matching `exit`).
    fn enter(&mut self, _node: &Node) -> bool {
        true
    }

    fn exit(&mut self, _node: &Node) {}

    fn token(&mut self, _token: &Token, _role: TokenRole) {}
}

/// Visit `node` and everything below it in document order.
pub fn walk<V: Visitor + ?Sized>(node: &Node, visitor: &mut V) {
    if !visitor.enter(node) {
        return;
    }
    for child in node.children() {
        match child {
            Child::Node(inner) => walk(inner, visitor),
            Child::Token(token) => visitor.token(token, TokenRole::Matched),
            Child::Missing(token) => visitor.token(token, TokenRole::Missing),
            Child::Skipped(token) => visitor.token(token, TokenRole::Skipped),
        }
    }
    visitor.exit(node);
}

/// Concatenates the text of every matched and skipped token.
#[derive(Debug, Default)]
pub struct TextCollector {
    text: String,
}

impl TextCollector {
    pub fn finish(self) -> String {
        self.text
    }
}

impl Visitor for TextCollector {
    fn token(&mut self, token: &Token, role: TokenRole) {
        if role != TokenRole::Missing {
            self.text.push_str(&token.text);
        }
    }
}

/// Node kinds in pre-order, the shape of a tree without its text.
pub fn kinds(node: &Node) -> Vec<NodeKind> {
    struct Kinds(Vec<NodeKind>);

    impl Visitor for Kinds {
        fn enter(&mut self, node: &Node) -> bool {
            self.0.push(node.kind());
            true
        }
    }

    let mut kinds = Kinds(Vec::new());
    walk(node, &mut kinds);
    kinds.0
}

/// Render a tree one child per line, indented two spaces per level.
///
/// ```text
/// Document 0..5
///   Element "br" 0..5
///     TagOpen "<"
///     TagName "br"
///     TagSlashClose "/>"
/// ```
pub fn dump(node: &Node) -> String {
    let mut dumper = Dumper::default();
    walk(node, &mut dumper);
    dumper.out
}

#[derive(Default)]
struct Dumper {
    out: String,
    depth: usize,
}

impl Dumper {
    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }
}

impl Visitor for Dumper {
    fn enter(&mut self, node: &Node) -> bool {
        self.indent();
        let span = node.span();
        let _ = match node.name() {
            Some(name) => writeln!(
                self.out,
                "{:?} {name:?} {}..{}",
                node.kind(),
                span.start,
                span.end
            ),
            None => writeln!(self.out, "{:?} {}..{}", node.kind(), span.start, span.end),
        };
        self.depth += 1;
        true
    }

    fn exit(&mut self, _node: &Node) {
        self.depth -= 1;
    }

    fn token(&mut self, token: &Token, role: TokenRole) {
        self.indent();
        let _ = match role {
            TokenRole::Matched => writeln!(self.out, "{:?} {:?}", token.kind, token.text),
            TokenRole::Missing => writeln!(self.out, "{:?} (missing)", token.kind),
            TokenRole::Skipped => writeln!(self.out, "{:?} {:?} (skipped)", token.kind, token.text),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dump() {
        let parse = crate::parse("<a x=1>hi</a>").unwrap();
        let expected = "\
Document 0..13
  Element \"a\" 0..13
    TagOpen \"<\"
    TagName \"a\"
    Attribute \"x\" 2..6
      TagWhitespace \" \"
      TagName \"x\"
      TagEquals \"=\"
      AttvalueValue \"1\"
    TagClose \">\"
    Content 7..9
      CharData 7..9
        HtmlText \"hi\"
    TagOpen \"<\"
    TagSlash \"/\"
    TagName \"a\"
    TagClose \">\"
";
        assert_eq!(dump(parse.tree()), expected);
    }

    #[test]
    fn test_dump_marks_recovery_tokens() {
        let parse = crate::parse("<a></a b").unwrap();
        let out = dump(parse.tree());
        assert!(out.contains("TagName \"b\" (skipped)"));
        assert!(out.contains("TagClose (missing)"));
    }

    #[test]
    fn test_kinds_pre_order() {
        let parse = crate::parse("<p><b/>t</p>").unwrap();
        assert_eq!(
            kinds(parse.tree()),
            vec![
                NodeKind::Document,
                NodeKind::Element,
                NodeKind::Content,
                NodeKind::Element,
                NodeKind::CharData,
            ]
        );
    }

    #[test]
    fn test_enter_false_prunes_subtree() {
        struct Elements(usize);

        impl Visitor for Elements {
            fn enter(&mut self, node: &Node) -> bool {
                if node.kind() == NodeKind::Element {
                    self.0 += 1;
                    return false;
                }
                true
            }
        }

        let parse = crate::parse("<a><b/><c/></a><d/>").unwrap();
        let mut elements = Elements(0);
        walk(parse.tree(), &mut elements);
        assert_eq!(elements.0, 2);
    }
}
