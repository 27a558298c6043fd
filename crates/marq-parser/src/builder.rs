//! Incremental tree construction.
//!
//! Grammar rules open a node, feed it tokens and finished children, then
//! close it. Nodes are opened and closed strictly depth-first, so the open
//! nodes form a stack and a [`NodeHandle`] is just a position in it.

use marq_lexer::Span;

use crate::tree::{Child, Node, NodeKind};

/// A node that has been opened and not yet closed.
///
/// Handles are consumed by [`NodeBuilder::close`]; holding one by reference
/// lets a rule add tokens and children to it.
#[must_use = "an opened node must be closed"]
#[derive(Debug)]
pub struct NodeHandle {
    depth: usize,
}

/// A restorable state of the builder, used by speculative parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    depth: usize,
    children: usize,
}

#[derive(Debug)]
struct Frame {
    kind: NodeKind,
    name: Option<String>,
    opened_at: Span,
    children: Vec<Child>,
}

#[derive(Debug, Default)]
pub struct NodeBuilder {
    stack: Vec<Frame>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a node at `at` (the position of the current token).
    pub fn open(&mut self, kind: NodeKind, at: Span) -> NodeHandle {
        self.stack.push(Frame {
            kind,
            name: None,
            opened_at: at.empty_at_start(),
            children: Vec::new(),
        });
        NodeHandle {
            depth: self.stack.len() - 1,
        }
    }

    pub fn set_name(&mut self, handle: &NodeHandle, name: impl Into<String>) {
        self.frame(handle).name = Some(name.into());
    }

    /// Append a token (or a recovery placeholder) to an open node.
    pub fn push(&mut self, handle: &NodeHandle, child: Child) {
        debug_assert!(!matches!(child, Child::Node(_)), "use attach for nodes");
        self.frame(handle).children.push(child);
    }

    /// Append a finished node to an open parent.
    pub fn attach(&mut self, parent: &NodeHandle, child: Node) {
        self.frame(parent).children.push(Child::Node(child));
    }

    /// Finalize the innermost open node.
    pub fn close(&mut self, handle: NodeHandle) -> Node {
        assert_eq!(
            handle.depth + 1,
            self.stack.len(),
            "nodes must be closed innermost first"
        );
        let frame = self.stack.pop().expect("handle refers to an open node");
        finish(frame)
    }

    /// Close `handle` and attach the result to `parent`.
    pub fn close_into(&mut self, handle: NodeHandle, parent: &NodeHandle) {
        let node = self.close(handle);
        self.attach(parent, node);
    }

    /// Number of open nodes.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            depth: self.stack.len(),
            children: self.stack.last().map_or(0, |f| f.children.len()),
        }
    }

    /// Discard everything added since `checkpoint`. Nodes opened after it
    /// are dropped; the node that was innermost at the time loses the
    /// children appended since.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.stack.truncate(checkpoint.depth);
        if let Some(frame) = self.stack.last_mut() {
            frame.children.truncate(checkpoint.children);
        }
    }

    /// Close every open node, innermost first, and return the outermost.
    /// Used when a parse ends early.
    pub fn finish_partial(&mut self) -> Option<Node> {
        let mut node = finish(self.stack.pop()?);
        while let Some(mut parent) = self.stack.pop() {
            parent.children.push(Child::Node(node));
            node = finish(parent);
        }
        Some(node)
    }

    fn frame(&mut self, handle: &NodeHandle) -> &mut Frame {
        &mut self.stack[handle.depth]
    }
}

fn finish(frame: Frame) -> Node {
    let span = match (frame.children.first(), frame.children.last()) {
        (Some(first), Some(last)) => first.span().cover(last.span()),
        _ => frame.opened_at,
    };
    Node::new(frame.kind, frame.name, span, frame.children)
}
