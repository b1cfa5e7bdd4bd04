//! Arena node of a call tree.

use crate::parser::{SourceLocation, Span};

/// Stable index of a node inside its [`CallTree`](super::CallTree) arena
pub type NodeId = usize;

/// A span placed in a call tree
#[derive(Debug, Clone)]
pub struct Node {
    pub(super) span: Span,
    pub(super) location: Option<SourceLocation>,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl Node {
    pub(super) fn new(span: Span, parent: Option<NodeId>) -> Self {
        let location = span.location();
        Self {
            span,
            location,
            parent,
            children: Vec::new(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn name(&self) -> &str {
        &self.span.name
    }

    pub fn start(&self) -> f64 {
        self.span.start
    }

    pub fn end(&self) -> f64 {
        self.span.end
    }

    pub fn duration(&self) -> f64 {
        self.span.duration()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children ordered by start
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Whether the replay navigator may stop inside this node
    pub fn is_navigable(&self) -> bool {
        self.location.is_some()
    }

    /// Function part of the name, or the whole name for opaque spans
    pub fn function_name(&self) -> &str {
        self.location
            .as_ref()
            .map(|loc| loc.function.as_str())
            .unwrap_or(&self.span.name)
    }

    pub fn caller_line(&self) -> Option<u32> {
        self.span.caller_line
    }

    pub fn args(&self) -> Option<&serde_json::Value> {
        self.span.args.as_ref()
    }
}
