//! Cursor frames of the replay navigator.

use crate::calltree::NodeId;

/// A position inside one call: the node and the index of the next child
///
/// `cursor == children.len()` means "after the last child".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub node: NodeId,
    pub cursor: usize,
}

impl Frame {
    pub fn new(node: NodeId, cursor: usize) -> Self {
        Self { node, cursor }
    }
}

/// Non-empty chain of frames from a top-level span down to the current call
///
/// Every frame but the innermost has its cursor on the child that the next
/// frame describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameChain {
    base: Frame,
    descent: Vec<Frame>,
}

impl FrameChain {
    pub fn new(base: Frame) -> Self {
        Self {
            base,
            descent: Vec::new(),
        }
    }

    /// Top-level frame
    pub fn base(&self) -> &Frame {
        &self.base
    }

    pub fn innermost(&self) -> &Frame {
        self.descent.last().unwrap_or(&self.base)
    }

    pub fn innermost_mut(&mut self) -> &mut Frame {
        self.descent.last_mut().unwrap_or(&mut self.base)
    }

    pub fn push(&mut self, frame: Frame) {
        self.descent.push(frame);
    }

    /// Drop the innermost frame; the top-level frame is never popped
    pub fn pop(&mut self) -> Option<Frame> {
        self.descent.pop()
    }

    /// Number of frames, at least 1
    pub fn len(&self) -> usize {
        self.descent.len() + 1
    }

    /// A chain always holds its top-level frame
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Frame by depth, 0 being the top-level frame
    pub fn get(&self, depth: usize) -> Option<&Frame> {
        match depth {
            0 => Some(&self.base),
            _ => self.descent.get(depth - 1),
        }
    }

    /// Frames from the top-level one inward
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        std::iter::once(&self.base).chain(self.descent.iter())
    }
}
