//! Bidirectional cursor over the call trees of a forest.
//!
//! The navigator walks a call tree in pre-order with backtracking: every
//! state is a chain of frames, and the innermost frame's cursor names the
//! next child to be entered. Forward operations have backward twins so a
//! recorded execution can be replayed in either direction.
//!
//! All operations leave the cursor untouched when they fail.

use super::frame::{Frame, FrameChain};
use crate::calltree::{CallTree, Forest, Node, NodeId, TreeKey};
use crate::parser::SourceLocation;
use crate::utils::error::NavError;
use log::debug;

/// Comparable snapshot of a navigator position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    pub key: TreeKey,
    pub frames: FrameChain,
}

/// One line of the `where` listing
#[derive(Debug, Clone, PartialEq)]
pub struct StackEntry {
    pub name: String,
    pub location: Option<SourceLocation>,

    /// Calling line of the child the cursor sits on
    pub line: Option<u32>,
    pub selected: bool,
}

/// Replay cursor borrowing a forest
#[derive(Debug, Clone)]
pub struct Navigator<'f> {
    forest: &'f Forest,
    key: TreeKey,
    tree: &'f CallTree,
    frames: FrameChain,

    /// Frame inspected by `up`/`down`, as a depth into `frames`
    selected: usize,
}

impl<'f> Navigator<'f> {
    /// Start at the first top-level span of the first non-empty tree
    ///
    /// # Errors
    /// * `NavError::EmptyTrace` - the forest holds no spans
    pub fn new(forest: &'f Forest) -> Result<Self, NavError> {
        let key = forest
            .trees()
            .find(|(_, tree)| !tree.is_empty())
            .map(|(key, _)| key)
            .ok_or(NavError::EmptyTrace)?;
        Self::at_tree(forest, key)
    }

    /// Start at the first top-level span of one tree
    ///
    /// # Errors
    /// * `NavError::NoSuchThread` - no tree with this key
    /// * `NavError::EmptyTrace` - the tree holds no spans
    pub fn at_tree(forest: &'f Forest, key: TreeKey) -> Result<Self, NavError> {
        let tree = forest.tree(key).ok_or(NavError::NoSuchThread(key.tid))?;
        let first = tree.first_node().ok_or(NavError::EmptyTrace)?;

        debug!("Navigator starting in {}", key);
        Ok(Self {
            forest,
            key,
            tree,
            frames: FrameChain::new(Frame::new(first, 0)),
            selected: 0,
        })
    }

    // ---- movement ----

    /// Enter the next navigable call, or move past an opaque one
    pub fn step(&mut self) -> Result<(), NavError> {
        let frame = *self.frames.innermost();
        match self.tree.node(frame.node).children().get(frame.cursor) {
            Some(&child) => {
                if self.tree.node(child).is_navigable() {
                    self.frames.push(Frame::new(child, 0));
                } else {
                    self.frames.innermost_mut().cursor += 1;
                }
                self.select_innermost();
                Ok(())
            }
            None => self.func_return().map_err(|_| NavError::EndOfTrace),
        }
    }

    /// Undo `step`: enter the previous navigable call at its end
    pub fn step_back(&mut self) -> Result<(), NavError> {
        let frame = *self.frames.innermost();
        if frame.cursor == 0 {
            return self
                .func_return_back()
                .map_err(|_| NavError::BeginningOfTrace);
        }

        let cursor = frame.cursor - 1;
        let child = self.tree.node(frame.node).children()[cursor];
        self.frames.innermost_mut().cursor = cursor;

        let child_node = self.tree.node(child);
        if child_node.is_navigable() {
            self.frames
                .push(Frame::new(child, child_node.children().len()));
        }
        self.select_innermost();
        Ok(())
    }

    /// Move over the next call at the current depth
    pub fn next(&mut self) -> Result<(), NavError> {
        let frame = *self.frames.innermost();
        if frame.cursor < self.tree.node(frame.node).children().len() {
            self.frames.innermost_mut().cursor += 1;
            self.select_innermost();
            Ok(())
        } else {
            self.func_return().map_err(|_| NavError::EndOfTrace)
        }
    }

    /// Move back over the previous call at the current depth
    pub fn next_back(&mut self) -> Result<(), NavError> {
        if self.frames.innermost().cursor > 0 {
            self.frames.innermost_mut().cursor -= 1;
            self.select_innermost();
            Ok(())
        } else {
            self.func_return_back()
                .map_err(|_| NavError::BeginningOfTrace)
        }
    }

    /// Leave the current call, stopping just after the call site
    ///
    /// At top level, moves to the start of the next top-level span.
    pub fn func_return(&mut self) -> Result<(), NavError> {
        if self.frames.pop().is_some() {
            self.frames.innermost_mut().cursor += 1;
        } else {
            let next = self.top_level_neighbour(1).ok_or(NavError::NoCallers)?;
            self.frames = FrameChain::new(Frame::new(next, 0));
        }
        self.select_innermost();
        Ok(())
    }

    /// Leave the current call backwards, stopping at the call site
    ///
    /// At top level, moves to the end of the previous top-level span.
    pub fn func_return_back(&mut self) -> Result<(), NavError> {
        if self.frames.pop().is_none() {
            let prev = self.top_level_neighbour(-1).ok_or(NavError::NoCallers)?;
            let len = self.tree.node(prev).children().len();
            self.frames = FrameChain::new(Frame::new(prev, len));
        }
        self.select_innermost();
        Ok(())
    }

    /// Jump to the deepest position active at `ts`
    ///
    /// # Errors
    /// * `NavError::TimestampOutOfRange` - `ts` outside the tree's recorded range
    pub fn goto_timestamp(&mut self, ts: f64) -> Result<(), NavError> {
        let (first, last) = time_range(self.tree).ok_or(NavError::EmptyTrace)?;
        if !(ts >= first && ts <= last) {
            return Err(NavError::TimestampOutOfRange { ts, first, last });
        }

        self.frames = locate(self.tree, ts).ok_or(NavError::EmptyTrace)?;
        self.select_innermost();
        debug!("Jumped to {} in {}", ts, self.key);
        Ok(())
    }

    /// Move to another thread of the current process at the current time
    pub fn switch_thread(&mut self, tid: u64) -> Result<(), NavError> {
        let key = TreeKey::new(self.key.pid, tid);
        if self.forest.tree(key).is_none() {
            return Err(NavError::NoSuchThread(tid));
        }
        self.switch_to(key)
    }

    /// Move to the first thread of another process at the current time
    pub fn switch_process(&mut self, pid: u64) -> Result<(), NavError> {
        let tid = self
            .forest
            .tids(pid)
            .first()
            .copied()
            .ok_or(NavError::NoSuchProcess(pid))?;
        self.switch_to(TreeKey::new(pid, tid))
    }

    fn switch_to(&mut self, key: TreeKey) -> Result<(), NavError> {
        let tree = self.forest.tree(key).ok_or(NavError::NoSuchThread(key.tid))?;
        let (first, last) = time_range(tree).ok_or(NavError::EmptyTrace)?;
        let ts = self.get_timestamp().clamp(first, last);
        let frames = locate(tree, ts).ok_or(NavError::EmptyTrace)?;

        debug!("Switching from {} to {} at {}", self.key, key, ts);
        self.key = key;
        self.tree = tree;
        self.frames = frames;
        self.select_innermost();
        Ok(())
    }

    // ---- frame inspection ----

    /// Select the caller of the selected frame
    pub fn up(&mut self) -> Result<(), NavError> {
        if self.selected == 0 {
            return Err(NavError::NoOuterFrame);
        }
        self.selected -= 1;
        Ok(())
    }

    /// Select the callee of the selected frame
    pub fn down(&mut self) -> Result<(), NavError> {
        if self.selected + 1 >= self.frames.len() {
            return Err(NavError::AtCurrentFrame);
        }
        self.selected += 1;
        Ok(())
    }

    fn select_innermost(&mut self) {
        self.selected = self.frames.len() - 1;
    }

    // ---- queries ----

    /// Timestamp of the cursor position
    ///
    /// Start of the child at the cursor, else end of the last child, else
    /// the start of a leaf call.
    pub fn get_timestamp(&self) -> f64 {
        let frame = self.frames.innermost();
        let node = self.tree.node(frame.node);
        let children = node.children();

        match (children.get(frame.cursor), children.last()) {
            (Some(&child), _) => self.tree.node(child).start(),
            (None, Some(&last)) => self.tree.node(last).end(),
            (None, None) => node.start(),
        }
    }

    pub fn key(&self) -> TreeKey {
        self.key
    }

    pub fn tree(&self) -> &'f CallTree {
        self.tree
    }

    pub fn frames(&self) -> &FrameChain {
        &self.frames
    }

    pub fn state(&self) -> NavState {
        NavState {
            key: self.key,
            frames: self.frames.clone(),
        }
    }

    /// Depth of the selected frame
    pub fn selected_depth(&self) -> usize {
        self.selected
    }

    pub fn selected_frame(&self) -> &Frame {
        // `selected` is reset to the innermost frame on every chain change
        self.frames.get(self.selected).unwrap_or(self.frames.innermost())
    }

    pub fn selected_node(&self) -> &'f Node {
        self.tree.node(self.selected_frame().node)
    }

    pub fn current_node(&self) -> &'f Node {
        self.tree.node(self.frames.innermost().node)
    }

    pub fn current_node_id(&self) -> NodeId {
        self.frames.innermost().node
    }

    /// Calling line of the child under the selected frame's cursor
    pub fn current_line(&self) -> Option<u32> {
        self.frame_line(self.selected_frame())
    }

    fn frame_line(&self, frame: &Frame) -> Option<u32> {
        let child = *self.tree.node(frame.node).children().get(frame.cursor)?;
        self.tree.node(child).caller_line()
    }

    /// Chain from the top-level span to the innermost frame
    pub fn where_stack(&self) -> Vec<StackEntry> {
        self.frames
            .iter()
            .enumerate()
            .map(|(depth, frame)| {
                let node = self.tree.node(frame.node);
                StackEntry {
                    name: node.name().to_string(),
                    location: node.location().cloned(),
                    line: self.frame_line(frame),
                    selected: depth == self.selected,
                }
            })
            .collect()
    }

    /// Threads of the current process, the active one marked
    pub fn thread_list(&self) -> Vec<(u64, bool)> {
        self.forest
            .tids(self.key.pid)
            .into_iter()
            .map(|tid| (tid, tid == self.key.tid))
            .collect()
    }

    /// Processes of the forest, the active one marked
    pub fn process_list(&self) -> Vec<(u64, bool)> {
        self.forest
            .pids()
            .into_iter()
            .map(|pid| (pid, pid == self.key.pid))
            .collect()
    }

    /// Argument payload of the selected call
    pub fn args(&self) -> Option<&'f serde_json::Value> {
        self.selected_node().args()
    }

    fn top_level_neighbour(&self, offset: isize) -> Option<NodeId> {
        let index = self.tree.index_in_parent(self.frames.base().node)?;
        let target = index.checked_add_signed(offset)?;
        self.tree.top_level().get(target).copied()
    }
}

fn time_range(tree: &CallTree) -> Option<(f64, f64)> {
    Some((tree.first_ts()?, tree.last_ts()?))
}

/// Frame chain of the deepest position active at `ts`
///
/// Descends into the last child starting strictly before `ts` while it is
/// still running at `ts`; otherwise stops with the cursor just past it.
/// A running opaque child is not entered: the cursor stays on it.
fn locate(tree: &CallTree, ts: f64) -> Option<FrameChain> {
    let top = tree.node_by_timestamp(ts)?;
    let mut chain = FrameChain::new(Frame::new(top, 0));

    loop {
        let children = tree.node(chain.innermost().node).children();
        let idx = children.partition_point(|&c| tree.node(c).start() < ts);
        if idx == 0 {
            chain.innermost_mut().cursor = 0;
            break;
        }

        let prev = children[idx - 1];
        if tree.node(prev).end() <= ts {
            chain.innermost_mut().cursor = idx;
            break;
        }
        chain.innermost_mut().cursor = idx - 1;
        if !tree.node(prev).is_navigable() {
            break;
        }
        chain.push(Frame::new(prev, 0));
    }

    Some(chain)
}
