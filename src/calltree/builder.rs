//! Reconstruct a strictly nested call tree from an unordered span stream.
//!
//! Spans arrive in completion order at best and shuffled at worst. Each span
//! is placed by walking up from the previously inserted node (a search hint:
//! consecutive spans are usually temporally close) to the first node that
//! encloses it, then descending by binary search over sorted children.
//!
//! # Algorithm
//! 1. Walk up from the hint until the candidate encloses the new span
//! 2. Binary-search the candidate's children for the run touching the span
//! 3. Descend into an enclosing child, wrap an enclosed run, or insert
//! 4. Reject any partial overlap before touching the arena

use super::node::{Node, NodeId};
use crate::parser::Span;
use crate::utils::config::CALL_TREE_ROOT_NAME;
use crate::utils::error::StructuralError;
use log::debug;
use std::cmp::Ordering;

/// Arena index of the synthetic root of every tree
pub const ROOT: NodeId = 0;

/// Call tree of one (pid, tid)
#[derive(Debug, Clone)]
pub struct CallTree {
    pid: u64,
    tid: u64,
    nodes: Vec<Node>,

    /// Search hint for the next insertion
    last_inserted: NodeId,
}

/// Where a new span goes, decided before the arena is modified
enum Placement {
    /// New leaf among `parent`'s children at `index`
    Insert { parent: NodeId, index: usize },

    /// New node replacing `parent.children[first..=last]`, which become its children
    Wrap {
        parent: NodeId,
        first: usize,
        last: usize,
    },
}

impl CallTree {
    pub fn new(pid: u64, tid: u64) -> Self {
        let root = Span::new(
            pid,
            tid,
            CALL_TREE_ROOT_NAME,
            f64::NEG_INFINITY,
            f64::INFINITY,
        );

        Self {
            pid,
            tid,
            nodes: vec![Node::new(root, None)],
            last_inserted: ROOT,
        }
    }

    /// Build a tree from spans in any order
    pub fn from_spans<I>(pid: u64, tid: u64, spans: I) -> Result<Self, StructuralError>
    where
        I: IntoIterator<Item = Span>,
    {
        let mut tree = Self::new(pid, tid);
        for span in spans {
            tree.insert(span)?;
        }
        debug!("Built call tree p{}_t{} with {} spans", pid, tid, tree.len());
        Ok(tree)
    }

    /// Insert one span
    ///
    /// # Errors
    /// * `StructuralError::InvalidInterval` - non-finite bounds or `end < start`
    /// * `StructuralError::PartialOverlap` - the span crosses an existing span
    ///
    /// The tree is unchanged when an error is returned.
    pub fn insert(&mut self, span: Span) -> Result<NodeId, StructuralError> {
        if !span.has_valid_interval() {
            return Err(StructuralError::InvalidInterval {
                name: span.name,
                start: span.start,
                end: span.end,
            });
        }

        let placement = self.find_placement(&span)?;
        let id = self.nodes.len();

        match placement {
            Placement::Insert { parent, index } => {
                self.nodes.push(Node::new(span, Some(parent)));
                self.nodes[parent].children.insert(index, id);
            }
            Placement::Wrap {
                parent,
                first,
                last,
            } => {
                let adopted: Vec<NodeId> = self.nodes[parent]
                    .children
                    .splice(first..=last, [id])
                    .collect();
                for &child in &adopted {
                    self.nodes[child].parent = Some(id);
                }

                let mut node = Node::new(span, Some(parent));
                node.children = adopted;
                self.nodes.push(node);
            }
        }

        self.last_inserted = id;
        Ok(id)
    }

    fn find_placement(&self, span: &Span) -> Result<Placement, StructuralError> {
        let mut candidate = self.last_inserted;
        while !encloses(&self.nodes[candidate].span, span) {
            match self.nodes[candidate].parent {
                Some(parent) => candidate = parent,
                // Only the root has no parent, and it encloses every finite span
                None => break,
            }
        }

        loop {
            let children = &self.nodes[candidate].children;
            let lo = children.partition_point(|&c| self.nodes[c].span.end < span.start);
            let hi = children.partition_point(|&c| self.nodes[c].span.start <= span.end);
            let touching = &children[lo..hi];

            if let Some(&inner) = touching
                .iter()
                .find(|&&c| encloses(&self.nodes[c].span, span))
            {
                candidate = inner;
                continue;
            }

            let mut run: Option<(usize, usize)> = None;
            for (offset, &child) in touching.iter().enumerate() {
                let other = &self.nodes[child].span;
                if encloses(span, other) {
                    let index = lo + offset;
                    run = Some(run.map_or((index, index), |(first, _)| (first, index)));
                } else if intersects(span, other) {
                    return Err(StructuralError::PartialOverlap {
                        name: span.name.clone(),
                        start: span.start,
                        end: span.end,
                        other: other.name.clone(),
                        other_start: other.start,
                        other_end: other.end,
                    });
                }
            }

            return match run {
                Some((first, last)) => {
                    if children[first..=last]
                        .iter()
                        .any(|&c| !encloses(span, &self.nodes[c].span))
                    {
                        return Err(StructuralError::BrokenInvariant(format!(
                            "children of '{}' enclosed by '{}' are not contiguous",
                            self.nodes[candidate].name(),
                            span.name
                        )));
                    }
                    Ok(Placement::Wrap {
                        parent: candidate,
                        first,
                        last,
                    })
                }
                None => {
                    let index = children.partition_point(|&c| {
                        sibling_order(&self.nodes[c].span, span) == Ordering::Less
                    });
                    Ok(Placement::Insert {
                        parent: candidate,
                        index,
                    })
                }
            };
        }
    }

    pub fn pid(&self) -> u64 {
        self.pid
    }

    pub fn tid(&self) -> u64 {
        self.tid
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Node by id; ids come from this tree only
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Number of spans (the synthetic root excluded)
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-level spans, ordered by start
    pub fn top_level(&self) -> &[NodeId] {
        &self.nodes[ROOT].children
    }

    pub fn first_node(&self) -> Option<NodeId> {
        self.top_level().first().copied()
    }

    /// Start of the earliest top-level span
    pub fn first_ts(&self) -> Option<f64> {
        self.first_node().map(|id| self.nodes[id].start())
    }

    /// End of the latest top-level span
    pub fn last_ts(&self) -> Option<f64> {
        self.top_level().last().map(|&id| self.nodes[id].end())
    }

    /// Last top-level span starting at or before `ts`, or the first one
    pub fn node_by_timestamp(&self, ts: f64) -> Option<NodeId> {
        let roots = self.top_level();
        let idx = roots.partition_point(|&c| self.nodes[c].start() <= ts);
        roots.get(idx.saturating_sub(1)).copied()
    }

    /// Position of `id` among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes.get(id)?.parent?;
        let siblings = &self.nodes[parent].children;
        let start = self.nodes[id].start();
        let from = siblings.partition_point(|&c| self.nodes[c].start() < start);

        siblings[from..]
            .iter()
            .position(|&c| c == id)
            .map(|offset| from + offset)
    }

    /// Number of span ancestors; top-level spans have depth 0
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            if parent == ROOT {
                break;
            }
            depth += 1;
            current = self.nodes[parent].parent;
        }
        depth
    }

    /// All spans in pre-order
    pub fn preorder(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.top_level().iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.nodes[id].children.iter().rev());
            Some(id)
        })
    }

    /// Shift every span by `-offset`
    pub fn shift(&mut self, offset: f64) {
        for node in self.nodes.iter_mut().skip(1) {
            node.span.start -= offset;
            node.span.end -= offset;
        }
    }

    /// Same names, intervals and child order everywhere
    pub fn same_shape(&self, other: &CallTree) -> bool {
        let mut stack = vec![(ROOT, ROOT)];
        while let Some((a, b)) = stack.pop() {
            let (na, nb) = (&self.nodes[a], &other.nodes[b]);
            if na.name() != nb.name()
                || na.start() != nb.start()
                || na.end() != nb.end()
                || na.children.len() != nb.children.len()
            {
                return false;
            }
            stack.extend(na.children.iter().copied().zip(nb.children.iter().copied()));
        }
        true
    }

    /// Verify ordering, nesting and parent links of the whole tree
    pub fn check_invariants(&self) -> Result<(), StructuralError> {
        for (id, node) in self.nodes.iter().enumerate() {
            for pair in node.children.windows(2) {
                let (a, b) = (&self.nodes[pair[0]].span, &self.nodes[pair[1]].span);
                if sibling_order(a, b) != Ordering::Less || intersects(a, b) {
                    return Err(StructuralError::BrokenInvariant(format!(
                        "siblings '{}' and '{}' are out of order or overlap",
                        a.name, b.name
                    )));
                }
            }
            for &child in &node.children {
                let child_node = &self.nodes[child];
                if child_node.parent != Some(id) || !encloses(&node.span, &child_node.span) {
                    return Err(StructuralError::BrokenInvariant(format!(
                        "'{}' is not properly nested in '{}'",
                        child_node.name(),
                        node.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Deterministic order between spans with identical intervals
fn tie_rank(a: &Span, b: &Span) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| a.caller_line.cmp(&b.caller_line))
}

/// Whether `outer` is an ancestor position for `inner`.
///
/// A zero-duration span at `p` belongs to `outer` when `outer.start < p <= outer.end`,
/// so at a sibling boundary it lands in the earlier sibling.
fn encloses(outer: &Span, inner: &Span) -> bool {
    if inner.is_instant() {
        return outer.start < inner.start && inner.start <= outer.end;
    }
    if outer.start > inner.start || inner.end > outer.end {
        return false;
    }
    if outer.start == inner.start && outer.end == inner.end {
        return tie_rank(outer, inner) != Ordering::Greater;
    }
    true
}

fn intersects(a: &Span, b: &Span) -> bool {
    a.start < b.end && b.start < a.end
}

fn sibling_order(a: &Span, b: &Span) -> Ordering {
    a.start
        .total_cmp(&b.start)
        .then_with(|| a.end.total_cmp(&b.end))
        .then_with(|| tie_rank(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(name: &str, start: f64, end: f64) -> Span {
        Span::new(1, 1, name, start, end)
    }

    fn names(tree: &CallTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| tree.node(id).name().to_string()).collect()
    }

    #[test]
    fn test_insert_nested_in_completion_order() {
        let tree = CallTree::from_spans(
            1,
            1,
            vec![
                span("h", 3.0, 4.0),
                span("g", 3.0, 20.0),
                span("f", 2.0, 90.0),
                span("t", 0.0, 120.0),
            ],
        )
        .unwrap();

        assert_eq!(tree.len(), 4);
        assert_eq!(names(&tree, tree.top_level()), vec!["t"]);
        let t = tree.top_level()[0];
        let f = tree.node(t).children()[0];
        let g = tree.node(f).children()[0];
        assert_eq!(names(&tree, tree.node(g).children()), vec!["h"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_shared_start_nests_shorter_inside_longer() {
        let mut tree = CallTree::new(1, 1);
        let h = tree.insert(span("h", 3.0, 4.0)).unwrap();
        let g = tree.insert(span("g", 3.0, 20.0)).unwrap();

        assert_eq!(tree.node(h).parent(), Some(g));
        assert_eq!(tree.top_level(), &[g]);
    }

    #[test]
    fn test_wrap_reparents_contiguous_run() {
        let mut tree = CallTree::new(1, 1);
        tree.insert(span("a", 0.0, 1.0)).unwrap();
        tree.insert(span("b", 2.0, 3.0)).unwrap();
        tree.insert(span("c", 4.0, 5.0)).unwrap();
        tree.insert(span("d", 10.0, 11.0)).unwrap();
        let outer = tree.insert(span("outer", 1.5, 6.0)).unwrap();

        assert_eq!(names(&tree, tree.top_level()), vec!["a", "outer", "d"]);
        assert_eq!(names(&tree, tree.node(outer).children()), vec!["b", "c"]);
        for &child in tree.node(outer).children() {
            assert_eq!(tree.node(child).parent(), Some(outer));
        }
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_partial_overlap_is_rejected_and_tree_unchanged() {
        let mut tree = CallTree::new(1, 1);
        tree.insert(span("parent", 0.0, 100.0)).unwrap();
        tree.insert(span("sibling", 20.0, 40.0)).unwrap();
        let before = tree.clone();

        let err = tree.insert(span("crossing", 10.0, 30.0)).unwrap_err();
        assert!(matches!(err, StructuralError::PartialOverlap { .. }));
        assert!(tree.same_shape(&before));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_invalid_interval_is_rejected() {
        let mut tree = CallTree::new(1, 1);
        assert!(matches!(
            tree.insert(span("bad", 5.0, 1.0)),
            Err(StructuralError::InvalidInterval { .. })
        ));
        assert!(tree.insert(span("nan", f64::NAN, 1.0)).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_zero_duration_at_boundary_goes_left() {
        let mut tree = CallTree::new(1, 1);
        let a = tree.insert(span("a", 0.0, 5.0)).unwrap();
        let b = tree.insert(span("b", 5.0, 10.0)).unwrap();
        let z = tree.insert(span("z", 5.0, 5.0)).unwrap();

        assert_eq!(tree.node(z).parent(), Some(a));
        assert!(tree.node(b).is_leaf());
    }

    #[test]
    fn test_zero_duration_at_start_is_preceding_sibling() {
        let mut tree = CallTree::new(1, 1);
        let z = tree.insert(span("z", 3.0, 3.0)).unwrap();
        let g = tree.insert(span("g", 3.0, 20.0)).unwrap();

        assert_eq!(tree.top_level(), &[z, g]);
    }

    #[test]
    fn test_identical_intervals_nest_by_name() {
        let forward =
            CallTree::from_spans(1, 1, vec![span("outer", 0.0, 5.0), span("wrapper", 0.0, 5.0)])
                .unwrap();
        let backward =
            CallTree::from_spans(1, 1, vec![span("wrapper", 0.0, 5.0), span("outer", 0.0, 5.0)])
                .unwrap();

        assert!(forward.same_shape(&backward));
        assert_eq!(names(&forward, forward.top_level()), vec!["outer"]);
    }

    #[test]
    fn test_node_by_timestamp() {
        let tree = CallTree::from_spans(
            1,
            1,
            vec![span("first", 10.0, 20.0), span("second", 30.0, 40.0)],
        )
        .unwrap();

        let first = tree.top_level()[0];
        let second = tree.top_level()[1];
        assert_eq!(tree.node_by_timestamp(0.0), Some(first));
        assert_eq!(tree.node_by_timestamp(25.0), Some(first));
        assert_eq!(tree.node_by_timestamp(30.0), Some(second));
        assert_eq!(CallTree::new(1, 1).node_by_timestamp(0.0), None);
    }

    #[test]
    fn test_index_in_parent_and_depth() {
        let tree = CallTree::from_spans(
            1,
            1,
            vec![
                span("t", 0.0, 10.0),
                span("a", 1.0, 2.0),
                span("b", 3.0, 4.0),
                span("c", 3.5, 3.8),
            ],
        )
        .unwrap();

        let t = tree.top_level()[0];
        let b = tree.node(t).children()[1];
        let c = tree.node(b).children()[0];
        assert_eq!(tree.index_in_parent(b), Some(1));
        assert_eq!(tree.index_in_parent(ROOT), None);
        assert_eq!(tree.depth(t), 0);
        assert_eq!(tree.depth(c), 2);
        assert_eq!(
            names(&tree, &tree.preorder().collect::<Vec<_>>()),
            vec!["t", "a", "b", "c"]
        );
    }

    #[test]
    fn test_shift() {
        let mut tree =
            CallTree::from_spans(1, 1, vec![span("t", 100.0, 110.0), span("a", 101.0, 102.0)])
                .unwrap();
        tree.shift(100.0);

        assert_eq!(tree.first_ts(), Some(0.0));
        assert_eq!(tree.last_ts(), Some(10.0));
        tree.check_invariants().unwrap();
    }
}
