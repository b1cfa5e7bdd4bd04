//! Merge repeated call paths of a call tree into a flame tree.
//!
//! Calls with the same name under the same aggregated parent collapse into
//! one node carrying the summed duration and the number of invocations.
//!
//! Example: `t -> f -> g` called twice below `t` becomes one `g` node
//! with `count = 2` and the two durations added.

use crate::calltree::{CallTree, Forest, NodeId, TreeKey};
use crate::utils::config::FLAME_ROOT_NAME;
use indexmap::IndexMap;
use log::debug;
use serde::{Serialize, Serializer};

/// One merged call path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlameNode {
    pub name: String,

    /// Summed duration of every merged call
    pub value: f64,

    /// Number of merged calls
    pub count: u64,

    /// Keyed by name, in first-seen order
    #[serde(serialize_with = "children_as_seq")]
    pub children: IndexMap<String, FlameNode>,
}

impl FlameNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: 0.0,
            count: 0,
            children: IndexMap::new(),
        }
    }

    /// `value` minus the children's `value`; negative for malformed durations
    pub fn self_value(&self) -> f64 {
        self.value - self.children.values().map(|c| c.value).sum::<f64>()
    }
}

/// Frees descendants from a work list, so drop depth stays constant
impl Drop for FlameNode {
    fn drop(&mut self) {
        let mut pending: Vec<FlameNode> = self.children.drain(..).map(|(_, c)| c).collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.children.drain(..).map(|(_, c)| c));
        }
    }
}

/// Flame node under construction; children point into the arena
struct Slot<'t> {
    name: &'t str,
    value: f64,
    count: u64,
    children: IndexMap<&'t str, usize>,
}

impl<'t> Slot<'t> {
    fn new(name: &'t str) -> Self {
        Self {
            name,
            value: 0.0,
            count: 0,
            children: IndexMap::new(),
        }
    }
}

/// Merge the call tree into an arena of slots, walking it in pre-order
///
/// A slot is always created after its parent.
fn merge_paths(tree: &CallTree) -> Vec<Slot<'_>> {
    let mut slots = vec![Slot::new(FLAME_ROOT_NAME)];
    let mut pending: Vec<(NodeId, usize)> =
        tree.top_level().iter().rev().map(|&id| (id, 0)).collect();

    while let Some((id, parent)) = pending.pop() {
        let node = tree.node(id);
        let next = slots.len();
        let slot = *slots[parent].children.entry(node.name()).or_insert(next);
        if slot == next {
            slots.push(Slot::new(node.name()));
        }

        slots[slot].value += node.duration();
        slots[slot].count += 1;
        pending.extend(node.children().iter().rev().map(|&child| (child, slot)));
    }

    slots
}

/// Turn the arena into nested nodes, children before parents
fn into_nodes(slots: Vec<Slot<'_>>) -> FlameNode {
    let mut built: Vec<Option<FlameNode>> = (0..slots.len()).map(|_| None).collect();

    for (index, slot) in slots.into_iter().enumerate().rev() {
        let children = slot
            .children
            .into_iter()
            .filter_map(|(name, child)| built[child].take().map(|node| (name.to_string(), node)))
            .collect();

        built[index] = Some(FlameNode {
            name: slot.name.to_string(),
            value: slot.value,
            count: slot.count,
            children,
        });
    }

    built
        .first_mut()
        .and_then(Option::take)
        .unwrap_or_else(|| FlameNode::new(FLAME_ROOT_NAME))
}

fn children_as_seq<S: Serializer>(
    children: &IndexMap<String, FlameNode>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(children.values())
}

/// Flame summary of one call tree
#[derive(Debug, Clone, Serialize)]
pub struct FlameTree {
    #[serde(skip)]
    pub key: TreeKey,

    /// Synthetic root; its children are the top-level call paths
    #[serde(flatten)]
    pub root: FlameNode,
}

impl FlameTree {
    /// Sum of top-level values (= sum of top-level span durations)
    pub fn total_time(&self) -> f64 {
        self.root.children.values().map(|c| c.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

/// Aggregate one call tree
///
/// **Public** - main entry point for flame aggregation
///
/// # Arguments
/// * `tree` - Reconstructed call tree
///
/// # Returns
/// Flame tree whose root value equals the summed top-level durations
pub fn aggregate(tree: &CallTree) -> FlameTree {
    let mut root = into_nodes(merge_paths(tree));
    root.value = root.children.values().map(|c| c.value).sum();
    root.count = 1;

    let key = TreeKey::new(tree.pid(), tree.tid());
    debug!(
        "Aggregated {} spans of {} into {} top-level paths",
        tree.len(),
        key,
        root.children.len()
    );

    FlameTree { key, root }
}

/// Aggregate every tree of a forest, in key order
pub fn aggregate_forest(forest: &Forest) -> Vec<FlameTree> {
    forest.trees().map(|(_, tree)| aggregate(tree)).collect()
}
