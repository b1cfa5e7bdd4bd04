//! Call trees of a whole trace, keyed by (pid, tid).

use super::builder::CallTree;
use crate::parser::Span;
use crate::utils::error::StructuralError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of one call tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeKey {
    pub pid: u64,
    pub tid: u64,
}

impl TreeKey {
    pub fn new(pid: u64, tid: u64) -> Self {
        Self { pid, tid }
    }
}

impl fmt::Display for TreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}_t{}", self.pid, self.tid)
    }
}

/// A call tree left out of a forest, with the error that stopped it
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedTree {
    pub key: TreeKey,
    pub error: StructuralError,
}

/// Ordered mapping (pid, tid) -> call tree
#[derive(Debug, Clone, Default)]
pub struct Forest {
    trees: BTreeMap<TreeKey, CallTree>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group spans by origin and build one tree per (pid, tid)
    ///
    /// **Public** - main entry point for call-tree reconstruction
    ///
    /// A `StructuralError` stops only the tree it occurs in: that tree is
    /// dropped, its remaining spans are skipped, and the other trees are
    /// still built.
    ///
    /// # Returns
    /// The forest of well-nested trees and one `RejectedTree` per dropped tree,
    /// in key order
    pub fn ingest<I>(spans: I) -> (Self, Vec<RejectedTree>)
    where
        I: IntoIterator<Item = Span>,
    {
        let mut forest = Self::new();
        let mut rejected: BTreeMap<TreeKey, StructuralError> = BTreeMap::new();

        for span in spans {
            let key = TreeKey::new(span.pid, span.tid);
            if rejected.contains_key(&key) {
                continue;
            }
            if let Err(error) = forest.insert(span) {
                warn!("Dropping call tree {}: {}", key, error);
                forest.trees.remove(&key);
                rejected.insert(key, error);
            }
        }

        info!(
            "Reconstructed {} spans into {} call trees ({} rejected)",
            forest.span_count(),
            forest.len(),
            rejected.len()
        );
        let rejected = rejected
            .into_iter()
            .map(|(key, error)| RejectedTree { key, error })
            .collect();
        (forest, rejected)
    }

    /// Like `ingest`, but fails unless every tree is well nested
    ///
    /// # Errors
    /// The error of the first rejected tree, in key order
    pub fn from_spans<I>(spans: I) -> Result<Self, StructuralError>
    where
        I: IntoIterator<Item = Span>,
    {
        let (forest, rejected) = Self::ingest(spans);
        match rejected.into_iter().next() {
            Some(first) => Err(first.error),
            None => Ok(forest),
        }
    }

    /// Insert one span into the tree of its (pid, tid), creating the tree if needed
    pub fn insert(&mut self, span: Span) -> Result<(), StructuralError> {
        let key = TreeKey::new(span.pid, span.tid);
        self.trees
            .entry(key)
            .or_insert_with(|| CallTree::new(key.pid, key.tid))
            .insert(span)?;
        Ok(())
    }

    /// Add a tree built elsewhere, replacing any tree with the same key
    pub fn insert_tree(&mut self, tree: CallTree) -> Option<CallTree> {
        let key = TreeKey::new(tree.pid(), tree.tid());
        debug!("Adding call tree {} ({} spans)", key, tree.len());
        self.trees.insert(key, tree)
    }

    pub fn tree(&self, key: TreeKey) -> Option<&CallTree> {
        self.trees.get(&key)
    }

    pub fn trees(&self) -> impl Iterator<Item = (TreeKey, &CallTree)> {
        self.trees.iter().map(|(key, tree)| (*key, tree))
    }

    pub fn keys(&self) -> impl Iterator<Item = TreeKey> + '_ {
        self.trees.keys().copied()
    }

    /// Distinct process ids, ascending
    pub fn pids(&self) -> Vec<u64> {
        let mut pids: Vec<u64> = self.trees.keys().map(|key| key.pid).collect();
        pids.dedup();
        pids
    }

    /// Thread ids of one process, ascending
    pub fn tids(&self, pid: u64) -> Vec<u64> {
        self.trees
            .range(TreeKey::new(pid, 0)..=TreeKey::new(pid, u64::MAX))
            .map(|(key, _)| key.tid)
            .collect()
    }

    /// Number of trees
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Total number of spans over all trees
    pub fn span_count(&self) -> usize {
        self.trees.values().map(CallTree::len).sum()
    }

    /// Tree with the smallest key
    pub fn first_tree(&self) -> Option<&CallTree> {
        self.trees.values().next()
    }

    /// Earliest span start over all trees
    pub fn first_ts(&self) -> Option<f64> {
        self.trees
            .values()
            .filter_map(CallTree::first_ts)
            .reduce(f64::min)
    }

    /// Latest span end over all trees
    pub fn last_ts(&self) -> Option<f64> {
        self.trees
            .values()
            .filter_map(CallTree::last_ts)
            .reduce(f64::max)
    }

    /// Shift all timestamps so the earliest span starts at 0
    ///
    /// Returns the offset that was subtracted.
    pub fn normalize(&mut self) -> f64 {
        let offset = self.first_ts().unwrap_or(0.0);
        if offset != 0.0 {
            debug!("Normalizing timestamps by {}", offset);
            for tree in self.trees.values_mut() {
                tree.shift(offset);
            }
        }
        offset
    }

    /// Trees whose recorded range covers `ts`
    pub fn active_at(&self, ts: f64) -> Vec<TreeKey> {
        self.trees
            .iter()
            .filter(|(_, tree)| match (tree.first_ts(), tree.last_ts()) {
                (Some(first), Some(last)) => first <= ts && ts <= last,
                _ => false,
            })
            .map(|(key, _)| *key)
            .collect()
    }
}
