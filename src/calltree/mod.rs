//! Call-tree reconstruction.
//!
//! This module handles:
//! - Placing unordered spans into a strictly nested tree per (pid, tid)
//! - Grouping trees into a forest keyed by origin
//! - Timestamp lookup and normalisation

pub mod builder;
pub mod forest;
pub mod node;

pub use builder::{CallTree, ROOT};
pub use forest::{Forest, RejectedTree, TreeKey};
pub use node::{Node, NodeId};
