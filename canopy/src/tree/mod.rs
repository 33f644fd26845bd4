/*
* Licensed to Elasticsearch B.V. under one or more contributor
* license agreements. See the NOTICE file distributed with
* this work for additional information regarding copyright
* ownership. Elasticsearch B.V. licenses this file to you under
* the Apache License, Version 2.0 (the "License"); you may
* not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*  http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing,
* software distributed under the License is distributed on an
* "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
* KIND, either express or implied.  See the License for the
* specific language governing permissions and limitations
* under the License.
*/

//! # The metric tree
//! An arena-allocated ball-cover tree. Nodes refer to each other by `NodeId` (an
//! index into the arena), never by pointer, so parent and sibling links cannot
//! outlive the arena that owns them. The scoring engine reads node geometry
//! through the `SpatialTree` trait and keeps its own scratch state in a side
//! table indexed by the same ids.

mod builder;
pub use builder::MetricTreeBuilder;

use pointset::PointIndex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Index of a node in a tree arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The geometry and structure the scoring engine needs from a tree. The two
/// constants are static facts about the tree type: whether a node's representative
/// point is the center of its covering ball, and whether the first child of a
/// routing node keeps its parent's representative (which lets the engine reuse
/// cached center distances down a chain of such nodes).
pub trait SpatialTree {
    /// The representative point is the center of the node's ball.
    const REP_IS_CENTROID: bool;
    /// Routing nodes pass their representative down to their first child.
    const SELF_CHILDREN: bool;

    /// The root of the tree.
    fn root(&self) -> NodeId;
    /// The number of nodes in the arena. Side tables are sized off this.
    fn node_count(&self) -> usize;
    /// Child ids of a node. Empty for leaves.
    fn children(&self, node: NodeId) -> &[NodeId];
    /// The points a node owns directly. Routing nodes own none; every point lives
    /// in exactly one leaf.
    fn points(&self, node: NodeId) -> &[PointIndex];
    /// The node's representative point.
    fn center_index(&self, node: NodeId) -> PointIndex;
    /// Furthest descendant distance: the maximum distance from the representative
    /// to any point the node covers.
    fn radius(&self, node: NodeId) -> f32;
    /// The parent id, if this isn't the root.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether the node has no children.
    fn is_leaf(&self, node: NodeId) -> bool {
        self.children(node).is_empty()
    }
}

/// A single node of the arena.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeNode {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) points: SmallVec<[PointIndex; 8]>,
    pub(crate) center_index: PointIndex,
    pub(crate) radius: f32,
}

/// The ball-cover tree produced by `MetricTreeBuilder`. Immutable once built; all
/// per-search mutable state lives in the engine's side tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricTree {
    pub(crate) nodes: Vec<TreeNode>,
    pub(crate) root: NodeId,
}

impl MetricTree {
    /// Collects every point covered by a node, in arena order.
    pub fn covered_points(&self, node: NodeId) -> Vec<PointIndex> {
        let mut covered = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            covered.extend_from_slice(&self.nodes[n.0].points);
            stack.extend_from_slice(&self.nodes[n.0].children);
        }
        covered
    }

    /// The ids of the leaves under a node.
    pub fn leaves_under(&self, node: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if self.nodes[n.0].children.is_empty() {
                leaves.push(n);
            } else {
                stack.extend_from_slice(&self.nodes[n.0].children);
            }
        }
        leaves
    }
}

impl SpatialTree for MetricTree {
    const REP_IS_CENTROID: bool = true;
    const SELF_CHILDREN: bool = true;

    fn root(&self) -> NodeId {
        self.root
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    fn points(&self, node: NodeId) -> &[PointIndex] {
        &self.nodes[node.0].points
    }

    fn center_index(&self, node: NodeId) -> PointIndex {
        self.nodes[node.0].center_index
    }

    fn radius(&self, node: NodeId) -> f32 {
        self.nodes[node.0].radius
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }
}
