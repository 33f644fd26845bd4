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

use super::{MetricTree, NodeId, TreeNode};
use crate::errors::{CanopyError, CanopyResult};
use log::debug;
use pointset::{Metric, PointIndex, PointSet};
use smallvec::SmallVec;

/// Builds a `MetricTree` by recursive farthest-point splitting. Each routing node
/// keeps its own center for its first child and seeds the second with the point
/// furthest from it, so the tree has self-children by construction. The split is
/// deterministic; there is no sampling involved.
#[derive(Clone, Debug)]
pub struct MetricTreeBuilder {
    leaf_cutoff: usize,
}

impl Default for MetricTreeBuilder {
    fn default() -> MetricTreeBuilder {
        MetricTreeBuilder { leaf_cutoff: 20 }
    }
}

impl MetricTreeBuilder {
    /// Creates a builder with default parameters.
    pub fn new() -> MetricTreeBuilder {
        MetricTreeBuilder::default()
    }

    /// The maximum number of points a leaf is allowed to own. A smaller value gives
    /// tighter bounds at the cost of a larger arena.
    pub fn set_leaf_cutoff(&mut self, leaf_cutoff: usize) -> &mut Self {
        self.leaf_cutoff = leaf_cutoff.max(1);
        self
    }

    /// Builds the tree over the whole point set.
    pub fn build<M: Metric>(&self, point_set: &PointSet, metric: &M) -> CanopyResult<MetricTree> {
        if point_set.is_empty() {
            return Err(CanopyError::EmptyPointSet);
        }
        let mut nodes: Vec<TreeNode> = Vec::new();
        let covered: Vec<PointIndex> = (0..point_set.len()).collect();
        let root = self.split(&mut nodes, point_set, metric, None, 0, covered)?;
        debug!(
            "built metric tree: {} nodes over {} points, root radius {}",
            nodes.len(),
            point_set.len(),
            nodes[root.0].radius
        );
        Ok(MetricTree { nodes, root })
    }

    fn split<M: Metric>(
        &self,
        nodes: &mut Vec<TreeNode>,
        point_set: &PointSet,
        metric: &M,
        parent: Option<NodeId>,
        center: PointIndex,
        covered: Vec<PointIndex>,
    ) -> CanopyResult<NodeId> {
        let center_point = point_set.point(center)?;
        let mut radius = 0.0f32;
        let mut farthest = center;
        for &pi in &covered {
            let d = metric.dist(center_point, point_set.point(pi)?);
            if d > radius {
                radius = d;
                farthest = pi;
            }
        }

        let id = NodeId(nodes.len());
        nodes.push(TreeNode {
            parent,
            children: SmallVec::new(),
            points: SmallVec::new(),
            center_index: center,
            radius,
        });

        if covered.len() <= self.leaf_cutoff || radius == 0.0 {
            nodes[id.0].points = covered.into_iter().collect();
            return Ok(id);
        }

        // The center keeps the near cell, the farthest covered point seeds the far
        // cell. The center always lands in the near cell and the seed in the far
        // cell, so both shrink and the recursion terminates.
        let far_point = point_set.point(farthest)?;
        let mut near: Vec<PointIndex> = Vec::new();
        let mut far: Vec<PointIndex> = Vec::new();
        for &pi in &covered {
            if pi == farthest {
                far.push(pi);
                continue;
            }
            let p = point_set.point(pi)?;
            if metric.dist(p, center_point) <= metric.dist(p, far_point) {
                near.push(pi);
            } else {
                far.push(pi);
            }
        }

        let self_child = self.split(nodes, point_set, metric, Some(id), center, near)?;
        let far_child = self.split(nodes, point_set, metric, Some(id), farthest, far)?;
        nodes[id.0].children.push(self_child);
        nodes[id.0].children.push(far_child);
        Ok(id)
    }
}
