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

use super::{CandidateLists, NodeStat, SortPolicy};
use crate::traverse::{DualRules, SingleRules};
use crate::tree::{NodeId, SpatialTree};
use pointset::{Metric, PointIndex, PointSet};

/// The k-neighbor scoring rules. One instance drives one search invocation; it owns
/// the candidate lists and both sides' node scratch tables, and assumes strictly
/// sequential invocation (the single-slot base-case memo is only valid under that
/// ordering).
///
/// All index arguments are trusted; validation happens in the search facade before
/// an instance is ever constructed.
pub struct NeighborRules<'a, S: SortPolicy, M: Metric, T: SpatialTree> {
    query_set: &'a PointSet,
    reference_set: &'a PointSet,
    query_tree: &'a T,
    reference_tree: &'a T,
    metric: &'a M,
    candidates: CandidateLists<S>,
    query_stats: Vec<NodeStat>,
    reference_stats: Vec<NodeStat>,
    self_search: bool,
    last_pair: Option<(PointIndex, PointIndex)>,
    last_base_case: f32,
}

impl<'a, S: SortPolicy, M: Metric, T: SpatialTree> NeighborRules<'a, S, M, T> {
    /// Creates the rules for one search. For a single-tree search pass the
    /// reference tree on both tree sides; the query-side stat table just goes
    /// unused. Self-search is detected by set identity, which changes the base-case
    /// contract: a point is not its own neighbor.
    pub fn new(
        query_set: &'a PointSet,
        reference_set: &'a PointSet,
        query_tree: &'a T,
        reference_tree: &'a T,
        metric: &'a M,
        k: usize,
    ) -> NeighborRules<'a, S, M, T> {
        NeighborRules {
            query_set,
            reference_set,
            query_tree,
            reference_tree,
            metric,
            candidates: CandidateLists::new(query_set.len(), k),
            query_stats: vec![NodeStat::new::<S>(); query_tree.node_count()],
            reference_stats: vec![NodeStat::new::<S>(); reference_tree.node_count()],
            self_search: std::ptr::eq(query_set, reference_set),
            last_pair: None,
            last_base_case: 0.0,
        }
    }

    /// The distance between a query point and a reference point, inserted into the
    /// query's candidate row if it earns a slot.
    ///
    /// Under self-search an identical pair returns 0 without touching the row. An
    /// immediately repeated pair returns the memoized distance without a second
    /// metric evaluation; the traversal commonly re-asks the same pair when scoring
    /// a node right after scoring its self-child.
    pub fn base_case(&mut self, query_index: PointIndex, reference_index: PointIndex) -> f32 {
        if self.self_search && query_index == reference_index {
            return 0.0;
        }
        if self.last_pair == Some((query_index, reference_index)) {
            return self.last_base_case;
        }

        let distance = self
            .metric
            .dist(&self.query_set[query_index], &self.reference_set[reference_index]);

        if let Some(pos) = S::sort_distance(self.candidates.row(query_index), distance) {
            self.candidates
                .insert(query_index, pos, reference_index, distance);
        }

        self.last_pair = Some((query_index, reference_index));
        self.last_base_case = distance;
        distance
    }

    /// Point-to-node pruning score: `Some(bound)` if the node could still improve
    /// the query's candidates, `None` to prune it.
    pub fn score_point(&mut self, query_index: PointIndex, reference_node: NodeId) -> Option<f32> {
        let distance = if T::REP_IS_CENTROID {
            let center = self.reference_tree.center_index(reference_node);
            let base_case = match self.self_child_parent(self.reference_tree, reference_node) {
                // The parent was scored for this query right before us, so its
                // cached distance is our center distance too.
                Some(parent) => self.reference_stats[parent.0].last_distance,
                None => self.base_case(query_index, center),
            };
            if T::SELF_CHILDREN {
                self.reference_stats[reference_node.0].last_distance = base_case;
            }
            S::combine_best(base_case, self.reference_tree.radius(reference_node))
        } else {
            // No centroid guarantee, so the ball bound comes straight from the
            // metric and never routes through the candidate lists.
            let center = self.reference_tree.center_index(reference_node);
            let d = self
                .metric
                .dist(&self.query_set[query_index], &self.reference_set[center]);
            S::combine_best(d, self.reference_tree.radius(reference_node))
        };

        let best_distance = self.candidates.kth(query_index);
        if S::is_better(distance, best_distance) {
            Some(distance)
        } else {
            None
        }
    }

    /// Revalidates a previously produced point-to-node score after the query's
    /// candidates may have tightened. A pruned pair never un-prunes.
    pub fn rescore_point(
        &self,
        query_index: PointIndex,
        _reference_node: NodeId,
        old_score: Option<f32>,
    ) -> Option<f32> {
        let score = old_score?;
        let best_distance = self.candidates.kth(query_index);
        if S::is_better(score, best_distance) {
            Some(score)
        } else {
            None
        }
    }

    /// Node-to-node pruning score: a single bound valid for every query point the
    /// query node owns, compared against the node's aggregate bound.
    pub fn score_nodes(&mut self, query_node: NodeId, reference_node: NodeId) -> Option<f32> {
        let distance = if T::REP_IS_CENTROID {
            let query_center = self.query_tree.center_index(query_node);
            let reference_center = self.reference_tree.center_index(reference_node);

            let base_case = match self.cached_center_distance(query_node, reference_node) {
                Some(cached) => {
                    // Seed the point memo so a base case on the same pair right
                    // after this score stays free.
                    self.last_pair = Some((query_center, reference_center));
                    self.last_base_case = cached;
                    cached
                }
                None => self.base_case(query_center, reference_center),
            };

            let query_stat = &mut self.query_stats[query_node.0];
            query_stat.last_distance = base_case;
            query_stat.last_distance_node = Some(reference_node);
            let reference_stat = &mut self.reference_stats[reference_node.0];
            reference_stat.last_distance = base_case;
            reference_stat.last_distance_node = Some(query_node);

            S::combine_best(
                base_case,
                self.query_tree.radius(query_node) + self.reference_tree.radius(reference_node),
            )
        } else {
            let d = self.metric.dist(
                &self.query_set[self.query_tree.center_index(query_node)],
                &self.reference_set[self.reference_tree.center_index(reference_node)],
            );
            S::combine_best(
                d,
                self.query_tree.radius(query_node) + self.reference_tree.radius(reference_node),
            )
        };

        let best_distance = self.calculate_bound(query_node);
        if S::is_better(distance, best_distance) {
            Some(distance)
        } else {
            None
        }
    }

    /// Revalidates a node-to-node score against the query node's refreshed
    /// aggregate bound. `None` is absorbing.
    pub fn rescore_nodes(
        &mut self,
        query_node: NodeId,
        _reference_node: NodeId,
        old_score: Option<f32>,
    ) -> Option<f32> {
        let score = old_score?;
        let best_distance = self.calculate_bound(query_node);
        if S::is_better(score, best_distance) {
            Some(score)
        } else {
            None
        }
    }

    /// The aggregate pruning bound for a query node: the best of five independently
    /// valid limits on what any point under the node can still achieve.
    ///
    /// 1. the worse of the worst owned-point k'th candidate and the worst child
    ///    first-bound;
    /// 2. the best owned-point k'th candidate, worsened by twice the node's radius;
    /// 3. the best child second-bound, worsened by twice the radius gap between the
    ///    node and that child;
    /// 4. the parent's first bound;
    /// 5. the parent's second bound.
    ///
    /// `first_bound` keeps the better of 1 and 4, `second_bound` the best of 2, 3
    /// and 5, and the stored bound is the better half. Children and ancestors read
    /// these back on their own calls, so the store must happen before returning.
    pub fn calculate_bound(&mut self, query_node: NodeId) -> f32 {
        let mut worst_point_distance = S::best();
        let mut best_point_distance = S::worst();
        for &pi in self.query_tree.points(query_node) {
            let d = self.candidates.kth(pi);
            best_point_distance = S::best_of(d, best_point_distance);
            worst_point_distance = S::worst_of(d, worst_point_distance);
        }

        let mut worst_child_bound = S::best();
        let mut best_adjusted_child_bound = S::worst();
        let query_radius = self.query_tree.radius(query_node);
        for &child in self.query_tree.children(query_node) {
            let stat = &self.query_stats[child.0];
            worst_child_bound = S::worst_of(stat.first_bound, worst_child_bound);

            let adjusted = S::combine_worst(
                stat.second_bound,
                2.0 * (query_radius - self.query_tree.radius(child)),
            );
            best_adjusted_child_bound = S::best_of(adjusted, best_adjusted_child_bound);
        }

        let point_bound = S::worst_of(worst_point_distance, worst_child_bound);
        let spread_bound = S::combine_worst(best_point_distance, 2.0 * query_radius);

        let (parent_first, parent_second) = match self.query_tree.parent(query_node) {
            Some(parent) => {
                let stat = &self.query_stats[parent.0];
                (stat.first_bound, stat.second_bound)
            }
            None => (S::worst(), S::worst()),
        };

        let first_bound = S::best_of(point_bound, parent_first);
        let second_bound = S::best_of(
            S::best_of(best_adjusted_child_bound, spread_bound),
            parent_second,
        );

        let stat = &mut self.query_stats[query_node.0];
        stat.first_bound = first_bound;
        stat.second_bound = second_bound;
        stat.bound = S::best_of(first_bound, second_bound);
        stat.bound
    }

    /// Consumes the rules and hands back one sorted candidate list per query point.
    pub fn unpack(self) -> Vec<Vec<(f32, PointIndex)>> {
        self.candidates.unpack()
    }

    /// Read access to the candidate lists mid-search.
    pub fn candidates(&self) -> &CandidateLists<S> {
        &self.candidates
    }

    /// The parent of `node`, if `node` shares its representative with it.
    fn self_child_parent(&self, tree: &'a T, node: NodeId) -> Option<NodeId> {
        if !T::SELF_CHILDREN {
            return None;
        }
        let parent = tree.parent(node)?;
        if tree.center_index(parent) == tree.center_index(node) {
            Some(parent)
        } else {
            None
        }
    }

    /// Looks for an already computed distance between the two nodes' centers. Four
    /// places can hold one: either node's own cache, or the cache of a parent that
    /// shares its child's center. The checks run in that fixed order and the first
    /// hit wins; any hit denotes the same center pair, so precedence only picks
    /// which record supplies the value.
    fn cached_center_distance(&self, query_node: NodeId, reference_node: NodeId) -> Option<f32> {
        if !T::SELF_CHILDREN {
            return None;
        }
        let query_center = self.query_tree.center_index(query_node);
        let reference_center = self.reference_tree.center_index(reference_node);

        let query_stat = &self.query_stats[query_node.0];
        if let Some(last) = query_stat.last_distance_node {
            if self.reference_tree.center_index(last) == reference_center {
                return Some(query_stat.last_distance);
            }
        }

        let reference_stat = &self.reference_stats[reference_node.0];
        if let Some(last) = reference_stat.last_distance_node {
            if self.query_tree.center_index(last) == query_center {
                return Some(reference_stat.last_distance);
            }
        }

        if let Some(parent) = self.self_child_parent(self.query_tree, query_node) {
            let stat = &self.query_stats[parent.0];
            if let Some(last) = stat.last_distance_node {
                if self.reference_tree.center_index(last) == reference_center {
                    return Some(stat.last_distance);
                }
            }
        }

        if let Some(parent) = self.self_child_parent(self.reference_tree, reference_node) {
            let stat = &self.reference_stats[parent.0];
            if let Some(last) = stat.last_distance_node {
                if self.query_tree.center_index(last) == query_center {
                    return Some(stat.last_distance);
                }
            }
        }

        None
    }
}

impl<'a, S: SortPolicy, M: Metric, T: SpatialTree> DualRules for NeighborRules<'a, S, M, T> {
    fn base_case(&mut self, query_index: PointIndex, reference_index: PointIndex) -> f32 {
        NeighborRules::base_case(self, query_index, reference_index)
    }

    fn score(&mut self, query_node: NodeId, reference_node: NodeId) -> Option<f32> {
        self.score_nodes(query_node, reference_node)
    }

    fn rescore(
        &mut self,
        query_node: NodeId,
        reference_node: NodeId,
        old_score: Option<f32>,
    ) -> Option<f32> {
        self.rescore_nodes(query_node, reference_node, old_score)
    }

    fn score_is_better(a: f32, b: f32) -> bool {
        S::is_better(a, b)
    }
}

impl<'a, S: SortPolicy, M: Metric, T: SpatialTree> SingleRules for NeighborRules<'a, S, M, T> {
    fn base_case(&mut self, query_index: PointIndex, reference_index: PointIndex) -> f32 {
        NeighborRules::base_case(self, query_index, reference_index)
    }

    fn score(&mut self, query_index: PointIndex, reference_node: NodeId) -> Option<f32> {
        self.score_point(query_index, reference_node)
    }

    fn rescore(
        &mut self,
        query_index: PointIndex,
        reference_node: NodeId,
        old_score: Option<f32>,
    ) -> Option<f32> {
        self.rescore_point(query_index, reference_node, old_score)
    }

    fn score_is_better(a: f32, b: f32) -> bool {
        S::is_better(a, b)
    }
}
