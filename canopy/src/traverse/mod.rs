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

//! # Branch-and-bound traversals
//! Depth-first walks over one or two trees, generic over the rule set that decides
//! pruning. The traversers own the walk order and nothing else; everything
//! answer-shaped lives in the rules.

use crate::tree::{NodeId, SpatialTree};
use pointset::PointIndex;

/// The rule interface a dual-tree traversal drives. `score` returning `None` means
/// the node pair is pruned; `rescore` may only move a score toward `None`, never
/// back.
pub trait DualRules {
    /// Record the query/reference point pair and return their distance.
    fn base_case(&mut self, query_index: PointIndex, reference_index: PointIndex) -> f32;
    /// Can this node pair still contribute? `Some(priority)` or prune.
    fn score(&mut self, query_node: NodeId, reference_node: NodeId) -> Option<f32>;
    /// Revalidate a score produced earlier in the walk.
    fn rescore(
        &mut self,
        query_node: NodeId,
        reference_node: NodeId,
        old_score: Option<f32>,
    ) -> Option<f32>;
    /// The rule set's direction of preference, so the traverser can visit
    /// better-scored children first.
    fn score_is_better(a: f32, b: f32) -> bool;
}

/// The single-tree counterpart: one query point against the reference tree.
pub trait SingleRules {
    fn base_case(&mut self, query_index: PointIndex, reference_index: PointIndex) -> f32;
    fn score(&mut self, query_index: PointIndex, reference_node: NodeId) -> Option<f32>;
    fn rescore(
        &mut self,
        query_index: PointIndex,
        reference_node: NodeId,
        old_score: Option<f32>,
    ) -> Option<f32>;
    fn score_is_better(a: f32, b: f32) -> bool;
}

/// Depth-first dual-tree traversal. Reference children are visited best-first and
/// rescored right before descent, so a sibling visited earlier can retroactively
/// prune the later ones.
pub struct DualTreeTraverser<'a, T: SpatialTree, R: DualRules> {
    query_tree: &'a T,
    reference_tree: &'a T,
    rules: &'a mut R,
    num_prunes: usize,
}

impl<'a, T: SpatialTree, R: DualRules> DualTreeTraverser<'a, T, R> {
    pub fn new(
        query_tree: &'a T,
        reference_tree: &'a T,
        rules: &'a mut R,
    ) -> DualTreeTraverser<'a, T, R> {
        DualTreeTraverser {
            query_tree,
            reference_tree,
            rules,
            num_prunes: 0,
        }
    }

    /// Runs the full traversal from both roots.
    pub fn traverse(&mut self) {
        let q = self.query_tree.root();
        let r = self.reference_tree.root();
        match self.rules.score(q, r) {
            Some(_) => self.dual_recurse(q, r),
            None => self.num_prunes += 1,
        }
    }

    /// Node pairs pruned over the whole walk.
    pub fn num_prunes(&self) -> usize {
        self.num_prunes
    }

    fn dual_recurse(&mut self, query_node: NodeId, reference_node: NodeId) {
        let q_leaf = self.query_tree.is_leaf(query_node);
        let r_leaf = self.reference_tree.is_leaf(reference_node);

        if q_leaf && r_leaf {
            for &qi in self.query_tree.points(query_node) {
                for &ri in self.reference_tree.points(reference_node) {
                    self.rules.base_case(qi, ri);
                }
            }
            return;
        }

        if q_leaf {
            self.descend_reference(query_node, reference_node);
            return;
        }

        if r_leaf {
            let children: Vec<NodeId> = self.query_tree.children(query_node).to_vec();
            for qc in children {
                match self.rules.score(qc, reference_node) {
                    Some(_) => self.dual_recurse(qc, reference_node),
                    None => self.num_prunes += 1,
                }
            }
            return;
        }

        let children: Vec<NodeId> = self.query_tree.children(query_node).to_vec();
        for qc in children {
            self.descend_reference(qc, reference_node);
        }
    }

    /// Scores every reference child against one query node, then visits survivors
    /// best-first, rescoring each just before descending into it.
    fn descend_reference(&mut self, query_node: NodeId, reference_node: NodeId) {
        let mut scored: Vec<(NodeId, f32)> = Vec::new();
        for &rc in self.reference_tree.children(reference_node) {
            match self.rules.score(query_node, rc) {
                Some(score) => scored.push((rc, score)),
                None => self.num_prunes += 1,
            }
        }
        scored.sort_by(|a, b| {
            if R::score_is_better(a.1, b.1) {
                std::cmp::Ordering::Less
            } else if R::score_is_better(b.1, a.1) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });

        for (rc, score) in scored {
            match self.rules.rescore(query_node, rc, Some(score)) {
                Some(_) => self.dual_recurse(query_node, rc),
                None => self.num_prunes += 1,
            }
        }
    }
}

/// Depth-first single-tree traversal for one query point.
pub struct SingleTreeTraverser<'a, T: SpatialTree, R: SingleRules> {
    reference_tree: &'a T,
    rules: &'a mut R,
    num_prunes: usize,
}

impl<'a, T: SpatialTree, R: SingleRules> SingleTreeTraverser<'a, T, R> {
    pub fn new(reference_tree: &'a T, rules: &'a mut R) -> SingleTreeTraverser<'a, T, R> {
        SingleTreeTraverser {
            reference_tree,
            rules,
            num_prunes: 0,
        }
    }

    /// Walks the reference tree for `query_index`.
    pub fn traverse(&mut self, query_index: PointIndex) {
        let root = self.reference_tree.root();
        match self.rules.score(query_index, root) {
            Some(_) => self.single_recurse(query_index, root),
            None => self.num_prunes += 1,
        }
    }

    pub fn num_prunes(&self) -> usize {
        self.num_prunes
    }

    fn single_recurse(&mut self, query_index: PointIndex, reference_node: NodeId) {
        for &ri in self.reference_tree.points(reference_node) {
            self.rules.base_case(query_index, ri);
        }

        let mut scored: Vec<(NodeId, f32)> = Vec::new();
        for &rc in self.reference_tree.children(reference_node) {
            match self.rules.score(query_index, rc) {
                Some(score) => scored.push((rc, score)),
                None => self.num_prunes += 1,
            }
        }
        scored.sort_by(|a, b| {
            if R::score_is_better(a.1, b.1) {
                std::cmp::Ordering::Less
            } else if R::score_is_better(b.1, a.1) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });

        for (rc, score) in scored {
            match self.rules.rescore(query_index, rc, Some(score)) {
                Some(_) => self.single_recurse(query_index, rc),
                None => self.num_prunes += 1,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tree::tests::grid_set;
    use crate::tree::MetricTreeBuilder;
    use pointset::L2;
    use std::collections::HashSet;

    /// A rule set that prunes nothing and records every pair it sees.
    struct RecordingRules {
        pairs: HashSet<(PointIndex, PointIndex)>,
    }

    impl RecordingRules {
        fn new() -> RecordingRules {
            RecordingRules {
                pairs: HashSet::new(),
            }
        }
    }

    impl DualRules for RecordingRules {
        fn base_case(&mut self, qi: PointIndex, ri: PointIndex) -> f32 {
            self.pairs.insert((qi, ri));
            0.0
        }
        fn score(&mut self, _q: NodeId, _r: NodeId) -> Option<f32> {
            Some(0.0)
        }
        fn rescore(&mut self, _q: NodeId, _r: NodeId, old: Option<f32>) -> Option<f32> {
            old
        }
        fn score_is_better(a: f32, b: f32) -> bool {
            a < b
        }
    }

    impl SingleRules for RecordingRules {
        fn base_case(&mut self, qi: PointIndex, ri: PointIndex) -> f32 {
            self.pairs.insert((qi, ri));
            0.0
        }
        fn score(&mut self, _q: PointIndex, _r: NodeId) -> Option<f32> {
            Some(0.0)
        }
        fn rescore(&mut self, _q: PointIndex, _r: NodeId, old: Option<f32>) -> Option<f32> {
            old
        }
        fn score_is_better(a: f32, b: f32) -> bool {
            a < b
        }
    }

    /// Always-prune rules, for checking that pruning actually cuts the walk short.
    struct PruningRules {
        base_cases: usize,
    }

    impl DualRules for PruningRules {
        fn base_case(&mut self, _qi: PointIndex, _ri: PointIndex) -> f32 {
            self.base_cases += 1;
            0.0
        }
        fn score(&mut self, _q: NodeId, _r: NodeId) -> Option<f32> {
            None
        }
        fn rescore(&mut self, _q: NodeId, _r: NodeId, _old: Option<f32>) -> Option<f32> {
            None
        }
        fn score_is_better(a: f32, b: f32) -> bool {
            a < b
        }
    }

    #[test]
    fn dual_traversal_without_pruning_covers_all_leaf_pairs() {
        let set = grid_set(4);
        let tree = MetricTreeBuilder::default()
            .set_leaf_cutoff(3)
            .build(&set, &L2 {})
            .unwrap();
        let mut rules = RecordingRules::new();
        let mut traverser = DualTreeTraverser::new(&tree, &tree, &mut rules);
        traverser.traverse();
        assert_eq!(traverser.num_prunes(), 0);

        // every (query point, reference point) combination must have been seen
        for qi in 0..set.len() {
            for ri in 0..set.len() {
                assert!(rules.pairs.contains(&(qi, ri)), "missing pair ({}, {})", qi, ri);
            }
        }
    }

    #[test]
    fn single_traversal_without_pruning_covers_all_points() {
        let set = grid_set(4);
        let tree = MetricTreeBuilder::default()
            .set_leaf_cutoff(3)
            .build(&set, &L2 {})
            .unwrap();
        let mut rules = RecordingRules::new();
        let mut traverser = SingleTreeTraverser::new(&tree, &mut rules);
        traverser.traverse(0);

        for ri in 0..set.len() {
            assert!(rules.pairs.contains(&(0, ri)));
        }
    }

    #[test]
    fn pruned_root_pair_does_no_work() {
        let set = grid_set(4);
        let tree = MetricTreeBuilder::default()
            .set_leaf_cutoff(3)
            .build(&set, &L2 {})
            .unwrap();
        let mut rules = PruningRules { base_cases: 0 };
        let mut traverser = DualTreeTraverser::new(&tree, &tree, &mut rules);
        traverser.traverse();
        assert_eq!(traverser.num_prunes(), 1);
        assert_eq!(rules.base_cases, 0);
    }
}
