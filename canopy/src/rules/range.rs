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

use crate::traverse::{DualRules, SingleRules};
use crate::tree::{NodeId, SpatialTree};
use pointset::{Metric, PointIndex, PointSet};

/// Scoring rules for range search: collect every reference point whose distance to
/// the query falls in `[low, high]`. Unlike the k-neighbor rules there is no
/// tightening during the walk; a node prunes exactly when its distance interval
/// cannot intersect the requested range, and a score that survived once survives
/// forever, so `rescore` is a pass-through.
pub struct RangeRules<'a, M: Metric, T: SpatialTree> {
    query_set: &'a PointSet,
    reference_set: &'a PointSet,
    query_tree: &'a T,
    reference_tree: &'a T,
    metric: &'a M,
    low: f32,
    high: f32,
    results: Vec<Vec<(f32, PointIndex)>>,
    self_search: bool,
    last_pair: Option<(PointIndex, PointIndex)>,
    last_base_case: f32,
}

impl<'a, M: Metric, T: SpatialTree> RangeRules<'a, M, T> {
    pub fn new(
        query_set: &'a PointSet,
        reference_set: &'a PointSet,
        query_tree: &'a T,
        reference_tree: &'a T,
        metric: &'a M,
        low: f32,
        high: f32,
    ) -> RangeRules<'a, M, T> {
        RangeRules {
            query_set,
            reference_set,
            query_tree,
            reference_tree,
            metric,
            low,
            high,
            results: vec![Vec::new(); query_set.len()],
            self_search: std::ptr::eq(query_set, reference_set),
            last_pair: None,
            last_base_case: 0.0,
        }
    }

    /// The interval of distances points under `node` can have from `point`, clipped
    /// at zero.
    fn node_interval(&self, distance_to_center: f32, node: NodeId) -> (f32, f32) {
        let r = self.reference_tree.radius(node);
        ((distance_to_center - r).max(0.0), distance_to_center + r)
    }

    fn interval_score(&self, min_distance: f32, max_distance: f32) -> Option<f32> {
        if max_distance < self.low || min_distance > self.high {
            None
        } else {
            Some(min_distance)
        }
    }

    /// Sorted per-query result lists.
    pub fn unpack(self) -> Vec<Vec<(f32, PointIndex)>> {
        let mut results = self.results;
        for row in results.iter_mut() {
            row.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        }
        results
    }

    fn eval_pair(&mut self, query_index: PointIndex, reference_index: PointIndex) -> f32 {
        if self.self_search && query_index == reference_index {
            return 0.0;
        }
        if self.last_pair == Some((query_index, reference_index)) {
            return self.last_base_case;
        }
        let distance = self
            .metric
            .dist(&self.query_set[query_index], &self.reference_set[reference_index]);
        if distance >= self.low && distance <= self.high {
            self.results[query_index].push((distance, reference_index));
        }
        self.last_pair = Some((query_index, reference_index));
        self.last_base_case = distance;
        distance
    }
}

impl<'a, M: Metric, T: SpatialTree> SingleRules for RangeRules<'a, M, T> {
    fn base_case(&mut self, query_index: PointIndex, reference_index: PointIndex) -> f32 {
        self.eval_pair(query_index, reference_index)
    }

    fn score(&mut self, query_index: PointIndex, reference_node: NodeId) -> Option<f32> {
        let center = self.reference_tree.center_index(reference_node);
        let d = self
            .metric
            .dist(&self.query_set[query_index], &self.reference_set[center]);
        let (min_d, max_d) = self.node_interval(d, reference_node);
        self.interval_score(min_d, max_d)
    }

    fn rescore(
        &mut self,
        _query_index: PointIndex,
        _reference_node: NodeId,
        old_score: Option<f32>,
    ) -> Option<f32> {
        old_score
    }

    fn score_is_better(a: f32, b: f32) -> bool {
        a < b
    }
}

impl<'a, M: Metric, T: SpatialTree> DualRules for RangeRules<'a, M, T> {
    fn base_case(&mut self, query_index: PointIndex, reference_index: PointIndex) -> f32 {
        self.eval_pair(query_index, reference_index)
    }

    fn score(&mut self, query_node: NodeId, reference_node: NodeId) -> Option<f32> {
        let d = self.metric.dist(
            &self.query_set[self.query_tree.center_index(query_node)],
            &self.reference_set[self.reference_tree.center_index(reference_node)],
        );
        let spread = self.query_tree.radius(query_node) + self.reference_tree.radius(reference_node);
        self.interval_score((d - spread).max(0.0), d + spread)
    }

    fn rescore(
        &mut self,
        _query_node: NodeId,
        _reference_node: NodeId,
        old_score: Option<f32>,
    ) -> Option<f32> {
        old_score
    }

    fn score_is_better(a: f32, b: f32) -> bool {
        a < b
    }
}
