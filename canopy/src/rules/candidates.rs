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

use super::SortPolicy;
use pointset::PointIndex;
use std::marker::PhantomData;

/// Marks a candidate slot that has never been filled.
const UNFILLED: PointIndex = PointIndex::MAX;

/// The best-results-so-far structure, one fixed-capacity row of k slots per query
/// point, kept sorted best-first under the policy order. Rows are pre-filled with
/// the worst sentinel so the k'th slot always reads as "the distance to beat",
/// whether or not the row is full yet.
#[derive(Clone, Debug)]
pub struct CandidateLists<S: SortPolicy> {
    k: usize,
    dists: Vec<f32>,
    indexes: Vec<PointIndex>,
    policy: PhantomData<S>,
}

impl<S: SortPolicy> CandidateLists<S> {
    /// Allocates rows for `n_queries` query points, k slots each.
    pub fn new(n_queries: usize, k: usize) -> CandidateLists<S> {
        CandidateLists {
            k,
            dists: vec![S::worst(); n_queries * k],
            indexes: vec![UNFILLED; n_queries * k],
            policy: PhantomData,
        }
    }

    /// The requested neighbor count.
    pub fn k(&self) -> usize {
        self.k
    }

    /// The distance row for one query point.
    pub fn row(&self, query_index: PointIndex) -> &[f32] {
        &self.dists[query_index * self.k..(query_index + 1) * self.k]
    }

    /// The neighbor-index row for one query point.
    pub fn row_indexes(&self, query_index: PointIndex) -> &[PointIndex] {
        &self.indexes[query_index * self.k..(query_index + 1) * self.k]
    }

    /// The worst retained distance for a query: the k'th candidate, or the worst
    /// sentinel while the row is not yet full.
    pub fn kth(&self, query_index: PointIndex) -> f32 {
        self.dists[query_index * self.k + self.k - 1]
    }

    /// Inserts a candidate at `pos`, shifting everything from `pos` one slot toward
    /// the tail and dropping the old k'th entry. A reference index already present
    /// in the row is rejected; a node's center index recurs throughout the tree, so
    /// the same pair can reach insertion more than once per traversal.
    pub fn insert(
        &mut self,
        query_index: PointIndex,
        pos: usize,
        neighbor: PointIndex,
        distance: f32,
    ) {
        let start = query_index * self.k;
        if self.indexes[start..start + self.k].contains(&neighbor) {
            return;
        }
        if pos < self.k - 1 {
            self.dists[start..start + self.k].copy_within(pos..self.k - 1, pos + 1);
            self.indexes[start..start + self.k].copy_within(pos..self.k - 1, pos + 1);
        }
        self.dists[start + pos] = distance;
        self.indexes[start + pos] = neighbor;
    }

    /// Unpacks into one sorted `(distance, index)` list per query, dropping any
    /// slots that never filled.
    pub fn unpack(self) -> Vec<Vec<(f32, PointIndex)>> {
        let n_queries = self.indexes.len() / self.k.max(1);
        (0..n_queries)
            .map(|q| {
                self.row(q)
                    .iter()
                    .zip(self.row_indexes(q))
                    .filter(|(_, &i)| i != UNFILLED)
                    .map(|(&d, &i)| (d, i))
                    .collect()
            })
            .collect()
    }
}
