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

//! Brute-force baselines. These exist so tree results have something indisputable
//! to be checked against; they scan every pair.

use crate::rules::SortPolicy;
use pointset::{Metric, PointIndex, PointSet};
use rayon::prelude::*;

/// Exact k-neighbor search by exhaustive scan, parallel over queries. Passing the
/// same set for both sides excludes each point's own index, matching the tree
/// searches.
pub fn linear_knn<S: SortPolicy, M: Metric + Sync>(
    query_set: &PointSet,
    reference_set: &PointSet,
    metric: &M,
    k: usize,
) -> Vec<Vec<(f32, PointIndex)>> {
    let self_search = std::ptr::eq(query_set, reference_set);
    (0..query_set.len())
        .into_par_iter()
        .map(|qi| {
            let mut row: Vec<(f32, PointIndex)> = (0..reference_set.len())
                .filter(|&ri| !(self_search && ri == qi))
                .map(|ri| (metric.dist(&query_set[qi], &reference_set[ri]), ri))
                .collect();
            row.sort_by(|a, b| {
                if S::is_better(a.0, b.0) {
                    std::cmp::Ordering::Less
                } else if S::is_better(b.0, a.0) {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            });
            row.truncate(k);
            row
        })
        .collect()
}

/// Exact range search by exhaustive scan.
pub fn linear_range<M: Metric + Sync>(
    query_set: &PointSet,
    reference_set: &PointSet,
    metric: &M,
    low: f32,
    high: f32,
) -> Vec<Vec<(f32, PointIndex)>> {
    let self_search = std::ptr::eq(query_set, reference_set);
    (0..query_set.len())
        .into_par_iter()
        .map(|qi| {
            let mut row: Vec<(f32, PointIndex)> = (0..reference_set.len())
                .filter(|&ri| !(self_search && ri == qi))
                .map(|ri| (metric.dist(&query_set[qi], &reference_set[ri]), ri))
                .filter(|&(d, _)| d >= low && d <= high)
                .collect();
            row.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            row
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rules::NearestNeighborSort;
    use crate::tree::tests::grid_set;
    use pointset::L2;

    #[test]
    fn linear_knn_finds_adjacent_grid_point() {
        let set = grid_set(3);
        let results = linear_knn::<NearestNeighborSort, _>(&set, &set, &L2 {}, 1);
        for row in &results {
            assert_eq!(row.len(), 1);
            assert_approx_eq!(row[0].0, 1.0);
        }
    }

    #[test]
    fn linear_knn_self_exclusion() {
        let set = grid_set(3);
        let results = linear_knn::<NearestNeighborSort, _>(&set, &set, &L2 {}, 5);
        for (qi, row) in results.iter().enumerate() {
            assert!(row.iter().all(|&(_, ri)| ri != qi));
        }
    }
}
