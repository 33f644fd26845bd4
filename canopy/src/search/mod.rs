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

//! # The search facade
//! Owns a tree over the reference set and exposes the different ways of querying
//! it. This is the layer that validates inputs; below here indexes are trusted.

use crate::errors::{CanopyError, CanopyResult};
use crate::rules::{FurthestNeighborSort, NearestNeighborSort, NeighborRules, RangeRules, SortPolicy};
use crate::traverse::{DualTreeTraverser, SingleTreeTraverser};
use crate::tree::{MetricTree, MetricTreeBuilder, SpatialTree};
use log::info;
use pointset::{Metric, PointIndex, PointSet};
use rayon::prelude::*;
use std::marker::PhantomData;

/// Queries per parallel work unit in [`NeighborSearch::bulk_search`].
const BULK_CHUNK: usize = 100;

/// k-nearest-neighbor search.
pub type KnnSearch<'a, M> = NeighborSearch<'a, NearestNeighborSort, M>;
/// k-furthest-neighbor search.
pub type KfnSearch<'a, M> = NeighborSearch<'a, FurthestNeighborSort, M>;

/// A reference set indexed for repeated proximity queries. The tree is built once
/// at construction; every search call walks it with fresh scoring state, so a
/// `NeighborSearch` is freely shareable across threads.
pub struct NeighborSearch<'a, S: SortPolicy, M: Metric> {
    reference_set: &'a PointSet,
    metric: &'a M,
    tree: MetricTree,
    policy: PhantomData<S>,
}

impl<'a, S: SortPolicy, M: Metric> NeighborSearch<'a, S, M> {
    /// Indexes `reference_set` with default tree parameters.
    pub fn new(reference_set: &'a PointSet, metric: &'a M) -> CanopyResult<NeighborSearch<'a, S, M>> {
        NeighborSearch::with_builder(reference_set, metric, &MetricTreeBuilder::default())
    }

    /// Indexes `reference_set` with a caller-configured tree builder.
    pub fn with_builder(
        reference_set: &'a PointSet,
        metric: &'a M,
        builder: &MetricTreeBuilder,
    ) -> CanopyResult<NeighborSearch<'a, S, M>> {
        let tree = builder.build(reference_set, metric)?;
        info!(
            "indexed {} reference points, {} tree nodes",
            reference_set.len(),
            tree.node_count()
        );
        Ok(NeighborSearch {
            reference_set,
            metric,
            tree,
            policy: PhantomData,
        })
    }

    /// The reference tree, mostly useful for inspection and tests.
    pub fn tree(&self) -> &MetricTree {
        &self.tree
    }

    fn check_query(&self, query_set: &PointSet, k: usize) -> CanopyResult<()> {
        if k == 0 {
            return Err(CanopyError::ZeroNeighbors);
        }
        if query_set.is_empty() {
            return Err(CanopyError::EmptyPointSet);
        }
        if query_set.dim() != self.reference_set.dim() {
            return Err(CanopyError::MismatchedDimensions {
                query: query_set.dim(),
                reference: self.reference_set.dim(),
            });
        }
        Ok(())
    }

    /// Dual-tree search: builds a tree over the queries and walks both trees
    /// together. The method of choice when the query set is large.
    ///
    /// Returns one sorted `(distance, reference index)` list per query point, at
    /// most k entries each.
    pub fn search(
        &self,
        query_set: &PointSet,
        k: usize,
    ) -> CanopyResult<Vec<Vec<(f32, PointIndex)>>> {
        self.check_query(query_set, k)?;
        let query_tree = MetricTreeBuilder::default().build(query_set, self.metric)?;
        let mut rules = NeighborRules::<S, M, MetricTree>::new(
            query_set,
            self.reference_set,
            &query_tree,
            &self.tree,
            self.metric,
            k,
        );
        let mut traverser = DualTreeTraverser::new(&query_tree, &self.tree, &mut rules);
        traverser.traverse();
        info!("dual-tree search pruned {} node pairs", traverser.num_prunes());
        Ok(rules.unpack())
    }

    /// Dual-tree search of the reference set against itself. Each point's own index
    /// is excluded from its results.
    pub fn search_self(&self, k: usize) -> CanopyResult<Vec<Vec<(f32, PointIndex)>>> {
        self.check_query(self.reference_set, k)?;
        let mut rules = NeighborRules::<S, M, MetricTree>::new(
            self.reference_set,
            self.reference_set,
            &self.tree,
            &self.tree,
            self.metric,
            k,
        );
        let mut traverser = DualTreeTraverser::new(&self.tree, &self.tree, &mut rules);
        traverser.traverse();
        Ok(rules.unpack())
    }

    /// Single-tree search: walks the reference tree once per query point. Usually
    /// the faster choice for a handful of queries.
    pub fn search_single(
        &self,
        query_set: &PointSet,
        k: usize,
    ) -> CanopyResult<Vec<Vec<(f32, PointIndex)>>> {
        self.check_query(query_set, k)?;
        let mut rules = NeighborRules::<S, M, MetricTree>::new(
            query_set,
            self.reference_set,
            &self.tree,
            &self.tree,
            self.metric,
            k,
        );
        for qi in 0..query_set.len() {
            let mut traverser = SingleTreeTraverser::new(&self.tree, &mut rules);
            traverser.traverse(qi);
        }
        Ok(rules.unpack())
    }

    /// Parallel single-tree search. Queries are split into chunks and each chunk
    /// runs on its own copy of the scoring state, so results are identical to
    /// [`NeighborSearch::search_single`] over a detached query set.
    pub fn bulk_search(
        &self,
        query_set: &PointSet,
        k: usize,
    ) -> CanopyResult<Vec<Vec<(f32, PointIndex)>>>
    where
        M: Sync,
    {
        self.check_query(query_set, k)?;
        let dim = query_set.dim();
        let indexes: Vec<PointIndex> = (0..query_set.len()).collect();
        let chunked: CanopyResult<Vec<Vec<Vec<(f32, PointIndex)>>>> = indexes
            .par_chunks(BULK_CHUNK)
            .map(|chunk| {
                let mut data = Vec::with_capacity(chunk.len() * dim);
                for &qi in chunk {
                    data.extend_from_slice(&query_set[qi]);
                }
                let chunk_set = PointSet::new(data, dim)?;
                let mut rules = NeighborRules::<S, M, MetricTree>::new(
                    &chunk_set,
                    self.reference_set,
                    &self.tree,
                    &self.tree,
                    self.metric,
                    k,
                );
                for local in 0..chunk_set.len() {
                    let mut traverser = SingleTreeTraverser::new(&self.tree, &mut rules);
                    traverser.traverse(local);
                }
                Ok(rules.unpack())
            })
            .collect();
        Ok(chunked?.into_iter().flatten().collect())
    }

    /// Dual-tree range search: every reference point whose distance to the query
    /// lies in `[low, high]`, sorted by distance. Pass the reference set itself to
    /// search it against itself with own-index exclusion.
    pub fn range_search(
        &self,
        query_set: &PointSet,
        low: f32,
        high: f32,
    ) -> CanopyResult<Vec<Vec<(f32, PointIndex)>>> {
        if !(low <= high && low >= 0.0) {
            return Err(CanopyError::InvalidRange { low, high });
        }
        self.check_query(query_set, 1)?;
        let query_tree = if std::ptr::eq(query_set, self.reference_set) {
            None
        } else {
            Some(MetricTreeBuilder::default().build(query_set, self.metric)?)
        };
        let query_tree_ref = query_tree.as_ref().unwrap_or(&self.tree);
        let mut rules = RangeRules::new(
            query_set,
            self.reference_set,
            query_tree_ref,
            &self.tree,
            self.metric,
            low,
            high,
        );
        let mut traverser = DualTreeTraverser::new(query_tree_ref, &self.tree, &mut rules);
        traverser.traverse();
        Ok(rules.unpack())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tree::tests::grid_set;
    use pointset::L2;

    #[test]
    fn zero_k_is_rejected() {
        let set = grid_set(3);
        let metric = L2 {};
        let search = KnnSearch::new(&set, &metric).unwrap();
        assert!(matches!(
            search.search(&set, 0),
            Err(CanopyError::ZeroNeighbors)
        ));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let set = grid_set(3);
        let queries = PointSet::new(vec![0.0, 0.0, 0.0], 3).unwrap();
        let metric = L2 {};
        let search = KnnSearch::new(&set, &metric).unwrap();
        assert!(matches!(
            search.search(&queries, 1),
            Err(CanopyError::MismatchedDimensions { query: 3, reference: 2 })
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let set = grid_set(3);
        let metric = L2 {};
        let search = KnnSearch::new(&set, &metric).unwrap();
        assert!(matches!(
            search.range_search(&set, 2.0, 1.0),
            Err(CanopyError::InvalidRange { .. })
        ));
    }

    #[test]
    fn self_search_excludes_own_index() {
        let set = grid_set(4);
        let metric = L2 {};
        let search = KnnSearch::new(&set, &metric).unwrap();
        let results = search.search_self(3).unwrap();
        for (qi, row) in results.iter().enumerate() {
            assert!(row.iter().all(|&(_, ri)| ri != qi), "query {} found itself", qi);
        }
    }

    #[test]
    fn results_are_sorted_and_capped_at_k() {
        let set = grid_set(5);
        let queries = grid_set(2);
        let metric = L2 {};
        let search = KnnSearch::new(&set, &metric).unwrap();
        let results = search.search(&queries, 4).unwrap();
        for row in &results {
            assert!(row.len() <= 4);
            for pair in row.windows(2) {
                assert!(pair[0].0 <= pair[1].0);
            }
        }
    }

    #[test]
    fn k_larger_than_reference_set_truncates() {
        let set = PointSet::new(vec![0.0, 0.0, 1.0, 0.0], 2).unwrap();
        let queries = PointSet::new(vec![0.5, 0.0], 2).unwrap();
        let metric = L2 {};
        let search = KnnSearch::new(&set, &metric).unwrap();
        let results = search.search_single(&queries, 10).unwrap();
        assert_eq!(results[0].len(), 2);
    }
}
