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

//! End-to-end checks of the tree searches against brute force on random data.

use canopy::rules::{FurthestNeighborSort, NearestNeighborSort, NeighborRules};
use canopy::traverse::DualTreeTraverser;
use canopy::tree::{MetricTree, MetricTreeBuilder, NodeId, SpatialTree};
use canopy::utils::{linear_knn, linear_range};
use canopy::{KfnSearch, KnnSearch, PointIndex, PointSet, L2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

fn random_set(n: usize, dim: usize, seed: u64) -> PointSet {
    let mut rng = SmallRng::seed_from_u64(seed);
    let normal = Normal::new(0.0f32, 1.0f32).unwrap();
    let data: Vec<f32> = (0..n * dim).map(|_| rng.sample(normal)).collect();
    PointSet::new(data, dim).unwrap()
}

fn assert_rows_match(
    found: &[Vec<(f32, PointIndex)>],
    expected: &[Vec<(f32, PointIndex)>],
    label: &str,
) {
    assert_eq!(found.len(), expected.len());
    for (qi, (f, e)) in found.iter().zip(expected).enumerate() {
        assert_eq!(f.len(), e.len(), "{}: row length for query {}", label, qi);
        for (slot, ((fd, fi), (ed, ei))) in f.iter().zip(e).enumerate() {
            // indexes can legitimately differ on exact distance ties; distances
            // cannot
            assert!(
                (fd - ed).abs() <= 1e-4 * ed.max(1.0),
                "{}: query {} slot {}: got ({}, {}), expected ({}, {})",
                label,
                qi,
                slot,
                fd,
                fi,
                ed,
                ei
            );
        }
    }
}

#[test]
fn dual_nearest_matches_brute_force() {
    let reference = random_set(50, 2, 7);
    let queries = random_set(20, 2, 11);
    let metric = L2 {};
    let search = KnnSearch::new(&reference, &metric).unwrap();

    let found = search.search(&queries, 3).unwrap();
    let expected = linear_knn::<NearestNeighborSort, _>(&queries, &reference, &metric, 3);
    assert_rows_match(&found, &expected, "dual nn");
}

#[test]
fn dual_furthest_matches_brute_force() {
    let reference = random_set(50, 2, 7);
    let queries = random_set(20, 2, 11);
    let metric = L2 {};
    let search = KfnSearch::new(&reference, &metric).unwrap();

    let found = search.search(&queries, 3).unwrap();
    let expected = linear_knn::<FurthestNeighborSort, _>(&queries, &reference, &metric, 3);
    assert_rows_match(&found, &expected, "dual fn");
}

#[test]
fn self_search_matches_brute_force_and_excludes_self() {
    let reference = random_set(60, 3, 13);
    let metric = L2 {};
    let search = KnnSearch::new(&reference, &metric).unwrap();

    let found = search.search_self(4).unwrap();
    let expected = linear_knn::<NearestNeighborSort, _>(&reference, &reference, &metric, 4);
    assert_rows_match(&found, &expected, "self search");
    for (qi, row) in found.iter().enumerate() {
        assert!(row.iter().all(|&(_, ri)| ri != qi));
    }
}

#[test]
fn single_tree_matches_dual_tree() {
    let reference = random_set(40, 2, 17);
    let queries = random_set(15, 2, 19);
    let metric = L2 {};
    let search = KnnSearch::new(&reference, &metric).unwrap();

    let dual = search.search(&queries, 5).unwrap();
    let single = search.search_single(&queries, 5).unwrap();
    assert_rows_match(&single, &dual, "single vs dual");
}

#[test]
fn bulk_search_matches_single_tree() {
    let reference = random_set(80, 2, 23);
    let queries = random_set(250, 2, 29);
    let metric = L2 {};
    let search = KnnSearch::new(&reference, &metric).unwrap();

    let single = search.search_single(&queries, 3).unwrap();
    let bulk = search.bulk_search(&queries, 3).unwrap();
    assert_rows_match(&bulk, &single, "bulk vs single");
}

#[test]
fn results_are_sorted_best_first() {
    let reference = random_set(50, 2, 31);
    let queries = random_set(10, 2, 37);
    let metric = L2 {};

    let nn = KnnSearch::new(&reference, &metric).unwrap();
    for row in nn.search(&queries, 5).unwrap() {
        assert!(row.len() <= 5);
        for pair in row.windows(2) {
            assert!(pair[0].0 <= pair[1].0);
        }
    }

    let fnn = KfnSearch::new(&reference, &metric).unwrap();
    for row in fnn.search(&queries, 5).unwrap() {
        for pair in row.windows(2) {
            assert!(pair[0].0 >= pair[1].0);
        }
    }
}

#[test]
fn k_beyond_set_size_returns_everything() {
    let reference = random_set(6, 2, 41);
    let queries = random_set(3, 2, 43);
    let metric = L2 {};
    let search = KnnSearch::new(&reference, &metric).unwrap();

    let found = search.search(&queries, 20).unwrap();
    for row in &found {
        assert_eq!(row.len(), 6);
    }
}

#[test]
fn range_search_matches_brute_force() {
    let reference = random_set(70, 2, 47);
    let queries = random_set(25, 2, 53);
    let metric = L2 {};
    let search = KnnSearch::new(&reference, &metric).unwrap();

    let found = search.range_search(&queries, 0.5, 2.0).unwrap();
    let expected = linear_range(&queries, &reference, &metric, 0.5, 2.0);
    assert_eq!(found.len(), expected.len());
    for (f, e) in found.iter().zip(&expected) {
        assert_eq!(f.len(), e.len());
        for ((fd, fi), (ed, ei)) in f.iter().zip(e) {
            assert!((fd - ed).abs() < 1e-5);
            assert_eq!(fi, ei);
        }
    }
}

/// `MetricTree` with the centroid shortcuts turned off, so scoring must fall back
/// to the plain metric path. Results have to be identical either way.
struct OpaqueTree(MetricTree);

impl SpatialTree for OpaqueTree {
    const REP_IS_CENTROID: bool = false;
    const SELF_CHILDREN: bool = false;

    fn root(&self) -> NodeId {
        self.0.root()
    }
    fn node_count(&self) -> usize {
        self.0.node_count()
    }
    fn children(&self, node: NodeId) -> &[NodeId] {
        self.0.children(node)
    }
    fn points(&self, node: NodeId) -> &[PointIndex] {
        self.0.points(node)
    }
    fn center_index(&self, node: NodeId) -> PointIndex {
        self.0.center_index(node)
    }
    fn radius(&self, node: NodeId) -> f32 {
        self.0.radius(node)
    }
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.0.parent(node)
    }
}

#[test]
fn non_centroid_scoring_path_agrees() {
    let reference = random_set(45, 2, 59);
    let queries = random_set(18, 2, 61);
    let metric = L2 {};

    let reference_tree = OpaqueTree(
        MetricTreeBuilder::default()
            .set_leaf_cutoff(4)
            .build(&reference, &metric)
            .unwrap(),
    );
    let query_tree = OpaqueTree(
        MetricTreeBuilder::default()
            .set_leaf_cutoff(4)
            .build(&queries, &metric)
            .unwrap(),
    );

    let mut rules = NeighborRules::<NearestNeighborSort, _, _>::new(
        &queries,
        &reference,
        &query_tree,
        &reference_tree,
        &metric,
        3,
    );
    {
        let mut traverser = DualTreeTraverser::new(&query_tree, &reference_tree, &mut rules);
        traverser.traverse();
    }
    let found = rules.unpack();
    let expected = linear_knn::<NearestNeighborSort, _>(&queries, &reference, &metric, 3);
    assert_rows_match(&found, &expected, "opaque tree");
}
