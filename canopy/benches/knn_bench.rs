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

use canopy::rules::NearestNeighborSort;
use canopy::utils::linear_knn;
use canopy::{KnnSearch, PointSet, L2};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

fn random_set(n: usize, dim: usize, seed: u64) -> PointSet {
    let mut rng = SmallRng::seed_from_u64(seed);
    let normal = Normal::new(0.0f32, 1.0f32).unwrap();
    let data: Vec<f32> = (0..n * dim).map(|_| rng.sample(normal)).collect();
    PointSet::new(data, dim).unwrap()
}

fn knn_benchmarks(c: &mut Criterion) {
    let reference = random_set(2000, 8, 1);
    let queries = random_set(200, 8, 2);
    let metric = L2 {};
    let search = KnnSearch::new(&reference, &metric).unwrap();

    c.bench_function("dual_tree_knn_2000x200_k5", |b| {
        b.iter(|| search.search(&queries, 5).unwrap())
    });

    c.bench_function("single_tree_knn_2000x200_k5", |b| {
        b.iter(|| search.search_single(&queries, 5).unwrap())
    });

    c.bench_function("bulk_knn_2000x200_k5", |b| {
        b.iter(|| search.bulk_search(&queries, 5).unwrap())
    });

    c.bench_function("linear_knn_2000x200_k5", |b| {
        b.iter(|| linear_knn::<NearestNeighborSort, _>(&queries, &reference, &metric, 5))
    });
}

criterion_group!(benches, knn_benchmarks);
criterion_main!(benches);
