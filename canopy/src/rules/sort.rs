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

//! The search-direction strategy. Nearest- and furthest-neighbor search are the
//! same engine instantiated with opposite policies; every comparison in the engine
//! routes through here.

/// Defines what "better" means for a search. Implementors are zero-sized; all
/// methods are associated functions so the engine monomorphizes over the policy
/// with no dispatch cost.
pub trait SortPolicy: Copy + Default + Send + Sync + 'static {
    /// The most favorable value a distance can take.
    fn best() -> f32;
    /// The least favorable value, used to pre-fill candidate slots and bounds.
    fn worst() -> f32;
    /// Strict order test: is `value` strictly better than `reference`?
    fn is_better(value: f32, reference: f32) -> bool;
    /// Extends a known distance by a non-negative adjustment in the favorable
    /// direction, producing an optimistic bound.
    fn combine_best(base: f32, adjust: f32) -> f32;
    /// The pessimistic counterpart.
    fn combine_worst(base: f32, adjust: f32) -> f32;

    /// The better of two values.
    fn best_of(a: f32, b: f32) -> f32 {
        if Self::is_better(a, b) {
            a
        } else {
            b
        }
    }

    /// The worse of two values.
    fn worst_of(a: f32, b: f32) -> f32 {
        if Self::is_better(a, b) {
            b
        } else {
            a
        }
    }

    /// Where in a sorted candidate row a new distance belongs, or `None` if it is
    /// not strictly better than the worst retained entry.
    fn sort_distance(current: &[f32], new_distance: f32) -> Option<usize> {
        let last = *current.last()?;
        if !Self::is_better(new_distance, last) {
            return None;
        }
        Some(
            current
                .iter()
                .position(|&d| Self::is_better(new_distance, d))
                .unwrap_or(current.len() - 1),
        )
    }
}

/// Smaller is better: k-nearest-neighbor search.
#[derive(Copy, Clone, Debug, Default)]
pub struct NearestNeighborSort;

impl SortPolicy for NearestNeighborSort {
    fn best() -> f32 {
        0.0
    }

    fn worst() -> f32 {
        f32::INFINITY
    }

    fn is_better(value: f32, reference: f32) -> bool {
        value < reference
    }

    fn combine_best(base: f32, adjust: f32) -> f32 {
        (base - adjust).max(0.0)
    }

    fn combine_worst(base: f32, adjust: f32) -> f32 {
        base + adjust
    }
}

/// Larger is better: k-furthest-neighbor search.
#[derive(Copy, Clone, Debug, Default)]
pub struct FurthestNeighborSort;

impl SortPolicy for FurthestNeighborSort {
    fn best() -> f32 {
        f32::INFINITY
    }

    fn worst() -> f32 {
        0.0
    }

    fn is_better(value: f32, reference: f32) -> bool {
        value > reference
    }

    fn combine_best(base: f32, adjust: f32) -> f32 {
        base + adjust
    }

    fn combine_worst(base: f32, adjust: f32) -> f32 {
        (base - adjust).max(0.0)
    }
}
