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
//! # Point Set
//! Flat in-memory storage for dense points, and the metric capability the search layer
//! is generic over.

#![allow(dead_code)]
#![warn(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

mod distances;
pub use distances::*;
pub mod errors;

mod metrics;
pub use metrics::*;

use errors::{PointSetError, PointSetResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// To make things more obvious, we type the point index.
pub type PointIndex = usize;

/// A dense point set held in a single contiguous buffer, one row per point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PointSet {
    data: Vec<f32>,
    dim: usize,
}

impl PointSet {
    /// Wraps a flat buffer. Errors if the buffer doesn't divide evenly into points.
    pub fn new(data: Vec<f32>, dim: usize) -> PointSetResult<PointSet> {
        if dim == 0 {
            return Err(PointSetError::ZeroDimension);
        }
        if data.len() % dim != 0 {
            return Err(PointSetError::UnevenBuffer {
                len: data.len(),
                dim,
            });
        }
        Ok(PointSet { data, dim })
    }

    /// The number of points this set covers
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// If this is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The dimension of the underlying data
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Gets a point from this dataset
    pub fn point(&self, pi: PointIndex) -> PointSetResult<&[f32]> {
        if pi >= self.len() {
            return Err(PointSetError::DataAccessError {
                index: pi,
                len: self.len(),
            });
        }
        Ok(&self.data[pi * self.dim..(pi + 1) * self.dim])
    }

    /// Distances from one point to a batch of indexes. This parallelizes if the batch
    /// is large.
    pub fn distances_to_point<M: Metric + Sync>(
        &self,
        metric: &M,
        point: &[f32],
        indexes: &[PointIndex],
    ) -> PointSetResult<Vec<f32>> {
        if indexes.len() > 100 {
            indexes
                .par_iter()
                .map(|i| Ok(metric.dist(point, self.point(*i)?)))
                .collect()
        } else {
            indexes
                .iter()
                .map(|i| Ok(metric.dist(point, self.point(*i)?)))
                .collect()
        }
    }
}

impl Index<PointIndex> for PointSet {
    type Output = [f32];

    fn index(&self, pi: PointIndex) -> &[f32] {
        &self.data[pi * self.dim..(pi + 1) * self.dim]
    }
}
