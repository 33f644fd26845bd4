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

//! The errors the search setup layer can produce. The scoring engine itself is
//! infallible over validated inputs; everything here is caught before traversal
//! starts.

use pointset::errors::PointSetError;
use std::error::Error;
use std::fmt;

/// Helper type for a call that could go wrong.
pub type CanopyResult<T> = Result<T, CanopyError>;

/// Error type for canopy. Mostly a wrapper around `PointSetError`, as data access is
/// where most errors happen.
#[derive(Debug)]
pub enum CanopyError {
    /// Floated up from the point set layer
    PointSetError(PointSetError),
    /// The query set and reference set disagree on dimension
    MismatchedDimensions {
        /// Query set dimension
        query: usize,
        /// Reference set dimension
        reference: usize,
    },
    /// Asked for zero neighbors
    ZeroNeighbors,
    /// Tried to build or query against an empty point set
    EmptyPointSet,
    /// A range query with an empty interval
    InvalidRange {
        /// Lower end of the requested range
        low: f32,
        /// Upper end of the requested range
        high: f32,
    },
}

impl fmt::Display for CanopyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CanopyError::PointSetError(ref e) => write!(f, "{}", e),
            CanopyError::MismatchedDimensions { query, reference } => write!(
                f,
                "query dimension {} does not match reference dimension {}",
                query, reference
            ),
            CanopyError::ZeroNeighbors => write!(f, "a neighbor search needs k of at least 1"),
            CanopyError::EmptyPointSet => write!(f, "cannot search an empty point set"),
            CanopyError::InvalidRange { low, high } => {
                write!(f, "range [{}, {}] is empty", low, high)
            }
        }
    }
}

impl Error for CanopyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CanopyError::PointSetError(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<PointSetError> for CanopyError {
    fn from(err: PointSetError) -> Self {
        CanopyError::PointSetError(err)
    }
}
