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
//! The errors that can occur when a point set is assembled or accessed.

use std::error::Error;
use std::fmt;

///
pub type PointSetResult<T> = Result<T, PointSetError>;

/// Error type for the point set
#[derive(Debug)]
pub enum PointSetError {
    /// Unable to retrieve some data point (given by index) from a set of the given length
    DataAccessError {
        /// Index of access error
        index: usize,
        /// Length of the set being accessed
        len: usize,
    },
    /// The flat buffer does not divide evenly into points of the stated dimension
    UnevenBuffer {
        /// Length of the buffer
        len: usize,
        /// Stated dimension
        dim: usize,
    },
    /// A point set cannot have zero-dimensional points
    ZeroDimension,
}

impl fmt::Display for PointSetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PointSetError::DataAccessError { index, len } => {
                write!(f, "point index {} is out of bounds for {} points", index, len)
            }
            PointSetError::UnevenBuffer { len, dim } => write!(
                f,
                "buffer of length {} does not divide into points of dimension {}",
                len, dim
            ),
            PointSetError::ZeroDimension => write!(f, "points must have at least one dimension"),
        }
    }
}

impl Error for PointSetError {}
