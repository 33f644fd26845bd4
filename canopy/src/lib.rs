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

#![allow(dead_code)]
#![warn(missing_docs)]

//! # Canopy
//! Exact proximity search over metric trees via branch-and-bound traversal.
//!
//! The crate splits into four layers. The `tree` module holds an arena-allocated
//! metric tree and the small capability trait the rest of the crate reads node
//! geometry through. The `rules` module is the pruning/scoring engine: given a pair
//! of nodes (or a query point and a node) it decides whether the whole pair can be
//! skipped, and otherwise keeps the per-query candidate lists and per-node bounds
//! current. The `traverse` module drives the recursion and knows nothing about
//! bounds. The `search` facade glues them together and validates inputs.
//!
//! Search direction is a strategy: `NearestNeighborSort` and `FurthestNeighborSort`
//! instantiate the identical engine with opposite orderings, so no component below
//! the policy ever hardcodes "smaller is better".

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

pub use pointset::{Metric, PointIndex, PointSet, L1, L2};

pub mod errors;
pub use errors::CanopyResult;

pub mod rules;
pub mod traverse;
pub mod tree;

mod search;
pub use search::*;

pub mod utils;
