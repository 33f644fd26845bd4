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

//! # The pruning/scoring engine
//! Everything a traversal needs to decide whether a pair of subtrees can be skipped
//! without risking a wrong answer, and to record results when it cannot. A score is
//! `Option<f32>`: `Some(bound)` is a traversal priority, `None` means prune. `None`
//! compares as worse than any live score by construction and is absorbing under
//! rescoring, which makes prune monotonicity structural rather than a convention.

mod candidates;
mod neighbor;
mod range;
mod sort;

pub use candidates::CandidateLists;
pub use neighbor::NeighborRules;
pub use range::RangeRules;
pub use sort::{FurthestNeighborSort, NearestNeighborSort, SortPolicy};

use crate::tree::NodeId;

/// The per-node scratch record the engine keeps in a side table, one per tree side,
/// indexed by `NodeId`. Created fresh for every search invocation.
///
/// `first_bound` and `second_bound` are the two halves of the aggregate pruning
/// bound a query node carries (see `NeighborRules::calculate_bound`); `bound` is
/// always the better of the two. `last_distance` memoizes the most recent
/// center-to-center base case this node took part in, and `last_distance_node` is
/// the arena id of the node on the other side of that evaluation. The id is a cache
/// hint only; it is compared against, never traversed through.
#[derive(Clone, Copy, Debug)]
pub struct NodeStat {
    /// Worst candidate distance any descendant of the node still holds.
    pub first_bound: f32,
    /// Best descendant candidate distance, worsened by the node's point spread.
    pub second_bound: f32,
    /// The better of the two, the bound scores are compared against.
    pub bound: f32,
    /// The last center-to-center distance computed against this node.
    pub last_distance: f32,
    /// The node on the other side of that computation.
    pub last_distance_node: Option<NodeId>,
}

impl NodeStat {
    pub(crate) fn new<S: SortPolicy>() -> NodeStat {
        NodeStat {
            first_bound: S::worst(),
            second_bound: S::worst(),
            bound: S::worst(),
            last_distance: 0.0,
            last_distance_node: None,
        }
    }
}
