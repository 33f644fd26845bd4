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
//! Dense distance kernels shared by the metric implementations.

/// Squared euclidean distance between two dense vectors.
#[inline]
pub fn sq_l2_dense_f32(x: &[f32], y: &[f32]) -> f32 {
    x.iter()
        .zip(y)
        .map(|(xi, yi)| (xi - yi) * (xi - yi))
        .fold(0.0, |acc, d| acc + d)
}

/// Squared euclidean norm of a dense vector.
#[inline]
pub fn sq_l2_norm_f32(x: &[f32]) -> f32 {
    x.iter().map(|xi| xi * xi).fold(0.0, |acc, d| acc + d)
}

/// Taxicab distance between two dense vectors.
#[inline]
pub fn l1_dense_f32(x: &[f32], y: &[f32]) -> f32 {
    x.iter()
        .zip(y)
        .map(|(xi, yi)| (xi - yi).abs())
        .fold(0.0, |acc, d| acc + d)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn l2_kernel() {
        assert_approx_eq!(sq_l2_dense_f32(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_approx_eq!(sq_l2_norm_f32(&[3.0, 4.0]), 25.0);
    }

    #[test]
    fn l1_kernel() {
        assert_approx_eq!(l1_dense_f32(&[0.0, 0.0], &[3.0, -4.0]), 7.0);
    }
}
