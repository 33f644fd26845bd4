use crate::distances::*;

/// The distance capability consumed by the search layer. Implementations may carry
/// state (for example an instrumented call counter), so evaluation takes `&self`.
pub trait Metric {
    /// The distance between two points.
    fn dist(&self, x: &[f32], y: &[f32]) -> f32;
}

/// Standard euclidean distance
#[derive(Debug, Default, Clone, Copy)]
pub struct L2 {}

impl Metric for L2 {
    fn dist(&self, x: &[f32], y: &[f32]) -> f32 {
        sq_l2_dense_f32(x, y).sqrt()
    }
}

/// Taxicab distance
#[derive(Debug, Default, Clone, Copy)]
pub struct L1 {}

impl Metric for L1 {
    fn dist(&self, x: &[f32], y: &[f32]) -> f32 {
        l1_dense_f32(x, y)
    }
}
