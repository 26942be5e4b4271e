//! Vector index abstraction.
//!
//! Positions are assigned in insertion order starting at zero, so an index
//! built from an ordered article sequence stays aligned with it.

use alertsbot_core::AppResult;

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Squared L2 distance to the query
    pub distance: f32,

    /// Position of the stored vector; `None` is the "no match" sentinel some
    /// backends use to pad results to `k`.
    pub position: Option<usize>,
}

impl Neighbor {
    pub fn new(distance: f32, position: usize) -> Self {
        Self {
            distance,
            position: Some(position),
        }
    }

    /// The padding sentinel.
    pub fn missing() -> Self {
        Self {
            distance: f32::INFINITY,
            position: None,
        }
    }
}

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Dimension every stored and query vector must have.
    fn dimension(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors in order.
    fn add(&mut self, vectors: &[Vec<f32>]) -> AppResult<()>;

    /// Up to `k` nearest neighbors, ascending by distance.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>>;
}
