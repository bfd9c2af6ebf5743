//! Geodesic distance computation on surfaces.
//!
//! Distances are computed with the heat method (Crane et al.): heat is
//! diffused from the sources for a short time, its normalized gradient is
//! integrated back into a distance field by a Poisson solve.
//!
//! Both linear systems are factorized once per time-step multiplier `m` and
//! cached on the [`Surface`](crate::mesh::Surface), so repeated queries cost
//! two triangular solves each, independent of the number of sources.
//!
//! # Example
//!
//! ```
//! use mantle::mesh::{make_unit_cube, Surface};
//!
//! let (points, faces) = make_unit_cube();
//! let surface = Surface::new(points, faces).unwrap();
//!
//! let result = surface.geodesic_distance(&[0], 1.0).unwrap();
//! assert!(result.distance(0) < 1e-9);
//!
//! // The opposite corner is the farthest vertex.
//! let (v, _) = result.farthest_vertex().unwrap();
//! assert_eq!(v, 7);
//! ```
//!
//! # Excluded vertices
//!
//! Vertices whose column in the heat operator sums to exactly zero (vertices
//! that belong to no face, or only to zero-area faces) are dropped from both
//! solves. They report a distance of 0, the same value as a source. Use
//! [`GeodesicResult::is_excluded`] to tell them apart.

mod heat;

pub use heat::GeodesicOptions;
pub(crate) use heat::SolverCache;

/// Result of a heat-method geodesic query.
#[derive(Debug, Clone)]
pub struct GeodesicResult {
    /// Distance from the nearest source to each vertex.
    /// `f64::INFINITY` when no sources were given.
    distances: Vec<f64>,

    /// Vertices left out of the linear solves.
    excluded: Vec<bool>,
}

impl GeodesicResult {
    pub(crate) fn new(distances: Vec<f64>, excluded: Vec<bool>) -> Self {
        debug_assert_eq!(distances.len(), excluded.len());
        Self {
            distances,
            excluded,
        }
    }

    pub(crate) fn unreachable(n: usize) -> Self {
        Self::new(vec![f64::INFINITY; n], vec![false; n])
    }

    /// Get the distance to a vertex.
    #[inline]
    pub fn distance(&self, v: usize) -> f64 {
        self.distances[v]
    }

    /// Get all distances as a slice.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Consume the result, returning the distance field.
    pub fn into_distances(self) -> Vec<f64> {
        self.distances
    }

    /// Whether vertex `v` was excluded from the solve (its distance is a placeholder 0).
    #[inline]
    pub fn is_excluded(&self, v: usize) -> bool {
        self.excluded[v]
    }

    /// Number of excluded vertices.
    pub fn excluded_count(&self) -> usize {
        self.excluded.iter().filter(|&&e| e).count()
    }

    /// Get the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Find the vertex with the maximum finite distance.
    ///
    /// Returns `None` if no vertex has a finite distance.
    pub fn farthest_vertex(&self) -> Option<(usize, f64)> {
        self.distances
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, d)| d.is_finite())
            .fold(None, |best, (i, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            })
    }
}
