//! # Mantle
//!
//! Discrete differential geometry on indexed triangle surfaces.
//!
//! Mantle wraps a point array and a face array in a [`Surface`](mesh::Surface)
//! that lazily derives, and caches, the quantities most surface analyses
//! need: vertex-face incidence, face and vertex normals, cotangent weights
//! and the Laplace-Beltrami operator. On top of these it provides
//! heat-method geodesic distances with per-parameter cached factorizations,
//! scalar-field smoothing, neighbourhood extraction, and distortion metrics
//! between two embeddings of the same topology.
//!
//! ## Quick Start
//!
//! ```
//! use mantle::prelude::*;
//!
//! let (points, faces) = make_unit_cube();
//! let surface = Surface::new(points, faces).unwrap();
//!
//! assert_eq!(surface.num_vertices(), 8);
//! assert!((surface.surface_area() - 6.0).abs() < 1e-12);
//!
//! // Geodesic distance from one corner
//! let geo = surface.geodesic_distance(&[0], 1.0).unwrap();
//! assert!(geo.distances().iter().all(|&d| d >= 0.0));
//!
//! // Smooth a scalar field over two-ring neighbourhoods
//! let field: Vec<f64> = surface.points().iter().map(|p| p.z).collect();
//! let smoothed = surface.smooth(&field, &SmoothOptions::default()).unwrap();
//! assert_eq!(smoothed.len(), 8);
//! ```
//!
//! ## Derived quantities
//!
//! Every accessor on [`Surface`](mesh::Surface) computes its value on first
//! use and returns the cached value afterwards. A surface is immutable:
//! to change points or faces, build a new one.
//!
//! ```
//! use mantle::prelude::*;
//!
//! # let (points, faces) = make_unit_cube();
//! let surface = Surface::new(points, faces).unwrap();
//! let lb = surface.laplace_operator();
//!
//! // The stiffness matrix annihilates constants
//! let stiffness = lb.stiffness();
//! for row in stiffness.row_iter() {
//!     let sum: f64 = row.values().iter().sum();
//!     assert!(sum.abs() < 1e-12);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use mantle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::boundary::{boundary_edges, trace_loops};
    pub use crate::algo::chunk::Chunk;
    pub use crate::algo::distortion::Distortion;
    pub use crate::algo::geodesic::{GeodesicOptions, GeodesicResult};
    pub use crate::algo::laplace::LaplaceBeltrami;
    pub use crate::algo::patches::{Patch, Polyhedron};
    pub use crate::algo::smooth::SmoothOptions;
    pub use crate::algo::volume::{face_volumes, prism_volume, tetra_volume};
    pub use crate::algo::Progress;
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{make_cube, make_unit_cube, Surface};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
