//! Core mesh data structures.
//!
//! This module provides the indexed triangle surface and the structures
//! derived from its topology.
//!
//! # Overview
//!
//! The primary type is [`Surface`], an immutable list of points and triangle
//! index triples. Everything else is derived from those two arrays on first
//! use and memoized for the lifetime of the surface:
//!
//! - [`Incidence`] - sparse vertex x face incidence matrix
//! - [`VertexAdjacency`] - undirected 1-ring graph built from face edges
//! - per-face positions, normals, areas and cotangent weights
//! - per-vertex normals
//!
//! # Construction
//!
//! ```
//! use mantle::mesh::Surface;
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let surface = Surface::new(points, faces).unwrap();
//! assert_eq!(surface.connected(0), &[0]);
//! ```

mod adjacency;
mod incidence;
mod primitives;
mod quantities;
mod surface;

pub use adjacency::VertexAdjacency;
pub use incidence::Incidence;
pub use primitives::{make_cube, make_unit_cube};
pub use quantities::{canonical_faces, cotangent, triangle_area};
pub use surface::Surface;

pub(crate) use quantities::{corner_positions, face_normal, midpoint};
pub(crate) use surface::validate_faces;
