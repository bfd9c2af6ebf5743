//! Surface analysis algorithms.
//!
//! - **Laplace-Beltrami**: cotangent weights and lumped mass ([`laplace`])
//! - **Geodesics**: heat method with cached factorizations ([`geodesic`])
//! - **Smoothing**: Gaussian scalar-field smoothing ([`smooth`])
//! - **Neighbourhoods**: chunk extraction, per-vertex patches and polyhedra
//! - **Distortion**: areal and metric distortion between embeddings
//! - **Utilities**: boundary loops, shell volumes, polygon stitching
//!
//! Most operations are methods on [`Surface`](crate::mesh::Surface) defined
//! in these modules; free functions cover the ones that work on raw arrays.

pub mod boundary;
pub mod chunk;
pub mod distortion;
pub mod geodesic;
pub mod laplace;
pub mod patches;
pub mod progress;
pub mod smooth;
pub mod sparse;
pub mod stitch;
pub mod volume;

pub use progress::Progress;
