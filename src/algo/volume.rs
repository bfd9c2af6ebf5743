//! Volumes of tetrahedra, triangular prisms and surface shells.

use nalgebra::Point3;

use super::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::validate_faces;

/// Unsigned volume of the tetrahedron `p`.
#[inline]
pub fn tetra_volume(p: &[Point3<f64>; 4]) -> f64 {
    let a = p[1] - p[0];
    let b = p[2] - p[0];
    let c = p[3] - p[0];
    a.dot(&b.cross(&c)).abs() / 6.0
}

/// Volume of a triangular prism with bottom `p[0..3]` and top `p[3..6]`.
///
/// The prism is split into the tetrahedra `{0,1,2,4}`, `{0,2,3,4}` and
/// `{2,3,4,5}`. This is exact for prisms whose side quads are planar.
pub fn prism_volume(p: &[Point3<f64>; 6]) -> f64 {
    [[0, 1, 2, 4], [0, 2, 3, 4], [2, 3, 4, 5]]
        .into_iter()
        .map(|t| tetra_volume(&t.map(|i| p[i])))
        .sum()
}

/// Volume of the prism swept by every face between two embeddings.
///
/// `inner` and `outer` are two point sets sharing `faces`, such as the inner
/// and outer boundaries of a cortical sheet. `progress` is ticked once per
/// face.
///
/// # Errors
///
/// - [`MeshError::LengthMismatch`] if the embeddings differ in length
/// - [`MeshError::InvalidVertexIndex`] if a face references a missing vertex
pub fn face_volumes(
    inner: &[Point3<f64>],
    outer: &[Point3<f64>],
    faces: &[[usize; 3]],
    progress: &Progress,
) -> Result<Vec<f64>> {
    if inner.len() != outer.len() {
        return Err(MeshError::length_mismatch(
            "outer embedding",
            inner.len(),
            outer.len(),
        ));
    }
    validate_faces(inner.len(), faces)?;

    let total = faces.len();
    let volumes = faces
        .iter()
        .enumerate()
        .map(|(i, &[a, b, c])| {
            progress.tick(i, total);
            prism_volume(&[inner[a], inner[b], inner[c], outer[a], outer[b], outer[c]])
        })
        .collect();

    Ok(volumes)
}
