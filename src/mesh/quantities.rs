//! Per-face and per-vertex geometric quantities.
//!
//! These are plain functions over point and face arrays. [`Surface`] memoizes
//! their results; the functions themselves hold no state.
//!
//! [`Surface`]: super::Surface

use nalgebra::{Point3, Vector3};

use super::Incidence;

/// Cotangent of the angle between two edge vectors.
///
/// Computed as `dot(a, b) / |cross(a, b)|`. Returns 0 when the vectors are
/// parallel to machine precision, relative to their lengths, instead of an
/// infinite or NaN weight. The result does not depend on the mesh scale.
///
/// ```
/// use mantle::mesh::cotangent;
/// use nalgebra::Vector3;
///
/// let c = cotangent(&Vector3::new(1.0, 0.0, 0.0), &Vector3::new(1.0, 1.0, 0.0));
/// assert!((c - 1.0).abs() < 1e-12); // cot(45 degrees)
/// ```
pub fn cotangent(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let cross_len = a.cross(b).norm();
    if cross_len <= f64::EPSILON * a.norm() * b.norm() {
        0.0
    } else {
        a.dot(b) / cross_len
    }
}

/// Conventional area of a triangle, `0.5 * |(p1 - p0) x (p2 - p0)|`.
///
/// Note that [`Surface::face_areas`](super::Surface::face_areas) reports twice
/// this value.
pub fn triangle_area(tri: &[Point3<f64>; 3]) -> f64 {
    0.5 * face_normal(tri).norm()
}

/// Rotate each triangle so its smallest vertex index comes first.
///
/// Winding is preserved, so `[5, 2, 9]` becomes `[2, 9, 5]`.
pub fn canonical_faces(faces: &[[usize; 3]]) -> Vec<[usize; 3]> {
    faces
        .iter()
        .map(|face| {
            let start = (0..3).min_by_key(|&k| face[k]).unwrap_or(0);
            [face[start], face[(start + 1) % 3], face[(start + 2) % 3]]
        })
        .collect()
}

/// Unnormalized face normal `(p1 - p0) x (p2 - p0)`.
#[inline]
pub(crate) fn face_normal(tri: &[Point3<f64>; 3]) -> Vector3<f64> {
    (tri[1] - tri[0]).cross(&(tri[2] - tri[0]))
}

/// Midpoint of two points, computed the same way regardless of argument order.
#[inline]
pub(crate) fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::from((a.coords + b.coords) * 0.5)
}

/// Positions of the three corners of a face.
#[inline]
pub(crate) fn corner_positions(points: &[Point3<f64>], face: &[usize; 3]) -> [Point3<f64>; 3] {
    [points[face[0]], points[face[1]], points[face[2]]]
}

pub(super) fn face_positions(points: &[Point3<f64>], faces: &[[usize; 3]]) -> Vec<[Point3<f64>; 3]> {
    faces.iter().map(|f| corner_positions(points, f)).collect()
}

pub(super) fn face_normals(positions: &[[Point3<f64>; 3]]) -> Vec<Vector3<f64>> {
    positions.iter().map(face_normal).collect()
}

pub(super) fn face_areas(normals: &[Vector3<f64>]) -> Vec<f64> {
    normals.iter().map(|n| n.norm()).collect()
}

/// Incidence-weighted average of face normals; isolated vertices get zero.
pub(super) fn vertex_normals(incidence: &Incidence, normals: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    (0..incidence.num_vertices())
        .map(|v| {
            let degree = incidence.degree(v);
            if degree == 0.0 {
                return Vector3::zeros();
            }
            let sum: Vector3<f64> = incidence.weighted_faces(v).map(|(f, w)| normals[f] * w).sum();
            sum / degree
        })
        .collect()
}

/// Cotangent of the angle at each corner of each face.
///
/// Entry `k` of a face belongs to the angle at corner `k`, which is the angle
/// opposite the edge between the other two corners.
pub(super) fn cotangent_weights(positions: &[[Point3<f64>; 3]]) -> Vec<[f64; 3]> {
    positions
        .iter()
        .map(|[p0, p1, p2]| {
            [
                cotangent(&(p1 - p0), &(p2 - p0)),
                cotangent(&(p2 - p1), &(p0 - p1)),
                cotangent(&(p0 - p2), &(p1 - p2)),
            ]
        })
        .collect()
}
