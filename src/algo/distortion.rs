//! Distortion between two embeddings of one surface.
//!
//! Typical use is comparing a flattened surface against the folded original
//! it was cut from: both share the same faces, only the points differ.
//!
//! # Example
//!
//! ```
//! use mantle::algo::distortion::Distortion;
//! use mantle::mesh::make_unit_cube;
//! use nalgebra::Point3;
//!
//! let (points, faces) = make_unit_cube();
//! let scaled: Vec<_> = points.iter().map(|p| Point3::from(p.coords * 2.0)).collect();
//!
//! let distortion = Distortion::new(scaled, points, faces).unwrap();
//! // Every face grew by a factor of four.
//! assert!(distortion.areal().iter().all(|&d| (d - 2.0).abs() < 1e-12));
//! ```

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{corner_positions, face_normal, Incidence, VertexAdjacency};

/// Areal and metric distortion of a `flat` embedding relative to a
/// `reference` embedding with the same faces.
#[derive(Debug, Clone)]
pub struct Distortion {
    flat: Vec<Point3<f64>>,
    reference: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
}

impl Distortion {
    /// Pair two embeddings of the same topology.
    ///
    /// # Errors
    ///
    /// - [`MeshError::LengthMismatch`] if the embeddings differ in length
    /// - [`MeshError::InvalidVertexIndex`] if a face references a missing vertex
    pub fn new(
        flat: Vec<Point3<f64>>,
        reference: Vec<Point3<f64>>,
        faces: Vec<[usize; 3]>,
    ) -> Result<Self> {
        if flat.len() != reference.len() {
            return Err(MeshError::length_mismatch(
                "flat embedding",
                reference.len(),
                flat.len(),
            ));
        }
        crate::mesh::validate_faces(reference.len(), &faces)?;

        Ok(Self {
            flat,
            reference,
            faces,
        })
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// Per-vertex areal distortion.
    ///
    /// Each face contributes `log2(flat area / reference area)`, and each
    /// vertex takes the mean over its incident faces. Infinite results are
    /// clamped to `±f64::MAX` and NaN becomes 0. A vertex whose value ends up
    /// exactly 0 (including vertices without faces) reports 1.
    pub fn areal(&self) -> Vec<f64> {
        let per_face: Vec<f64> = self
            .faces
            .iter()
            .map(|face| {
                let flat = face_normal(&corner_positions(&self.flat, face)).norm();
                let reference = face_normal(&corner_positions(&self.reference, face)).norm();
                (flat / reference).log2()
            })
            .collect();

        let incidence = Incidence::from_faces(self.len(), &self.faces);
        incidence
            .gather(&per_face)
            .into_iter()
            .enumerate()
            .map(|(v, sum)| {
                let d = finite_or_clamped(sum / incidence.degree(v));
                if d == 0.0 {
                    1.0
                } else {
                    d
                }
            })
            .collect()
    }

    /// Per-vertex metric distortion.
    ///
    /// For every vertex that belongs to a face, the mean over its 1-ring of
    /// `flat edge length - reference edge length`. Other vertices get 0.
    pub fn metric(&self) -> Vec<f64> {
        let adjacency = VertexAdjacency::from_faces(self.len(), &self.faces);

        (0..self.len())
            .map(|v| {
                let ring = adjacency.neighbors(v);
                if ring.is_empty() {
                    return 0.0;
                }
                let total: f64 = ring
                    .iter()
                    .map(|&u| {
                        (self.flat[u] - self.flat[v]).norm()
                            - (self.reference[u] - self.reference[v]).norm()
                    })
                    .sum();
                total / ring.len() as f64
            })
            .collect()
    }
}

/// NaN to 0, infinities to the largest finite value of the same sign.
fn finite_or_clamped(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else if x == f64::INFINITY {
        f64::MAX
    } else if x == f64::NEG_INFINITY {
        f64::MIN
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;
    use crate::mesh::make_unit_cube;

    fn create_square() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        (points, vec![[0, 1, 2], [0, 2, 3]])
    }

    #[test]
    fn test_identical_embeddings() {
        let (points, faces) = make_unit_cube();
        let distortion = Distortion::new(points.clone(), points, faces).unwrap();

        assert!(distortion.areal().iter().all(|&d| d == 1.0));
        assert!(distortion.metric().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_stretch_in_one_direction() {
        let (reference, faces) = create_square();
        let flat: Vec<Point3<f64>> = reference
            .iter()
            .map(|p| Point3::new(p.x * 2.0, p.y, p.z))
            .collect();
        let distortion = Distortion::new(flat, reference, faces).unwrap();

        // Each face doubled in area
        for d in distortion.areal() {
            assert!((d - 1.0).abs() < 1e-12);
        }

        // Vertex 1 sees edges to 0 (+1), 2 (+0)
        let metric = distortion.metric();
        assert!((metric[1] - 0.5).abs() < 1e-12);
        // Vertex 0 sees 1 (+1), 3 (+0) and the diagonal (sqrt5 - sqrt2)
        let expected = (1.0 + 5f64.sqrt() - 2f64.sqrt()) / 3.0;
        assert!((metric[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_shrink_is_negative() {
        let (reference, faces) = create_square();
        let flat: Vec<Point3<f64>> = reference
            .iter()
            .map(|p| Point3::from(p.coords * 0.5))
            .collect();
        let distortion = Distortion::new(flat, reference, faces).unwrap();

        for d in distortion.areal() {
            assert!((d + 2.0).abs() < 1e-12);
        }
        assert!(distortion.metric().iter().all(|&d| d < 0.0));
    }

    #[test]
    fn test_unused_vertices() {
        let (mut reference, faces) = create_square();
        reference.push(Point3::new(7.0, 7.0, 7.0));
        let flat: Vec<Point3<f64>> = reference.iter().map(|p| *p + Vector3::x()).collect();
        let distortion = Distortion::new(flat, reference, faces).unwrap();

        assert_eq!(distortion.areal()[4], 1.0);
        assert_eq!(distortion.metric()[4], 0.0);
    }

    #[test]
    fn test_collapsed_faces_are_clamped() {
        let (reference, faces) = create_square();
        let flat = vec![Point3::origin(); 4];
        let distortion = Distortion::new(flat, reference, faces).unwrap();

        assert!(distortion.areal().iter().all(|&d| d == f64::MIN));
    }

    #[test]
    fn test_construction_errors() {
        let (reference, faces) = create_square();
        assert!(matches!(
            Distortion::new(reference[..3].to_vec(), reference.clone(), faces),
            Err(MeshError::LengthMismatch { .. })
        ));
        assert!(matches!(
            Distortion::new(reference.clone(), reference, vec![[0, 1, 9]]),
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 9 })
        ));
    }
}
