//! Discrete Laplace-Beltrami operator.
//!
//! The operator is kept in the `(D, W, V)` form of Reuter et al.:
//!
//! - `D`: lumped mass matrix (diagonal), one third of the incident face areas
//! - `W`: symmetric cotangent-weighted adjacency,
//!   `W[i][j] = 0.5 * (cot(alpha) + cot(beta))` over the faces sharing `(i, j)`
//! - `V`: diagonal of column sums of `W`
//!
//! The stiffness matrix is `A = V - W`; its negation `W - V` is what the heat
//! method solves with.
//!
//! # References
//!
//! - Reuter, M., et al. (2009). "Discrete Laplace-Beltrami operators for shape
//!   analysis and segmentation." Computers & Graphics 33(3).

use std::collections::BTreeMap;

use nalgebra::{DVector, Point3};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::mesh::Incidence;

/// The Laplace-Beltrami triple `(D, W, V)`.
#[derive(Debug, Clone)]
pub struct LaplaceBeltrami {
    mass: DVector<f64>,
    adjacency: CsrMatrix<f64>,
    degree: DVector<f64>,
}

impl LaplaceBeltrami {
    /// Lumped mass matrix `D`, stored as its diagonal.
    #[inline]
    pub fn mass(&self) -> &DVector<f64> {
        &self.mass
    }

    /// Cotangent-weighted adjacency `W`. Exactly symmetric.
    #[inline]
    pub fn adjacency(&self) -> &CsrMatrix<f64> {
        &self.adjacency
    }

    /// Column sums of `W` (the diagonal of `V`).
    #[inline]
    pub fn degree(&self) -> &DVector<f64> {
        &self.degree
    }

    /// Number of vertices the operator acts on.
    #[inline]
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    /// Stiffness matrix `A = V - W`.
    pub fn stiffness(&self) -> CsrMatrix<f64> {
        self.combine(1.0)
    }

    /// Negative Laplacian `W - V`.
    pub fn negative_laplacian(&self) -> CsrMatrix<f64> {
        self.combine(-1.0)
    }

    /// Mean Euclidean length over the strict upper triangle of `W`.
    ///
    /// Every edge stored in `W` counts, whatever the sign of its weight.
    pub fn avg_edge_length(&self, points: &[Point3<f64>]) -> f64 {
        let (sum, count) = self
            .adjacency
            .triplet_iter()
            .filter(|&(i, j, _)| j > i)
            .fold((0.0, 0usize), |(sum, count), (i, j, _)| {
                (sum + (points[i] - points[j]).norm(), count + 1)
            });

        if count > 0 {
            sum / count as f64
        } else {
            0.0
        }
    }

    /// `sign * V - sign * W` as a sparse matrix.
    fn combine(&self, sign: f64) -> CsrMatrix<f64> {
        let n = self.len();
        let mut coo = CooMatrix::new(n, n);
        for (i, &d) in self.degree.iter().enumerate() {
            coo.push(i, i, sign * d);
        }
        for (i, j, &w) in self.adjacency.triplet_iter() {
            coo.push(i, j, -sign * w);
        }
        CsrMatrix::from(&coo)
    }
}

/// Assemble `(D, W, V)` from per-face areas and cotangent weights.
pub(crate) fn assemble(
    num_vertices: usize,
    faces: &[[usize; 3]],
    incidence: &Incidence,
    face_areas: &[f64],
    cotangents: &[[f64; 3]],
) -> LaplaceBeltrami {
    let mass = DVector::from_vec(
        incidence
            .gather(face_areas)
            .into_iter()
            .map(|a| a / 3.0)
            .collect(),
    );

    // Accumulate per unordered pair so that both triangles of W receive the
    // bit-identical value. An off-diagonal pair gets half of each weight; a
    // pair on the diagonal (repeated face index) receives it from both W and W^T.
    let mut pairs: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (face, cots) in faces.iter().zip(cotangents) {
        for k in 0..3 {
            let a = face[(k + 1) % 3];
            let b = face[(k + 2) % 3];
            let key = (a.min(b), a.max(b));
            let contribution = if a == b { cots[k] } else { 0.5 * cots[k] };
            *pairs.entry(key).or_insert(0.0) += contribution;
        }
    }

    let mut coo = CooMatrix::new(num_vertices, num_vertices);
    let mut degree = DVector::zeros(num_vertices);
    for (&(i, j), &w) in &pairs {
        coo.push(i, j, w);
        degree[j] += w;
        if i != j {
            coo.push(j, i, w);
            degree[i] += w;
        }
    }

    LaplaceBeltrami {
        mass,
        adjacency: CsrMatrix::from(&coo),
        degree,
    }
}

#[cfg(test)]
mod tests {
    use nalgebra_sparse::SparseEntry;

    use super::*;
    use crate::mesh::{make_unit_cube, Surface};

    fn cube() -> Surface {
        let (points, faces) = make_unit_cube();
        Surface::new(points, faces).unwrap()
    }

    fn entry(m: &CsrMatrix<f64>, i: usize, j: usize) -> f64 {
        match m.get_entry(i, j) {
            Some(SparseEntry::NonZero(&v)) => v,
            _ => 0.0,
        }
    }

    fn grid_surface(n: usize) -> Surface {
        let mut points = Vec::new();
        let mut faces = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                points.push(Point3::new(i as f64, j as f64, (i * j) as f64 * 0.1));
            }
        }
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + n + 1;
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        Surface::new(points, faces).unwrap()
    }

    #[test]
    fn test_adjacency_is_exactly_symmetric() {
        let surface = grid_surface(4);
        let w = surface.laplace_operator().adjacency();

        for (i, j, &v) in w.triplet_iter() {
            assert_eq!(v, entry(w, j, i), "W[{}][{}] != W[{}][{}]", i, j, j, i);
        }
    }

    #[test]
    fn test_mass_sums_to_a_third_of_face_areas() {
        let surface = cube();
        let lb = surface.laplace_operator();

        // Every cube corner: sum of incident (unhalved) areas / 3
        let total: f64 = lb.mass().iter().sum();
        let areas: f64 = surface.face_areas().iter().sum();
        assert!((total - areas).abs() < 1e-12);
        for (v, &m) in lb.mass().iter().enumerate() {
            let expected = surface.connected(v).len() as f64 / 3.0;
            assert!((m - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degree_is_column_sum() {
        let surface = grid_surface(3);
        let lb = surface.laplace_operator();
        let w = lb.adjacency();

        for j in 0..surface.num_vertices() {
            let col_sum: f64 = (0..surface.num_vertices()).map(|i| entry(w, i, j)).sum();
            assert!((lb.degree()[j] - col_sum).abs() < 1e-12);
        }
    }

    #[test]
    fn test_stiffness_annihilates_constants() {
        let surface = grid_surface(3);
        let a = surface.laplace_operator().stiffness();
        let ones = vec![1.0; surface.num_vertices()];

        for i in 0..a.nrows() {
            let row = a.row(i);
            let value: f64 = row
                .col_indices()
                .iter()
                .zip(row.values())
                .map(|(&j, &v)| v * ones[j])
                .sum();
            assert!(value.abs() < 1e-12);
        }
    }

    #[test]
    fn test_negative_laplacian_is_negated_stiffness() {
        let surface = cube();
        let lb = surface.laplace_operator();
        let a = lb.stiffness();
        let n = lb.negative_laplacian();

        for (i, j, &v) in a.triplet_iter() {
            assert_eq!(entry(&n, i, j), -v);
        }
    }

    #[test]
    fn test_cube_diagonal_weights() {
        let surface = cube();
        let w = surface.laplace_operator().adjacency();

        // Diagonal 0-3 of the bottom square: both opposite angles are right angles.
        assert!(entry(w, 0, 3).abs() < 1e-12);
        // Edge 0-1 borders two faces with 45 degree opposite angles.
        assert!((entry(w, 0, 1) - 1.0).abs() < 1e-12);
    }
}
