//! Sparse vertex-face incidence.

use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Sparse vertex x face incidence matrix.
///
/// Entry `(v, f)` counts how many corners of face `f` reference vertex `v`
/// (normally 0 or 1). Rows are stored in CSR form, so the incident faces of a
/// vertex come back sorted by face index.
#[derive(Debug, Clone)]
pub struct Incidence {
    matrix: CsrMatrix<f64>,
}

impl Incidence {
    /// Build the incidence matrix by scattering a unit entry for every face corner.
    pub fn from_faces(num_vertices: usize, faces: &[[usize; 3]]) -> Self {
        let mut coo = CooMatrix::new(num_vertices, faces.len());
        for (fi, face) in faces.iter().enumerate() {
            for &v in face {
                coo.push(v, fi, 1.0);
            }
        }

        Self {
            matrix: CsrMatrix::from(&coo),
        }
    }

    /// Number of vertices (rows).
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of faces (columns).
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.matrix.ncols()
    }

    /// Faces incident to vertex `v`, in ascending order.
    #[inline]
    pub fn faces(&self, v: usize) -> &[usize] {
        let range = self.row_range(v);
        &self.matrix.col_indices()[range]
    }

    /// Incidence row sum of vertex `v` (number of incident face corners).
    pub fn degree(&self, v: usize) -> f64 {
        let range = self.row_range(v);
        self.matrix.values()[range].iter().sum()
    }

    /// Incident faces of vertex `v` paired with their corner counts.
    pub fn weighted_faces(&self, v: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_range(v);
        self.matrix.col_indices()[range.clone()]
            .iter()
            .copied()
            .zip(self.matrix.values()[range].iter().copied())
    }

    /// Whether vertex `v` belongs to no face.
    #[inline]
    pub fn is_isolated(&self, v: usize) -> bool {
        self.faces(v).is_empty()
    }

    /// Multiply a per-face scalar field by the incidence matrix.
    ///
    /// The result holds, for each vertex, the incidence-weighted sum of the
    /// values on its incident faces.
    pub fn gather(&self, per_face: &[f64]) -> Vec<f64> {
        (0..self.num_vertices())
            .map(|v| self.weighted_faces(v).map(|(f, w)| w * per_face[f]).sum())
            .collect()
    }

    /// The underlying sparse matrix.
    pub fn matrix(&self) -> &CsrMatrix<f64> {
        &self.matrix
    }

    fn row_range(&self, v: usize) -> std::ops::Range<usize> {
        let offsets = self.matrix.row_offsets();
        offsets[v]..offsets[v + 1]
    }
}
