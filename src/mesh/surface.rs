//! Indexed triangle surface with memoized derived quantities.

use nalgebra::{Point3, Vector3};
use once_cell::sync::OnceCell;

use super::quantities;
use super::{Incidence, VertexAdjacency};
use crate::algo::geodesic::SolverCache;
use crate::algo::laplace::{self, LaplaceBeltrami};
use crate::error::{MeshError, Result};

/// A triangle surface: points plus triangle index triples.
///
/// Topology and geometry are fixed at construction. Every derived quantity
/// is computed on first access, exactly once, and cached for the lifetime of
/// the surface; concurrent first accesses block on a single computation.
/// To work with different points or faces, build a new `Surface`.
///
/// # Example
///
/// ```
/// use mantle::mesh::{make_unit_cube, Surface};
///
/// let (points, faces) = make_unit_cube();
/// let surface = Surface::new(points, faces).unwrap();
///
/// assert_eq!(surface.num_vertices(), 8);
/// assert_eq!(surface.connected(0), &[0, 1, 2, 8, 9]);
/// ```
pub struct Surface {
    points: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,

    incidence: OnceCell<Incidence>,
    adjacency: OnceCell<VertexAdjacency>,
    face_positions: OnceCell<Vec<[Point3<f64>; 3]>>,
    face_normals: OnceCell<Vec<Vector3<f64>>>,
    vertex_normals: OnceCell<Vec<Vector3<f64>>>,
    face_areas: OnceCell<Vec<f64>>,
    cotangent_weights: OnceCell<Vec<[f64; 3]>>,
    laplace: OnceCell<LaplaceBeltrami>,
    avg_edge_length: OnceCell<f64>,

    pub(crate) solvers: SolverCache,
}

/// Check that every face references a vertex below `num_vertices`.
pub(crate) fn validate_faces(num_vertices: usize, faces: &[[usize; 3]]) -> Result<()> {
    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vertex) = face.iter().find(|&&v| v >= num_vertices) {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex });
        }
    }
    Ok(())
}

impl Surface {
    /// Create a surface from points and triangles.
    ///
    /// Fails with [`MeshError::InvalidVertexIndex`] if any face references a
    /// vertex outside `points`. Orientation consistency is not checked.
    pub fn new(points: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self> {
        validate_faces(points.len(), &faces)?;

        Ok(Self {
            points,
            faces,
            incidence: OnceCell::new(),
            adjacency: OnceCell::new(),
            face_positions: OnceCell::new(),
            face_normals: OnceCell::new(),
            vertex_normals: OnceCell::new(),
            face_areas: OnceCell::new(),
            cotangent_weights: OnceCell::new(),
            laplace: OnceCell::new(),
            avg_edge_length: OnceCell::new(),
            solvers: SolverCache::default(),
        })
    }

    /// Vertex positions.
    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Triangle index triples.
    #[inline]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.points.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Vertex-face incidence.
    pub fn incidence(&self) -> &Incidence {
        self.incidence.get_or_init(|| {
            log::trace!("building vertex-face incidence");
            Incidence::from_faces(self.num_vertices(), &self.faces)
        })
    }

    /// Faces incident to vertex `v`, in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `v` is not a vertex of this surface.
    #[inline]
    pub fn connected(&self, v: usize) -> &[usize] {
        self.incidence().faces(v)
    }

    /// Undirected 1-ring adjacency of the surface.
    pub fn adjacency(&self) -> &VertexAdjacency {
        self.adjacency
            .get_or_init(|| VertexAdjacency::from_faces(self.num_vertices(), &self.faces))
    }

    /// Corner positions of every face.
    pub fn face_positions(&self) -> &[[Point3<f64>; 3]] {
        self.face_positions
            .get_or_init(|| quantities::face_positions(&self.points, &self.faces))
    }

    /// Unnormalized face normals `(p1 - p0) x (p2 - p0)`.
    ///
    /// The magnitude of each normal is twice the triangle's area.
    pub fn face_normals(&self) -> &[Vector3<f64>] {
        self.face_normals
            .get_or_init(|| quantities::face_normals(self.face_positions()))
    }

    /// Per-vertex normals: the average of incident face normals.
    ///
    /// Not normalized. Vertices without faces get the zero vector.
    pub fn vertex_normals(&self) -> &[Vector3<f64>] {
        self.vertex_normals
            .get_or_init(|| quantities::vertex_normals(self.incidence(), self.face_normals()))
    }

    /// Per-face "area": the norm of the unnormalized face normal.
    ///
    /// This is **twice** the conventional triangle area. The lumped mass
    /// matrix and the geodesic solver are built on this convention; use
    /// [`triangle_area`](super::triangle_area) or
    /// [`surface_area`](Self::surface_area) for conventional areas.
    pub fn face_areas(&self) -> &[f64] {
        self.face_areas
            .get_or_init(|| quantities::face_areas(self.face_normals()))
    }

    /// Conventional total surface area (half the sum of [`face_areas`](Self::face_areas)).
    pub fn surface_area(&self) -> f64 {
        0.5 * self.face_areas().iter().sum::<f64>()
    }

    /// Cotangent of the angle at each corner of each face.
    ///
    /// Entry `k` of face `f` is the cotangent of the angle at corner `k`,
    /// which lies opposite the edge joining the other two corners. Degenerate
    /// angles have weight 0.
    pub fn cotangent_weights(&self) -> &[[f64; 3]] {
        self.cotangent_weights
            .get_or_init(|| quantities::cotangent_weights(self.face_positions()))
    }

    /// The discrete Laplace-Beltrami operator `(D, W, V)`.
    pub fn laplace_operator(&self) -> &LaplaceBeltrami {
        self.laplace.get_or_init(|| {
            log::trace!("assembling Laplace-Beltrami operator");
            laplace::assemble(
                self.num_vertices(),
                &self.faces,
                self.incidence(),
                self.face_areas(),
                self.cotangent_weights(),
            )
        })
    }

    /// Mean length of the edges present in the Laplace-Beltrami adjacency.
    ///
    /// Returns 0 for a surface without edges.
    pub fn avg_edge_length(&self) -> f64 {
        *self
            .avg_edge_length
            .get_or_init(|| self.laplace_operator().avg_edge_length(&self.points))
    }

    /// Collapse the edge `(a, b)` into `target`.
    ///
    /// Not implemented: always fails with [`MeshError::Unimplemented`].
    pub fn edge_collapse(&self, _a: usize, _b: usize, _target: Point3<f64>) -> Result<Surface> {
        Err(MeshError::Unimplemented("edge collapse"))
    }

    pub(crate) fn check_vertex(&self, v: usize) -> Result<()> {
        if v < self.num_vertices() {
            Ok(())
        } else {
            Err(MeshError::VertexOutOfRange {
                vertex: v,
                count: self.num_vertices(),
            })
        }
    }

    pub(crate) fn check_embedding(&self, what: &'static str, other: &[Point3<f64>]) -> Result<()> {
        if other.len() == self.num_vertices() {
            Ok(())
        } else {
            Err(MeshError::length_mismatch(what, self.num_vertices(), other.len()))
        }
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("num_vertices", &self.num_vertices())
            .field("num_faces", &self.num_faces())
            .finish_non_exhaustive()
    }
}
