//! Per-vertex local patches and polyhedra.
//!
//! Both operations look at one vertex and its incident faces at a time and
//! are evaluated for all vertices in parallel.
//!
//! A *half-edge patch* of vertex `p` is the region bounded by `p`, the
//! midpoints of its incident edges and the centroids of its incident faces:
//! the part of the surface closer to `p` than to any other vertex, in a
//! barycentric sense.

use nalgebra::Point3;
use rayon::prelude::*;

use super::stitch::{ParityPolygons, PointSet};
use crate::error::{MeshError, Result};
use crate::mesh::{midpoint, Surface};

/// Size of the region [`Surface::patches`] returns around each vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Every incident triangle in full (granularity `1`).
    Full,
    /// The half-edge patch (granularity `0.5`).
    Half,
}

impl TryFrom<f64> for Granularity {
    type Error = MeshError;

    fn try_from(value: f64) -> Result<Self> {
        if value == 1.0 {
            Ok(Granularity::Full)
        } else if value == 0.5 {
            Ok(Granularity::Half)
        } else {
            Err(MeshError::invalid_param(
                "granularity",
                value,
                "must be 1 or 0.5",
            ))
        }
    }
}

/// Local geometry around one vertex.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Triangles covering the patch.
    Triangles(Vec<[Point3<f64>; 3]>),
    /// Patch points from the primary embedding followed by the matching
    /// points from the auxiliary embedding.
    Points(Vec<Point3<f64>>),
}

/// Closed polyhedron around one vertex between two embeddings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyhedron {
    /// Polyhedron corners.
    pub points: Vec<Point3<f64>>,
    /// Boundary triangles, indexing into `points`.
    pub triangles: Vec<[usize; 3]>,
}

impl Polyhedron {
    /// Check if empty (the vertex has no incident faces).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Rotate `face` so that vertex `v` comes first, keeping the winding.
fn align(face: &[usize; 3], v: usize) -> [usize; 3] {
    let k = face.iter().position(|&u| u == v).unwrap_or(0);
    [face[k], face[(k + 1) % 3], face[(k + 2) % 3]]
}

fn centroid(points: &[Point3<f64>], face: &[usize; 3]) -> Point3<f64> {
    Point3::from((points[face[0]].coords + points[face[1]].coords + points[face[2]].coords) / 3.0)
}

/// Face centroids, "left" and "right" edge midpoints around `v`.
struct HalfEdgeFan {
    mids: Vec<Point3<f64>>,
    lefts: Vec<Point3<f64>>,
    rights: Vec<Point3<f64>>,
}

impl HalfEdgeFan {
    fn new(points: &[Point3<f64>], v: usize, aligned: &[[usize; 3]]) -> Self {
        let p = &points[v];
        Self {
            mids: aligned.iter().map(|f| centroid(points, f)).collect(),
            lefts: aligned.iter().map(|f| midpoint(p, &points[f[2]])).collect(),
            rights: aligned.iter().map(|f| midpoint(p, &points[f[1]])).collect(),
        }
    }

    /// Two triangles per face: `(p, mid, left)` for all faces, then `(p, mid, right)`.
    fn triangles(&self, p: Point3<f64>) -> Vec<[Point3<f64>; 3]> {
        let left = self.mids.iter().zip(&self.lefts).map(|(&m, &l)| [p, m, l]);
        let right = self.mids.iter().zip(&self.rights).map(|(&m, &r)| [p, m, r]);
        left.chain(right).collect()
    }

    /// Candidate points that occur exactly once among centroids, midpoints and `p`.
    ///
    /// Midpoints of edges shared by two incident faces appear twice and are
    /// dropped together with their duplicate.
    fn unique_points(&self, p: Point3<f64>) -> Vec<Point3<f64>> {
        let stack: Vec<Point3<f64>> = self
            .mids
            .iter()
            .chain(&self.lefts)
            .chain(&self.rights)
            .copied()
            .chain(std::iter::once(p))
            .collect();

        stack
            .iter()
            .filter(|q| stack.iter().filter(|r| r == q).count() == 1)
            .copied()
            .collect()
    }
}

impl Surface {
    /// Local patch around every vertex.
    ///
    /// `granularity` selects the region: `1.0` for all incident triangles,
    /// `0.5` for the half-edge patch. With an auxiliary embedding (a second
    /// point set sharing this topology) each patch is returned as the patch
    /// points of this surface followed by those of `aux`:
    ///
    /// | granularity | `aux`  | result |
    /// |-------------|--------|--------|
    /// | 1           | `None` | incident triangles |
    /// | 1           | `Some` | incident vertices (sorted by id), both embeddings |
    /// | 0.5         | `None` | `(p, centroid, edge midpoint)` triangles, two per face |
    /// | 0.5         | `Some` | unshared patch corners, both embeddings |
    ///
    /// Vertices without incident faces yield `None`.
    ///
    /// # Errors
    ///
    /// - [`MeshError::InvalidParameter`] for any other granularity
    /// - [`MeshError::LengthMismatch`] if `aux` does not match the vertex count
    pub fn patches(
        &self,
        aux: Option<&[Point3<f64>]>,
        granularity: f64,
    ) -> Result<Vec<Option<Patch>>> {
        let granularity = Granularity::try_from(granularity)?;
        if let Some(aux) = aux {
            self.check_embedding("auxiliary embedding", aux)?;
        }
        self.incidence();

        Ok((0..self.num_vertices())
            .into_par_iter()
            .map(|v| self.vertex_patch(v, aux, granularity))
            .collect())
    }

    fn vertex_patch(
        &self,
        v: usize,
        aux: Option<&[Point3<f64>]>,
        granularity: Granularity,
    ) -> Option<Patch> {
        let faces = self.connected(v);
        if faces.is_empty() {
            return None;
        }
        let points = self.points();

        let patch = match (granularity, aux) {
            (Granularity::Full, None) => Patch::Triangles(
                faces
                    .iter()
                    .map(|&f| crate::mesh::corner_positions(points, &self.faces()[f]))
                    .collect(),
            ),
            (Granularity::Full, Some(aux)) => {
                let mut ids: Vec<usize> = faces.iter().flat_map(|&f| self.faces()[f]).collect();
                ids.sort_unstable();
                ids.dedup();
                Patch::Points(
                    ids.iter()
                        .map(|&i| points[i])
                        .chain(ids.iter().map(|&i| aux[i]))
                        .collect(),
                )
            }
            (Granularity::Half, None) => {
                let aligned: Vec<[usize; 3]> =
                    faces.iter().map(|&f| align(&self.faces()[f], v)).collect();
                Patch::Triangles(HalfEdgeFan::new(points, v, &aligned).triangles(points[v]))
            }
            (Granularity::Half, Some(aux)) => {
                let aligned: Vec<[usize; 3]> =
                    faces.iter().map(|&f| align(&self.faces()[f], v)).collect();
                let mut out = HalfEdgeFan::new(points, v, &aligned).unique_points(points[v]);
                out.extend(HalfEdgeFan::new(aux, v, &aligned).unique_points(aux[v]));
                Patch::Points(out)
            }
        };

        Some(patch)
    }

    /// Closed polyhedron around every vertex, spanning this surface and a
    /// parallel embedding `inner` (for example the inner and outer layers of a
    /// shell).
    ///
    /// For each incident face the polyhedron gets six quads built from the
    /// vertex, the adjacent edge midpoints and the face centroid in both
    /// embeddings. Quads shared between neighbouring wedges cancel, leaving
    /// the closed boundary, which is returned triangulated. Vertices without
    /// incident faces give an empty polyhedron.
    ///
    /// # Errors
    ///
    /// [`MeshError::LengthMismatch`] if `inner` does not match the vertex count.
    pub fn polyhedra(&self, inner: &[Point3<f64>]) -> Result<Vec<Polyhedron>> {
        self.check_embedding("second embedding", inner)?;
        self.incidence();

        Ok((0..self.num_vertices())
            .into_par_iter()
            .map(|v| self.vertex_polyhedron(v, inner))
            .collect())
    }

    fn vertex_polyhedron(&self, v: usize, inner: &[Point3<f64>]) -> Polyhedron {
        let faces = self.connected(v);
        let outer = self.points();
        let Some(&first) = faces.first() else {
            return Polyhedron::default();
        };

        let mut pts = PointSet::new();
        let mut quads = ParityPolygons::<4>::new();

        let inner_v = pts.insert(inner[v]);
        let outer_v = pts.insert(outer[v]);
        let first = align(&self.faces()[first], v);
        pts.insert(midpoint(&inner[v], &inner[first[1]]));
        pts.insert(midpoint(&outer[v], &outer[first[1]]));

        for &f in faces {
            let poly = align(&self.faces()[f], v);
            let a = pts.insert(centroid(inner, &poly));
            let b = pts.insert(centroid(outer, &poly));
            let c = pts.insert(midpoint(&inner[v], &inner[poly[2]]));
            let d = pts.insert(midpoint(&outer[v], &outer[poly[2]]));
            let e = pts.insert(midpoint(&inner[v], &inner[poly[1]]));
            let g = pts.insert(midpoint(&outer[v], &outer[poly[1]]));

            quads.toggle([inner_v, c, a, e]);
            quads.toggle([outer_v, g, b, d]);
            quads.toggle([outer_v, d, c, inner_v]);
            quads.toggle([outer_v, inner_v, e, g]);
            quads.toggle([g, e, a, b]);
            quads.toggle([d, b, a, c]);
        }

        Polyhedron {
            triangles: quads.triangles(),
            points: pts.into_points(),
        }
    }
}
