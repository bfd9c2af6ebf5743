//! Breadth-first extraction of surface chunks.
//!
//! Mostly useful for carving small, connected test cases out of large scans.

use std::collections::VecDeque;

use nalgebra::Point3;
use rand::Rng;

use crate::error::{MeshError, Result};
use crate::mesh::Surface;

/// A connected piece of a surface with renumbered vertices.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Positions of the kept vertices.
    pub points: Vec<Point3<f64>>,
    /// Faces of the chunk, indexing into `points`.
    pub faces: Vec<[usize; 3]>,
    /// Original vertex id of each kept vertex.
    pub vertex_map: Vec<usize>,
}

impl Chunk {
    /// Number of faces in the chunk.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Gather per-vertex data of the parent surface for the kept vertices.
    pub fn subset<T: Clone>(&self, per_vertex: &[T]) -> Vec<T> {
        self.vertex_map.iter().map(|&v| per_vertex[v].clone()).collect()
    }

    /// Build a standalone surface from the chunk.
    pub fn into_surface(self) -> Result<Surface> {
        Surface::new(self.points, self.faces)
    }
}

impl Surface {
    /// Extract about `target_faces` connected faces around `seed`.
    ///
    /// Faces are collected breadth-first over the vertex-face incidence,
    /// starting at `seed` or at a random vertex when `seed` is `None`.
    /// Collection stops once at least `target_faces` faces are gathered (a
    /// vertex's incident faces are always taken together, so the count may
    /// overshoot) or when the component is exhausted.
    ///
    /// # Errors
    ///
    /// - [`MeshError::VertexOutOfRange`] if `seed` is not a vertex
    /// - [`MeshError::EmptyMesh`] if no seed is given and the surface has no vertices
    pub fn extract_chunk(&self, target_faces: usize, seed: Option<usize>) -> Result<Chunk> {
        let seed = match seed {
            Some(v) => {
                self.check_vertex(v)?;
                v
            }
            None if self.num_vertices() == 0 => return Err(MeshError::EmptyMesh),
            None => rand::thread_rng().gen_range(0..self.num_vertices()),
        };

        let face_ids = self.bfs_faces(seed, target_faces);
        log::debug!("extracted {} faces around vertex {}", face_ids.len(), seed);

        let mut renumber = vec![usize::MAX; self.num_vertices()];
        let mut vertex_map = Vec::new();
        let mut faces = Vec::with_capacity(face_ids.len());

        for f in face_ids {
            let face = self.faces()[f].map(|v| {
                if renumber[v] == usize::MAX {
                    renumber[v] = vertex_map.len();
                    vertex_map.push(v);
                }
                renumber[v]
            });
            faces.push(face);
        }

        let points = vertex_map.iter().map(|&v| self.points()[v]).collect();
        Ok(Chunk {
            points,
            faces,
            vertex_map,
        })
    }

    /// [`extract_chunk`](Self::extract_chunk), also subsetting per-vertex
    /// auxiliary data such as a second embedding.
    pub fn extract_chunk_with<T: Clone>(
        &self,
        target_faces: usize,
        seed: Option<usize>,
        aux: &[T],
    ) -> Result<(Chunk, Vec<T>)> {
        if aux.len() != self.num_vertices() {
            return Err(MeshError::length_mismatch(
                "auxiliary data",
                self.num_vertices(),
                aux.len(),
            ));
        }
        let chunk = self.extract_chunk(target_faces, seed)?;
        let subset = chunk.subset(aux);
        Ok((chunk, subset))
    }

    /// Face ids reached breadth-first from `seed`, in discovery order.
    fn bfs_faces(&self, seed: usize, target_faces: usize) -> Vec<usize> {
        let mut taken = vec![false; self.num_faces()];
        let mut visited = vec![false; self.num_vertices()];
        let mut queue = VecDeque::from([seed]);
        let mut faces = Vec::new();
        visited[seed] = true;

        while faces.len() < target_faces {
            let Some(node) = queue.pop_front() else {
                break;
            };
            for &f in self.connected(node) {
                if taken[f] {
                    continue;
                }
                taken[f] = true;
                faces.push(f);
                for &v in &self.faces()[f] {
                    if !visited[v] {
                        visited[v] = true;
                        queue.push_back(v);
                    }
                }
            }
        }

        faces
    }
}
