//! Undirected vertex adjacency built from triangle edges.

/// Adjacency list for mesh vertices.
///
/// Each vertex stores its 1-ring neighbours, sorted and without duplicates.
/// Vertices that belong to no face have an empty neighbour list.
#[derive(Debug, Clone)]
pub struct VertexAdjacency {
    neighbors: Vec<Vec<usize>>,
}

impl VertexAdjacency {
    /// Build the adjacency from the three edges of every face.
    pub fn from_faces(num_vertices: usize, faces: &[[usize; 3]]) -> Self {
        let mut neighbors = vec![Vec::new(); num_vertices];

        for &[a, b, c] in faces {
            for (u, v) in [(a, b), (b, c), (a, c)] {
                if u != v {
                    neighbors[u].push(v);
                    neighbors[v].push(u);
                }
            }
        }

        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        Self { neighbors }
    }

    /// Neighbours of vertex `v`.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.neighbors[v]
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Iterate over every undirected edge once, as `(low, high)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(v, list)| {
            list.iter()
                .copied()
                .filter(move |&n| n > v)
                .map(move |n| (v, n))
        })
    }
}
