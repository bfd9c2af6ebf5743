//! Parity-based polygon stitching.
//!
//! A closed surface can be assembled from overlapping pieces by inserting
//! every piece's polygons into a multiset and keeping only the polygons that
//! were inserted an odd number of times: a polygon shared by two neighbouring
//! pieces (usually with opposite winding) cancels, leaving the outer boundary.
//!
//! [`PointSet`] provides the matching vertex side: points are interned by
//! their exact coordinates, so two pieces that compute the same point get the
//! same id.

use std::collections::HashMap;

use nalgebra::Point3;

/// Points interned by exact coordinates, numbered in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    ids: HashMap<[u64; 3], usize>,
    points: Vec<Point3<f64>>,
}

impl PointSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `p`, inserting it if it has not been seen.
    pub fn insert(&mut self, p: Point3<f64>) -> usize {
        let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
        let next = self.points.len();
        let id = *self.ids.entry(key).or_insert(next);
        if id == next {
            self.points.push(p);
        }
        id
    }

    /// Interned points, indexed by id.
    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Consume the set, returning the points.
    pub fn into_points(self) -> Vec<Point3<f64>> {
        self.points
    }

    /// Number of distinct points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Multiset of `N`-gons that keeps only odd multiplicities.
///
/// Polygons are compared as unordered vertex sets. A surviving polygon keeps
/// the winding it was inserted with, and iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct ParityPolygons<const N: usize> {
    slots: Vec<Option<[usize; N]>>,
    index: HashMap<[usize; N], usize>,
}

impl<const N: usize> Default for ParityPolygons<N> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<const N: usize> ParityPolygons<N> {
    /// Create an empty multiset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `polygon`, or cancel it if an equal polygon is present.
    ///
    /// Returns `true` if the polygon is present afterwards.
    pub fn toggle(&mut self, polygon: [usize; N]) -> bool {
        let mut key = polygon;
        key.sort_unstable();

        match self.index.remove(&key) {
            Some(slot) => {
                self.slots[slot] = None;
                false
            }
            None => {
                self.index.insert(key, self.slots.len());
                self.slots.push(Some(polygon));
                true
            }
        }
    }

    /// Surviving polygons in insertion order.
    pub fn polygons(&self) -> impl Iterator<Item = &[usize; N]> + '_ {
        self.slots.iter().flatten()
    }

    /// Number of surviving polygons.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Fan-triangulate every surviving polygon.
    ///
    /// `[a, b, c, d]` becomes `[a, b, c]` and `[a, c, d]`.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        self.polygons()
            .flat_map(|poly| (1..N.saturating_sub(1)).map(move |k| [poly[0], poly[k], poly[k + 1]]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_set_interns_exact_duplicates() {
        let mut set = PointSet::new();
        let a = set.insert(Point3::new(0.0, 0.0, 0.0));
        let b = set.insert(Point3::new(1.0, 0.0, 0.0));
        let c = set.insert(Point3::new(0.0, 0.0, 0.0));

        assert_eq!((a, b, c), (0, 1, 0));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_reversed_polygon_cancels() {
        let mut quads = ParityPolygons::<4>::new();
        assert!(quads.toggle([0, 1, 2, 3]));
        assert!(quads.toggle([4, 5, 6, 7]));
        assert!(!quads.toggle([3, 2, 1, 0]));

        assert_eq!(quads.len(), 1);
        assert_eq!(quads.polygons().collect::<Vec<_>>(), vec![&[4, 5, 6, 7]]);
    }

    #[test]
    fn test_odd_multiplicity_survives() {
        let mut quads = ParityPolygons::<4>::new();
        quads.toggle([0, 1, 2, 3]);
        quads.toggle([1, 2, 3, 0]);
        quads.toggle([3, 2, 1, 0]);

        // Third insertion wins, with its own winding
        assert_eq!(quads.polygons().collect::<Vec<_>>(), vec![&[3, 2, 1, 0]]);
    }

    #[test]
    fn test_quad_triangulation() {
        let mut quads = ParityPolygons::<4>::new();
        quads.toggle([0, 1, 2, 3]);
        assert_eq!(quads.triangles(), vec![[0, 1, 2], [0, 2, 3]]);
    }
}
