//! Heat method for geodesic distances.
//!
//! For a time-step multiplier `m` the method uses `t = m * h^2`, with `h` the
//! average edge length, and the two operators
//!
//! - `lfac = D - t * (W - V)` (backward Euler heat step), and
//! - `nLC = W - V` (negative Laplacian, Poisson step).
//!
//! Rows whose `lfac` column sums to exactly zero are excluded from both
//! systems. The Poisson operator is singular (constants are in its kernel);
//! it is factorized with a tiny diagonal shift relative to its mean diagonal.
//! The shift mostly perturbs the constant mode, which the final minimum-shift
//! removes.
//!
//! # References
//!
//! - Crane, K., Weischedel, C., Wardetzky, M. (2013). "Geodesics in Heat: A
//!   New Approach to Computing Distance Based on Heat Flow." ACM TOG 32(5).

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{DVector, Vector3};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::GeodesicResult;
use crate::algo::laplace::LaplaceBeltrami;
use crate::algo::sparse::{column_sums, restrict, Factorization};
use crate::error::{MeshError, Result};
use crate::mesh::Surface;

/// Relative diagonal shift used to factorize the Poisson operator.
const POISSON_SHIFT: f64 = 1e-8;

/// Faces whose unnormalized normal is shorter than this fraction of `h^2`
/// have no gradient.
const DEGENERATE_AREA: f64 = 1e-12;

/// Options for the heat method geodesic distance computation.
#[derive(Debug, Clone)]
pub struct GeodesicOptions {
    /// Time-step multiplier: the heat is diffused for `m * h^2`, where `h` is
    /// the average edge length. Larger values smooth the distance field.
    pub m: f64,
}

impl Default for GeodesicOptions {
    fn default() -> Self {
        Self { m: 1.0 }
    }
}

impl GeodesicOptions {
    /// Set the time-step multiplier.
    pub fn with_m(mut self, m: f64) -> Self {
        self.m = m;
        self
    }
}

/// Both factorized systems for one value of `m`.
struct HeatSolver {
    /// Rows kept in the solves, ascending.
    good: Vec<usize>,
    /// Position of each vertex in `good`, `usize::MAX` when excluded.
    position: Vec<usize>,
    /// `(heat, poisson)`; `None` when every row is excluded.
    factors: Option<(Factorization, Factorization)>,
}

impl HeatSolver {
    fn build(lb: &LaplaceBeltrami, avg_edge_length: f64, m: f64) -> Result<Self> {
        let n = lb.len();
        let t = m * avg_edge_length * avg_edge_length;

        let nlc = lb.negative_laplacian();
        let lfac = backward_euler(lb.mass(), &nlc, t);

        let sums = column_sums(&lfac);
        let good: Vec<usize> = (0..n).filter(|&i| sums[i] != 0.0).collect();
        if good.len() < n {
            log::warn!(
                "excluding {} of {} vertices with zero heat-operator column sum",
                n - good.len(),
                n
            );
        }

        let mut position = vec![usize::MAX; n];
        for (k, &i) in good.iter().enumerate() {
            position[i] = k;
        }

        if good.is_empty() {
            return Ok(Self {
                good,
                position,
                factors: None,
            });
        }

        log::debug!("factorizing heat and Poisson systems (m = {}, t = {}, rows = {})", m, t, good.len());

        let heat = Factorization::positive_definite(&restrict(&lfac, &good, 1.0, 0.0), "heat diffusion")?;

        let mean_degree = good.iter().map(|&i| lb.degree()[i].abs()).sum::<f64>() / good.len() as f64;
        let shift = POISSON_SHIFT * if mean_degree > 0.0 { mean_degree } else { 1.0 };
        let poisson = Factorization::negative_definite(&restrict(&nlc, &good, -1.0, shift), "Poisson")?;

        Ok(Self {
            good,
            position,
            factors: Some((heat, poisson)),
        })
    }

    fn is_excluded(&self, v: usize) -> bool {
        self.position[v] == usize::MAX
    }

    /// Restrict a per-vertex vector to the kept rows.
    fn gather(&self, full: &[f64]) -> DVector<f64> {
        DVector::from_iterator(self.good.len(), self.good.iter().map(|&i| full[i]))
    }

    /// Expand a kept-row vector to all vertices, filling excluded rows with 0.
    fn scatter(&self, part: &DVector<f64>) -> Vec<f64> {
        let mut full = vec![0.0; self.position.len()];
        for (&i, &v) in self.good.iter().zip(part.iter()) {
            full[i] = v;
        }
        full
    }
}

/// Per-surface cache of heat solvers, keyed by the exact bits of `m`.
///
/// Each key owns a cell that is initialized outside the map lock: concurrent
/// queries with the same `m` factorize once, and queries for other values of
/// `m` are not blocked meanwhile. The cache never evicts on its own.
#[derive(Default)]
pub(crate) struct SolverCache {
    entries: Mutex<HashMap<u64, Arc<OnceCell<Arc<HeatSolver>>>>>,
}

impl SolverCache {
    fn get_or_build<F>(&self, m: f64, build: F) -> Result<Arc<HeatSolver>>
    where
        F: FnOnce() -> Result<HeatSolver>,
    {
        let cell = Arc::clone(self.entries.lock().entry(m.to_bits()).or_default());

        if let Some(solver) = cell.get() {
            log::debug!("reusing cached heat solver for m = {}", m);
            return Ok(Arc::clone(solver));
        }

        // A failed build leaves the cell empty for the next caller to retry.
        cell.get_or_try_init(|| build().map(Arc::new)).map(Arc::clone)
    }

    /// Number of keys with a finished solver.
    fn len(&self) -> usize {
        self.entries.lock().values().filter(|cell| cell.get().is_some()).count()
    }

    fn remove(&self, m: f64) -> bool {
        self.entries
            .lock()
            .remove(&m.to_bits())
            .is_some_and(|cell| cell.get().is_some())
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// `diag(mass) - t * nlc`.
fn backward_euler(mass: &DVector<f64>, nlc: &CsrMatrix<f64>, t: f64) -> CsrMatrix<f64> {
    let n = mass.len();
    let mut coo = CooMatrix::new(n, n);
    for (i, &d) in mass.iter().enumerate() {
        coo.push(i, i, d);
    }
    for (i, j, &v) in nlc.triplet_iter() {
        coo.push(i, j, -t * v);
    }
    CsrMatrix::from(&coo)
}

fn check_m(m: f64) -> Result<()> {
    if m.is_finite() && m > 0.0 {
        Ok(())
    } else {
        Err(MeshError::invalid_param("m", m, "must be positive and finite"))
    }
}

/// Normalized negative gradient `X = -grad(u) / |grad(u)|` on each face.
fn normalized_gradient(surface: &Surface, u: &[f64]) -> Vec<Vector3<f64>> {
    let h = surface.avg_edge_length();
    let min_area = DEGENERATE_AREA * h * h;

    surface
        .faces()
        .iter()
        .zip(surface.face_positions())
        .zip(surface.face_normals().iter().zip(surface.face_areas()))
        .map(|((face, [p0, p1, p2]), (normal, &area))| {
            if area <= min_area {
                return Vector3::zeros();
            }

            // Each edge is paired with the heat at the corner opposite it.
            let grad = (normal.cross(&(p1 - p0)) * u[face[2]]
                + normal.cross(&(p2 - p1)) * u[face[0]]
                + normal.cross(&(p0 - p2)) * u[face[1]])
                / (2.0 * area);

            let norm = grad.norm();
            if norm > 0.0 && norm.is_finite() {
                -grad / norm
            } else {
                Vector3::zeros()
            }
        })
        .collect()
}

/// Integrated divergence of a per-face vector field at each vertex.
fn integrated_divergence(surface: &Surface, x: &[Vector3<f64>]) -> Vec<f64> {
    let mut div = vec![0.0; surface.num_vertices()];

    for ((face, [p0, p1, p2]), (cots, xf)) in surface
        .faces()
        .iter()
        .zip(surface.face_positions())
        .zip(surface.cotangent_weights().iter().zip(x))
    {
        let [c0, c1, c2] = *cots;

        div[face[0]] += 0.5 * (c2 * (p1 - p0).dot(xf) + c1 * (p2 - p0).dot(xf));
        div[face[1]] += 0.5 * (c0 * (p2 - p1).dot(xf) + c2 * (p0 - p1).dot(xf));
        div[face[2]] += 0.5 * (c1 * (p0 - p2).dot(xf) + c0 * (p1 - p2).dot(xf));
    }

    div
}

impl Surface {
    /// Geodesic distance from the nearest of `sources` to every vertex.
    ///
    /// `m` scales the diffusion time `t = m * h^2`; `1.0` is a good default.
    /// The heat and Poisson factorizations for `m` are cached on the surface,
    /// so later calls with the same `m` only perform back-substitutions.
    ///
    /// The field is shifted so that its minimum over solved vertices is 0.
    /// Excluded vertices (see [`GeodesicResult::is_excluded`]) report 0.
    /// An empty `sources` slice yields an all-infinite field.
    ///
    /// # Errors
    ///
    /// - [`MeshError::InvalidParameter`] if `m` is not positive and finite
    /// - [`MeshError::VertexOutOfRange`] if a source is not a vertex
    /// - [`MeshError::Factorization`] if a system cannot be factorized
    pub fn geodesic_distance(&self, sources: &[usize], m: f64) -> Result<GeodesicResult> {
        check_m(m)?;
        for &s in sources {
            self.check_vertex(s)?;
        }

        let n = self.num_vertices();
        if sources.is_empty() {
            return Ok(GeodesicResult::unreachable(n));
        }

        let solver = self.heat_solver(m)?;
        let excluded: Vec<bool> = (0..n).map(|v| solver.is_excluded(v)).collect();

        let (heat, poisson) = match &solver.factors {
            Some(factors) => factors,
            None => return Ok(GeodesicResult::new(vec![0.0; n], excluded)),
        };

        let mut u0 = vec![0.0; n];
        for &s in sources {
            u0[s] = 1.0;
        }
        let u = solver.scatter(&heat.solve(&solver.gather(&u0)));

        let x = normalized_gradient(self, &u);
        let div = integrated_divergence(self, &x);

        let phi = poisson.solve(&solver.gather(&div));
        let min_phi = phi.iter().copied().fold(f64::INFINITY, f64::min);
        let distances = solver.scatter(&phi.map(|p| p - min_phi));

        Ok(GeodesicResult::new(distances, excluded))
    }

    /// [`geodesic_distance`](Self::geodesic_distance) with options.
    pub fn geodesic_distance_with(
        &self,
        sources: &[usize],
        options: &GeodesicOptions,
    ) -> Result<GeodesicResult> {
        self.geodesic_distance(sources, options.m)
    }

    /// Factorize the geodesic systems for `m` ahead of time.
    ///
    /// Useful before issuing queries from several threads.
    pub fn prepare_geodesic(&self, m: f64) -> Result<()> {
        check_m(m)?;
        self.heat_solver(m).map(|_| ())
    }

    /// Number of values of `m` with cached factorizations.
    pub fn cached_solver_count(&self) -> usize {
        self.solvers.len()
    }

    /// Drop the cached factorizations for `m`. Returns whether an entry existed.
    pub fn evict_solver(&self, m: f64) -> bool {
        self.solvers.remove(m)
    }

    /// Drop every cached factorization.
    pub fn clear_solver_cache(&self) {
        self.solvers.clear();
    }

    fn heat_solver(&self, m: f64) -> Result<Arc<HeatSolver>> {
        // Derived quantities are forced before touching the cache.
        let lb = self.laplace_operator();
        let h = self.avg_edge_length();
        self.solvers.get_or_build(m, || HeatSolver::build(lb, h, m))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::*;
    use crate::mesh::{make_cube, make_unit_cube};

    /// Flat `(n + 1) x (n + 1)` grid with unit spacing, vertex `j * (n + 1) + i`
    /// at `(i, j)`, each cell split along its rising diagonal.
    fn create_grid_surface(n: usize) -> Surface {
        let side = n + 1;
        let points = (0..side * side)
            .map(|k| Point3::new((k % side) as f64, (k / side) as f64, 0.0))
            .collect();
        let faces = (0..n * n)
            .flat_map(|cell| {
                let corner = (cell / n) * side + cell % n;
                let (right, up) = (corner + 1, corner + side);
                [[corner, right, up + 1], [corner, up + 1, up]]
            })
            .collect();

        Surface::new(points, faces).unwrap()
    }

    fn cube() -> Surface {
        let (points, faces) = make_unit_cube();
        Surface::new(points, faces).unwrap()
    }

    #[test]
    fn test_single_triangle() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let surface = Surface::new(points, vec![[0, 1, 2]]).unwrap();
        let result = surface.geodesic_distance(&[0], 1.0).unwrap();

        assert_eq!(result.len(), 3);
        assert!(result.distance(0) < 1e-9);
        assert!(result.distance(1) > 0.0);
        assert!(result.distance(2) > 0.0);
    }

    #[test]
    fn test_grid_distance_increases_along_diagonal() {
        let surface = create_grid_surface(3);
        let result = surface.geodesic_distance(&[0], 1.0).unwrap();

        let d0 = result.distance(0);
        let d5 = result.distance(5); // (1,1)
        let d10 = result.distance(10); // (2,2)
        let d15 = result.distance(15); // (3,3)

        assert!(d0 < d5);
        assert!(d5 < d10);
        assert!(d10 < d15);
        assert_eq!(result.excluded_count(), 0);
    }

    #[test]
    fn test_distances_non_negative_and_zero_at_sources() {
        let surface = create_grid_surface(4);
        let sources = [0, 12, 24];
        let result = surface.geodesic_distance(&sources, 1.0).unwrap();

        for &d in result.distances() {
            assert!(d >= 0.0);
        }
        // Every source is a strict local minimum of the field.
        for &s in &sources {
            for &nb in surface.adjacency().neighbors(s) {
                assert!(result.distance(s) < result.distance(nb));
            }
        }
        assert!(result.distances().iter().any(|&d| d == 0.0));
        assert!(result.distance(4) > result.distance(12) + 0.5);
    }

    #[test]
    fn test_grid_distance_roughly_euclidean() {
        let n = 8;
        let surface = create_grid_surface(n);
        let result = surface.geodesic_distance(&[0], 1.0).unwrap();

        // Along the boundary edge from the corner
        let d = result.distance(n);
        assert!((d - n as f64).abs() < 0.25 * n as f64, "distance {}", d);
    }

    #[test]
    fn test_opposite_corners_agree_through_cached_solver() {
        // Half-turn symmetric grid: corner 0 maps onto corner 15
        let surface = create_grid_surface(3);

        let forward = surface.geodesic_distance(&[0], 1.0).unwrap().distance(15);
        let backward = surface.geodesic_distance(&[15], 1.0).unwrap().distance(0);

        assert_eq!(surface.cached_solver_count(), 1);
        assert!(forward > 0.0);
        assert!(
            (forward - backward).abs() <= 1e-9 * forward,
            "distance 0->15 = {}, 15->0 = {}",
            forward,
            backward
        );
    }

    #[test]
    fn test_distance_ignores_mesh_scale() {
        let reference = {
            let (points, faces) = make_cube(Point3::origin(), 1.0);
            let surface = Surface::new(points, faces).unwrap();
            surface.geodesic_distance(&[0], 1.0).unwrap()
        };
        assert!(reference.distance(7) > 1.0);

        for size in [1e-3, 1e-6, 1e-7, 1e-9] {
            let (points, faces) = make_cube(Point3::origin(), size);
            let surface = Surface::new(points, faces).unwrap();
            let result = surface.geodesic_distance(&[0], 1.0).unwrap();

            assert_eq!(result.excluded_count(), 0);
            assert!(result.distance(1) > 0.0, "size {}", size);
            for v in 0..8 {
                let scaled = result.distance(v) / size;
                let expected = reference.distance(v);
                assert!(
                    (scaled - expected).abs() <= 1e-6 * expected.max(1.0),
                    "size {} vertex {}: {} vs {}",
                    size,
                    v,
                    scaled,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_concurrent_queries_share_one_solver() {
        let surface = create_grid_surface(6);
        let shared = &surface;

        let results: Vec<(Vec<f64>, usize)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(move || {
                        let result = shared.geodesic_distance(&[0], 1.0).unwrap();
                        let lb = shared.laplace_operator() as *const LaplaceBeltrami as usize;
                        (result.distances().to_vec(), lb)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(surface.cached_solver_count(), 1);
        let (first, lb) = &results[0];
        for (distances, other_lb) in &results[1..] {
            assert_eq!(distances, first);
            assert_eq!(other_lb, lb);
        }
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let surface = cube();
        let lb = surface.laplace_operator();
        let h = surface.avg_edge_length();
        let cache = SolverCache::default();

        let failed = cache.get_or_build(1.0, || Err(MeshError::Factorization { system: "heat diffusion" }));
        assert!(matches!(failed, Err(MeshError::Factorization { .. })));
        assert_eq!(cache.len(), 0);
        assert!(!cache.remove(1.0));

        let solver = cache.get_or_build(1.0, || HeatSolver::build(lb, h, 1.0)).unwrap();
        let again = cache.get_or_build(1.0, || panic!("solver rebuilt")).unwrap();
        assert!(Arc::ptr_eq(&solver, &again));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_other_m_builds_while_one_is_pending() {
        let surface = cube();
        let lb = surface.laplace_operator();
        let h = surface.avg_edge_length();
        let cache = SolverCache::default();

        // The map lock is free while the m = 1 solver is being built
        cache
            .get_or_build(1.0, || {
                cache.get_or_build(2.0, || HeatSolver::build(lb, h, 2.0))?;
                assert_eq!(cache.len(), 1);
                HeatSolver::build(lb, h, 1.0)
            })
            .unwrap();

        assert_eq!(cache.len(), 2);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_cube_opposite_corner_is_farthest() {
        let surface = cube();
        let result = surface.geodesic_distance(&[0], 1.0).unwrap();

        let (v, d) = result.farthest_vertex().unwrap();
        assert_eq!(v, 7);
        assert!(d > result.distance(1));
    }

    #[test]
    fn test_solver_cache_is_keyed_by_m() {
        let surface = create_grid_surface(3);
        assert_eq!(surface.cached_solver_count(), 0);

        let first = surface.geodesic_distance(&[0], 1.0).unwrap();
        let again = surface.geodesic_distance(&[0], 1.0).unwrap();
        assert_eq!(surface.cached_solver_count(), 1);
        assert_eq!(first.distances(), again.distances());

        surface.geodesic_distance(&[5], 2.0).unwrap();
        assert_eq!(surface.cached_solver_count(), 2);

        assert!(surface.evict_solver(2.0));
        assert!(!surface.evict_solver(2.0));
        assert_eq!(surface.cached_solver_count(), 1);

        surface.clear_solver_cache();
        assert_eq!(surface.cached_solver_count(), 0);
    }

    #[test]
    fn test_larger_m_gives_different_field() {
        let surface = create_grid_surface(4);
        let a = surface.geodesic_distance(&[0], 1.0).unwrap();
        let b = surface.geodesic_distance_with(&[0], &GeodesicOptions::default().with_m(10.0)).unwrap();

        assert!(b.distance(0) < 1e-9);
        assert_ne!(a.distances(), b.distances());
    }

    #[test]
    fn test_isolated_vertex_is_excluded() {
        let mut points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        points.push(Point3::new(10.0, 10.0, 10.0));
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let surface = Surface::new(points, faces).unwrap();

        let result = surface.geodesic_distance(&[0], 1.0).unwrap();
        assert!(result.is_excluded(4));
        assert_eq!(result.distance(4), 0.0);
        assert_eq!(result.excluded_count(), 1);
        assert!(result.distance(2) > 0.0);
    }

    #[test]
    fn test_empty_sources() {
        let surface = create_grid_surface(2);
        let result = surface.geodesic_distance(&[], 1.0).unwrap();

        assert!(result.distances().iter().all(|d| d.is_infinite()));
        assert!(result.farthest_vertex().is_none());
        assert_eq!(surface.cached_solver_count(), 0);
    }

    #[test]
    fn test_invalid_arguments() {
        let surface = create_grid_surface(2);

        for m in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = surface.geodesic_distance(&[0], m).unwrap_err();
            assert!(matches!(err, MeshError::InvalidParameter { name: "m", .. }));
        }

        let err = surface.geodesic_distance(&[9], 1.0).unwrap_err();
        assert!(matches!(err, MeshError::VertexOutOfRange { vertex: 9, count: 9 }));
    }

    #[test]
    fn test_prepare_populates_cache() {
        let surface = cube();
        surface.prepare_geodesic(0.5).unwrap();
        assert_eq!(surface.cached_solver_count(), 1);
        surface.geodesic_distance(&[3], 0.5).unwrap();
        assert_eq!(surface.cached_solver_count(), 1);
    }
}
