//! Canonical test surfaces.

use nalgebra::Point3;

/// Corners of the unit cube, indexed by `x | y << 1 | z << 2`.
const CUBE_CORNERS: [[f64; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

/// Outward-wound triangles of the cube, two per side.
const CUBE_FACES: [[usize; 3]; 12] = [
    [0, 2, 3],
    [0, 3, 1],
    [0, 1, 4],
    [1, 5, 4],
    [1, 3, 5],
    [3, 7, 5],
    [2, 7, 3],
    [2, 6, 7],
    [0, 6, 2],
    [0, 4, 6],
    [4, 7, 6],
    [4, 5, 7],
];

/// Build an axis-aligned cube with edge length `size` centred on `center`.
///
/// Returns 8 points and 12 triangles with outward-facing normals.
///
/// ```
/// use mantle::mesh::{make_cube, Surface};
/// use nalgebra::Point3;
///
/// let (points, faces) = make_cube(Point3::origin(), 2.0);
/// let surface = Surface::new(points, faces).unwrap();
/// assert!((surface.surface_area() - 24.0).abs() < 1e-12);
/// ```
pub fn make_cube(center: Point3<f64>, size: f64) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let points = CUBE_CORNERS
        .iter()
        .map(|&[x, y, z]| {
            Point3::new(
                (x - 0.5) * size + center.x,
                (y - 0.5) * size + center.y,
                (z - 0.5) * size + center.z,
            )
        })
        .collect();

    (points, CUBE_FACES.to_vec())
}

/// The unit cube spanning `[0, 1]^3`.
pub fn make_unit_cube() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    make_cube(Point3::new(0.5, 0.5, 0.5), 1.0)
}
