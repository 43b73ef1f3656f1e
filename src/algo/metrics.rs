//! Quality metrics for UV layouts.
//!
//! - **Stretch**: for each triangle, the ratio of the largest to the smallest
//!   singular value of the Jacobian of the UV → 3D map. A conformal map has
//!   stretch 1 everywhere. Triangles whose UV image has no area are counted
//!   as collapsed instead of measured.
//! - **Coverage**: fraction of a square raster over `[0, 1]²` whose pixel
//!   centers fall inside some UV triangle.
//! - **Angle distortion**: largest absolute difference, in radians, between a
//!   triangle corner angle in 3D and in UV space.

use nalgebra::{Matrix2, Matrix3x2, Point2, Vector2};

use crate::mesh::{TriMesh, UVMap};

/// Triangles whose smallest singular value is below this are not measured.
const MIN_SINGULAR_VALUE: f64 = 1e-8;

/// UV triangles with less area than this are collapsed.
const MIN_UV_AREA: f64 = 1e-14;

/// Surface triangles with less area than this are ignored entirely.
const MIN_SURFACE_AREA: f64 = 1e-12;

/// Summary of a UV layout's quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityMetrics {
    /// Mean stretch over measurable triangles.
    pub avg_stretch: f64,
    /// Worst stretch over measurable triangles.
    pub max_stretch: f64,
    /// Covered fraction of the unit square.
    pub coverage: f64,
    /// Worst corner angle difference in radians.
    pub angle_distortion: f64,
    /// Number of triangles that contributed to the stretch values.
    pub measured_triangles: usize,
    /// Triangles with surface area whose UV image has (almost) none.
    pub collapsed_triangles: usize,
}

impl QualityMetrics {
    /// Metrics reported when nothing was measured: stretch 1, coverage 0.
    pub fn placeholder() -> Self {
        Self {
            avg_stretch: 1.0,
            max_stretch: 1.0,
            coverage: 0.0,
            angle_distortion: 0.0,
            measured_triangles: 0,
            collapsed_triangles: 0,
        }
    }

    /// Whether any triangle lost its area in UV space.
    pub fn has_collapsed_triangles(&self) -> bool {
        self.collapsed_triangles > 0
    }
}

impl Default for QualityMetrics {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Options for [`coverage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageOptions {
    /// Raster size along each axis.
    pub resolution: usize,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self { resolution: 256 }
    }
}

impl CoverageOptions {
    /// Set the raster resolution.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Stretch statistics returned by [`stretch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchStats {
    /// Mean stretch (1.0 if nothing was measured).
    pub average: f64,
    /// Worst stretch (1.0 if nothing was measured).
    pub max: f64,
    /// Number of measured triangles.
    pub measured: usize,
    /// Number of triangles collapsed in UV space.
    pub collapsed: usize,
}

/// Compute every metric for a mesh and its UV coordinates.
pub fn compute_metrics(mesh: &TriMesh, uvs: &UVMap, options: &CoverageOptions) -> QualityMetrics {
    let stats = stretch(mesh, uvs);
    QualityMetrics {
        avg_stretch: stats.average,
        max_stretch: stats.max,
        coverage: coverage(uvs, mesh.triangles(), options),
        angle_distortion: angle_distortion(mesh, uvs),
        measured_triangles: stats.measured,
        collapsed_triangles: stats.collapsed,
    }
}

/// Per-triangle stretch `σmax / σmin` of the UV → 3D Jacobian.
///
/// Triangles without surface area are ignored. Triangles with surface area
/// but no UV area have unbounded stretch; they are counted in
/// [`StretchStats::collapsed`] and left out of the average and maximum.
/// Triangles with a near-zero singular value are skipped.
pub fn stretch(mesh: &TriMesh, uvs: &UVMap) -> StretchStats {
    let coords = uvs.as_slice();
    let mut sum = 0.0;
    let mut max: f64 = 1.0;
    let mut measured = 0;
    let mut collapsed = 0;

    for (fi, &[a, b, c]) in mesh.triangles().iter().enumerate() {
        let [p0, p1, p2] = mesh.face_positions(fi.into());
        if 0.5 * (p1 - p0).cross(&(p2 - p0)).norm() <= MIN_SURFACE_AREA {
            continue;
        }

        let duv1 = coords[b] - coords[a];
        let duv2 = coords[c] - coords[a];
        let uv_edges = Matrix2::new(duv1.x, duv2.x, duv1.y, duv2.y);
        if 0.5 * uv_edges.determinant().abs() <= MIN_UV_AREA {
            collapsed += 1;
            continue;
        }
        let Some(uv_inverse) = uv_edges.try_inverse() else {
            collapsed += 1;
            continue;
        };
        let position_edges = Matrix3x2::from_columns(&[p1 - p0, p2 - p0]);
        let jacobian = position_edges * uv_inverse;

        let singular = jacobian.svd(false, false).singular_values;
        let s_max = singular.max();
        let s_min = singular.min();
        if s_min.is_nan() || s_min <= MIN_SINGULAR_VALUE || !s_max.is_finite() {
            continue;
        }

        let ratio = s_max / s_min;
        sum += ratio;
        max = max.max(ratio);
        measured += 1;
    }

    StretchStats {
        average: if measured > 0 { sum / measured as f64 } else { 1.0 },
        max,
        measured,
        collapsed,
    }
}

/// Fraction of raster pixels in `[0, 1]²` covered by UV triangles.
///
/// A pixel counts as covered when its center lies inside or on the edge of a
/// triangle.
pub fn coverage(uvs: &UVMap, triangles: &[[usize; 3]], options: &CoverageOptions) -> f64 {
    let n = options.resolution;
    if n == 0 {
        return 0.0;
    }

    let coords = uvs.as_slice();
    let size = n as f64;
    let mut covered = vec![false; n * n];

    let to_pixel = |t: f64| ((t * size).floor().max(0.0) as usize).min(n - 1);

    for &[a, b, c] in triangles {
        let (p0, p1, p2) = (coords[a], coords[b], coords[c]);
        if edge_function(p0, p1, p2) == 0.0 {
            continue;
        }

        let x0 = to_pixel(p0.x.min(p1.x).min(p2.x));
        let x1 = to_pixel(p0.x.max(p1.x).max(p2.x));
        let y0 = to_pixel(p0.y.min(p1.y).min(p2.y));
        let y1 = to_pixel(p0.y.max(p1.y).max(p2.y));

        for j in y0..=y1 {
            for i in x0..=x1 {
                let center = Point2::new((i as f64 + 0.5) / size, (j as f64 + 0.5) / size);
                if contains(p0, p1, p2, center) {
                    covered[j * n + i] = true;
                }
            }
        }
    }

    covered.iter().filter(|&&c| c).count() as f64 / (n * n) as f64
}

/// Largest difference between matching 3D and UV corner angles, in radians.
pub fn angle_distortion(mesh: &TriMesh, uvs: &UVMap) -> f64 {
    let coords = uvs.as_slice();
    let mut worst: f64 = 0.0;

    for (fi, tri) in mesh.triangles().iter().enumerate() {
        let p = mesh.face_positions(fi.into());
        for k in 0..3 {
            let next = (k + 1) % 3;
            let prev = (k + 2) % 3;

            let d1 = p[next] - p[k];
            let d2 = p[prev] - p[k];
            let e1 = coords[tri[next]] - coords[tri[k]];
            let e2 = coords[tri[prev]] - coords[tri[k]];
            let lengths = [d1.norm_squared(), d2.norm_squared(), e1.norm_squared(), e2.norm_squared()];
            if lengths.contains(&0.0) {
                continue;
            }
            let angle_3d = d1.angle(&d2);
            let angle_2d = e1.angle(&e2);

            if angle_3d.is_finite() && angle_2d.is_finite() {
                worst = worst.max((angle_3d - angle_2d).abs());
            }
        }
    }

    worst
}

fn edge_function(a: Point2<f64>, b: Point2<f64>, p: Point2<f64>) -> f64 {
    let ab: Vector2<f64> = b - a;
    let ap: Vector2<f64> = p - a;
    ab.x * ap.y - ab.y * ap.x
}

fn contains(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>, p: Point2<f64>) -> bool {
    let d1 = edge_function(a, b, p);
    let d2 = edge_function(b, c, p);
    let d3 = edge_function(c, a, p);
    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_negative && has_positive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, primitives};
    use nalgebra::Point3;

    fn planar_uvs(mesh: &TriMesh, sx: f64, sy: f64) -> UVMap {
        UVMap::new(
            mesh.positions()
                .iter()
                .map(|p| Point2::new(p.x * sx, p.y * sy))
                .collect(),
        )
    }

    #[test]
    fn test_isometric_map_has_unit_stretch() {
        let mesh = primitives::grid(3, 2).unwrap();
        let uvs = planar_uvs(&mesh, 0.25, 0.25);
        let stats = stretch(&mesh, &uvs);
        assert_eq!(stats.measured, 12);
        assert!((stats.average - 1.0).abs() < 1e-9);
        assert!((stats.max - 1.0).abs() < 1e-9);
        assert!(angle_distortion(&mesh, &uvs) < 1e-9);
    }

    #[test]
    fn test_anisotropic_scale() {
        let mesh = primitives::grid(2, 2).unwrap();
        let uvs = planar_uvs(&mesh, 0.5, 0.25);
        let stats = stretch(&mesh, &uvs);
        assert!((stats.max - 2.0).abs() < 1e-9);
        assert!(angle_distortion(&mesh, &uvs) > 0.1);
    }

    #[test]
    fn test_collapsed_uvs_are_not_measured() {
        let mesh = primitives::grid(1, 1).unwrap();
        let uvs = UVMap::zeros(mesh.num_vertices());
        let stats = stretch(&mesh, &uvs);
        assert_eq!(stats.measured, 0);
        assert_eq!(stats.collapsed, 2);
        assert_eq!(stats.average, 1.0);
        assert_eq!(stats.max, 1.0);
        assert_eq!(coverage(&uvs, mesh.triangles(), &CoverageOptions::default()), 0.0);
    }

    #[test]
    fn test_uvs_on_a_line_are_collapsed() {
        let mesh = primitives::grid(2, 1).unwrap();
        // Every vertex keeps its u but lands on v = 0.
        let uvs = planar_uvs(&mesh, 0.5, 0.0);
        let metrics = compute_metrics(&mesh, &uvs, &CoverageOptions::default());

        assert_eq!(metrics.collapsed_triangles, 4);
        assert_eq!(metrics.measured_triangles, 0);
        assert!(metrics.has_collapsed_triangles());
        assert_eq!(metrics.coverage, 0.0);
    }

    #[test]
    fn test_zero_area_surface_triangle_ignored() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let stats = stretch(&mesh, &UVMap::zeros(3));
        assert_eq!(stats.measured, 0);
        assert_eq!(stats.collapsed, 0);
    }

    #[test]
    fn test_full_square_coverage() {
        let mesh = primitives::grid(1, 1).unwrap();
        let uvs = planar_uvs(&mesh, 1.0, 1.0);
        let options = CoverageOptions::default().with_resolution(64);
        assert_eq!(coverage(&uvs, mesh.triangles(), &options), 1.0);
    }

    #[test]
    fn test_half_square_coverage() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let uvs = planar_uvs(&mesh, 1.0, 1.0);
        let value = coverage(&uvs, mesh.triangles(), &CoverageOptions::default());
        assert!((value - 0.5).abs() < 0.01, "coverage {}", value);
    }

    #[test]
    fn test_compute_metrics_and_placeholder() {
        let mesh = primitives::grid(2, 2).unwrap();
        let uvs = planar_uvs(&mesh, 0.5, 0.5);
        let metrics = compute_metrics(&mesh, &uvs, &CoverageOptions::default());
        assert!((metrics.max_stretch - 1.0).abs() < 1e-9);
        assert!(metrics.coverage > 0.99);
        assert_eq!(metrics.measured_triangles, 8);
        assert_eq!(metrics.collapsed_triangles, 0);

        let placeholder = QualityMetrics::placeholder();
        assert_eq!(placeholder.avg_stretch, 1.0);
        assert_eq!(placeholder.coverage, 0.0);
        assert_eq!(QualityMetrics::default(), placeholder);
    }
}
