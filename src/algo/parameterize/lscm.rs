//! Least Squares Conformal Maps (LSCM) parameterization.
//!
//! LSCM computes a conformal (angle-preserving) parameterization of one UV
//! island. Every triangle contributes one complex equation stating that the
//! map restricted to the triangle is a similarity; the equations are solved in
//! the least-squares sense with two vertices pinned to remove the translation,
//! rotation and scale freedom of the energy.
//!
//! Complex coefficients are stored as pairs of reals. For a triangle with
//! local 2D coordinates `(x_k, y_k)` and area `A`, vertex `k` gets
//!
//! ```text
//! W_k = ((x_prev - x_next) + i (y_prev - y_next)) / (2A) * sqrt(A)
//! ```
//!
//! and the equation `sum_k W_k (u_k + i v_k) = 0` splits into a real row
//! `Re(W) u - Im(W) v` and an imaginary row `Im(W) u + Re(W) v`.
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

use std::collections::{BTreeSet, HashMap};

use log::{debug, trace};
use nalgebra::{Point2, Point3};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::error::{MeshError, Result};
use crate::mesh::{normalize_to_unit_square, FaceId, TriMesh, UVMap, VertexId};

use super::sparse::{normal_matrix, solve_pinned};

/// Options for LSCM parameterization.
#[derive(Debug, Clone)]
pub struct LSCMOptions {
    /// Strategy for selecting pinned (fixed) vertices.
    pub pin_strategy: PinStrategy,

    /// Triangles whose local area is below this are skipped.
    pub degenerate_area: f64,

    /// Boundaries with more vertices than this skip the farthest-pair search
    /// and pin the first and middle boundary vertex instead.
    pub boundary_search_limit: usize,

    /// Rescale the result into the unit square.
    pub normalize: bool,
}

impl Default for LSCMOptions {
    fn default() -> Self {
        Self {
            pin_strategy: PinStrategy::Automatic,
            degenerate_area: 1e-8,
            boundary_search_limit: 200,
            normalize: true,
        }
    }
}

impl LSCMOptions {
    /// Create options with automatic pin selection.
    pub fn automatic() -> Self {
        Self::default()
    }

    /// Create options with manually specified pinned vertices.
    pub fn with_pins(pin0: PinnedVertex, pin1: PinnedVertex) -> Self {
        Self {
            pin_strategy: PinStrategy::Manual(pin0, pin1),
            ..Default::default()
        }
    }

    /// Set the degenerate-triangle area threshold.
    pub fn with_degenerate_area(mut self, area: f64) -> Self {
        self.degenerate_area = area;
        self
    }

    /// Set the boundary size above which the farthest-pair search is skipped.
    pub fn with_boundary_search_limit(mut self, limit: usize) -> Self {
        self.boundary_search_limit = limit;
        self
    }

    /// Enable or disable unit-square normalization of the result.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Strategy for selecting which vertices to pin (fix) during parameterization.
#[derive(Debug, Clone)]
pub enum PinStrategy {
    /// Pin the two boundary vertices farthest apart in 3D to (0, 0) and
    /// (1, 0). Islands without boundary use their first vertex and the
    /// vertex farthest from it.
    Automatic,

    /// Use specified vertices with their UV coordinates.
    Manual(PinnedVertex, PinnedVertex),
}

/// A vertex pinned to a specific UV coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinnedVertex {
    /// The vertex to pin.
    pub vertex: VertexId,
    /// The fixed U coordinate.
    pub u: f64,
    /// The fixed V coordinate.
    pub v: f64,
}

impl PinnedVertex {
    /// Create a new pinned vertex.
    pub fn new(vertex: VertexId, u: f64, v: f64) -> Self {
        Self { vertex, u, v }
    }
}

/// Dense local numbering of the vertices of one island.
///
/// Local indices follow the order in which vertices are first met while
/// walking the island's faces.
#[derive(Debug, Clone)]
pub struct LocalFrame {
    vertices: Vec<VertexId>,
    local: HashMap<VertexId, usize>,
}

impl LocalFrame {
    /// Number the vertices referenced by `faces`.
    pub fn new(mesh: &TriMesh, faces: &[FaceId]) -> Self {
        let mut vertices = Vec::new();
        let mut local = HashMap::new();
        for &f in faces {
            for v in mesh.face(f) {
                local.entry(v).or_insert_with(|| {
                    vertices.push(v);
                    vertices.len() - 1
                });
            }
        }
        Self { vertices, local }
    }

    /// Number of distinct vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the island has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Local index of a global vertex.
    #[inline]
    pub fn local(&self, v: VertexId) -> Option<usize> {
        self.local.get(&v).copied()
    }

    /// Global vertex of a local index.
    #[inline]
    pub fn global(&self, i: usize) -> VertexId {
        self.vertices[i]
    }

    /// Global vertices in local order.
    #[inline]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }
}

/// UV coordinates computed for one island.
#[derive(Debug, Clone)]
pub struct IslandParameterization {
    /// Global vertices of the island in local order.
    pub vertices: Vec<VertexId>,
    /// UV coordinate of each entry of `vertices`.
    pub uvs: Vec<Point2<f64>>,
    /// The two vertices that were pinned, with their target coordinates.
    pub pins: [PinnedVertex; 2],
    /// Number of triangles that contributed to the energy.
    pub valid_triangles: usize,
}

impl IslandParameterization {
    /// Iterate over `(vertex, uv)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, Point2<f64>)> + '_ {
        self.vertices.iter().copied().zip(self.uvs.iter().copied())
    }

    /// Write the island's coordinates into a mesh-wide UV map.
    pub fn write_to(&self, uv_map: &mut UVMap) {
        for (v, uv) in self.iter() {
            uv_map.set(v, uv);
        }
    }
}

/// Compute an LSCM parameterization of the island formed by `faces`.
///
/// # Errors
///
/// - [`MeshError::IslandTooSmall`] if the faces reference fewer than 3 vertices
/// - [`MeshError::NoValidTriangles`] if every triangle is degenerate
/// - [`MeshError::InvalidState`] if manual pins are not island vertices or coincide
/// - [`MeshError::SingularSystem`], [`MeshError::FactorizationFailed`] or
///   [`MeshError::NonFiniteSolution`] if the linear solve is unusable
///
/// # Example
///
/// ```
/// use unfold::algo::parameterize::{lscm, LSCMOptions};
/// use unfold::mesh::primitives;
///
/// let mesh = primitives::grid(2, 2).unwrap();
/// let faces: Vec<_> = mesh.face_ids().collect();
/// let island = lscm(&mesh, &faces, &LSCMOptions::default()).unwrap();
/// assert_eq!(island.uvs.len(), 9);
/// ```
pub fn lscm(
    mesh: &TriMesh,
    faces: &[FaceId],
    options: &LSCMOptions,
) -> Result<IslandParameterization> {
    let frame = LocalFrame::new(mesh, faces);
    let n = frame.len();
    if n < 3 {
        return Err(MeshError::IslandTooSmall { vertices: n });
    }

    let (m, valid_triangles) = build_conformal_matrix(mesh, faces, &frame, options.degenerate_area);
    if valid_triangles == 0 {
        return Err(MeshError::NoValidTriangles { faces: faces.len() });
    }
    if valid_triangles < faces.len() {
        debug!(
            "skipped {} degenerate triangles out of {}",
            faces.len() - valid_triangles,
            faces.len()
        );
    }

    let pins = match &options.pin_strategy {
        PinStrategy::Automatic => select_pins(mesh, faces, &frame, options.boundary_search_limit),
        PinStrategy::Manual(p0, p1) => [*p0, *p1],
    };
    let local_pins = [local_pin(&frame, &pins[0])?, local_pin(&frame, &pins[1])?];
    if local_pins[0] == local_pins[1] {
        return Err(MeshError::InvalidState(format!(
            "both pins refer to vertex {:?}",
            pins[0].vertex
        )));
    }
    trace!("pinned {:?} and {:?}", pins[0].vertex, pins[1].vertex);

    let a = normal_matrix(&m);
    let mut constraints = Vec::with_capacity(4);
    for (pin, &l) in pins.iter().zip(&local_pins) {
        constraints.push((2 * l, pin.u));
        constraints.push((2 * l + 1, pin.v));
    }
    let x = solve_pinned(&a, &constraints)?;

    let mut uvs: Vec<Point2<f64>> = (0..n).map(|i| Point2::new(x[2 * i], x[2 * i + 1])).collect();
    for (pin, &l) in pins.iter().zip(&local_pins) {
        uvs[l] = Point2::new(pin.u, pin.v);
    }

    if options.normalize {
        normalize_to_unit_square(&mut uvs);
    }

    Ok(IslandParameterization {
        vertices: frame.vertices().to_vec(),
        uvs,
        pins,
        valid_triangles,
    })
}

/// Parameterize a whole mesh as a single island.
///
/// The mesh should have disk topology; closed meshes are flattened too but
/// with heavy distortion. Use the unwrap pipeline to cut them first.
///
/// # Errors
///
/// Same as [`lscm`].
pub fn lscm_mesh(mesh: &TriMesh, options: &LSCMOptions) -> Result<UVMap> {
    let faces: Vec<FaceId> = mesh.face_ids().collect();
    let island = lscm(mesh, &faces, options)?;
    let mut uv_map = UVMap::zeros(mesh.num_vertices());
    island.write_to(&mut uv_map);
    Ok(uv_map)
}

fn local_pin(frame: &LocalFrame, pin: &PinnedVertex) -> Result<usize> {
    frame.local(pin.vertex).ok_or_else(|| {
        MeshError::InvalidState(format!("pinned vertex {:?} is not part of the island", pin.vertex))
    })
}

/// Assemble the `2F x 2n` conformal energy matrix.
///
/// Returns the matrix and the number of non-degenerate triangles (`F`).
fn build_conformal_matrix(
    mesh: &TriMesh,
    faces: &[FaceId],
    frame: &LocalFrame,
    degenerate_area: f64,
) -> (CsrMatrix<f64>, usize) {
    let mut entries: Vec<(usize, usize, f64)> = Vec::with_capacity(faces.len() * 12);
    let mut row = 0;

    for &f in faces {
        let Some((local, area)) = project_triangle(&mesh.face_positions(f), degenerate_area) else {
            continue;
        };

        let scale = area.sqrt() / (2.0 * area);
        for (k, v) in mesh.face(f).into_iter().enumerate() {
            let Some(col) = frame.local(v) else {
                continue;
            };
            let prev = local[(k + 2) % 3];
            let next = local[(k + 1) % 3];
            let re = (prev.x - next.x) * scale;
            let im = (prev.y - next.y) * scale;

            entries.push((row, 2 * col, re));
            entries.push((row, 2 * col + 1, -im));
            entries.push((row + 1, 2 * col, im));
            entries.push((row + 1, 2 * col + 1, re));
        }
        row += 2;
    }

    let mut coo = CooMatrix::new(row, 2 * frame.len());
    for (r, c, v) in entries {
        coo.push(r, c, v);
    }
    (CsrMatrix::from(&coo), row / 2)
}

/// Express a triangle in its own plane.
///
/// The first vertex is the origin, the x axis follows the first edge and the
/// y axis is `normal x x`. Returns `None` when the area is below
/// `degenerate_area`.
fn project_triangle(p: &[Point3<f64>; 3], degenerate_area: f64) -> Option<([Point2<f64>; 3], f64)> {
    let e1 = p[1] - p[0];
    let e2 = p[2] - p[0];
    let normal = e1.cross(&e2);

    let e1_len = e1.norm();
    let normal_len = normal.norm();
    if e1_len == 0.0 || normal_len == 0.0 {
        return None;
    }

    let x_axis = e1 / e1_len;
    let y_axis = (normal / normal_len).cross(&x_axis);

    let local = [
        Point2::origin(),
        Point2::new(e1_len, 0.0),
        Point2::new(e2.dot(&x_axis), e2.dot(&y_axis)),
    ];

    // Positive by construction: the third vertex lies on the +y side.
    let area = 0.5 * (local[1].x * local[2].y - local[2].x * local[1].y);
    if !area.is_finite() || area.abs() < degenerate_area {
        return None;
    }
    Some((local, area.abs()))
}

/// Vertices on edges used by exactly one face of the island, ascending.
///
/// Faces that repeat a vertex have no edges and are ignored.
fn island_boundary(mesh: &TriMesh, faces: &[FaceId]) -> Vec<VertexId> {
    let mut edge_count: HashMap<(VertexId, VertexId), usize> = HashMap::new();
    for &f in faces.iter().filter(|&&f| !mesh.repeats_vertex(f)) {
        let tri = mesh.face(f);
        for i in 0..3 {
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };
            *edge_count.entry(key).or_insert(0) += 1;
        }
    }

    let boundary: BTreeSet<VertexId> = edge_count
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .flat_map(|((a, b), _)| [a, b])
        .collect();
    boundary.into_iter().collect()
}

/// Choose the two vertices pinned to (0, 0) and (1, 0).
fn select_pins(
    mesh: &TriMesh,
    faces: &[FaceId],
    frame: &LocalFrame,
    search_limit: usize,
) -> [PinnedVertex; 2] {
    let boundary = island_boundary(mesh, faces);

    let (a, b) = if boundary.len() > search_limit.max(2) {
        (boundary[0], boundary[boundary.len() / 2])
    } else if boundary.len() >= 2 {
        farthest_pair(mesh, &boundary)
    } else {
        let origin = frame.global(0);
        let p0 = mesh.position(origin);
        let mut best = frame.global(1);
        let mut best_dist = (mesh.position(best) - p0).norm_squared();
        for &v in &frame.vertices()[2..] {
            let dist = (mesh.position(v) - p0).norm_squared();
            if dist > best_dist {
                best_dist = dist;
                best = v;
            }
        }
        (origin, best)
    };

    [PinnedVertex::new(a, 0.0, 0.0), PinnedVertex::new(b, 1.0, 0.0)]
}

fn farthest_pair(mesh: &TriMesh, vertices: &[VertexId]) -> (VertexId, VertexId) {
    let mut best = (vertices[0], vertices[1]);
    let mut best_dist = (mesh.position(vertices[1]) - mesh.position(vertices[0])).norm_squared();
    for (i, &a) in vertices.iter().enumerate() {
        for &b in &vertices[i + 1..] {
            let dist = (mesh.position(b) - mesh.position(a)).norm_squared();
            if dist > best_dist {
                best_dist = dist;
                best = (a, b);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, primitives};

    fn all_faces(mesh: &TriMesh) -> Vec<FaceId> {
        mesh.face_ids().collect()
    }

    fn signed_area(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
        0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
    }

    #[test]
    fn test_local_frame_first_encountered_order() {
        let mesh = primitives::grid(1, 1).unwrap();
        // Faces are [0, 1, 3] and [0, 3, 2]; walk them in reverse.
        let frame = LocalFrame::new(&mesh, &[FaceId::new(1), FaceId::new(0)]);
        let order: Vec<usize> = frame.vertices().iter().map(|v| v.index()).collect();
        assert_eq!(order, vec![0, 3, 2, 1]);
        assert_eq!(frame.local(VertexId::new(2)), Some(2));
        assert_eq!(frame.global(3), VertexId::new(1));
    }

    #[test]
    fn test_single_triangle() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(0.5, 1.5, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let island = lscm(&mesh, &[FaceId::new(0)], &LSCMOptions::default()).unwrap();

        assert_eq!(island.uvs.len(), 3);
        assert_eq!(island.valid_triangles, 1);
        let area = signed_area(island.uvs[0], island.uvs[1], island.uvs[2]).abs();
        assert!(area > 1e-3, "degenerate UV triangle: {}", area);
        for uv in &island.uvs {
            assert!(uv.x >= -1e-12 && uv.x <= 1.0 + 1e-12);
            assert!(uv.y >= -1e-12 && uv.y <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_pins_are_exact_without_normalization() {
        let mesh = primitives::grid(3, 2).unwrap();
        let options = LSCMOptions::default().with_normalize(false);
        let island = lscm(&mesh, &all_faces(&mesh), &options).unwrap();

        let uv_of = |v: VertexId| island.iter().find(|&(w, _)| w == v).map(|(_, uv)| uv);
        assert_eq!(uv_of(island.pins[0].vertex), Some(Point2::new(0.0, 0.0)));
        assert_eq!(uv_of(island.pins[1].vertex), Some(Point2::new(1.0, 0.0)));
    }

    #[test]
    fn test_flat_quad_is_a_similarity() {
        let mesh = primitives::grid(1, 1).unwrap();
        let island = lscm(&mesh, &all_faces(&mesh), &LSCMOptions::default()).unwrap();

        let mut uv_map = UVMap::zeros(mesh.num_vertices());
        island.write_to(&mut uv_map);

        // Every pairwise distance is scaled by the same factor.
        let p = mesh.positions();
        let ratio = |a: usize, b: usize| {
            (uv_map.get(VertexId::new(a)) - uv_map.get(VertexId::new(b))).norm() / (p[a] - p[b]).norm()
        };
        let reference = ratio(0, 1);
        assert!(reference > 0.1);
        for (a, b) in [(0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
            assert!((ratio(a, b) - reference).abs() < 1e-9);
        }
    }

    #[test]
    fn test_manual_pins() {
        let mesh = primitives::grid(1, 1).unwrap();
        let options = LSCMOptions::with_pins(
            PinnedVertex::new(VertexId::new(0), 0.0, 0.0),
            PinnedVertex::new(VertexId::new(1), 2.0, 0.0),
        )
        .with_normalize(false);
        let uv_map = lscm_mesh(&mesh, &options).unwrap();

        // Vertex 3 sits at (1, 1, 0); the map is a uniform scale by 2.
        let uv = uv_map.get(VertexId::new(3));
        assert!((uv.x - 2.0).abs() < 1e-9);
        assert!((uv.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_manual_pin_outside_island() {
        let mesh = primitives::grid(2, 1).unwrap();
        let options = LSCMOptions::with_pins(
            PinnedVertex::new(VertexId::new(0), 0.0, 0.0),
            PinnedVertex::new(VertexId::new(5), 1.0, 0.0),
        );
        // Faces 0 and 1 only touch vertices 0, 1, 3 and 4.
        let result = lscm(&mesh, &[FaceId::new(0), FaceId::new(1)], &options);
        assert!(matches!(result, Err(MeshError::InvalidState(_))));
    }

    #[test]
    fn test_farthest_boundary_pair() {
        let mesh = primitives::grid(4, 1).unwrap();
        let island = lscm(&mesh, &all_faces(&mesh), &LSCMOptions::default()).unwrap();
        assert_eq!(island.pins[0].vertex, VertexId::new(0));
        assert_eq!(island.pins[1].vertex, VertexId::new(9));
    }

    #[test]
    fn test_large_boundary_uses_first_and_middle() {
        let mesh = primitives::grid(4, 1).unwrap();
        let options = LSCMOptions::default().with_boundary_search_limit(3);
        let island = lscm(&mesh, &all_faces(&mesh), &options).unwrap();
        assert_eq!(island.pins[0].vertex, VertexId::new(0));
        assert_eq!(island.pins[1].vertex, VertexId::new(5));
    }

    #[test]
    fn test_closed_island_pins_farthest_from_first() {
        let mesh = primitives::cube();
        let island = lscm(&mesh, &all_faces(&mesh), &LSCMOptions::default()).unwrap();
        assert_eq!(island.pins[0].vertex, VertexId::new(0));
        assert_eq!(island.pins[1].vertex, VertexId::new(6));
        assert!(island.uvs.iter().all(|uv| uv.x.is_finite() && uv.y.is_finite()));
    }

    #[test]
    fn test_too_small_island() {
        let mesh = primitives::grid(1, 1).unwrap();
        let result = lscm(&mesh, &[], &LSCMOptions::default());
        assert!(matches!(result, Err(MeshError::IslandTooSmall { vertices: 0 })));
    }

    #[test]
    fn test_all_degenerate_triangles() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let result = lscm(&mesh, &[FaceId::new(0)], &LSCMOptions::default());
        assert!(matches!(result, Err(MeshError::NoValidTriangles { faces: 1 })));
    }

    #[test]
    fn test_repeated_vertex_face_is_skipped() {
        let grid = primitives::grid(2, 2).unwrap();
        let mut triangles = grid.triangles().to_vec();
        triangles.push([4, 4, 0]);
        let mesh = build_from_triangles(grid.positions(), &triangles).unwrap();

        let island = lscm(&mesh, &all_faces(&mesh), &LSCMOptions::default()).unwrap();
        assert_eq!(island.valid_triangles, 8);
        assert_eq!(island.pins[0].vertex, VertexId::new(0));
        assert_eq!(island.pins[1].vertex, VertexId::new(8));

        // The center vertex stays interior.
        let boundary = island_boundary(&mesh, &all_faces(&mesh));
        assert_eq!(boundary.len(), 8);
        assert!(!boundary.contains(&VertexId::new(4)));
    }

    #[test]
    fn test_orientation_preserved() {
        let mesh = primitives::grid(3, 3).unwrap();
        let uv_map = lscm_mesh(&mesh, &LSCMOptions::default()).unwrap();
        let uvs = uv_map.as_slice();
        for &[a, b, c] in mesh.triangles() {
            assert!(signed_area(uvs[a], uvs[b], uvs[c]) > 0.0);
        }
    }
}
