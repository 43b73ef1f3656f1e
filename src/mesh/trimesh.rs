//! Indexed triangle mesh.

use nalgebra::{Point3, Vector3};

use super::index::{FaceId, VertexId};
use super::uv::UVMap;
use crate::error::{MeshError, Result};

/// An indexed triangle mesh with optional per-vertex UV coordinates.
///
/// Positions and triangles are immutable once the mesh is built; only the UV
/// array can be replaced. Construction checks that every index is in range.
/// Degenerate triangles, whether they repeat a vertex or merely have (near)
/// zero area, are accepted; algorithms skip them where it matters.
#[derive(Debug, Clone)]
pub struct TriMesh {
    positions: Vec<Point3<f64>>,
    triangles: Vec<[usize; 3]>,
    uvs: Option<UVMap>,
}

impl TriMesh {
    /// Build a mesh from vertex positions and triangle indices.
    ///
    /// # Errors
    ///
    /// - [`MeshError::EmptyMesh`] if `triangles` is empty
    /// - [`MeshError::InvalidVertexIndex`] if an index is out of bounds
    pub fn new(positions: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }

        for (fi, tri) in triangles.iter().enumerate() {
            for &vi in tri {
                if vi >= positions.len() {
                    return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
                }
            }
        }

        Ok(Self::from_raw_parts(positions, triangles))
    }

    /// Build a mesh from data that is valid by construction.
    pub(crate) fn from_raw_parts(positions: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> Self {
        debug_assert!(triangles
            .iter()
            .all(|t| t.iter().all(|&v| v < positions.len())));
        Self {
            positions,
            triangles,
            uvs: None,
        }
    }

    /// Attach UV coordinates, one per vertex.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidState`] if the UV count differs from the
    /// vertex count.
    pub fn with_uvs(mut self, uvs: UVMap) -> Result<Self> {
        self.set_uvs(uvs)?;
        Ok(self)
    }

    /// Replace the UV coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidState`] if the UV count differs from the
    /// vertex count.
    pub fn set_uvs(&mut self, uvs: UVMap) -> Result<()> {
        if uvs.len() != self.positions.len() {
            return Err(MeshError::InvalidState(format!(
                "{} UV coordinates for {} vertices",
                uvs.len(),
                self.positions.len()
            )));
        }
        self.uvs = Some(uvs);
        Ok(())
    }

    /// The UV coordinates, if any have been assigned.
    #[inline]
    pub fn uvs(&self) -> Option<&UVMap> {
        self.uvs.as_ref()
    }

    /// Remove and return the UV coordinates.
    pub fn take_uvs(&mut self) -> Option<UVMap> {
        self.uvs.take()
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.triangles.len()
    }

    /// All vertex positions.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// All triangles as raw vertex indices.
    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// Get the three vertices of a triangle.
    #[inline]
    pub fn face(&self, f: FaceId) -> [VertexId; 3] {
        let [a, b, c] = self.triangles[f.index()];
        [VertexId::new(a), VertexId::new(b), VertexId::new(c)]
    }

    /// Whether a triangle references the same vertex more than once.
    #[inline]
    pub fn repeats_vertex(&self, f: FaceId) -> bool {
        let [a, b, c] = self.triangles[f.index()];
        a == b || b == c || a == c
    }

    /// Get the positions of the three vertices of a triangle.
    pub fn face_positions(&self, f: FaceId) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangles[f.index()];
        [self.positions[a], self.positions[b], self.positions[c]]
    }

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.positions.len()).map(VertexId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.triangles.len()).map(FaceId::new)
    }

    // ==================== Geometry ====================

    /// Compute the unit normal of a triangle (zero for degenerate triangles).
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0)
            .cross(&(p2 - p0))
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the area of a triangle.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;

        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        Some((min, max))
    }
}

/// Build a triangle mesh from borrowed vertex and face lists.
///
/// # Example
/// ```
/// use unfold::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<TriMesh> {
    TriMesh::new(vertices.to_vec(), faces.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn single_triangle() -> TriMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let result = TriMesh::new(vec![Point3::origin()], Vec::new());
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_index_rejected() {
        let vertices = vec![Point3::origin(); 3];
        let result = build_from_triangles(&vertices, &[[0, 1, 3]]);
        match result {
            Err(MeshError::InvalidVertexIndex { face, vertex }) => {
                assert_eq!(face, 0);
                assert_eq!(vertex, 3);
            }
            other => panic!("expected InvalidVertexIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_index_accepted() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2], [1, 1, 2]]).unwrap();
        assert_eq!(mesh.num_faces(), 2);
        assert!(!mesh.repeats_vertex(FaceId::new(0)));
        assert!(mesh.repeats_vertex(FaceId::new(1)));
        assert_eq!(mesh.face_area(FaceId::new(1)), 0.0);
    }

    #[test]
    fn test_zero_area_triangle_accepted() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let f = FaceId::new(0);
        assert_eq!(mesh.face_area(f), 0.0);
        assert_eq!(mesh.face_normal(f), Vector3::zeros());
    }

    #[test]
    fn test_geometry() {
        let mesh = single_triangle();
        let f = FaceId::new(0);
        assert!((mesh.face_area(f) - 0.5).abs() < 1e-12);
        assert!((mesh.face_normal(f).z - 1.0).abs() < 1e-12);
        assert_eq!(mesh.face(f), [VertexId::new(0), VertexId::new(1), VertexId::new(2)]);

        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_uv_length_checked() {
        let mesh = single_triangle();
        assert!(mesh.clone().with_uvs(UVMap::zeros(2)).is_err());

        let mesh = mesh
            .with_uvs(UVMap::new(vec![Point2::new(0.5, 0.5); 3]))
            .unwrap();
        assert_eq!(mesh.uvs().unwrap().len(), 3);
    }
}
