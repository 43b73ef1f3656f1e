//! Procedural test meshes.
//!
//! Small, well-known shapes with outward-facing counter-clockwise winding.
//! They are used by the tests and benchmarks and are handy for trying the
//! pipeline without any mesh files.

use std::collections::HashMap;
use std::f64::consts::TAU;

use nalgebra::{Point3, Vector3};

use super::trimesh::TriMesh;
use crate::error::{MeshError, Result};

/// Axis-aligned unit cube: 8 vertices, 12 triangles, 18 edges.
pub fn cube() -> TriMesh {
    let positions = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let triangles = vec![
        [0, 2, 1], // bottom
        [0, 3, 2],
        [4, 5, 6], // top
        [4, 6, 7],
        [0, 1, 5], // front
        [0, 5, 4],
        [3, 7, 6], // back
        [3, 6, 2],
        [0, 4, 7], // left
        [0, 7, 3],
        [1, 2, 6], // right
        [1, 6, 5],
    ];
    TriMesh::from_raw_parts(positions, triangles)
}

/// Unit icosphere.
///
/// `subdivisions = 0` is the icosahedron (12 vertices, 20 faces); each level
/// splits every triangle in four, so level 1 has 42 vertices and 80 faces.
pub fn icosphere(subdivisions: usize) -> TriMesh {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let mut positions: Vec<Point3<f64>> = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|&[x, y, z]| Point3::from(Vector3::new(x, y, z).normalize()))
    .collect();

    let mut triangles: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut next = Vec::with_capacity(triangles.len() * 4);

        let mut midpoint = |a: usize, b: usize, positions: &mut Vec<Point3<f64>>| -> usize {
            let key = if a < b { (a, b) } else { (b, a) };
            *midpoints.entry(key).or_insert_with(|| {
                let mid = (positions[a].coords + positions[b].coords).normalize();
                positions.push(Point3::from(mid));
                positions.len() - 1
            })
        };

        for &[a, b, c] in &triangles {
            let ab = midpoint(a, b, &mut positions);
            let bc = midpoint(b, c, &mut positions);
            let ca = midpoint(c, a, &mut positions);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        triangles = next;
    }

    TriMesh::from_raw_parts(positions, triangles)
}

/// Open cylinder (a tube without caps) around the z axis.
///
/// The tube has `segments` vertices per ring and `rings` bands of quads,
/// each split into two triangles.
///
/// # Errors
///
/// Returns [`MeshError::InvalidParameter`] if `segments < 3` or `rings == 0`.
pub fn open_cylinder(segments: usize, rings: usize, radius: f64, height: f64) -> Result<TriMesh> {
    if segments < 3 {
        return Err(MeshError::invalid_param("segments", segments, "must be at least 3"));
    }
    if rings == 0 {
        return Err(MeshError::invalid_param("rings", rings, "must be at least 1"));
    }

    let mut positions = Vec::with_capacity((rings + 1) * segments);
    for r in 0..=rings {
        let z = height * r as f64 / rings as f64;
        for s in 0..segments {
            let theta = TAU * s as f64 / segments as f64;
            positions.push(Point3::new(radius * theta.cos(), radius * theta.sin(), z));
        }
    }

    let mut triangles = Vec::with_capacity(2 * segments * rings);
    for r in 0..rings {
        for s in 0..segments {
            let a = r * segments + s;
            let b = r * segments + (s + 1) % segments;
            let c = (r + 1) * segments + (s + 1) % segments;
            let d = (r + 1) * segments + s;
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }

    Ok(TriMesh::from_raw_parts(positions, triangles))
}

/// Flat `nx` x `ny` grid of unit cells in the z = 0 plane.
///
/// # Errors
///
/// Returns [`MeshError::InvalidParameter`] if either dimension is zero.
pub fn grid(nx: usize, ny: usize) -> Result<TriMesh> {
    if nx == 0 || ny == 0 {
        return Err(MeshError::invalid_param(
            "grid size",
            format!("{}x{}", nx, ny),
            "both dimensions must be positive",
        ));
    }

    let mut positions = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            positions.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    let mut triangles = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let v00 = j * (nx + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (nx + 1);
            let v11 = v01 + 1;
            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }

    Ok(TriMesh::from_raw_parts(positions, triangles))
}

/// Combine several meshes into one, translating each part by its offset.
///
/// The parts stay disconnected, which makes this the simplest way to build
/// a multi-island input.
///
/// # Errors
///
/// Returns [`MeshError::EmptyMesh`] if `parts` is empty.
pub fn disjoint_union(parts: &[(TriMesh, Vector3<f64>)]) -> Result<TriMesh> {
    if parts.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let mut positions = Vec::new();
    let mut triangles = Vec::new();
    for (part, offset) in parts {
        let base = positions.len();
        positions.extend(part.positions().iter().map(|p| p + offset));
        triangles.extend(
            part.triangles()
                .iter()
                .map(|&[a, b, c]| [a + base, b + base, c + base]),
        );
    }

    Ok(TriMesh::from_raw_parts(positions, triangles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    #[test]
    fn test_cube_counts_and_orientation() {
        let mesh = cube();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_faces(), 12);
        assert!((mesh.surface_area() - 6.0).abs() < 1e-12);

        // Every normal points away from the center.
        let center = Point3::new(0.5, 0.5, 0.5);
        for f in mesh.face_ids() {
            let [p0, p1, p2] = mesh.face_positions(f);
            let centroid = Point3::from((p0.coords + p1.coords + p2.coords) / 3.0);
            assert!(mesh.face_normal(f).dot(&(centroid - center)) > 0.0);
        }
    }

    #[test]
    fn test_icosphere_counts() {
        let ico = icosphere(0);
        assert_eq!(ico.num_vertices(), 12);
        assert_eq!(ico.num_faces(), 20);

        let sphere = icosphere(1);
        assert_eq!(sphere.num_vertices(), 42);
        assert_eq!(sphere.num_faces(), 80);
        for p in sphere.positions() {
            assert!((p.coords.norm() - 1.0).abs() < 1e-12);
        }
        for f in sphere.face_ids() {
            let [p0, ..] = sphere.face_positions(f);
            assert!(sphere.face_normal(f).dot(&p0.coords) > 0.0);
        }
    }

    #[test]
    fn test_cylinder() {
        let mesh = open_cylinder(8, 2, 1.0, 2.0).unwrap();
        assert_eq!(mesh.num_vertices(), 24);
        assert_eq!(mesh.num_faces(), 32);
        assert!(open_cylinder(2, 1, 1.0, 1.0).is_err());
        assert!(open_cylinder(8, 0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_grid() {
        let mesh = grid(3, 2).unwrap();
        assert_eq!(mesh.num_vertices(), 12);
        assert_eq!(mesh.num_faces(), 12);
        assert!((mesh.surface_area() - 6.0).abs() < 1e-12);
        assert!(grid(0, 4).is_err());
    }

    #[test]
    fn test_disjoint_union_offsets_indices() {
        let a = grid(1, 1).unwrap();
        let b = grid(1, 1).unwrap();
        let mesh = disjoint_union(&[(a, Vector3::zeros()), (b, Vector3::new(5.0, 0.0, 0.0))])
            .unwrap();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.triangles()[2], [4, 5, 7]);
        assert_eq!(mesh.face_positions(FaceId::new(2))[0], Point3::new(5.0, 0.0, 0.0));
    }
}
