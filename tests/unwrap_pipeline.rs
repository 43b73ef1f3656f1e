//! End-to-end tests of the unwrapping pipeline through the public API.

use nalgebra::{Point2, Point3, Vector3};
use tempfile::tempdir;

use unfold::algo::metrics::{compute_metrics, CoverageOptions};
use unfold::algo::parameterize::{lscm, LSCMOptions};
use unfold::algo::seams::SeamSet;
use unfold::io;
use unfold::mesh::{normalize_to_unit_square, primitives};
use unfold::prelude::*;

fn assert_in_unit_square(uvs: &UVMap, tolerance: f64) {
    for (v, uv) in uvs.iter() {
        assert!(
            uv.x >= -tolerance && uv.x <= 1.0 + tolerance && uv.y >= -tolerance && uv.y <= 1.0 + tolerance,
            "{:?} at {:?} is outside the unit square",
            v,
            uv
        );
    }
}

// =============================================================================
// Topology
// =============================================================================

#[test]
fn cube_topology_counts() {
    let cube = primitives::cube();
    let topo = build_topology(&cube).unwrap();
    let report = topo.validate();

    assert_eq!(report.vertices, 8);
    assert_eq!(report.faces, 12);
    assert_eq!(report.edges, 18);
    assert_eq!(report.euler_characteristic, 2);
    assert!(report.is_sphere_like);
    assert_eq!(report.boundary_edges, 0);
}

#[test]
fn icosphere_topology_counts() {
    let sphere = primitives::icosphere(1);
    let topo = build_topology(&sphere).unwrap();

    assert_eq!(topo.num_vertices(), 42);
    assert_eq!(topo.num_edges(), 120);
    assert_eq!(topo.num_faces(), 80);
    assert!(topo.is_closed());
}

#[test]
fn edges_do_not_depend_on_winding() {
    let cube = primitives::cube();
    let flipped_triangles: Vec<[usize; 3]> = cube.triangles().iter().map(|&[a, b, c]| [a, c, b]).collect();
    let flipped = build_from_triangles(cube.positions(), &flipped_triangles).unwrap();

    let a = build_topology(&cube).unwrap();
    let b = build_topology(&flipped).unwrap();
    let endpoints = |t: &Topology| t.edges().iter().map(|e| (e.v0, e.v1)).collect::<Vec<_>>();

    assert_eq!(endpoints(&a), endpoints(&b));
    assert!(a.edges().iter().all(|e| e.v0 < e.v1));
}

// =============================================================================
// Seams and islands
// =============================================================================

#[test]
fn seam_counts_by_shape() {
    let cube = build_topology(&primitives::cube()).unwrap();
    let cube_seams = detect_seams(&cube).len();
    assert!((7..=11).contains(&cube_seams), "cube seams: {}", cube_seams);

    let sphere = build_topology(&primitives::icosphere(1)).unwrap();
    let sphere_seams = detect_seams(&sphere).len();
    assert!((1..=5).contains(&sphere_seams), "sphere seams: {}", sphere_seams);

    let cylinder = build_topology(&primitives::open_cylinder(8, 2, 1.0, 1.0).unwrap()).unwrap();
    let cylinder_seams = detect_seams(&cylinder).len();
    assert!((1..=3).contains(&cylinder_seams), "cylinder seams: {}", cylinder_seams);
}

#[test]
fn islands_partition_faces() {
    let mesh = primitives::grid(3, 2).unwrap();
    let topo = build_topology(&mesh).unwrap();

    let none = extract_islands(&topo, &SeamSet::new());
    assert_eq!(none.num_islands(), 1);

    // Cutting every interior edge isolates each face.
    let all: SeamSet = topo.interior_edges().collect();
    let islands = extract_islands(&topo, &all);
    assert_eq!(islands.num_islands(), mesh.num_faces());

    let mut seen = vec![false; mesh.num_faces()];
    for group in islands.groups() {
        for f in group {
            assert!(!seen[f.index()], "face {:?} in two islands", f);
            seen[f.index()] = true;
        }
    }
    assert!(seen.iter().all(|&s| s));
}

// =============================================================================
// Parameterization
// =============================================================================

#[test]
fn pins_land_exactly_before_normalization() {
    let mesh = primitives::grid(4, 1).unwrap();
    let faces: Vec<FaceId> = mesh.face_ids().collect();
    let options = LSCMOptions::default().with_normalize(false);
    let island = lscm(&mesh, &faces, &options).unwrap();

    let uv_of = |v: VertexId| {
        island
            .iter()
            .find(|&(w, _)| w == v)
            .map(|(_, uv)| uv)
            .unwrap()
    };
    assert_eq!(uv_of(island.pins[0].vertex), Point2::new(0.0, 0.0));
    assert_eq!(uv_of(island.pins[1].vertex), Point2::new(1.0, 0.0));
}

#[test]
fn single_triangle_stays_a_triangle() {
    let mesh = build_from_triangles(
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(0.5, 1.5, 0.0),
        ],
        &[[0, 1, 2]],
    )
    .unwrap();
    let island = lscm(&mesh, &[FaceId::new(0)], &LSCMOptions::default()).unwrap();

    let [a, b, c] = [island.uvs[0], island.uvs[1], island.uvs[2]];
    let area = ((b - a).x * (c - a).y - (b - a).y * (c - a).x) / 2.0;
    assert!(area.abs() > 1e-3, "area {}", area);
}

#[test]
fn normalization_is_idempotent() {
    let mut coords = vec![
        Point2::new(-3.0, 2.0),
        Point2::new(5.0, 2.5),
        Point2::new(1.0, -4.0),
    ];
    normalize_to_unit_square(&mut coords);
    let once = coords.clone();
    normalize_to_unit_square(&mut coords);

    for (a, b) in once.iter().zip(&coords) {
        assert!((a - b).norm() < 1e-12);
    }
}

#[test]
fn flat_quad_has_unit_stretch() {
    let quad = primitives::grid(1, 1).unwrap();
    let options = UnwrapOptions::default().with_min_island_faces(1);
    let (out, result) = unwrap(&quad, &options).unwrap();

    assert!((result.metrics.avg_stretch - 1.0).abs() < 1e-6);
    assert!((result.metrics.max_stretch - 1.0).abs() < 1e-6);
    // The pins sit on the diagonal, so the square comes out as a diamond.
    assert!((result.metrics.coverage - 0.5).abs() < 0.05, "coverage {}", result.metrics.coverage);

    let recomputed = compute_metrics(&out, out.uvs().unwrap(), &CoverageOptions::default());
    assert_eq!(recomputed, result.metrics);
}

// =============================================================================
// Pipeline
// =============================================================================

#[test]
fn packed_islands_do_not_overlap() {
    let margin = 0.05;
    let mesh = primitives::disjoint_union(&[
        (primitives::cube(), Vector3::zeros()),
        (primitives::grid(4, 2).unwrap(), Vector3::new(5.0, 0.0, 0.0)),
        (primitives::open_cylinder(8, 2, 1.0, 1.0).unwrap(), Vector3::new(0.0, 5.0, 0.0)),
    ])
    .unwrap();

    let options = UnwrapOptions::default().with_island_margin(margin);
    let (out, result) = unwrap(&mesh, &options).unwrap();
    assert_eq!(result.num_islands, 3);
    assert_eq!(result.num_parameterized(), 3);
    assert_in_unit_square(out.uvs().unwrap(), 1e-9);

    let layout = result.layout.unwrap();
    let gap = margin * layout.scale - 1e-9;
    let bounds: Vec<_> = (0..3)
        .map(|i| layout.final_bounds(IslandId::new(i)).unwrap())
        .collect();
    for i in 0..3 {
        for j in (i + 1)..3 {
            let ((amin, amax), (bmin, bmax)) = (bounds[i], bounds[j]);
            let separated = bmin.x - amax.x >= gap
                || amin.x - bmax.x >= gap
                || bmin.y - amax.y >= gap
                || amin.y - bmax.y >= gap;
            assert!(separated, "islands {} and {} overlap", i, j);
        }
    }
}

#[test]
fn unpacked_islands_share_the_unit_square() {
    let mesh = primitives::disjoint_union(&[
        (primitives::grid(2, 2).unwrap(), Vector3::zeros()),
        (primitives::grid(3, 3).unwrap(), Vector3::new(5.0, 0.0, 0.0)),
    ])
    .unwrap();

    let (out, result) = unwrap(&mesh, &UnwrapOptions::default().with_packing(false)).unwrap();
    assert!(result.layout.is_none());
    assert_in_unit_square(out.uvs().unwrap(), 1e-9);
}

#[test]
fn unwrapped_mesh_survives_obj_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sphere.obj");

    let (unwrapped, _) = unwrap(&primitives::icosphere(1), &UnwrapOptions::default()).unwrap();
    io::save(&unwrapped, &path).unwrap();

    let loaded = io::load(&path).unwrap();
    assert_eq!(loaded.num_faces(), unwrapped.num_faces());
    assert_in_unit_square(loaded.uvs().unwrap(), 1e-6);
}
