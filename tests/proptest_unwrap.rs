//! Property-based tests for the unwrapping pipeline.
//!
//! Random height fields and unions of them are unwrapped and checked for the
//! pipeline's structural guarantees.

use nalgebra::{Point3, Vector3};
use proptest::prelude::*;

use unfold::mesh::primitives;
use unfold::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// A grid with random heights, so the surface is not planar.
fn arb_height_field() -> impl Strategy<Value = TriMesh> {
    (1usize..6, 1usize..6).prop_flat_map(|(nx, ny)| {
        prop::collection::vec(-0.5..0.5f64, (nx + 1) * (ny + 1)).prop_map(move |heights| {
            let grid = primitives::grid(nx, ny).unwrap();
            let positions: Vec<Point3<f64>> = grid
                .positions()
                .iter()
                .zip(&heights)
                .map(|(p, &h)| Point3::new(p.x, p.y, h))
                .collect();
            build_from_triangles(&positions, grid.triangles()).unwrap()
        })
    })
}

/// Between one and four height fields placed side by side.
fn arb_union() -> impl Strategy<Value = (TriMesh, usize)> {
    prop::collection::vec(arb_height_field(), 1..5).prop_map(|parts| {
        let count = parts.len();
        let placed: Vec<_> = parts
            .into_iter()
            .enumerate()
            .map(|(i, m)| (m, Vector3::new(10.0 * i as f64, 0.0, 0.0)))
            .collect();
        (primitives::disjoint_union(&placed).unwrap(), count)
    })
}

fn options() -> UnwrapOptions {
    UnwrapOptions::default()
        .with_min_island_faces(1)
        .with_coverage(unfold::algo::metrics::CoverageOptions::default().with_resolution(32))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every UV lies in the unit square after packing.
    #[test]
    fn proptest_uvs_in_unit_square((mesh, _) in arb_union()) {
        let (out, result) = unwrap(&mesh, &options()).unwrap();
        prop_assert!(result.failed_islands.is_empty());
        for (_, uv) in out.uvs().unwrap().iter() {
            prop_assert!(uv.x >= -1e-9 && uv.x <= 1.0 + 1e-9, "u = {}", uv.x);
            prop_assert!(uv.y >= -1e-9 && uv.y <= 1.0 + 1e-9, "v = {}", uv.y);
        }
    }

    /// Seams never split a connected part, so each part is one island.
    #[test]
    fn proptest_one_island_per_part((mesh, parts) in arb_union()) {
        let (_, result) = unwrap(&mesh, &options()).unwrap();
        prop_assert_eq!(result.num_islands, parts);
        prop_assert_eq!(result.face_island_ids.len(), mesh.num_faces());
        prop_assert!(result.face_island_ids.iter().all(|id| id.index() < parts));
    }

    /// Parallel and sequential runs produce identical coordinates.
    #[test]
    fn proptest_parallel_is_deterministic((mesh, _) in arb_union()) {
        let (a, _) = unwrap(&mesh, &options()).unwrap();
        let (b, _) = unwrap(&mesh, &options().sequential()).unwrap();
        prop_assert_eq!(a.uvs(), b.uvs());
    }

    /// Seams are always interior edges.
    #[test]
    fn proptest_seams_are_interior(mesh in arb_height_field()) {
        let topo = build_topology(&mesh).unwrap();
        let seams = detect_seams(&topo);
        prop_assert!(seams.len() <= seams.num_candidates());
        for e in seams.iter() {
            prop_assert!(topo.edge(e).is_interior());
        }
    }
}
