//! # Unfold
//!
//! Automatic UV unwrapping for triangle meshes.
//!
//! Unfold takes an indexed triangle mesh and produces one texture coordinate
//! per vertex, laid out in the unit square:
//!
//! - **Topology**: unique undirected edges with their incident faces
//! - **Seam detection**: spanning-tree based selection of cut edges
//! - **Island extraction**: connected face groups between seams
//! - **LSCM**: least squares conformal maps with a sparse Cholesky solve
//! - **Packing**: shelf packing of islands with a configurable margin
//! - **Metrics**: stretch, coverage and angle distortion of the result
//!
//! ## Quick Start
//!
//! ```no_run
//! use unfold::prelude::*;
//!
//! let mesh = unfold::io::load("model.obj").unwrap();
//! let (unwrapped, result) = unwrap(&mesh, &UnwrapOptions::default()).unwrap();
//!
//! println!("Islands: {}", result.num_islands);
//! println!("Max stretch: {:.3}", result.metrics.max_stretch);
//!
//! unfold::io::save(&unwrapped, "unwrapped.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use unfold::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! let topology = build_topology(&mesh).unwrap();
//! assert_eq!(topology.num_edges(), 6);
//! assert!(topology.is_closed());
//! ```
//!
//! ## Running Stages Separately
//!
//! ```
//! use unfold::prelude::*;
//! use unfold::algo::parameterize::lscm;
//!
//! let mesh = unfold::mesh::primitives::icosphere(1);
//! let topology = build_topology(&mesh).unwrap();
//! let seams = detect_seams(&topology);
//! let islands = extract_islands(&topology, &seams);
//!
//! for faces in islands.groups() {
//!     let island = lscm(&mesh, &faces, &LSCMOptions::default()).unwrap();
//!     assert_eq!(island.uvs.len(), island.vertices.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use unfold::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::islands::{extract_islands, Islands};
    pub use crate::algo::parameterize::{LSCMOptions, PinStrategy, PinnedVertex};
    pub use crate::algo::seams::{detect_seams, DegreePolicy, SeamPolicy, SeamSet};
    pub use crate::algo::topology::{build_topology, Topology};
    pub use crate::algo::unwrap::{unwrap, UnwrapOptions, UnwrapResult};
    pub use crate::algo::Progress;
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, EdgeId, FaceId, IslandId, MeshIndex, TriMesh, UVMap, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];

        let faces = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];

        let mesh = build_from_triangles(&vertices, &faces).unwrap();
        let topology = build_topology(&mesh).unwrap();

        assert_eq!(topology.num_vertices(), 4);
        assert_eq!(topology.num_edges(), 6);
        assert_eq!(topology.euler_characteristic(), 2);
        assert!(topology.edges().iter().all(|e| e.is_interior()));

        // Four faces need three tree edges; every other edge is a candidate.
        let seams = detect_seams(&topology);
        assert_eq!(seams.num_candidates(), 3);
        assert_eq!(extract_islands(&topology, &seams).num_islands(), 1);
    }
}
