//! Core mesh data structures.
//!
//! This module provides the indexed triangle mesh consumed and produced by the
//! unwrapping pipeline, its per-vertex UV storage, and a few procedural shapes.
//!
//! # Overview
//!
//! The primary type is [`TriMesh`]: an ordered list of vertex positions, an
//! ordered list of triangles and an optional [`UVMap`]. Adjacency is not
//! stored on the mesh; the pipeline derives it once with
//! [`build_topology`](crate::algo::topology::build_topology).
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`FaceId`] - Identifies a triangle
//! - [`EdgeId`] - Identifies an undirected edge of a topology
//! - [`IslandId`] - Identifies a UV island
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use unfold::mesh::{build_from_triangles, TriMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: TriMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert!(mesh.uvs().is_none());
//! ```

mod index;
pub mod primitives;
mod trimesh;
mod uv;

pub use index::{EdgeId, FaceId, IslandId, MeshIndex, VertexId};
pub use trimesh::{build_from_triangles, TriMesh};
pub use uv::{normalize_to_unit_square, UVMap, MIN_EXTENT};
