//! Edge topology derived from triangle data.
//!
//! The unwrapping stages need to know which triangles share an edge. This
//! module turns the raw triangle list of a [`TriMesh`] into a list of unique
//! undirected edges, each carrying its one or two incident faces.
//!
//! Edges are deduplicated through an ordered map keyed by the canonical
//! `(min, max)` vertex pair, so edge ids follow the lexicographic order of
//! that pair and do not depend on triangle winding.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, FaceId, TriMesh, VertexId};

/// An undirected mesh edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Lower endpoint.
    pub v0: VertexId,
    /// Higher endpoint.
    pub v1: VertexId,
    /// First face that referenced the edge.
    pub face0: FaceId,
    /// Second face, or `None` on the boundary.
    pub face1: Option<FaceId>,
}

impl Edge {
    /// Whether the edge has a single incident face.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.face1.is_none()
    }

    /// Whether the edge is shared by two faces.
    #[inline]
    pub fn is_interior(&self) -> bool {
        self.face1.is_some()
    }

    /// Both incident faces of an interior edge.
    #[inline]
    pub fn faces(&self) -> Option<(FaceId, FaceId)> {
        self.face1.map(|f1| (self.face0, f1))
    }
}

/// Edge adjacency of a triangle mesh.
#[derive(Debug, Clone)]
pub struct Topology {
    edges: Vec<Edge>,
    num_vertices: usize,
    num_faces: usize,
    degenerate_faces: usize,
    non_manifold_edges: usize,
}

/// Summary produced by [`Topology::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyReport {
    /// Vertex count.
    pub vertices: usize,
    /// Unique edge count.
    pub edges: usize,
    /// Face count.
    pub faces: usize,
    /// Faces that repeat a vertex and therefore have no edges.
    pub degenerate_faces: usize,
    /// `V - E + F`, counting only faces with three distinct vertices.
    pub euler_characteristic: i64,
    /// Edges with a single incident face.
    pub boundary_edges: usize,
    /// Edges referenced by more than two faces.
    pub non_manifold_edges: usize,
    /// Whether the Euler characteristic equals 2.
    pub is_sphere_like: bool,
}

impl Topology {
    /// Number of unique edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of vertices of the source mesh.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Number of faces of the source mesh.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.num_faces
    }

    /// Number of faces skipped because they repeat a vertex.
    #[inline]
    pub fn degenerate_faces(&self) -> usize {
        self.degenerate_faces
    }

    /// Number of edges that were referenced by more than two faces.
    #[inline]
    pub fn non_manifold_edges(&self) -> usize {
        self.non_manifold_edges
    }

    /// All edges, ordered by their canonical vertex pair.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get an edge by id.
    #[inline]
    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e.index()]
    }

    /// Iterate over all edge ids.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Iterate over the ids of edges shared by two faces.
    pub fn interior_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edge_ids().filter(|&e| self.edge(e).is_interior())
    }

    /// Find the edge between two vertices, in either order.
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.edges
            .binary_search_by(|e| (e.v0, e.v1).cmp(&key))
            .ok()
            .map(EdgeId::new)
    }

    /// Number of boundary edges.
    pub fn boundary_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_boundary()).count()
    }

    /// Whether the mesh has no boundary edges.
    pub fn is_closed(&self) -> bool {
        self.edges.iter().all(Edge::is_interior)
    }

    /// Compute `V - E + F`. Faces that repeat a vertex are not counted.
    pub fn euler_characteristic(&self) -> i64 {
        let faces = self.num_faces - self.degenerate_faces;
        self.num_vertices as i64 - self.edges.len() as i64 + faces as i64
    }

    /// Number of edges incident to each vertex, indexed by vertex.
    pub fn vertex_degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.num_vertices];
        for edge in &self.edges {
            degrees[edge.v0.index()] += 1;
            degrees[edge.v1.index()] += 1;
        }
        degrees
    }

    /// Check the Euler characteristic and summarize the topology.
    ///
    /// A closed genus-0 manifold has `V - E + F == 2`. Any other value is
    /// logged as a warning; open meshes are expected to trigger it and are
    /// still fully supported.
    pub fn validate(&self) -> TopologyReport {
        let euler = self.euler_characteristic();
        let report = TopologyReport {
            vertices: self.num_vertices,
            edges: self.edges.len(),
            faces: self.num_faces,
            degenerate_faces: self.degenerate_faces,
            euler_characteristic: euler,
            boundary_edges: self.boundary_edge_count(),
            non_manifold_edges: self.non_manifold_edges,
            is_sphere_like: euler == 2,
        };

        if !report.is_sphere_like {
            warn!(
                "Euler characteristic is {} (V={}, E={}, F={}), expected 2 for a closed genus-0 mesh",
                euler, report.vertices, report.edges, report.faces
            );
        }

        report
    }
}

/// Build the edge topology of a mesh.
///
/// Every triangle contributes the edges `(v0, v1)`, `(v1, v2)` and
/// `(v2, v0)`. The first face to reference an edge becomes `face0`, the second
/// `face1`. Further references mark the edge as non-manifold; it keeps its
/// first two faces.
///
/// A triangle that repeats a vertex contributes no edges. It stays in the
/// face count, so later stages see it as an isolated face.
///
/// # Errors
///
/// Returns [`MeshError::EmptyMesh`] if the mesh has no faces.
pub fn build_topology(mesh: &TriMesh) -> Result<Topology> {
    if mesh.num_faces() == 0 {
        return Err(MeshError::EmptyMesh);
    }

    // (face0, face1, occurrences)
    let mut edge_map: BTreeMap<(usize, usize), (usize, Option<usize>, usize)> = BTreeMap::new();
    let mut degenerate_faces = 0;

    for (fi, tri) in mesh.triangles().iter().enumerate() {
        if mesh.repeats_vertex(FaceId::new(fi)) {
            degenerate_faces += 1;
            debug!("face {} repeats a vertex: {:?}", fi, tri);
            continue;
        }
        for i in 0..3 {
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };

            let entry = edge_map.entry(key).or_insert((fi, None, 0));
            entry.2 += 1;
            if entry.2 == 2 {
                entry.1 = Some(fi);
            }
        }
    }

    let mut non_manifold_edges = 0;
    let edges: Vec<Edge> = edge_map
        .into_iter()
        .map(|((a, b), (f0, f1, count))| {
            if count > 2 {
                non_manifold_edges += 1;
                debug!("edge ({}, {}) is shared by {} faces", a, b, count);
            }
            Edge {
                v0: VertexId::new(a),
                v1: VertexId::new(b),
                face0: FaceId::new(f0),
                face1: f1.map(FaceId::new),
            }
        })
        .collect();

    if degenerate_faces > 0 {
        warn!(
            "mesh has {} faces with repeated vertices; they are left out of the topology",
            degenerate_faces
        );
    }

    if non_manifold_edges > 0 {
        warn!(
            "mesh has {} non-manifold edges; unwrapping results may be unreliable",
            non_manifold_edges
        );
    }

    debug!(
        "built topology: {} vertices, {} edges, {} faces",
        mesh.num_vertices(),
        edges.len(),
        mesh.num_faces()
    );

    Ok(Topology {
        edges,
        num_vertices: mesh.num_vertices(),
        num_faces: mesh.num_faces(),
        degenerate_faces,
        non_manifold_edges,
    })
}
