//! UV island extraction.
//!
//! An island is a maximal set of faces connected through interior edges that
//! are not seams. Islands partition the face set; ids are assigned in the
//! order a breadth-first search discovers them, starting from the lowest
//! unvisited face.

use log::debug;

use super::seams::{DualGraph, SeamSet};
use super::topology::Topology;
use crate::mesh::{FaceId, IslandId};

/// Partition of the faces of a mesh into islands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Islands {
    face_island: Vec<IslandId>,
    num_islands: usize,
}

impl Islands {
    /// Number of islands.
    #[inline]
    pub fn num_islands(&self) -> usize {
        self.num_islands
    }

    /// Island containing a face.
    #[inline]
    pub fn island_of(&self, f: FaceId) -> IslandId {
        self.face_island[f.index()]
    }

    /// Island id of every face, indexed by face.
    #[inline]
    pub fn face_island_ids(&self) -> &[IslandId] {
        &self.face_island
    }

    /// Consume the partition, returning the per-face island ids.
    pub fn into_face_island_ids(self) -> Vec<IslandId> {
        self.face_island
    }

    /// Iterate over all island ids.
    pub fn island_ids(&self) -> impl Iterator<Item = IslandId> {
        (0..self.num_islands).map(IslandId::new)
    }

    /// Faces of every island in ascending face order, indexed by island.
    pub fn groups(&self) -> Vec<Vec<FaceId>> {
        let mut groups = vec![Vec::new(); self.num_islands];
        for (fi, island) in self.face_island.iter().enumerate() {
            groups[island.index()].push(FaceId::new(fi));
        }
        groups
    }

    /// Faces of a single island in ascending order.
    pub fn faces_of(&self, island: IslandId) -> Vec<FaceId> {
        self.face_island
            .iter()
            .enumerate()
            .filter(|&(_, &id)| id == island)
            .map(|(fi, _)| FaceId::new(fi))
            .collect()
    }

    /// Face count of every island, indexed by island.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.num_islands];
        for island in &self.face_island {
            sizes[island.index()] += 1;
        }
        sizes
    }
}

/// Split the faces into islands along the given seams.
///
/// Two faces share an island if and only if a path of interior, non-seam
/// edges connects them.
pub fn extract_islands(topo: &Topology, seams: &SeamSet) -> Islands {
    let graph = DualGraph::with_filter(topo, |e| !seams.contains(e));
    let forest = graph.spanning_forest(topo.num_edges());

    debug!(
        "extracted {} islands from {} faces ({} seams)",
        forest.num_components,
        topo.num_faces(),
        seams.len()
    );

    Islands {
        face_island: forest.component.into_iter().map(IslandId::new).collect(),
        num_islands: forest.num_components,
    }
}
