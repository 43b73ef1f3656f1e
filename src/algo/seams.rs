//! Seam detection.
//!
//! Seams are interior edges along which the surface is cut before flattening.
//! Detection works on the dual graph (faces as nodes, shared edges as links):
//!
//! 1. A breadth-first spanning forest of the dual graph is built. Cutting
//!    only edges outside the forest never disconnects a component.
//! 2. Every interior edge outside the forest is a seam candidate.
//! 3. A [`SeamPolicy`] scores the candidates and decides how many to keep.
//!    Candidates are sorted by ascending priority (stable) and the cheapest
//!    prefix becomes the seam set.
//!
//! Keeping every candidate (see [`SpanningTreePolicy`]) is the pure
//! spanning-tree cut. The default [`DegreePolicy`] keeps far fewer so small
//! meshes are not shattered into slivers.
//!
//! # Example
//!
//! ```
//! use unfold::algo::seams::detect_seams;
//! use unfold::algo::topology::build_topology;
//! use unfold::mesh::primitives;
//!
//! let topo = build_topology(&primitives::cube()).unwrap();
//! let seams = detect_seams(&topo);
//! assert_eq!(seams.len(), 7);
//! ```

use std::collections::{BTreeSet, VecDeque};

use log::debug;

use super::topology::Topology;
use crate::mesh::{EdgeId, FaceId};

// ============================================================================
// Dual graph
// ============================================================================

/// Face adjacency through interior edges.
///
/// Each link is stored on both faces together with the topology edge it
/// crosses. Links are inserted in ascending edge order.
#[derive(Debug, Clone)]
pub struct DualGraph {
    adjacency: Vec<Vec<(FaceId, EdgeId)>>,
}

/// Result of a breadth-first traversal of a [`DualGraph`].
#[derive(Debug, Clone)]
pub struct SpanningForest {
    /// Component label per face, numbered in discovery order.
    pub component: Vec<usize>,
    /// Number of connected components.
    pub num_components: usize,
    /// Whether each topology edge was used as a traversal edge.
    pub tree_edge: Vec<bool>,
}

impl SpanningForest {
    /// Whether `e` is part of the forest.
    #[inline]
    pub fn is_tree_edge(&self, e: EdgeId) -> bool {
        self.tree_edge[e.index()]
    }

    /// Number of edges in the forest.
    pub fn num_tree_edges(&self) -> usize {
        self.tree_edge.iter().filter(|&&t| t).count()
    }
}

impl DualGraph {
    /// Build the dual graph over every interior edge.
    pub fn new(topo: &Topology) -> Self {
        Self::with_filter(topo, |_| true)
    }

    /// Build the dual graph over the interior edges accepted by `keep`.
    pub fn with_filter<F>(topo: &Topology, keep: F) -> Self
    where
        F: Fn(EdgeId) -> bool,
    {
        let mut adjacency = vec![Vec::new(); topo.num_faces()];
        for e in topo.edge_ids() {
            let Some((f0, f1)) = topo.edge(e).faces() else {
                continue;
            };
            if !keep(e) {
                continue;
            }
            adjacency[f0.index()].push((f1, e));
            adjacency[f1.index()].push((f0, e));
        }
        Self { adjacency }
    }

    /// Number of nodes (faces).
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.adjacency.len()
    }

    /// Neighbors of a face with the edges leading to them.
    #[inline]
    pub fn neighbors(&self, f: FaceId) -> &[(FaceId, EdgeId)] {
        &self.adjacency[f.index()]
    }

    /// Breadth-first traversal from every unvisited face in ascending order.
    ///
    /// `num_edges` is the size of the topology edge list the graph was built
    /// from.
    pub fn spanning_forest(&self, num_edges: usize) -> SpanningForest {
        const UNVISITED: usize = usize::MAX;

        let n = self.adjacency.len();
        let mut component = vec![UNVISITED; n];
        let mut tree_edge = vec![false; num_edges];
        let mut num_components = 0;
        let mut queue = VecDeque::new();

        for start in 0..n {
            if component[start] != UNVISITED {
                continue;
            }
            component[start] = num_components;
            queue.push_back(start);

            while let Some(f) = queue.pop_front() {
                for &(g, e) in &self.adjacency[f] {
                    if component[g.index()] == UNVISITED {
                        component[g.index()] = num_components;
                        tree_edge[e.index()] = true;
                        queue.push_back(g.index());
                    }
                }
            }
            num_components += 1;
        }

        SpanningForest {
            component,
            num_components,
            tree_edge,
        }
    }
}

// ============================================================================
// Policies
// ============================================================================

/// Data a [`SeamPolicy`] can draw on when scoring candidates.
#[derive(Debug, Clone, Copy)]
pub struct SeamContext<'a> {
    /// The mesh topology.
    pub topology: &'a Topology,
    /// Number of edges incident to each vertex.
    pub vertex_degrees: &'a [usize],
    /// Whether the mesh has no boundary edges.
    pub is_closed: bool,
}

/// Decides which seam candidates become seams.
///
/// Candidates are sorted by ascending [`priority`](SeamPolicy::priority) and
/// the first [`budget`](SeamPolicy::budget) of them are kept.
pub trait SeamPolicy: Send + Sync {
    /// Cost of cutting `edge`; lower values are cut first.
    fn priority(&self, ctx: &SeamContext<'_>, edge: EdgeId) -> f64;

    /// How many of `candidates` candidate edges to keep.
    fn budget(&self, ctx: &SeamContext<'_>, candidates: usize) -> usize;
}

/// Degree-based seam selection with capped budgets.
///
/// Priority is `deg(v0) + deg(v1)`, so cuts go through low-valence regions
/// first. The budget depends on whether the mesh is open and on its face
/// count:
///
/// | mesh | budget |
/// |------|--------|
/// | open | `max(1, c / open_divisor)`, at most `open_cap` |
/// | closed, `F <= small_mesh_faces` | all candidates |
/// | closed, `F <= medium_mesh_faces` | `max(1, c / medium_divisor)`, at most `medium_cap` |
/// | closed, larger | `max(1, c / large_divisor)`, at most `large_cap` |
///
/// The thresholds were tuned on cubes, cylinders and spheres; they are plain
/// fields so callers can adjust them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegreePolicy {
    /// Closed meshes with at most this many faces keep every candidate.
    pub small_mesh_faces: usize,
    /// Upper face count of the medium closed-mesh band.
    pub medium_mesh_faces: usize,
    /// Candidate divisor for open meshes.
    pub open_divisor: usize,
    /// Seam cap for open meshes.
    pub open_cap: usize,
    /// Candidate divisor for medium closed meshes.
    pub medium_divisor: usize,
    /// Seam cap for medium closed meshes.
    pub medium_cap: usize,
    /// Candidate divisor for large closed meshes.
    pub large_divisor: usize,
    /// Seam cap for large closed meshes.
    pub large_cap: usize,
}

impl Default for DegreePolicy {
    fn default() -> Self {
        Self {
            small_mesh_faces: 20,
            medium_mesh_faces: 70,
            open_divisor: 3,
            open_cap: 2,
            medium_divisor: 3,
            medium_cap: 2,
            large_divisor: 14,
            large_cap: 5,
        }
    }
}

impl DegreePolicy {
    /// Set the open-mesh divisor and cap.
    pub fn with_open_budget(mut self, divisor: usize, cap: usize) -> Self {
        self.open_divisor = divisor;
        self.open_cap = cap;
        self
    }

    /// Set the face-count thresholds separating small, medium and large
    /// closed meshes.
    pub fn with_face_thresholds(mut self, small: usize, medium: usize) -> Self {
        self.small_mesh_faces = small;
        self.medium_mesh_faces = medium;
        self
    }

    /// Set the large closed-mesh divisor and cap.
    pub fn with_large_budget(mut self, divisor: usize, cap: usize) -> Self {
        self.large_divisor = divisor;
        self.large_cap = cap;
        self
    }
}

fn capped_fraction(candidates: usize, divisor: usize, cap: usize) -> usize {
    (candidates / divisor.max(1)).max(1).min(cap)
}

impl SeamPolicy for DegreePolicy {
    fn priority(&self, ctx: &SeamContext<'_>, edge: EdgeId) -> f64 {
        let e = ctx.topology.edge(edge);
        (ctx.vertex_degrees[e.v0.index()] + ctx.vertex_degrees[e.v1.index()]) as f64
    }

    fn budget(&self, ctx: &SeamContext<'_>, candidates: usize) -> usize {
        if candidates == 0 {
            return 0;
        }
        let faces = ctx.topology.num_faces();
        let budget = if !ctx.is_closed {
            capped_fraction(candidates, self.open_divisor, self.open_cap)
        } else if faces <= self.small_mesh_faces {
            candidates
        } else if faces <= self.medium_mesh_faces {
            capped_fraction(candidates, self.medium_divisor, self.medium_cap)
        } else {
            capped_fraction(candidates, self.large_divisor, self.large_cap)
        };
        budget.min(candidates)
    }
}

/// Keep every candidate: the full spanning-tree cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanningTreePolicy;

impl SeamPolicy for SpanningTreePolicy {
    fn priority(&self, _ctx: &SeamContext<'_>, _edge: EdgeId) -> f64 {
        0.0
    }

    fn budget(&self, _ctx: &SeamContext<'_>, candidates: usize) -> usize {
        candidates
    }
}

// ============================================================================
// Seam set
// ============================================================================

/// Ordered set of edges chosen as cuts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeamSet {
    edges: BTreeSet<EdgeId>,
    candidates: usize,
}

impl SeamSet {
    /// An empty seam set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `e` is a seam.
    #[inline]
    pub fn contains(&self, e: EdgeId) -> bool {
        self.edges.contains(&e)
    }

    /// Number of seams.
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether there are no seams.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Seam edges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
    }

    /// Number of candidates the seams were selected from.
    #[inline]
    pub fn num_candidates(&self) -> usize {
        self.candidates
    }
}

impl FromIterator<EdgeId> for SeamSet {
    fn from_iter<T: IntoIterator<Item = EdgeId>>(iter: T) -> Self {
        let edges: BTreeSet<EdgeId> = iter.into_iter().collect();
        let candidates = edges.len();
        Self { edges, candidates }
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Interior edges outside the BFS spanning forest, in ascending edge order.
pub fn seam_candidates(topo: &Topology) -> Vec<EdgeId> {
    let forest = DualGraph::new(topo).spanning_forest(topo.num_edges());
    topo.interior_edges()
        .filter(|&e| !forest.is_tree_edge(e))
        .collect()
}

/// Detect seams with the default [`DegreePolicy`].
pub fn detect_seams(topo: &Topology) -> SeamSet {
    detect_seams_with_policy(topo, &DegreePolicy::default())
}

/// Detect seams with a custom selection policy.
///
/// Never fails for a valid topology; the result may be empty.
pub fn detect_seams_with_policy<P>(topo: &Topology, policy: &P) -> SeamSet
where
    P: SeamPolicy + ?Sized,
{
    let candidates = seam_candidates(topo);
    let degrees = topo.vertex_degrees();
    let ctx = SeamContext {
        topology: topo,
        vertex_degrees: &degrees,
        is_closed: topo.is_closed(),
    };

    let mut scored: Vec<(EdgeId, f64)> = candidates
        .iter()
        .map(|&e| (e, policy.priority(&ctx, e)))
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    let budget = policy.budget(&ctx, scored.len()).min(scored.len());
    let edges: BTreeSet<EdgeId> = scored[..budget].iter().map(|&(e, _)| e).collect();

    debug!(
        "seam selection: {} mesh, {} candidates, {} seams",
        if ctx.is_closed { "closed" } else { "open" },
        scored.len(),
        edges.len()
    );

    SeamSet {
        edges,
        candidates: scored.len(),
    }
}
