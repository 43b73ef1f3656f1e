//! The UV unwrapping pipeline.
//!
//! [`unwrap`] runs every stage in order:
//!
//! 1. [`build_topology`]: unique edges with their incident faces
//! 2. [`detect_seams_with_policy`]: interior edges chosen as cuts
//! 3. [`extract_islands`]: connected face groups between seams
//! 4. [`lscm`] on every island with at least `min_island_faces` faces,
//!    sequentially or on the rayon pool
//! 5. [`pack_islands`]: shelf packing into the unit square
//! 6. [`compute_metrics`] (optional)
//!
//! A failing island is logged, recorded in [`UnwrapResult::failed_islands`]
//! and left with zero UVs; the remaining islands are unaffected. Only invalid
//! options or an empty mesh make the whole call fail.
//!
//! # Example
//!
//! ```
//! use unfold::algo::unwrap::{unwrap, UnwrapOptions};
//! use unfold::mesh::primitives;
//!
//! let mesh = primitives::icosphere(1);
//! let (unwrapped, result) = unwrap(&mesh, &UnwrapOptions::default()).unwrap();
//!
//! assert_eq!(result.face_island_ids.len(), mesh.num_faces());
//! assert!(unwrapped.uvs().is_some());
//! ```

use log::{debug, info, warn};
use rayon::prelude::*;

use super::islands::extract_islands;
use super::metrics::{compute_metrics, CoverageOptions, QualityMetrics};
use super::pack::{pack_islands, PackLayout};
use super::parameterize::{lscm, IslandParameterization, LSCMOptions, PinStrategy};
use super::seams::{detect_seams_with_policy, DegreePolicy, SeamPolicy};
use super::topology::{build_topology, TopologyReport};
use super::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, IslandId, TriMesh, UVMap};

/// Options for the unwrapping pipeline.
#[derive(Debug, Clone)]
pub struct UnwrapOptions {
    /// Dihedral angle threshold in degrees.
    ///
    /// Accepted and validated but not used by the built-in seam policies.
    pub angle_threshold: f64,

    /// Islands with fewer faces are skipped and keep zero UVs.
    pub min_island_faces: usize,

    /// Whether to pack islands into the unit square.
    pub pack_islands: bool,

    /// UV-space gap between packed islands.
    pub island_margin: f64,

    /// Whether to parameterize islands in parallel (default: true).
    pub parallel: bool,

    /// Whether to compute [`QualityMetrics`] for the result.
    pub compute_metrics: bool,

    /// Options passed to the per-island parameterizer.
    pub lscm: LSCMOptions,

    /// Raster settings for the coverage metric.
    pub coverage: CoverageOptions,
}

impl Default for UnwrapOptions {
    fn default() -> Self {
        Self {
            angle_threshold: 30.0,
            min_island_faces: 5,
            pack_islands: true,
            island_margin: 0.02,
            parallel: true,
            compute_metrics: true,
            lscm: LSCMOptions::default(),
            coverage: CoverageOptions::default(),
        }
    }
}

impl UnwrapOptions {
    /// Set the angle threshold in degrees.
    pub fn with_angle_threshold(mut self, degrees: f64) -> Self {
        self.angle_threshold = degrees;
        self
    }

    /// Set the minimum number of faces an island needs to be parameterized.
    pub fn with_min_island_faces(mut self, faces: usize) -> Self {
        self.min_island_faces = faces;
        self
    }

    /// Enable or disable island packing.
    pub fn with_packing(mut self, pack: bool) -> Self {
        self.pack_islands = pack;
        self
    }

    /// Set the margin between packed islands.
    pub fn with_island_margin(mut self, margin: f64) -> Self {
        self.island_margin = margin;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable quality metrics.
    pub fn with_metrics(mut self, compute: bool) -> Self {
        self.compute_metrics = compute;
        self
    }

    /// Set the parameterizer options.
    pub fn with_lscm(mut self, lscm: LSCMOptions) -> Self {
        self.lscm = lscm;
        self
    }

    /// Set the coverage raster options.
    pub fn with_coverage(mut self, coverage: CoverageOptions) -> Self {
        self.coverage = coverage;
        self
    }

    /// Check that every option is within its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidParameter`] naming the first bad option.
    /// Manual pins must name two different vertices with distinct, finite
    /// targets.
    pub fn validate(&self) -> Result<()> {
        if !self.angle_threshold.is_finite() || !(0.0..=180.0).contains(&self.angle_threshold) {
            return Err(MeshError::invalid_param(
                "angle_threshold",
                self.angle_threshold,
                "must be between 0 and 180 degrees",
            ));
        }
        if !self.island_margin.is_finite() || self.island_margin < 0.0 {
            return Err(MeshError::invalid_param(
                "island_margin",
                self.island_margin,
                "must be a non-negative number",
            ));
        }
        if !self.lscm.degenerate_area.is_finite() || self.lscm.degenerate_area < 0.0 {
            return Err(MeshError::invalid_param(
                "degenerate_area",
                self.lscm.degenerate_area,
                "must be a non-negative number",
            ));
        }
        if let PinStrategy::Manual(p0, p1) = &self.lscm.pin_strategy {
            if p0.vertex == p1.vertex {
                return Err(MeshError::invalid_param(
                    "pins",
                    format!("{:?}", p0.vertex),
                    "both pins refer to the same vertex",
                ));
            }
            let coords = [p0.u, p0.v, p1.u, p1.v];
            if coords.iter().any(|c| !c.is_finite()) {
                return Err(MeshError::invalid_param(
                    "pins",
                    format!("{:?}", coords),
                    "pin coordinates must be finite",
                ));
            }
            if p0.u == p1.u && p0.v == p1.v {
                return Err(MeshError::invalid_param(
                    "pins",
                    format!("({}, {})", p0.u, p0.v),
                    "both pins share one target coordinate",
                ));
            }
        }
        if self.compute_metrics && self.coverage.resolution == 0 {
            return Err(MeshError::invalid_param(
                "coverage resolution",
                self.coverage.resolution,
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// An island whose parameterization failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandFailure {
    /// The island.
    pub island: IslandId,
    /// Number of faces in the island.
    pub faces: usize,
    /// Why the parameterization failed.
    pub reason: String,
}

/// Summary of an unwrapping run.
#[derive(Debug, Clone)]
pub struct UnwrapResult {
    /// Number of islands found.
    pub num_islands: usize,
    /// Island id of every face, indexed by face.
    pub face_island_ids: Vec<IslandId>,
    /// Number of seam edges.
    pub num_seams: usize,
    /// Islands below `min_island_faces`.
    pub skipped_islands: Vec<IslandId>,
    /// Islands whose parameterization failed.
    pub failed_islands: Vec<IslandFailure>,
    /// Topology summary of the input.
    pub topology: TopologyReport,
    /// Packing layout, if packing ran.
    pub layout: Option<PackLayout>,
    /// Quality of the result, or [`QualityMetrics::placeholder`] when
    /// metrics are disabled.
    pub metrics: QualityMetrics,
}

impl UnwrapResult {
    /// Number of islands that received UV coordinates.
    pub fn num_parameterized(&self) -> usize {
        self.num_islands - self.skipped_islands.len() - self.failed_islands.len()
    }
}

const STAGES: usize = 6;

/// Unwrap a mesh with the default [`DegreePolicy`].
///
/// Returns a copy of the mesh carrying one UV per vertex, and a summary.
///
/// # Errors
///
/// - [`MeshError::InvalidParameter`] if `options` fail [`UnwrapOptions::validate`]
/// - [`MeshError::EmptyMesh`] if the mesh has no faces
pub fn unwrap(mesh: &TriMesh, options: &UnwrapOptions) -> Result<(TriMesh, UnwrapResult)> {
    unwrap_impl(mesh, options, &DegreePolicy::default(), &Progress::none())
}

/// Unwrap a mesh with a custom seam policy.
///
/// # Errors
///
/// Same as [`unwrap`].
pub fn unwrap_with_policy<P>(
    mesh: &TriMesh,
    options: &UnwrapOptions,
    policy: &P,
) -> Result<(TriMesh, UnwrapResult)>
where
    P: SeamPolicy + ?Sized,
{
    unwrap_impl(mesh, options, policy, &Progress::none())
}

/// Unwrap a mesh, reporting progress after each stage.
///
/// In sequential mode the parameterization stage also reports per island.
///
/// # Errors
///
/// Same as [`unwrap`].
pub fn unwrap_with_progress(
    mesh: &TriMesh,
    options: &UnwrapOptions,
    progress: &Progress,
) -> Result<(TriMesh, UnwrapResult)> {
    unwrap_impl(mesh, options, &DegreePolicy::default(), progress)
}

fn unwrap_impl<P>(
    mesh: &TriMesh,
    options: &UnwrapOptions,
    policy: &P,
    progress: &Progress,
) -> Result<(TriMesh, UnwrapResult)>
where
    P: SeamPolicy + ?Sized,
{
    options.validate()?;
    debug!(
        "unwrapping {} vertices, {} faces (angle threshold {:.1}°, min island faces {}, margin {:.3})",
        mesh.num_vertices(),
        mesh.num_faces(),
        options.angle_threshold,
        options.min_island_faces,
        options.island_margin
    );

    progress.report(0, STAGES, "Building topology");
    let topo = build_topology(mesh)?;
    let topology = topo.validate();

    progress.report(1, STAGES, "Detecting seams");
    let seams = detect_seams_with_policy(&topo, policy);

    progress.report(2, STAGES, "Extracting islands");
    let islands = extract_islands(&topo, &seams);
    let groups = islands.groups();

    let mut skipped_islands = Vec::new();
    let mut work: Vec<(IslandId, &[FaceId])> = Vec::new();
    for (i, faces) in groups.iter().enumerate() {
        let island = IslandId::new(i);
        if faces.len() < options.min_island_faces {
            debug!("skipping island {} ({} faces)", i, faces.len());
            skipped_islands.push(island);
        } else {
            work.push((island, faces.as_slice()));
        }
    }

    progress.report(3, STAGES, "Parameterizing islands");
    let solve = |&(island, faces): &(IslandId, &[FaceId])| {
        let result = lscm(mesh, faces, &island_options(&options.lscm, mesh, faces));
        (island, result)
    };
    let results: Vec<(IslandId, Result<IslandParameterization>)> = if options.parallel {
        work.par_iter().map(solve).collect()
    } else {
        work.iter()
            .enumerate()
            .map(|(i, item)| {
                progress.report_sub(i, work.len(), 3, STAGES, "Parameterizing islands");
                solve(item)
            })
            .collect()
    };

    // Write results in island order. The first island to claim a vertex
    // owns its UV and carries it during packing.
    let mut uv_map = UVMap::zeros(mesh.num_vertices());
    let mut owners: Vec<Option<IslandId>> = vec![None; mesh.num_vertices()];
    let mut failed_islands = Vec::new();
    for (island, result) in results {
        match result {
            Ok(param) => {
                for (v, uv) in param.iter() {
                    let owner = &mut owners[v.index()];
                    if owner.is_none() {
                        *owner = Some(island);
                        uv_map.set(v, uv);
                    }
                }
            }
            Err(e) if e.is_island_failure() => {
                let faces = groups[island.index()].len();
                warn!("parameterization of island {} ({} faces) failed: {}", island.index(), faces, e);
                failed_islands.push(IslandFailure {
                    island,
                    faces,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    progress.report(4, STAGES, "Packing islands");
    let layout = if options.pack_islands {
        Some(pack_islands(&mut uv_map, &owners, islands.num_islands(), options.island_margin)?)
    } else {
        None
    };

    progress.report(5, STAGES, "Computing metrics");
    let metrics = if options.compute_metrics {
        compute_metrics(mesh, &uv_map, &options.coverage)
    } else {
        QualityMetrics::placeholder()
    };
    if metrics.has_collapsed_triangles() {
        warn!(
            "{} triangles have no area in UV space",
            metrics.collapsed_triangles
        );
    }

    let mut output = mesh.clone();
    output.set_uvs(uv_map)?;

    let result = UnwrapResult {
        num_islands: islands.num_islands(),
        face_island_ids: islands.into_face_island_ids(),
        num_seams: seams.len(),
        skipped_islands,
        failed_islands,
        topology,
        layout,
        metrics,
    };

    info!(
        "unwrapped {} islands ({} seams, {} skipped, {} failed)",
        result.num_islands,
        result.num_seams,
        result.skipped_islands.len(),
        result.failed_islands.len()
    );
    progress.report(STAGES, STAGES, "Done");

    Ok((output, result))
}

/// Manual pins only apply to the island containing both pinned vertices;
/// every other island picks its own.
fn island_options(options: &LSCMOptions, mesh: &TriMesh, faces: &[FaceId]) -> LSCMOptions {
    let PinStrategy::Manual(p0, p1) = &options.pin_strategy else {
        return options.clone();
    };
    let touches = |v| faces.iter().any(|&f| mesh.face(f).contains(&v));
    if touches(p0.vertex) && touches(p1.vertex) {
        options.clone()
    } else {
        LSCMOptions {
            pin_strategy: PinStrategy::Automatic,
            ..options.clone()
        }
    }
}
