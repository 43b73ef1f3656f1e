//! UV island packing.
//!
//! After parameterization every island lives in its own unit square, all of
//! them stacked on top of each other. Packing moves them side by side with a
//! simple shelf heuristic and rescales the result into `[0, 1]²`:
//!
//! 1. Compute each island's UV bounding box over the vertices it owns.
//! 2. Sort islands by height, tallest first (stable).
//! 3. Place islands left to right on shelves of unit width, separated by the
//!    margin; start a new shelf when the next island does not fit and the
//!    current shelf is not empty.
//! 4. Translate every island to its placement, then divide all coordinates by
//!    the larger side of the packed extent.
//!
//! Islands never overlap by construction and any two neighbours on a shelf,
//! as well as consecutive shelves, are at least `margin * scale` apart.

use log::debug;
use nalgebra::{Point2, Vector2};

use crate::error::{MeshError, Result};
use crate::mesh::{IslandId, TriMesh, UVMap, VertexId};

/// Where one island ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IslandPlacement {
    /// The island.
    pub island: IslandId,
    /// Minimum corner of the island's bounding box before packing.
    pub min: Point2<f64>,
    /// Width and height of the bounding box.
    pub size: Vector2<f64>,
    /// Minimum corner after translation, before the global scale.
    pub target: Point2<f64>,
}

/// Result of packing a set of islands.
#[derive(Debug, Clone, PartialEq)]
pub struct PackLayout {
    /// Placed islands in placement order. Islands with zero width are absent.
    pub placements: Vec<IslandPlacement>,
    /// Uniform scale applied to every coordinate after translation.
    pub scale: f64,
    /// Packed extent before scaling.
    pub extent: Vector2<f64>,
}

impl PackLayout {
    /// Layout that leaves coordinates untouched.
    pub fn identity() -> Self {
        Self {
            placements: Vec::new(),
            scale: 1.0,
            extent: Vector2::zeros(),
        }
    }

    /// Final bounding box of an island, after translation and scaling.
    pub fn final_bounds(&self, island: IslandId) -> Option<(Point2<f64>, Point2<f64>)> {
        self.placements
            .iter()
            .find(|p| p.island == island)
            .map(|p| (p.target * self.scale, (p.target + p.size) * self.scale))
    }
}

/// Assign every vertex to the first island whose face references it.
///
/// `face_island_ids` is indexed by face. Vertices referenced by no face get
/// `None`.
pub fn vertex_owners(mesh: &TriMesh, face_island_ids: &[IslandId]) -> Vec<Option<IslandId>> {
    let mut owners = vec![None; mesh.num_vertices()];
    for (tri, &island) in mesh.triangles().iter().zip(face_island_ids) {
        for &v in tri {
            owners[v].get_or_insert(island);
        }
    }
    owners
}

/// Pack islands into the unit square.
///
/// `owners` maps each vertex to the island it moves with. With one island or
/// fewer the coordinates are already normalized and are left untouched.
///
/// # Errors
///
/// - [`MeshError::InvalidParameter`] if `margin` is negative or not finite
/// - [`MeshError::InvalidState`] if `owners` and `uv_map` differ in length,
///   or an owner is not below `num_islands`
pub fn pack_islands(
    uv_map: &mut UVMap,
    owners: &[Option<IslandId>],
    num_islands: usize,
    margin: f64,
) -> Result<PackLayout> {
    if !margin.is_finite() || margin < 0.0 {
        return Err(MeshError::invalid_param(
            "island_margin",
            margin,
            "must be a non-negative number",
        ));
    }
    if owners.len() != uv_map.len() {
        return Err(MeshError::InvalidState(format!(
            "{} vertex owners for {} UV coordinates",
            owners.len(),
            uv_map.len()
        )));
    }
    if let Some((vi, island)) = owners
        .iter()
        .enumerate()
        .find_map(|(vi, o)| o.filter(|id| id.index() >= num_islands).map(|id| (vi, id)))
    {
        return Err(MeshError::InvalidState(format!(
            "vertex {} is owned by island {} but there are only {} islands",
            vi,
            island.index(),
            num_islands
        )));
    }
    if num_islands <= 1 {
        return Ok(PackLayout::identity());
    }

    // Bounding boxes over owned vertices.
    let mut members: Vec<Vec<VertexId>> = vec![Vec::new(); num_islands];
    for (vi, owner) in owners.iter().enumerate() {
        if let Some(island) = owner {
            members[island.index()].push(VertexId::new(vi));
        }
    }

    let mut placements: Vec<IslandPlacement> = members
        .iter()
        .enumerate()
        .filter_map(|(i, verts)| {
            let (min, max) = uv_map.bounding_box_of(verts)?;
            Some(IslandPlacement {
                island: IslandId::new(i),
                min,
                size: max - min,
                target: Point2::origin(),
            })
        })
        .filter(|p| p.size.x > 0.0)
        .collect();

    placements.sort_by(|a, b| b.size.y.total_cmp(&a.size.y));

    // Shelves.
    const TARGET_WIDTH: f64 = 1.0;
    let mut cursor_x = 0.0;
    let mut shelf_y = 0.0;
    let mut shelf_height: f64 = 0.0;
    let mut extent = Vector2::zeros();
    let mut shelves = usize::from(!placements.is_empty());

    for placement in &mut placements {
        if cursor_x + placement.size.x > TARGET_WIDTH && cursor_x > 0.0 {
            shelf_y += shelf_height + margin;
            cursor_x = 0.0;
            shelf_height = 0.0;
            shelves += 1;
        }

        placement.target = Point2::new(cursor_x, shelf_y);
        cursor_x += placement.size.x + margin;
        shelf_height = shelf_height.max(placement.size.y);

        extent.x = f64::max(extent.x, placement.target.x + placement.size.x);
        extent.y = f64::max(extent.y, placement.target.y + placement.size.y);
    }

    for placement in &placements {
        let offset = placement.target - placement.min;
        uv_map.translate(&members[placement.island.index()], offset);
    }

    let denominator = extent.x.max(extent.y);
    let scale = if denominator > 0.0 { 1.0 / denominator } else { 1.0 };
    uv_map.scale(scale);

    debug!(
        "packed {} islands on {} shelves, extent {:.3}x{:.3}, scale {:.4}",
        placements.len(),
        shelves,
        extent.x,
        extent.y,
        scale
    );

    Ok(PackLayout {
        placements,
        scale,
        extent,
    })
}
