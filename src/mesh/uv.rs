//! UV coordinate storage.
//!
//! This module provides the [`UVMap`] type for storing one 2D texture coordinate
//! per mesh vertex, plus the unit-square normalization shared by the
//! parameterizer and the packer.

use nalgebra::{Point2, Vector2};

use super::index::VertexId;

/// Bounding-box extents below this are treated as 1.0 during normalization.
pub const MIN_EXTENT: f64 = 1e-6;

/// Translate and uniformly scale `coords` so their bounding box starts at the
/// origin and its larger side has length 1.
///
/// The scale is the same on both axes so angles are preserved. An extent
/// smaller than [`MIN_EXTENT`] is replaced by 1.0 before choosing the scale.
pub fn normalize_to_unit_square(coords: &mut [Point2<f64>]) {
    let Some((min, max)) = bounds(coords.iter().copied()) else {
        return;
    };

    let mut width = max.x - min.x;
    let mut height = max.y - min.y;
    if width < MIN_EXTENT {
        width = 1.0;
    }
    if height < MIN_EXTENT {
        height = 1.0;
    }
    let scale = 1.0 / width.max(height);

    for uv in coords.iter_mut() {
        uv.x = (uv.x - min.x) * scale;
        uv.y = (uv.y - min.y) * scale;
    }
}

fn bounds(mut points: impl Iterator<Item = Point2<f64>>) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = points.next()?;
    let mut min = first;
    let mut max = first;
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

/// UV coordinates for mesh vertices.
///
/// The pipeline assigns exactly one UV per global vertex index (vertices are
/// never split along seams). Vertices that belong to no successfully
/// parameterized island keep the origin.
///
/// # Example
///
/// ```
/// use unfold::mesh::{UVMap, VertexId};
/// use nalgebra::Point2;
///
/// let mut uvs = UVMap::zeros(3);
/// uvs.set(VertexId::new(1), Point2::new(4.0, 0.0));
/// uvs.set(VertexId::new(2), Point2::new(0.0, 2.0));
/// uvs.normalize();
///
/// assert_eq!(uvs.get(VertexId::new(1)), Point2::new(1.0, 0.0));
/// assert_eq!(uvs.get(VertexId::new(2)), Point2::new(0.0, 0.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UVMap {
    /// UV coordinates indexed by vertex ID.
    coords: Vec<Point2<f64>>,
}

impl UVMap {
    /// Create a new UV map with the given coordinates.
    ///
    /// Index 0 corresponds to vertex 0, etc.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self { coords }
    }

    /// Create a UV map filled with zeros.
    pub fn zeros(n: usize) -> Self {
        Self {
            coords: vec![Point2::origin(); n],
        }
    }

    /// Get the UV coordinates for a vertex.
    #[inline]
    pub fn get(&self, v: VertexId) -> Point2<f64> {
        self.coords[v.index()]
    }

    /// Get a mutable reference to UV coordinates for a vertex.
    #[inline]
    pub fn get_mut(&mut self, v: VertexId) -> &mut Point2<f64> {
        &mut self.coords[v.index()]
    }

    /// Set the UV coordinates for a vertex.
    #[inline]
    pub fn set(&mut self, v: VertexId, uv: Point2<f64>) {
        self.coords[v.index()] = uv;
    }

    /// Get the number of UV coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over all UV coordinates with their vertex IDs.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, Point2<f64>)> + '_ {
        self.coords
            .iter()
            .enumerate()
            .map(|(i, &uv)| (VertexId::new(i), uv))
    }

    /// Get the raw coordinates slice.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Get a mutable slice of coordinates.
    pub fn as_mut_slice(&mut self) -> &mut [Point2<f64>] {
        &mut self.coords
    }

    /// Compute the bounding box of all UV coordinates.
    ///
    /// Returns `None` if the UV map is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        bounds(self.coords.iter().copied())
    }

    /// Compute the bounding box of a subset of vertices.
    ///
    /// Returns `None` if `vertices` is empty.
    pub fn bounding_box_of(&self, vertices: &[VertexId]) -> Option<(Point2<f64>, Point2<f64>)> {
        bounds(vertices.iter().map(|&v| self.get(v)))
    }

    /// Add `offset` to the coordinates of the given vertices.
    pub fn translate(&mut self, vertices: &[VertexId], offset: Vector2<f64>) {
        for &v in vertices {
            self.coords[v.index()] += offset;
        }
    }

    /// Multiply every coordinate by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for uv in &mut self.coords {
            uv.x *= factor;
            uv.y *= factor;
        }
    }

    /// Normalize UV coordinates to fit within [0, 1], preserving aspect ratio.
    ///
    /// See [`normalize_to_unit_square`].
    pub fn normalize(&mut self) {
        normalize_to_unit_square(&mut self.coords);
    }

    /// Compute the total unsigned triangle area in UV space.
    pub fn total_area(&self, faces: &[[usize; 3]]) -> f64 {
        faces
            .iter()
            .map(|face| {
                let p0 = self.coords[face[0]];
                let p1 = self.coords[face[1]];
                let p2 = self.coords[face[2]];
                0.5 * ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)).abs()
            })
            .sum()
    }
}
