//! Wavefront OBJ format support.
//!
//! Loading goes through `tobj` with triangulation. Triangles are built from
//! position indices only, so per-corner normals and texture coordinates never
//! split a vertex. Saving writes `v` lines, `vt` lines when the mesh has UVs,
//! and `f v/vt` faces.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, warn};
use nalgebra::{Point2, Point3};

use crate::error::{MeshError, Result};
use crate::mesh::{TriMesh, UVMap};

/// Load a mesh from an OBJ file.
///
/// Polygons are triangulated and all models in the file are merged. A vertex
/// of a later model (`o` or `g` group) at exactly the position of an earlier
/// model's vertex is merged with it, so groups sharing `v` lines stay
/// connected.
///
/// Texture coordinates are kept only if every face corner has one and every
/// vertex is given the same coordinate by all of its corners. Files with UV
/// seams load without UVs.
///
/// # Example
///
/// ```no_run
/// use unfold::io::obj;
///
/// let mesh = obj::load("model.obj").unwrap();
/// println!("{} faces, UVs: {}", mesh.num_faces(), mesh.uvs().is_some());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::new();
    let mut texcoords = CornerUvs::default();
    // Positions of earlier models, keyed by their exact bits.
    let mut shared: HashMap<[u64; 3], usize> = HashMap::new();
    let mut welded = 0;

    for model in &models {
        let mesh = &model.mesh;
        let remap: Vec<usize> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| {
                let point = Point3::new(p[0] as f64, p[1] as f64, p[2] as f64);
                match shared.get(&position_key(&point)) {
                    Some(&existing) => {
                        welded += 1;
                        existing
                    }
                    None => {
                        positions.push(point);
                        positions.len() - 1
                    }
                }
            })
            .collect();
        for &vi in &remap {
            shared.entry(position_key(&positions[vi])).or_insert(vi);
        }
        texcoords.grow(positions.len());

        let mut corners = Vec::with_capacity(mesh.indices.len());
        for &index in &mesh.indices {
            let vi = remap.get(index as usize).copied().ok_or_else(|| MeshError::LoadError {
                path: path.to_path_buf(),
                message: format!("position index {} out of range in model '{}'", index, model.name),
            })?;
            corners.push(vi);
        }
        triangles.extend(corners.chunks_exact(3).map(|t| [t[0], t[1], t[2]]));

        if mesh.texcoord_indices.len() == mesh.indices.len() && !mesh.indices.is_empty() {
            for (&vi, &ti) in corners.iter().zip(&mesh.texcoord_indices) {
                let ti = ti as usize;
                match mesh.texcoords.get(2 * ti..2 * ti + 2) {
                    Some(t) => texcoords.assign(vi, Point2::new(t[0] as f64, t[1] as f64)),
                    None => texcoords.discard(),
                }
            }
        } else {
            texcoords.discard();
        }
        debug!(
            "OBJ model '{}': {} vertices, {} triangles",
            model.name,
            mesh.positions.len() / 3,
            mesh.indices.len() / 3
        );
    }

    if triangles.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "OBJ file contains no triangles".to_string(),
        });
    }
    if welded > 0 {
        debug!("merged {} vertices shared between models", welded);
    }
    if texcoords.split {
        warn!(
            "{}: vertices carry more than one texture coordinate, ignoring input UVs",
            path.display()
        );
    }

    let uvs = texcoords.into_uv_map();
    let mesh = TriMesh::new(positions, triangles)?;
    debug!(
        "OBJ loaded: {} vertices, {} faces from {} models",
        mesh.num_vertices(),
        mesh.num_faces(),
        models.len()
    );

    match uvs {
        Some(uvs) => mesh.with_uvs(uvs),
        None => Ok(mesh),
    }
}

fn position_key(p: &Point3<f64>) -> [u64; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

/// Texture coordinates gathered per vertex from face corners.
#[derive(Debug, Default)]
struct CornerUvs {
    slots: Vec<Option<Point2<f64>>>,
    /// A corner was missing its coordinate.
    missing: bool,
    /// Two corners of one vertex disagreed.
    split: bool,
}

impl CornerUvs {
    fn grow(&mut self, len: usize) {
        self.slots.resize(len, None);
    }

    fn assign(&mut self, vertex: usize, uv: Point2<f64>) {
        match self.slots[vertex] {
            None => self.slots[vertex] = Some(uv),
            Some(existing) if existing != uv => self.split = true,
            Some(_) => {}
        }
    }

    fn discard(&mut self) {
        self.missing = true;
    }

    /// One coordinate per vertex, or `None` if the corners do not agree.
    ///
    /// Vertices no face references get the origin.
    fn into_uv_map(self) -> Option<UVMap> {
        if self.missing || self.split {
            return None;
        }
        Some(UVMap::new(
            self.slots
                .into_iter()
                .map(|uv| uv.unwrap_or_else(Point2::origin))
                .collect(),
        ))
    }
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use unfold::io::obj;
/// use unfold::mesh::primitives;
///
/// obj::save(&primitives::cube(), "cube.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &TriMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh in OBJ format to any writer.
pub fn write<W: Write>(mesh: &TriMesh, writer: &mut W) -> Result<()> {
    writeln!(writer, "# unfold")?;
    writeln!(writer, "# Vertices: {}", mesh.num_vertices())?;
    writeln!(writer, "# Faces: {}", mesh.num_faces())?;

    for p in mesh.positions() {
        writeln!(writer, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }

    match mesh.uvs() {
        Some(uvs) => {
            for (_, uv) in uvs.iter() {
                writeln!(writer, "vt {:.6} {:.6}", uv.x, uv.y)?;
            }
            for &[a, b, c] in mesh.triangles() {
                let (a, b, c) = (a + 1, b + 1, c + 1);
                writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}")?;
            }
        }
        None => {
            for &[a, b, c] in mesh.triangles() {
                writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
            }
        }
    }

    Ok(())
}
