//! On-disk cache of unwrapped meshes.
//!
//! Entries are keyed by a SHA-256 digest of the geometry and of every option
//! that shapes the resulting UVs, and stored as OBJ files named
//! `<key>.obj`. Options that only affect speed or reporting (`parallel`,
//! metrics) are not part of the key.
//!
//! # Example
//!
//! ```no_run
//! use unfold::io::cache::{CacheKey, UnwrapCache};
//! use unfold::prelude::*;
//!
//! let mesh = unfold::io::load("model.obj").unwrap();
//! let options = UnwrapOptions::default();
//! let cache = UnwrapCache::open("/tmp/unfold-cache").unwrap();
//!
//! let key = CacheKey::new(&mesh, &options);
//! let unwrapped = match cache.load(&key).unwrap() {
//!     Some(hit) => hit,
//!     None => {
//!         let (unwrapped, _) = unwrap(&mesh, &options).unwrap();
//!         cache.store(&key, &unwrapped).unwrap();
//!         unwrapped
//!     }
//! };
//! # let _ = unwrapped;
//! ```

use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use sha2::{Digest, Sha256};

use super::obj;
use crate::algo::parameterize::PinStrategy;
use crate::algo::unwrap::UnwrapOptions;
use crate::error::{MeshError, Result};
use crate::mesh::TriMesh;

const EXTENSION: &str = "obj";

/// Hex SHA-256 digest identifying a mesh and its unwrap options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hash a mesh together with the options that shape its UVs.
    pub fn new(mesh: &TriMesh, options: &UnwrapOptions) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(env!("CARGO_PKG_VERSION").as_bytes());

        hasher.update((mesh.num_vertices() as u64).to_le_bytes());
        for p in mesh.positions() {
            for c in p.coords.iter() {
                hasher.update(c.to_le_bytes());
            }
        }
        hasher.update((mesh.num_faces() as u64).to_le_bytes());
        for tri in mesh.triangles() {
            for &v in tri {
                hasher.update((v as u64).to_le_bytes());
            }
        }
        hasher.update(option_string(options).as_bytes());

        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// The digest as lowercase hex.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn option_string(options: &UnwrapOptions) -> String {
    let lscm = &options.lscm;
    let pins = match &lscm.pin_strategy {
        PinStrategy::Automatic => "automatic".to_string(),
        PinStrategy::Manual(a, b) => format!(
            "{}@{:?},{:?}/{}@{:?},{:?}",
            a.vertex.index(),
            a.u,
            a.v,
            b.vertex.index(),
            b.u,
            b.v
        ),
    };
    format!(
        "angle={:?};min_faces={};pack={};margin={:?};pins={};degenerate_area={:?};boundary_limit={};normalize={}",
        options.angle_threshold,
        options.min_island_faces,
        options.pack_islands,
        options.island_margin,
        pins,
        lscm.degenerate_area,
        lscm.boundary_search_limit,
        lscm.normalize
    )
}

fn is_entry_name(stem: &str) -> bool {
    stem.len() == 64 && stem.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// A directory of cached unwrap results.
#[derive(Debug, Clone)]
pub struct UnwrapCache {
    dir: PathBuf,
}

impl UnwrapCache {
    /// Use `dir` as the cache, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the entry for `key` lives, whether or not it exists.
    pub fn path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key, EXTENSION))
    }

    /// Path of the entry for `key`, if it exists.
    pub fn lookup(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.path(key);
        path.is_file().then_some(path)
    }

    /// Load the cached mesh for `key`.
    ///
    /// Positions and UVs pass through the OBJ text format, so they are
    /// rounded to six decimals.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be read.
    pub fn load(&self, key: &CacheKey) -> Result<Option<TriMesh>> {
        match self.lookup(key) {
            Some(path) => {
                debug!("cache hit {}", key);
                obj::load(path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Store an unwrapped mesh under `key`, replacing any previous entry.
    ///
    /// The entry is written to a temporary file first and renamed into
    /// place, so readers never see a partial file.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Io`] if writing or renaming fails.
    pub fn store(&self, key: &CacheKey, mesh: &TriMesh) -> Result<PathBuf> {
        let path = self.path(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            obj::write(mesh, &mut writer)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|e| MeshError::Io(e.error))?;
        debug!("cached {}", path.display());
        Ok(path)
    }

    /// Remove every cache entry. Other files in the directory are left alone.
    ///
    /// Returns the number of removed entries.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Io`] if the directory cannot be listed or an entry
    /// cannot be removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_entry = path.is_file()
                && path.extension().map_or(false, |e| e == EXTENSION)
                && path.file_stem().and_then(|s| s.to_str()).map_or(false, is_entry_name);
            if is_entry {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        debug!("removed {} cache entries from {}", removed, self.dir.display());
        Ok(removed)
    }
}
