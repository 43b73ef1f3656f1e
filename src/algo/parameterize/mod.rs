//! UV parameterization of a single island.
//!
//! Parameterization maps a piece of the 3D surface to the plane. The
//! unwrapping pipeline cuts the mesh into islands first and then runs
//! [`lscm`] once per island; [`lscm_mesh`] treats a whole disk-like mesh as
//! one island.
//!
//! # Example
//!
//! ```
//! use unfold::algo::parameterize::{lscm_mesh, LSCMOptions};
//! use unfold::mesh::primitives;
//!
//! let mesh = primitives::grid(4, 4).unwrap();
//! let uv_map = lscm_mesh(&mesh, &LSCMOptions::default()).unwrap();
//!
//! let (min, max) = uv_map.bounding_box().unwrap();
//! assert!(min.x >= -1e-9 && max.x <= 1.0 + 1e-9);
//! assert!(min.y >= -1e-9 && max.y <= 1.0 + 1e-9);
//! ```
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

mod lscm;
pub mod sparse;

pub use lscm::{
    lscm, lscm_mesh, IslandParameterization, LSCMOptions, LocalFrame, PinStrategy, PinnedVertex,
};
