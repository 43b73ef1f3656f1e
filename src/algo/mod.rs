//! UV unwrapping algorithms.
//!
//! The pipeline stages, in the order [`unwrap::unwrap`] runs them:
//!
//! - **Topology**: unique undirected edges with their incident faces
//! - **Seams**: interior edges selected as cuts by a replaceable policy
//! - **Islands**: connected face groups that do not cross a seam
//! - **Parameterization**: least squares conformal maps per island
//! - **Packing**: shelf packing of islands into the unit square
//!
//! Supporting modules measure the result ([`metrics`]) and search for good
//! pipeline parameters ([`tune`]).

pub mod islands;
pub mod metrics;
pub mod pack;
pub mod parameterize;
pub mod progress;
pub mod seams;
pub mod topology;
pub mod tune;
pub mod unwrap;

pub use progress::Progress;
