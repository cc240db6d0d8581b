//! Binary little-endian ply decoding for gaussian splat clouds.
//!
//! The vertex schema is discovered from the header; [`SplatLayout`] maps the
//! conventional 3DGS property names onto typed [`SplatRecord`]s.

mod cloud;
mod error;
mod header;
mod splat;

pub use cloud::{PlyRecord, PointCloud};
pub use error::PlyError;
pub use header::{HEADER_SEARCH_LIMIT, PlyHeader, PlySchema};
pub use splat::{DegeneratePolicy, SplatLayout, SplatRecord, sigmoid};
