//! KML extraction: streaming walker, ring coder and description parser.

mod description;
mod geometry;
mod walker;

pub use description::parse_attributes;
pub use geometry::{coords_to_polygon, polygon_to_wkt, MIN_RING_TUPLES};
pub use walker::{DocumentWalker, FolderStack, WalkStats};
