//! WGSL sources, embedded at compile time.

/// Evaluates the curve ribbon per vertex from `StrokeVertex` attributes.
pub const STROKE: &str = include_str!("stroke.wgsl");

/// Draws `FlatVertex` triangles in the material color.
pub const FLAT: &str = include_str!("flat.wgsl");

pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";
