//! Font used for the region numbers when pictures are rasterized.
//!
//! Empty when the build could not find or download a font; callers then fall
//! back to system fonts.

pub static FONT_BYTES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/label-font"));
