//! Coloring engine for paint-by-number pictures.
//!
//! A picture is a [`RegionMap`] (color groups of shape ids) plus opaque
//! [`VectorArt`]. [`AssetResolver`] finds both for an [`ImageRef`], generating
//! them on first use, and [`ColoringController`] turns the result into a
//! [`FillState`] the presentation layer projects onto the art.

pub mod color;
pub mod controller;
pub mod error;
pub mod fill;
pub mod region_map;
pub mod resolver;
pub mod uploads;

pub use color::{BLANK_FILL, ColorParseError, MARKER_FILL, Rgb};
pub use controller::{
    ColoringController, Resolution, Ticket, View, resolve_into, switch_and_resolve,
};
pub use error::{AssetError, GenerateError, LookupError, TransportError};
pub use fill::{Click, FillState, Paint, PaletteEntry, RegionStatus};
pub use region_map::{ColorGroup, RegionMap, RegionMapError, ShapeId};
pub use resolver::{
    AssetKey, AssetResolver, Clock, Generator, ImageRef, LocalAssets, ObjectStore, RawAsset,
    ResolvedAsset, ResolverConfig, VectorArt,
};
pub use uploads::{UploadError, UploadHistory, upload_object_name};
