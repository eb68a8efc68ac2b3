use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgb;

/// Identifier shared by a region in the map and the drawable element with
/// the same `id` in the vector art.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        ShapeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(s: &str) -> Self {
        ShapeId(s.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(s: String) -> Self {
        ShapeId(s)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// All regions sharing one target color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGroup {
    pub color: Rgb,
    #[serde(default)]
    pub shapes: Vec<ShapeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionMapError {
    #[error("color {0} appears in more than one group")]
    DuplicateColor(Rgb),
    #[error("shape {0} appears more than once")]
    DuplicateShape(ShapeId),
    #[error("invalid region map: {0}")]
    Json(String),
}

impl From<serde_json::Error> for RegionMapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Ordered color groups partitioning every region of one picture.
///
/// Group 0 is the background/outline group. It is drawn and revealed by
/// "fill all" but never appears in the palette or in progress accounting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColorGroup>", into = "Vec<ColorGroup>")]
pub struct RegionMap {
    groups: Vec<ColorGroup>,
    index: HashMap<ShapeId, usize>,
}

impl RegionMap {
    pub fn new(groups: Vec<ColorGroup>) -> Result<Self, RegionMapError> {
        let mut index = HashMap::new();
        let mut seen_colors = HashMap::new();
        for (gi, group) in groups.iter().enumerate() {
            if seen_colors.insert(group.color, gi).is_some() {
                return Err(RegionMapError::DuplicateColor(group.color));
            }
            for shape in &group.shapes {
                if index.insert(shape.clone(), gi).is_some() {
                    return Err(RegionMapError::DuplicateShape(shape.clone()));
                }
            }
        }
        Ok(RegionMap { groups, index })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, RegionMapError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.groups).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn groups(&self) -> &[ColorGroup] {
        &self.groups
    }

    pub fn background(&self) -> Option<&ColorGroup> {
        self.groups.first()
    }

    /// Palette entries as `(number, group)`; the number shown to the user
    /// equals the group's position in the map.
    pub fn palette(&self) -> impl Iterator<Item = (usize, &ColorGroup)> {
        self.groups.iter().enumerate().skip(1)
    }

    pub fn group_of(&self, shape: &ShapeId) -> Option<usize> {
        self.index.get(shape).copied()
    }

    pub fn color_of(&self, shape: &ShapeId) -> Option<Rgb> {
        self.group_of(shape).map(|gi| self.groups[gi].color)
    }

    pub fn contains(&self, shape: &ShapeId) -> bool {
        self.index.contains_key(shape)
    }

    /// Every shape id, in group order.
    pub fn shapes(&self) -> impl Iterator<Item = &ShapeId> {
        self.groups.iter().flat_map(|g| g.shapes.iter())
    }

    pub fn shape_count(&self) -> usize {
        self.index.len()
    }

    /// Number of regions that take part in progress accounting.
    pub fn palette_shape_count(&self) -> usize {
        self.palette().map(|(_, g)| g.shapes.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl TryFrom<Vec<ColorGroup>> for RegionMap {
    type Error = RegionMapError;

    fn try_from(groups: Vec<ColorGroup>) -> Result<Self, Self::Error> {
        RegionMap::new(groups)
    }
}

impl From<RegionMap> for Vec<ColorGroup> {
    fn from(map: RegionMap) -> Self {
        map.groups
    }
}
