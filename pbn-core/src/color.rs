use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Fill used for regions that are not yet painted.
pub const BLANK_FILL: &str = "white";
/// Tint used for regions of the currently selected palette color.
pub const MARKER_FILL: &str = "#c7cbff";

/// An sRGB color triple as produced by the region generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("expected three color channels in {0:?}")]
    Channels(String),
    #[error("invalid channel {channel:?} in {input:?}")]
    Channel { input: String, channel: String },
}

impl Rgb {
    /// CSS functional notation, e.g. `rgb(255, 0, 0)`.
    pub fn css(&self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    // Matches the generator's tuple notation so maps round-trip unchanged.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(v: [u8; 3]) -> Self {
        Rgb(v[0], v[1], v[2])
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    /// Accepts `(r, g, b)`, `[r g b]`, `rgb(r,g,b)` and `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if let Some(hex) = t.strip_prefix('#') {
            return parse_hex(s, hex);
        }
        let t = t.strip_prefix("rgb").unwrap_or(t);
        let t = t.trim_matches(|c: char| c == '(' || c == ')' || c == '[' || c == ']');
        let parts: Vec<&str> = t
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 3 {
            return Err(ColorParseError::Channels(s.to_string()));
        }
        let mut ch = [0u8; 3];
        for (slot, part) in ch.iter_mut().zip(&parts) {
            *slot = parse_channel(s, part)?;
        }
        Ok(Rgb::from(ch))
    }
}

fn parse_channel(input: &str, part: &str) -> Result<u8, ColorParseError> {
    // numpy 2 prints scalars as `np.uint8(255)`; the closing paren of the last
    // channel is already gone with the tuple's.
    let value = match part.split_once('(') {
        Some((_, v)) => v.trim_end_matches(')'),
        None => part,
    };
    // numpy may print channels as floats ("255.0")
    let trimmed = value.strip_suffix(".0").unwrap_or(value);
    trimmed.parse::<u8>().map_err(|_| ColorParseError::Channel {
        input: input.to_string(),
        channel: part.to_string(),
    })
}

fn parse_hex(input: &str, hex: &str) -> Result<Rgb, ColorParseError> {
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(ColorParseError::Channels(input.to_string()));
    }
    let mut ch = [0u8; 3];
    for (i, slot) in ch.iter_mut().enumerate() {
        let part = &hex[i * 2..i * 2 + 2];
        *slot = u8::from_str_radix(part, 16).map_err(|_| ColorParseError::Channel {
            input: input.to_string(),
            channel: part.to_string(),
        })?;
    }
    Ok(Rgb::from(ch))
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RgbRepr {
    Text(String),
    Triple([u8; 3]),
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RgbRepr::deserialize(deserializer)? {
            RgbRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            RgbRepr::Triple(v) => Ok(Rgb::from(v)),
        }
    }
}
