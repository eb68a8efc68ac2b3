use std::collections::HashMap;
use std::sync::Arc;

use pbn_core::{BLANK_FILL, FillState, MARKER_FILL, VectorArt};
use png::{BitDepth, ColorType, Encoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod markup;

pub use markup::paint_markup;

/// CSS fills for regions that do not show their true color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub blank: String,
    pub marker: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            blank: BLANK_FILL.to_string(),
            marker: MARKER_FILL.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("SVG parse error: {0}")]
    Svg(String),
    #[error("cannot allocate a {0}x{1} pixmap")]
    Alloc(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Current css fill of every region.
pub fn fill_map(fill: &FillState, theme: &Theme) -> HashMap<String, String> {
    fill.region_map()
        .shapes()
        .filter_map(|s| {
            let paint = fill.paint_of(s)?;
            Some((
                s.as_str().to_string(),
                paint.css(&theme.blank, &theme.marker),
            ))
        })
        .collect()
}

/// The art with every region painted as `fill` currently shows it.
pub fn picture_svg(art: &VectorArt, fill: &FillState, theme: &Theme) -> String {
    paint_markup(art.as_str(), &fill_map(fill, theme))
}

/// usvg options able to draw the region numbers.
///
/// The generator's labels name no font family, so the embedded font (or the
/// first system face when none was embedded) becomes the default family.
pub fn label_options(system_fonts: bool) -> usvg::Options<'static> {
    let mut opt = usvg::Options::default();
    let mut fontdb = usvg::fontdb::Database::new();
    if !fonts::FONT_BYTES.is_empty() {
        fontdb.load_font_data(fonts::FONT_BYTES.to_vec());
    }
    if system_fonts {
        fontdb.load_system_fonts();
    }
    let family = fontdb
        .faces()
        .next()
        .and_then(|face| face.families.first().map(|(n, _)| n.clone()));
    match family {
        Some(name) => {
            fontdb.set_sans_serif_family(name.clone());
            opt.font_family = name;
        }
        None => log::warn!("no fonts available, region numbers will not be drawn"),
    }
    opt.fontdb = Arc::new(fontdb);
    opt
}

/// Rasterize SVG markup so that its longer side is `max_side` pixels, on a
/// white background.
pub fn render_png(svg: &str, max_side: u32, opt: &usvg::Options) -> Result<Vec<u8>, RenderError> {
    let pixmap = rasterize(svg, max_side, opt)?;
    Ok(encode_rgba_to_png_bytes(
        pixmap.width(),
        pixmap.height(),
        pixmap.data(),
    )?)
}

fn rasterize(
    svg: &str,
    max_side: u32,
    opt: &usvg::Options,
) -> Result<tiny_skia::Pixmap, RenderError> {
    let tree = usvg::Tree::from_str(svg, opt).map_err(|e| RenderError::Svg(e.to_string()))?;
    let size = tree.size();
    let longest = size.width().max(size.height());
    let scale = if longest > 0.0 {
        max_side as f32 / longest
    } else {
        1.0
    };
    let w = (size.width() * scale).round().max(1.0) as u32;
    let h = (size.height() * scale).round().max(1.0) as u32;
    let mut pixmap = tiny_skia::Pixmap::new(w, h).ok_or(RenderError::Alloc(w, h))?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    log::debug!("rendered {w}x{h} picture");
    Ok(pixmap)
}

// RGBA -> PNG bytes (deterministic for same input)
pub fn encode_rgba_to_png_bytes(
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<Vec<u8>, png::EncodingError> {
    let mut buf = Vec::new();
    {
        let mut enc = Encoder::new(&mut buf, width, height);
        enc.set_color(ColorType::Rgba);
        enc.set_depth(BitDepth::Eight);
        let mut writer = enc.write_header()?;
        writer.write_image_data(rgba)?;
    }
    Ok(buf)
}
