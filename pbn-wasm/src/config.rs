use pbn_core::{BLANK_FILL, MARKER_FILL, ResolverConfig};
use pbn_render::Theme;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

/// Runtime settings. The host page may override any of them through a
/// `window.__PBN_CONFIG` object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Storage bucket holding uploads and generated pictures.
    pub bucket: String,
    /// Base URL of the cloud functions (the generator lives at `make_pbn`).
    pub functions_url: String,
    /// Folder with the bundled pictures, relative to `__BASE_URL`.
    pub assets_dir: String,
    pub bundled: Vec<String>,
    pub marker_fill: String,
    pub blank_fill: String,
    /// localStorage key of the upload history.
    pub history_key: String,
    /// Longer side of saved PNGs in pixels.
    pub export_px: u32,
    pub resolver: ResolverConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bucket: "paint-by-number.appspot.com".to_string(),
            functions_url: "https://us-central1-paint-by-number.cloudfunctions.net".to_string(),
            assets_dir: "assets".to_string(),
            bundled: ["panda", "landscape", "flower", "portrait"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            marker_fill: MARKER_FILL.to_string(),
            blank_fill: BLANK_FILL.to_string(),
            history_key: "pbn.uploads".to_string(),
            export_px: 1600,
            resolver: ResolverConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `__PBN_CONFIG` from the global object, falling back to defaults
    /// field by field.
    pub fn from_window(window: &web_sys::Window) -> Self {
        let raw = js_sys::Reflect::get(window, &JsValue::from_str("__PBN_CONFIG"))
            .ok()
            .filter(|v| v.is_object())
            .and_then(|v| js_sys::JSON::stringify(&v).ok())
            .and_then(|s| s.as_string());
        match raw {
            Some(text) => Self::from_json(&text),
            None => Self::default(),
        }
    }

    pub fn from_json(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_else(|e| {
            log::warn!("ignoring malformed __PBN_CONFIG: {e}");
            Self::default()
        })
    }

    pub fn theme(&self) -> Theme {
        Theme {
            blank: self.blank_fill.clone(),
            marker: self.marker_fill.clone(),
        }
    }
}
