use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Photo types the generation service can decode.
pub const UPLOAD_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "bmp"];
/// Larger photos make generation run out of memory.
pub const MAX_UPLOAD_BYTES: u64 = 12 * 1024 * 1024;
/// Folder in the object store that receives uploads.
pub const UPLOAD_PREFIX: &str = "uploads";

const STEM_MAX: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("unsupported image type {0:?}")]
    UnsupportedType(String),
    #[error("image is {size} bytes, the limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

/// Object name for a picked file: `uploads/<stamp>-<stem>.<ext>`.
///
/// The generator splits the name on its only dot, so the stem never
/// contains one.
pub fn upload_object_name(file_name: &str, size: u64, stamp: u64) -> Result<String, UploadError> {
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((s, e)) => (s, e.to_ascii_lowercase()),
        None => (file_name, String::new()),
    };
    if !UPLOAD_EXTENSIONS.contains(&ext.as_str()) {
        return Err(UploadError::UnsupportedType(file_name.to_string()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(format!("{UPLOAD_PREFIX}/{stamp}-{}.{ext}", sanitize_stem(stem)))
}

fn sanitize_stem(stem: &str) -> String {
    let mut out = String::new();
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
        if out.len() >= STEM_MAX {
            break;
        }
    }
    let out = out.trim_matches('-');
    if out.is_empty() {
        "image".to_string()
    } else {
        out.to_string()
    }
}

/// Previously uploaded pictures, oldest first, as persisted on the client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadHistory {
    entries: Vec<String>,
}

impl UploadHistory {
    /// Unreadable stored state starts a fresh history.
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(h) => h,
            Err(e) => {
                log::warn!("discarding unreadable upload history: {e}");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "[]".to_string())
    }

    /// Appends `url` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.entries.contains(&url) {
            return false;
        }
        self.entries.push(url);
        true
    }

    pub fn remove(&mut self, url: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != url);
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
