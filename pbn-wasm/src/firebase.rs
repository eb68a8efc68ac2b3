//! Browser implementations of the resolver collaborators: bundled files under
//! the app's base URL, the Firebase Storage REST API as the object store, and
//! the `make_pbn` cloud function as the generator.

use pbn_core::{
    AssetResolver, Clock, GenerateError, Generator, LocalAssets, LookupError, ObjectStore,
    RawAsset, TransportError,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Window};

use crate::config::AppConfig;
use crate::utils::{
    asset_url, fetch_bytes_with_fallbacks, fetch_request, fetch_url, js_error, response_bytes,
    response_text,
};

const STORAGE_API: &str = "https://firebasestorage.googleapis.com/v0/b";
const GENERATE_FUNCTION: &str = "make_pbn";

// Object names go into a single path segment, so '/' must be escaped.
const OBJECT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub type WebResolver = AssetResolver<BundledAssets, StorageBucket, CloudFunction, BrowserClock>;

pub fn build_resolver(window: &Window, cfg: &AppConfig) -> WebResolver {
    AssetResolver::new(
        BundledAssets {
            window: window.clone(),
            dir: cfg.assets_dir.clone(),
            map_ext: cfg.resolver.map_ext.clone(),
            art_ext: cfg.resolver.art_ext.clone(),
        },
        StorageBucket {
            window: window.clone(),
            bucket: cfg.bucket.clone(),
        },
        CloudFunction {
            window: window.clone(),
            base: cfg.functions_url.trim_end_matches('/').to_string(),
        },
        BrowserClock,
        cfg.resolver.clone(),
    )
}

fn transport(e: JsValue) -> TransportError {
    TransportError::new(js_error(&e))
}

pub struct BundledAssets {
    window: Window,
    dir: String,
    map_ext: String,
    art_ext: String,
}

impl BundledAssets {
    async fn file(&self, name: &str, ext: &str) -> Result<Vec<u8>, TransportError> {
        let rel = format!("{}/{}.{}", self.dir, name, ext);
        fetch_bytes_with_fallbacks(&self.window, &[&asset_url(&rel), &format!("/{rel}"), &rel])
            .await
            .ok_or_else(|| TransportError::new(format!("{rel} is not available")))
    }
}

impl LocalAssets for BundledAssets {
    async fn load(&self, name: &str) -> Result<RawAsset, TransportError> {
        let map = self.file(name, &self.map_ext).await?;
        let art = self.file(name, &self.art_ext).await?;
        Ok(RawAsset { map, art })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ObjectMetadata {
    #[serde(rename = "downloadTokens", default)]
    download_tokens: Option<String>,
}

pub struct StorageBucket {
    window: Window,
    bucket: String,
}

impl StorageBucket {
    fn object_url(&self, key: &str) -> String {
        format!(
            "{STORAGE_API}/{}/o/{}",
            self.bucket,
            utf8_percent_encode(key, OBJECT)
        )
    }

    /// Store `file` under `object` and return its download URL.
    pub async fn upload(&self, object: &str, file: &web_sys::File) -> Result<String, TransportError> {
        let url = format!(
            "{STORAGE_API}/{}/o?name={}",
            self.bucket,
            utf8_percent_encode(object, OBJECT)
        );
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(file);
        let request = Request::new_with_str_and_init(&url, &init).map_err(transport)?;
        let mime = file.type_();
        if !mime.is_empty() {
            request
                .headers()
                .set("Content-Type", &mime)
                .map_err(transport)?;
        }
        let resp = fetch_request(&self.window, &request).await.map_err(transport)?;
        if !resp.ok() {
            return Err(TransportError::new(format!(
                "upload of {object} failed with HTTP {}",
                resp.status()
            )));
        }
        let text = response_text(&resp).await.map_err(transport)?;
        log::info!("uploaded {object}");
        Ok(self.download_link(object, &text))
    }

    fn download_link(&self, key: &str, metadata: &str) -> String {
        let meta: ObjectMetadata = serde_json::from_str(metadata).unwrap_or_default();
        download_link(&self.object_url(key), meta.download_tokens.as_deref())
    }
}

fn download_link(object_url: &str, tokens: Option<&str>) -> String {
    match tokens.and_then(|t| t.split(',').next()).filter(|t| !t.is_empty()) {
        Some(token) => format!("{object_url}?alt=media&token={token}"),
        None => format!("{object_url}?alt=media"),
    }
}

impl ObjectStore for StorageBucket {
    async fn download_url(&self, key: &str) -> Result<String, LookupError> {
        let resp = fetch_url(&self.window, &self.object_url(key))
            .await
            .map_err(transport)?;
        match resp.status() {
            404 => return Err(LookupError::NotFound(key.to_string())),
            s if !resp.ok() => {
                return Err(TransportError::new(format!("HTTP {s} looking up {key}")).into());
            }
            _ => {}
        }
        let text = response_text(&resp).await.map_err(transport)?;
        Ok(self.download_link(key, &text))
    }

    async fn fetch_content(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let resp = fetch_url(&self.window, url).await.map_err(transport)?;
        if !resp.ok() {
            return Err(TransportError::new(format!("HTTP {}", resp.status())));
        }
        response_bytes(&resp).await.map_err(transport)
    }
}

pub struct CloudFunction {
    window: Window,
    base: String,
}

#[derive(Debug, Default, Deserialize)]
struct CallableError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct CallableReply {
    #[serde(default)]
    error: Option<CallableError>,
}

impl Generator for CloudFunction {
    async fn generate(&self, object: &str) -> Result<(), GenerateError> {
        let body = serde_json::json!({ "data": { "id": object } }).to_string();
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&JsValue::from_str(&body));
        let url = format!("{}/{GENERATE_FUNCTION}", self.base);
        let request =
            Request::new_with_str_and_init(&url, &init).map_err(|e| GenerateError(js_error(&e)))?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|e| GenerateError(js_error(&e)))?;

        log::debug!("calling {GENERATE_FUNCTION} for {object}");
        let resp = fetch_request(&self.window, &request)
            .await
            .map_err(|e| GenerateError(js_error(&e)))?;
        let text = response_text(&resp).await.unwrap_or_default();
        let reply: CallableReply = serde_json::from_str(&text).unwrap_or_default();
        if let Some(err) = reply.error {
            return Err(GenerateError(err.message));
        }
        if !resp.ok() {
            return Err(GenerateError(format!("HTTP {}", resp.status())));
        }
        Ok(())
    }
}

pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    async fn sleep(&self, ms: u32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().is_some_and(|w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32)
                    .is_ok()
            });
            if !scheduled {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}
