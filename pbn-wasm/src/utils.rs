use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, Response, Window};

/// `log` backend writing to the browser console.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!(
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        ));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger. `level` comes from the `?log=` query
/// parameter; anything unparseable means `info`.
pub fn init_logging(level: Option<&str>) {
    let filter = level
        .and_then(|l| l.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(filter);
    }
}

/// Readable text for an error thrown by a browser API.
pub fn js_error(v: &JsValue) -> String {
    if let Some(s) = v.as_string() {
        return s;
    }
    js_sys::Reflect::get(v, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{v:?}"))
}

/// Build an absolute URL for an asset, taking into account the optional
/// `window.__BASE_URL` which is set by the host page.
pub fn asset_url(path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") || p.starts_with("data:") {
        return p.to_string();
    }
    let base = web_sys::window()
        .and_then(|w| {
            let v = js_sys::Reflect::get(&w, &JsValue::from_str("__BASE_URL")).ok()?;
            v.as_string()
        })
        .unwrap_or_else(|| "/".to_string());
    join_base(&base, p)
}

fn join_base(base: &str, path: &str) -> String {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    format!("{}{}", base, path.trim_start_matches('/'))
}

/// Send `request` and wait for the response headers. HTTP error statuses
/// are returned as responses, not errors.
pub async fn fetch_request(window: &Window, request: &Request) -> Result<Response, JsValue> {
    let value = JsFuture::from(window.fetch_with_request(request)).await?;
    value.dyn_into::<Response>()
}

pub async fn fetch_url(window: &Window, url: &str) -> Result<Response, JsValue> {
    let value = JsFuture::from(window.fetch_with_str(url)).await?;
    value.dyn_into::<Response>()
}

pub async fn response_bytes(resp: &Response) -> Result<Vec<u8>, JsValue> {
    let buf = JsFuture::from(resp.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&buf).to_vec())
}

pub async fn response_text(resp: &Response) -> Result<String, JsValue> {
    let text = JsFuture::from(resp.text()?).await?;
    Ok(text.as_string().unwrap_or_default())
}

/// Fetch a binary resource trying a list of fallback URLs in order.
pub async fn fetch_bytes_with_fallbacks(window: &Window, urls: &[&str]) -> Option<Vec<u8>> {
    for url in urls {
        let resp = match fetch_url(window, url).await {
            Ok(r) => r,
            Err(_) => continue,
        };
        if !resp.ok() {
            continue;
        }
        if let Ok(bytes) = response_bytes(&resp).await {
            return Some(bytes);
        }
    }
    None
}

/// Simple query string parser used at start-up.
pub fn get_query_param(search: &str, key: &str) -> Option<String> {
    let s = search.trim_start_matches('?');
    for pair in s.split('&') {
        let mut it = pair.splitn(2, '=');
        let k = it.next()?;
        let v = it.next().unwrap_or("");
        if k == key {
            return Some(url_decode(v));
        }
    }
    None
}

fn url_decode(s: &str) -> String {
    percent_encoding::percent_decode_str(&s.replace('+', " "))
        .decode_utf8()
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_are_decoded() {
        let search = "?log=debug&url=https%3A%2F%2Fx%2Fo%2Fuploads%252Fa.jpg&image=panda";
        assert_eq!(get_query_param(search, "log").as_deref(), Some("debug"));
        assert_eq!(
            get_query_param(search, "url").as_deref(),
            Some("https://x/o/uploads%2Fa.jpg")
        );
        assert_eq!(get_query_param(search, "missing"), None);
    }

    #[test]
    fn base_and_path_are_joined_once() {
        assert_eq!(join_base("/app", "/assets/panda.json"), "/app/assets/panda.json");
        assert_eq!(join_base("/", "assets/x.svg"), "/assets/x.svg");
    }
}
