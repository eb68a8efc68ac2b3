use std::cell::RefCell;
use std::rc::Rc;

use pbn_core::{ColoringController, UploadHistory};
use pbn_render::Theme;
use web_sys::{Document, Window};

use crate::config::AppConfig;
use crate::firebase::WebResolver;

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
///
/// The controller sits in its own cell: a resolution in flight only borrows
/// it once the resolver returns, while the rest of the state stays free for
/// input handlers.
pub struct State {
    pub window: Window,
    pub document: Document,
    pub config: AppConfig,
    pub theme: Theme,
    pub history: UploadHistory,
    pub controller: Rc<RefCell<ColoringController>>,
    pub resolver: Rc<WebResolver>,
}

impl State {
    pub fn save_history(&self) {
        let stored = self
            .window
            .local_storage()
            .ok()
            .flatten()
            .map(|s| s.set_item(&self.config.history_key, &self.history.to_json()));
        if !matches!(stored, Some(Ok(()))) {
            log::warn!("could not persist upload history");
        }
    }
}

pub fn load_history(window: &Window, key: &str) -> UploadHistory {
    window
        .local_storage()
        .ok()
        .flatten()
        .and_then(|s| s.get_item(key).ok().flatten())
        .map(|text| UploadHistory::from_json(&text))
        .unwrap_or_default()
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}
