use std::cell::RefCell;
use std::rc::Rc;

use pbn_core::{ImageRef, upload_object_name};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlInputElement};

use crate::state::State;
use crate::{render, show_image};

// Wires up the file input: store the photo, remember it, then show it.
pub fn attach_file_input(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc: Document = state.borrow().document.clone();
    let Some(input) = doc.get_element_by_id("file") else {
        return Ok(());
    };
    let input: HtmlInputElement = input.dyn_into()?;
    let st = state.clone();
    let input_for_closure = input.clone();
    let onchange = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
        let Some(file) = input_for_closure.files().and_then(|f| f.item(0)) else {
            log::debug!("no file selected");
            return;
        };
        input_for_closure.set_value("");
        let stamp = js_sys::Date::now() as u64;
        let object = match upload_object_name(&file.name(), file.size() as u64, stamp) {
            Ok(o) => o,
            Err(e) => {
                log::warn!("rejected upload {}: {e}", file.name());
                render::notice(&st.borrow().document, &format!("Cannot use this file: {e}"));
                return;
            }
        };
        let st2 = st.clone();
        let resolver = st.borrow().resolver.clone();
        render::notice(&st.borrow().document, "Uploading...");
        wasm_bindgen_futures::spawn_local(async move {
            match resolver.store().upload(&object, &file).await {
                Ok(url) => {
                    {
                        let mut s = st2.borrow_mut();
                        if s.history.push(url.clone()) {
                            s.save_history();
                        }
                        render::render_history(&s);
                    }
                    show_image(&st2, ImageRef::remote(url));
                }
                Err(e) => {
                    log::error!("upload of {object} failed: {e}");
                    render::notice(
                        &st2.borrow().document,
                        "Upload failed. Check your connection and try again.",
                    );
                }
            }
        });
    }));
    input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
    onchange.forget();
    Ok(())
}
