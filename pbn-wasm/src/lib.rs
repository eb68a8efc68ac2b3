use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use pbn_core::{
    Click, ColoringController, ImageRef, Resolution, Rgb, ShapeId, Ticket, resolve_into,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, Element, HtmlElement, MouseEvent, Url};

mod config;
mod firebase;
mod render;
mod state;
mod upload;
mod utils;

use config::AppConfig;
use firebase::build_resolver;
use state::{STATE, State, load_history};
use utils::get_query_param;

/// Switch to `image` and resolve it in the background.
pub(crate) fn show_image(state: &Rc<RefCell<State>>, image: ImageRef) {
    let ticket = state.borrow().controller.borrow_mut().switch_image(image);
    run_ticket(state.clone(), ticket);
}

fn run_ticket(state: Rc<RefCell<State>>, ticket: Ticket) {
    let (controller, resolver) = {
        let s = state.borrow();
        render::refresh(&s);
        (s.controller.clone(), s.resolver.clone())
    };
    wasm_bindgen_futures::spawn_local(async move {
        if resolve_into(&controller, &*resolver, ticket).await == Resolution::Current {
            render::refresh(&state.borrow());
        }
    });
}

fn image_for(cfg: &AppConfig, reference: &str) -> ImageRef {
    if cfg.bundled.iter().any(|n| n == reference) {
        ImageRef::bundled(reference)
    } else {
        ImageRef::remote(reference)
    }
}

/// Show a bundled picture by name or an uploaded one by URL or object name.
#[wasm_bindgen]
pub fn show_picture(reference: &str) {
    STATE.with(|st| {
        if let Some(state) = st.borrow().as_ref() {
            let image = image_for(&state.borrow().config, reference);
            show_image(state, image);
        }
    });
}

// The element (or ancestor) of the event target carrying `selector`.
fn target_matching(e: &MouseEvent, selector: &str) -> Option<Element> {
    let target = e.target()?.dyn_into::<Element>().ok()?;
    target.closest(selector).ok().flatten()
}

fn on_click<F>(state: &Rc<RefCell<State>>, id: &str, mut f: F) -> Result<(), JsValue>
where
    F: FnMut(&Rc<RefCell<State>>, &MouseEvent) + 'static,
{
    let Some(el) = state.borrow().document.get_element_by_id(id) else {
        return Ok(());
    };
    let el: HtmlElement = el.dyn_into()?;
    let st = state.clone();
    let onclick = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
        f(&st, &e);
    }));
    el.set_onclick(Some(onclick.as_ref().unchecked_ref()));
    onclick.forget();
    Ok(())
}

// Apply a fill-state edit and repaint what it touched.
fn edit<F>(state: &Rc<RefCell<State>>, f: F)
where
    F: FnOnce(&mut ColoringController) -> Vec<ShapeId>,
{
    let s = state.borrow();
    let changed = f(&mut *s.controller.borrow_mut());
    render::repaint(&s, &changed);
}

fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    upload::attach_file_input(state.clone())?;

    // One handler for every region: ids of the art are region ids.
    on_click(&state, "picture", |st, e| {
        let Some(region) = target_matching(e, "[id]") else {
            return;
        };
        let shape = ShapeId::new(region.id());
        let s = st.borrow();
        let click = s.controller.borrow_mut().click_region(&shape);
        if let Click::Filled {
            color, completed, ..
        } = click
        {
            if completed {
                log::info!("finished color {color}");
            }
            render::repaint(&s, &[shape]);
        }
    })?;

    on_click(&state, "palette", |st, e| {
        let Some(swatch) = target_matching(e, "[data-color]") else {
            return;
        };
        let Some(color) = swatch
            .get_attribute("data-color")
            .and_then(|c| Rgb::from_str(&c).ok())
        else {
            return;
        };
        edit(st, |c| c.select_color(color));
    })?;

    on_click(&state, "gallery", |st, e| {
        if let Some(name) =
            target_matching(e, "[data-image]").and_then(|b| b.get_attribute("data-image"))
        {
            show_image(st, ImageRef::bundled(name));
        }
    })?;

    on_click(&state, "history", |st, e| {
        if let Some(url) =
            target_matching(e, "[data-forget]").and_then(|b| b.get_attribute("data-forget"))
        {
            let mut s = st.borrow_mut();
            if s.history.remove(&url) {
                s.save_history();
            }
            render::render_history(&s);
            return;
        }
        if let Some(url) =
            target_matching(e, "[data-url]").and_then(|b| b.get_attribute("data-url"))
        {
            show_image(st, ImageRef::remote(url));
        }
    })?;

    on_click(&state, "fillAll", |st, _| edit(st, ColoringController::fill_all))?;
    on_click(&state, "clearAll", |st, _| edit(st, ColoringController::clear_all))?;

    on_click(&state, "retry", |st, _| {
        let ticket = st.borrow().controller.borrow_mut().retry();
        if let Some(ticket) = ticket {
            run_ticket(st.clone(), ticket);
        }
    })?;

    on_click(&state, "savePng", |st, _| {
        if let Err(e) = export_png(&st.borrow()) {
            log::error!("could not save picture: {}", utils::js_error(&e));
        }
    })?;

    Ok(())
}

fn export_png(state: &State) -> Result<(), JsValue> {
    let svg = {
        let controller = state.controller.borrow();
        let (Some(art), Some(fill)) = (controller.art(), controller.fill()) else {
            return Ok(());
        };
        pbn_render::picture_svg(art, fill, &state.theme)
    };
    // Region numbers are drawn with the embedded font
    let opt = pbn_render::label_options(false);
    let bytes = pbn_render::render_png(&svg, state.config.export_px, &opt)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    // Create Blob and trigger download
    let array = js_sys::Array::new();
    let u8 = js_sys::Uint8Array::from(bytes.as_slice());
    array.push(&u8);
    let blob = Blob::new_with_u8_array_sequence(&array)?;
    let url = Url::create_object_url_with_blob(&blob)?;
    let a = state.document.create_element("a")?.dyn_into::<HtmlElement>()?;
    a.set_attribute("href", &url)?;
    a.set_attribute("download", "picture.png")?;
    a.click();
    Url::revoke_object_url(&url)?;
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let search = window.location().search().unwrap_or_default();
    utils::init_logging(get_query_param(&search, "log").as_deref());

    let config = AppConfig::from_window(&window);
    let history = load_history(&window, &config.history_key);
    let resolver = Rc::new(build_resolver(&window, &config));
    let state = Rc::new(RefCell::new(State {
        theme: config.theme(),
        window,
        document,
        history,
        controller: Rc::new(RefCell::new(ColoringController::new())),
        resolver,
        config,
    }));
    STATE.with(|st| st.replace(Some(state.clone())));

    attach_ui(state.clone())?;
    {
        let s = state.borrow();
        render::render_gallery(&s);
        render::render_history(&s);
        render::refresh(&s);
    }

    // ?url= opens an upload, ?image= a bundled picture; default is the first
    // bundled one.
    let first = {
        let s = state.borrow();
        get_query_param(&search, "url")
            .map(ImageRef::remote)
            .or_else(|| get_query_param(&search, "image").map(|n| image_for(&s.config, &n)))
            .or_else(|| s.config.bundled.first().map(ImageRef::bundled))
    };
    if let Some(image) = first {
        show_image(&state, image);
    }
    log::info!("paint by number ready");
    Ok(())
}
