//! Projects the controller onto the page. Markup is built as strings by pure
//! functions; the DOM writers below only place it.

use pbn_core::{ColoringController, FillState, PaletteEntry, ShapeId, UploadHistory, View};
use pbn_render::picture_svg;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::state::State;

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn status_text(view: &View, fill: Option<&FillState>) -> String {
    match view {
        View::Empty => "Pick a picture to start.".to_string(),
        View::Loading(_) => "Loading...".to_string(),
        View::Failed { message, .. } => message.clone(),
        View::Ready(_) => match fill {
            Some(f) if f.is_complete() => "All done!".to_string(),
            Some(f) => format!("{} regions left", f.total_remaining()),
            None => String::new(),
        },
    }
}

/// One swatch per palette color: the number, a conic progress ring and a
/// check mark once the color is finished.
pub fn palette_html(entries: &[PaletteEntry]) -> String {
    let mut out = String::new();
    for e in entries {
        let mut class = String::from("swatch");
        if e.selected {
            class.push_str(" selected");
        }
        if e.is_complete() {
            class.push_str(" done");
        }
        let deg = (e.progress() * 360.0).round();
        let label = if e.is_complete() {
            "&#10003;".to_string()
        } else {
            e.number.to_string()
        };
        out.push_str(&format!(
            r#"<button class="{class}" data-color="{hex}" title="{left} left" style="background-color: {css}"><span class="ring" style="background: conic-gradient(rgba(0, 0, 0, 0.35) {deg}deg, transparent 0deg)"></span><span class="num">{label}</span></button>"#,
            hex = e.color.hex(),
            left = e.remaining,
            css = e.color.css(),
        ));
    }
    out
}

pub fn gallery_html(names: &[String]) -> String {
    names
        .iter()
        .map(|n| {
            let n = escape(n);
            format!(r#"<button class="thumb" data-image="{n}">{n}</button>"#)
        })
        .collect()
}

pub fn history_html(history: &UploadHistory) -> String {
    history
        .entries()
        .iter()
        .enumerate()
        .rev()
        .map(|(i, url)| {
            let url = escape(url);
            format!(
                r#"<span class="upload"><button data-url="{url}">Upload {n}</button><button class="forget" data-forget="{url}" title="Forget">&#215;</button></span>"#,
                n = i + 1
            )
        })
        .collect()
}

fn html_element(doc: &Document, id: &str) -> Option<HtmlElement> {
    doc.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

fn render_status(doc: &Document, controller: &ColoringController) {
    let view = controller.view();
    if let Some(el) = html_element(doc, "status") {
        el.set_inner_text(&status_text(view, controller.fill()));
    }
    if let Some(btn) = html_element(doc, "retry") {
        btn.set_hidden(!matches!(view, View::Failed { retryable: true, .. }));
    }
}

fn render_palette(doc: &Document, fill: Option<&FillState>) {
    if let Some(el) = doc.get_element_by_id("palette") {
        el.set_inner_html(&fill.map(|f| palette_html(&f.palette())).unwrap_or_default());
    }
}

/// Redraw everything that depends on the controller.
pub fn refresh(state: &State) {
    let controller = state.controller.borrow();
    let doc = &state.document;
    render_status(doc, &controller);
    if let Some(el) = doc.get_element_by_id("picture") {
        let markup = match (controller.art(), controller.fill()) {
            (Some(art), Some(fill)) => picture_svg(art, fill, &state.theme),
            _ => String::new(),
        };
        el.set_inner_html(&markup);
    }
    render_palette(doc, controller.fill());
}

/// Update only the regions in `changed`, then the palette and status.
pub fn repaint(state: &State, changed: &[ShapeId]) {
    let controller = state.controller.borrow();
    let Some(fill) = controller.fill() else {
        return;
    };
    let doc = &state.document;
    if let Some(picture) = doc.get_element_by_id("picture") {
        for shape in changed {
            if let Some(paint) = fill.paint_of(shape)
                && let Some(el) = region_element(&picture, shape)
            {
                let css = paint.css(&state.theme.blank, &state.theme.marker);
                if el.set_attribute("fill", &css).is_err() {
                    log::warn!("could not repaint region {shape}");
                }
            }
        }
    }
    render_status(doc, &controller);
    render_palette(doc, Some(fill));
}

fn region_element(picture: &Element, shape: &ShapeId) -> Option<Element> {
    let selector = format!("[id=\"{}\"]", shape.as_str().replace('"', "\\\""));
    picture.query_selector(&selector).ok().flatten()
}

pub fn render_gallery(state: &State) {
    if let Some(el) = state.document.get_element_by_id("gallery") {
        el.set_inner_html(&gallery_html(&state.config.bundled));
    }
}

pub fn render_history(state: &State) {
    if let Some(el) = state.document.get_element_by_id("history") {
        el.set_inner_html(&history_html(&state.history));
    }
}

/// One-off message in the status line, e.g. a rejected upload.
pub fn notice(doc: &Document, text: &str) {
    if let Some(el) = html_element(doc, "status") {
        el.set_inner_text(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbn_core::{ColorGroup, ImageRef, RegionMap, Rgb};

    fn fill() -> FillState {
        FillState::new(
            RegionMap::new(vec![
                ColorGroup { color: Rgb(0, 0, 0), shapes: vec!["0".into()] },
                ColorGroup { color: Rgb(255, 0, 0), shapes: vec!["1".into(), "2".into()] },
            ])
            .unwrap(),
        )
    }

    #[test]
    fn palette_shows_numbers_then_check() {
        let mut f = fill();
        let html = palette_html(&f.palette());
        assert!(html.contains(r##"data-color="#ff0000""##));
        assert!(html.contains(r#"<span class="num">1</span>"#));
        assert!(html.contains("0deg"));

        f.select_color(Rgb(255, 0, 0));
        f.click_region(&"1".into());
        let html = palette_html(&f.palette());
        assert!(html.contains("swatch selected"));
        assert!(html.contains("180deg"));

        f.click_region(&"2".into());
        let html = palette_html(&f.palette());
        assert!(html.contains("swatch selected done"));
        assert!(html.contains("&#10003;"));
    }

    #[test]
    fn status_follows_view() {
        let mut f = fill();
        let ready = View::Ready(ImageRef::bundled("panda"));
        assert_eq!(status_text(&ready, Some(&f)), "2 regions left");
        f.fill_all();
        assert_eq!(status_text(&ready, Some(&f)), "All done!");
        let failed = View::Failed {
            image: ImageRef::remote("x"),
            message: "nope".into(),
            retryable: true,
        };
        assert_eq!(status_text(&failed, None), "nope");
    }

    #[test]
    fn history_is_newest_first_and_escaped() {
        let mut h = UploadHistory::default();
        h.push("https://a/o/1?alt=media&token=x");
        h.push("https://a/o/2");
        let html = history_html(&h);
        let first = html.find("o/2").unwrap();
        let second = html.find("o/1").unwrap();
        assert!(first < second);
        assert!(html.contains("alt=media&amp;token=x"));
        assert!(html.contains(r#"data-forget="https://a/o/2""#));
    }

    #[test]
    fn forgotten_uploads_leave_the_list() {
        let mut h = UploadHistory::default();
        h.push("uploads/1-a.jpg");
        h.push("uploads/2-b.jpg");
        assert!(h.remove("uploads/1-a.jpg"));
        let html = history_html(&h);
        assert!(!html.contains("1-a.jpg"));
        assert!(html.contains(r#"data-url="uploads/2-b.jpg""#));
        assert!(!h.remove("uploads/1-a.jpg"));
    }
}
