use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, FileReader, HtmlInputElement};

use super::{with_view, ComposerView};
use crate::components::modal;
use crate::constants::SEARCH_DEBOUNCE_MS;
use crate::debounce::Debouncer;
use crate::dom_utils;
use crate::models::{MediaItem, MediaType};
use crate::network::FormValue;
use crate::state::composer::{ComposerState, PendingUpload};
use crate::state::library::MediaFilter;
use crate::toast;
use crate::utils::escape_html;

const PICKER_MODAL_ID: &str = "librarySelectionModal";

#[wasm_bindgen(js_name = openFileUpload)]
pub fn open_file_upload() {
    if let Some(input) = dom_utils::by_id_as::<HtmlInputElement>("media_files") {
        input.click();
    }
}

#[wasm_bindgen(js_name = openLibraryForPost)]
pub fn open_library_for_post() {
    if modal::open_by_id(PICKER_MODAL_ID).is_some() {
        with_view(|view| {
            let filter = view.composer.state().borrow().picker_filter();
            view.load_picker(filter);
        });
    }
}

#[wasm_bindgen(js_name = closeLibraryModal)]
pub fn close_library_modal() {
    modal::close_by_id(PICKER_MODAL_ID);
}

#[wasm_bindgen(js_name = addSelectedToPost)]
pub fn add_selected_to_post() {
    with_view(|view| {
        view.render_preview();
        close_library_modal();
        let count = view.composer.state().borrow().library_media().len();
        toast::success(&format!("Added {} items from library", count));
    });
}

#[wasm_bindgen(js_name = toggleLibraryItem)]
pub fn toggle_library_item(media_id: &str) {
    with_view(|view| view.toggle_picker_item(media_id));
}

#[wasm_bindgen(js_name = removeLibraryMedia)]
pub fn remove_library_media(media_id: &str) {
    with_view(|view| {
        view.composer.state().borrow_mut().remove_library_media(media_id);
        view.render_preview();
    });
}

#[wasm_bindgen(js_name = removeUploadedFile)]
pub fn remove_uploaded_file(index: usize) {
    with_view(|view| {
        view.composer.state().borrow_mut().remove_upload(index);
        view.render_preview();
    });
}

impl ComposerView {
    pub(super) fn wire_media(&self) -> Result<(), JsValue> {
        let view = self.clone();
        dom_utils::on_id("media_files", "change", move |event| {
            let Some(files) = event
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                .and_then(|input| input.files())
            else {
                return;
            };
            let uploads = (0..files.length())
                .filter_map(|i| files.get(i))
                .map(|file| PendingUpload {
                    name: file.name(),
                    mime: file.type_(),
                    value: FormValue::File(file),
                })
                .collect();
            view.composer.state().borrow_mut().set_uploads(uploads);
            view.render_preview();
        })?;

        let view = self.clone();
        dom_utils::on_id("mediaPreviewGrid", "click", move |event| {
            let Some(button) = dom_utils::closest_target(&event, ".remove-preview") else {
                return;
            };
            if let Some(id) = button.get_attribute("data-library-id") {
                view.composer.state().borrow_mut().remove_library_media(&id);
            } else if let Some(index) = button
                .get_attribute("data-upload-index")
                .and_then(|i| i.parse::<usize>().ok())
            {
                view.composer.state().borrow_mut().remove_upload(index);
            }
            view.render_preview();
        })
    }

    pub(super) fn wire_picker(&self) -> Result<(), JsValue> {
        let view = self.clone();
        dom_utils::on_id("libraryModalGrid", "click", move |event| {
            if let Some(id) = dom_utils::closest_target(&event, ".library-modal-item")
                .and_then(|el| el.get_attribute("data-media-id"))
            {
                view.toggle_picker_item(&id);
            }
        })?;

        let debouncer = Debouncer::new(SEARCH_DEBOUNCE_MS);
        let view = self.clone();
        dom_utils::on_id("modalLibrarySearch", "input", move |_| {
            let view = view.clone();
            debouncer.call(move || {
                spawn_local(async move {
                    let query = dom_utils::value_of("modalLibrarySearch");
                    if let Err(e) = view.composer.search_picker(&query).await {
                        error_log!("Error searching library: {}", e);
                    }
                    view.render_picker();
                });
            });
        })?;

        for button in dom_utils::query_all(".btn-modal-filter") {
            let view = self.clone();
            let target = button.clone();
            dom_utils::on(&button, "click", move |_| {
                for other in dom_utils::query_all(".btn-modal-filter") {
                    dom_utils::toggle_class(&other, "active", false);
                }
                dom_utils::toggle_class(&target, "active", true);
                let filter = MediaFilter::parse(&target.get_attribute("data-filter").unwrap_or_default());
                view.load_picker(filter);
            })?;
        }
        Ok(())
    }

    fn load_picker(&self, filter: MediaFilter) {
        let view = self.clone();
        spawn_local(async move {
            if let Err(e) = view.composer.load_picker(filter).await {
                error_log!("Error loading library: {}", e);
            }
            view.render_picker();
        });
    }

    fn render_picker(&self) {
        let Some(grid) = dom_utils::by_id("libraryModalGrid") else {
            return;
        };
        let state = self.composer.state().borrow();
        grid.set_inner_html(&picker_html(&state));
        dom_utils::set_text_by_id("modalSelectionCount", &state.picker_selection_label());
    }

    fn toggle_picker_item(&self, id: &str) {
        let toggled = self.composer.state().borrow_mut().toggle_library_item(id);
        let Some(selected) = toggled else {
            return;
        };
        let item = dom_utils::by_id("libraryModalGrid").and_then(|grid| {
            dom_utils::query_all_in(&grid, ".library-modal-item")
                .into_iter()
                .find(|el| el.get_attribute("data-media-id").as_deref() == Some(id))
        });
        if let Some(item) = item {
            dom_utils::toggle_class(&item, "selected", selected);
            if let Ok(Some(checkbox)) = item.query_selector("input[type='checkbox']") {
                if let Some(checkbox) = checkbox.dyn_ref::<HtmlInputElement>() {
                    checkbox.set_checked(selected);
                }
            }
        }
        let label = self.composer.state().borrow().picker_selection_label();
        dom_utils::set_text_by_id("modalSelectionCount", &label);
    }

    /// Rebuild the combined preview grid: library picks first, then local
    /// files once their data URLs are read.
    pub(super) fn render_preview(&self) {
        let Some(grid) = dom_utils::by_id("mediaPreviewGrid") else {
            return;
        };
        let generation = self.preview_generation.get().wrapping_add(1);
        self.preview_generation.set(generation);

        grid.set_inner_html("");
        let state = self.composer.state().borrow();
        let header = dom_utils::query(".media-preview-header");
        if state.media_count() == 0 {
            if let Some(header) = header {
                dom_utils::set_display(&header, "none");
            }
            return;
        }
        if let Some(header) = header {
            dom_utils::set_display(&header, "block");
        }
        dom_utils::set_text_by_id("mediaCount", &state.media_count_label());

        let html: String = state.library_media().iter().map(library_preview_html).collect();
        grid.set_inner_html(&html);

        for (index, upload) in state.uploads().iter().enumerate() {
            if let Err(e) = self.append_upload_preview(&grid, index, upload, generation) {
                error_log!("Failed to preview {}: {:?}", upload.name, e);
            }
        }
    }

    fn append_upload_preview(
        &self,
        grid: &Element,
        index: usize,
        upload: &PendingUpload,
        generation: u32,
    ) -> Result<(), JsValue> {
        let FormValue::File(file) = &upload.value else {
            return Ok(());
        };
        let reader = FileReader::new()?;
        let grid = grid.clone();
        let current = self.preview_generation.clone();
        let upload = upload.clone();
        let source = reader.clone();
        let onload = Closure::once_into_js(move |_: web_sys::Event| {
            if current.get() != generation {
                return;
            }
            let Some(data_url) = source.result().ok().and_then(|r| r.as_string()) else {
                return;
            };
            let Ok(document) = dom_utils::document() else {
                return;
            };
            if let Ok(div) = document.create_element("div") {
                div.set_class_name("preview-item upload-item");
                div.set_inner_html(&upload_preview_html(&upload, &data_url, index));
                let _ = grid.append_child(&div);
            }
        });
        reader.set_onload(Some(onload.unchecked_ref()));
        reader.read_as_data_url(file)?;
        Ok(())
    }
}

fn media_tag(url: &str, alt: &str, is_image: bool) -> String {
    if is_image {
        format!(r#"<img src="{}" alt="{}">"#, escape_html(url), escape_html(alt))
    } else {
        format!(r#"<video src="{}"></video>"#, escape_html(url))
    }
}

fn library_preview_html(item: &MediaItem) -> String {
    format!(
        r#"<div class="preview-item library-item"><div class="preview-badge">Library</div>{}<button class="remove-preview" data-library-id="{}">×</button></div>"#,
        media_tag(&item.url, &item.filename, item.media_type == MediaType::Image),
        escape_html(&item.id),
    )
}

fn upload_preview_html(upload: &PendingUpload, data_url: &str, index: usize) -> String {
    format!(
        r#"<div class="preview-badge new">New Upload</div>{}<button class="remove-preview" data-upload-index="{}">×</button>"#,
        media_tag(data_url, &upload.name, upload.is_image()),
        index,
    )
}

fn picker_html(state: &ComposerState) -> String {
    let items = state.picker_items();
    if items.is_empty() {
        return r#"<p class="empty-message">No media in library yet</p>"#.to_string();
    }
    items
        .iter()
        .map(|item| {
            let selected = state.is_library_selected(&item.id);
            let thumb = match item.media_type {
                MediaType::Image => media_tag(item.preview_url(), &item.filename, true),
                MediaType::Video => r#"<div class="video-thumb">▶</div>"#.to_string(),
            };
            format!(
                r#"<div class="library-modal-item{sel}" data-media-id="{id}"><div class="item-checkbox"><input type="checkbox"{checked}></div>{thumb}<div class="item-info"><span class="item-name">{name}</span><span class="item-meta">{size}</span></div></div>"#,
                sel = if selected { " selected" } else { "" },
                id = escape_html(&item.id),
                checked = if selected { " checked" } else { "" },
                name = escape_html(&item.filename),
                size = escape_html(&item.file_size),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> MediaItem {
        MediaItem {
            id: id.into(),
            filename: format!("{}.mp4", id),
            media_type: MediaType::Video,
            url: format!("/m/{}.mp4", id),
            thumbnail_url: None,
            file_size: "3 MB".into(),
            used_count: 0,
            upload_date: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn picker_marks_selected_items() {
        let mut state = ComposerState::new();
        state.set_picker_items(vec![item("a"), item("b")]);
        assert_eq!(state.toggle_library_item("b"), Some(true));

        let html = picker_html(&state);
        assert!(html.contains(r#"class="library-modal-item" data-media-id="a""#));
        assert!(html.contains(r#"class="library-modal-item selected" data-media-id="b""#));
        assert_eq!(html.matches(" checked").count(), 1);
    }

    #[test]
    fn empty_picker_has_message() {
        assert!(picker_html(&ComposerState::new()).contains("No media in library yet"));
    }

    #[test]
    fn library_preview_uses_video_tag_for_videos() {
        let html = library_preview_html(&item("v1"));
        assert!(html.contains(r#"<video src="/m/v1.mp4">"#));
        assert!(html.contains(r#"data-library-id="v1""#));
    }
}
