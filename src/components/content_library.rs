//! Content library grid (`#libraryGrid`): filters, sort, server search,
//! upload and preview dialogs.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;

use crate::components::modal;
use crate::constants::{MEDIA_NAME_MAX_CHARS, SEARCH_DEBOUNCE_MS};
use crate::debounce::Debouncer;
use crate::dom_utils;
use crate::models::{MediaItem, MediaType};
use crate::network::{ApiClient, FormValue};
use crate::state::library::{ContentLibrary, LibraryState, LibraryUpload, MediaFilter, SortKey};
use crate::toast;
use crate::utils::{escape_html, format_short_date, pluralize, truncate_filename};

const UPLOAD_MODAL_ID: &str = "libraryUploadModal";
const PREVIEW_MODAL_ID: &str = "libraryPreviewModal";

thread_local! {
    // Set once the grid is mounted so the JS-facing upload button can reach it.
    static MOUNTED: RefCell<Option<LibraryView>> = RefCell::new(None);
}

#[derive(Clone)]
struct LibraryView {
    library: ContentLibrary,
}

pub fn mount(api: Rc<ApiClient>) -> Result<(), JsValue> {
    let view = LibraryView {
        library: ContentLibrary::new(api),
    };
    view.wire()?;
    MOUNTED.with(|m| *m.borrow_mut() = Some(view.clone()));

    spawn_local(async move {
        if let Err(e) = view.library.load().await {
            error_log!("Error loading library: {}", e);
        }
        view.render();
        if let Err(e) = view.library.load_stats().await {
            error_log!("Error loading stats: {}", e);
        }
        view.render_stats();
    });
    Ok(())
}

/// Open the "Upload to Library" dialog.  Bound to the page's upload button.
#[wasm_bindgen(js_name = openLibraryUpload)]
pub fn open_library_upload() -> Result<(), JsValue> {
    match MOUNTED.with(|m| m.borrow().clone()) {
        Some(view) => view.open_upload_dialog(),
        None => Ok(()),
    }
}

impl LibraryView {
    fn wire(&self) -> Result<(), JsValue> {
        for button in dom_utils::query_all(".btn-library-filter") {
            let view = self.clone();
            let target = button.clone();
            dom_utils::on(&button, "click", move |_| {
                for other in dom_utils::query_all(".btn-library-filter") {
                    dom_utils::toggle_class(&other, "active", false);
                }
                dom_utils::toggle_class(&target, "active", true);
                let filter = MediaFilter::parse(&target.get_attribute("data-filter").unwrap_or_default());
                view.library.state().borrow_mut().set_filter(filter);
                view.render();
            })?;
        }

        let debouncer = Debouncer::new(SEARCH_DEBOUNCE_MS);
        let view = self.clone();
        dom_utils::on_id("librarySearch", "input", move |_| {
            let view = view.clone();
            debouncer.call(move || {
                spawn_local(async move {
                    let query = dom_utils::value_of("librarySearch");
                    if let Err(e) = view.library.search(&query).await {
                        error_log!("Error searching library: {}", e);
                    }
                    view.render();
                });
            });
        })?;

        let view = self.clone();
        dom_utils::on_id("librarySort", "change", move |_| {
            let sort = SortKey::parse(&dom_utils::value_of("librarySort"));
            view.library.state().borrow_mut().set_sort(sort);
            view.render();
        })?;

        let view = self.clone();
        dom_utils::on_id("libraryGrid", "click", move |event| {
            let action = |selector: &str| {
                dom_utils::closest_target(&event, selector).and_then(|el| el.get_attribute("data-id"))
            };
            if let Some(id) = action(".btn-media-preview") {
                view.open_preview(&id);
            } else if let Some(id) = action(".btn-use-media") {
                view.use_in_post(id);
            } else if let Some(id) = action(".btn-delete-media") {
                view.delete(id);
            }
        })?;

        dom_utils::on_id("openLibraryUpload", "click", |_| {
            if let Err(e) = open_library_upload() {
                error_log!("Failed to open upload dialog: {:?}", e);
            }
        })
    }

    fn render(&self) {
        let Some(grid) = dom_utils::by_id("libraryGrid") else {
            return;
        };
        let state = self.library.state().borrow();
        grid.set_inner_html(&grid_html(&state));
    }

    fn render_stats(&self) {
        let state = self.library.state().borrow();
        let Some(stats) = state.stats() else {
            return;
        };
        dom_utils::set_text_by_id("libraryTotalItems", &pluralize(stats.total_items as usize, "item"));
        dom_utils::set_text_by_id(
            "libraryTotalSize",
            stats.total_size.as_deref().filter(|s| !s.is_empty()).unwrap_or("0 MB"),
        );
    }

    fn reload_views(&self) {
        self.render();
        self.render_stats();
    }

    fn use_in_post(&self, id: String) {
        let Some(item) = self.library.state().borrow().find(&id).cloned() else {
            return;
        };
        if let Some(preview) = dom_utils::by_id("mediaPreview") {
            if let Ok(document) = dom_utils::document() {
                if let Ok(el) = document.create_element("div") {
                    el.set_class_name("media-preview-item");
                    el.set_inner_html(&media_tag(&item, false));
                    let _ = preview.append_child(&el);
                }
            }
        }

        let view = self.clone();
        spawn_local(async move {
            match view.library.use_in_post(&id).await {
                Ok(()) => {
                    toast::success("Media added to post");
                    view.render();
                }
                Err(e) => {
                    error_log!("Error using media: {}", e);
                    toast::error("Failed to add media");
                }
            }
        });
    }

    fn delete(&self, id: String) {
        let view = self.clone();
        spawn_local(async move {
            let confirm = |message: &str| dom_utils::confirm(message);
            match view.library.delete(&id, &confirm).await {
                Ok(true) => {
                    toast::success("Media deleted from library");
                    view.reload_views();
                }
                Ok(false) => {}
                Err(e) => {
                    error_log!("Error deleting media: {}", e);
                    toast::error("Failed to delete media");
                }
            }
        });
    }

    fn open_preview(&self, id: &str) {
        let Some(item) = self.library.state().borrow().find(id).cloned() else {
            return;
        };
        if let Err(e) = show_preview(&item) {
            error_log!("Failed to open preview: {:?}", e);
        }
    }

    fn open_upload_dialog(&self) -> Result<(), JsValue> {
        let document = dom_utils::document()?;
        if let Some(existing) = document.get_element_by_id(UPLOAD_MODAL_ID) {
            modal::show(&existing);
            return Ok(());
        }

        let (backdrop, content) = modal::ensure_modal(&document, UPLOAD_MODAL_ID, "library-upload-modal")?;
        content.set_inner_html(UPLOAD_FORM_HTML);
        modal::dismiss_on_close(&backdrop)?;
        modal::show(&backdrop);

        let view = self.clone();
        dom_utils::on_id("libraryUploadForm", "submit", move |event| {
            event.prevent_default();
            let file = dom_utils::by_id_as::<HtmlInputElement>("libraryFile")
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            let Some(file) = file else {
                toast::error("Please select a file");
                return;
            };
            let upload = LibraryUpload {
                file: FormValue::File(file),
                tags: dom_utils::value_of("libraryTags"),
                description: dom_utils::value_of("libraryDescription"),
            };
            let view = view.clone();
            let backdrop = backdrop.clone();
            spawn_local(async move {
                match view.library.upload(upload).await {
                    Ok(()) => {
                        toast::success("File uploaded to library");
                        backdrop.remove();
                        view.reload_views();
                    }
                    Err(e) => {
                        error_log!("Upload error: {}", e);
                        toast::error("Upload failed");
                    }
                }
            });
        })
    }
}

const UPLOAD_FORM_HTML: &str = r#"<span class="modal-close">&times;</span>
<h2>Upload to Library</h2>
<form id="libraryUploadForm">
  <div class="form-group"><label>Select File</label><input type="file" id="libraryFile" accept="image/*,video/*" required></div>
  <div class="form-group"><label>Tags (comma separated)</label><input type="text" id="libraryTags" placeholder="e.g., promo, selfie, professional"></div>
  <div class="form-group"><label>Description</label><textarea id="libraryDescription" placeholder="Optional description"></textarea></div>
  <button type="submit" class="btn">Upload to Library</button>
</form>"#;

fn show_preview(item: &MediaItem) -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    let fresh = document.get_element_by_id(PREVIEW_MODAL_ID).is_none();
    let (backdrop, content) = modal::ensure_modal(&document, PREVIEW_MODAL_ID, "media-preview-modal")?;
    content.set_inner_html(&format!(
        r#"<span class="modal-close">&times;</span>{media}<div class="modal-info"><h3>{name}</h3><p>Size: {size} | Used: {used} times</p></div>"#,
        media = media_tag(item, true),
        name = escape_html(&item.filename),
        size = escape_html(&item.file_size),
        used = item.used_count,
    ));
    if fresh {
        modal::dismiss_on_close(&backdrop)?;
    }
    modal::show(&backdrop);
    Ok(())
}

fn media_tag(item: &MediaItem, controls: bool) -> String {
    let url = escape_html(&item.url);
    match item.media_type {
        MediaType::Image => format!(r#"<img src="{}" alt="{}">"#, url, escape_html(&item.filename)),
        MediaType::Video if controls => format!(r#"<video src="{}" controls></video>"#, url),
        MediaType::Video => format!(r#"<video src="{}"></video>"#, url),
    }
}

fn grid_html(state: &LibraryState) -> String {
    let visible = state.visible();
    if visible.is_empty() {
        return r#"<div class="library-empty"><p>No media found</p></div>"#.to_string();
    }
    visible.into_iter().map(media_card_html).collect()
}

fn media_card_html(item: &MediaItem) -> String {
    let id = escape_html(&item.id);
    let preview = match item.media_type {
        MediaType::Image => format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            escape_html(item.preview_url()),
            escape_html(&item.filename)
        ),
        MediaType::Video => r#"<div class="video-thumbnail">▶</div>"#.to_string(),
    };
    let tags = if item.tags.is_empty() {
        String::new()
    } else {
        let spans: String = item
            .tags
            .iter()
            .map(|t| format!(r#"<span class="tag">{}</span>"#, escape_html(t)))
            .collect();
        format!(r#"<div class="media-tags">{}</div>"#, spans)
    };

    format!(
        r#"<div class="media-card" data-id="{id}" data-type="{kind}"><div class="media-preview">{preview}<div class="media-overlay"><button class="btn-media-preview" data-id="{id}">👁</button></div></div><div class="media-info"><span class="media-name" title="{full}">{name}</span><div class="media-meta"><span class="media-size">{size}</span><span class="media-date">{date}</span></div><div class="media-stats"><span class="usage-count">Used {used}</span></div>{tags}<div class="media-actions"><button class="btn-use-media" data-id="{id}">Use in Post</button><button class="btn-delete-media" data-id="{id}">🗑</button></div></div></div>"#,
        kind = item.media_type.as_str(),
        full = escape_html(&item.filename),
        name = escape_html(&truncate_filename(&item.filename, MEDIA_NAME_MAX_CHARS)),
        size = escape_html(&item.file_size),
        date = format_short_date(item.upload_date.as_deref()),
        used = pluralize(item.used_count as usize, "time"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, kind: MediaType, name: &str) -> MediaItem {
        MediaItem {
            id: id.into(),
            filename: name.into(),
            media_type: kind,
            url: format!("/media/{}", name),
            thumbnail_url: None,
            file_size: "1.2 MB".into(),
            used_count: 1,
            upload_date: None,
            tags: vec!["promo".into()],
        }
    }

    #[test]
    fn empty_filtered_grid_shows_placeholder() {
        let mut state = LibraryState::new();
        state.set_media(vec![item("1", MediaType::Image, "a.png")]);
        state.set_filter(MediaFilter::Only(MediaType::Video));
        assert!(grid_html(&state).contains("No media found"));
    }

    #[test]
    fn card_truncates_name_and_carries_action_ids() {
        let html = media_card_html(&item("7", MediaType::Video, "an_extremely_long_clip_name.mp4"));
        assert!(html.contains(r#"data-type="video""#));
        assert!(html.contains(r#"class="btn-use-media" data-id="7""#));
        assert!(html.contains(r#"class="btn-delete-media" data-id="7""#));
        assert!(html.contains("...mp4</span>"));
        assert!(html.contains("Used 1 time<"));
        assert!(html.contains(r#"<span class="tag">promo</span>"#));
    }
}
