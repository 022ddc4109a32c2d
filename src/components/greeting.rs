//! Animated greeting header: typed time-of-day greeting, the user's name and
//! a rotating motivational quote.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::{Interval, Timeout};
use gloo_timers::future::TimeoutFuture;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlElement};

use crate::constants::{
    EMERGENCY_QUOTE_TEXT, GREETING_REFRESH_MS, GREETING_TYPING_DELAY_MS, NAME_FADE_IN_MS,
    QUOTE_FADE_OUT_MS, QUOTE_ROTATION_MS, QUOTE_TYPING_DELAY_MS, TYPING_CURSOR_LINGER_MS,
};
use crate::dom_utils;
use crate::models::User;
use crate::network::ApiClient;
use crate::state::greeting::{
    display_name, greeting_for_hour, quoted, reveal_steps, QuoteDeck, RotationTickets, Ticket,
};
use crate::utils::{escape_html, local_hour};

// Typed greetings after the first one run a little slower.
const GREETING_UPDATE_DELAY_MS: u32 = 60;

thread_local! {
    static MOUNTED: RefCell<Option<GreetingView>> = RefCell::new(None);
}

#[derive(Clone)]
struct GreetingView {
    api: Rc<ApiClient>,
    deck: Rc<RefCell<QuoteDeck>>,
    rng: Rc<RefCell<StdRng>>,
    quote_tickets: RotationTickets,
    greeting_tickets: RotationTickets,
}

pub fn mount(api: Rc<ApiClient>, user: Option<User>) {
    let view = GreetingView {
        api,
        deck: Rc::new(RefCell::new(QuoteDeck::default())),
        rng: Rc::new(RefCell::new(StdRng::from_entropy())),
        quote_tickets: RotationTickets::new(),
        greeting_tickets: RotationTickets::new(),
    };
    MOUNTED.with(|m| *m.borrow_mut() = Some(view.clone()));

    spawn_local(async move {
        if let Err(e) = view.start(user.as_ref()).await {
            error_log!("Error initializing greeting system: {:?}", e);
            show_emergency_quote();
        }
    });
}

/// Advance to the next quote now.  Any rotation still typing is abandoned.
#[wasm_bindgen(js_name = rotateQuote)]
pub fn rotate_quote() {
    if let Some(view) = MOUNTED.with(|m| m.borrow().clone()) {
        spawn_local(async move { view.rotate_quote().await });
    }
}

#[wasm_bindgen(js_name = updateGreeting)]
pub fn update_greeting() {
    if let Some(view) = MOUNTED.with(|m| m.borrow().clone()) {
        spawn_local(async move { view.update_greeting().await });
    }
}

impl GreetingView {
    async fn start(&self, user: Option<&User>) -> Result<(), JsValue> {
        let (Some(greeting_el), Some(name_el), Some(_)) = (
            dom_utils::by_id("animatedGreeting"),
            dom_utils::by_id("highlightedName"),
            dom_utils::by_id("rotatingQuote"),
        ) else {
            error_log!("Greeting elements not found");
            return Ok(());
        };

        let quotes = match self.api.get_quotes().await {
            Ok(quotes) => quotes,
            Err(e) => {
                error_log!("Error loading motivational quotes: {}", e);
                Vec::new()
            }
        };
        let deck = QuoteDeck::new(quotes, &mut *self.rng.borrow_mut());
        debug_log!("Loaded {} motivational quotes", deck.len());
        *self.deck.borrow_mut() = deck;

        name_el.set_text_content(Some(&display_name(user)));
        name_el.class_list().add_1("animated-color-name")?;

        let greeting = self.current_greeting();
        let ticket = self.greeting_tickets.issue();
        type_text(&greeting_el, greeting, GREETING_TYPING_DELAY_MS, &ticket).await;

        fade_in(&name_el, NAME_FADE_IN_MS).await;
        let name = name_el.clone();
        Timeout::new(TYPING_CURSOR_LINGER_MS, move || {
            let _ = name.class_list().add_1("show-cursor");
        })
        .forget();

        self.rotate_quote().await;

        let view = self.clone();
        Interval::new(QUOTE_ROTATION_MS, move || {
            let view = view.clone();
            spawn_local(async move { view.rotate_quote().await });
        })
        .forget();

        let view = self.clone();
        Interval::new(GREETING_REFRESH_MS, move || {
            let view = view.clone();
            spawn_local(async move { view.update_greeting().await });
        })
        .forget();

        Ok(())
    }

    fn current_greeting(&self) -> &'static str {
        greeting_for_hour(local_hour(), &mut *self.rng.borrow_mut())
    }

    async fn rotate_quote(&self) {
        let ticket = self.quote_tickets.issue();
        let Some(container) = dom_utils::by_id("rotatingQuote") else {
            return;
        };

        if !container.inner_html().trim().is_empty() {
            fade_out(&container, QUOTE_FADE_OUT_MS).await;
            if ticket.is_cancelled() {
                return;
            }
        }

        let quote = self.deck.borrow_mut().next_quote();
        let author = quote
            .author
            .as_deref()
            .filter(|a| !a.is_empty())
            .map(|a| format!(r#"<span class="quote-author">— {}</span>"#, escape_html(a)))
            .unwrap_or_default();
        container.set_inner_html(&format!(r#"<span class="quote-text"></span>{}"#, author));
        dom_utils::set_opacity(&container, "1");

        if let Ok(Some(text_el)) = container.query_selector(".quote-text") {
            type_text(&text_el, &quoted(&quote.text), QUOTE_TYPING_DELAY_MS, &ticket).await;
        }
    }

    async fn update_greeting(&self) {
        let Some(el) = dom_utils::by_id("animatedGreeting") else {
            return;
        };
        let greeting = self.current_greeting();
        if el.text_content().as_deref() != Some(greeting) {
            let ticket = self.greeting_tickets.issue();
            type_text(&el, greeting, GREETING_UPDATE_DELAY_MS, &ticket).await;
        }
    }
}

/// Reveal `text` one grapheme at a time.  Returns `false` when the ticket
/// was cancelled part-way.
async fn type_text(el: &Element, text: &str, delay_ms: u32, ticket: &Ticket) -> bool {
    el.set_text_content(Some(""));
    dom_utils::set_opacity(el, "1");
    dom_utils::toggle_class(el, "typing", true);

    for prefix in reveal_steps(text) {
        if ticket.is_cancelled() {
            return false;
        }
        el.set_text_content(Some(prefix));
        TimeoutFuture::new(delay_ms).await;
    }

    TimeoutFuture::new(TYPING_CURSOR_LINGER_MS).await;
    if ticket.is_cancelled() {
        return false;
    }
    dom_utils::toggle_class(el, "typing", false);
    true
}

fn set_transition(el: &Element, value: &str) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let _ = html.style().set_property("transition", value);
    }
}

async fn fade_in(el: &Element, duration_ms: u32) {
    dom_utils::set_opacity(el, "0");
    set_transition(el, &format!("opacity {}ms ease-in", duration_ms));
    // Let the browser commit opacity 0 before starting the transition.
    TimeoutFuture::new(0).await;
    dom_utils::set_opacity(el, "1");
    TimeoutFuture::new(duration_ms).await;
}

async fn fade_out(el: &Element, duration_ms: u32) {
    set_transition(el, &format!("opacity {}ms ease-out", duration_ms));
    dom_utils::set_opacity(el, "0");
    TimeoutFuture::new(duration_ms).await;
}

fn show_emergency_quote() {
    if let Some(el) = dom_utils::by_id("rotatingQuote") {
        el.set_inner_html(&format!(
            r#"<span class="quote-text">{}</span>"#,
            escape_html(&quoted(EMERGENCY_QUOTE_TEXT))
        ));
        dom_utils::set_opacity(&el, "1");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn typing_stops_when_superseded() {
        let el = dom_utils::document().unwrap().create_element("span").unwrap();
        let tickets = RotationTickets::new();
        let first = tickets.issue();

        let typed = el.clone();
        let run = async move { type_text(&typed, "Hello there", 5, &first).await };
        let superseding = async {
            TimeoutFuture::new(12).await;
            tickets.issue();
        };
        let (finished, _) = futures::join!(run, superseding);

        assert!(!finished);
        let shown = el.text_content().unwrap_or_default();
        assert!(shown.len() < "Hello there".len());
        assert!(el.class_list().contains("typing"));
    }

    #[wasm_bindgen_test]
    async fn full_run_clears_typing_class() {
        let el = dom_utils::document().unwrap().create_element("span").unwrap();
        let ticket = RotationTickets::new().issue();
        assert!(type_text(&el, "Hi 👋", 1, &ticket).await);
        assert_eq!(el.text_content().as_deref(), Some("Hi 👋"));
        assert!(!el.class_list().contains("typing"));
    }
}
