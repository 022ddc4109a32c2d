//! Time-of-day greeting, quote rotation and typing-animation helpers.

use std::cell::Cell;
use std::rc::Rc;

use rand::seq::SliceRandom;
use rand::Rng;
use unicode_segmentation::UnicodeSegmentation;

use crate::constants::{FALLBACK_QUOTE_AUTHOR, FALLBACK_QUOTE_TEXT, GUEST_NAME};
use crate::models::{Quote, User};

pub const MORNING: &str = "Good Morning,";
pub const AFTERNOON: &str = "Good Afternoon,";
pub const EVENING: &str = "Good Evening,";
pub const LATE_NIGHT: [&str; 2] = ["Good to See You,", "Great to Have You,"];

/// 5-11 morning, 12-16 afternoon, 17-21 evening, otherwise a coin flip
/// between the two late-night variants.
pub fn greeting_for_hour<R: Rng + ?Sized>(hour: u32, rng: &mut R) -> &'static str {
    match hour {
        5..=11 => MORNING,
        12..=16 => AFTERNOON,
        17..=21 => EVENING,
        _ => {
            if rng.gen_bool(0.5) {
                LATE_NIGHT[0]
            } else {
                LATE_NIGHT[1]
            }
        }
    }
}

/// Name shown next to the greeting: full name or username with any
/// parenthesised role suffix removed, `Guest` when nobody is signed in.
pub fn display_name(user: Option<&User>) -> String {
    let Some(user) = user else {
        return GUEST_NAME.to_string();
    };
    let stripped = strip_parenthesised(user.display_name());
    if stripped.is_empty() {
        GUEST_NAME.to_string()
    } else {
        stripped
    }
}

// Drops every closed "(...)" group and normalises the whitespace around it.
fn strip_parenthesised(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('(') {
        match rest[open..].find(')') {
            Some(close) => {
                out.push_str(&rest[..open]);
                out.push(' ');
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn fallback_quote() -> Quote {
    Quote {
        id: Some(serde_json::Value::from(1)),
        text: FALLBACK_QUOTE_TEXT.to_string(),
        author: Some(FALLBACK_QUOTE_AUTHOR.to_string()),
    }
}

/// Shuffled, endlessly cycling quote list.  Never empty.
#[derive(Debug, Clone)]
pub struct QuoteDeck {
    quotes: Vec<Quote>,
    next: usize,
}

impl QuoteDeck {
    pub fn new<R: Rng + ?Sized>(mut quotes: Vec<Quote>, rng: &mut R) -> Self {
        quotes.retain(|q| !q.text.trim().is_empty());
        if quotes.is_empty() {
            quotes.push(fallback_quote());
        }
        quotes.shuffle(rng);
        Self { quotes, next: 0 }
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn next_quote(&mut self) -> Quote {
        let quote = self.quotes[self.next % self.quotes.len()].clone();
        self.next = (self.next + 1) % self.quotes.len();
        quote
    }
}

impl Default for QuoteDeck {
    fn default() -> Self {
        Self {
            quotes: vec![fallback_quote()],
            next: 0,
        }
    }
}

pub fn quoted(text: &str) -> String {
    format!("\"{}\"", text)
}

/// Successive prefixes of `text`, one grapheme longer each time.
pub fn reveal_steps(text: &str) -> impl Iterator<Item = &str> {
    text.grapheme_indices(true)
        .map(move |(i, g)| &text[..i + g.len()])
}

/// Issues rotation tickets.  Issuing a new one cancels all earlier ones.
#[derive(Debug, Clone, Default)]
pub struct RotationTickets {
    current: Rc<Cell<u64>>,
}

impl RotationTickets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        let id = self.current.get().wrapping_add(1);
        self.current.set(id);
        Ticket {
            id,
            current: self.current.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ticket {
    id: u64,
    current: Rc<Cell<u64>>,
}

impl Ticket {
    pub fn is_cancelled(&self) -> bool {
        self.current.get() != self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quote(text: &str) -> Quote {
        Quote {
            text: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn greeting_buckets() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(greeting_for_hour(9, &mut rng), "Good Morning,");
        assert_eq!(greeting_for_hour(14, &mut rng), "Good Afternoon,");
        assert_eq!(greeting_for_hour(19, &mut rng), "Good Evening,");
        assert_eq!(greeting_for_hour(5, &mut rng), MORNING);
        assert_eq!(greeting_for_hour(11, &mut rng), MORNING);
        assert_eq!(greeting_for_hour(12, &mut rng), AFTERNOON);
        assert_eq!(greeting_for_hour(21, &mut rng), EVENING);
        assert!(LATE_NIGHT.contains(&greeting_for_hour(2, &mut rng)));
        assert!(LATE_NIGHT.contains(&greeting_for_hour(22, &mut rng)));
    }

    #[test]
    fn late_night_uses_both_variants() {
        let mut rng = StdRng::seed_from_u64(42);
        let seen: std::collections::HashSet<&str> =
            (0..64).map(|_| greeting_for_hour(2, &mut rng)).collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn display_name_strips_role_suffix() {
        let mut user = User {
            username: "amy".into(),
            full_name: Some("Amy Pond (Admin)".into()),
            ..Default::default()
        };
        assert_eq!(display_name(Some(&user)), "Amy Pond");
        user.full_name = None;
        assert_eq!(display_name(Some(&user)), "amy");
        user.username = "ops (manager) team".into();
        assert_eq!(display_name(Some(&user)), "ops team");
        user.username = "(x)".into();
        assert_eq!(display_name(Some(&user)), GUEST_NAME);
        assert_eq!(display_name(None), "Guest");
    }

    #[test]
    fn unclosed_paren_is_kept() {
        assert_eq!(strip_parenthesised("Amy (Admin"), "Amy (Admin");
    }

    #[test]
    fn empty_deck_falls_back() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut deck = QuoteDeck::new(vec![quote("  ")], &mut rng);
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.next_quote().text, FALLBACK_QUOTE_TEXT);
    }

    #[test]
    fn deck_cycles_through_every_quote() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut deck = QuoteDeck::new(vec![quote("a"), quote("b"), quote("c")], &mut rng);
        let first: Vec<String> = (0..3).map(|_| deck.next_quote().text).collect();
        let second: Vec<String> = (0..3).map(|_| deck.next_quote().text).collect();
        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn reveal_is_grapheme_safe() {
        let steps: Vec<&str> = reveal_steps("hé👋🏽!").collect();
        assert_eq!(steps, vec!["h", "hé", "hé👋🏽", "hé👋🏽!"]);
        assert_eq!(reveal_steps("").count(), 0);
    }

    #[test]
    fn new_ticket_cancels_previous() {
        let tickets = RotationTickets::new();
        let first = tickets.issue();
        assert!(!first.is_cancelled());
        let second = tickets.issue();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }
}
