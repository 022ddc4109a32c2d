use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

/// Trailing-edge debouncer.  Scheduling a new call drops (and so cancels)
/// the pending timeout.
#[derive(Clone)]
pub struct Debouncer {
    delay_ms: u32,
    pending: Rc<RefCell<Option<Timeout>>>,
}

impl Debouncer {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + 'static,
    {
        let timeout = Timeout::new(self.delay_ms, f);
        // `_previous` outlives the borrow; dropping it cancels the old timer.
        let _previous = self.pending.borrow_mut().replace(timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gloo_timers::future::TimeoutFuture;
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn only_last_call_fires() {
        let debouncer = Debouncer::new(20);
        let hits = Rc::new(Cell::new(0));
        let last = Rc::new(Cell::new(0));
        for i in 1..=3 {
            let (hits, last) = (hits.clone(), last.clone());
            debouncer.call(move || {
                hits.set(hits.get() + 1);
                last.set(i);
            });
        }
        TimeoutFuture::new(60).await;
        assert_eq!(hits.get(), 1);
        assert_eq!(last.get(), 3);
    }
}
