//! Small crate-wide convenience macros.

/// Log a formatted message to the browser console in debug builds.
///
/// Release builds compile the call away.  On non-wasm targets (unit tests)
/// the message goes to stderr instead, so pure modules can log without
/// touching `web_sys`.
///
/// ```rust,ignore
/// debug_log!("Loaded {} captions", captions.len());
/// ```
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(all(debug_assertions, target_arch = "wasm32"))]
        {
            web_sys::console::log_1(&format!($($arg)*).into());
        }
        #[cfg(all(debug_assertions, not(target_arch = "wasm32")))]
        {
            eprintln!("[debug] {}", format!($($arg)*));
        }
    }};
}

/// Log a formatted error to the browser console.  Always enabled.
macro_rules! error_log {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::console::error_1(&format!($($arg)*).into());
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            eprintln!("[error] {}", format!($($arg)*));
        }
    }};
}
