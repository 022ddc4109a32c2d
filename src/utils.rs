//! Utility helpers shared across the WASM frontend.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Return the current timestamp in **milliseconds** since UNIX epoch.
///
/// Browser only: backed by `js_sys::Date`.
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Current local hour (0-23) as the browser sees it.
pub fn local_hour() -> u32 {
    js_sys::Date::new_0().get_hours()
}

/// Escape text for interpolation into `innerHTML` templates.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// `"1 caption"`, `"3 captions"`.
pub fn pluralize(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}

/// Integer part with thousands separators: `1234567.0` → `"1,234,567"`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}

/// Ratio in `[0, 1]` rendered as a percentage with one decimal.
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

pub fn format_ms(ms: f64) -> String {
    format!("{:.0}ms", ms)
}

/// Compact relative age used by the metrics lists.
pub fn format_time_ago(elapsed_secs: i64) -> String {
    let secs = elapsed_secs.max(0);
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// Parse a backend timestamp.  RFC 3339 strings keep their offset; naive
/// ISO strings (what the backend's `datetime.isoformat()` produces) are taken
/// as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Milliseconds since epoch, `None` for missing or unparseable input.
pub fn timestamp_millis(raw: Option<&str>) -> Option<i64> {
    raw.and_then(parse_timestamp).map(|dt| dt.timestamp_millis())
}

/// Short human date (`"Mar 4, 2025"`), empty when unparseable.
pub fn format_short_date(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.with_timezone(&Local).format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Relative age of `raw` against `now_ms`.
pub fn time_ago_since(raw: Option<&str>, now_ms: f64) -> String {
    match timestamp_millis(raw) {
        Some(ts) => format_time_ago(((now_ms as i64) - ts) / 1000),
        None => String::new(),
    }
}

/// Shorten a filename to `max_chars`, keeping its extension visible:
/// `"a_very_long_holiday_photo.jpeg"` → `"a_very_long_...jpeg"`.
pub fn truncate_filename(filename: &str, max_chars: usize) -> String {
    let total = filename.chars().count();
    if total <= max_chars {
        return filename.to_string();
    }
    let ext = filename.rsplit('.').next().unwrap_or("");
    let keep = max_chars.saturating_sub(ext.chars().count() + 4);
    let stem: String = filename.chars().take(keep).collect();
    format!("{}...{}", stem, ext)
}

/// Truncate to `max_chars` characters with a trailing ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;"
        );
    }

    #[test]
    fn pluralize_singular_and_plural() {
        assert_eq!(pluralize(1, "caption"), "1 caption");
        assert_eq!(pluralize(0, "caption"), "0 captions");
        assert_eq!(pluralize(12, "file"), "12 files");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1_234_567.0), "1,234,567");
        assert_eq!(format_number(-1_000.0), "-1,000");
        assert_eq!(format_percentage(0.953), "95.3%");
        assert_eq!(format_ms(123.4), "123ms");
    }

    #[test]
    fn time_ago_buckets() {
        assert_eq!(format_time_ago(5), "5s ago");
        assert_eq!(format_time_ago(125), "2m ago");
        assert_eq!(format_time_ago(7_200), "2h ago");
        assert_eq!(format_time_ago(200_000), "2d ago");
        assert_eq!(format_time_ago(-3), "0s ago");
    }

    #[test]
    fn parses_offset_and_naive_timestamps() {
        let a = parse_timestamp("2025-01-02T03:04:05Z").unwrap();
        assert_eq!(a.timestamp(), 1_735_787_045);
        assert!(parse_timestamp("2025-01-02T03:04:05.123456").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert_eq!(timestamp_millis(None), None);
    }

    #[test]
    fn filename_truncation_keeps_extension() {
        assert_eq!(truncate_filename("short.png", 20), "short.png");
        let t = truncate_filename("a_very_long_holiday_photo.jpeg", 20);
        assert!(t.ends_with("...jpeg"));
        assert!(t.chars().count() <= 20);
    }

    #[test]
    fn chars_truncation() {
        assert_eq!(truncate_chars("hello", 30), "hello");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }
}
