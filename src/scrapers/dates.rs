//! Episode date resolution.
//!
//! Titles usually carry the broadcast date as `DD/MM/YYYY`. When they
//! don't, the audio file name often embeds it as `YYYY-MM-DD`. The title
//! always wins when both are present.
//!
//! No calendar validation is performed: any digit triple of the right
//! shape is accepted as-is.

use super::{FILE_DATE_RE, TITLE_DATE_RE};

/// Resolve an ISO `YYYY-MM-DD` date from a title, falling back to the
/// audio URL. Returns `None` when neither carries a date.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(resolve_date("Programa 07/03/2024", None).as_deref(), Some("2024-03-07"));
/// assert_eq!(resolve_date("Programa", Some("/a/2024-03-07-show.mp3")).as_deref(), Some("2024-03-07"));
/// ```
pub fn resolve_date(title: &str, fallback_url: Option<&str>) -> Option<String> {
    if let Some(caps) = TITLE_DATE_RE.captures(title) {
        return Some(format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]));
    }
    fallback_url
        .and_then(|url| FILE_DATE_RE.captures(url))
        .map(|caps| format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]))
}

/// Split an ISO date into its year and month components.
///
/// Returns empty strings for an empty date.
pub fn year_month(date: &str) -> (String, String) {
    let mut parts = date.split('-');
    let year = parts.next().unwrap_or_default().to_string();
    let month = parts.next().unwrap_or_default().to_string();
    (year, month)
}
