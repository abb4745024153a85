//! Scrapers for the Venganzas del Pasado archive.
//!
//! The archive is a fixed year → month → post hierarchy. Each submodule
//! handles one layer of it:
//!
//! | Module | Input | Output |
//! |--------|-------|--------|
//! | [`archive`] | `/posts`, `/posts/{year}` | years and month page URLs |
//! | [`listing`] | a month page | [`EpisodeRecord`](crate::models::EpisodeRecord)s |
//! | [`dates`] | title text, audio URL | ISO date |
//! | [`transcript`] | a post's transcription page | [`Transcript`](crate::models::Transcript) |
//!
//! Parsers are pure functions over markup; the `fetch_*` helpers pair them
//! with a [`PageFetcher`](crate::fetch::PageFetcher).
//!
//! All patterns and selectors used by the parsers live here as statics and
//! are compiled once per process.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

pub mod archive;
pub mod dates;
pub mod listing;
pub mod transcript;

/// Root of the archive site; relative links are resolved against it.
pub const BASE_URL: &str = "https://venganzasdelpasado.com.ar";

/// `Accept` value that makes the site answer with a turbo-stream partial.
pub const TURBO_STREAM_ACCEPT: &str = "text/vnd.turbo-stream.html";

/// Query marker present on links to a post's transcription view.
pub const TRANSCRIPTION_QUERY: &str = "transcription=true";

/// Heading the site prepends to unsegmented transcripts.
pub const TRANSCRIPT_BOILERPLATE: &str = "Transcripción automática";

pub(crate) static YEAR_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/posts/(\d{4})$").expect("valid year link regex"));
pub(crate) static MONTH_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/posts/(\d{4})/(\d{1,2})$").expect("valid month link regex"));
pub(crate) static TITLE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2})/(\d{2})/(\d{4})").expect("valid title date regex"));
pub(crate) static FILE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("valid file date regex"));
// H:MM:SS or M:SS / MM:SS
pub(crate) static TIME_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d{1,2}):(\d{2})|(\d{1,2})):(\d{2})$").expect("valid time label regex")
});

pub(crate) static YEAR_LINK_SEL: Lazy<Selector> = Lazy::new(|| selector("ul.archive-years a[href]"));
pub(crate) static ANY_LINK_SEL: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
pub(crate) static POST_SEL: Lazy<Selector> = Lazy::new(|| selector("article.post"));
pub(crate) static TITLE_LINK_SEL: Lazy<Selector> = Lazy::new(|| selector("h3.title a[href]"));
pub(crate) static AUDIO_LINK_SEL: Lazy<Selector> = Lazy::new(|| selector("a[href$='.mp3']"));
pub(crate) static TRANSCRIPTION_LINK_SEL: Lazy<Selector> =
    Lazy::new(|| selector(&format!("a[href*='{TRANSCRIPTION_QUERY}']")));
pub(crate) static TRANSCRIPT_CONTAINER_SEL: Lazy<Selector> =
    Lazy::new(|| selector("div.post-transcription"));
pub(crate) static PARAGRAPH_SEL: Lazy<Selector> = Lazy::new(|| selector("p"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

/// Text of an element with each text node trimmed, empty pieces dropped,
/// and the rest joined by `sep`.
pub(crate) fn element_text(element: ElementRef<'_>, sep: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}
