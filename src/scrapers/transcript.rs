//! Transcript page parser.
//!
//! The transcription view of a post holds a `div.post-transcription`
//! whose paragraphs interleave timestamp links with speech:
//!
//! ```html
//! <p><a href="#t=5">0:05</a> hola a todos <a href="#t=12">0:12</a> bienvenidos<br>...</p>
//! ```
//!
//! Each link opens a segment; text up to the next link, `<br>` or end of
//! paragraph belongs to it. Segments that end up with no text are dropped.
//! When no segment survives, the whole container text is kept as a flat
//! transcript.

use super::{
    PARAGRAPH_SEL, TIME_LABEL_RE, TRANSCRIPT_BOILERPLATE, TRANSCRIPT_CONTAINER_SEL,
    TRANSCRIPTION_QUERY, element_text,
};
use crate::fetch::PageFetcher;
use crate::models::{Segment, Transcript};
use crate::utils::{normalize_whitespace, truncate_for_log};
use scraper::{ElementRef, Html, Node};
use std::error::Error;
use tracing::{debug, instrument};

/// Seconds represented by a `M:SS`, `MM:SS` or `H:MM:SS` label.
///
/// Returns `None` for anything else.
pub fn parse_time_label(label: &str) -> Option<u32> {
    let caps = TIME_LABEL_RE.captures(label)?;
    let num = |i: usize| caps.get(i).map_or(Some(0), |m| m.as_str().parse::<u32>().ok());
    let seconds = num(4)?;
    match caps.get(1) {
        Some(_) => Some(num(1)? * 3600 + num(2)? * 60 + seconds),
        None => Some(num(3)? * 60 + seconds),
    }
}

/// Segment currently being accumulated inside a paragraph.
#[derive(Default)]
struct OpenSegment {
    label: Option<String>,
    t: Option<u32>,
    pieces: Vec<String>,
}

impl OpenSegment {
    fn start(&mut self, label: String) {
        self.t = parse_time_label(&label);
        self.label = Some(label);
    }

    /// Text before the first label of a paragraph is discarded.
    fn push(&mut self, text: &str) {
        if self.label.is_some() {
            self.pieces.push(text.to_string());
        }
    }

    fn flush(&mut self, out: &mut Vec<Segment>) {
        let open = std::mem::take(self);
        let Some(label) = open.label else {
            return;
        };
        let text = normalize_whitespace(&open.pieces.join(" "));
        if !text.is_empty() {
            out.push(Segment {
                label,
                t: open.t.unwrap_or(0),
                text,
            });
        }
    }
}

/// Rebuild the labeled segments of a transcript container, in page order.
pub fn parse_segments(container: ElementRef<'_>) -> Vec<Segment> {
    let mut segments = Vec::new();

    for paragraph in container.select(&PARAGRAPH_SEL) {
        let mut open = OpenSegment::default();

        for node in paragraph.children() {
            match node.value() {
                Node::Text(text) => open.push(text),
                Node::Element(element) => {
                    let Some(child) = ElementRef::wrap(node) else {
                        continue;
                    };
                    match element.name() {
                        "a" => {
                            open.flush(&mut segments);
                            open.start(element_text(child, ""));
                        }
                        "br" => open.flush(&mut segments),
                        _ => open.push(&element_text(child, " ")),
                    }
                }
                _ => {}
            }
        }

        open.flush(&mut segments);
    }

    segments
}

/// Build a transcript from a container element.
///
/// Returns `None` when the container holds neither segments nor text.
pub fn parse_container(container: ElementRef<'_>) -> Option<Transcript> {
    let segments = parse_segments(container);
    if segments.is_empty() {
        let raw = element_text(container, " ").replace(TRANSCRIPT_BOILERPLATE, "");
        let text = normalize_whitespace(&raw);
        return (!text.is_empty()).then_some(Transcript::Flat { text });
    }

    let text = normalize_whitespace(
        &segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    );
    Some(Transcript::Segmented { segments, text })
}

/// Parse a full transcription page. `None` when there is no container or
/// it is empty.
#[instrument(level = "debug", skip_all, fields(bytes = html.len()))]
pub fn parse_transcript_page(html: &str) -> Option<Transcript> {
    let document = Html::parse_document(html);
    let Some(container) = document.select(&TRANSCRIPT_CONTAINER_SEL).next() else {
        debug!("No transcript container on page");
        return None;
    };
    let transcript = parse_container(container);
    if let Some(ref t) = transcript {
        debug!(preview = %truncate_for_log(t.text(), 80), "Parsed transcript");
    }
    transcript
}

/// URL of the transcription view for a post.
pub fn transcript_url(post_url: &str) -> String {
    let sep = if post_url.contains('?') { '&' } else { '?' };
    format!("{post_url}{sep}{TRANSCRIPTION_QUERY}")
}

/// Fetch and parse the transcript of one post.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_transcript<F: PageFetcher>(
    fetcher: &F,
    post_url: &str,
) -> Result<Option<Transcript>, Box<dyn Error>> {
    let html = fetcher.fetch(&transcript_url(post_url), false).await?;
    Ok(parse_transcript_page(&html))
}
