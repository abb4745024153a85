//! Month listing page parser.
//!
//! A month page lists every post published that month as an
//! `article.post` block:
//!
//! ```html
//! <article class="post">
//!   <h3 class="title"><a href="/posts/programa-07-03-2024">Programa 07/03/2024</a></h3>
//!   <a href="https://.../2024-03-07-programa.mp3">Descargar</a>
//!   <a href="/posts/programa-07-03-2024?transcription=true">Transcripción</a>
//! </article>
//! ```
//!
//! Missing pieces degrade to empty fields. Only a block without a usable
//! title link is dropped.

use super::dates::{resolve_date, year_month};
use super::{
    AUDIO_LINK_SEL, BASE_URL, POST_SEL, TITLE_LINK_SEL, TRANSCRIPTION_LINK_SEL, element_text,
};
use crate::models::EpisodeRecord;
use crate::utils::normalize_whitespace;
use scraper::{ElementRef, Html};
use tracing::{debug, instrument};

/// Extract every episode on a month page, in page order.
#[instrument(level = "debug", skip_all, fields(bytes = html.len()))]
pub fn parse_month_page(html: &str) -> Vec<EpisodeRecord> {
    let document = Html::parse_document(html);
    let posts: Vec<EpisodeRecord> = document.select(&POST_SEL).filter_map(parse_post).collect();
    debug!(count = posts.len(), "Parsed month listing");
    posts
}

fn parse_post(article: ElementRef<'_>) -> Option<EpisodeRecord> {
    let Some(title_link) = article.select(&TITLE_LINK_SEL).next() else {
        debug!("Post block without title link; skipping");
        return None;
    };
    let href = title_link.value().attr("href").unwrap_or_default();
    let title = normalize_whitespace(&element_text(title_link, " "));
    let id = slug(href);
    if id.is_empty() || title.is_empty() {
        debug!(%href, "Post block with empty slug or title; skipping");
        return None;
    }

    let audio_url = article
        .select(&AUDIO_LINK_SEL)
        .next()
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default()
        .to_string();
    let has_transcription = article.select(&TRANSCRIPTION_LINK_SEL).next().is_some();

    let date = resolve_date(&title, Some(&audio_url)).unwrap_or_default();
    let (year, month) = year_month(&date);

    Some(EpisodeRecord {
        id,
        title,
        date,
        year,
        month,
        post_url: absolute_url(href),
        audio_url,
        has_transcription,
    })
}

/// Last non-empty path segment of `href`, ignoring trailing slashes.
pub fn slug(href: &str) -> String {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Prefix root-relative links with [`BASE_URL`]; leave anything else alone.
pub fn absolute_url(href: &str) -> String {
    if href.starts_with('/') {
        format!("{BASE_URL}{href}")
    } else {
        href.to_string()
    }
}
