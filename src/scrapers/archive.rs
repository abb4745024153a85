//! Archive navigation: which years exist and which month pages each has.
//!
//! # URL Pattern
//!
//! - `/posts` lists the years under `ul.archive-years`
//! - `/posts/{year}` (requested as a turbo-stream partial) links every
//!   month page as `/posts/{year}/{month}`

use super::{ANY_LINK_SEL, BASE_URL, MONTH_LINK_RE, YEAR_LINK_RE, YEAR_LINK_SEL};
use crate::fetch::PageFetcher;
use itertools::Itertools;
use scraper::Html;
use std::error::Error;
use tracing::{info, instrument, warn};
use url::Url;

/// A month listing page to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonthPage {
    pub year: i32,
    pub month: u32,
    /// Absolute URL of the listing.
    pub url: String,
}

/// Years linked from the archive index, newest first.
pub fn parse_years(html: &str) -> Vec<i32> {
    let document = Html::parse_document(html);
    document
        .select(&YEAR_LINK_SEL)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| YEAR_LINK_RE.captures(href))
        .filter_map(|caps| caps[1].parse::<i32>().ok())
        .unique()
        .sorted_by(|a, b| b.cmp(a))
        .collect()
}

/// Month pages linked from a year page, newest first.
pub fn parse_month_links(html: &str) -> Vec<MonthPage> {
    let base = match Url::parse(BASE_URL) {
        Ok(base) => base,
        Err(e) => {
            warn!(error = %e, "Invalid base URL");
            return Vec::new();
        }
    };
    let document = Html::parse_document(html);
    document
        .select(&ANY_LINK_SEL)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let caps = MONTH_LINK_RE.captures(href)?;
            let year = caps[1].parse::<i32>().ok()?;
            let month = caps[2].parse::<u32>().ok()?;
            let url = base.join(href).ok()?.to_string();
            Some(MonthPage { year, month, url })
        })
        .unique()
        .sorted_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)))
        .collect()
}

/// Fetch the archive index and list every available year.
#[instrument(level = "info", skip_all)]
pub async fn fetch_years<F: PageFetcher>(fetcher: &F) -> Result<Vec<i32>, Box<dyn Error>> {
    let html = fetcher.fetch(&format!("{BASE_URL}/posts"), false).await?;
    let years = parse_years(&html);
    info!(count = years.len(), "Indexed archive years");
    Ok(years)
}

/// Fetch a year page and list its month pages.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_month_pages<F: PageFetcher>(
    fetcher: &F,
    year: i32,
) -> Result<Vec<MonthPage>, Box<dyn Error>> {
    let html = fetcher.fetch(&format!("{BASE_URL}/posts/{year}"), true).await?;
    let months = parse_month_links(&html);
    info!(count = months.len(), "Indexed month pages");
    Ok(months)
}
