//! The sequential scrape pipeline.
//!
//! 1. **Planning**: resolve target years, then list every month page
//! 2. **Listing**: fetch and parse each month page, merge its posts
//! 3. **Transcripts**: for flagged posts without a stored transcript,
//!    fetch and parse the transcription view
//! 4. **Throttle**: sleep for the configured delay after each month
//!
//! Exactly one request is in flight at any time. A fetch that exhausts its
//! retries aborts the run; nothing is written to disk by this module.

use crate::fetch::PageFetcher;
use crate::merge::{PostIndex, needs_transcript};
use crate::models::{IndexArtifact, TranscriptStore};
use crate::progress::Progress;
use crate::scrapers::archive::{MonthPage, fetch_month_pages, fetch_years};
use crate::scrapers::listing::parse_month_page;
use crate::scrapers::transcript::fetch_transcript;
use crate::scrapers::BASE_URL;
use chrono::{SecondsFormat, Utc};
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

/// Caller-controlled knobs for one run.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Years to scrape, in order. `None` means every year in the archive.
    pub years: Option<Vec<i32>>,
    pub with_transcripts: bool,
    /// Pause after each month page.
    pub delay: Duration,
    /// Keep only the first `n` months of each year; 0 keeps all.
    pub max_months: usize,
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub months: usize,
    pub posts_seen: usize,
    pub new_posts: usize,
    pub transcripts_fetched: usize,
}

/// Everything a run produces, ready to be written.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub index: IndexArtifact,
    pub transcripts: TranscriptStore,
    pub stats: RunStats,
}

/// Resolve the years and list their month pages, truncated per year.
#[instrument(level = "info", skip_all)]
pub async fn plan_months<F: PageFetcher>(
    fetcher: &F,
    options: &ScrapeOptions,
) -> Result<Vec<MonthPage>, Box<dyn Error>> {
    let years = match &options.years {
        Some(years) => years.clone(),
        None => fetch_years(fetcher).await?,
    };

    let mut plan = Vec::new();
    for year in years {
        let mut months = fetch_month_pages(fetcher, year).await?;
        if options.max_months > 0 {
            months.truncate(options.max_months);
        }
        plan.extend(months);
    }
    info!(months = plan.len(), "Planned month pages");
    Ok(plan)
}

/// Run a full scrape on top of previously persisted state.
///
/// `existing` seeds the merge; `transcripts` is the loaded store (empty
/// when transcript fetching is disabled).
#[instrument(level = "info", skip_all, fields(with_transcripts = options.with_transcripts))]
pub async fn run<F: PageFetcher, P: Progress>(
    fetcher: &F,
    progress: &P,
    options: &ScrapeOptions,
    existing: IndexArtifact,
    mut transcripts: TranscriptStore,
) -> Result<ScrapeOutcome, Box<dyn Error>> {
    let plan = plan_months(fetcher, options).await?;
    progress.start(plan.len() as u64);

    let mut index = PostIndex::from_posts(existing.posts);
    let mut stats = RunStats::default();

    for page in &plan {
        let html = fetcher.fetch(&page.url, false).await?;
        let posts = parse_month_page(&html);
        debug!(year = page.year, month = page.month, posts = posts.len(), "Month parsed");
        stats.posts_seen += posts.len();

        let wanted: Vec<(String, String)> = if options.with_transcripts {
            posts
                .iter()
                .filter(|post| needs_transcript(post, &transcripts))
                .map(|post| (post.id.clone(), post.post_url.clone()))
                .collect()
        } else {
            Vec::new()
        };
        let added = index.merge_batch(posts);
        debug!(added, total = index.len(), "Month merged");

        for (id, post_url) in wanted {
            // a page can list the same post twice
            if transcripts.get(&id).is_some_and(|t| !t.is_empty()) {
                continue;
            }
            if let Some(transcript) = fetch_transcript(fetcher, &post_url).await? {
                transcripts.insert(id, transcript);
                stats.transcripts_fetched += 1;
                progress.transcript_stored(stats.transcripts_fetched);
            }
        }

        stats.months += 1;
        progress.month_done();
        if !options.delay.is_zero() {
            sleep(options.delay).await;
        }
    }
    progress.finish();

    stats.new_posts = index.new_posts();
    let artifact = IndexArtifact {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
        source: BASE_URL.to_string(),
        new_posts: stats.new_posts,
        posts: index.into_sorted(),
    };
    info!(
        months = stats.months,
        posts_seen = stats.posts_seen,
        new_posts = stats.new_posts,
        transcripts = stats.transcripts_fetched,
        total = artifact.posts.len(),
        "Scrape complete"
    );

    Ok(ScrapeOutcome {
        index: artifact,
        transcripts,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EpisodeRecord, Transcript};
    use crate::progress::NullProgress;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages and records every request.
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<(String, bool)>>,
    }

    impl FakeSite {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn requests(&self) -> Vec<(String, bool)> {
            self.requests.lock().unwrap().clone()
        }

        fn count(&self, url: &str) -> usize {
            self.requests().iter().filter(|(u, _)| u == url).count()
        }
    }

    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &str, turbo_stream: bool) -> Result<String, Box<dyn Error>> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), turbo_stream));
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| format!("404 for {url}").into())
        }
    }

    const ARCHIVE: &str = r#"<ul class="archive-years"><li><a href="/posts/2024">2024</a></li></ul>"#;
    const YEAR_2024: &str = r#"
        <turbo-stream>
          <a href="/posts/2024/2">febrero</a>
          <a href="/posts/2024/3">marzo</a>
        </turbo-stream>
    "#;
    const MARCH: &str = r#"
        <article class="post">
          <h3 class="title"><a href="/posts/programa-07-03-2024">Programa 07/03/2024</a></h3>
          <a href="https://cdn.example.com/2024-03-07.mp3">mp3</a>
          <a href="/posts/programa-07-03-2024?transcription=true">transcripción</a>
        </article>
        <article class="post">
          <h3 class="title"><a href="/posts/sin-fecha">Especial</a></h3>
        </article>
    "#;
    const FEBRUARY: &str = r#"
        <article class="post">
          <h3 class="title"><a href="/posts/programa-01-02-2024">Programa 01/02/2024</a></h3>
        </article>
    "#;
    const TRANSCRIPT: &str = r#"
        <div class="post-transcription"><p><a>0:05</a> hola <a>0:10</a> chau</p></div>
    "#;

    const POSTS: &str = "https://venganzasdelpasado.com.ar/posts";
    const TRANSCRIPT_URL: &str =
        "https://venganzasdelpasado.com.ar/posts/programa-07-03-2024?transcription=true";

    fn site() -> FakeSite {
        FakeSite::default()
            .with(POSTS, ARCHIVE)
            .with(&format!("{POSTS}/2024"), YEAR_2024)
            .with(&format!("{POSTS}/2024/3"), MARCH)
            .with(&format!("{POSTS}/2024/2"), FEBRUARY)
            .with(TRANSCRIPT_URL, TRANSCRIPT)
    }

    fn options(with_transcripts: bool) -> ScrapeOptions {
        ScrapeOptions {
            years: None,
            with_transcripts,
            delay: Duration::ZERO,
            max_months: 0,
        }
    }

    #[tokio::test]
    async fn test_full_run_builds_sorted_index() {
        let site = site();
        let outcome = run(
            &site,
            &NullProgress,
            &options(false),
            IndexArtifact::default(),
            TranscriptStore::new(),
        )
        .await
        .unwrap();

        let ids: Vec<&str> = outcome.index.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["programa-07-03-2024", "programa-01-02-2024", "sin-fecha"]);
        assert_eq!(outcome.index.new_posts, 3);
        assert_eq!(outcome.index.source, BASE_URL);
        assert_eq!(outcome.stats.months, 2);
        assert_eq!(outcome.stats.posts_seen, 3);
        assert!(outcome.transcripts.is_empty());
        assert_eq!(site.count(TRANSCRIPT_URL), 0);
    }

    #[tokio::test]
    async fn test_year_page_requested_as_turbo_stream() {
        let site = site();
        run(
            &site,
            &NullProgress,
            &options(false),
            IndexArtifact::default(),
            TranscriptStore::new(),
        )
        .await
        .unwrap();

        let requests = site.requests();
        assert_eq!(requests[0], (POSTS.to_string(), false));
        assert_eq!(requests[1], (format!("{POSTS}/2024"), true));
        assert!(requests[2..].iter().all(|(_, turbo)| !turbo));
        // newest month first
        assert_eq!(requests[2].0, format!("{POSTS}/2024/3"));
    }

    #[tokio::test]
    async fn test_explicit_years_skip_archive_index() {
        let site = site();
        let opts = ScrapeOptions {
            years: Some(vec![2024]),
            max_months: 1,
            ..options(false)
        };
        let outcome = run(
            &site,
            &NullProgress,
            &opts,
            IndexArtifact::default(),
            TranscriptStore::new(),
        )
        .await
        .unwrap();

        assert_eq!(site.count(POSTS), 0);
        assert_eq!(site.count(&format!("{POSTS}/2024/2")), 0);
        assert_eq!(outcome.stats.months, 1);
    }

    #[tokio::test]
    async fn test_transcripts_are_fetched_once() {
        let site = site();
        let first = run(
            &site,
            &NullProgress,
            &options(true),
            IndexArtifact::default(),
            TranscriptStore::new(),
        )
        .await
        .unwrap();
        assert_eq!(site.count(TRANSCRIPT_URL), 1);
        assert_eq!(first.stats.transcripts_fetched, 1);
        assert_eq!(
            first.transcripts["programa-07-03-2024"].text(),
            "hola chau"
        );

        let second = run(
            &site,
            &NullProgress,
            &options(true),
            first.index,
            first.transcripts,
        )
        .await
        .unwrap();
        assert_eq!(site.count(TRANSCRIPT_URL), 1);
        assert_eq!(second.stats.transcripts_fetched, 0);
        assert_eq!(second.index.new_posts, 0);
        assert_eq!(second.index.posts.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_stored_transcript_is_refetched() {
        let site = site();
        let mut store = TranscriptStore::new();
        store.insert(
            "programa-07-03-2024".to_string(),
            Transcript::Flat { text: String::new() },
        );
        let outcome = run(
            &site,
            &NullProgress,
            &options(true),
            IndexArtifact::default(),
            store,
        )
        .await
        .unwrap();
        assert_eq!(site.count(TRANSCRIPT_URL), 1);
        assert!(!outcome.transcripts["programa-07-03-2024"].is_empty());
    }

    #[tokio::test]
    async fn test_existing_detail_survives_rescrape() {
        let site = site();
        let existing = IndexArtifact {
            posts: vec![EpisodeRecord {
                id: "sin-fecha".to_string(),
                title: "Especial".to_string(),
                date: "2023-12-24".to_string(),
                year: "2023".to_string(),
                month: "12".to_string(),
                post_url: format!("{POSTS}/sin-fecha"),
                audio_url: "https://cdn.example.com/especial.mp3".to_string(),
                has_transcription: false,
            }],
            ..Default::default()
        };
        let outcome = run(
            &site,
            &NullProgress,
            &options(false),
            existing,
            TranscriptStore::new(),
        )
        .await
        .unwrap();

        let special = outcome
            .index
            .posts
            .iter()
            .find(|p| p.id == "sin-fecha")
            .unwrap();
        assert_eq!(special.date, "2023-12-24");
        assert_eq!(special.audio_url, "https://cdn.example.com/especial.mp3");
        assert_eq!(outcome.index.new_posts, 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_run() {
        let site = FakeSite::default()
            .with(POSTS, ARCHIVE)
            .with(&format!("{POSTS}/2024"), YEAR_2024)
            .with(&format!("{POSTS}/2024/3"), MARCH);
        let err = run(
            &site,
            &NullProgress,
            &options(false),
            IndexArtifact::default(),
            TranscriptStore::new(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("/posts/2024/2"));
    }
}
