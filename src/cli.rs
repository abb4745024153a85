//! Command-line interface definitions for the archive indexer.
//!
//! This module defines the CLI arguments and options using the `clap` crate.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the archive indexer.
///
/// # Examples
///
/// ```sh
/// # Scrape every year into site/data
/// vdp_index scrape
///
/// # A few years, with transcripts, no progress bars
/// vdp_index scrape --years 2025,2024-2020 --with-transcripts --no-progress
///
/// # Fan transcripts.json out into per-post scripts
/// vdp_index split
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape the archive into index.json (and optionally transcripts.json)
    Scrape(ScrapeArgs),
    /// Split transcripts.json into one script file per post
    Split(SplitArgs),
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Output directory for index.json and transcripts.json
    #[arg(short, long, default_value = "site/data")]
    pub out: PathBuf,

    /// Comma-separated years and ranges (e.g. 2025,2024-2020). Defaults to all years.
    #[arg(short, long, value_parser = parse_years)]
    pub years: Option<YearSelection>,

    /// Fetch and store transcripts in transcripts.json
    #[arg(long)]
    pub with_transcripts: bool,

    /// Delay (seconds) after each month page
    #[arg(long, default_value_t = 0.2)]
    pub delay: f64,

    /// Limit months per year (0 = all). Useful for quick tests.
    #[arg(long, default_value_t = 0)]
    pub max_months: usize,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Transcript store produced by `scrape --with-transcripts`
    #[arg(long, default_value = "site/data/transcripts.json")]
    pub src: PathBuf,

    /// Directory that receives one `<id>.js` per post
    #[arg(long, default_value = "site/transcripts")]
    pub dest: PathBuf,
}

/// Ordered, de-duplicated list of years chosen on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSelection(pub Vec<i32>);

/// Parse `2025,2024-2020` style year lists.
///
/// Ranges are inclusive and may run in either direction. The first
/// occurrence of a year fixes its position; repeats are dropped.
pub fn parse_years(value: &str) -> Result<YearSelection, String> {
    let mut years: Vec<i32> = Vec::new();
    let mut push = |year: i32| {
        if !years.contains(&year) {
            years.push(year);
        }
    };

    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let parse = |s: &str| {
            s.trim()
                .parse::<i32>()
                .map_err(|_| format!("invalid year '{}' in '{part}'", s.trim()))
        };
        match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if start <= end {
                    (start..=end).for_each(&mut push);
                } else {
                    (end..=start).rev().for_each(&mut push);
                }
            }
            None => push(parse(part)?),
        }
    }

    if years.is_empty() {
        return Err("no years given".to_string());
    }
    Ok(YearSelection(years))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_years_list_and_ranges() {
        assert_eq!(
            parse_years("2025,2024-2020").unwrap().0,
            vec![2025, 2024, 2023, 2022, 2021, 2020]
        );
        assert_eq!(parse_years("2019-2021").unwrap().0, vec![2019, 2020, 2021]);
        assert_eq!(parse_years(" 2020 , 2020, 2019-2020 ").unwrap().0, vec![2020, 2019]);
    }

    #[test]
    fn test_parse_years_rejects_garbage() {
        assert!(parse_years("20x5").is_err());
        assert!(parse_years("2020-").is_err());
        assert!(parse_years(",,").is_err());
    }

    #[test]
    fn test_scrape_defaults() {
        let cli = Cli::parse_from(["vdp_index", "scrape"]);
        let Command::Scrape(args) = cli.command else {
            panic!("expected scrape");
        };
        assert_eq!(args.out, PathBuf::from("site/data"));
        assert_eq!(args.years, None);
        assert!(!args.with_transcripts);
        assert_eq!(args.delay, 0.2);
        assert_eq!(args.max_months, 0);
        assert!(!args.no_progress);
    }

    #[test]
    fn test_scrape_flags() {
        let cli = Cli::parse_from([
            "vdp_index",
            "scrape",
            "-o",
            "/tmp/data",
            "--years",
            "2024-2023",
            "--with-transcripts",
            "--delay",
            "1.5",
            "--max-months",
            "2",
            "--no-progress",
        ]);
        let Command::Scrape(args) = cli.command else {
            panic!("expected scrape");
        };
        assert_eq!(args.out, PathBuf::from("/tmp/data"));
        assert_eq!(args.years, Some(YearSelection(vec![2024, 2023])));
        assert!(args.with_transcripts);
        assert_eq!(args.delay, 1.5);
        assert_eq!(args.max_months, 2);
        assert!(args.no_progress);
    }

    #[test]
    fn test_invalid_years_rejected_by_clap() {
        let res = Cli::try_parse_from(["vdp_index", "scrape", "--years", "abc"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_split_defaults() {
        let cli = Cli::parse_from(["vdp_index", "split"]);
        let Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.src, PathBuf::from("site/data/transcripts.json"));
        assert_eq!(args.dest, PathBuf::from("site/transcripts"));
    }
}
