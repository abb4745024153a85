//! Progress reporting for the scrape pipeline.
//!
//! The pipeline talks to a [`Progress`] implementation and never checks
//! whether display is enabled: [`BarProgress`] draws `indicatif` bars,
//! [`NullProgress`] does nothing.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Receives pipeline milestones.
pub trait Progress {
    /// Called once the month plan is known.
    fn start(&self, total_months: u64);
    /// A month page has been fetched, merged and throttled.
    fn month_done(&self);
    /// A transcript was stored; `count` is the running total for the run.
    fn transcript_stored(&self, count: usize);
    /// Remove the display.
    fn finish(&self);
}

/// No-op reporter used with `--no-progress`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl Progress for NullProgress {
    fn start(&self, _total_months: u64) {}
    fn month_done(&self) {}
    fn transcript_stored(&self, _count: usize) {}
    fn finish(&self) {}
}

/// Terminal reporter: a month bar plus a transcript counter spinner.
pub struct BarProgress {
    _multi: MultiProgress,
    months: ProgressBar,
    transcripts: ProgressBar,
}

impl BarProgress {
    pub fn new(with_transcripts: bool) -> Self {
        let multi = MultiProgress::new();

        let months = multi.add(ProgressBar::new(0));
        months.set_style(
            ProgressStyle::default_bar()
                .template("[vdp] {spinner} {msg} {pos}/{len} [{bar:30}] {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        months.set_message("Meses");

        let transcripts = if with_transcripts {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("[vdp] {spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(transcript_message(0));
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };

        Self {
            _multi: multi,
            months,
            transcripts,
        }
    }
}

fn transcript_message(count: usize) -> String {
    format!("Transcripciones {count}")
}

impl Progress for BarProgress {
    fn start(&self, total_months: u64) {
        self.months.set_length(total_months);
        self.months.enable_steady_tick(Duration::from_millis(100));
    }

    fn month_done(&self) {
        self.months.inc(1);
    }

    fn transcript_stored(&self, count: usize) {
        self.transcripts.set_message(transcript_message(count));
        self.transcripts.inc(1);
    }

    fn finish(&self) {
        self.transcripts.finish_and_clear();
        self.months.finish_and_clear();
    }
}
