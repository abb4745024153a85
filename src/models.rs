//! Data models for archive episodes, transcripts and the persisted index.
//!
//! This module defines the structures that flow through the scrape pipeline
//! and land on disk:
//! - [`EpisodeRecord`]: one post from a month listing page
//! - [`Transcript`] / [`Segment`]: the spoken-word content of a post
//! - [`IndexArtifact`]: the `index.json` snapshot consumed by the static site
//!
//! Every record field is string-typed on disk, including the transcription
//! flag which is stored as `"0"` / `"1"` so the front-end schema never changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transcript store keyed by post id, as written to `transcripts.json`.
pub type TranscriptStore = BTreeMap<String, Transcript>;

/// A single episode as discovered on a month listing page.
///
/// The `id` is the slug of the post URL and is the identity used for
/// merging across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EpisodeRecord {
    /// Slug taken from the last path segment of the post URL.
    pub id: String,
    /// Display title with whitespace collapsed.
    #[serde(default)]
    pub title: String,
    /// `YYYY-MM-DD`, or empty when no date could be resolved.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub month: String,
    /// Absolute URL of the post page.
    #[serde(default)]
    pub post_url: String,
    /// Absolute URL of the audio file, or empty.
    #[serde(default)]
    pub audio_url: String,
    #[serde(default, with = "flag")]
    pub has_transcription: bool,
}

impl EpisodeRecord {
    /// Copy every non-empty field of `fresh` over `self`.
    ///
    /// A later scrape that is missing a field never erases what an earlier
    /// scrape recorded. The transcription flag is always a tag on disk, so
    /// the fresh value wins either way. The id is left untouched.
    pub fn absorb(&mut self, fresh: EpisodeRecord) {
        fn take(slot: &mut String, value: String) {
            if !value.is_empty() {
                *slot = value;
            }
        }

        take(&mut self.title, fresh.title);
        take(&mut self.date, fresh.date);
        take(&mut self.year, fresh.year);
        take(&mut self.month, fresh.month);
        take(&mut self.post_url, fresh.post_url);
        take(&mut self.audio_url, fresh.audio_url);
        self.has_transcription = fresh.has_transcription;
    }
}

/// (De)serialize a boolean as the string tags `"1"` and `"0"`.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "1" } else { "0" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "1" => Ok(true),
            "0" | "" => Ok(false),
            other => {
                warn!(tag = other, "Unknown transcription tag, reading as \"0\"");
                Ok(false)
            }
        }
    }
}

/// One timestamp-anchored span of transcript text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Segment {
    /// The timestamp exactly as displayed, e.g. `"12:34"` or `"1:02:03"`.
    pub label: String,
    /// Offset in seconds, 0 when the label is not a timestamp.
    pub t: u32,
    pub text: String,
}

/// The transcript of one post.
///
/// Serialized untagged: the segmented shape carries a `segments` array,
/// the flat shape only `text`. Any entry with `segments` is segmented, even
/// when its `text` is missing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Transcript {
    Segmented {
        segments: Vec<Segment>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        text: String,
    },
    Flat {
        #[serde(default)]
        text: String,
    },
}

impl Transcript {
    /// Full text of the transcript, regardless of shape.
    pub fn text(&self) -> &str {
        match self {
            Transcript::Segmented { text, .. } | Transcript::Flat { text } => text,
        }
    }

    /// An entry with no text and no segments is treated as missing.
    pub fn is_empty(&self) -> bool {
        match self {
            Transcript::Segmented { segments, text } => segments.is_empty() && text.is_empty(),
            Transcript::Flat { text } => text.is_empty(),
        }
    }
}

/// Snapshot written to `index.json`.
///
/// All fields default on load so that older or hand-edited files still
/// contribute their posts.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct IndexArtifact {
    /// RFC 3339 UTC timestamp of the run that produced the file.
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub posts: Vec<EpisodeRecord>,
    /// Number of posts first seen by that run.
    #[serde(default)]
    pub new_posts: usize,
}
