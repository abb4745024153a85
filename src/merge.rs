//! Incremental merge of freshly scraped episodes into the persisted index.
//!
//! Records are keyed by id. A record seen again only gains information:
//! non-empty fresh fields overwrite, empty ones are ignored. The
//! transcription flag always follows the latest sighting. New ids are
//! appended and counted. The final ordering is newest date first with
//! undated records at the end.

use crate::models::{EpisodeRecord, TranscriptStore};
use std::cmp::Ordering;
use std::collections::HashMap;

/// In-memory episode collection with id lookup and first-seen order.
#[derive(Debug, Default)]
pub struct PostIndex {
    posts: Vec<EpisodeRecord>,
    positions: HashMap<String, usize>,
    new_posts: usize,
}

impl PostIndex {
    /// Seed the index with previously persisted records.
    ///
    /// Duplicate ids in the input are folded together, later entries
    /// filling gaps in earlier ones. Seeding never counts as new.
    pub fn from_posts(posts: Vec<EpisodeRecord>) -> Self {
        let mut index = Self::default();
        for post in posts {
            index.upsert(post);
        }
        index.new_posts = 0;
        index
    }

    /// Merge one record. Returns `true` when its id was not known yet.
    pub fn upsert(&mut self, fresh: EpisodeRecord) -> bool {
        match self.positions.get(&fresh.id) {
            Some(&pos) => {
                self.posts[pos].absorb(fresh);
                false
            }
            None => {
                self.positions.insert(fresh.id.clone(), self.posts.len());
                self.posts.push(fresh);
                self.new_posts += 1;
                true
            }
        }
    }

    /// Merge a batch and return how many of its ids were new.
    pub fn merge_batch(&mut self, batch: impl IntoIterator<Item = EpisodeRecord>) -> usize {
        batch.into_iter().map(|r| self.upsert(r)).filter(|&new| new).count()
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&EpisodeRecord> {
        self.positions.get(id).map(|&pos| &self.posts[pos])
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Ids inserted since the index was seeded.
    pub fn new_posts(&self) -> usize {
        self.new_posts
    }

    /// Consume the index, returning records newest first.
    pub fn into_sorted(self) -> Vec<EpisodeRecord> {
        let mut posts = self.posts;
        sort_by_date_desc(&mut posts);
        posts
    }
}

/// Stable sort by `date` descending; records with an empty date go last.
pub fn sort_by_date_desc(posts: &mut [EpisodeRecord]) {
    posts.sort_by(|a, b| match (a.date.is_empty(), b.date.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.date.cmp(&a.date),
    });
}

/// Whether a transcript should be fetched for `post`.
///
/// Only flagged posts are fetched, and only while the store has no
/// non-empty entry for them.
pub fn needs_transcript(post: &EpisodeRecord, store: &TranscriptStore) -> bool {
    post.has_transcription && store.get(&post.id).is_none_or(|t| t.is_empty())
}
