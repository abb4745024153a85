//! JSON persistence for the episode index and transcript store.
//!
//! Both files are read once at startup and rewritten wholesale at the end of
//! a successful run. A missing file is treated as empty state; a file that
//! exists but does not parse is an error, so a bad edit is never silently
//! replaced.

use crate::models::{IndexArtifact, TranscriptStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Read and deserialize a JSON file; `Ok(None)` when it does not exist.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, Box<dyn Error>> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No existing file; starting empty");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            error!(error = %e, "Existing file is not valid JSON for this schema");
            Err(format!("invalid JSON in {}: {e}", path.display()).into())
        }
    }
}

/// Serialize `value` as pretty JSON and write it, creating parent dirs.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).await?;
    info!("Wrote JSON file");
    Ok(())
}

/// Load `index.json`, falling back to an empty index.
pub async fn load_index(path: &Path) -> Result<IndexArtifact, Box<dyn Error>> {
    Ok(load_json(path).await?.unwrap_or_default())
}

/// Load `transcripts.json`, falling back to an empty store.
pub async fn load_transcripts(path: &Path) -> Result<TranscriptStore, Box<dyn Error>> {
    Ok(load_json(path).await?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EpisodeRecord, Transcript};

    #[tokio::test]
    async fn test_missing_files_are_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let index = load_index(&tmp.path().join("index.json")).await.unwrap();
        assert!(index.posts.is_empty());
        let store = load_transcripts(&tmp.path().join("transcripts.json"))
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_index_round_trip_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("index.json");
        let artifact = IndexArtifact {
            generated_at: "2025-01-01T00:00:00+00:00".to_string(),
            source: "https://venganzasdelpasado.com.ar".to_string(),
            posts: vec![EpisodeRecord {
                id: "programa".to_string(),
                title: "Programa 07/03/2024".to_string(),
                date: "2024-03-07".to_string(),
                year: "2024".to_string(),
                month: "03".to_string(),
                post_url: "https://venganzasdelpasado.com.ar/posts/programa".to_string(),
                audio_url: String::new(),
                has_transcription: true,
            }],
            new_posts: 1,
        };
        save_json(&path, &artifact).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"has_transcription\": \"1\""));

        let loaded = load_index(&path).await.unwrap();
        assert_eq!(loaded.posts, artifact.posts);
        assert_eq!(loaded.new_posts, 1);
    }

    #[tokio::test]
    async fn test_non_ascii_is_written_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("transcripts.json");
        let mut store = TranscriptStore::new();
        store.insert(
            "a".to_string(),
            Transcript::Flat {
                text: "Transcripción".to_string(),
            },
        );
        save_json(&path, &store).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Transcripción"));
        assert_eq!(load_transcripts(&path).await.unwrap(), store);
    }

    #[tokio::test]
    async fn test_hand_edited_records_still_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");
        std::fs::write(
            &path,
            r#"{"posts":[{"id":"a","has_transcription":"si"},{"id":"b","title":"B","post_url":"u","has_transcription":"1"}]}"#,
        )
        .unwrap();
        let loaded = load_index(&path).await.unwrap();
        assert_eq!(loaded.posts.len(), 2);
        assert!(!loaded.posts[0].has_transcription);
        assert_eq!(loaded.posts[0].title, "");
        assert!(loaded.posts[1].has_transcription);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_index(&path).await.unwrap_err();
        assert!(err.to_string().contains("index.json"));
    }
}
