//! Output generation for the static site.
//!
//! # Submodules
//!
//! - [`json`]: Loads and writes `index.json` and `transcripts.json`
//! - [`split`]: Fans the transcript store out into one script file per post
//!
//! # Output Structure
//!
//! ```text
//! site/
//! ├── data/
//! │   ├── index.json        # IndexArtifact
//! │   └── transcripts.json  # TranscriptStore
//! └── transcripts/
//!     ├── programa-07-03-2024.js
//!     └── ...
//! ```

pub mod json;
pub mod split;

/// File name of the episode index inside the output directory.
pub const INDEX_FILE: &str = "index.json";

/// File name of the transcript store inside the output directory.
pub const TRANSCRIPTS_FILE: &str = "transcripts.json";
