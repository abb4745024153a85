//! Split the transcript store into one lazily loadable script per post.
//!
//! Each generated `<id>.js` registers its payload on a shared window
//! namespace, so the static page only downloads the transcript it shows:
//!
//! ```text
//! window.__vdpTranscripts = window.__vdpTranscripts || {};
//! window.__vdpTranscripts["programa-07-03-2024"] = {"segments":[...],"text":"..."};
//! ```

use crate::models::{Transcript, TranscriptStore};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Global object the front-end reads transcripts from.
pub const TRANSCRIPT_NAMESPACE: &str = "window.__vdpTranscripts";

/// Render the script body for one post.
pub fn render_script(id: &str, payload: &Transcript) -> Result<String, serde_json::Error> {
    let key = serde_json::to_string(id)?;
    let body = serde_json::to_string(payload)?;
    Ok(format!(
        "{ns} = {ns} || {{}};\n{ns}[{key}] = {body};\n",
        ns = TRANSCRIPT_NAMESPACE
    ))
}

/// Ids become file names, so anything that could escape `dest` is refused.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

/// Write `<dest>/<id>.js` for every entry in the store at `src`.
///
/// Returns the number of files written.
///
/// # Errors
///
/// Fails when `src` does not exist or cannot be parsed, or when a file
/// cannot be written.
#[instrument(level = "info", skip_all, fields(src = %src.display(), dest = %dest.display()))]
pub async fn split_transcripts(src: &Path, dest: &Path) -> Result<usize, Box<dyn Error>> {
    if !fs::try_exists(src).await? {
        error!("Transcript store not found");
        return Err(format!("transcript store not found: {}", src.display()).into());
    }
    let raw = fs::read_to_string(src).await?;
    let store: TranscriptStore = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid JSON in {}: {e}", src.display()))?;

    fs::create_dir_all(dest).await?;

    let mut written = 0usize;
    for (id, payload) in &store {
        if !is_safe_id(id) {
            warn!(%id, "Skipping transcript with unusable id");
            continue;
        }
        let script = render_script(id, payload)?;
        fs::write(dest.join(format!("{id}.js")), script).await?;
        written += 1;
    }

    info!(count = written, "Generated transcript scripts");
    Ok(written)
}
