//! Normalizes drops, picks and typed text into a [`NormalizedInput`].
//!
//! Rejections are silent: a drop with nothing usable or blank text yields
//! `None`, never an error.

use slidesynth_common::{FileHandle, NormalizedInput};
use std::path::Path;

/// Exact media types accepted from a drop, besides any `audio/*`.
pub const ACCEPTED_TEXT_TYPES: &[&str] = &["text/plain", "text/markdown"];

/// Extensions offered by the file picker.
pub const PICKER_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "txt", "md"];

pub fn is_accepted_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("audio/") || ACCEPTED_TEXT_TYPES.contains(&essence.as_str())
}

/// First dropped item with an accepted media type.
pub fn from_drop<I>(items: I) -> Option<NormalizedInput>
where
    I: IntoIterator<Item = FileHandle>,
{
    let picked = items
        .into_iter()
        .find(|file| is_accepted_media_type(file.media_type()));
    if picked.is_none() {
        tracing::debug!("drop ignored: no audio, text or markdown item");
    }
    picked.map(NormalizedInput::File)
}

/// First picked item. The picker filter is only a hint, so nothing is checked.
pub fn from_picker<I>(items: I) -> Option<NormalizedInput>
where
    I: IntoIterator<Item = FileHandle>,
{
    items.into_iter().next().map(NormalizedInput::File)
}

/// Trimmed text, or `None` when nothing is left.
pub fn from_text(raw: &str) -> Option<NormalizedInput> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| NormalizedInput::Text(trimmed.to_string()))
}

/// Whether a submit control for `raw` should be enabled.
pub fn can_submit_text(raw: &str) -> bool {
    !raw.trim().is_empty()
}

/// Read `path` and treat it as a single picked file.
pub async fn pick_path<P: AsRef<Path>>(path: P) -> std::io::Result<NormalizedInput> {
    let file = FileHandle::open(path).await?;
    Ok(NormalizedInput::File(file))
}
