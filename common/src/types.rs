use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Filename used for exports when the caller does not pick one.
pub const DEFAULT_EXPORT_FILENAME: &str = "slidesynth_presentation.pptx";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub bullets: Vec<String>,
}

impl Slide {
    pub fn new(title: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            title: title.into(),
            bullets,
        }
    }
}

/// Slides returned by the service together with the source text it worked from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub slides: Vec<Slide>,
    pub source_content: String,
}

impl Deck {
    pub fn new(slides: Vec<Slide>, source_content: impl Into<String>) -> Self {
        Self {
            slides,
            source_content: source_content.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }
}

/// A file handed over by a drop or a picker.
///
/// The content is shared behind an `Arc`, so cloning a handle (and every
/// `NormalizedInput` holding one) never copies the bytes. Equality is
/// identity of that shared content, not a byte comparison.
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    media_type: String,
    data: Arc<[u8]>,
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.media_type == other.media_type
            && Arc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for FileHandle {}

impl FileHandle {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing its media type from the extension.
    pub async fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        tracing::debug!("opened {} as {media_type} ({} bytes)", path.display(), data.len());
        Ok(Self::new(name, media_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    File,
    Text,
}

/// The single source the session generates from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedInput {
    File(FileHandle),
    Text(String),
}

impl NormalizedInput {
    pub fn kind(&self) -> InputKind {
        match self {
            NormalizedInput::File(_) => InputKind::File,
            NormalizedInput::Text(_) => InputKind::Text,
        }
    }
}

impl fmt::Display for NormalizedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedInput::File(file) => write!(
                f,
                "file {} ({}, {} bytes)",
                file.name(),
                file.media_type(),
                file.len()
            ),
            NormalizedInput::Text(text) => write!(f, "text ({} chars)", text.chars().count()),
        }
    }
}

/// Opaque export body; the client never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryPayload(Vec<u8>);

impl BinaryPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for BinaryPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
