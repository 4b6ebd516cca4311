//! Wire format of the slide service.

use serde::{Deserialize, Serialize};
use slidesynth_common::{Deck, Slide};
use thiserror::Error;

pub const GENERATE_SLIDES_PATH: &str = "/generate-slides";
pub const GENERATE_PPTX_PATH: &str = "/generate-pptx";
pub const TRANSCRIBE_PATH: &str = "/transcribe";
pub const SERVICE_INFO_PATH: &str = "/";

/// Multipart field names. The service picks the text-memo or the
/// audio-transcription path by which content field is present.
pub mod fields {
    pub const TEXT_CONTENT: &str = "text_content";
    pub const AUDIO_FILE: &str = "audio_file";
    pub const FILENAME: &str = "filename";
    pub const TRANSCRIBE_FILE: &str = "file";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateSlidesResponse {
    pub slides: Vec<Slide>,
    pub slide_count: usize,
    pub source_content: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseError {
    #[error("slide_count {reported} does not match {actual} slides")]
    CountMismatch { reported: usize, actual: usize },
}

impl GenerateSlidesResponse {
    pub fn into_deck(self) -> Result<Deck, ResponseError> {
        if self.slide_count != self.slides.len() {
            return Err(ResponseError::CountMismatch {
                reported: self.slide_count,
                actual: self.slides.len(),
            });
        }
        Ok(Deck::new(self.slides, self.source_content))
    }
}

/// Error body of a failed request.
///
/// `detail` is a plain string for errors raised by the service itself but
/// can be a structured list (request validation), so it stays untyped here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// The detail message, when the service sent one as a non-empty string.
    pub fn message(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|d| d.as_str())
            .filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub transcription: String,
}
