use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use slidesynth_common::{BinaryPayload, Deck, FileHandle, NormalizedInput, SynthConfig};
use slidesynth_protocol::{
    fields, ErrorBody, GenerateSlidesResponse, ServiceInfo, TranscriptionResponse,
    GENERATE_PPTX_PATH, GENERATE_SLIDES_PATH, SERVICE_INFO_PATH, TRANSCRIBE_PATH,
};
use std::time::Duration;

use crate::error::{Result, TransportError};

/// HTTP client for the slide service.
///
/// Every call carries the configured timeout and resolves to a value or a
/// classified [`TransportError`]. There are no retries here.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn from_config(config: &SynthConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `POST /generate-slides`
    pub async fn generate_slides(&self, input: &NormalizedInput) -> Result<Deck> {
        tracing::debug!("generating slides from {input}");
        let body = self
            .post_form(GENERATE_SLIDES_PATH, content_form(input))
            .await?;
        let response: GenerateSlidesResponse = parse_json(&body)?;
        let deck = response
            .into_deck()
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        tracing::info!("received {} slides", deck.len());
        Ok(deck)
    }

    /// `POST /generate-pptx`
    pub async fn generate_pptx(
        &self,
        input: &NormalizedInput,
        filename: &str,
    ) -> Result<BinaryPayload> {
        tracing::debug!("exporting {input} as {filename}");
        let form = content_form(input).text(fields::FILENAME, filename.to_string());
        let body = self.post_form(GENERATE_PPTX_PATH, form).await?;
        tracing::info!("received presentation payload ({} bytes)", body.len());
        Ok(BinaryPayload::from(body))
    }

    /// `POST /transcribe`
    pub async fn transcribe(&self, file: &FileHandle) -> Result<String> {
        let form = Form::new().part(fields::TRANSCRIBE_FILE, file_part(file));
        let body = self.post_form(TRANSCRIBE_PATH, form).await?;
        let response: TranscriptionResponse = parse_json(&body)?;
        Ok(response.transcription)
    }

    /// `GET /`
    pub async fn service_info(&self) -> Result<ServiceInfo> {
        let url = self.endpoint(SERVICE_INFO_PATH);
        let request = self.client.get(&url);
        let body = self.execute(&url, request).await?;
        parse_json(&body)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<Vec<u8>> {
        let url = self.endpoint(path);
        let request = self.client.post(&url).multipart(form);
        self.execute(&url, request).await
    }

    async fn execute(&self, url: &str, request: reqwest::RequestBuilder) -> Result<Vec<u8>> {
        let resp = request
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = resp.status();
        tracing::debug!("{url} responded {status}");

        if !status.is_success() {
            let body = resp.bytes().await.map_err(|e| self.classify(url, e))?;
            let err = match ErrorBody::parse(&body).as_ref().and_then(ErrorBody::message) {
                Some(detail) => TransportError::Remote(detail.to_string()),
                None => TransportError::Network(format!("HTTP {status}")),
            };
            tracing::warn!("{url} failed: {err}");
            return Err(err);
        }

        let body = resp.bytes().await.map_err(|e| self.classify(url, e))?;
        Ok(body.to_vec())
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> TransportError {
        let err = TransportError::from_reqwest(err, self.timeout);
        tracing::warn!("{url} failed: {err}");
        err
    }
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| TransportError::Protocol(e.to_string()))
}

/// Text goes under `text_content`, files under `audio_file`.
fn content_form(input: &NormalizedInput) -> Form {
    match input {
        NormalizedInput::Text(text) => Form::new().text(fields::TEXT_CONTENT, text.clone()),
        NormalizedInput::File(file) => Form::new().part(fields::AUDIO_FILE, file_part(file)),
    }
}

fn file_part(file: &FileHandle) -> Part {
    let part = || Part::bytes(file.data().to_vec()).file_name(file.name().to_string());
    match part().mime_str(file.media_type()) {
        Ok(part) => part,
        Err(err) => {
            tracing::warn!(
                "sending {} without a media type ({}): {err}",
                file.name(),
                file.media_type()
            );
            part()
        }
    }
}
