use async_trait::async_trait;
use slidesynth_common::{BinaryPayload, Deck, NormalizedInput};
use slidesynth_transport::{HttpTransport, TransportError};

/// Turns an input into a deck.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn generate(&self, input: &NormalizedInput) -> Result<Deck, TransportError>;
}

/// Turns an input into an encoded presentation.
#[async_trait]
pub trait ExportTransport: Send + Sync {
    async fn export_deck(
        &self,
        input: &NormalizedInput,
        filename: &str,
    ) -> Result<BinaryPayload, TransportError>;
}

#[async_trait]
impl GenerationTransport for HttpTransport {
    async fn generate(&self, input: &NormalizedInput) -> Result<Deck, TransportError> {
        self.generate_slides(input).await
    }
}

#[async_trait]
impl ExportTransport for HttpTransport {
    async fn export_deck(
        &self,
        input: &NormalizedInput,
        filename: &str,
    ) -> Result<BinaryPayload, TransportError> {
        self.generate_pptx(input, filename).await
    }
}
