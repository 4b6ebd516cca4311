use slidesynth_common::ConfigError;
use slidesynth_transport::TransportError;
use thiserror::Error;

use crate::session::Command;

/// Session error shown when generation fails without a usable detail.
pub const GENERATE_FAILED: &str = "Failed to generate slides. Please try again.";
/// Session error shown when an export fails without a usable detail.
pub const DOWNLOAD_FAILED: &str = "Failed to download presentation. Please try again.";

/// Core error types for the SlideSynth client
#[derive(Error, Debug)]
pub enum SynthError {
    /// Calls to the slide service
    #[error("Service error: {0}")]
    Transport(#[from] TransportError),

    /// Saving an export locally
    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the local save step
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Invalid filename: {filename:?}")]
    InvalidFilename { filename: String },

    #[error("Failed to stage payload: {source}")]
    Stage {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {filename}: {source}")]
    Write {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to release staged payload: {source}")]
    Release {
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SynthError>;

/// Error reporting utilities
pub struct ErrorReporter;

impl ErrorReporter {
    /// The single error string a failed command leaves in the session.
    pub fn session_message(error: &TransportError, command: &Command) -> String {
        match error {
            TransportError::Remote(detail) => detail.clone(),
            TransportError::Timeout { after } => format!(
                "The slide service did not respond within {} seconds. Please try again.",
                after.as_secs()
            ),
            TransportError::Protocol(_) | TransportError::Network(_) => match command {
                Command::Generate => GENERATE_FAILED.to_string(),
                Command::Download { .. } => DOWNLOAD_FAILED.to_string(),
            },
        }
    }

    pub fn save_message(error: &SaveError) -> String {
        format!("Failed to save presentation: {error}")
    }

    /// Format error for user display
    pub fn format_user_error(error: &SynthError) -> String {
        match error {
            SynthError::Transport(TransportError::Timeout { after }) => format!(
                "⏱️  The slide service did not answer within {}s\n💡 Raise --timeout-secs or check the service",
                after.as_secs()
            ),
            SynthError::Transport(TransportError::Network(reason)) => format!(
                "🔌 Could not reach the slide service: {reason}\n💡 Check --base-url and that the service is running"
            ),
            SynthError::Transport(err) => format!("❌ {err}"),
            SynthError::Save(SaveError::InvalidFilename { filename }) => format!(
                "📄 Invalid filename: {filename:?}\n💡 Use a bare name such as deck.pptx"
            ),
            SynthError::Save(err) => format!("📁 {err}"),
            SynthError::Config(err) => format!("⚙️  {err}"),
            SynthError::Io(err) => format!("File operation failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn remote_detail_is_verbatim_for_both_commands() {
        let err = TransportError::Remote("Export service unavailable".to_string());
        assert_eq!(
            ErrorReporter::session_message(&err, &Command::Generate),
            "Export service unavailable"
        );
        let download = Command::Download {
            filename: "x.pptx".to_string(),
        };
        assert_eq!(
            ErrorReporter::session_message(&err, &download),
            "Export service unavailable"
        );
    }

    #[test]
    fn unclassified_failures_fall_back_per_command() {
        let err = TransportError::Network("connection refused".to_string());
        assert_eq!(
            ErrorReporter::session_message(&err, &Command::Generate),
            GENERATE_FAILED
        );
        let err = TransportError::Protocol("missing field `slides`".to_string());
        let download = Command::Download {
            filename: "x.pptx".to_string(),
        };
        assert_eq!(ErrorReporter::session_message(&err, &download), DOWNLOAD_FAILED);
    }

    #[test]
    fn timeout_message_names_the_limit() {
        let err = TransportError::Timeout {
            after: Duration::from_secs(120),
        };
        let message = ErrorReporter::session_message(&err, &Command::Generate);
        assert!(message.contains("120 seconds"));
    }
}
