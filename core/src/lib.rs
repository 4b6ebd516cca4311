//! Client core: input capture, transports, the save step and the session
//! state machine that ties them together.

pub mod client;
pub mod download;
pub mod error;
pub mod input_capture;
pub mod session;
pub mod state;

pub use client::{ExportTransport, GenerationTransport};
pub use download::{DirectorySave, SaveAction};
pub use error::{ErrorReporter, SaveError, SynthError};
pub use session::{Command, Outcome, Session};
pub use state::{ErrorBanner, Phase, SessionState, View};
pub use slidesynth_transport::TransportError;
