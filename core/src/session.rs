//! The generation session: one held input, two independent remote commands.
//!
//! Every request is issued under a [`Ticket`] naming the input epoch it was
//! started against and its own request number. A result is applied only when
//! both still match: a reset or a new input bumps the epoch, and a newer
//! request of the same command takes over the pending slot. The pending slot
//! also owns the busy flag, so a superseded request can never leave a flag
//! set behind.

use slidesynth_common::{
    BinaryPayload, Deck, NormalizedInput, SynthConfig, DEFAULT_EXPORT_FILENAME,
};
use slidesynth_transport::HttpTransport;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::client::{ExportTransport, GenerationTransport};
use crate::download::{trigger_save, DirectorySave, SaveAction};
use crate::error::{ErrorReporter, Result, SaveError};
use crate::state::SessionState;

/// A command that can be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate,
    Download { filename: String },
}

/// What became of a command once it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The result was written to the session.
    Applied,
    /// The result was stale and dropped.
    Discarded,
    /// Nothing was issued.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    epoch: u64,
    request: u64,
}

#[derive(Debug, Default)]
struct Machine {
    state: SessionState,
    held: Option<NormalizedInput>,
    epoch: u64,
    last_request: u64,
    generate_pending: Option<u64>,
    export_pending: Option<u64>,
    /// The command whose failure the current error reports.
    failed: Option<Command>,
}

impl Machine {
    /// Make `input` the held input; a different input starts a new epoch.
    fn hold(&mut self, input: &NormalizedInput) {
        if self.held.as_ref() != Some(input) {
            self.held = Some(input.clone());
            self.epoch += 1;
        }
    }

    fn issue(&mut self) -> Ticket {
        self.last_request += 1;
        Ticket {
            epoch: self.epoch,
            request: self.last_request,
        }
    }

    fn begin_generate(&mut self, input: &NormalizedInput) -> Ticket {
        self.hold(input);
        let ticket = self.issue();
        self.generate_pending = Some(ticket.request);
        self.state.is_generating = true;
        self.clear_error();
        self.state.deck = Deck::default();
        ticket
    }

    fn begin_download(&mut self, input: &NormalizedInput, filename: &str) -> Ticket {
        self.hold(input);
        let ticket = self.issue();
        self.export_pending = Some(ticket.request);
        self.state.is_exporting = true;
        self.clear_error();
        ticket
    }

    fn settle_generate(&mut self, ticket: Ticket, result: std::result::Result<Deck, String>) -> Outcome {
        if self.generate_pending != Some(ticket.request) {
            return Outcome::Discarded;
        }
        self.generate_pending = None;
        self.state.is_generating = false;
        if ticket.epoch != self.epoch {
            return Outcome::Discarded;
        }
        match result {
            Ok(deck) => self.state.deck = deck,
            Err(message) => self.fail(Command::Generate, message),
        }
        Outcome::Applied
    }

    fn export_is_live(&self, ticket: Ticket) -> bool {
        self.export_pending == Some(ticket.request) && ticket.epoch == self.epoch
    }

    fn settle_export(&mut self, ticket: Ticket, filename: &str, error: Option<String>) -> Outcome {
        if self.export_pending != Some(ticket.request) {
            return Outcome::Discarded;
        }
        self.export_pending = None;
        self.state.is_exporting = false;
        if ticket.epoch != self.epoch {
            return Outcome::Discarded;
        }
        if let Some(message) = error {
            let command = Command::Download {
                filename: filename.to_string(),
            };
            self.fail(command, message);
        }
        Outcome::Applied
    }

    fn fail(&mut self, command: Command, message: String) {
        self.state.error = Some(message);
        self.failed = Some(command);
    }

    fn clear_error(&mut self) {
        self.state.error = None;
        self.failed = None;
    }

    fn retry_plan(&self) -> Option<(NormalizedInput, Command)> {
        match (&self.held, &self.state.error, &self.failed) {
            (Some(input), Some(_), Some(command)) => Some((input.clone(), command.clone())),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.state = SessionState::default();
        self.held = None;
        self.epoch += 1;
        self.generate_pending = None;
        self.export_pending = None;
        self.failed = None;
    }
}

struct Inner {
    generator: Arc<dyn GenerationTransport>,
    exporter: Arc<dyn ExportTransport>,
    saver: Arc<dyn SaveAction>,
    default_filename: String,
    machine: Mutex<Machine>,
    state_tx: watch::Sender<SessionState>,
}

/// Handle to a generation session. Clones share the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(
        generator: Arc<dyn GenerationTransport>,
        exporter: Arc<dyn ExportTransport>,
        saver: Arc<dyn SaveAction>,
    ) -> Self {
        Self::with_default_filename(generator, exporter, saver, DEFAULT_EXPORT_FILENAME)
    }

    pub fn with_default_filename(
        generator: Arc<dyn GenerationTransport>,
        exporter: Arc<dyn ExportTransport>,
        saver: Arc<dyn SaveAction>,
        default_filename: impl Into<String>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                generator,
                exporter,
                saver,
                default_filename: default_filename.into(),
                machine: Mutex::new(Machine::default()),
                state_tx,
            }),
        }
    }

    /// Session talking HTTP to `config.base_url`, saving into `config.output_dir`.
    pub fn from_config(config: &SynthConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::from_config(config)?);
        let saver = Arc::new(DirectorySave::new(config.output_dir.clone()));
        Ok(Self::with_default_filename(
            transport.clone(),
            transport,
            saver,
            config.default_filename.clone(),
        ))
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Observe every state replacement.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    pub async fn held_input(&self) -> Option<NormalizedInput> {
        self.inner.machine.lock().await.held.clone()
    }

    pub fn default_filename(&self) -> &str {
        &self.inner.default_filename
    }

    /// Generate a deck from `input`, clearing the current deck and error first.
    pub async fn generate(&self, input: NormalizedInput) -> Outcome {
        let ticket = self.update(|m| m.begin_generate(&input)).await;
        tracing::info!("generating slides from {input}");

        let command = Command::Generate;
        let result = self
            .inner
            .generator
            .generate(&input)
            .await
            .map_err(|err| {
                tracing::warn!("generation failed: {err}");
                ErrorReporter::session_message(&err, &command)
            });

        let outcome = self.update(|m| m.settle_generate(ticket, result)).await;
        if outcome == Outcome::Discarded {
            tracing::debug!("discarded stale generation result");
        }
        outcome
    }

    /// Export `input` and save it as `filename` (or the default name).
    /// The deck is left untouched either way.
    pub async fn download(&self, input: NormalizedInput, filename: Option<&str>) -> Outcome {
        let filename = filename
            .map(str::to_string)
            .unwrap_or_else(|| self.inner.default_filename.clone());
        let ticket = self.update(|m| m.begin_download(&input, &filename)).await;
        tracing::info!("exporting {input} as {filename}");

        let command = Command::Download {
            filename: filename.clone(),
        };
        let result = self.inner.exporter.export_deck(&input, &filename).await;

        let outcome = match result {
            Ok(payload) => {
                let live = self.inner.machine.lock().await.export_is_live(ticket);
                let error = if live {
                    self.save(payload, &filename).await.err()
                } else {
                    None
                };
                self.update(|m| m.settle_export(ticket, &filename, error)).await
            }
            Err(err) => {
                tracing::warn!("export failed: {err}");
                let message = ErrorReporter::session_message(&err, &command);
                self.update(|m| m.settle_export(ticket, &filename, Some(message)))
                    .await
            }
        };
        if outcome == Outcome::Discarded {
            tracing::debug!("discarded stale export result");
        }
        outcome
    }

    /// Run the save step on the blocking pool, returning the session error
    /// on failure.
    async fn save(&self, payload: BinaryPayload, filename: &str) -> std::result::Result<(), String> {
        let saver = Arc::clone(&self.inner.saver);
        let name = filename.to_string();
        let saved = tokio::task::spawn_blocking(move || trigger_save(&payload, &name, saver.as_ref()))
            .await
            .unwrap_or_else(|join_err| {
                Err(SaveError::Write {
                    filename: filename.to_string(),
                    source: std::io::Error::other(join_err),
                })
            });
        saved.map(|_| ()).map_err(|err| {
            tracing::warn!("save failed: {err}");
            ErrorReporter::save_message(&err)
        })
    }

    /// Re-issue the command that failed against the held input. Does nothing
    /// unless an input is held and an error is showing.
    pub async fn retry(&self) -> Outcome {
        let plan = self.inner.machine.lock().await.retry_plan();
        match plan {
            None => {
                tracing::debug!("retry ignored: nothing to retry");
                Outcome::Skipped
            }
            Some((input, Command::Generate)) => self.generate(input).await,
            Some((input, Command::Download { filename })) => {
                self.download(input, Some(&filename)).await
            }
        }
    }

    pub async fn clear_error(&self) {
        self.update(Machine::clear_error).await;
    }

    /// Back to idle: no deck, no error, no busy flags, no held input.
    pub async fn reset(&self) {
        self.update(Machine::reset).await;
        tracing::info!("session reset");
    }

    async fn update<R>(&self, f: impl FnOnce(&mut Machine) -> R) -> R {
        let mut machine = self.inner.machine.lock().await;
        let out = f(&mut machine);
        self.publish(&machine);
        out
    }

    fn publish(&self, machine: &Machine) {
        self.inner.state_tx.send_if_modified(|current| {
            if *current == machine.state {
                false
            } else {
                *current = machine.state.clone();
                true
            }
        });
    }
}
