use tokio::sync::mpsc::UnboundedSender;

/// Messages from spawned command tasks back to the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// One-line status shown above the key hints.
    Notice(String),
    /// A file path could not be turned into an input.
    InputRejected(String),
}

#[derive(Clone, Default)]
pub struct AppEventSender(Option<UnboundedSender<AppEvent>>);

impl AppEventSender {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self(Some(tx))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn send(&self, event: AppEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}
