use serde::Serialize;
use slidesynth_common::Deck;

/// Snapshot of a session, replaced as a whole on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub deck: Deck,
    pub is_generating: bool,
    pub is_exporting: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Generating,
    Exporting,
    Failed,
    Populated,
}

/// Which main panel a front end shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Upload,
    Deck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorBanner<'a> {
    pub message: &'a str,
    pub can_retry: bool,
}

impl SessionState {
    /// Busy flags first, then the error, then the deck.
    pub fn phase(&self) -> Phase {
        if self.is_generating {
            Phase::Generating
        } else if self.is_exporting {
            Phase::Exporting
        } else if self.error.is_some() {
            Phase::Failed
        } else if !self.deck.is_empty() {
            Phase::Populated
        } else {
            Phase::Idle
        }
    }

    pub fn view(&self) -> View {
        if self.is_generating {
            View::Loading
        } else if self.deck.is_empty() {
            View::Upload
        } else {
            View::Deck
        }
    }

    pub fn is_busy(&self) -> bool {
        self.is_generating || self.is_exporting
    }

    /// Retry is only offered while an input is held.
    pub fn error_banner(&self, input_held: bool) -> Option<ErrorBanner<'_>> {
        self.error.as_deref().map(|message| ErrorBanner {
            message,
            can_retry: input_held,
        })
    }
}
