pub mod app;
pub mod app_event;
pub mod preview;
pub mod status_bar;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use slidesynth_common::Deck;
use slidesynth_core::Session;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};

pub use app::App;
pub use preview::DeckPreview;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

pub fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the terminal preview for a deck saved as JSON
pub async fn run_preview<P: AsRef<Path>>(file_path: P) -> Result<()> {
    let file_path = file_path.as_ref();
    let raw = tokio::fs::read_to_string(file_path)
        .await
        .with_context(|| format!("reading {}", file_path.display()))?;
    let deck = parse_deck(&raw)?;

    let mut terminal = init_terminal()?;
    let result = DeckPreview::new(deck).run(&mut terminal);
    restore_terminal(&mut terminal)?;
    result
}

/// Run the interactive generate/preview/download loop
pub async fn run_interactive(session: Session, output_dir: PathBuf) -> Result<()> {
    let mut app = App::new(session, output_dir);
    let mut terminal = init_terminal()?;
    let result = app.run(&mut terminal).await;
    restore_terminal(&mut terminal)?;
    result
}

/// Accepts both a saved [`Deck`] and a raw `/generate-slides` response.
pub fn parse_deck(raw: &str) -> Result<Deck> {
    let deck: Deck = serde_json::from_str(raw).context("not a slide deck")?;
    if deck.is_empty() {
        anyhow::bail!("deck has no slides");
    }
    Ok(deck)
}
