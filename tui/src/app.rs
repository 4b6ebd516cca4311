use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use slidesynth_common::{FileHandle, NormalizedInput};
use slidesynth_core::input_capture::{self, PICKER_EXTENSIONS};
use slidesynth_core::{Outcome, Phase, Session, SessionState, View};
use std::path::PathBuf;
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::Duration;
use unicode_width::UnicodeWidthStr;

use crate::app_event::{AppEvent, AppEventSender};
use crate::preview::{render_slide, SlideCursor};
use crate::status_bar::StatusBar;
use crate::Tui;

pub const LOADING_MESSAGE: &str = "Analyzing your content and generating slides...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Text,
    Path,
}

/// What a key press asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Generate(NormalizedInput),
    GenerateFromPath(PathBuf),
    Download,
    Retry,
    Dismiss,
    StartOver,
    Quit,
}

/// Interactive front end over one [`Session`].
pub struct App {
    session: Session,
    output_dir: PathBuf,
    state: SessionState,
    input_held: bool,
    text: String,
    path: String,
    focus: Field,
    cursor: SlideCursor,
    notice: String,
    tx: AppEventSender,
    should_quit: bool,
}

impl App {
    pub fn new(session: Session, output_dir: PathBuf) -> Self {
        Self {
            session,
            output_dir,
            state: SessionState::default(),
            input_held: false,
            text: String::new(),
            path: String::new(),
            focus: Field::Text,
            cursor: SlideCursor::default(),
            notice: String::new(),
            tx: AppEventSender::noop(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut state_rx = self.session.subscribe();
        let (tx, mut app_events) = unbounded_channel();
        self.tx = AppEventSender::new(tx);

        let initial = state_rx.borrow_and_update().clone();
        let held = self.session.held_input().await.is_some();
        self.set_state(initial, held);

        while !self.should_quit {
            terminal.draw(|f| self.draw(f))?;

            tokio::select! {
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = state_rx.borrow_and_update().clone();
                    let held = self.session.held_input().await.is_some();
                    self.set_state(state, held);
                }
                Some(app_event) = app_events.recv() => {
                    self.on_app_event(app_event);
                }
                polled = tokio::task::spawn_blocking(|| event::poll(Duration::from_millis(100))) => {
                    if let Ok(Ok(true)) = polled {
                        if let Event::Key(key) = event::read()? {
                            if key.kind == KeyEventKind::Press {
                                if let Some(action) = self.handle_key(key) {
                                    self.dispatch(action);
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn set_state(&mut self, state: SessionState, input_held: bool) {
        self.cursor.clamp(state.deck.len());
        self.state = state;
        self.input_held = input_held;
    }

    fn on_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Notice(message) | AppEvent::InputRejected(message) => self.notice = message,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let banner = self.state.error.is_some();
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => return Some(Action::Quit),
            KeyCode::Char('r') if ctrl => {
                return (banner && self.input_held).then_some(Action::Retry);
            }
            KeyCode::Esc if banner => return Some(Action::Dismiss),
            _ => {}
        }

        match self.state.view() {
            View::Loading => None,
            View::Upload => self.composer_key(key),
            View::Deck => match key.code {
                KeyCode::Left => {
                    self.cursor.previous();
                    None
                }
                KeyCode::Right => {
                    self.cursor.next(self.state.deck.len());
                    None
                }
                KeyCode::Char('d') if !self.state.is_exporting => Some(Action::Download),
                KeyCode::Char('s') => Some(Action::StartOver),
                KeyCode::Char('r') if banner && self.input_held => Some(Action::Retry),
                KeyCode::Char('x') if banner => Some(Action::Dismiss),
                _ => None,
            },
        }
    }

    fn composer_key(&mut self, key: KeyEvent) -> Option<Action> {
        let field = match self.focus {
            Field::Text => &mut self.text,
            Field::Path => &mut self.path,
        };
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Field::Text => Field::Path,
                    Field::Path => Field::Text,
                };
                None
            }
            KeyCode::Enter => match self.focus {
                Field::Text => input_capture::from_text(&self.text).map(Action::Generate),
                Field::Path => {
                    let path = self.path.trim();
                    (!path.is_empty()).then(|| Action::GenerateFromPath(PathBuf::from(path)))
                }
            },
            KeyCode::Backspace => {
                field.pop();
                None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                field.push(c);
                None
            }
            _ => None,
        }
    }

    fn dispatch(&mut self, action: Action) {
        let session = self.session.clone();
        let tx = self.tx.clone();
        match action {
            Action::Quit => self.should_quit = true,
            Action::Generate(input) => {
                self.notice.clear();
                self.cursor = SlideCursor::default();
                tokio::spawn(async move {
                    session.generate(input).await;
                });
            }
            Action::GenerateFromPath(path) => {
                self.notice.clear();
                self.cursor = SlideCursor::default();
                tokio::spawn(async move {
                    let file = match FileHandle::open(&path).await {
                        Ok(file) => file,
                        Err(err) => {
                            tx.send(AppEvent::InputRejected(format!(
                                "Cannot read {}: {err}",
                                path.display()
                            )));
                            return;
                        }
                    };
                    match input_capture::from_drop([file]) {
                        Some(input) => {
                            session.generate(input).await;
                        }
                        None => tx.send(AppEvent::InputRejected(format!(
                            "Unsupported file; use .{}",
                            PICKER_EXTENSIONS.join(", .")
                        ))),
                    }
                });
            }
            Action::Download => {
                self.notice.clear();
                let dest = self.output_dir.join(session.default_filename());
                tokio::spawn(async move {
                    let Some(input) = session.held_input().await else {
                        return;
                    };
                    let outcome = session.download(input, None).await;
                    if outcome == Outcome::Applied && session.state().error.is_none() {
                        tx.send(AppEvent::Notice(format!("Saved {}", dest.display())));
                    }
                });
            }
            Action::Retry => {
                self.notice.clear();
                tokio::spawn(async move {
                    session.retry().await;
                });
            }
            Action::Dismiss => {
                tokio::spawn(async move {
                    session.clear_error().await;
                });
            }
            Action::StartOver => {
                self.text.clear();
                self.path.clear();
                self.focus = Field::Text;
                self.cursor = SlideCursor::default();
                self.notice.clear();
                tokio::spawn(async move {
                    session.reset().await;
                });
            }
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let banner_height = if self.state.error.is_some() { 3 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(banner_height),
                Constraint::Length(3),
            ])
            .split(f.area());

        match self.state.view() {
            View::Loading => self.draw_loading(f, chunks[0]),
            View::Upload => self.draw_composer(f, chunks[0]),
            View::Deck => render_slide(f, chunks[0], &self.state.deck, self.cursor.index()),
        }
        self.draw_banner(f, chunks[1]);

        let hints = match self.state.view() {
            View::Loading => "Ctrl+Q quit",
            View::Upload => "Tab switch field  Enter generate  Ctrl+Q quit",
            View::Deck => "←/→ slides  d download  s start over  Ctrl+Q quit",
        };
        f.render_widget(
            StatusBar::new(phase_label(self.state.phase()), &self.notice, hints),
            chunks[2],
        );
    }

    fn draw_loading(&self, f: &mut Frame, area: Rect) {
        let message = Paragraph::new(LOADING_MESSAGE)
            .alignment(Alignment::Center)
            .block(Block::default().title("SlideSynth").borders(Borders::ALL));
        f.render_widget(message, area);
    }

    fn draw_composer(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        let style_for = |field: Field| {
            if self.focus == field {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            }
        };

        let text = Paragraph::new(self.text.as_str())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("Describe your idea")
                    .borders(Borders::ALL)
                    .border_style(style_for(Field::Text)),
            );
        f.render_widget(text, chunks[0]);

        let path_title = format!("…or a file path (.{})", PICKER_EXTENSIONS.join(", ."));
        let path = Paragraph::new(self.path.as_str()).block(
            Block::default()
                .title(path_title)
                .borders(Borders::ALL)
                .border_style(style_for(Field::Path)),
        );
        f.render_widget(path, chunks[1]);

        let (value, field_area) = match self.focus {
            Field::Text => (self.text.as_str(), chunks[0]),
            Field::Path => (self.path.as_str(), chunks[1]),
        };
        let width = u16::try_from(value.width()).unwrap_or(u16::MAX);
        let x = field_area
            .x
            .saturating_add(1)
            .saturating_add(width)
            .min(field_area.right().saturating_sub(2));
        f.set_cursor_position(Position::new(x, field_area.y + 1));
    }

    fn draw_banner(&self, f: &mut Frame, area: Rect) {
        let Some(banner) = self.state.error_banner(self.input_held) else {
            return;
        };
        let in_composer = self.state.view() == View::Upload;
        let hints = match (banner.can_retry, in_composer) {
            (true, true) => "  [Ctrl+R] retry  [Esc] dismiss",
            (true, false) => "  [r] retry  [x] dismiss",
            (false, true) => "  [Esc] dismiss",
            (false, false) => "  [x] dismiss",
        };
        let line = Line::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw(banner.message),
            Span::styled(hints, Style::default().fg(Color::Gray)),
        ]);
        let widget = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
        f.render_widget(widget, area);
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "IDLE",
        Phase::Generating => "GENERATING",
        Phase::Exporting => "EXPORTING",
        Phase::Failed => "ERROR",
        Phase::Populated => "READY",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use slidesynth_common::{Deck, Slide, SynthConfig};

    fn app() -> App {
        let session = Session::from_config(&SynthConfig::default()).unwrap();
        App::new(session, PathBuf::from("out"))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert_eq!(app.handle_key(key(KeyCode::Char(c))), None);
        }
    }

    fn populated(error: Option<&str>) -> SessionState {
        SessionState {
            deck: Deck::new(
                vec![
                    Slide::new("Problem", vec!["Farmers lack data".to_string()]),
                    Slide::new("Solution", vec![]),
                ],
                "Our app helps farmers",
            ),
            error: error.map(str::to_string),
            ..SessionState::default()
        }
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 16)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn enter_submits_trimmed_text() {
        let mut app = app();
        type_text(&mut app, "  farmers  ");
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Some(Action::Generate(NormalizedInput::Text("farmers".to_string())))
        );
    }

    #[test]
    fn enter_on_blank_text_does_nothing() {
        let mut app = app();
        type_text(&mut app, "   ");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
    }

    #[test]
    fn tab_moves_to_the_path_field() {
        let mut app = app();
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "talk.m4a");
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Some(Action::GenerateFromPath(PathBuf::from("talk.m4a")))
        );
        assert!(app.text.is_empty());
    }

    #[test]
    fn deck_keys_map_to_commands() {
        let mut app = app();
        app.set_state(populated(None), true);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.cursor.index(), 1);
        assert_eq!(app.handle_key(key(KeyCode::Char('d'))), Some(Action::Download));
        assert_eq!(app.handle_key(key(KeyCode::Char('s'))), Some(Action::StartOver));
        assert_eq!(app.handle_key(key(KeyCode::Char('r'))), None);
        assert_eq!(app.handle_key(ctrl('q')), Some(Action::Quit));
    }

    #[test]
    fn download_key_ignored_while_exporting() {
        let mut app = app();
        let state = SessionState {
            is_exporting: true,
            ..populated(None)
        };
        app.set_state(state, true);
        assert_eq!(app.handle_key(key(KeyCode::Char('d'))), None);
    }

    #[test]
    fn retry_needs_a_held_input() {
        let mut app = app();
        app.set_state(populated(Some("Export service unavailable")), false);
        assert_eq!(app.handle_key(key(KeyCode::Char('r'))), None);
        assert_eq!(app.handle_key(key(KeyCode::Char('x'))), Some(Action::Dismiss));

        app.set_state(populated(Some("Export service unavailable")), true);
        assert_eq!(app.handle_key(key(KeyCode::Char('r'))), Some(Action::Retry));
        assert_eq!(app.handle_key(ctrl('r')), Some(Action::Retry));
    }

    #[test]
    fn loading_view_ignores_typing() {
        let mut app = app();
        let state = SessionState {
            is_generating: true,
            ..SessionState::default()
        };
        app.set_state(state, true);
        assert_eq!(app.handle_key(key(KeyCode::Char('d'))), None);
        assert!(screen(&app).contains(LOADING_MESSAGE));
    }

    #[test]
    fn deck_view_shows_slide_and_banner() {
        let mut app = app();
        app.set_state(populated(Some("Export service unavailable")), true);
        let text = screen(&app);
        assert!(text.contains("Problem"));
        assert!(text.contains("Slide 1/2"));
        assert!(text.contains("Export service unavailable"));
        assert!(text.contains("[r] retry"));
        assert!(text.contains("ERROR"));
    }

    #[test]
    fn composer_lists_accepted_extensions() {
        let app = app();
        let text = screen(&app);
        assert!(text.contains("Describe your idea"));
        assert!(text.contains(".mp3, .m4a"));
        assert!(!text.contains("Error:"));
    }
}
