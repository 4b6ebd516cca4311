use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use slidesynth_common::{Deck, Slide};

use crate::Tui;

/// Lines for one slide: the title, a blank line, then one bullet per line.
pub fn slide_lines(slide: &Slide) -> Vec<Line<'_>> {
    let mut lines = vec![
        Line::from(Span::styled(
            slide.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    lines.extend(
        slide
            .bullets
            .iter()
            .map(|bullet| Line::from(vec![Span::raw("  • "), Span::raw(bullet.as_str())])),
    );
    lines
}

/// Draw slide `index` of `deck` into `area`, with a position counter in the title.
pub fn render_slide(f: &mut Frame, area: Rect, deck: &Deck, index: usize) {
    let title = format!("Slide {}/{}", index + 1, deck.len());
    let block = Block::default().title(title).borders(Borders::ALL);
    let body = match deck.get(index) {
        Some(slide) => Paragraph::new(slide_lines(slide)),
        None => Paragraph::new("No slide content"),
    };
    f.render_widget(body.block(block).wrap(Wrap { trim: true }), area);
}

/// Clamp navigation to the deck bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlideCursor {
    index: usize,
}

impl SlideCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next(&mut self, len: usize) {
        if self.index < len.saturating_sub(1) {
            self.index += 1;
        }
    }

    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn clamp(&mut self, len: usize) {
        self.index = self.index.min(len.saturating_sub(1));
    }
}

/// Read-only viewer for a saved deck.
pub struct DeckPreview {
    deck: Deck,
    cursor: SlideCursor,
    running: bool,
}

impl DeckPreview {
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            cursor: SlideCursor::default(),
            running: true,
        }
    }

    pub fn current(&self) -> usize {
        self.cursor.index()
    }

    pub fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        while self.running {
            terminal.draw(|f| self.draw(f))?;

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Left | KeyCode::Char('h') => self.cursor.previous(),
            KeyCode::Right | KeyCode::Char('l') => self.cursor.next(self.deck.len()),
            _ => {}
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(f.area());

        render_slide(f, chunks[0], &self.deck, self.cursor.index());
        f.render_widget(
            Paragraph::new("←/→ navigate  q quit").style(Style::default().fg(Color::Gray)),
            chunks[1],
        );
    }
}
