use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct StatusBar<'a> {
    phase: &'a str,
    notice: &'a str,
    hints: &'a str,
}

impl<'a> StatusBar<'a> {
    pub fn new(phase: &'a str, notice: &'a str, hints: &'a str) -> Self {
        Self {
            phase,
            notice,
            hints,
        }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: ratatui::layout::Rect, buf: &mut ratatui::buffer::Buffer) {
        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.phase),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
        ];
        if !self.notice.is_empty() {
            spans.push(Span::styled(self.notice, Style::default().fg(Color::Yellow)));
            spans.push(Span::raw("  |  "));
        }
        spans.push(Span::styled(self.hints, Style::default().fg(Color::Gray)));
        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Left)
            .render(area, buf);
    }
}
