use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use super::state::TuiState;
use crate::worker::protocol::{MENU_QUIT, MENU_SEPARATOR};

pub fn draw(frame: &mut Frame, state: &TuiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let header_text = if state.is_configured() {
        let mut spans = vec![
            Span::styled("Build progress", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {} pages written", state.total())),
        ];
        if let Some(dir) = state.last_dir() {
            spans.push(Span::styled(
                format!("  (last: {dir})"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    } else {
        Line::from(Span::styled("Waiting for build...", Style::default().fg(Color::Yellow)))
    };
    let header = Paragraph::new(header_text)
        .block(Block::default().borders(Borders::ALL).title(" pagewatch "));
    frame.render_widget(header, chunks[0]);

    let rows: Vec<Row> = state
        .menu()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let row = match entry.as_str() {
                MENU_SEPARATOR => Row::new(vec![String::new(), String::new()]),
                MENU_QUIT => Row::new(vec![MENU_QUIT.to_string(), String::new()])
                    .style(Style::default().fg(Color::Red)),
                dir => {
                    let count = state
                        .count_for(dir)
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    Row::new(vec![dir.to_string(), count])
                }
            };
            if i == state.selected() {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(rows, [Constraint::Percentage(80), Constraint::Percentage(20)])
        .header(
            Row::new(vec!["Directory", "Pages"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(table, chunks[1]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("↑/↓", Style::default().fg(Color::Cyan)),
        Span::raw(" select  "),
        Span::styled("enter", Style::default().fg(Color::Cyan)),
        Span::raw(" open  "),
        Span::styled("q", Style::default().fg(Color::Cyan)),
        Span::raw(" quit"),
    ]));
    frame.render_widget(footer, chunks[2]);
}
