use chrono::{DateTime, Local, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};
use time_humanize::{Accuracy, HumanTime, Tense};

use super::{bold_style, italic_style, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::app::App;
use crate::history::{HistoryEntry, HISTORY_LIMIT};

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let entries = app.history_entries();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // padding
            Constraint::Min(1),    // entries
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Line::from(vec![
        Span::styled("History", bold_style()),
        Span::styled(
            format!("  {}/{HISTORY_LIMIT}", entries.len()),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]))
    .render(chunks[0], buf);

    if entries.is_empty() {
        Paragraph::new(Span::styled(
            "No quizzes yet. Start one with `quizline <FILE>` or `--sample <NAME>`.",
            italic_style(),
        ))
        .render(chunks[2], buf);
    } else {
        let now = Utc::now();
        let items: Vec<ListItem> = entries.iter().map(|entry| entry_item(entry, now)).collect();
        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .highlight_symbol("› ");
        let mut state = ListState::default().with_selected(Some(app.history_cursor()));
        StatefulWidget::render(list, chunks[2], buf, &mut state);
    }

    Paragraph::new(Span::styled(
        "(↑/↓) select / (enter) take again / (d)elete / (c)lear all / (esc) back",
        italic_style(),
    ))
    .render(chunks[3], buf);
}

fn entry_item(entry: &HistoryEntry, now: DateTime<Utc>) -> ListItem<'static> {
    let local = entry.timestamp.with_timezone(&Local);
    ListItem::new(Line::from(vec![
        Span::styled(
            local.format("%Y-%m-%d %H:%M").to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::raw("  "),
        Span::styled(entry.quiz.display_title().to_string(), bold_style()),
        Span::raw(format!("  {} questions  ", entry.quiz.len())),
        Span::styled(relative_age(entry.timestamp, now), italic_style()),
    ]))
}

/// "5 minutes ago" style age of a history entry
pub fn relative_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = (now - timestamp).to_std().unwrap_or_default();
    HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past)
}
