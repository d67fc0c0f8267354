use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use super::charting::{bar_width, format_percentage, outcome_bars, wrong_by_kind_bars};
use super::{bold_style, italic_style, markup_spans, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::app::App;
use crate::session::Session;

const CHART_HEIGHT: u16 = 9;

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session() else {
        return;
    };
    let Some(results) = session.results() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),            // title
            Constraint::Length(1),            // score gauge
            Constraint::Length(1),            // counts
            Constraint::Length(1),            // banner
            Constraint::Length(CHART_HEIGHT), // charts
            Constraint::Min(1),               // review
            Constraint::Length(1),            // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!("Results: {}", session.quiz().display_title()),
        bold_style(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    Gauge::default()
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Red))
        .ratio(results.percentage() / 100.0)
        .label(format!("{} correct", format_percentage(results.percentage())))
        .render(chunks[1], buf);

    let mut counts = format!(
        "{} correct   {} wrong   {} questions",
        results.correct,
        results.wrong,
        results.total()
    );
    if app.config().show_timer {
        counts.push_str(&format!("   {}", session.timer().format()));
    }
    Paragraph::new(Span::styled(counts, bold_style()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    if results.is_perfect() {
        Paragraph::new(Span::styled(
            "Congratulations! Perfect Score!",
            bold_style().fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[4]);

    let outcomes = outcome_bars(results);
    BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" Score "))
        .data(outcomes.as_slice())
        .bar_width(bar_width(charts[0].width, outcomes.len()))
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .render(charts[0], buf);

    let by_kind = wrong_by_kind_bars(results);
    let by_kind: Vec<(&str, u64)> = by_kind
        .iter()
        .map(|(label, count)| (label.as_str(), *count))
        .collect();
    BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" Wrong by type "))
        .data(by_kind.as_slice())
        .bar_width(bar_width(charts[1].width, by_kind.len()))
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Red))
        .value_style(Style::default().fg(Color::Black).bg(Color::Red))
        .render(charts[1], buf);

    Paragraph::new(review_lines(session))
        .block(Block::default().borders(Borders::TOP).title(" Review "))
        .wrap(Wrap { trim: false })
        .scroll((app.review_scroll(), 0))
        .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        "(r)etake / (h)istory / (↑/↓) scroll / (q)uit",
        italic_style(),
    ))
    .render(chunks[6], buf);
}

/// One line per question with the verdict, plus the expected answer for misses
fn review_lines(session: &Session) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, question) in session.quiz().questions().iter().enumerate() {
        let correct = session.verdict(index).unwrap_or(false);
        let (mark, style) = if correct {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("✗", Style::default().fg(Color::Red))
        };

        let mut line = Line::from(Span::styled(format!("{mark} {}. ", index + 1), style));
        line.spans
            .extend(markup_spans(&question.text, Style::default()));
        lines.push(line);

        if !correct {
            let given = session
                .answer(index)
                .map(|answer| answer.as_text())
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| "(no answer)".to_string());
            let mut detail = Line::from(Span::styled(
                format!("    you said {given}, expected "),
                Style::default().add_modifier(Modifier::DIM),
            ));
            detail
                .spans
                .extend(markup_spans(&question.display_answer(), bold_style()));
            lines.push(detail);
        }
    }
    lines
}
