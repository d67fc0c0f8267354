use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};

use super::{bold_style, italic_style, markup_lines, markup_spans, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::app::App;
use crate::grader::{option_verdict, OptionVerdict};
use crate::quiz::{Question, QuestionKind};

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session() else {
        return;
    };
    let question = session.current_question();
    let index = session.current_index();
    let (position, total) = session.progress();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title and timer
            Constraint::Length(1), // progress
            Constraint::Length(1), // padding
            Constraint::Min(3),    // question and answer
            Constraint::Length(1), // status
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        session.quiz().display_title().to_string(),
        bold_style(),
    ))
    .render(chunks[0], buf);

    if app.config().show_timer {
        let timer = session.timer();
        let label = if timer.is_paused() {
            format!("{} (paused)", timer.format())
        } else {
            timer.format()
        };
        Paragraph::new(Span::styled(label, bold_style().add_modifier(Modifier::DIM)))
            .alignment(Alignment::Right)
            .render(chunks[0], buf);
    }

    Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(position as f64 / total as f64)
        .label(format!("Question {position} of {total}"))
        .render(chunks[1], buf);

    let mut lines = markup_lines(&question.text, bold_style());
    lines.push(Line::default());
    if question.kind == QuestionKind::Multiple {
        lines.push(Line::styled("Select all that apply", italic_style()));
    }

    if question.kind.is_choice() {
        option_lines(app, question, index, &mut lines);
    } else {
        input_lines(app, question, index, &mut lines);
    }

    if app.is_revealed(index) {
        lines.push(Line::default());
        lines.push(feedback_line(session.verdict(index), question));
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(chunks[3], buf);

    if let Some(status) = app.status() {
        Paragraph::new(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[4], buf);
    }

    Paragraph::new(Span::styled(legend(app, question), italic_style())).render(chunks[5], buf);
}

fn option_lines(app: &App, question: &Question, index: usize, lines: &mut Vec<Line<'static>>) {
    let revealed = app.is_revealed(index);
    let editable = app.can_edit(index);
    let selection = app.selection();

    for (i, option) in question.options.iter().enumerate() {
        let selected = selection.is_some_and(|r| r.contains(option));
        let style = if revealed {
            match option_verdict(question, option, selected) {
                OptionVerdict::Correct => bold_style().fg(Color::Green),
                OptionVerdict::Wrong => bold_style().fg(Color::Red),
                OptionVerdict::Missed => Style::default().fg(Color::Yellow),
                OptionVerdict::Neutral => Style::default().add_modifier(Modifier::DIM),
            }
        } else if selected {
            bold_style().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let pointer = if editable && i == app.option_cursor() {
            "›"
        } else {
            " "
        };
        let mark = match (question.kind, selected) {
            (QuestionKind::Multiple, true) => "[x]",
            (QuestionKind::Multiple, false) => "[ ]",
            (_, true) => "(•)",
            (_, false) => "( )",
        };

        let mut line = Line::from(Span::styled(format!("{pointer} {}. {mark} ", i + 1), style));
        line.spans.extend(markup_spans(option, style));
        lines.push(line);
    }
}

fn input_lines(app: &App, question: &Question, index: usize, lines: &mut Vec<Line<'static>>) {
    let style = match app.session().and_then(|s| s.verdict(index)) {
        Some(true) if app.is_revealed(index) => bold_style().fg(Color::Green),
        Some(false) if app.is_revealed(index) => bold_style().fg(Color::Red),
        _ => bold_style(),
    };
    let cursor = if app.can_edit(index) { "_" } else { "" };
    let prompt = match question.kind {
        QuestionKind::Number => "number",
        _ => "answer",
    };

    lines.push(Line::from(vec![
        Span::styled(format!("{prompt} › "), Style::default().add_modifier(Modifier::DIM)),
        Span::styled(format!("{}{cursor}", app.text_input()), style),
    ]));
}

fn feedback_line(verdict: Option<bool>, question: &Question) -> Line<'static> {
    match verdict {
        Some(true) => Line::styled("Correct!", bold_style().fg(Color::Green)),
        _ => {
            let mut line = Line::from(Span::styled(
                "Incorrect. The correct answer is: ",
                bold_style().fg(Color::Red),
            ));
            line.spans
                .extend(markup_spans(&question.display_answer(), bold_style()));
            line
        }
    }
}

fn legend(app: &App, question: &Question) -> String {
    let enter = match app.session() {
        Some(s) if s.quiz().only_show_results_at_end() || s.is_answered(s.current_index()) => {
            if s.is_last() {
                "finish"
            } else {
                "next"
            }
        }
        _ => "submit",
    };
    if question.kind.is_choice() {
        format!("(←/→) move  (1-9/space) pick  (enter) {enter}  (e)xplain  (p)ause  (esc) quit")
    } else {
        format!("(←/→) move  (type) answer  (enter) {enter}  (ctrl+e) explain  (ctrl+p) pause  (esc) quit")
    }
}
