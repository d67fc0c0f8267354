pub mod charting;
pub mod history;
pub mod question;
pub mod results;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{app::App, markup};

const HORIZONTAL_MARGIN: u16 = 3;
const VERTICAL_MARGIN: u16 = 1;
const POPUP_MIN_WIDTH: u16 = 24;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self.screen()).render(self, area, buf);

        if self.show_explanation() {
            render_explanation(self, area, buf);
        }
    }
}

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn italic_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn code_style(base: Style) -> Style {
    base.fg(Color::Yellow).bg(Color::DarkGray)
}

/// Lay out backtick markup as styled lines, one per line of source text
pub fn markup_lines(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut lines = vec![Line::default()];
    for segment in markup::segments(text) {
        let style = if segment.code {
            code_style(base)
        } else {
            base
        };
        for (i, part) in segment.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            if part.is_empty() {
                continue;
            }
            if let Some(line) = lines.last_mut() {
                line.spans.push(Span::styled(part.to_string(), style));
            }
        }
    }
    lines
}

/// Single-line variant for option labels
pub fn markup_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    markup::segments(text)
        .into_iter()
        .map(|segment| {
            let style = if segment.code {
                code_style(base)
            } else {
                base
            };
            Span::styled(segment.text.replace('\n', " "), style)
        })
        .collect()
}

/// Centered popup with the current question's explanation
fn render_explanation(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(explanation) = app
        .session()
        .and_then(|session| session.current_question().explanation.as_deref())
    else {
        return;
    };

    let plain = markup::plain(explanation);
    let widest = plain.lines().map(UnicodeWidthStr::width).max().unwrap_or(0);
    let width = (widest as u16)
        .saturating_add(4)
        .max(POPUP_MIN_WIDTH)
        .min(area.width);
    let inner_width = usize::from(width.saturating_sub(2).max(1));
    let rows: usize = plain
        .lines()
        .map(|line| line.width().max(1).div_ceil(inner_width))
        .sum();
    let height = (rows as u16).saturating_add(2).min(area.height);

    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    Clear.render(popup, buf);
    Paragraph::new(markup_lines(explanation, Style::default()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Explanation ")
                .title_bottom(Line::from(" (e) close ").style(italic_style()))
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false })
        .render(popup, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::QuizContext;
    use crate::history::HistoryStore;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    const QUIZ: &str = r#"{"quizTitle":"Shapes","quiz":[
        {"question":"Sides of a `triangle`?","type":"number","answer":3,"explanation":"Tri means `three`."}
    ]}"#;

    fn rendered(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn app() -> App {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        let mut app = App::new(QuizContext::new(HistoryStore::load(store)), Config::default());
        app.start_quiz(QUIZ).unwrap();
        app
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        let _ = app.on_key(KeyEvent::new(code, modifiers));
    }

    #[test]
    fn test_markup_lines_split_and_style() {
        let lines = markup_lines("use `Vec`\nthen", Style::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 2);
        assert_eq!(lines[0].spans[1].content, "Vec");
        assert_eq!(lines[0].spans[1].style, code_style(Style::default()));
        assert_eq!(lines[1].spans[0].content, "then");
    }

    #[test]
    fn test_markup_spans_stay_on_one_line() {
        let spans = markup_spans("a\nb", Style::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "a b");
    }

    #[test]
    fn test_question_screen_renders_text() {
        let app = app();
        let screen = rendered(&app, 80, 24);
        assert!(screen.contains("Shapes"));
        assert!(screen.contains("triangle"));
        assert!(screen.contains("Question 1 of 1"));
    }

    #[test]
    fn test_explanation_popup() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert!(app.show_explanation());
        assert!(rendered(&app, 80, 24).contains("Explanation"));
    }

    #[test]
    fn test_tiny_area_does_not_panic() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
        let _ = rendered(&app, 10, 3);
    }
}
