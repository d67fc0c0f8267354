use ratatui::{buffer::Buffer, layout::Rect};

use crate::app::{App, Screen};

/// A UI screen boundary: draws one view of the app state
pub trait ScreenView {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

pub struct QuestionScreen;

impl ScreenView for QuestionScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        super::question::render(app, area, buf);
    }
}

pub struct ResultsScreen;

impl ScreenView for ResultsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        super::results::render(app, area, buf);
    }
}

pub struct HistoryScreen;

impl ScreenView for HistoryScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        super::history::render(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(screen: Screen) -> Box<dyn ScreenView> {
    match screen {
        Screen::Question => Box::new(QuestionScreen),
        Screen::Results => Box::new(ResultsScreen),
        Screen::History => Box::new(HistoryScreen),
    }
}
