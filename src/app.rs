use std::ops::ControlFlow;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::Config;
use crate::context::QuizContext;
use crate::grader::Response;
use crate::history::HistoryEntry;
use crate::quiz::{BuildError, QuestionKind};
use crate::session::{Entry, Session, Step};
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Screen {
    Question,
    Results,
    History,
}

/// Terminal front end state: which screen is up, the answer being edited,
/// and the cursors the screens draw from.
#[derive(Debug)]
pub struct App {
    context: QuizContext<Box<dyn KeyValueStore>>,
    config: Config,
    screen: Screen,
    pending: Option<Response>,
    text_input: String,
    option_cursor: usize,
    history_cursor: usize,
    review_scroll: u16,
    show_explanation: bool,
    status: Option<String>,
}

impl App {
    pub fn new(context: QuizContext<Box<dyn KeyValueStore>>, config: Config) -> Self {
        let screen = match context.session() {
            Some(session) if session.is_completed() => Screen::Results,
            Some(_) => Screen::Question,
            None => Screen::History,
        };
        Self {
            context,
            config,
            screen,
            pending: None,
            text_input: String::new(),
            option_cursor: 0,
            history_cursor: 0,
            review_scroll: 0,
            show_explanation: false,
            status: None,
        }
    }

    pub fn context(&self) -> &QuizContext<Box<dyn KeyValueStore>> {
        &self.context
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> Option<&Session> {
        self.context.session()
    }

    pub fn history_entries(&self) -> &[HistoryEntry] {
        self.context.history().entries()
    }

    pub fn text_input(&self) -> &str {
        &self.text_input
    }

    pub fn option_cursor(&self) -> usize {
        self.option_cursor
    }

    pub fn history_cursor(&self) -> usize {
        self.history_cursor
    }

    pub fn review_scroll(&self) -> u16 {
        self.review_scroll
    }

    pub fn show_explanation(&self) -> bool {
        self.show_explanation
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Build `raw` and start answering it
    pub fn start_quiz(&mut self, raw: &str) -> Result<(), BuildError> {
        self.context
            .start_from_input(raw, self.config.only_show_results_at_end)?;
        self.open_question_screen();
        Ok(())
    }

    pub fn open_history(&mut self) {
        self.screen = Screen::History;
        self.show_explanation = false;
        self.history_cursor = self
            .history_cursor
            .min(self.history_entries().len().saturating_sub(1));
    }

    fn open_question_screen(&mut self) {
        self.screen = Screen::Question;
        self.review_scroll = 0;
        self.sync_inputs();
    }

    /// Answers stay editable until finish when results are deferred;
    /// otherwise a submitted answer is locked so its feedback stays honest.
    pub fn can_edit(&self, index: usize) -> bool {
        match self.session() {
            Some(session) if session.is_completed() => false,
            Some(session) => {
                session.quiz().only_show_results_at_end() || !session.is_answered(index)
            }
            None => false,
        }
    }

    /// Whether correctness of `index` may be shown right now
    pub fn is_revealed(&self, index: usize) -> bool {
        match self.session() {
            Some(session) if session.is_completed() => true,
            Some(session) => {
                !session.quiz().only_show_results_at_end() && session.is_answered(index)
            }
            None => false,
        }
    }

    /// The answer shown for the current question: the pending entry if any,
    /// otherwise whatever was submitted
    pub fn selection(&self) -> Option<&Response> {
        let session = self.session()?;
        self.pending
            .as_ref()
            .or_else(|| session.answer(session.current_index()))
    }

    pub fn on_tick(&mut self, dt: Duration) {
        if self.screen == Screen::Question {
            if let Some(session) = self.context.session_mut() {
                session.tick(dt);
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ControlFlow::Break(());
        }
        self.status = None;
        match self.screen {
            Screen::Question => self.on_question_key(key),
            Screen::Results => self.on_results_key(key),
            Screen::History => self.on_history_key(key),
        }
    }

    fn on_question_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        let Some(session) = self.session() else {
            self.open_history();
            return ControlFlow::Continue(());
        };
        let kind = session.current_question().kind;
        let option_count = session.current_question().options.len();
        let choice = kind.is_choice();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return ControlFlow::Break(()),
            KeyCode::Left => self.previous(),
            KeyCode::Right | KeyCode::Tab => self.next(),
            KeyCode::Enter => self.confirm(),
            KeyCode::Char('e') if ctrl || choice => self.toggle_explanation(),
            KeyCode::Char('p') if ctrl || choice => {
                if let Some(session) = self.context.session_mut() {
                    session.toggle_timer();
                }
            }
            KeyCode::Up | KeyCode::Char('k') if choice => {
                self.option_cursor = self.option_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') if choice => {
                self.option_cursor = (self.option_cursor + 1).min(option_count.saturating_sub(1));
            }
            KeyCode::Char(' ') if choice => self.pick(self.option_cursor),
            KeyCode::Char(c) if choice => {
                if let Some(n) = c.to_digit(10).map(|n| n as usize) {
                    if (1..=option_count).contains(&n) {
                        self.option_cursor = n - 1;
                        self.pick(n - 1);
                    }
                }
            }
            KeyCode::Char(c) if !ctrl => {
                if kind != QuestionKind::Number || c.is_ascii_digit() || "+-.eE".contains(c) {
                    self.type_char(Some(c));
                }
            }
            KeyCode::Backspace if !choice => self.type_char(None),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn on_results_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return ControlFlow::Break(()),
            KeyCode::Char('h') => self.open_history(),
            KeyCode::Char('r') => {
                if self.context.restart().is_some() {
                    self.open_question_screen();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.review_scroll = self.review_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.review_scroll = self.review_scroll.saturating_add(1);
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn on_history_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        let len = self.history_entries().len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => match self.session() {
                Some(session) if session.is_completed() => self.screen = Screen::Results,
                Some(_) => self.screen = Screen::Question,
                None => return ControlFlow::Break(()),
            },
            KeyCode::Up | KeyCode::Char('k') => {
                self.history_cursor = self.history_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.history_cursor = (self.history_cursor + 1).min(len.saturating_sub(1));
            }
            KeyCode::Enter => {
                let Some(timestamp) = self
                    .history_entries()
                    .get(self.history_cursor)
                    .map(|entry| entry.timestamp)
                else {
                    return ControlFlow::Continue(());
                };
                if self.context.resume(timestamp).is_some() {
                    self.open_question_screen();
                }
            }
            KeyCode::Char('d') => {
                if let Some(timestamp) = self
                    .history_entries()
                    .get(self.history_cursor)
                    .map(|entry| entry.timestamp)
                {
                    self.context.history_mut().delete(timestamp);
                    self.history_cursor = self
                        .history_cursor
                        .min(self.history_entries().len().saturating_sub(1));
                }
            }
            KeyCode::Char('c') => {
                self.context.history_mut().clear();
                self.history_cursor = 0;
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn pick(&mut self, option: usize) {
        let Some(session) = self.session() else {
            return;
        };
        let index = session.current_index();
        if !self.can_edit(index) {
            self.status = Some("Answer already submitted".to_string());
            return;
        }
        let question = session.current_question();
        let Some(option) = question.options.get(option) else {
            return;
        };
        let response = match question.kind {
            QuestionKind::Multiple => self
                .selection()
                .cloned()
                .unwrap_or(Response::Many(Vec::new()))
                .toggled(option),
            _ => Response::One(option.clone()),
        };
        self.enter(index, response);
    }

    fn type_char(&mut self, c: Option<char>) {
        let Some(index) = self.session().map(Session::current_index) else {
            return;
        };
        if !self.can_edit(index) {
            self.status = Some("Answer already submitted".to_string());
            return;
        }
        match c {
            Some(c) => self.text_input.push(c),
            None => {
                self.text_input.pop();
            }
        }
        self.enter(index, Response::One(self.text_input.clone()));
    }

    fn enter(&mut self, index: usize, response: Response) {
        let Some(session) = self.context.session_mut() else {
            return;
        };
        match session.enter(index, response.clone()) {
            Ok(Entry::Submitted) => self.pending = None,
            Ok(Entry::Pending) => self.pending = Some(response),
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    /// Enter: submit the pending answer, then move on or finish
    fn confirm(&mut self) {
        let Some(session) = self.session() else {
            return;
        };
        let index = session.current_index();
        let deferred = session.quiz().only_show_results_at_end();

        if !deferred && !session.is_answered(index) {
            match self.pending.take() {
                Some(response) => {
                    if let Some(session) = self.context.session_mut() {
                        if let Err(e) = session.submit(index, response) {
                            self.status = Some(e.to_string());
                        }
                    }
                }
                None => self.status = Some("Pick an answer first".to_string()),
            }
            return;
        }

        if session.is_last() {
            self.finish();
        } else {
            self.next();
        }
    }

    fn finish(&mut self) {
        match self.context.finish() {
            Ok(_) => {
                self.screen = Screen::Results;
                self.show_explanation = false;
                self.review_scroll = 0;
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn next(&mut self) {
        if let Some(session) = self.context.session_mut() {
            if session.go_next() == Step::Moved {
                self.sync_inputs();
            }
        }
    }

    fn previous(&mut self) {
        if let Some(session) = self.context.session_mut() {
            match session.go_previous() {
                Step::Moved => self.sync_inputs(),
                Step::Exit => {
                    self.status =
                        Some("This is the first question. Esc leaves the quiz.".to_string());
                }
                Step::Stayed => {}
            }
        }
    }

    fn toggle_explanation(&mut self) {
        let Some(session) = self.session() else {
            return;
        };
        let index = session.current_index();
        if session.current_question().explanation.is_none() {
            self.status = Some("No explanation for this question".to_string());
        } else if !self.is_revealed(index) {
            self.status = Some("Submit an answer to see the explanation".to_string());
        } else {
            self.show_explanation = !self.show_explanation;
        }
    }

    fn sync_inputs(&mut self) {
        self.pending = None;
        self.show_explanation = false;
        self.option_cursor = 0;
        self.text_input = match self.session() {
            Some(session) if !session.current_question().kind.is_choice() => session
                .answer(session.current_index())
                .map(Response::as_text)
                .unwrap_or_default(),
            _ => String::new(),
        };
    }
}
