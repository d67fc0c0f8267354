use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::grader::{is_correct, Response};
use crate::quiz::{Question, Quiz};
use crate::results::QuizResults;
use crate::timer::Stopwatch;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("question {index} does not exist (quiz has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("the quiz has already been finished")]
    AlreadyCompleted,
    #[error("finish is only allowed on the last question (at {current}, last is {last})")]
    NotAtLastQuestion { current: usize, last: usize },
    #[error("no quiz is in progress")]
    NoSession,
}

/// Where the quiz driving a session came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Fresh,
    /// Re-taken from a history entry; never recorded again
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress { current: usize },
    Completed,
}

/// Outcome of entering an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Auto-submit mode recorded the answer immediately
    Submitted,
    /// The caller still has to submit explicitly
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    Stayed,
    /// `go_previous` on the first question: the caller should leave the session
    Exit,
}

/// One run through a built quiz
#[derive(Debug, Clone)]
pub struct Session {
    quiz: Arc<Quiz>,
    current_index: usize,
    answers: HashMap<usize, Response>,
    results: Option<QuizResults>,
    origin: Origin,
    timer: Stopwatch,
}

impl Session {
    pub fn new(quiz: Arc<Quiz>) -> Self {
        Self::with_origin(quiz, Origin::Fresh)
    }

    pub fn resumed(quiz: Arc<Quiz>) -> Self {
        Self::with_origin(quiz, Origin::History)
    }

    fn with_origin(quiz: Arc<Quiz>, origin: Origin) -> Self {
        Self {
            quiz,
            current_index: 0,
            answers: HashMap::new(),
            results: None,
            origin,
            timer: Stopwatch::default(),
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn shared_quiz(&self) -> Arc<Quiz> {
        Arc::clone(&self.quiz)
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn state(&self) -> SessionState {
        if self.results.is_some() {
            SessionState::Completed
        } else {
            SessionState::InProgress {
                current: self.current_index,
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.results.is_some()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.quiz.questions()[self.current_index]
    }

    pub fn is_last(&self) -> bool {
        self.current_index == self.quiz.last_index()
    }

    /// (1-based position, total) for progress display
    pub fn progress(&self) -> (usize, usize) {
        (self.current_index + 1, self.quiz.len())
    }

    pub fn answer(&self, index: usize) -> Option<&Response> {
        self.answers.get(&index)
    }

    pub fn answers(&self) -> &HashMap<usize, Response> {
        &self.answers
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.answers.contains_key(&index)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Grade a submitted answer; `None` while the question is unanswered
    pub fn verdict(&self, index: usize) -> Option<bool> {
        let question = self.quiz.question(index)?;
        self.answers
            .get(&index)
            .map(|answer| is_correct(question, Some(answer)))
    }

    /// Record (or overwrite) the answer for `index`
    pub fn submit(&mut self, index: usize, answer: Response) -> Result<(), SessionError> {
        if self.is_completed() {
            return Err(SessionError::AlreadyCompleted);
        }
        if index >= self.quiz.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.quiz.len(),
            });
        }
        tracing::debug!(index, "answer submitted");
        self.answers.insert(index, answer);
        Ok(())
    }

    /// Answer entry from the user. In results-at-end mode every entry submits at once.
    pub fn enter(&mut self, index: usize, answer: Response) -> Result<Entry, SessionError> {
        if self.is_completed() {
            return Err(SessionError::AlreadyCompleted);
        }
        if index >= self.quiz.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.quiz.len(),
            });
        }
        if self.quiz.only_show_results_at_end() {
            self.submit(index, answer)?;
            Ok(Entry::Submitted)
        } else {
            Ok(Entry::Pending)
        }
    }

    pub fn go_next(&mut self) -> Step {
        if self.is_completed() || self.is_last() {
            return Step::Stayed;
        }
        self.current_index += 1;
        Step::Moved
    }

    pub fn go_previous(&mut self) -> Step {
        if self.is_completed() {
            return Step::Stayed;
        }
        if self.current_index == 0 {
            return Step::Exit;
        }
        self.current_index -= 1;
        Step::Moved
    }

    /// Complete the session on the last question. Calling it again returns the same results.
    pub fn finish(&mut self) -> Result<&QuizResults, SessionError> {
        let results = match self.results.take() {
            Some(results) => results,
            None => {
                if !self.is_last() {
                    return Err(SessionError::NotAtLastQuestion {
                        current: self.current_index,
                        last: self.quiz.last_index(),
                    });
                }
                let results = QuizResults::tally(&self.quiz, &self.answers);
                self.timer.pause();
                tracing::info!(
                    correct = results.correct,
                    wrong = results.wrong,
                    elapsed_secs = self.timer.elapsed().as_secs(),
                    "session finished"
                );
                results
            }
        };
        Ok(&*self.results.insert(results))
    }

    pub fn results(&self) -> Option<&QuizResults> {
        self.results.as_ref()
    }

    pub fn tick(&mut self, dt: Duration) {
        if !self.is_completed() {
            self.timer.tick(dt);
        }
    }

    pub fn toggle_timer(&mut self) {
        if !self.is_completed() {
            self.timer.toggle();
        }
    }

    pub fn pause_timer(&mut self) {
        self.timer.pause();
    }

    pub fn resume_timer(&mut self) {
        if !self.is_completed() {
            self.timer.resume();
        }
    }

    pub fn timer(&self) -> &Stopwatch {
        &self.timer
    }

    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }
}
