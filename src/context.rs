use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::history::HistoryStore;
use crate::quiz::{build, BuildError, Quiz};
use crate::results::{QuizResults, ResultsLog};
use crate::session::{Session, SessionError};
use crate::storage::{load_draft, save_draft, KeyValueStore};

/// Owns the live session and the history it reports to.
///
/// Starting a quiz or resuming a history entry replaces the current
/// session; dropping it is the only way to cancel one.
#[derive(Debug)]
pub struct QuizContext<S: KeyValueStore> {
    history: HistoryStore<S>,
    session: Option<Session>,
    results_log: Option<ResultsLog>,
}

impl<S: KeyValueStore> QuizContext<S> {
    pub fn new(history: HistoryStore<S>) -> Self {
        Self {
            history,
            session: None,
            results_log: None,
        }
    }

    pub fn with_results_log(mut self, log: ResultsLog) -> Self {
        self.results_log = Some(log);
        self
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore<S> {
        &mut self.history
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn start(&mut self, quiz: Quiz) -> &mut Session {
        tracing::info!(title = quiz.display_title(), questions = quiz.len(), "starting quiz");
        self.session.insert(Session::new(Arc::new(quiz)))
    }

    /// Remember `raw` as the draft, then build and start it
    pub fn start_from_input(
        &mut self,
        raw: &str,
        only_show_results_at_end: bool,
    ) -> Result<&mut Session, BuildError> {
        if let Err(e) = save_draft(self.history.storage_mut(), raw) {
            tracing::warn!(error = %e, "could not save quiz input");
        }
        let quiz = build(raw, only_show_results_at_end)?;
        Ok(self.start(quiz))
    }

    pub fn draft(&self) -> Option<String> {
        load_draft(self.history.storage())
    }

    pub fn resume(&mut self, timestamp: DateTime<Utc>) -> Option<&mut Session> {
        let session = self.history.resume_at(timestamp)?;
        tracing::info!(%timestamp, "resuming quiz from history");
        Some(self.session.insert(session))
    }

    /// Take the same quiz again without adding it to history
    pub fn restart(&mut self) -> Option<&mut Session> {
        let quiz = self.session.as_ref()?.shared_quiz();
        Some(self.session.insert(Session::resumed(quiz)))
    }

    pub fn discard(&mut self) {
        self.session = None;
    }

    /// Finish the live session. The first completion is recorded in history
    /// (unless the quiz came from there) and appended to the results log.
    pub fn finish(&mut self) -> Result<QuizResults, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        let first_time = !session.is_completed();
        let results = session.finish()?.clone();

        if first_time {
            self.history.record_session(session);
            if let Some(log) = &self.results_log {
                if let Err(e) = log.append(session.quiz(), &results, session.elapsed()) {
                    tracing::warn!(error = %e, path = %log.path().display(), "could not append results log");
                }
            }
        }
        Ok(results)
    }
}
