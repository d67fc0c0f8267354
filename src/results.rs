use chrono::Local;
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::grader::{is_correct, Response};
use crate::quiz::{QuestionKind, Quiz};

/// Aggregate score handed to the results view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResults {
    pub correct: usize,
    pub wrong: usize,
    pub wrong_by_kind: BTreeMap<QuestionKind, usize>,
}

impl QuizResults {
    /// Replay the grader over every question; unanswered questions count as wrong.
    pub fn tally(quiz: &Quiz, answers: &HashMap<usize, Response>) -> Self {
        let (right, missed): (Vec<_>, Vec<_>) = quiz
            .questions()
            .iter()
            .enumerate()
            .partition(|(idx, q)| is_correct(q, answers.get(idx)));

        let wrong_by_kind = missed
            .iter()
            .map(|(_, q)| q.kind)
            .counts()
            .into_iter()
            .collect::<BTreeMap<_, _>>();

        Self {
            correct: right.len(),
            wrong: missed.len(),
            wrong_by_kind,
        }
    }

    pub fn total(&self) -> usize {
        self.correct + self.wrong
    }

    pub fn percentage(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.correct as f64 / total as f64) * 100.0,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.wrong == 0
    }
}

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    date: String,
    title: &'a str,
    correct: usize,
    wrong: usize,
    total: usize,
    percent: String,
    elapsed_secs: u64,
}

/// Append-only CSV log of finished sessions
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(
        &self,
        quiz: &Quiz,
        results: &QuizResults,
        elapsed: Duration,
    ) -> Result<(), csv::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, the first row carries the header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        writer.serialize(ResultRow {
            date: Local::now().format("%c").to_string(),
            title: quiz.display_title(),
            correct: results.correct,
            wrong: results.wrong,
            total: results.total(),
            percent: format!("{:.0}", results.percentage()),
            elapsed_secs: elapsed.as_secs(),
        })?;
        writer.flush()?;
        Ok(())
    }
}
