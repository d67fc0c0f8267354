use serde::{Deserialize, Serialize};

use crate::quiz::{normalize, Question, QuestionKind};

/// A submitted answer: one value, or a set of values for `multiple`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    One(String),
    Many(Vec<String>),
}

impl Response {
    /// Stringified form; a set joins with `,`
    pub fn as_text(&self) -> String {
        match self {
            Response::One(value) => value.clone(),
            Response::Many(values) => values.join(","),
        }
    }

    pub fn contains(&self, option: &str) -> bool {
        match self {
            Response::One(value) => value == option,
            Response::Many(values) => values.iter().any(|v| v == option),
        }
    }

    /// Add or remove `option` from a multi-select response
    pub fn toggled(&self, option: &str) -> Response {
        let mut values = match self {
            Response::One(value) if value.is_empty() => Vec::new(),
            Response::One(value) => vec![value.clone()],
            Response::Many(values) => values.clone(),
        };
        if let Some(pos) = values.iter().position(|v| v == option) {
            values.remove(pos);
        } else {
            values.push(option.to_string());
        }
        Response::Many(values)
    }
}

impl From<&str> for Response {
    fn from(value: &str) -> Self {
        Response::One(value.to_string())
    }
}

impl From<Vec<&str>> for Response {
    fn from(values: Vec<&str>) -> Self {
        Response::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Grade a submission. Never fails: a missing submission is simply wrong.
pub fn is_correct(question: &Question, submitted: Option<&Response>) -> bool {
    let Some(submitted) = submitted else {
        return false;
    };

    match question.kind {
        QuestionKind::Multiple => match submitted {
            Response::Many(values) => {
                let expected = question.answer.values();
                values.len() == expected.len() && values.iter().all(|v| expected.contains(v))
            }
            Response::One(_) => false,
        },
        QuestionKind::Single | QuestionKind::Boolean | QuestionKind::Text | QuestionKind::Number => {
            normalize(&submitted.as_text()) == normalize(&question.answer.as_text())
        }
    }
}

/// How a single choice option should be shown once correctness is revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionVerdict {
    /// selected and part of the answer
    Correct,
    /// selected but not part of the answer
    Wrong,
    /// part of the answer but not selected
    Missed,
    Neutral,
}

pub fn option_verdict(question: &Question, option: &str, selected: bool) -> OptionVerdict {
    let in_answer = match question.kind {
        QuestionKind::Multiple => question.answer.values().iter().any(|v| v == option),
        QuestionKind::Single | QuestionKind::Boolean | QuestionKind::Text | QuestionKind::Number => {
            normalize(&question.answer.as_text()) == normalize(option)
        }
    };

    match (in_answer, selected) {
        (true, true) => OptionVerdict::Correct,
        (false, true) => OptionVerdict::Wrong,
        (true, false) => OptionVerdict::Missed,
        (false, false) => OptionVerdict::Neutral,
    }
}
