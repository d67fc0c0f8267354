use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::shuffle::shuffled_with;

/// Options presented for every boolean question, in this order
pub const BOOLEAN_OPTIONS: [&str; 2] = ["True", "False"];

const UNTITLED: &str = "Untitled Quiz";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Invalid JSON format. Please enter valid JSON. ({reason})")]
    MalformedInput { reason: String },
    #[error("Invalid JSON data. No questions found.")]
    EmptyQuiz,
}

impl BuildError {
    fn malformed(reason: impl Into<String>) -> Self {
        BuildError::MalformedInput {
            reason: reason.into(),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multiple,
    Number,
    Boolean,
    Text,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 5] = [
        QuestionKind::Single,
        QuestionKind::Multiple,
        QuestionKind::Number,
        QuestionKind::Boolean,
        QuestionKind::Text,
    ];

    fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|kind| kind.to_string() == name)
    }

    /// Answered by picking from `options` rather than typing
    pub fn is_choice(self) -> bool {
        match self {
            QuestionKind::Single | QuestionKind::Multiple | QuestionKind::Boolean => true,
            QuestionKind::Number | QuestionKind::Text => false,
        }
    }
}

/// Expected answer: a scalar for everything except `multiple`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    One(String),
    Many(Vec<String>),
}

impl Answer {
    pub fn values(&self) -> &[String] {
        match self {
            Answer::One(value) => std::slice::from_ref(value),
            Answer::Many(values) => values,
        }
    }

    /// Stringified form used for scalar comparisons
    pub fn as_text(&self) -> String {
        match self {
            Answer::One(value) => value.clone(),
            Answer::Many(values) => values.join(","),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "question")]
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    pub fn display_answer(&self) -> String {
        self.answer.values().join(", ")
    }
}

/// A built, session-ready quiz. Question order is the presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(rename = "quizTitle", default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(rename = "quiz")]
    questions: Vec<Question>,
    #[serde(rename = "onlyShowResultsAtEnd", default)]
    only_show_results_at_end: bool,
}

impl Quiz {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn display_title(&self) -> &str {
        self.title().unwrap_or(UNTITLED)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.questions.len().saturating_sub(1)
    }

    pub fn only_show_results_at_end(&self) -> bool {
        self.only_show_results_at_end
    }
}

#[derive(Deserialize)]
struct RawQuestion {
    #[serde(default)]
    id: Option<Value>,
    #[serde(alias = "text")]
    question: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    options: Vec<Value>,
    #[serde(default)]
    answer: Value,
    #[serde(default)]
    explanation: Option<String>,
}

/// Validate raw quiz JSON, shuffle it and merge in the results-at-end flag.
pub fn build(raw: &str, only_show_results_at_end: bool) -> Result<Quiz, BuildError> {
    let mut rng = rand::thread_rng();
    build_with(raw, only_show_results_at_end, &mut rng)
}

pub fn build_with<R: Rng + ?Sized>(
    raw: &str,
    only_show_results_at_end: bool,
    rng: &mut R,
) -> Result<Quiz, BuildError> {
    let root: Value =
        serde_json::from_str(raw).map_err(|e| BuildError::malformed(e.to_string()))?;

    let mut root = match root {
        Value::Object(map) => map,
        Value::Null => return Err(BuildError::malformed("top level value is null")),
        _ => return Err(BuildError::EmptyQuiz),
    };

    let title = root
        .get("quizTitle")
        .or_else(|| root.get("title"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);

    let records = match root.remove("quiz") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(BuildError::EmptyQuiz),
    };

    let questions = records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| decode_question(idx + 1, record))
        .collect::<Result<Vec<_>, _>>()?;

    let questions = shuffled_with(&questions, rng)
        .into_iter()
        .map(|mut question| {
            if matches!(question.kind, QuestionKind::Single | QuestionKind::Multiple) {
                question.options = shuffled_with(&question.options, rng);
            }
            question
        })
        .collect::<Vec<_>>();

    tracing::debug!(questions = questions.len(), "quiz built");

    Ok(Quiz {
        title,
        questions,
        only_show_results_at_end,
    })
}

fn decode_question(position: usize, record: Value) -> Result<Question, BuildError> {
    let raw: RawQuestion = serde_json::from_value(record)
        .map_err(|e| BuildError::malformed(format!("question {position}: {e}")))?;

    let kind = QuestionKind::parse(&raw.kind).ok_or_else(|| {
        BuildError::malformed(format!(
            "question {position}: unknown question type `{}`",
            raw.kind
        ))
    })?;

    let options = match kind {
        QuestionKind::Boolean => BOOLEAN_OPTIONS.iter().map(|o| o.to_string()).collect(),
        _ => raw
            .options
            .iter()
            .map(|option| {
                stringify_scalar(option).ok_or_else(|| {
                    BuildError::malformed(format!("question {position}: options must be scalars"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    let answer = decode_answer(kind, &raw.answer)
        .ok_or_else(|| BuildError::malformed(format!("question {position}: missing or invalid answer")))?;

    let answer = match_answer_to_options(position, kind, &options, answer)?;

    Ok(Question {
        id: raw.id.as_ref().and_then(stringify_scalar),
        text: raw.question,
        kind,
        options,
        answer,
        explanation: raw.explanation.filter(|e| !e.trim().is_empty()),
    })
}

fn decode_answer(kind: QuestionKind, value: &Value) -> Option<Answer> {
    let values = match value {
        Value::Array(items) => items
            .iter()
            .map(stringify_scalar)
            .collect::<Option<Vec<_>>>()?,
        scalar => vec![stringify_scalar(scalar)?],
    };

    match kind {
        QuestionKind::Multiple => Some(Answer::Many(values)),
        _ if matches!(value, Value::Array(_)) => Some(Answer::One(values.join(","))),
        _ => values.into_iter().next().map(Answer::One),
    }
}

/// Choice answers are matched against the options ignoring case and
/// surrounding spaces, then stored with the option's own spelling so the
/// exact comparison used for `multiple` grading sees the same strings.
fn match_answer_to_options(
    position: usize,
    kind: QuestionKind,
    options: &[String],
    answer: Answer,
) -> Result<Answer, BuildError> {
    if !kind.is_choice() {
        return Ok(answer);
    }

    let spell = |value: String| {
        let key = normalize(&value);
        options
            .iter()
            .find(|option| normalize(option) == key)
            .cloned()
            .ok_or_else(|| {
                BuildError::malformed(format!(
                    "question {position}: answer `{value}` is not one of the options"
                ))
            })
    };

    match answer {
        Answer::One(value) => spell(value).map(Answer::One),
        Answer::Many(values) => values
            .into_iter()
            .map(spell)
            .collect::<Result<Vec<_>, _>>()
            .map(Answer::Many),
    }
}

/// Case-insensitive, whitespace-trimmed comparison key
pub(crate) fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn stringify_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(format_number(n)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// Integral floats print without a fraction, so `4.0` and `4` both read "4".
fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grader::{is_correct, option_verdict, OptionVerdict, Response};
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const LANGUAGES: &str = r#"{
        "quizTitle": "Basics",
        "quiz": [
            {"id": "q1", "question": "Capital of France?", "type": "single", "options": ["Paris", "London", "Berlin", "Madrid"], "answer": "Paris"},
            {"id": "q2", "question": "Programming languages?", "type": "multiple", "options": ["Python", "HTML", "JavaScript", "CSS"], "answer": ["Python", "JavaScript"]},
            {"id": "q3", "question": "Square root of 16?", "type": "number", "options": [], "answer": 4},
            {"id": "q4", "question": "Is the Earth flat?", "type": "boolean", "options": [true, false], "answer": false},
            {"id": "q5", "question": "Capital of Germany:", "type": "text", "options": [], "answer": "Berlin", "explanation": "Since 1990."}
        ]
    }"#;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(1234)
    }

    #[test]
    fn test_build_keeps_every_question() {
        let quiz = build_with(LANGUAGES, false, &mut seeded()).unwrap();
        assert_eq!(quiz.len(), 5);

        let mut ids: Vec<_> = quiz
            .questions()
            .iter()
            .map(|q| q.id.clone().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4", "q5"]);
        assert_eq!(quiz.title(), Some("Basics"));
        assert!(!quiz.only_show_results_at_end());
    }

    #[test]
    fn test_build_shuffles_options_as_permutation() {
        for seed in 0..20 {
            let quiz = build_with(LANGUAGES, true, &mut StdRng::seed_from_u64(seed)).unwrap();
            let single = quiz
                .questions()
                .iter()
                .find(|q| q.kind == QuestionKind::Single)
                .unwrap();
            let mut options = single.options.clone();
            options.sort();
            assert_eq!(options, vec!["Berlin", "London", "Madrid", "Paris"]);
        }
    }

    #[test]
    fn test_boolean_options_are_canonical() {
        for seed in 0..20 {
            let quiz = build_with(LANGUAGES, false, &mut StdRng::seed_from_u64(seed)).unwrap();
            let boolean = quiz
                .questions()
                .iter()
                .find(|q| q.kind == QuestionKind::Boolean)
                .unwrap();
            assert_eq!(boolean.options, vec!["True", "False"]);
            assert_eq!(boolean.answer, Answer::One("False".to_string()));
        }
    }

    #[test]
    fn test_number_answer_is_stringified() {
        let quiz = build(
            r#"{"quiz":[{"question":"2+2?","type":"number","options":[],"answer":4.0}]}"#,
            false,
        )
        .unwrap();
        assert_eq!(quiz.questions()[0].answer, Answer::One("4".to_string()));

        let quiz = build(
            r#"{"quiz":[{"question":"pi?","type":"number","answer":3.14}]}"#,
            false,
        )
        .unwrap();
        assert_eq!(quiz.questions()[0].answer, Answer::One("3.14".to_string()));
    }

    #[test]
    fn test_multiple_with_scalar_answer_becomes_set() {
        let quiz = build(
            r#"{"quiz":[{"question":"Pick","type":"multiple","options":["a","b"],"answer":"a"}]}"#,
            false,
        )
        .unwrap();
        assert_eq!(quiz.questions()[0].answer, Answer::Many(vec!["a".to_string()]));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert_matches!(build("{not json", false), Err(BuildError::MalformedInput { .. }));
        assert_matches!(build("null", false), Err(BuildError::MalformedInput { .. }));
    }

    #[test]
    fn test_missing_or_empty_quiz_is_empty() {
        assert_eq!(build("{}", false), Err(BuildError::EmptyQuiz));
        assert_eq!(build(r#"{"quiz": []}"#, false), Err(BuildError::EmptyQuiz));
        assert_eq!(build(r#"{"quiz": {"a": 1}}"#, false), Err(BuildError::EmptyQuiz));
        assert_eq!(build("[1, 2]", false), Err(BuildError::EmptyQuiz));
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let err = build(
            r#"{"quiz":[{"question":"?","type":"essay","answer":"x"}]}"#,
            false,
        )
        .unwrap_err();
        assert_matches!(err, BuildError::MalformedInput { ref reason } if reason.contains("essay"));
    }

    #[test]
    fn test_answer_must_be_an_option() {
        let err = build(
            r#"{"quiz":[{"question":"?","type":"single","options":["a","b"],"answer":"c"}]}"#,
            false,
        )
        .unwrap_err();
        assert_matches!(err, BuildError::MalformedInput { .. });

        // Case and padding do not matter for the membership check
        let quiz = build(
            r#"{"quiz":[{"question":"?","type":"single","options":["Alpha","b"],"answer":" alpha "}]}"#,
            false,
        )
        .unwrap();
        assert_eq!(quiz.questions()[0].answer, Answer::One("Alpha".to_string()));
    }

    #[test]
    fn test_multiple_answer_takes_option_spelling() {
        let quiz = build(
            r#"{"quiz":[{"question":"Langs?","type":"multiple","options":["Python","JavaScript","CSS"],"answer":["python"," javascript"]}]}"#,
            false,
        )
        .unwrap();
        let question = &quiz.questions()[0];
        assert_eq!(
            question.answer,
            Answer::Many(vec!["Python".to_string(), "JavaScript".to_string()])
        );
        assert!(question
            .answer
            .values()
            .iter()
            .all(|value| question.options.contains(value)));

        let picked = Response::from(vec!["JavaScript", "Python"]);
        assert!(is_correct(question, Some(&picked)));
        assert_eq!(
            option_verdict(question, "Python", true),
            OptionVerdict::Correct
        );
    }

    #[test]
    fn test_missing_answer_is_malformed() {
        assert_matches!(
            build(r#"{"quiz":[{"question":"?","type":"text"}]}"#, false),
            Err(BuildError::MalformedInput { .. })
        );
    }

    #[test]
    fn test_title_alias_and_flag() {
        let quiz = build(
            r#"{"title":"Alias","quiz":[{"text":"t?","type":"text","answer":"x"}]}"#,
            true,
        )
        .unwrap();
        assert_eq!(quiz.display_title(), "Alias");
        assert_eq!(quiz.questions()[0].text, "t?");
        assert!(quiz.only_show_results_at_end());
    }

    #[test]
    fn test_untitled_display() {
        let quiz = build(r#"{"quiz":[{"question":"t?","type":"text","answer":"x"}]}"#, false).unwrap();
        assert_eq!(quiz.title(), None);
        assert_eq!(quiz.display_title(), "Untitled Quiz");
    }

    #[test]
    fn test_quiz_serde_snapshot_roundtrip() {
        let quiz = build_with(LANGUAGES, true, &mut seeded()).unwrap();
        let json = serde_json::to_string(&quiz).unwrap();
        let back: Quiz = serde_json::from_str(&json).unwrap();
        assert_eq!(quiz, back);
    }
}
