// Library-level flows across builder, session, grader and history without a UI.

use std::sync::Arc;

use assert_matches::assert_matches;
use quizline::context::QuizContext;
use quizline::grader::{is_correct, Response};
use quizline::history::{HistoryStore, HISTORY_LIMIT};
use quizline::quiz::{build, BuildError, QuestionKind};
use quizline::session::{Session, SessionError, Step};
use quizline::storage::{MemoryStore, SqliteStore};

#[test]
fn end_to_end_single_number_question() {
    let raw = r#"{"quiz":[{"question":"2+2?","type":"number","options":[],"answer":4}]}"#;
    let quiz = build(raw, false).unwrap();
    assert_eq!(quiz.len(), 1);

    let mut session = Session::new(Arc::new(quiz));
    session.submit(0, Response::from("4")).unwrap();
    assert!(is_correct(session.current_question(), session.answer(0)));

    let results = session.finish().unwrap();
    assert_eq!((results.correct, results.wrong), (1, 0));
}

#[test]
fn invalid_inputs_are_reported_not_fatal() {
    assert_matches!(build("not json", false), Err(BuildError::MalformedInput { .. }));
    assert_matches!(build(r#"{"quiz": []}"#, false), Err(BuildError::EmptyQuiz));
    assert_matches!(build(r#"{"title": "no questions"}"#, false), Err(BuildError::EmptyQuiz));
}

#[test]
fn multiple_choice_is_set_equality() {
    let raw = r#"{"quiz":[{"question":"Langs?","type":"multiple",
        "options":["Python","JavaScript","CSS"],"answer":["Python","JavaScript"]}]}"#;
    let quiz = build(raw, false).unwrap();
    let question = &quiz.questions()[0];
    assert_eq!(question.kind, QuestionKind::Multiple);

    let yes = Response::from(vec!["JavaScript", "Python"]);
    let short = Response::from(vec!["Python"]);
    let long = Response::from(vec!["Python", "JavaScript", "CSS"]);
    assert!(is_correct(question, Some(&yes)));
    assert!(!is_correct(question, Some(&short)));
    assert!(!is_correct(question, Some(&long)));
}

#[test]
fn navigation_stays_in_bounds_and_finish_is_idempotent() {
    let raw = r#"{"quiz":[
        {"question":"a","type":"boolean","answer":false},
        {"question":"b","type":"boolean","answer":true}
    ]}"#;
    let mut session = Session::new(Arc::new(build(raw, true).unwrap()));
    assert_eq!(session.go_previous(), Step::Exit);
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.go_next(), Step::Moved);
    assert_eq!(session.go_next(), Step::Stayed);

    for question in session.quiz().questions() {
        assert_eq!(question.options, vec!["True", "False"]);
    }

    let first = session.finish().unwrap().clone();
    let answers = session.answers().clone();
    assert_eq!(session.finish().unwrap(), &first);
    assert_eq!(session.answers(), &answers);
    assert_eq!(session.submit(0, Response::from("true")), Err(SessionError::AlreadyCompleted));
}

#[test]
fn history_keeps_fifty_most_recent() {
    let mut ctx = QuizContext::new(HistoryStore::load(MemoryStore::new()));
    for i in 0..55 {
        let raw = format!(
            r#"{{"quizTitle":"quiz {i}","quiz":[{{"question":"q","type":"text","answer":"a"}}]}}"#
        );
        ctx.start_from_input(&raw, true).unwrap();
        ctx.finish().unwrap();
    }

    let entries = ctx.history().entries();
    assert_eq!(entries.len(), HISTORY_LIMIT);
    assert_eq!(entries[0].quiz.title(), Some("quiz 54"));
    assert_eq!(entries[HISTORY_LIMIT - 1].quiz.title(), Some("quiz 5"));
    assert!(entries.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
}

#[test]
fn resumed_session_does_not_touch_the_snapshot() {
    let mut history = HistoryStore::load(MemoryStore::new());
    let quiz = build(
        r#"{"quiz":[{"question":"q","type":"text","answer":"a"}]}"#,
        false,
    )
    .unwrap();
    history.record(&quiz, quizline::session::Origin::Fresh).unwrap();

    let entry = history.entries()[0].clone();
    let mut session = history.resume(&entry);
    session.submit(0, Response::from("zzz")).unwrap();
    session.finish().unwrap();

    assert_eq!(history.entries()[0], entry);
    assert_eq!(history.len(), 1);
}

#[test]
fn history_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quizline.db");

    {
        let mut ctx = QuizContext::new(HistoryStore::load(SqliteStore::open(&path).unwrap()));
        ctx.start_from_input(
            r#"{"quizTitle":"kept","quiz":[{"question":"q","type":"text","answer":"a"}]}"#,
            false,
        )
        .unwrap();
        ctx.finish().unwrap();
    }

    let ctx = QuizContext::new(HistoryStore::load(SqliteStore::open(&path).unwrap()));
    assert_eq!(ctx.history().len(), 1);
    assert_eq!(ctx.history().entries()[0].quiz.title(), Some("kept"));
    assert!(ctx.draft().is_some_and(|d| d.contains("kept")));
}
