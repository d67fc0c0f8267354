use include_dir::{include_dir, Dir};

static SAMPLE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/samples");

/// Names of the bundled quizzes, sorted
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = SAMPLE_DIR
        .files()
        .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
        .filter_map(|f| f.path().file_stem().and_then(|s| s.to_str()))
        .collect();
    names.sort_unstable();
    names
}

/// Raw JSON of a bundled quiz
pub fn get(name: &str) -> Option<&'static str> {
    SAMPLE_DIR
        .get_file(format!("{name}.json"))
        .and_then(|f| f.contents_utf8())
}
