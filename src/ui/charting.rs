use crate::quiz::QuestionKind;
use crate::results::QuizResults;

const MAX_BAR_WIDTH: u16 = 9;

/// Correct/wrong split for the results chart
pub fn outcome_bars(results: &QuizResults) -> [(&'static str, u64); 2] {
    [
        ("Correct", results.correct as u64),
        ("Wrong", results.wrong as u64),
    ]
}

/// Wrong answers per question type. Every type gets a bar so charts line up between runs.
pub fn wrong_by_kind_bars(results: &QuizResults) -> Vec<(String, u64)> {
    QuestionKind::ALL
        .iter()
        .map(|kind| {
            let count = results.wrong_by_kind.get(kind).copied().unwrap_or(0);
            (kind.to_string(), count as u64)
        })
        .collect()
}

/// Widest bar that lets `bars` bars (with a one-cell gap) fit inside a bordered block
pub fn bar_width(area_width: u16, bars: usize) -> u16 {
    if bars == 0 {
        return 1;
    }
    let inner = area_width.saturating_sub(2);
    let per_bar = inner / bars as u16;
    per_bar.saturating_sub(1).clamp(1, MAX_BAR_WIDTH)
}

/// Format a score percentage consistently
pub fn format_percentage(val: f64) -> String {
    format!("{val:.0}%")
}
