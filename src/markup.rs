//! Inline code-span markup used in question text and explanations.
//!
//! A single backtick toggles a code span. A doubled backtick opens a
//! literal code segment that runs until the next doubled backtick, so
//! single backticks inside it are kept as-is.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub code: bool,
}

impl Segment {
    fn new(text: &str, code: bool) -> Self {
        Self {
            text: text.to_string(),
            code,
        }
    }
}

pub fn segments(text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut rest = text;
    let mut in_code = false;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("``") {
            let (literal, tail) = match after.find("``") {
                Some(end) => (&after[..end], &after[end + 2..]),
                None => (after, ""),
            };
            if !literal.is_empty() {
                out.push(Segment::new(literal, true));
            }
            rest = tail;
            continue;
        }

        let next = rest.find('`').unwrap_or(rest.len());
        if next > 0 {
            out.push(Segment::new(&rest[..next], in_code));
            rest = &rest[next..];
            continue;
        }

        // lone backtick
        in_code = !in_code;
        rest = &rest[1..];
    }

    merge(out)
}

/// Plain text with every marker removed
pub fn plain(text: &str) -> String {
    segments(text).into_iter().map(|s| s.text).collect()
}

// Join neighbours with the same style.
fn merge(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match merged.last_mut() {
            Some(last) if last.code == segment.code => last.text.push_str(&segment.text),
            _ => merged.push(segment),
        }
    }
    merged
}
