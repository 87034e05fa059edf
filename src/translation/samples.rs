use serde::Serialize;

/// Default preview length in characters
pub const DEFAULT_PREVIEW_CHARS: usize = 80;

/// Default number of samples kept in a report
pub const DEFAULT_SAMPLE_LIMIT: usize = 4;

/// One before/after pair shown in the job report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSample {
    pub from: String,
    pub to: String,
}

impl ChangeSample {
    /// Build a sample from full texts, shortening both sides
    pub fn new(from: &str, to: &str, max_chars: usize) -> Self {
        Self {
            from: preview(from, max_chars),
            to: preview(to, max_chars),
        }
    }
}

/// Collapse whitespace runs, trim, and cut to `max_chars` with a trailing ellipsis
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(max_chars).collect();
    cut.push('…');
    cut
}
