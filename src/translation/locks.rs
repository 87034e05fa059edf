/*!
 * Lock-region splitting.
 *
 * Authors wrap content that must stay untouched between
 * `<!-- notranslate:start -->` and `<!-- notranslate:end -->`. Markers match
 * case-insensitively and tolerate extra whitespace inside the comment.
 * Nesting is not supported: a start while locked or an end while unlocked is
 * emitted verbatim and changes nothing.
 */

use once_cell::sync::Lazy;
use regex::Regex;

static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<!--\s*notranslate\s*:\s*(start|end)\s*-->").expect("Invalid lock marker regex")
});

/// Canonical start marker, as written by editors
pub const LOCK_START: &str = "<!-- notranslate:start -->";
/// Canonical end marker
pub const LOCK_END: &str = "<!-- notranslate:end -->";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Start,
    End,
}

/// A piece of the document, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A marker, reproduced verbatim
    Marker { text: &'a str, kind: MarkerKind },
    /// Content between markers
    Text { text: &'a str, locked: bool },
}

impl<'a> Segment<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Segment::Marker { text, .. } | Segment::Text { text, .. } => text,
        }
    }
}

/// Result of splitting a document on lock markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSplit<'a> {
    pub segments: Vec<Segment<'a>>,
    /// Completed start/end pairs
    pub pair_count: usize,
    pub saw_any_marker: bool,
    /// Document ended inside a region
    pub ended_still_locked: bool,
}

impl LockSplit<'_> {
    /// Concatenation of all segments; equals the input
    pub fn reassemble(&self) -> String {
        self.segments.iter().map(Segment::as_str).collect()
    }
}

/// Split `document` into marker and text segments
pub fn split(document: &str) -> LockSplit<'_> {
    let mut segments = Vec::new();
    let mut locked = false;
    let mut pair_count = 0;
    let mut saw_any_marker = false;
    let mut last = 0;

    for caps in MARKER_REGEX.captures_iter(document) {
        let Some(whole) = caps.get(0) else { continue };
        saw_any_marker = true;

        if whole.start() > last {
            segments.push(Segment::Text {
                text: &document[last..whole.start()],
                locked,
            });
        }

        let kind = if caps[1].eq_ignore_ascii_case("start") {
            MarkerKind::Start
        } else {
            MarkerKind::End
        };
        match kind {
            MarkerKind::Start => locked = true,
            MarkerKind::End if locked => {
                locked = false;
                pair_count += 1;
            }
            _ => {}
        }

        segments.push(Segment::Marker {
            text: whole.as_str(),
            kind,
        });
        last = whole.end();
    }

    if last < document.len() {
        segments.push(Segment::Text {
            text: &document[last..],
            locked,
        });
    }

    LockSplit {
        segments,
        pair_count,
        saw_any_marker,
        ended_still_locked: locked,
    }
}
