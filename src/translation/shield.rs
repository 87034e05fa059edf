/*!
 * Placeholder shielding for non-translatable spans.
 *
 * Before a fragment goes to the backend, every span the backend must not
 * touch is swapped for a key such as `__TAG_3__`. Keys use only underscores,
 * uppercase letters and digits, so none of the shielding patterns can match
 * them. After translation the keys are swapped back, longest key first, in a
 * single left-to-right pass: restored text is never scanned again.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Keys left in the text by an outer pass (raw-block keys and the like)
static OUTER_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__[A-Z]+_\d+__").expect("Invalid outer key regex"));

/// HTML comments
static COMMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Invalid comment regex"));

/// Any markup tag
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));

/// `{{ expression }}` and `{% statement %}`
pub(crate) static TEMPLATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}").expect("Invalid template regex"));

/// `{unsubscribe_url}`, `{contactfield=firstname}` and friends
pub(crate) static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\{[a-z0-9_:.%-]+(?:=[^}]+)?\}").expect("Invalid token regex")
});

/// Character entities, ignored when deciding whether anything is left to translate
static ENTITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#?[a-zA-Z0-9]+;").expect("Invalid entity regex"));

/// Which spans to shield
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldProfile {
    /// Comments, tags, templating expressions and tokens
    Full,
    /// Templating expressions and tokens only; the backend handles tags
    Markup,
}

/// Mapping from placeholder key to the verbatim text it stands for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShieldMap {
    entries: Vec<(String, String)>,
    next_index: usize,
}

impl ShieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original text behind a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Record `original` under a fresh key that does not occur in `haystack`
    pub fn insert(&mut self, kind: &str, original: &str, haystack: &str) -> String {
        let key = loop {
            let candidate = format!("__{}_{}__", kind, self.next_index);
            self.next_index += 1;
            if !haystack.contains(&candidate) {
                break candidate;
            }
        };
        self.entries.push((key.clone(), original.to_string()));
        key
    }

    /// Replace every match of `regex` in `text` with a key of the given kind.
    ///
    /// A match may enclose keys from earlier rules; the stored original is
    /// restored first so every entry holds verbatim source text.
    pub fn shield_pattern(&mut self, text: &str, regex: &Regex, kind: &str) -> String {
        let ranges: Vec<Range<usize>> = regex.find_iter(text).map(|m| m.range()).collect();
        self.shield_ranges(text, &ranges, kind)
    }

    /// Replace each of the ordered, non-overlapping `ranges` with a key
    pub fn shield_ranges(&mut self, text: &str, ranges: &[Range<usize>], kind: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for range in ranges {
            out.push_str(&text[last..range.start]);
            let original = self.restore(&text[range.clone()]);
            let key = self.insert(kind, &original, text);
            out.push_str(&key);
            last = range.end;
        }
        out.push_str(&text[last..]);
        out
    }

    /// Swap keys back for their originals, longest key first, single pass
    pub fn restore(&self, text: &str) -> String {
        if self.entries.is_empty() || !text.contains("__") {
            return text.to_string();
        }

        let mut ordered: Vec<&(String, String)> = self.entries.iter().collect();
        ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find("__") {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            match ordered.iter().find(|(k, _)| tail.starts_with(k.as_str())) {
                Some((key, original)) => {
                    out.push_str(original);
                    rest = &tail[key.len()..];
                }
                None => {
                    out.push('_');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Keys that do not appear in `text`, e.g. because the backend mangled them
    pub fn missing_keys(&self, text: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| !text.contains(k.as_str()))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Shielded text together with the map needed to undo it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shielded {
    pub text: String,
    pub map: ShieldMap,
}

impl Shielded {
    /// Whether anything translatable is left once keys, tags and entities are
    /// ignored
    pub fn has_translatable_text(&self) -> bool {
        has_translatable_text(&self.text)
    }
}

/// Shield with the full rule set
pub fn shield(text: &str) -> Shielded {
    shield_with(text, ShieldProfile::Full)
}

/// Shield with the given profile
pub fn shield_with(text: &str, profile: ShieldProfile) -> Shielded {
    let mut map = ShieldMap::new();
    let mut shielded = map.shield_pattern(text, &OUTER_KEY_REGEX, "KEY");
    if profile == ShieldProfile::Full {
        shielded = map.shield_pattern(&shielded, &COMMENT_REGEX, "CMT");
        shielded = map.shield_pattern(&shielded, &TAG_REGEX, "TAG");
    }
    shielded = map.shield_pattern(&shielded, &TEMPLATE_REGEX, "TWIG");
    shielded = map.shield_pattern(&shielded, &TOKEN_REGEX, "TOK");
    Shielded {
        text: shielded,
        map,
    }
}

/// Inverse of `shield`
pub fn unshield(text: &str, map: &ShieldMap) -> String {
    map.restore(text)
}

/// True when `text` still holds letters outside keys, tags and entities
pub fn has_translatable_text(text: &str) -> bool {
    let residue = OUTER_KEY_REGEX.replace_all(text, " ");
    let residue = COMMENT_REGEX.replace_all(&residue, " ");
    let residue = TAG_REGEX.replace_all(&residue, " ");
    let residue = ENTITY_REGEX.replace_all(&residue, " ");
    residue.chars().any(char::is_alphabetic)
}
