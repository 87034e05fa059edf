/*!
 * MJML element scanning and attribute helpers.
 *
 * Only a handful of components carry human-readable text:
 * `mj-preview`, `mj-text` and `mj-button` bodies, the `title` attribute of
 * `mj-button` and the `alt` attribute of `mj-image`. Everything here works on
 * byte ranges so callers can splice translated text back in without touching
 * the surrounding markup.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use crate::translation::shield::{ShieldMap, TEMPLATE_REGEX, TOKEN_REGEX};

/// Key kind used for shielded raw blocks
pub const RAW_BLOCK_KIND: &str = "MJRAW";

/// Opening, self-closing and closing `mj-raw` tags
static RAW_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<mj-raw\b[^>]*>|</mj-raw\s*>").expect("Invalid raw tag regex")
});

static PREVIEW_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<mj-preview\b[^>]*>(.*?)</mj-preview>").expect("Invalid preview regex")
});

static TEXT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<mj-text\b[^>]*>(.*?)</mj-text>").expect("Invalid text regex")
});

static BUTTON_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<mj-button\b([^>]*)>(.*?)</mj-button>").expect("Invalid button regex")
});

static IMAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<mj-image\b([^>]*)>").expect("Invalid image regex"));

static TITLE_ATTR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)title\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("Invalid title attribute regex")
});

static ALT_ATTR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)alt\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("Invalid alt attribute regex")
});

/// Named, decimal and hexadecimal character references
static ENTITY_REF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
        .expect("Invalid entity reference regex")
});

/// Names of U+00A0 to U+00FF, in code point order
const LATIN1_ENTITIES: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf",
    "laquo", "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro",
    "para", "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest",
    "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave", "Eacute",
    "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve", "Oacute",
    "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml", "Yacute",
    "THORN", "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig", "ccedil",
    "egrave", "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth", "ntilde",
    "ograve", "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave", "uacute", "ucirc",
    "uuml", "yacute", "thorn", "yuml",
];

/// Markup and typographic entities outside Latin-1
const OTHER_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("OElig", '\u{152}'),
    ("oelig", '\u{153}'),
    ("Scaron", '\u{160}'),
    ("scaron", '\u{161}'),
    ("Yuml", '\u{178}'),
    ("ensp", '\u{2002}'),
    ("emsp", '\u{2003}'),
    ("thinsp", '\u{2009}'),
    ("zwnj", '\u{200C}'),
    ("zwj", '\u{200D}'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("sbquo", '\u{201A}'),
    ("ldquo", '\u{201C}'),
    ("rdquo", '\u{201D}'),
    ("bdquo", '\u{201E}'),
    ("dagger", '\u{2020}'),
    ("Dagger", '\u{2021}'),
    ("bull", '\u{2022}'),
    ("hellip", '\u{2026}'),
    ("permil", '\u{2030}'),
    ("lsaquo", '\u{2039}'),
    ("rsaquo", '\u{203A}'),
    ("euro", '\u{20AC}'),
    ("trade", '\u{2122}'),
];

/// Elements whose body is translated as an HTML fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyElement {
    Preview,
    Text,
}

impl BodyElement {
    fn regex(self) -> &'static Regex {
        match self {
            BodyElement::Preview => &PREVIEW_REGEX,
            BodyElement::Text => &TEXT_REGEX,
        }
    }

    pub fn tag_name(self) -> &'static str {
        match self {
            BodyElement::Preview => "mj-preview",
            BodyElement::Text => "mj-text",
        }
    }
}

/// Attributes translated as token-preserving plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAttribute {
    Title,
    Alt,
}

impl TextAttribute {
    fn regex(self) -> &'static Regex {
        match self {
            TextAttribute::Title => &TITLE_ATTR_REGEX,
            TextAttribute::Alt => &ALT_ATTR_REGEX,
        }
    }
}

/// Body ranges of every element of the given kind
pub fn body_ranges(text: &str, element: BodyElement) -> Vec<Range<usize>> {
    element
        .regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.range()))
        .collect()
}

/// Location of one `mj-button` in a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpan {
    /// Attribute list of the opening tag
    pub attributes: Range<usize>,
    /// Visible label
    pub label: Range<usize>,
}

pub fn button_spans(text: &str) -> Vec<ButtonSpan> {
    BUTTON_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            Some(ButtonSpan {
                attributes: caps.get(1)?.range(),
                label: caps.get(2)?.range(),
            })
        })
        .collect()
}

/// Attribute-list ranges of every `mj-image` opening tag.
///
/// The range stops before `>`, so a trailing `/` or ` /` stays inside it and
/// is carried through untouched.
pub fn image_attribute_ranges(text: &str) -> Vec<Range<usize>> {
    IMAGE_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.range()))
        .collect()
}

/// Quoted attribute value located in an attribute list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    /// Value without its quotes
    pub range: Range<usize>,
    /// `"` or `'`
    pub quote: char,
}

/// Location of the quoted value of `attribute` inside an attribute list
pub fn attribute_value(attributes: &str, attribute: TextAttribute) -> Option<AttributeValue> {
    let caps = attribute.regex().captures(attributes)?;
    if let Some(m) = caps.get(1) {
        return Some(AttributeValue { range: m.range(), quote: '"' });
    }
    caps.get(2).map(|m| AttributeValue { range: m.range(), quote: '\'' })
}

/// One `mj-raw` element, paired with its own closing tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// From `<mj-raw` through `</mj-raw>`
    pub outer: Range<usize>,
    /// Content between the tags; empty for `<mj-raw/>`
    pub inner: Range<usize>,
}

struct OpenRaw {
    start: usize,
    content_start: usize,
    children: Vec<RawBlock>,
}

/// Outermost raw blocks, in document order.
///
/// Opening and closing tags are paired by depth, so a nested `mj-raw` stays
/// inside its parent. A closing tag without an opener is ignored. When an
/// opener is never closed, the complete blocks inside it are reported instead.
pub fn raw_blocks(text: &str) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    let mut stack: Vec<OpenRaw> = Vec::new();

    for tag in RAW_TAG_REGEX.find_iter(text) {
        let is_close = tag.as_str().starts_with("</");
        let block = if is_close {
            let Some(open) = stack.pop() else { continue };
            RawBlock {
                outer: open.start..tag.end(),
                inner: open.content_start..tag.start(),
            }
        } else if tag.as_str().ends_with("/>") {
            RawBlock {
                outer: tag.range(),
                inner: tag.end()..tag.end(),
            }
        } else {
            stack.push(OpenRaw {
                start: tag.start(),
                content_start: tag.end(),
                children: Vec::new(),
            });
            continue;
        };

        match stack.last_mut() {
            Some(parent) => parent.children.push(block),
            None => blocks.push(block),
        }
    }

    while let Some(open) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.extend(open.children),
            None => blocks.extend(open.children),
        }
    }

    blocks.sort_by_key(|b| b.outer.start);
    blocks
}

/// Replace every raw block with a key recorded in `map`
pub fn shield_raw_blocks(text: &str, map: &mut ShieldMap) -> String {
    let ranges: Vec<Range<usize>> = raw_blocks(text).into_iter().map(|b| b.outer).collect();
    map.shield_ranges(text, &ranges, RAW_BLOCK_KIND)
}

/// Put raw blocks back
pub fn restore_raw_blocks(text: &str, map: &ShieldMap) -> String {
    map.restore(text)
}

/// One piece of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributePart<'a> {
    /// `{{ … }}`, `{% … %}` or `{token}`: never sent
    Token(&'a str),
    Text(&'a str),
}

/// Split an attribute value into alternating token and text parts.
///
/// Character references that `decode_entities` cannot resolve count as
/// tokens, so they are written back verbatim.
pub fn split_attribute_tokens(value: &str) -> Vec<AttributePart<'_>> {
    let mut spans: Vec<Range<usize>> = TEMPLATE_REGEX.find_iter(value).map(|m| m.range()).collect();
    let unknown_entities = ENTITY_REF_REGEX
        .captures_iter(value)
        .filter(|caps| decode_reference(&caps[1]).is_none())
        .filter_map(|caps| caps.get(0));
    for m in TOKEN_REGEX.find_iter(value).chain(unknown_entities) {
        if !spans.iter().any(|s| s.start < m.end() && m.start() < s.end) {
            spans.push(m.range());
        }
    }
    spans.sort_by_key(|s| s.start);

    let mut parts = Vec::with_capacity(spans.len() * 2 + 1);
    let mut last = 0;
    for span in spans {
        if span.start > last {
            parts.push(AttributePart::Text(&value[last..span.start]));
        }
        parts.push(AttributePart::Token(&value[span.clone()]));
        last = span.end;
    }
    if last < value.len() {
        parts.push(AttributePart::Text(&value[last..]));
    }
    parts
}

/// Character behind a reference name (`eacute`, `#233`, `#xE9`)
fn decode_reference(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).filter(|c| *c != '\0');
    }
    if let Some(index) = LATIN1_ENTITIES.iter().position(|n| *n == name) {
        return char::from_u32(0xA0 + index as u32);
    }
    OTHER_ENTITIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| *c)
}

/// Decode named and numeric character references in one pass.
///
/// Unknown names are left as written.
pub fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    ENTITY_REF_REGEX
        .replace_all(value, |caps: &regex::Captures<'_>| match decode_reference(&caps[1]) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Escape a value for a double-quoted attribute
pub fn escape_attribute(value: &str) -> String {
    escape_attribute_quoted(value, '"')
}

/// Escape a value for an attribute delimited by `quote`.
///
/// No-break spaces are written as `&nbsp;` so they stay visible in the source.
pub fn escape_attribute_quoted(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' if quote == '\'' => out.push_str("&#39;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Split off leading and trailing whitespace: `(lead, core, trail)`
pub fn split_padding(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len().max(start);
    (&text[..start], &text[start..end], &text[end..])
}
