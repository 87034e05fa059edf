use log::{debug, info, warn};
use std::ops::Range;
use std::sync::Arc;

use crate::app_config::TranslationSettings;
use crate::providers::{TranslateOptions, TranslationBackend};
use crate::translation::locks::{self, Segment};
use crate::translation::markup::{
    self, AttributePart, BodyElement, TextAttribute, decode_entities, escape_attribute_quoted,
    split_padding,
};
use crate::translation::samples::{ChangeSample, DEFAULT_PREVIEW_CHARS};
use crate::translation::shield::{self, ShieldMap, ShieldProfile, Shielded};

/// Result of translating one MJML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub document: String,
    /// Output differs from input
    pub changed: bool,
    /// Every change recorded, in document order
    pub samples: Vec<ChangeSample>,
    /// At least one lock marker was present
    pub locked_mode: bool,
    pub locked_pair_count: usize,
    pub ended_still_locked: bool,
}

/// How a fragment is sent to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentMode {
    /// HTML-capable: the backend's markup mode when it has one
    Rich,
    /// Fully shielded plain text
    Plain,
}

/// Lock-aware MJML translator.
///
/// Every backend call is awaited before the next one is issued. A failed call
/// leaves its fragment as it was; nothing here returns an error.
#[derive(Debug, Clone)]
pub struct MarkupTranslator {
    backend: Arc<dyn TranslationBackend>,
    options: TranslateOptions,
    prefer_markup_mode: bool,
    preview_chars: usize,
}

impl MarkupTranslator {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self {
            backend,
            options: TranslateOptions::default(),
            prefer_markup_mode: true,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    /// Create a translator from settings
    pub fn with_settings(
        backend: Arc<dyn TranslationBackend>,
        settings: &TranslationSettings,
        options: TranslateOptions,
    ) -> Self {
        Self {
            backend,
            options,
            prefer_markup_mode: settings.prefer_markup_mode,
            preview_chars: settings.preview_chars,
        }
    }

    pub fn backend(&self) -> &Arc<dyn TranslationBackend> {
        &self.backend
    }

    /// Translate a whole document, leaving locked regions and raw blocks alone
    pub async fn translate_document(&self, document: &str, target_language: &str) -> DocumentOutcome {
        let mut raw_blocks = ShieldMap::new();
        let shielded = markup::shield_raw_blocks(document, &mut raw_blocks);
        let split = locks::split(&shielded);
        let mut samples = Vec::new();

        let body = if !split.saw_any_marker {
            self.translate_fragment(&shielded, target_language, &mut samples)
                .await
        } else {
            let mut out = String::with_capacity(shielded.len());
            for segment in &split.segments {
                match segment {
                    Segment::Text { text, locked: false } => {
                        let translated = self
                            .translate_fragment(text, target_language, &mut samples)
                            .await;
                        out.push_str(&translated);
                    }
                    other => out.push_str(other.as_str()),
                }
            }
            out
        };

        let result = markup::restore_raw_blocks(&body, &raw_blocks);
        let changed = result != document;

        if split.ended_still_locked {
            warn!("Document ends inside a lock region; the rest of it was left untouched");
        }
        for sample in samples.iter().take(2) {
            debug!("Sample: \"{}\" -> \"{}\"", sample.from, sample.to);
        }
        info!(
            "Translated document to {}: changed={}, samples={}, locked_mode={}, locked_pairs={}",
            target_language,
            changed,
            samples.len(),
            split.saw_any_marker,
            split.pair_count
        );

        DocumentOutcome {
            document: result,
            changed,
            samples,
            locked_mode: split.saw_any_marker,
            locked_pair_count: split.pair_count,
            ended_still_locked: split.ended_still_locked,
        }
    }

    /// Translate a single plain-text field such as a subject line
    pub async fn translate_standalone_text(
        &self,
        text: &str,
        target_language: &str,
        samples: &mut Vec<ChangeSample>,
    ) -> String {
        self.translate_piece(text, target_language, FragmentMode::Plain, samples)
            .await
    }

    /// Core transform for one unlocked fragment
    pub async fn translate_fragment(
        &self,
        fragment: &str,
        target_language: &str,
        samples: &mut Vec<ChangeSample>,
    ) -> String {
        let mut raw_blocks = ShieldMap::new();
        let mut text = markup::shield_raw_blocks(fragment, &mut raw_blocks);

        for element in [BodyElement::Preview, BodyElement::Text] {
            let ranges = markup::body_ranges(&text, element);
            if ranges.is_empty() {
                continue;
            }
            debug!("Translating {} {} bodies", ranges.len(), element.tag_name());
            let mut replacements = Vec::with_capacity(ranges.len());
            for range in ranges {
                let body = &text[range.clone()];
                let translated = self
                    .translate_piece(body, target_language, FragmentMode::Rich, samples)
                    .await;
                replacements.push((range, translated));
            }
            text = splice(&text, replacements);
        }

        let buttons = markup::button_spans(&text);
        if !buttons.is_empty() {
            let mut replacements = Vec::with_capacity(buttons.len() * 2);
            for button in buttons {
                let attributes = &text[button.attributes.clone()];
                if let Some(found) = markup::attribute_value(attributes, TextAttribute::Title) {
                    let value_range = found.range;
                    let value = &attributes[value_range.clone()];
                    let translated = self
                        .translate_attribute(value, found.quote, target_language, samples)
                        .await;
                    let start = button.attributes.start;
                    replacements.push((start + value_range.start..start + value_range.end, translated));
                }
                let label = &text[button.label.clone()];
                let translated = self
                    .translate_piece(label, target_language, FragmentMode::Rich, samples)
                    .await;
                replacements.push((button.label, translated));
            }
            text = splice(&text, replacements);
        }

        let images = markup::image_attribute_ranges(&text);
        if !images.is_empty() {
            let mut replacements = Vec::with_capacity(images.len());
            for attributes_range in images {
                let attributes = &text[attributes_range.clone()];
                if let Some(found) = markup::attribute_value(attributes, TextAttribute::Alt) {
                    let value_range = found.range;
                    let value = &attributes[value_range.clone()];
                    let translated = self
                        .translate_attribute(value, found.quote, target_language, samples)
                        .await;
                    let start = attributes_range.start;
                    replacements.push((start + value_range.start..start + value_range.end, translated));
                }
            }
            text = splice(&text, replacements);
        }

        markup::restore_raw_blocks(&text, &raw_blocks)
    }

    /// Translate one body or field, keeping its surrounding whitespace
    async fn translate_piece(
        &self,
        original: &str,
        target_language: &str,
        mode: FragmentMode,
        samples: &mut Vec<ChangeSample>,
    ) -> String {
        let (lead, core, trail) = split_padding(original);
        if core.is_empty() {
            return original.to_string();
        }

        let markup_mode =
            mode == FragmentMode::Rich && self.prefer_markup_mode && self.backend.supports_markup_fragments();
        let profile = if markup_mode {
            ShieldProfile::Markup
        } else {
            ShieldProfile::Full
        };

        let shielded = shield::shield_with(core, profile);
        if !shielded.has_translatable_text() {
            return original.to_string();
        }

        let Some(translated_core) = self.send(&shielded, target_language, markup_mode).await else {
            return original.to_string();
        };

        let result = format!("{}{}{}", lead, translated_core, trail);
        if result != original {
            samples.push(ChangeSample::new(original, &result, self.preview_chars));
        }
        result
    }

    /// Send shielded text and undo the shielding, `None` on any failure
    async fn send(&self, shielded: &Shielded, target_language: &str, markup_mode: bool) -> Option<String> {
        let outcome = if markup_mode {
            self.backend
                .translate_markup_fragment(&shielded.text, target_language, &self.options)
                .await
        } else {
            self.backend
                .translate(&shielded.text, target_language, &self.options)
                .await
        };

        let translated = match outcome.into_result() {
            Ok(text) => text,
            Err(e) => {
                warn!("{} call failed, keeping original fragment: {}", self.backend.name(), e);
                return None;
            }
        };

        let missing = shielded.map.missing_keys(&translated);
        if !missing.is_empty() {
            warn!(
                "{} dropped {} placeholder(s) ({}), keeping original fragment",
                self.backend.name(),
                missing.len(),
                missing.join(", ")
            );
            return None;
        }

        Some(shielded.map.restore(&translated))
    }

    /// Translate an attribute value, never sending its tokens.
    ///
    /// Any failed part keeps the whole value unchanged.
    async fn translate_attribute(
        &self,
        value: &str,
        quote: char,
        target_language: &str,
        samples: &mut Vec<ChangeSample>,
    ) -> String {
        let mut rebuilt = String::with_capacity(value.len());

        for part in markup::split_attribute_tokens(value) {
            let text = match part {
                AttributePart::Token(token) => {
                    rebuilt.push_str(token);
                    continue;
                }
                AttributePart::Text(text) => text,
            };

            let decoded = decode_entities(text);
            let (lead, core, trail) = split_padding(&decoded);
            if !core.chars().any(char::is_alphabetic) {
                rebuilt.push_str(text);
                continue;
            }

            match self
                .backend
                .translate(core, target_language, &self.options)
                .await
                .into_result()
            {
                Ok(translated) if translated == core => rebuilt.push_str(text),
                Ok(translated) => {
                    rebuilt.push_str(&escape_attribute_quoted(lead, quote));
                    rebuilt.push_str(&escape_attribute_quoted(&translated, quote));
                    rebuilt.push_str(&escape_attribute_quoted(trail, quote));
                }
                Err(e) => {
                    warn!(
                        "{} call failed for an attribute, keeping original value: {}",
                        self.backend.name(),
                        e
                    );
                    return value.to_string();
                }
            }
        }

        if rebuilt != value {
            samples.push(ChangeSample::new(value, &rebuilt, self.preview_chars));
        }
        rebuilt
    }
}

/// Apply non-overlapping replacements to `text`
fn splice(text: &str, mut replacements: Vec<(Range<usize>, String)>) -> String {
    replacements.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (range, replacement) in replacements {
        out.push_str(&text[last..range.start]);
        out.push_str(&replacement);
        last = range.end;
    }
    out.push_str(&text[last..]);
    out
}
