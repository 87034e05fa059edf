//! Language utilities for DeepL target codes
//!
//! DeepL expects uppercase codes with an optional region or script suffix
//! (`PT-BR`, `ZH-HANS`); stored email languages are the same code in
//! lowercase.

use anyhow::{Result, anyhow};
use isolang::Language;

/// DeepL target languages offered to users, with display names
pub const DEEPL_TARGET_LANGUAGES: &[(&str, &str)] = &[
    ("AR", "Arabic"),
    ("BG", "Bulgarian"),
    ("CS", "Czech"),
    ("DA", "Danish"),
    ("DE", "German"),
    ("EL", "Greek"),
    ("EN", "English"),
    ("EN-GB", "English (UK)"),
    ("EN-US", "English (US)"),
    ("ES", "Spanish"),
    ("ES-419", "Spanish (Latin American)"),
    ("ET", "Estonian"),
    ("FI", "Finnish"),
    ("FR", "French"),
    ("HE", "Hebrew"),
    ("HU", "Hungarian"),
    ("ID", "Indonesian"),
    ("IT", "Italian"),
    ("JA", "Japanese"),
    ("KO", "Korean"),
    ("LT", "Lithuanian"),
    ("LV", "Latvian"),
    ("NB", "Norwegian (Bokmål)"),
    ("NL", "Dutch"),
    ("PL", "Polish"),
    ("PT", "Portuguese"),
    ("PT-BR", "Portuguese (Brazil)"),
    ("PT-PT", "Portuguese (Portugal)"),
    ("RO", "Romanian"),
    ("RU", "Russian"),
    ("SK", "Slovak"),
    ("SL", "Slovenian"),
    ("SV", "Swedish"),
    ("TH", "Thai"),
    ("TR", "Turkish"),
    ("UK", "Ukrainian"),
    ("VI", "Vietnamese"),
    ("ZH", "Chinese"),
    ("ZH-HANS", "Chinese (Simplified)"),
    ("ZH-HANT", "Chinese (Traditional)"),
];

/// Code as sent to the API: trimmed, `_` replaced by `-`, uppercase
pub fn to_api_code(code: &str) -> String {
    code.trim().replace('_', "-").to_uppercase()
}

/// Code as stored on an email: the API code in lowercase
pub fn to_iso_code(code: &str) -> String {
    to_api_code(code).to_lowercase()
}

/// Primary language subtag, lowercase (`pt` for `PT-BR`)
pub fn base_language(code: &str) -> String {
    to_iso_code(code)
        .split('-')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Whether DeepL lists `code` as a target language
pub fn is_supported_target(code: &str) -> bool {
    let api_code = to_api_code(code);
    DEEPL_TARGET_LANGUAGES.iter().any(|(c, _)| *c == api_code)
}

/// Check if two codes name the same base language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let base1 = base_language(code1);
    !base1.is_empty() && base1 == base_language(code2)
}

/// Get the display name of a code
///
/// Known DeepL targets use their listed name; other codes fall back to the
/// ISO 639 name of their base language.
pub fn get_language_name(code: &str) -> Result<String> {
    let api_code = to_api_code(code);
    if let Some((_, name)) = DEEPL_TARGET_LANGUAGES.iter().find(|(c, _)| *c == api_code) {
        return Ok(name.to_string());
    }

    let base = base_language(code);
    let lang = match base.len() {
        2 => Language::from_639_1(&base),
        3 => Language::from_639_3(&base),
        _ => None,
    };

    lang.map(|l| l.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}
