/*!
 * Translation backend clients.
 *
 * This module contains the backend abstraction used by the markup pipeline
 * and its implementations:
 * - `deepl`: DeepL API client with plan/host failover
 * - `http`: HTTP transport seam used by the DeepL client
 * - `mock`: scripted backend for tests and dry runs
 */

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::{self, Debug};

use crate::errors::ProviderError;

/// How the backend should treat markup inside the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagHandling {
    /// Text is plain; every non-translatable span was shielded by the caller
    Plain,
    /// Text is an HTML fragment; the backend passes inline tags through
    Html,
}

/// Per-call translation options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Source language, detected by the backend when absent
    pub source_language: Option<String>,
    /// Formality hint forwarded as-is
    pub formality: Option<String>,
}

impl TranslateOptions {
    pub fn with_source_language(mut self, language: impl Into<String>) -> Self {
        self.source_language = Some(language.into());
        self
    }

    pub fn with_formality(mut self, formality: impl Into<String>) -> Self {
        self.formality = Some(formality.into());
        self
    }
}

/// Which plan tier a request was addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
}

impl PlanTier {
    /// The other tier, used for the one-time failover
    pub fn alternate(self) -> Self {
        match self {
            Self::Free => Self::Pro,
            Self::Pro => Self::Free,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

/// Call metadata kept for logs; never shown to end users
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Endpoint of the last attempt
    pub endpoint: Option<String>,
    /// Plan tier of the last attempt
    pub plan: Option<PlanTier>,
    /// HTTP status of the last attempt
    pub status: Option<u16>,
    /// Number of HTTP requests issued (0, 1 or 2)
    pub attempts: u32,
    /// Source language reported by the backend
    pub detected_source_language: Option<String>,
}

/// Outcome of one backend call
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationResult {
    Translated {
        text: String,
        diagnostics: Diagnostics,
    },
    Failed {
        error: ProviderError,
        diagnostics: Diagnostics,
    },
}

impl TranslationResult {
    pub fn translated(text: impl Into<String>, diagnostics: Diagnostics) -> Self {
        Self::Translated {
            text: text.into(),
            diagnostics,
        }
    }

    pub fn failed(error: ProviderError, diagnostics: Diagnostics) -> Self {
        Self::Failed { error, diagnostics }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Translated { .. })
    }

    /// Translated text, if the call succeeded
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Translated { text, .. } => Some(text),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ProviderError> {
        match self {
            Self::Translated { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            Self::Translated { diagnostics, .. } | Self::Failed { diagnostics, .. } => diagnostics,
        }
    }

    /// Convert into a plain `Result`, dropping diagnostics
    pub fn into_result(self) -> Result<String, ProviderError> {
        match self {
            Self::Translated { text, .. } => Ok(text),
            Self::Failed { error, .. } => Err(error),
        }
    }
}

/// Common trait for machine-translation backends
///
/// Implementations never return `Err`: every outcome, including a missing
/// credential, is a `TranslationResult`.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Translate plain text into the target language
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        options: &TranslateOptions,
    ) -> TranslationResult;

    /// Translate an HTML fragment, letting the backend keep inline tags
    async fn translate_markup_fragment(
        &self,
        html_fragment: &str,
        target_language: &str,
        options: &TranslateOptions,
    ) -> TranslationResult;

    /// Whether `translate_markup_fragment` is backed by a real HTML mode
    fn supports_markup_fragments(&self) -> bool {
        true
    }

    /// Short name used in logs
    fn name(&self) -> &str;
}

pub mod deepl;
pub mod http;
pub mod mock;
