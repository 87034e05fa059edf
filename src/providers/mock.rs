/*!
 * Mock backend implementations for testing.
 *
 * This module provides a scripted backend that simulates different behaviors:
 * - `MockBackend::echo()` - Returns the request text unchanged
 * - `MockBackend::prefixing()` - Prefixes every request with `[TARGET] `
 * - `MockBackend::dictionary()` - Looks up whole texts in a table
 * - `MockBackend::failing()` - Always fails with an error
 * - `MockBackend::intermittent()` - Fails every Nth request
 *
 * Every call is recorded so tests can assert exactly what reached the
 * backend.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{
    Diagnostics, TagHandling, TranslateOptions, TranslationBackend, TranslationResult,
};

/// A request as seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// The text sent for translation
    pub text: String,
    /// Target language as passed by the caller
    pub target_language: String,
    /// Whether the markup mode was used
    pub tag_handling: TagHandling,
}

/// Behavior mode for the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Return the text unchanged
    Echo,
    /// Prefix the text with `[<TARGET>] `
    Prefixing,
    /// Replace whole texts found in the table, echo the rest
    Dictionary(HashMap<String, String>),
    /// Always return this exact text
    Constant(String),
    /// Always fail with a copy of this error
    Failing(ProviderError),
    /// Fail every Nth request (1-based), echo the others
    Intermittent { fail_every: usize },
}

/// Mock backend for testing translation behavior
#[derive(Debug)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Whether the markup mode is offered to callers
    markup_mode: bool,
    /// Request counter for intermittent failures
    request_count: AtomicUsize,
    /// Recorded calls
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            markup_mode: true,
            request_count: AtomicUsize::new(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn prefixing() -> Self {
        Self::new(MockBehavior::Prefixing)
    }

    /// Create a dictionary-backed mock from `(source, translation)` pairs
    pub fn dictionary<I, S, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let table = entries
            .into_iter()
            .map(|(s, t)| (s.into(), t.into()))
            .collect();
        Self::new(MockBehavior::Dictionary(table))
    }

    pub fn constant(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Constant(text.into()))
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing(ProviderError::RequestFailed(
            "mock backend unavailable".to_string(),
        )))
    }

    pub fn failing_with(error: ProviderError) -> Self {
        Self::new(MockBehavior::Failing(error))
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Turn the markup mode off so callers fall back to full shielding
    pub fn without_markup_mode(mut self) -> Self {
        self.markup_mode = false;
        self
    }

    /// Snapshot of all recorded calls
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Texts of all recorded calls, in order
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.text.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn respond(&self, text: &str, target_language: &str, tag_handling: TagHandling) -> TranslationResult {
        self.calls.lock().push(MockCall {
            text: text.to_string(),
            target_language: target_language.to_string(),
            tag_handling,
        });
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;

        let diagnostics = Diagnostics {
            endpoint: Some("mock://backend".to_string()),
            status: Some(200),
            attempts: 1,
            ..Default::default()
        };

        match &self.behavior {
            MockBehavior::Echo => TranslationResult::translated(text, diagnostics),
            MockBehavior::Prefixing => TranslationResult::translated(
                format!("[{}] {}", target_language.trim().to_uppercase(), text),
                diagnostics,
            ),
            MockBehavior::Dictionary(table) => {
                let translated = table.get(text).cloned().unwrap_or_else(|| text.to_string());
                TranslationResult::translated(translated, diagnostics)
            }
            MockBehavior::Constant(constant) => TranslationResult::translated(constant.clone(), diagnostics),
            MockBehavior::Failing(error) => TranslationResult::failed(
                error.clone(),
                Diagnostics {
                    status: error.status_code(),
                    ..diagnostics
                },
            ),
            MockBehavior::Intermittent { fail_every } => {
                if *fail_every > 0 && count % fail_every == 0 {
                    TranslationResult::failed(
                        ProviderError::RequestFailed(format!("intermittent failure #{}", count)),
                        diagnostics,
                    )
                } else {
                    TranslationResult::translated(text, diagnostics)
                }
            }
        }
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        _options: &TranslateOptions,
    ) -> TranslationResult {
        self.respond(text, target_language, TagHandling::Plain)
    }

    async fn translate_markup_fragment(
        &self,
        html_fragment: &str,
        target_language: &str,
        _options: &TranslateOptions,
    ) -> TranslationResult {
        self.respond(html_fragment, target_language, TagHandling::Html)
    }

    fn supports_markup_fragments(&self) -> bool {
        self.markup_mode
    }

    fn name(&self) -> &str {
        "mock"
    }
}
