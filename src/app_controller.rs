use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::app_config::{Config, TranslationSettings};
use crate::compiler::MjmlCompiler;
use crate::database::Repository;
use crate::errors::{JobFailure, ProviderError};
use crate::language_utils;
use crate::providers::deepl::DeepL;
use crate::providers::{TranslateOptions, TranslationBackend, TranslationResult};
use crate::report::{
    COMPILED_HTML_NOTE, CloneSummary, CloneUrls, DONE_MESSAGE, JobReport, SourceSummary,
    TranslationSummary,
};
use crate::settings::{DEEPL_INTEGRATION, FeatureGate, SettingsProvider};
use crate::store::{DocumentStore, EmailStore};
use crate::translation::MarkupTranslator;

// @module: Translation job controller

/// Text used by `test_api`
const TEST_API_TEXT: &str = "Hello";
/// Target language used by `test_api`
const TEST_API_TARGET: &str = "DE";

/// Runs clone-and-translate jobs for stored emails
pub struct Controller {
    gate: FeatureGate,
    translator: MarkupTranslator,
    compiler: MjmlCompiler,
    documents: Arc<dyn DocumentStore>,
    emails: Arc<dyn EmailStore>,
    settings: TranslationSettings,
}

impl Controller {
    /// Create a controller with the default compiler and settings
    pub fn new(
        gate: FeatureGate,
        backend: Arc<dyn TranslationBackend>,
        documents: Arc<dyn DocumentStore>,
        emails: Arc<dyn EmailStore>,
    ) -> Self {
        Self {
            gate,
            translator: MarkupTranslator::new(backend),
            compiler: MjmlCompiler::default(),
            documents,
            emails,
            settings: TranslationSettings::default(),
        }
    }

    /// Wire a controller from configuration: DeepL backend, SQLite stores
    pub fn from_config(config: &Config, repository: Repository) -> Self {
        let backend: Arc<dyn TranslationBackend> =
            Arc::new(DeepL::from_config(&config.deepl, config.api_key(DEEPL_INTEGRATION)));
        let repository = Arc::new(repository);
        let mut options = TranslateOptions::default();
        if let Some(formality) = config.deepl.formality.as_deref() {
            options = options.with_formality(formality);
        }

        Self::new(
            FeatureGate::from_settings(config),
            backend,
            repository.clone(),
            repository,
        )
        .with_compiler(MjmlCompiler::from_config(&config.compiler))
        .with_settings(config.translation.clone(), options)
    }

    pub fn with_compiler(mut self, compiler: MjmlCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_settings(mut self, settings: TranslationSettings, options: TranslateOptions) -> Self {
        self.translator =
            MarkupTranslator::with_settings(self.translator.backend().clone(), &settings, options);
        self.settings = settings;
        self
    }

    pub fn translator(&self) -> &MarkupTranslator {
        &self.translator
    }

    pub fn compiler(&self) -> &MjmlCompiler {
        &self.compiler
    }

    /// Clone an email, translate the clone's subject and MJML, compile it
    pub async fn translate_email(
        &self,
        source_id: i64,
        target_language: &str,
        base_url: &str,
    ) -> Result<JobReport, JobFailure> {
        let job = Uuid::new_v4();
        info!("[job {}] translate email {} to {:?}", job, source_id, target_language);

        if !self.gate.is_enabled() {
            warn!("[job {}] translations are disabled", job);
            return Err(JobFailure::FeatureDisabled);
        }

        let source = match self.emails.get_email(source_id).await {
            Ok(Some(email)) => email,
            Ok(None) => {
                warn!("[job {}] email {} not found", job, source_id);
                return Err(JobFailure::NotFound);
            }
            Err(e) => {
                error!("[job {}] failed to load email {}: {:#}", job, source_id, e);
                return Err(JobFailure::NotFound);
            }
        };

        let api_code = language_utils::to_api_code(target_language);
        if api_code.is_empty() {
            return Err(JobFailure::MissingTargetLanguage);
        }
        let iso_code = language_utils::to_iso_code(&api_code);
        if !language_utils::is_supported_target(&api_code) {
            warn!("[job {}] {} is not a listed DeepL target, sending it anyway", job, api_code);
        }

        self.probe(job, &api_code).await?;

        let mjml = match self.documents.fetch_document(source_id).await {
            Ok(document) => document.filter(|d| !d.trim().is_empty()),
            Err(e) => {
                error!("[job {}] failed to fetch MJML of email {}: {:#}", job, source_id, e);
                None
            }
        };

        let mut clone = source.translated_clone(&api_code);
        let clone_id = match self.emails.save_email(&clone).await {
            Ok(id) => id,
            Err(e) => {
                error!("[job {}] clone of email {} failed: {:#}", job, source_id, e);
                return Err(JobFailure::CloneFailed);
            }
        };
        clone.id = Some(clone_id);
        info!("[job {}] created clone {} ({})", job, clone_id, clone.name);

        let mut mjml_write = false;
        if let Some(document) = &mjml {
            match self.documents.upsert_document(clone_id, document).await {
                Ok(()) => mjml_write = true,
                Err(e) => error!("[job {}] initial MJML write for clone {} failed: {:#}", job, clone_id, e),
            }
        }

        let mut samples = Vec::new();
        let mut subject_changed = false;
        if !clone.subject.trim().is_empty() {
            let translated = self
                .translator
                .translate_standalone_text(&clone.subject, &api_code, &mut samples)
                .await;
            if translated != clone.subject {
                clone.subject = translated;
                subject_changed = true;
            }
        }

        let mut mjml_changed = false;
        let mut locked_mode = false;
        let mut locked_pairs = 0;
        if let Some(document) = &mjml {
            let outcome = self.translator.translate_document(document, &api_code).await;
            mjml_changed = outcome.changed;
            locked_mode = outcome.locked_mode;
            locked_pairs = outcome.locked_pair_count;
            samples.extend(outcome.samples);

            if let Err(e) = self.documents.upsert_document(clone_id, &outcome.document).await {
                error!("[job {}] writing translated MJML for clone {} failed: {:#}", job, clone_id, e);
            }

            let compiled = self
                .compiler
                .compile(&outcome.document, clone.template.as_deref())
                .await;
            match compiled.html.filter(|h| compiled.success && !h.trim().is_empty()) {
                Some(html) => clone.custom_html = Some(html),
                None => warn!(
                    "[job {}] MJML compile failed, keeping existing HTML: {}",
                    job,
                    compiled.error.as_deref().unwrap_or("unknown")
                ),
            }
        }

        clone.touch();
        if let Err(e) = self.emails.save_email(&clone).await {
            error!("[job {}] saving clone {} failed: {:#}", job, clone_id, e);
        }

        samples.truncate(self.settings.sample_limit);
        info!(
            "[job {}] finished: clone={}, subject_changed={}, mjml_changed={}, locked_mode={}, locked_pairs={}",
            job, clone_id, subject_changed, mjml_changed, locked_mode, locked_pairs
        );

        Ok(JobReport {
            success: true,
            message: DONE_MESSAGE.to_string(),
            source: Some(SourceSummary {
                email_id: source_id,
                name: source.name.clone(),
                language: source.language.to_lowercase(),
                template: source.template.clone(),
            }),
            clone: Some(CloneSummary {
                email_id: clone_id,
                name: clone.name.clone(),
                subject: clone.subject.clone(),
                template: clone.template.clone(),
                language: iso_code,
                mjml_write,
                urls: CloneUrls::new(base_url, clone_id),
            }),
            translation: Some(TranslationSummary {
                subject_changed,
                mjml_changed,
                samples,
                locked_mode,
                locked_pairs,
            }),
            note: Some(COMPILED_HTML_NOTE.to_string()),
        })
    }

    /// Check the backend before any write happens
    async fn probe(&self, job: Uuid, api_code: &str) -> Result<(), JobFailure> {
        let result = self
            .translator
            .backend()
            .translate(&self.settings.probe_text, api_code, &TranslateOptions::default())
            .await;

        match result {
            TranslationResult::Translated { diagnostics, .. } => {
                debug!(
                    "[job {}] probe ok (plan={:?}, attempts={}, detected={:?})",
                    job, diagnostics.plan, diagnostics.attempts, diagnostics.detected_source_language
                );
                Ok(())
            }
            TranslationResult::Failed { error, diagnostics } => {
                error!(
                    "[job {}] probe failed: {} (plan={:?}, status={:?}, attempts={})",
                    job, error, diagnostics.plan, diagnostics.status, diagnostics.attempts
                );
                Err(match error {
                    ProviderError::MissingCredential => JobFailure::NotConfigured,
                    _ => JobFailure::ProbeFailed,
                })
            }
        }
    }

    /// Translate a fixed phrase and describe the outcome
    pub async fn test_api(&self) -> String {
        let result = self
            .translator
            .backend()
            .translate(TEST_API_TEXT, TEST_API_TARGET, &TranslateOptions::default())
            .await;

        match result.into_result() {
            Ok(text) => format!("Success! \"{}\" → \"{}\"", TEST_API_TEXT, text),
            Err(e) => format!("Error: {}", e),
        }
    }
}
