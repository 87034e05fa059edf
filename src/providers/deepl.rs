use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{DeepLConfig, PlanSelection};
use crate::errors::ProviderError;
use crate::providers::http::{HttpReply, HttpTransport, ReqwestTransport};
use crate::providers::{
    Diagnostics, PlanTier, TagHandling, TranslateOptions, TranslationBackend, TranslationResult,
};

/// Suffix that marks a Free plan key
const FREE_KEY_SUFFIX: &str = ":fx";

/// API credential; its `Debug` output never contains the key
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, `None` when blank
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    /// Plan implied by the key shape
    pub fn guess_plan(&self) -> PlanTier {
        if self.0.ends_with(FREE_KEY_SUFFIX) {
            PlanTier::Free
        } else {
            PlanTier::Pro
        }
    }

    fn authorization(&self) -> String {
        format!("DeepL-Auth-Key {}", self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(<redacted, {} chars>)", self.0.len())
    }
}

/// Successful DeepL response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    #[serde(default)]
    pub translations: Vec<DeepLTranslation>,
}

/// One translated text in a DeepL response
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    #[serde(default)]
    pub detected_source_language: Option<String>,
    pub text: Option<String>,
}

/// DeepL error body
#[derive(Debug, Deserialize)]
struct DeepLErrorBody {
    message: Option<String>,
}

/// DeepL client with plan guessing and a single host failover on 403
pub struct DeepL {
    /// Transport used for every request
    transport: Arc<dyn HttpTransport>,
    /// API credential
    api_key: Option<ApiKey>,
    /// Plan pinning from configuration
    plan: PlanSelection,
    /// Free plan endpoint
    free_endpoint: String,
    /// Pro plan endpoint
    pro_endpoint: String,
}

impl fmt::Debug for DeepL {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepL")
            .field("api_key", &self.api_key)
            .field("plan", &self.plan)
            .field("free_endpoint", &self.free_endpoint)
            .field("pro_endpoint", &self.pro_endpoint)
            .finish()
    }
}

impl DeepL {
    /// Create a client from configuration using the reqwest transport
    pub fn from_config(config: &DeepLConfig, api_key: Option<String>) -> Self {
        let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(config.timeout_secs)));
        Self::with_transport(config, api_key, transport)
    }

    /// Create a client with a custom transport
    pub fn with_transport(
        config: &DeepLConfig,
        api_key: Option<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.and_then(ApiKey::new),
            plan: config.plan,
            free_endpoint: config.free_endpoint.clone(),
            pro_endpoint: config.pro_endpoint.clone(),
        }
    }

    /// Whether a credential is configured
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Plan tier of the first request
    pub fn primary_plan(&self) -> Option<PlanTier> {
        match self.plan {
            PlanSelection::Free => Some(PlanTier::Free),
            PlanSelection::Pro => Some(PlanTier::Pro),
            PlanSelection::Auto => self.api_key.as_ref().map(ApiKey::guess_plan),
        }
    }

    fn endpoint_for(&self, plan: PlanTier) -> &str {
        match plan {
            PlanTier::Free => &self.free_endpoint,
            PlanTier::Pro => &self.pro_endpoint,
        }
    }

    /// Build the form body for one request
    pub fn build_form(
        text: &str,
        target_language: &str,
        tag_handling: TagHandling,
        options: &TranslateOptions,
    ) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("text", text.to_string()),
            ("target_lang", target_language.trim().to_uppercase()),
        ];
        if let Some(source) = options.source_language.as_deref().filter(|s| !s.trim().is_empty()) {
            form.push(("source_lang", source.trim().to_uppercase()));
        }
        if tag_handling == TagHandling::Html {
            form.push(("tag_handling", "html".to_string()));
        }
        if let Some(formality) = options.formality.as_deref().filter(|s| !s.trim().is_empty()) {
            form.push(("formality", formality.trim().to_string()));
        }
        form
    }

    /// Interpret a reply: translated text and detected language, or an error
    pub fn parse_reply(reply: &HttpReply) -> Result<(String, Option<String>), ProviderError> {
        if reply.status != 200 {
            let message = serde_json::from_str::<DeepLErrorBody>(&reply.body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("HTTP error {}", reply.status));
            return Err(ProviderError::from_status(reply.status, message));
        }

        let parsed: DeepLResponse = serde_json::from_str(&reply.body)
            .map_err(|_| ProviderError::ParseError("unexpected response shape".to_string()))?;

        let first = parsed
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("unexpected response shape".to_string()))?;

        match first.text {
            Some(text) => Ok((text, first.detected_source_language)),
            None => Err(ProviderError::ParseError("unexpected response shape".to_string())),
        }
    }

    /// Issue one request against the endpoint of `plan`
    async fn attempt(
        &self,
        key: &ApiKey,
        plan: PlanTier,
        form: &[(&'static str, String)],
        diagnostics: &mut Diagnostics,
    ) -> Result<(String, Option<String>), ProviderError> {
        let endpoint = self.endpoint_for(plan).to_string();
        diagnostics.attempts += 1;
        diagnostics.plan = Some(plan);
        diagnostics.endpoint = Some(endpoint.clone());
        diagnostics.status = None;

        let reply = match self.transport.post_form(&endpoint, &key.authorization(), form).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("DeepL transport error (plan={}): {}", plan, e);
                return Err(e);
            }
        };

        diagnostics.status = Some(reply.status);
        Self::parse_reply(&reply)
    }

    async fn request(
        &self,
        text: &str,
        target_language: &str,
        tag_handling: TagHandling,
        options: &TranslateOptions,
    ) -> TranslationResult {
        let mut diagnostics = Diagnostics::default();

        let Some(key) = self.api_key.as_ref() else {
            warn!("DeepL request skipped: no API key configured");
            return TranslationResult::failed(ProviderError::MissingCredential, diagnostics);
        };

        let primary = self.primary_plan().unwrap_or(PlanTier::Pro);
        debug!("DeepL plan guess: {} (selection={})", primary, self.plan);

        let form = Self::build_form(text, target_language, tag_handling, options);

        let mut outcome = self.attempt(key, primary, &form, &mut diagnostics).await;

        if diagnostics.status == Some(403) {
            let alternate = primary.alternate();
            info!(
                "DeepL answered 403 on the {} host, retrying once on the {} host",
                primary, alternate
            );
            outcome = self.attempt(key, alternate, &form, &mut diagnostics).await;
        }

        match outcome {
            Ok((translated, detected)) => {
                diagnostics.detected_source_language = detected;
                TranslationResult::translated(translated, diagnostics)
            }
            Err(e) => {
                warn!(
                    "DeepL request failed: {} (plan={:?}, status={:?}, attempts={})",
                    e, diagnostics.plan, diagnostics.status, diagnostics.attempts
                );
                TranslationResult::failed(e, diagnostics)
            }
        }
    }
}

#[async_trait]
impl TranslationBackend for DeepL {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        options: &TranslateOptions,
    ) -> TranslationResult {
        self.request(text, target_language, TagHandling::Plain, options).await
    }

    async fn translate_markup_fragment(
        &self,
        html_fragment: &str,
        target_language: &str,
        options: &TranslateOptions,
    ) -> TranslationResult {
        self.request(html_fragment, target_language, TagHandling::Html, options).await
    }

    fn name(&self) -> &str {
        "deepl"
    }
}
