/*!
 * Settings access and the feature gate.
 *
 * The job layer never reaches into ambient configuration: it receives a
 * `SettingsProvider` (normally the loaded `Config`) and reads the credential
 * and the enabled flag from it once, at construction time.
 */

use crate::app_config::Config;

/// Integration name under which the DeepL credential is stored
pub const DEEPL_INTEGRATION: &str = "deepl";

/// Source of credentials and the add-on switch
pub trait SettingsProvider: Send + Sync {
    /// Credential for the named integration, `None` when unset or blank
    fn api_key(&self, integration: &str) -> Option<String>;

    /// Whether the add-on is switched on
    fn is_feature_enabled(&self) -> bool;
}

impl SettingsProvider for Config {
    fn api_key(&self, integration: &str) -> Option<String> {
        match integration {
            DEEPL_INTEGRATION => Some(self.deepl.api_key.trim())
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            _ => None,
        }
    }

    fn is_feature_enabled(&self) -> bool {
        self.enabled
    }
}

/// Snapshot of the enabled flag taken when the controller is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureGate {
    enabled: bool,
}

impl FeatureGate {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn from_settings(settings: &dyn SettingsProvider) -> Self {
        Self::new(settings.is_feature_enabled())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
