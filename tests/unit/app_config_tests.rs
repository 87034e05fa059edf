/*!
 * Tests for application configuration functionality
 */

use mjml_translate::app_config::{Config, LogLevel, PlanSelection};
use mjml_translate::settings::{DEEPL_INTEGRATION, SettingsProvider};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert!(config.enabled);
    assert!(!config.has_api_key());
    assert_eq!(config.deepl.plan, PlanSelection::Auto);
    assert_eq!(config.deepl.free_endpoint, "https://api-free.deepl.com/v2/translate");
    assert_eq!(config.deepl.pro_endpoint, "https://api.deepl.com/v2/translate");
    assert_eq!(config.deepl.timeout_secs, 20);
    assert_eq!(config.compiler.timeout_secs, 30);
    assert!(config.compiler.candidates.contains(&"/usr/local/bin/mjml".to_string()));
    assert_eq!(config.translation.sample_limit, 4);
    assert_eq!(config.translation.preview_chars, 80);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Missing sections fall back to their defaults
#[test]
fn test_config_emptyJson_shouldUseDefaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert!(config.enabled);
    assert_eq!(config.deepl.timeout_secs, 20);
    assert!(config.translation.prefer_markup_mode);
    assert!(config.store.database_path().is_none());
}

#[test]
fn test_config_partialJson_shouldOverrideOnlyGivenFields() {
    let json = r#"{
        "enabled": false,
        "deepl": { "api_key": "abc:fx", "plan": "pro" },
        "store": { "database_path": "/tmp/mails.db" },
        "log_level": "debug"
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert!(!config.enabled);
    assert_eq!(config.deepl.plan, PlanSelection::Pro);
    assert_eq!(config.api_key(DEEPL_INTEGRATION).as_deref(), Some("abc:fx"));
    assert_eq!(config.deepl.free_endpoint, "https://api-free.deepl.com/v2/translate");
    assert_eq!(
        config.store.database_path().unwrap().to_string_lossy(),
        "/tmp/mails.db"
    );
    assert_eq!(config.log_level, LogLevel::Debug);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.deepl.free_endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.deepl.free_endpoint = "ftp://api-free.deepl.com/v2/translate".to_string();
    assert!(config.validate().is_err());
    config.deepl.free_endpoint = "https://api-free.deepl.com/v2/translate".to_string();

    config.deepl.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.deepl.timeout_secs = 20;

    config.compiler.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.compiler.timeout_secs = 30;

    config.base_url = "mail.example.com".to_string();
    assert!(config.validate().is_err());
    config.base_url = "https://mail.example.com".to_string();

    assert!(config.validate().is_ok());
}

#[test]
fn test_config_saveAndLoad_shouldPreserveValues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.deepl.api_key = "key-123".to_string();
    config.deepl.formality = Some("more".to_string());
    config.base_url = "https://mail.example.com".to_string();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.deepl.api_key, "key-123");
    assert_eq!(loaded.deepl.formality.as_deref(), Some("more"));
    assert_eq!(loaded.base_url, "https://mail.example.com");
}

#[test]
fn test_config_loadMissingFile_shouldFail() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_planSelection_fromStr_shouldAcceptKnownValues() {
    assert_eq!(" Free ".parse::<PlanSelection>().unwrap(), PlanSelection::Free);
    assert_eq!("AUTO".parse::<PlanSelection>().unwrap(), PlanSelection::Auto);
    assert!("enterprise".parse::<PlanSelection>().is_err());
    assert_eq!(PlanSelection::Pro.to_string(), "pro");
}
