/*!
 * Integration tests for the clone-and-translate job lifecycle
 */

use anyhow::Result;
use std::sync::Arc;

use mjml_translate::app_config::Config;
use mjml_translate::app_controller::Controller;
use mjml_translate::compiler::MjmlCompiler;
use mjml_translate::database::models::EMPTY_HTML_SHELL;
use mjml_translate::database::{EmailRecord, Repository};
use mjml_translate::errors::{JobFailure, ProviderError};
use mjml_translate::providers::mock::MockBackend;
use mjml_translate::settings::FeatureGate;
use mjml_translate::translation::ChangeSample;
use mjml_translate::translation::locks::{LOCK_END, LOCK_START};

use crate::common::{HELLO_MJML, init_logging, seeded_repository};

const BASE_URL: &str = "https://mail.example.com";

fn controller(repository: &Repository, backend: Arc<MockBackend>, enabled: bool) -> Controller {
    let store = Arc::new(repository.clone());
    Controller::new(FeatureGate::new(enabled), backend, store.clone(), store)
        .with_compiler(MjmlCompiler::fallback_only())
}

fn welcome_email() -> EmailRecord {
    EmailRecord::new("Welcome", "Hello").with_template("blank")
}

#[tokio::test]
async fn test_translateEmail_helloDocument_shouldCloneTranslateAndCompile() -> Result<()> {
    init_logging();
    let (repository, source_id) = seeded_repository(welcome_email(), Some(HELLO_MJML)).await?;
    let backend = Arc::new(MockBackend::dictionary([("Hello", "Hallo")]));
    let controller = controller(&repository, backend.clone(), true);

    let report = controller.translate_email(source_id, "de", BASE_URL).await?;

    assert!(report.success);
    assert_eq!(report.message, "Done.");

    let source = report.source.as_ref().expect("source summary");
    assert_eq!(source.email_id, source_id);
    assert_eq!(source.language, "en");

    let clone = report.clone.as_ref().expect("clone summary");
    assert_ne!(clone.email_id, source_id);
    assert_eq!(clone.name, "Welcome [DE]");
    assert_eq!(clone.subject, "Hallo");
    assert_eq!(clone.template.as_deref(), Some("blank"));
    assert_eq!(clone.language, "de");
    assert!(clone.mjml_write);
    assert_eq!(
        clone.urls.edit,
        format!("{}/s/emails/edit/{}", BASE_URL, clone.email_id)
    );
    assert_eq!(
        clone.urls.preview,
        format!("{}/email/preview/{}", BASE_URL, clone.email_id)
    );

    let translation = report.translation.as_ref().expect("translation summary");
    assert!(translation.subject_changed);
    assert!(translation.mjml_changed);
    assert!(!translation.locked_mode);
    assert_eq!(translation.locked_pairs, 0);
    assert_eq!(
        translation.samples,
        vec![
            ChangeSample::new("Hello", "Hallo", 80),
            ChangeSample::new("Hello", "Hallo", 80)
        ]
    );

    let stored = repository.find_email(clone.email_id).await?.expect("clone stored");
    assert!(!stored.is_published);
    assert_eq!(stored.language, "de");
    assert!(stored.custom_html.unwrap_or_default().contains("<p>Hallo</p>"));

    let clone_mjml = repository.find_document(clone.email_id).await?.expect("clone MJML");
    assert!(clone_mjml.contains("<mj-text>Hallo</mj-text>"));
    assert_eq!(repository.find_document(source_id).await?.as_deref(), Some(HELLO_MJML));
    Ok(())
}

#[tokio::test]
async fn test_translateEmail_report_shouldSerializeCamelCase() -> Result<()> {
    let (repository, source_id) = seeded_repository(welcome_email(), Some(HELLO_MJML)).await?;
    let backend = Arc::new(MockBackend::dictionary([("Hello", "Hallo")]));

    let report = controller(&repository, backend, true)
        .translate_email(source_id, "DE", BASE_URL)
        .await?;
    let json = serde_json::to_value(&report)?;

    assert_eq!(json["success"], true);
    assert_eq!(json["source"]["emailId"], source_id);
    assert_eq!(json["clone"]["mjmlWrite"], true);
    assert!(json["clone"]["urls"]["builder"].as_str().unwrap().contains("/s/emails/builder/"));
    assert_eq!(json["translation"]["subjectChanged"], true);
    assert_eq!(json["translation"]["lockedMode"], false);
    assert_eq!(json["translation"]["samples"][0]["from"], "Hello");
    assert!(json["note"].as_str().unwrap().contains("custom_html"));
    Ok(())
}

#[tokio::test]
async fn test_translateEmail_disabledFeature_shouldFailBeforeAnyCall() -> Result<()> {
    let (repository, source_id) = seeded_repository(welcome_email(), Some(HELLO_MJML)).await?;
    let backend = Arc::new(MockBackend::echo());

    let result = controller(&repository, backend.clone(), false)
        .translate_email(source_id, "DE", BASE_URL)
        .await;

    assert_eq!(result.unwrap_err(), JobFailure::FeatureDisabled);
    assert_eq!(backend.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translateEmail_unknownEmail_shouldBeNotFound() -> Result<()> {
    let (repository, _) = seeded_repository(welcome_email(), None).await?;
    let backend = Arc::new(MockBackend::echo());

    let result = controller(&repository, backend.clone(), true)
        .translate_email(999, "DE", BASE_URL)
        .await;

    assert_eq!(result.unwrap_err(), JobFailure::NotFound);
    assert_eq!(backend.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translateEmail_blankTarget_shouldRequireLanguage() -> Result<()> {
    let (repository, source_id) = seeded_repository(welcome_email(), None).await?;
    let backend = Arc::new(MockBackend::echo());

    let result = controller(&repository, backend.clone(), true)
        .translate_email(source_id, "   ", BASE_URL)
        .await;

    assert_eq!(result.unwrap_err(), JobFailure::MissingTargetLanguage);
    assert_eq!(backend.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translateEmail_missingCredential_shouldBeNotConfiguredWithoutClone() -> Result<()> {
    let (repository, source_id) = seeded_repository(welcome_email(), Some(HELLO_MJML)).await?;
    let backend = Arc::new(MockBackend::failing_with(ProviderError::MissingCredential));

    let result = controller(&repository, backend, true)
        .translate_email(source_id, "DE", BASE_URL)
        .await;

    assert_eq!(result.unwrap_err(), JobFailure::NotConfigured);
    let stats = repository.connection().stats()?;
    assert_eq!(stats.email_count, 1);
    assert_eq!(stats.document_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_translateEmail_probeRejected_shouldBeProbeFailed() -> Result<()> {
    let (repository, source_id) = seeded_repository(welcome_email(), Some(HELLO_MJML)).await?;
    let backend = Arc::new(MockBackend::failing_with(ProviderError::AuthenticationError(
        "Forbidden".to_string(),
    )));

    let result = controller(&repository, backend.clone(), true)
        .translate_email(source_id, "DE", BASE_URL)
        .await;

    let failure = result.unwrap_err();
    assert_eq!(failure, JobFailure::ProbeFailed);
    assert_eq!(failure.http_status(), 400);
    assert_eq!(backend.call_count(), 1);
    assert_eq!(repository.connection().stats()?.email_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_translateEmail_manyChanges_shouldCapSamplesAtFour() -> Result<()> {
    let texts: String = (1..=6)
        .map(|i| format!("<mj-text>Paragraph {}</mj-text>", i))
        .collect();
    let mjml = format!("<mjml><mj-body>{}</mj-body></mjml>", texts);
    let (repository, source_id) = seeded_repository(welcome_email(), Some(&mjml)).await?;
    let backend = Arc::new(MockBackend::prefixing());

    let report = controller(&repository, backend, true)
        .translate_email(source_id, "FR", BASE_URL)
        .await?;

    let translation = report.translation.expect("translation summary");
    assert_eq!(translation.samples.len(), 4);
    assert_eq!(translation.samples[0].from, "Hello");
    assert_eq!(translation.samples[0].to, "[FR] Hello");
    assert_eq!(translation.samples[1].from, "Paragraph 1");
    Ok(())
}

#[tokio::test]
async fn test_translateEmail_noStoredMjml_shouldStillCloneSubject() -> Result<()> {
    let (repository, source_id) = seeded_repository(welcome_email(), None).await?;
    let backend = Arc::new(MockBackend::dictionary([("Hello", "Bonjour")]));

    let report = controller(&repository, backend, true)
        .translate_email(source_id, "fr", BASE_URL)
        .await?;

    let clone = report.clone.expect("clone summary");
    assert!(!clone.mjml_write);
    assert_eq!(clone.subject, "Bonjour");
    let translation = report.translation.expect("translation summary");
    assert!(!translation.mjml_changed);

    let stored = repository.find_email(clone.email_id).await?.expect("clone stored");
    assert_eq!(stored.custom_html.as_deref(), Some(EMPTY_HTML_SHELL));
    assert!(repository.find_document(clone.email_id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_translateEmail_lockedDocument_shouldReportLockedMode() -> Result<()> {
    let mjml = format!(
        "<mjml><mj-body>{}<mj-text>Hello</mj-text>{}<mj-text>Hello</mj-text></mj-body></mjml>",
        LOCK_START, LOCK_END
    );
    let (repository, source_id) = seeded_repository(welcome_email(), Some(&mjml)).await?;
    let backend = Arc::new(MockBackend::dictionary([("Hello", "Hallo")]));

    let report = controller(&repository, backend, true)
        .translate_email(source_id, "DE", BASE_URL)
        .await?;

    let translation = report.translation.expect("translation summary");
    assert!(translation.locked_mode);
    assert_eq!(translation.locked_pairs, 1);

    let clone_id = report.clone.expect("clone summary").email_id;
    let clone_mjml = repository.find_document(clone_id).await?.expect("clone MJML");
    assert_eq!(
        clone_mjml,
        format!(
            "<mjml><mj-body>{}<mj-text>Hello</mj-text>{}<mj-text>Hallo</mj-text></mj-body></mjml>",
            LOCK_START, LOCK_END
        )
    );
    Ok(())
}

/// Wiring from configuration: a blank key never reaches the network
#[test]
fn test_controllerFromConfig_blankKey_shouldBeNotConfigured() -> Result<()> {
    let result = tokio_test::block_on(async {
        let (repository, source_id) = seeded_repository(welcome_email(), Some(HELLO_MJML)).await?;
        let mut config = Config::default();
        config.compiler.fallback_only = true;

        let controller = Controller::from_config(&config, repository);
        anyhow::Ok(controller.translate_email(source_id, "DE", BASE_URL).await)
    })?;

    assert_eq!(result.unwrap_err(), JobFailure::NotConfigured);
    Ok(())
}

#[test]
fn test_controllerFromConfig_disabled_shouldBeFeatureDisabled() -> Result<()> {
    let result = tokio_test::block_on(async {
        let (repository, source_id) = seeded_repository(welcome_email(), Some(HELLO_MJML)).await?;
        let mut config = Config::default();
        config.enabled = false;
        config.deepl.api_key = "unused:fx".to_string();

        let controller = Controller::from_config(&config, repository);
        anyhow::Ok(controller.translate_email(source_id, "DE", BASE_URL).await)
    })?;

    assert_eq!(result.unwrap_err(), JobFailure::FeatureDisabled);
    Ok(())
}

#[tokio::test]
async fn test_testApi_shouldDescribeOutcome() -> Result<()> {
    let repository = Repository::new_in_memory()?;

    let ok = controller(&repository, Arc::new(MockBackend::dictionary([("Hello", "Hallo")])), true);
    assert_eq!(ok.test_api().await, "Success! \"Hello\" → \"Hallo\"");

    let failing = controller(&repository, Arc::new(MockBackend::failing()), true);
    assert!(failing.test_api().await.starts_with("Error: "));
    Ok(())
}
