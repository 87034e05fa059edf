/*!
 * End-to-end document translation through the DeepL client and the compiler
 */

use std::sync::Arc;

use mjml_translate::compiler::MjmlCompiler;
use mjml_translate::translation::locks::{LOCK_END, LOCK_START};
use mjml_translate::translation::{ChangeSample, MarkupTranslator};

use crate::common::{HELLO_MJML, ScriptedTransport, deepl_client, init_logging, ok_reply};

#[tokio::test]
async fn test_helloDocument_deepl_shouldTranslateAndCompile() {
    init_logging();
    let transport = ScriptedTransport::new([ok_reply("Hallo")]);
    let translator = MarkupTranslator::new(Arc::new(deepl_client(Some("key:fx"), transport.clone())));

    let outcome = translator.translate_document(HELLO_MJML, "DE").await;

    assert!(outcome.changed);
    assert!(outcome.document.contains("<mj-text>Hallo</mj-text>"));
    assert!(!outcome.locked_mode);
    assert_eq!(outcome.samples, vec![ChangeSample::new("Hello", "Hallo", 80)]);
    assert_eq!(
        serde_json::to_value(&outcome.samples[0]).unwrap(),
        serde_json::json!({"from": "Hello", "to": "Hallo"})
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].field("text"), Some("Hello"));
    assert_eq!(requests[0].field("tag_handling"), Some("html"));

    let compiled = MjmlCompiler::fallback_only()
        .compile(&outcome.document, None)
        .await;
    assert!(compiled.html.unwrap().contains("<p>Hallo</p>"));
}

#[tokio::test]
async fn test_lockedDocument_deepl_shouldOnlySendUnlockedText() {
    let transport = ScriptedTransport::new([ok_reply("Hallo")]);
    let translator = MarkupTranslator::new(Arc::new(deepl_client(Some("key:fx"), transport.clone())));
    let document = format!(
        "<mjml><mj-body>{}<mj-text>Imprint</mj-text>{}<mj-text>Hello</mj-text></mj-body></mjml>",
        LOCK_START, LOCK_END
    );

    let outcome = translator.translate_document(&document, "DE").await;

    assert_eq!(
        outcome.document,
        format!(
            "<mjml><mj-body>{}<mj-text>Imprint</mj-text>{}<mj-text>Hallo</mj-text></mj-body></mjml>",
            LOCK_START, LOCK_END
        )
    );
    assert!(outcome.locked_mode);
    assert_eq!(outcome.locked_pair_count, 1);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_document_deeplRejectsKey_shouldKeepDocument() {
    let transport = ScriptedTransport::new([
        crate::common::error_reply(403, "Forbidden"),
        crate::common::error_reply(403, "Forbidden"),
    ]);
    let translator = MarkupTranslator::new(Arc::new(deepl_client(Some("key"), transport.clone())));

    let outcome = translator.translate_document(HELLO_MJML, "DE").await;

    assert_eq!(outcome.document, HELLO_MJML);
    assert!(!outcome.changed);
    assert_eq!(transport.requests().len(), 2);
}
