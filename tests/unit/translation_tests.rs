/*!
 * Tests for shielding, lock splitting and the markup translator
 */

use std::sync::Arc;

use mjml_translate::providers::TagHandling;
use mjml_translate::providers::mock::MockBackend;
use mjml_translate::translation::MarkupTranslator;
use mjml_translate::translation::locks::{self, LOCK_END, LOCK_START, Segment};
use mjml_translate::translation::shield::{self, ShieldProfile};

use crate::common::{NEWSLETTER_MJML, init_logging};

fn translator(backend: MockBackend) -> (MarkupTranslator, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    (MarkupTranslator::new(backend.clone()), backend)
}

#[test]
fn test_shield_thenUnshield_shouldReturnInput() {
    let inputs = [
        "Plain sentence without anything special.",
        "<p class=\"x\">Hi <b>{{ user.name }}</b></p><!-- note -->",
        "{% for item in items %}<li>{item_title}</li>{% endfor %}",
        "Literal __TOK_3__ and __MJRAW_0__ next to <i>tags</i>",
    ];
    for input in inputs {
        for profile in [ShieldProfile::Full, ShieldProfile::Markup] {
            let shielded = shield::shield_with(input, profile);
            assert_eq!(shield::unshield(&shielded.text, &shielded.map), input);
        }
    }
}

#[test]
fn test_shield_fullProfile_shouldHideEveryNonTextSpan() {
    let shielded = shield::shield("<a href=\"{unsubscribe_url}\">Leave</a> {{ footer }}");
    assert!(!shielded.text.contains('<'));
    assert!(!shielded.text.contains('{'));
    assert!(shielded.text.contains("Leave"));
    assert!(shielded.has_translatable_text());
}

#[test]
fn test_split_anyDocument_shouldReassembleToInput() {
    let documents = [
        String::new(),
        "<mj-text>Hello</mj-text>".to_string(),
        format!("a{}b{}c", LOCK_START, LOCK_END),
        format!("{}{}x{}", LOCK_END, LOCK_START, LOCK_START),
        "<!--NOTRANSLATE : START-->kept<!--   notranslate:end   -->".to_string(),
    ];
    for document in &documents {
        assert_eq!(&locks::split(document).reassemble(), document);
    }
}

#[test]
fn test_split_twoPairs_shouldCountBothAndLockInnerText() {
    let document = format!("a{s}b{e}c{s}d{e}", s = LOCK_START, e = LOCK_END);
    let split = locks::split(&document);

    assert_eq!(split.pair_count, 2);
    assert!(split.saw_any_marker);
    assert!(!split.ended_still_locked);

    let locked: Vec<&str> = split
        .segments
        .iter()
        .filter_map(|s| match s {
            Segment::Text { text, locked: true } => Some(*text),
            _ => None,
        })
        .collect();
    assert_eq!(locked, vec!["b", "d"]);
}

#[tokio::test]
async fn test_translateDocument_rawBlocks_shouldStayByteIdentical() {
    init_logging();
    let (translator, backend) = translator(MockBackend::prefixing());

    let outcome = translator.translate_document(NEWSLETTER_MJML, "DE").await;

    assert!(outcome.changed);
    assert!(outcome.document.contains("<mj-raw><p>Legal footer, do not touch</p></mj-raw>"));
    assert!(backend.sent_texts().iter().all(|t| !t.contains("Legal footer")));
}

#[tokio::test]
async fn test_translateDocument_tokens_shouldNeverReachBackend() {
    let (translator, backend) = translator(MockBackend::prefixing());

    let outcome = translator.translate_document(NEWSLETTER_MJML, "DE").await;

    for sent in backend.sent_texts() {
        assert!(!sent.contains("{{"), "template sent: {}", sent);
        assert!(!sent.contains("{contactfield"), "token sent: {}", sent);
        assert!(!sent.contains("{companyname}"), "token sent: {}", sent);
    }
    assert!(outcome.document.contains("<mj-preview>[DE] Our news for {{ month }}</mj-preview>"));
    assert!(outcome.document.contains(r#"alt="[DE] Logo of {companyname}""#));
    assert!(outcome.document.contains(r#"href="{unsubscribe_url}" title="[DE] Leave the list""#));
    assert!(outcome.document.contains(">[DE] Unsubscribe</mj-button>"));
    assert!(outcome
        .document
        .contains("[DE] Hi {contactfield=firstname}, <b>welcome</b> back!\n        </mj-text>"));
}

#[tokio::test]
async fn test_translateDocument_echoBackend_shouldReturnIdenticalDocument() {
    let (translator, backend) = translator(MockBackend::echo());
    let document = format!(
        "{}<mjml><mj-body><mj-image alt=\"Tom &amp; Jerry\" /></mj-body></mjml>",
        NEWSLETTER_MJML
    );

    let outcome = translator.translate_document(&document, "DE").await;

    assert!(backend.call_count() > 0);
    assert_eq!(outcome.document, document);
    assert!(!outcome.changed);
    assert!(outcome.samples.is_empty());
}

#[tokio::test]
async fn test_translateDocument_noMarkers_shouldEqualFragmentTranslation() {
    let (translator, _) = translator(MockBackend::prefixing());

    let outcome = translator.translate_document(NEWSLETTER_MJML, "FR").await;
    let mut samples = Vec::new();
    let fragment = translator
        .translate_fragment(NEWSLETTER_MJML, "FR", &mut samples)
        .await;

    assert!(!outcome.locked_mode);
    assert_eq!(outcome.locked_pair_count, 0);
    assert_eq!(outcome.document, fragment);
    assert_eq!(outcome.samples, samples);
}

#[tokio::test]
async fn test_translateDocument_lockedRegion_shouldStayUntouched() {
    let (translator, backend) =
        translator(MockBackend::dictionary([("Hello", "Hallo"), ("Goodbye", "Tschüss")]));
    let document = format!(
        "<mjml><mj-body><mj-text>Hello</mj-text>{}<mj-text>Hello</mj-text>{}<mj-text>Goodbye</mj-text></mj-body></mjml>",
        LOCK_START, LOCK_END
    );

    let outcome = translator.translate_document(&document, "DE").await;

    assert_eq!(
        outcome.document,
        format!(
            "<mjml><mj-body><mj-text>Hallo</mj-text>{}<mj-text>Hello</mj-text>{}<mj-text>Tschüss</mj-text></mj-body></mjml>",
            LOCK_START, LOCK_END
        )
    );
    assert!(outcome.locked_mode);
    assert_eq!(outcome.locked_pair_count, 1);
    assert!(!outcome.ended_still_locked);
    assert_eq!(backend.sent_texts(), vec!["Hello", "Goodbye"]);
}

#[tokio::test]
async fn test_translateDocument_unterminatedLock_shouldKeepRestUntouched() {
    let (translator, _) = translator(MockBackend::prefixing());
    let document = format!(
        "<mj-text>Open</mj-text>{}<mj-text>Closed</mj-text>",
        LOCK_START
    );

    let outcome = translator.translate_document(&document, "DE").await;

    assert_eq!(
        outcome.document,
        format!("<mj-text>[DE] Open</mj-text>{}<mj-text>Closed</mj-text>", LOCK_START)
    );
    assert!(outcome.ended_still_locked);
    assert_eq!(outcome.locked_pair_count, 0);
}

#[tokio::test]
async fn test_translateDocument_strayEndMarker_shouldBeIgnored() {
    let (translator, _) = translator(MockBackend::prefixing());
    let document = format!("{}<mj-text>Hello</mj-text>", LOCK_END);

    let outcome = translator.translate_document(&document, "DE").await;

    assert_eq!(outcome.document, format!("{}<mj-text>[DE] Hello</mj-text>", LOCK_END));
    assert!(outcome.locked_mode);
    assert_eq!(outcome.locked_pair_count, 0);
}

#[tokio::test]
async fn test_translateDocument_failingBackend_shouldLeaveDocumentUnchanged() {
    let (translator, backend) = translator(MockBackend::failing());

    let outcome = translator.translate_document(NEWSLETTER_MJML, "DE").await;

    assert!(backend.call_count() > 0);
    assert_eq!(outcome.document, NEWSLETTER_MJML);
    assert!(!outcome.changed);
    assert!(outcome.samples.is_empty());
}

#[tokio::test]
async fn test_translateDocument_withoutMarkupMode_shouldShieldTags() {
    let (translator, backend) = translator(MockBackend::prefixing().without_markup_mode());
    let document = "<mj-text><p>Hi <b>there</b></p></mj-text>";

    let outcome = translator.translate_document(document, "DE").await;

    assert_eq!(outcome.document, "<mj-text>[DE] <p>Hi <b>there</b></p></mj-text>");
    for call in backend.calls() {
        assert_eq!(call.tag_handling, TagHandling::Plain);
        assert!(!call.text.contains('<'));
    }
}

#[tokio::test]
async fn test_translateStandaloneText_shouldUsePlainModeAndKeepTemplates() {
    let (translator, backend) = translator(MockBackend::prefixing());
    let mut samples = Vec::new();

    let subject = translator
        .translate_standalone_text("  Hi {{ name }}, news inside  ", "DE", &mut samples)
        .await;

    assert_eq!(subject, "  [DE] Hi {{ name }}, news inside  ");
    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tag_handling, TagHandling::Plain);
    assert!(!calls[0].text.contains("{{"));
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].from, "Hi {{ name }}, news inside");
}

#[tokio::test]
async fn test_translateDocument_nestedRawBlocks_shouldStayByteIdentical() {
    let (translator, backend) = translator(MockBackend::prefixing());
    let raw = "<mj-raw><mj-raw>x</mj-raw><mj-text>Inner</mj-text></mj-raw>";
    let document = format!("{}<mj-text>Outer</mj-text>", raw);

    let outcome = translator.translate_document(&document, "DE").await;

    assert_eq!(outcome.document, format!("{}<mj-text>[DE] Outer</mj-text>", raw));
    assert_eq!(backend.sent_texts(), vec!["Outer"]);
}

#[tokio::test]
async fn test_translateDocument_markerInsideRawBlock_shouldBeInert() {
    let (translator, backend) = translator(MockBackend::prefixing());
    let document = format!(
        "<mj-raw>{}</mj-raw><mj-text>Hello</mj-text>{}<mj-text>Kept</mj-text>{}<mj-text>Bye</mj-text>",
        LOCK_START, LOCK_START, LOCK_END
    );

    let outcome = translator.translate_document(&document, "DE").await;

    assert_eq!(
        outcome.document,
        format!(
            "<mj-raw>{}</mj-raw><mj-text>[DE] Hello</mj-text>{}<mj-text>Kept</mj-text>{}<mj-text>[DE] Bye</mj-text>",
            LOCK_START, LOCK_START, LOCK_END
        )
    );
    assert!(outcome.locked_mode);
    assert_eq!(outcome.locked_pair_count, 1);
    assert!(!outcome.ended_still_locked);
    assert_eq!(backend.sent_texts(), vec!["Hello", "Bye"]);
}

#[tokio::test]
async fn test_translateDocument_rawBlockInLockedRegion_shouldStayUntouched() {
    let (translator, backend) = translator(MockBackend::prefixing());
    let document = format!(
        "{}<mj-raw><mj-text>Raw</mj-text></mj-raw><mj-text>Locked</mj-text>{}<mj-text>Open</mj-text>",
        LOCK_START, LOCK_END
    );

    let outcome = translator.translate_document(&document, "DE").await;

    assert_eq!(
        outcome.document,
        format!(
            "{}<mj-raw><mj-text>Raw</mj-text></mj-raw><mj-text>Locked</mj-text>{}<mj-text>[DE] Open</mj-text>",
            LOCK_START, LOCK_END
        )
    );
    assert_eq!(outcome.locked_pair_count, 1);
    assert_eq!(backend.sent_texts(), vec!["Open"]);
}

#[tokio::test]
async fn test_translateDocument_rawBlockWithComponents_shouldNotBeTranslated() {
    let (translator, backend) = translator(MockBackend::prefixing());
    let raw = "<mj-raw><mj-text>Raw text</mj-text><mj-image alt=\"Raw alt\" /></mj-raw>";
    let document = format!("<mj-body>{}<mj-text>Hello</mj-text></mj-body>", raw);

    let outcome = translator.translate_document(&document, "DE").await;

    assert_eq!(
        outcome.document,
        format!("<mj-body>{}<mj-text>[DE] Hello</mj-text></mj-body>", raw)
    );
    assert!(!outcome.locked_mode);
    assert_eq!(backend.sent_texts(), vec!["Hello"]);
}

#[tokio::test]
async fn test_translateDocument_entityAndSingleQuotedAttributes_shouldRoundTripCleanly() {
    let (translator, backend) = translator(MockBackend::prefixing());
    let document = "<mj-image src=\"a.png\" alt=\"Caf&eacute; &nbsp;logo\" /><mj-button title='Go' href=\"#\">Go</mj-button>";

    let outcome = translator.translate_document(document, "DE").await;

    assert_eq!(
        outcome.document,
        "<mj-image src=\"a.png\" alt=\"[DE] Caf\u{e9} &nbsp;logo\" /><mj-button title='[DE] Go' href=\"#\">[DE] Go</mj-button>"
    );
    assert!(backend.sent_texts().contains(&"Caf\u{e9} \u{a0}logo".to_string()));
}
