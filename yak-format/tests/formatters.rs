use proptest::prelude::*;
use serde_json::json;
use yak_core::{FormatError, InboundMessage, MessageFormatter, OutboundMessage};
use yak_format::{MessengerFormatter, WebFormatter, merge_messages};

// ━━━ Web ━━━

#[test]
fn web_parses_text_with_timestamp() {
    let msg = WebFormatter
        .parse_incoming(json!({"text": "hello world", "timestamp": 1700000000000i64}))
        .unwrap();
    assert_eq!(msg.as_text(), Some("hello world"));
    assert_eq!(msg.timestamp(), Some(1700000000000));
    assert!(!msg.is_postback());
}

#[test]
fn web_parses_attachments() {
    let msg = WebFormatter
        .parse_incoming(json!({"attachments": [{"url": "https://x/y.png"}]}))
        .unwrap();
    assert!(matches!(msg, InboundMessage::Media { ref attachments, .. } if attachments.len() == 1));
}

#[test]
fn web_outgoing_is_the_normalized_shape() {
    let text = WebFormatter.format_outgoing(&OutboundMessage::text("hi")).unwrap();
    assert_eq!(text, json!({"type": "string", "text": "hi"}));

    let choice = WebFormatter
        .format_outgoing(&OutboundMessage::choice(["yes", "no"]))
        .unwrap();
    assert_eq!(choice, json!({"type": "option", "values": ["yes", "no"]}));
}

#[test]
fn web_merge_joins_text() {
    let merged = WebFormatter
        .merge_incoming(vec![
            json!({"text": "name", "timestamp": 1}),
            json!({"text": "Hemchand", "timestamp": 2}),
        ])
        .unwrap();
    assert_eq!(merged.as_text(), Some("name\nHemchand"));
    assert_eq!(merged.timestamp(), Some(2));
}

#[test]
fn web_merge_of_nothing_is_empty() {
    assert!(matches!(WebFormatter.merge_incoming(vec![]), Err(FormatError::Empty)));
}

#[test]
fn web_merge_fails_on_any_malformed_part() {
    let err = WebFormatter
        .merge_incoming(vec![json!({"text": "ok"}), json!(42)])
        .unwrap_err();
    assert!(matches!(err, FormatError::Malformed(_)));
}

// ━━━ Messenger ━━━

fn messenger_text(text: &str, ts: i64) -> serde_json::Value {
    json!({
        "sender": {"id": "user-1"},
        "recipient": {"id": "page-1"},
        "timestamp": ts,
        "message": {"mid": "m1", "seq": 1, "text": text}
    })
}

#[test]
fn messenger_parses_text() {
    let msg = MessengerFormatter
        .parse_incoming(messenger_text("do math", 7))
        .unwrap();
    assert_eq!(msg.as_text(), Some("do math"));
    assert_eq!(msg.timestamp(), Some(7));
    assert!(!msg.is_postback());
}

#[test]
fn messenger_postback_uses_payload_as_text() {
    let raw = json!({
        "sender": {"id": "user-1"},
        "recipient": {"id": "page-1"},
        "timestamp": 9,
        "message": {"mid": "m2", "seq": 2},
        "postback": {"payload": "SHOW_HAIKU"}
    });
    let msg = MessengerFormatter.parse_incoming(raw).unwrap();
    assert_eq!(msg.as_text(), Some("SHOW_HAIKU"));
    assert!(msg.is_postback());
}

#[test]
fn messenger_merge_marks_postback() {
    let merged = MessengerFormatter
        .merge_incoming(vec![
            messenger_text("first", 1),
            json!({"timestamp": 3, "postback": {"payload": "NEXT"}}),
        ])
        .unwrap();
    assert_eq!(merged.as_text(), Some("first\nNEXT"));
    assert!(merged.is_postback());
    assert_eq!(merged.timestamp(), Some(3));
}

#[test]
fn formatters_are_object_safe() {
    let formatters: Vec<Box<dyn MessageFormatter>> =
        vec![Box::new(WebFormatter), Box::new(MessengerFormatter)];
    for f in &formatters {
        assert!(f.format_outgoing(&OutboundMessage::text("x")).is_ok());
    }
}

// ━━━ Merge laws ━━━

proptest! {
    #[test]
    fn merged_text_preserves_parts_in_order(parts in prop::collection::vec("[a-z ]{0,12}", 1..8)) {
        let messages = parts.iter().map(|p| InboundMessage::text(p.as_str())).collect();
        let merged = merge_messages(messages).unwrap();
        let expected = parts.join("\n");
        prop_assert_eq!(merged.as_text(), Some(expected.as_str()));
    }

    #[test]
    fn merged_timestamp_is_the_latest(stamps in prop::collection::vec(proptest::option::of(0i64..1_000_000), 1..8)) {
        let messages = stamps
            .iter()
            .map(|ts| InboundMessage::Text { text: "x".into(), timestamp: *ts, is_postback: false })
            .collect();
        let merged = merge_messages(messages).unwrap();
        prop_assert_eq!(merged.timestamp(), stamps.iter().flatten().copied().max());
    }
}
