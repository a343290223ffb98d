//! Formatter for Messenger webhook events.

use crate::merge::merge_messages;
use serde::Deserialize;
use yak_core::{Attachment, ExternalMessage, FormatError, InboundMessage, MessageFormatter, OutboundMessage};

#[derive(Deserialize)]
struct MessengerEvent {
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    message: Option<MessengerMessage>,
    #[serde(default)]
    postback: Option<MessengerPostback>,
}

#[derive(Deserialize)]
struct MessengerMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    attachments: Vec<MessengerAttachment>,
}

#[derive(Deserialize)]
struct MessengerAttachment {
    #[serde(default)]
    payload: Option<MessengerAttachmentPayload>,
}

#[derive(Deserialize)]
struct MessengerAttachmentPayload {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct MessengerPostback {
    payload: String,
}

/// Formatter for Messenger messaging events:
/// `{sender, recipient, timestamp, message: {text}, postback?: {payload}}`.
///
/// A postback becomes a text message carrying the button payload, with
/// `is_postback` set. Events with neither text, attachments nor a
/// postback (delivery and read receipts) are
/// [`FormatError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MessengerFormatter;

impl MessageFormatter for MessengerFormatter {
    fn parse_incoming(&self, raw: ExternalMessage) -> Result<InboundMessage, FormatError> {
        let event: MessengerEvent =
            serde_json::from_value(raw).map_err(|e| FormatError::Malformed(e.to_string()))?;

        if let Some(postback) = event.postback {
            return Ok(InboundMessage::Text {
                text: postback.payload,
                timestamp: event.timestamp,
                is_postback: true,
            });
        }

        let Some(message) = event.message else {
            tracing::debug!("yak.format.messenger.unsupported_event");
            return Err(FormatError::Unsupported("event has no message or postback".into()));
        };
        if let Some(text) = message.text {
            return Ok(InboundMessage::Text {
                text,
                timestamp: event.timestamp,
                is_postback: false,
            });
        }

        let attachments: Vec<Attachment> = message
            .attachments
            .into_iter()
            .filter_map(|a| a.payload.and_then(|p| p.url))
            .map(|url| Attachment { url })
            .collect();
        if attachments.is_empty() {
            return Err(FormatError::Unsupported(
                "message has neither text nor fetchable attachments".into(),
            ));
        }
        Ok(InboundMessage::Media {
            attachments,
            timestamp: event.timestamp,
        })
    }

    fn merge_incoming(&self, raw: Vec<ExternalMessage>) -> Result<InboundMessage, FormatError> {
        let messages = raw
            .into_iter()
            .map(|event| self.parse_incoming(event))
            .collect::<Result<Vec<_>, _>>()?;
        merge_messages(messages)
    }

    fn format_outgoing(&self, message: &OutboundMessage) -> Result<ExternalMessage, FormatError> {
        crate::format_normalized(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attachment_without_url_is_skipped() {
        let raw = json!({
            "timestamp": 1,
            "message": {"attachments": [
                {"type": "location", "payload": {"coordinates": {"lat": 0, "long": 0}}},
                {"type": "image", "payload": {"url": "https://cdn.example/cat.png"}}
            ]}
        });
        let msg = MessengerFormatter.parse_incoming(raw).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Media {
                attachments: vec![Attachment { url: "https://cdn.example/cat.png".into() }],
                timestamp: Some(1),
            }
        );
    }

    #[test]
    fn receipt_is_unsupported() {
        let raw = json!({"sender": {"id": "1"}, "recipient": {"id": "2"}, "delivery": {"watermark": 5}});
        let err = MessengerFormatter.parse_incoming(raw).unwrap_err();
        assert!(matches!(err, FormatError::Unsupported(_)));
    }
}
