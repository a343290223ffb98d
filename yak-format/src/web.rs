//! Formatter for the web channel.

use crate::merge::merge_messages;
use serde::Deserialize;
use yak_core::{Attachment, ExternalMessage, FormatError, InboundMessage, MessageFormatter, OutboundMessage};

#[derive(Deserialize)]
struct WebIncoming {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

/// Formatter for web clients posting `{"text": ..., "timestamp": ...}`.
///
/// Text takes precedence over attachments when a payload has both.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebFormatter;

impl MessageFormatter for WebFormatter {
    fn parse_incoming(&self, raw: ExternalMessage) -> Result<InboundMessage, FormatError> {
        let incoming: WebIncoming =
            serde_json::from_value(raw).map_err(|e| FormatError::Malformed(e.to_string()))?;
        match (incoming.text, incoming.attachments.is_empty()) {
            (Some(text), _) => Ok(InboundMessage::Text {
                text,
                timestamp: incoming.timestamp,
                is_postback: false,
            }),
            (None, false) => Ok(InboundMessage::Media {
                attachments: incoming.attachments,
                timestamp: incoming.timestamp,
            }),
            (None, true) => Err(FormatError::Malformed(
                "web message has neither text nor attachments".into(),
            )),
        }
    }

    fn merge_incoming(&self, raw: Vec<ExternalMessage>) -> Result<InboundMessage, FormatError> {
        let messages = raw
            .into_iter()
            .map(|message| self.parse_incoming(message))
            .collect::<Result<Vec<_>, _>>()?;
        merge_messages(messages)
    }

    fn format_outgoing(&self, message: &OutboundMessage) -> Result<ExternalMessage, FormatError> {
        crate::format_normalized(message)
    }
}
