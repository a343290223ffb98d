//! Normalized messages that cross the engine boundary.
//!
//! Formatters turn channel payloads into [`InboundMessage`] and
//! [`OutboundMessage`] back into channel payloads. Topics only ever see
//! these types.

use serde::{Deserialize, Serialize};

/// A message from the user, already normalized by a formatter.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    /// Plain text typed by the user, or the payload of a button press.
    #[serde(rename = "string")]
    Text {
        /// The text content.
        text: String,
        /// Milliseconds since the epoch, if the channel reports it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
        /// True when the text came from a postback button, not typing.
        #[serde(default)]
        is_postback: bool,
    },

    /// One or more attachments.
    Media {
        /// The attached media.
        attachments: Vec<Attachment>,
        /// Milliseconds since the epoch, if the channel reports it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
}

/// A media attachment on an inbound message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    /// Where the media can be fetched.
    pub url: String,
}

impl InboundMessage {
    /// Create a typed text message with no timestamp.
    pub fn text(s: impl Into<String>) -> Self {
        InboundMessage::Text {
            text: s.into(),
            timestamp: None,
            is_postback: false,
        }
    }

    /// Create a postback message carrying a button payload.
    pub fn postback(payload: impl Into<String>) -> Self {
        InboundMessage::Text {
            text: payload.into(),
            timestamp: None,
            is_postback: true,
        }
    }

    /// The text content, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            InboundMessage::Text { text, .. } => Some(text),
            InboundMessage::Media { .. } => None,
        }
    }

    /// The channel timestamp, if any.
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            InboundMessage::Text { timestamp, .. } | InboundMessage::Media { timestamp, .. } => {
                *timestamp
            }
        }
    }

    /// Whether the message came from a postback button.
    pub fn is_postback(&self) -> bool {
        matches!(self, InboundMessage::Text { is_postback: true, .. })
    }
}

/// A message produced by a topic for the user.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// Plain text.
    #[serde(rename = "string")]
    Text {
        /// The text content.
        text: String,
    },

    /// A set of choices the user can pick from.
    #[serde(rename = "option")]
    Choice {
        /// The choices, in display order.
        values: Vec<String>,
    },
}

impl OutboundMessage {
    /// Create a text message.
    pub fn text(s: impl Into<String>) -> Self {
        OutboundMessage::Text { text: s.into() }
    }

    /// Create a choice message.
    pub fn choice<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OutboundMessage::Choice {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The text content, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutboundMessage::Text { text } => Some(text),
            OutboundMessage::Choice { .. } => None,
        }
    }
}

impl From<&str> for OutboundMessage {
    fn from(s: &str) -> Self {
        OutboundMessage::text(s)
    }
}

impl From<String> for OutboundMessage {
    fn from(s: String) -> Self {
        OutboundMessage::Text { text: s }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inbound_text_wire_shape() {
        let msg: InboundMessage =
            serde_json::from_value(json!({"type": "string", "text": "hi", "timestamp": 5}))
                .unwrap();
        assert_eq!(msg.as_text(), Some("hi"));
        assert_eq!(msg.timestamp(), Some(5));
        assert!(!msg.is_postback());
    }

    #[test]
    fn postback_flag_is_camel_case_on_the_wire() {
        let wire = serde_json::to_value(InboundMessage::postback("GET_STARTED")).unwrap();
        assert_eq!(
            wire,
            json!({"type": "string", "text": "GET_STARTED", "isPostback": true})
        );

        let back: InboundMessage = serde_json::from_value(wire).unwrap();
        assert!(back.is_postback());
    }

    #[test]
    fn media_has_no_text() {
        let msg = InboundMessage::Media {
            attachments: vec![Attachment {
                url: "https://example.com/a.png".into(),
            }],
            timestamp: None,
        };
        assert_eq!(msg.as_text(), None);
        assert_eq!(serde_json::to_value(&msg).unwrap()["type"], "media");
    }

    #[test]
    fn outbound_tags_match_channel_format() {
        let text = serde_json::to_value(OutboundMessage::text("yo")).unwrap();
        assert_eq!(text, json!({"type": "string", "text": "yo"}));

        let choice = serde_json::to_value(OutboundMessage::choice(["a", "b"])).unwrap();
        assert_eq!(choice, json!({"type": "option", "values": ["a", "b"]}));
    }
}
