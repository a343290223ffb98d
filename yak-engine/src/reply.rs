//! What a handler or callback hands back to the dispatcher.

use yak_core::OutboundMessage;

/// The result of a condition handler or a topic callback.
///
/// The dispatcher flattens it into the turn's output: `Nothing` becomes an
/// empty list, `One` a single-element list, `Many` passes through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Reply {
    /// No output.
    #[default]
    Nothing,
    /// A single message.
    One(OutboundMessage),
    /// Several messages, in order.
    Many(Vec<OutboundMessage>),
}

impl Reply {
    /// Flatten into the list of messages sent to the user.
    pub fn into_messages(self) -> Vec<OutboundMessage> {
        match self {
            Reply::Nothing => Vec::new(),
            Reply::One(message) => vec![message],
            Reply::Many(messages) => messages,
        }
    }

    /// True when there is nothing to send.
    pub fn is_nothing(&self) -> bool {
        matches!(self, Reply::Nothing)
    }
}

impl From<OutboundMessage> for Reply {
    fn from(message: OutboundMessage) -> Self {
        Reply::One(message)
    }
}

impl From<Vec<OutboundMessage>> for Reply {
    fn from(messages: Vec<OutboundMessage>) -> Self {
        Reply::Many(messages)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::One(OutboundMessage::text(text))
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::One(OutboundMessage::text(text))
    }
}

impl From<Option<Reply>> for Reply {
    fn from(reply: Option<Reply>) -> Self {
        reply.unwrap_or_default()
    }
}
