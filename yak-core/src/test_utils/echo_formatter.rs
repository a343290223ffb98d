//! EchoFormatter: the normalized message shape is the wire shape.

use crate::error::FormatError;
use crate::format::{ExternalMessage, MessageFormatter};
use crate::message::{InboundMessage, OutboundMessage};

/// A formatter whose channel format is the serde form of the normalized
/// message types. Merging keeps the last message of the batch.
pub struct EchoFormatter;

impl MessageFormatter for EchoFormatter {
    fn parse_incoming(&self, raw: ExternalMessage) -> Result<InboundMessage, FormatError> {
        serde_json::from_value(raw).map_err(|e| FormatError::Malformed(e.to_string()))
    }

    fn merge_incoming(&self, raw: Vec<ExternalMessage>) -> Result<InboundMessage, FormatError> {
        let last = raw.into_iter().last().ok_or(FormatError::Empty)?;
        self.parse_incoming(last)
    }

    fn format_outgoing(&self, message: &OutboundMessage) -> Result<ExternalMessage, FormatError> {
        serde_json::to_value(message).map_err(|e| FormatError::Other(Box::new(e)))
    }
}
