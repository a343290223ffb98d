//! The Formatter protocol: translating channel payloads.

use crate::error::FormatError;
use crate::message::{InboundMessage, OutboundMessage};

/// A message in a channel's own wire format.
pub type ExternalMessage = serde_json::Value;

/// Converts between a channel's payloads and normalized messages.
///
/// The engine only ever sees [`InboundMessage`] and produces
/// [`OutboundMessage`]; one formatter exists per channel.
pub trait MessageFormatter: Send + Sync {
    /// Normalize one raw channel payload.
    fn parse_incoming(&self, raw: ExternalMessage) -> Result<InboundMessage, FormatError>;

    /// Normalize a burst of raw payloads into a single message.
    fn merge_incoming(&self, raw: Vec<ExternalMessage>) -> Result<InboundMessage, FormatError>;

    /// Render a normalized message in the channel's format.
    fn format_outgoing(&self, message: &OutboundMessage) -> Result<ExternalMessage, FormatError>;
}
