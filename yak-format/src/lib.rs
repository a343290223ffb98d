#![deny(missing_docs)]
//! Channel formatters for Wild Yak.
//!
//! | Formatter | Channel | Inbound shape |
//! |-----------|---------|---------------|
//! | [`WebFormatter`] | Web widget / HTTP | `{text?, timestamp?}` or `{attachments, timestamp?}` |
//! | [`MessengerFormatter`] | Messenger webhook | `{sender, recipient, timestamp, message, postback?}` |
//!
//! Both render outbound messages in the normalized wire shape
//! (`{"type": "string", "text": ...}` and `{"type": "option", "values": [...]}`),
//! which both channels' front ends consume directly.

mod merge;
mod messenger;
mod web;

pub use merge::merge_messages;
pub use messenger::MessengerFormatter;
pub use web::WebFormatter;

use yak_core::{ExternalMessage, FormatError, OutboundMessage};

fn format_normalized(message: &OutboundMessage) -> Result<ExternalMessage, FormatError> {
    serde_json::to_value(message).map_err(|e| FormatError::Other(Box::new(e)))
}
