//! Folding a burst of inbound messages into one turn.

use yak_core::{Attachment, FormatError, InboundMessage};

/// Merge messages that arrived together into one.
///
/// Text parts are joined with `\n` in arrival order and media in a mixed
/// batch is dropped. A batch with no text merges its attachments. The
/// result carries the latest timestamp, and is a postback if any part
/// was one.
pub fn merge_messages(messages: Vec<InboundMessage>) -> Result<InboundMessage, FormatError> {
    if messages.is_empty() {
        return Err(FormatError::Empty);
    }

    let timestamp = messages.iter().filter_map(InboundMessage::timestamp).max();
    let is_postback = messages.iter().any(InboundMessage::is_postback);
    let texts: Vec<&str> = messages.iter().filter_map(InboundMessage::as_text).collect();

    if !texts.is_empty() {
        return Ok(InboundMessage::Text {
            text: texts.join("\n"),
            timestamp,
            is_postback,
        });
    }

    let attachments: Vec<Attachment> = messages
        .into_iter()
        .flat_map(|message| match message {
            InboundMessage::Media { attachments, .. } => attachments,
            _ => Vec::new(),
        })
        .collect();
    Ok(InboundMessage::Media {
        attachments,
        timestamp,
    })
}
