// Queue Message Domain Model

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A single de-queued message.
///
/// Produced by a queue backend and retired (deleted) by the consumer after
/// successful handling. The core never persists messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Backend-assigned message id
    pub id: String,
    /// Opaque token required to delete the message
    pub receipt: String,
    /// Payload exactly as stored on the queue
    pub raw_payload: String,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        receipt: impl Into<String>,
        raw_payload: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            receipt: receipt.into(),
            raw_payload: raw_payload.into(),
        }
    }

    /// The text passed to the message handler.
    ///
    /// Producers commonly base64-encode payloads before enqueueing. If the
    /// raw payload is valid base64 decoding to UTF-8 text, the decoded text
    /// is used; otherwise the raw payload is passed through unchanged.
    pub fn handler_payload(&self) -> String {
        match STANDARD.decode(&self.raw_payload) {
            Ok(bytes) => {
                String::from_utf8(bytes).unwrap_or_else(|_| self.raw_payload.clone())
            }
            Err(_) => self.raw_payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_payload_is_decoded() {
        let message = Message::new("1", "r1", "QmFzZTY0IGVuY29kZWQgbWVzc2FnZQ==");
        assert_eq!(message.handler_payload(), "Base64 encoded message");
    }

    #[test]
    fn plain_text_payload_is_passed_through() {
        let message = Message::new("1", "r1", "plain text");
        assert_eq!(message.handler_payload(), "plain text");
    }

    #[test]
    fn base64_of_non_utf8_falls_back_to_raw() {
        // 0xFF 0xFE is not valid UTF-8
        let raw = STANDARD.encode([0xFF, 0xFE]);
        let message = Message::new("1", "r1", raw.clone());
        assert_eq!(message.handler_payload(), raw);
    }

    #[test]
    fn empty_payload_stays_empty() {
        let message = Message::new("1", "r1", "");
        assert_eq!(message.handler_payload(), "");
    }
}
