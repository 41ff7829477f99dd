use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Request in flight, buffer accumulating.
    Processing,
    /// A parse succeeded; the result is available.
    Done,
    /// The transport reported an error.
    Failed,
}

/// Reassembles a streamed JSON object from transport chunks.
///
/// Each chunk is appended to a growing byte buffer and a parse is attempted;
/// a parse failure means "more data needed", never an error, so malformed
/// intermediate buffers (including a multi-byte character split across
/// chunks) cannot short-circuit the loop. The Done transition happens exactly
/// once, on the first successful parse. There is no timeout and no retry: the
/// loop ends only when the transport does.
pub struct StreamConsumer {
    buffer: Vec<u8>,
    state: ConsumerState,
    result: Option<Value>,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            state: ConsumerState::Processing,
            result: None,
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Feed one chunk. Returns the parsed object on the Processing → Done
    /// transition and `None` otherwise; chunks after Done are ignored.
    pub fn push(&mut self, chunk: &[u8]) -> Option<&Value> {
        if self.state != ConsumerState::Processing {
            return None;
        }
        self.buffer.extend_from_slice(chunk);
        match serde_json::from_slice::<Value>(&self.buffer) {
            Ok(value) => {
                self.result = Some(value);
                self.state = ConsumerState::Done;
                self.result.as_ref()
            }
            // Partial buffer; keep accumulating.
            Err(_) => None,
        }
    }

    /// Mark the transport as failed. No-op once Done.
    pub fn fail(&mut self) {
        if self.state == ConsumerState::Processing {
            self.state = ConsumerState::Failed;
        }
    }

    /// End of stream. Yields the parsed object, or `None` when the stream
    /// closed without ever producing one — a silent no-result, matching the
    /// observed upstream behavior.
    pub fn finish(self) -> Option<Value> {
        if self.result.is_none() {
            warn!("stream ended without a parseable object");
        }
        self.result
    }
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_only_when_the_final_chunk_completes_the_object() {
        let mut consumer = StreamConsumer::new();
        assert!(consumer.push(b"{\"fullName\":").is_none());
        assert_eq!(consumer.state(), ConsumerState::Processing);
        assert!(consumer.push(b"\"Ada\",\"age\":").is_none());

        let parsed = consumer.push(b"28}").cloned();
        assert_eq!(parsed, Some(json!({"fullName": "Ada", "age": 28})));
        assert_eq!(consumer.state(), ConsumerState::Done);
        assert_eq!(consumer.finish(), Some(json!({"fullName": "Ada", "age": 28})));
    }

    #[test]
    fn done_transition_happens_exactly_once() {
        let mut consumer = StreamConsumer::new();
        assert!(consumer.push(b"{\"a\":1}").is_some());
        // Trailing chunks after the first successful parse are ignored.
        assert!(consumer.push(b"{\"b\":2}").is_none());
        assert_eq!(consumer.finish(), Some(json!({"a": 1})));
    }

    #[test]
    fn multibyte_character_split_across_chunks_does_not_corrupt() {
        let mut consumer = StreamConsumer::new();
        let payload = serde_json::to_vec(&json!({ "fullName": "José" })).unwrap();
        // Split inside the two-byte encoding of 'é'.
        let split = payload.iter().position(|&b| b == 0xC3).unwrap() + 1;
        assert!(consumer.push(&payload[..split]).is_none());

        let parsed = consumer.push(&payload[split..]).cloned();
        assert_eq!(parsed, Some(json!({ "fullName": "José" })));
    }

    #[test]
    fn never_parseable_stream_finishes_silently_with_no_result() {
        let mut consumer = StreamConsumer::new();
        assert!(consumer.push(b"this is").is_none());
        assert!(consumer.push(b" not json").is_none());
        assert_eq!(consumer.state(), ConsumerState::Processing);
        assert_eq!(consumer.finish(), None);
    }

    #[test]
    fn malformed_intermediate_buffers_do_not_short_circuit() {
        let mut consumer = StreamConsumer::new();
        // Looks plausible but is invalid JSON until the closing brace lands.
        assert!(consumer.push(b"{\"hobbies\": [\"chess\",").is_none());
        assert!(consumer.push(b" \"hiking\"]").is_none());
        assert!(consumer.push(b"}").is_some());
    }

    #[test]
    fn transport_failure_is_terminal() {
        let mut consumer = StreamConsumer::new();
        consumer.push(b"{\"a\":");
        consumer.fail();
        assert_eq!(consumer.state(), ConsumerState::Failed);
        assert!(consumer.push(b"1}").is_none());
        assert_eq!(consumer.finish(), None);
    }
}
