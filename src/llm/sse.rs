use tracing::debug;

/// Incremental decoder for the provider's server-sent-event framing.
///
/// Transport chunks can split an event anywhere, including inside a multi-byte
/// UTF-8 character, so raw bytes are buffered and split on `\n` at the byte
/// level; only complete lines are decoded (a multi-byte sequence never
/// contains a newline byte). Only the `choices[0].delta.content` text of each
/// `data:` event is surfaced; the `[DONE]` terminator and malformed events are
/// skipped.
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() || payload == "[DONE]" {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(payload) {
                Ok(event) => {
                    if let Some(content) = event["choices"][0]["delta"]["content"].as_str() {
                        if !content.is_empty() {
                            out.push(content.to_string());
                        }
                    }
                }
                Err(e) => {
                    debug!(error = %e, "skipping malformed sse event");
                }
            }
        }
        out
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}
