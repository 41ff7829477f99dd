use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Messages passed from the uploader to whoever renders the result.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// A file was picked (`Some`) or removed (`None`).
    FileSelected { file_name: Option<String> },
    /// The stream produced a parsed object.
    FileProcessed {
        data: Value,
        file_name: String,
        file_size: u64,
    },
}

pub type EventSender = UnboundedSender<UploadEvent>;
pub type EventReceiver = UnboundedReceiver<UploadEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    unbounded_channel()
}
