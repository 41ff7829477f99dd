use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::consumer::StreamConsumer;
use super::events::{EventSender, UploadEvent};
use crate::analytics::Analytics;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid file type: only .txt files are accepted")]
    InvalidFileType,

    #[error("extract request failed with status {0}")]
    BadStatus(reqwest::StatusCode),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Drives a text file through the extract endpoint and the stream consumer,
/// reporting progress as [`UploadEvent`]s. Analytics is an injected
/// capability, not a global.
pub struct Uploader {
    endpoint: String,
    http: reqwest::Client,
    analytics: Arc<dyn Analytics>,
    events: EventSender,
}

impl Uploader {
    pub fn new(
        endpoint: impl Into<String>,
        http: reqwest::Client,
        analytics: Arc<dyn Analytics>,
        events: EventSender,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            http,
            analytics,
            events,
        }
    }

    /// Register a picked file. Non-`.txt` files are rejected here, before any
    /// I/O or network traffic.
    pub fn select(&self, path: &Path) -> Result<(), UploadError> {
        let name = file_name(path);
        if !is_txt(path) {
            self.analytics.capture(
                "file_upload_error",
                json!({ "error": "invalid_file_type", "file_name": name }),
            );
            return Err(UploadError::InvalidFileType);
        }
        self.analytics
            .capture("file_uploaded", json!({ "file_name": name }));
        self.emit(UploadEvent::FileSelected {
            file_name: Some(name),
        });
        Ok(())
    }

    /// Remove the current file.
    pub fn clear(&self, file_name: Option<&str>) {
        self.analytics
            .capture("file_removed", json!({ "file_name": file_name }));
        self.emit(UploadEvent::FileSelected { file_name: None });
    }

    /// Read the file, POST its text and incrementally parse the streamed
    /// response. Returns the parsed object, or `None` when the stream ended
    /// without ever parsing (the viewer then stays in its no-data state).
    #[instrument(skip(self))]
    pub async fn process(&self, path: &Path) -> Result<Option<Value>, UploadError> {
        let name = file_name(path);
        if !is_txt(path) {
            self.analytics.capture(
                "file_upload_error",
                json!({ "error": "invalid_file_type", "file_name": name }),
            );
            return Err(UploadError::InvalidFileType);
        }

        let text = tokio::fs::read_to_string(path).await?;
        let file_size = text.len() as u64;
        self.analytics.capture(
            "file_processing_started",
            json!({ "file_name": name, "file_size": file_size }),
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| {
                self.capture_error(&name, file_size, &e.to_string());
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            self.capture_error(&name, file_size, &format!("status {status}"));
            return Err(UploadError::BadStatus(status));
        }

        let mut consumer = StreamConsumer::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    if let Some(data) = consumer.push(&bytes) {
                        info!(file_name = %name, "file processed");
                        self.analytics.capture(
                            "file_processed_successfully",
                            json!({
                                "file_name": name,
                                "file_size": file_size,
                                "data_size": data.to_string().len(),
                            }),
                        );
                        self.emit(UploadEvent::FileProcessed {
                            data: data.clone(),
                            file_name: name.clone(),
                            file_size,
                        });
                    }
                }
                Err(e) => {
                    consumer.fail();
                    self.capture_error(&name, file_size, &e.to_string());
                    return Err(e.into());
                }
            }
        }

        Ok(consumer.finish())
    }

    fn emit(&self, event: UploadEvent) {
        // The viewer may have gone away; dropped events are fine.
        let _ = self.events.send(event);
    }

    fn capture_error(&self, name: &str, file_size: u64, error: &str) {
        warn!(file_name = %name, error = %error, "file processing failed");
        self.analytics.capture(
            "file_processing_error",
            json!({ "file_name": name, "file_size": file_size, "error": error }),
        );
    }
}

fn is_txt(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::NoopAnalytics;
    use crate::client::events;
    use axum::{routing::post, Router};
    use bytes::Bytes;
    use serde_json::json;
    use std::io::Write;
    use std::sync::Mutex;

    struct RecordingAnalytics(Mutex<Vec<String>>);

    impl Analytics for RecordingAnalytics {
        fn capture(&self, event: &str, _properties: Value) {
            self.0.lock().unwrap().push(event.to_string());
        }
    }

    fn uploader_with(
        endpoint: &str,
        analytics: Arc<dyn Analytics>,
    ) -> (Uploader, events::EventReceiver) {
        let (tx, rx) = events::channel();
        (
            Uploader::new(endpoint, reqwest::Client::new(), analytics, tx),
            rx,
        )
    }

    #[test]
    fn txt_extension_check_is_case_insensitive() {
        assert!(is_txt(Path::new("notes.txt")));
        assert!(is_txt(Path::new("NOTES.TXT")));
        assert!(!is_txt(Path::new("data.json")));
        assert!(!is_txt(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn non_txt_file_is_rejected_with_no_network_call() {
        let recording = Arc::new(RecordingAnalytics(Mutex::new(Vec::new())));
        // Port 1 is unroutable; reaching the network would fail differently.
        let (uploader, _rx) = uploader_with("http://127.0.0.1:1/api/extract", recording.clone());

        let err = uploader
            .process(Path::new("resume.pdf"))
            .await
            .expect_err("must be rejected");
        assert!(matches!(err, UploadError::InvalidFileType));
        assert_eq!(
            *recording.0.lock().unwrap(),
            vec!["file_upload_error".to_string()]
        );
    }

    #[test]
    fn select_emits_file_selected_for_txt() {
        let (tx, mut rx) = events::channel();
        let uploader = Uploader::new(
            "http://localhost/api/extract",
            reqwest::Client::new(),
            Arc::new(NoopAnalytics),
            tx,
        );
        uploader.select(Path::new("profile.txt")).expect("accepted");
        assert_eq!(
            rx.try_recv().unwrap(),
            UploadEvent::FileSelected {
                file_name: Some("profile.txt".into())
            }
        );

        uploader.clear(Some("profile.txt"));
        assert_eq!(
            rx.try_recv().unwrap(),
            UploadEvent::FileSelected { file_name: None }
        );
    }

    async fn spawn_extract_stub(chunks: Vec<&'static str>) -> String {
        let app = Router::new().route(
            "/api/extract",
            post(move || {
                let chunks = chunks.clone();
                async move {
                    let stream = futures::stream::iter(
                        chunks
                            .into_iter()
                            .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c.as_bytes()))),
                    );
                    axum::body::Body::from_stream(stream)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/extract")
    }

    #[tokio::test]
    async fn processes_a_stream_whose_final_chunk_completes_the_json() {
        let endpoint =
            spawn_extract_stub(vec!["{\"fullName\":", "\"Ada\",", "\"age\":28}"]).await;

        let mut file = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        write!(file, "Ada, 28, London").unwrap();

        let (uploader, mut rx) = uploader_with(&endpoint, Arc::new(NoopAnalytics));
        let result = uploader.process(file.path()).await.expect("processes");
        assert_eq!(result, Some(json!({"fullName": "Ada", "age": 28})));

        match rx.try_recv().unwrap() {
            UploadEvent::FileProcessed { data, file_size, .. } => {
                assert_eq!(data, json!({"fullName": "Ada", "age": 28}));
                assert_eq!(file_size, "Ada, 28, London".len() as u64);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx.try_recv().is_err(), "done must be emitted exactly once");
    }

    #[tokio::test]
    async fn unparseable_stream_ends_with_no_result_and_no_panic() {
        let endpoint = spawn_extract_stub(vec!["definitely", " not json"]).await;

        let mut file = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        write!(file, "some text").unwrap();

        let (uploader, mut rx) = uploader_with(&endpoint, Arc::new(NoopAnalytics));
        let result = uploader.process(file.path()).await.expect("no transport error");
        assert_eq!(result, None);
        assert!(rx.try_recv().is_err(), "no FileProcessed event");
    }
}
