use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use super::events::UploadEvent;
use crate::analytics::Analytics;

/// File name used by [`JsonViewer::download_json`].
pub const DOWNLOAD_FILE_NAME: &str = "extracted-data.json";

/// Pure rendering over the extracted object. Holds no data until a
/// `FileProcessed` event arrives; side effects happen only on explicit
/// copy/download calls.
pub struct JsonViewer {
    data: Option<Value>,
    analytics: Arc<dyn Analytics>,
}

impl JsonViewer {
    pub fn new(analytics: Arc<dyn Analytics>) -> Self {
        Self {
            data: None,
            analytics,
        }
    }

    /// Apply an uploader message: a new/removed file clears the view, a
    /// processed file replaces the data.
    pub fn apply(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::FileSelected { .. } => self.data = None,
            UploadEvent::FileProcessed { data, .. } => self.data = Some(data),
        }
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Tree view with null leaves rendered as a literal `None` placeholder.
    pub fn render_pretty(&self) -> Option<String> {
        self.data.as_ref().map(render_value)
    }

    /// Raw tab: plain pretty-printed JSON.
    pub fn render_raw(&self) -> Option<String> {
        self.data
            .as_ref()
            .map(|d| serde_json::to_string_pretty(d).unwrap_or_default())
    }

    /// Serialized payload for the clipboard. Re-parsing it yields exactly the
    /// object received from the stream.
    pub fn copy_json(&self) -> Option<String> {
        let data = self.data.as_ref()?;
        let payload = serde_json::to_string_pretty(data).unwrap_or_default();
        self.analytics
            .capture("json_copied", json!({ "data_size": payload.len() }));
        Some(payload)
    }

    /// Write the object to `extracted-data.json` in the given directory.
    pub fn download_json(&self, dir: &Path) -> anyhow::Result<Option<PathBuf>> {
        let Some(data) = self.data.as_ref() else {
            return Ok(None);
        };
        let payload = serde_json::to_string_pretty(data)?;
        let path = dir.join(DOWNLOAD_FILE_NAME);
        std::fs::write(&path, &payload)?;
        self.analytics
            .capture("json_downloaded", json!({ "data_size": payload.len() }));
        Ok(Some(path))
    }
}

/// Recursive tree rendering: quoted object keys, bracketed arrays, `None` for
/// null leaves.
pub fn render_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

// String serialization to a `String` cannot fail; the fallback never runs.
fn write_quoted(out: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => out.push_str("\"\""),
    }
}

fn write_value(out: &mut String, value: &Value, level: usize) {
    let pad = "  ".repeat(level + 1);
    let close = "  ".repeat(level);
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_quoted(out, s),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&pad);
                write_value(out, item, level + 1);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&close);
            out.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                out.push_str(&pad);
                write_quoted(out, key);
                out.push_str(": ");
                write_value(out, item, level + 1);
                if i + 1 < map.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&close);
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::NoopAnalytics;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "fullName": "Ada Lovelace",
            "age": 28,
            "jobTitle": null,
            "hobbies": ["mathematics", "poetry"],
            "favouriteColor": "green"
        })
    }

    fn viewer_with(data: Value) -> JsonViewer {
        let mut viewer = JsonViewer::new(Arc::new(NoopAnalytics));
        viewer.apply(UploadEvent::FileProcessed {
            data,
            file_name: "profile.txt".into(),
            file_size: 42,
        });
        viewer
    }

    #[test]
    fn starts_empty_and_clears_on_new_file() {
        let mut viewer = viewer_with(sample());
        assert!(viewer.data().is_some());

        viewer.apply(UploadEvent::FileSelected {
            file_name: Some("other.txt".into()),
        });
        assert!(viewer.data().is_none());
        assert!(viewer.render_pretty().is_none());
        assert!(viewer.copy_json().is_none());
    }

    #[test]
    fn null_leaves_render_as_none_placeholder() {
        let viewer = viewer_with(sample());
        let pretty = viewer.render_pretty().unwrap();
        assert!(pretty.contains("\"jobTitle\": None"));
        assert!(pretty.contains("\"fullName\": \"Ada Lovelace\""));
        assert!(pretty.contains("\"mathematics\","));
    }

    #[test]
    fn string_leaves_and_keys_are_escaped() {
        let rendered = render_value(&json!({ "quo\"te": "say \"hi\"\\" }));
        assert!(rendered.contains(r#""quo\"te": "say \"hi\"\\""#));
    }

    #[test]
    fn copy_json_round_trips_to_the_original_object() {
        let viewer = viewer_with(sample());
        let payload = viewer.copy_json().unwrap();
        let reparsed: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(reparsed, sample());
    }

    #[test]
    fn download_writes_the_named_file() {
        let viewer = viewer_with(sample());
        let dir = tempfile::tempdir().unwrap();
        let path = viewer.download_json(dir.path()).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), DOWNLOAD_FILE_NAME);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, sample());
    }

    #[test]
    fn download_without_data_is_a_no_op() {
        let viewer = JsonViewer::new(Arc::new(NoopAnalytics));
        let dir = tempfile::tempdir().unwrap();
        assert!(viewer.download_json(dir.path()).unwrap().is_none());
        assert!(!dir.path().join(DOWNLOAD_FILE_NAME).exists());
    }

    #[test]
    fn scalar_rendering() {
        assert_eq!(render_value(&json!(null)), "None");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!(28)), "28");
        assert_eq!(render_value(&json!("x")), "\"x\"");
        assert_eq!(render_value(&json!([])), "[]");
        assert_eq!(render_value(&json!({})), "{}");
    }
}
