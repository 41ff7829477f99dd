//! Client-side counterparts of the upload and viewer widgets: a buffering
//! stream consumer, a file uploader driving it, and a pure-rendering JSON
//! viewer. The widgets are decoupled through typed [`events::UploadEvent`]
//! messages instead of ambient broadcast.

pub mod consumer;
pub mod events;
pub mod uploader;
pub mod viewer;
