use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use prep_core::DeviceError;
use tracing::debug;

use super::capture::{AudioInput, AudioStream};

/// Audio input that answers with a clip recorded ahead of time.
///
/// Opening checks that the clip exists and has a known container; the bytes
/// are read when the capture is stopped, so the file may be re-recorded
/// between questions.
#[derive(Debug, Clone)]
pub struct AudioFileInput {
    path: PathBuf,
}

impl AudioFileInput {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "webm" => Some("audio/webm"),
        "ogg" | "oga" | "opus" => Some("audio/ogg"),
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        _ => None,
    }
}

fn device_error(err: &std::io::Error) -> DeviceError {
    match err.kind() {
        ErrorKind::NotFound => DeviceError::Unavailable,
        ErrorKind::PermissionDenied => DeviceError::PermissionDenied,
        _ => DeviceError::Io(err.to_string()),
    }
}

impl AudioInput for AudioFileInput {
    fn open(&self) -> Result<Box<dyn AudioStream>, DeviceError> {
        let meta = std::fs::metadata(&self.path).map_err(|err| device_error(&err))?;
        if !meta.is_file() {
            return Err(DeviceError::Unavailable);
        }
        let mime_type = mime_for(&self.path).ok_or_else(|| {
            DeviceError::Io(format!("unsupported audio file: {}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), mime_type, "using recorded clip");
        Ok(Box::new(FileStream {
            path: self.path.clone(),
            mime_type,
        }))
    }
}

struct FileStream {
    path: PathBuf,
    mime_type: &'static str,
}

impl AudioStream for FileStream {
    fn mime_type(&self) -> &str {
        self.mime_type
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, DeviceError> {
        let bytes = std::fs::read(&self.path).map_err(|err| DeviceError::Io(err.to_string()))?;
        if bytes.is_empty() {
            return Err(DeviceError::Io(format!("{} is empty", self.path.display())));
        }
        Ok(bytes)
    }
}
