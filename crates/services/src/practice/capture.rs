use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use prep_core::model::CapturedAudio;
use prep_core::{Clock, DeviceError};
use tracing::debug;

/// Source of microphone input.
pub trait AudioInput: Send + Sync {
    /// Acquire the input exclusively and start recording.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Unavailable` if there is no input device, or
    /// `DeviceError::PermissionDenied` if access was refused.
    fn open(&self) -> Result<Box<dyn AudioStream>, DeviceError>;
}

/// A recording in progress. Dropping it must release the device.
pub trait AudioStream: Send {
    fn mime_type(&self) -> &str;

    /// Stop recording, release the device and return the encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Io` if the recording could not be finalized.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, DeviceError>;
}

/// Input for environments without a microphone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudioInput;

impl AudioInput for NoAudioInput {
    fn open(&self) -> Result<Box<dyn AudioStream>, DeviceError> {
        Err(DeviceError::Unavailable)
    }
}

struct ActiveCapture {
    stream: Box<dyn AudioStream>,
    started_at: DateTime<Utc>,
}

/// Audio capture sub-flow. At most one capture is active at a time.
pub struct CaptureController {
    input: Arc<dyn AudioInput>,
    clock: Clock,
    active: Option<ActiveCapture>,
}

impl CaptureController {
    #[must_use]
    pub fn new(input: Arc<dyn AudioInput>, clock: Clock) -> Self {
        Self {
            input,
            clock,
            active: None,
        }
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    /// Seconds recorded so far by the active capture.
    #[must_use]
    pub fn elapsed_secs(&self) -> Option<u32> {
        self.active
            .as_ref()
            .map(|active| self.clock.seconds_since(active.started_at))
    }

    /// # Errors
    ///
    /// Returns `DeviceError::CaptureAlreadyActive` if a capture is running (it
    /// keeps running), or the device error from `AudioInput::open`.
    pub fn start(&mut self) -> Result<(), DeviceError> {
        if self.active.is_some() {
            return Err(DeviceError::CaptureAlreadyActive);
        }
        let stream = self.input.open()?;
        debug!(mime = stream.mime_type(), "audio capture started");
        self.active = Some(ActiveCapture {
            stream,
            started_at: self.clock.now(),
        });
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DeviceError::NoActiveCapture` if nothing is recording, or the
    /// error from finalizing the stream. The device is released either way.
    pub fn stop(&mut self) -> Result<CapturedAudio, DeviceError> {
        let active = self.active.take().ok_or(DeviceError::NoActiveCapture)?;
        let recorded_secs = self.clock.seconds_since(active.started_at);
        let mime_type = active.stream.mime_type().to_owned();
        let bytes = active.stream.finish()?;
        debug!(bytes = bytes.len(), recorded_secs, "audio capture stopped");
        Ok(CapturedAudio::new(bytes, mime_type, recorded_secs))
    }

    /// Abandon any active capture, releasing the device.
    pub fn release(&mut self) {
        if self.active.take().is_some() {
            debug!("audio capture released");
        }
    }
}

impl fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureController")
            .field("capturing", &self.is_capturing())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
