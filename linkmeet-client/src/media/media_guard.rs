use crate::media::media_devices::{CaptureStream, LocalTrack, TrackKind};
use tracing::debug;

/// Owns a capture stream and stops it exactly once: on [`MediaGuard::release`]
/// or, failing that, when dropped.
pub struct MediaGuard {
    stream: Option<Box<dyn CaptureStream>>,
}

impl MediaGuard {
    pub fn new(stream: Box<dyn CaptureStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn tracks(&self) -> Vec<LocalTrack> {
        self.stream
            .as_ref()
            .map(|s| s.tracks())
            .unwrap_or_default()
    }

    pub fn set_enabled(&mut self, kind: TrackKind, enabled: bool) {
        if let Some(stream) = self.stream.as_mut() {
            stream.set_enabled(kind, enabled);
        }
    }

    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("Releasing local capture devices");
            stream.stop();
        }
    }
}

impl Drop for MediaGuard {
    fn drop(&mut self) {
        self.stop();
    }
}
