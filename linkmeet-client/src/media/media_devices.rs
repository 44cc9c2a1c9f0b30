use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A captured local track as the negotiator sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("capture permission denied")]
    PermissionDenied,

    #[error("no {0:?} capture device available")]
    DeviceUnavailable(TrackKind),

    #[error("capture failed: {0}")]
    Capture(String),
}

/// A live capture session holding device resources until stopped.
pub trait CaptureStream: Send {
    fn tracks(&self) -> Vec<LocalTrack>;

    /// Mutes or unmutes every track of `kind` without releasing the device.
    fn set_enabled(&mut self, kind: TrackKind, enabled: bool);

    /// Releases the devices. Called at most once, by [`crate::MediaGuard`].
    fn stop(&mut self);
}

#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn CaptureStream>, MediaError>;
}
