use crate::media::media_devices::{
    CaptureStream, LocalTrack, MediaConstraints, MediaDevices, MediaError, TrackKind,
};
use async_trait::async_trait;
use tracing::{debug, info};

/// Capture source for machines without cameras: declares tracks, produces no frames.
///
/// Negotiation proceeds exactly as with real devices, which is what the CLI
/// participant needs.
#[derive(Debug, Clone)]
pub struct HeadlessDevices {
    label: String,
}

impl HeadlessDevices {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[async_trait]
impl MediaDevices for HeadlessDevices {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn CaptureStream>, MediaError> {
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(self.track(TrackKind::Audio));
        }
        if constraints.video {
            tracks.push(self.track(TrackKind::Video));
        }

        info!("Headless capture opened with {} track(s)", tracks.len());

        Ok(Box::new(HeadlessStream { tracks }))
    }
}

impl HeadlessDevices {
    fn track(&self, kind: TrackKind) -> LocalTrack {
        let suffix = match kind {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        };
        LocalTrack {
            id: format!("{}-{}", self.label, suffix),
            stream_id: self.label.clone(),
            kind,
        }
    }
}

struct HeadlessStream {
    tracks: Vec<LocalTrack>,
}

impl CaptureStream for HeadlessStream {
    fn tracks(&self) -> Vec<LocalTrack> {
        self.tracks.clone()
    }

    // No frames are produced, so there is nothing to mute.
    fn set_enabled(&mut self, kind: TrackKind, enabled: bool) {
        debug!("Headless {:?} capture enabled: {}", kind, enabled);
    }

    fn stop(&mut self) {
        info!("Headless capture stopped");
        self.tracks.clear();
    }
}
