use async_trait::async_trait;
use linkmeet_client::{
    CaptureStream, LocalTrack, MediaConstraints, MediaDevices, MediaError, TrackKind,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
struct DeviceState {
    acquires: AtomicUsize,
    stops: AtomicUsize,
    audio_enabled: AtomicBool,
    video_enabled: AtomicBool,
}

/// Capture devices that count acquisitions and releases.
#[derive(Clone, Default)]
pub struct MockDevices {
    label: String,
    deny: bool,
    state: Arc<DeviceState>,
}

impl MockDevices {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            ..Self::default()
        }
    }

    /// Devices that refuse every acquisition.
    pub fn denied(label: &str) -> Self {
        Self {
            deny: true,
            ..Self::new(label)
        }
    }

    pub fn acquires(&self) -> usize {
        self.state.acquires.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.state.stops.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Audio => self.state.audio_enabled.load(Ordering::SeqCst),
            TrackKind::Video => self.state.video_enabled.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl MediaDevices for MockDevices {
    async fn acquire(
        &self,
        _constraints: MediaConstraints,
    ) -> Result<Box<dyn CaptureStream>, MediaError> {
        if self.deny {
            return Err(MediaError::PermissionDenied);
        }

        self.state.acquires.fetch_add(1, Ordering::SeqCst);
        self.state.audio_enabled.store(true, Ordering::SeqCst);
        self.state.video_enabled.store(true, Ordering::SeqCst);

        Ok(Box::new(MockStream {
            label: self.label.clone(),
            state: self.state.clone(),
        }))
    }
}

struct MockStream {
    label: String,
    state: Arc<DeviceState>,
}

impl CaptureStream for MockStream {
    fn tracks(&self) -> Vec<LocalTrack> {
        vec![
            LocalTrack {
                id: format!("{}-audio", self.label),
                stream_id: self.label.clone(),
                kind: TrackKind::Audio,
            },
            LocalTrack {
                id: format!("{}-video", self.label),
                stream_id: self.label.clone(),
                kind: TrackKind::Video,
            },
        ]
    }

    fn set_enabled(&mut self, kind: TrackKind, enabled: bool) {
        match kind {
            TrackKind::Audio => self.state.audio_enabled.store(enabled, Ordering::SeqCst),
            TrackKind::Video => self.state.video_enabled.store(enabled, Ordering::SeqCst),
        }
    }

    fn stop(&mut self) {
        self.state.stops.fetch_add(1, Ordering::SeqCst);
    }
}
