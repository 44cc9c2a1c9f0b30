use crate::media::{LocalTrack, TrackKind};
use crate::negotiator::negotiator::{Negotiator, NegotiatorError};
use crate::negotiator::negotiator_event::{NegotiatorEvent, RemoteTrackInfo};
use async_trait::async_trait;
use linkmeet_core::{IceServerConfig, SdpType, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Default upper bound on ICE gathering before a description is handed out.
pub const DEFAULT_GATHER_TIMEOUT: Duration = Duration::from_secs(3);

/// webrtc-rs backed negotiator.
///
/// Candidates are not trickled: every description it produces already carries
/// whatever was gathered within `gather_timeout`.
pub struct RtcNegotiator {
    peer_connection: Arc<RTCPeerConnection>,
    /// Set once a remote description has been applied. Negotiation-needed is
    /// suppressed before that, the first offer covers the initial tracks.
    established: Arc<AtomicBool>,
    local_tracks: HashMap<String, Arc<TrackLocalStaticSample>>,
    pending_offer: Option<String>,
    gather_timeout: Duration,
    closed: bool,
}

impl RtcNegotiator {
    pub async fn new(
        ice_servers: &[IceServerConfig],
        gather_timeout: Duration,
        event_tx: mpsc::UnboundedSender<NegotiatorEvent>,
    ) -> Result<Self, NegotiatorError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let established = Arc::new(AtomicBool::new(false));

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    if matches!(
                        s,
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
                    ) {
                        let _ = tx.send(NegotiatorEvent::ConnectionLost);
                    }
                })
            },
        ));

        let nego_tx = event_tx.clone();
        let nego_established = Arc::clone(&established);
        peer_connection.on_negotiation_needed(Box::new(move || {
            let tx = nego_tx.clone();
            let established = Arc::clone(&nego_established);

            Box::pin(async move {
                if established.load(Ordering::SeqCst) {
                    debug!("Negotiation needed");
                    let _ = tx.send(NegotiatorEvent::NegotiationNeeded);
                }
            })
        }));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    other => {
                        warn!("Ignoring remote track of kind {:?}", other);
                        return;
                    }
                };
                let info = RemoteTrackInfo {
                    track_id: track.id().to_string(),
                    stream_id: track.stream_id().to_string(),
                    kind,
                };
                info!("Remote {:?} track {} arrived", info.kind, info.track_id);
                let _ = tx.send(NegotiatorEvent::RemoteTrack(info));
            })
        }));

        Ok(Self {
            peer_connection,
            established,
            local_tracks: HashMap::new(),
            pending_offer: None,
            gather_timeout,
            closed: false,
        })
    }

    /// The sample sink behind an attached local track, for feeding frames.
    pub fn local_track(&self, id: &str) -> Option<Arc<TrackLocalStaticSample>> {
        self.local_tracks.get(id).cloned()
    }

    fn ensure_open(&self) -> Result<(), NegotiatorError> {
        if self.closed {
            return Err(NegotiatorError::Closed);
        }
        Ok(())
    }

    /// Installs `description` locally and waits (bounded) for ICE gathering so
    /// the returned SDP is complete.
    async fn set_local_and_gather(
        &self,
        description: RTCSessionDescription,
    ) -> Result<String, NegotiatorError> {
        let mut gathering_complete = self.peer_connection.gathering_complete_promise().await;

        self.peer_connection
            .set_local_description(description)
            .await?;

        if tokio::time::timeout(self.gather_timeout, gathering_complete.recv())
            .await
            .is_err()
        {
            warn!(
                "ICE gathering did not finish within {:?}, sending partial candidates",
                self.gather_timeout
            );
        }

        let local = self
            .peer_connection
            .local_description()
            .await
            .ok_or(NegotiatorError::MissingLocalDescription)?;
        Ok(local.sdp)
    }

    /// Gives a track-less offerer one recvonly audio and one recvonly video
    /// section, so the first offer carries ICE credentials. Tracks attached
    /// afterwards get sendrecv sections of their own in the next round.
    async fn ensure_receivers(&self) -> Result<(), NegotiatorError> {
        if !self.peer_connection.get_transceivers().await.is_empty() {
            return Ok(());
        }

        for kind in [RTPCodecType::Audio, RTPCodecType::Video] {
            self.peer_connection
                .add_transceiver_from_kind(
                    kind,
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await?;
        }
        debug!("Added recvonly audio and video transceivers");
        Ok(())
    }

    fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription, NegotiatorError> {
        let rtc = match description.kind {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
        };
        Ok(rtc)
    }
}

#[async_trait]
impl Negotiator for RtcNegotiator {
    async fn produce_offer(&mut self) -> Result<SessionDescription, NegotiatorError> {
        self.ensure_open()?;
        self.ensure_receivers().await?;

        let offer = self.peer_connection.create_offer(None).await?;
        let sdp = self.set_local_and_gather(offer).await?;
        self.pending_offer = Some(sdp.clone());

        Ok(SessionDescription::offer(sdp))
    }

    async fn produce_answer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiatorError> {
        self.ensure_open()?;
        if offer.kind != SdpType::Offer {
            return Err(NegotiatorError::UnexpectedDescription {
                expected: SdpType::Offer,
                got: offer.kind,
            });
        }

        self.peer_connection
            .set_remote_description(Self::to_rtc(offer)?)
            .await?;
        self.established.store(true, Ordering::SeqCst);

        let answer = self.peer_connection.create_answer(None).await?;
        let sdp = self.set_local_and_gather(answer).await?;

        Ok(SessionDescription::answer(sdp))
    }

    async fn apply_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiatorError> {
        self.ensure_open()?;

        let is_answer = !description.is_offer();
        self.peer_connection
            .set_remote_description(Self::to_rtc(description)?)
            .await?;
        if is_answer {
            self.pending_offer = None;
        }
        self.established.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn attach_local_track(&mut self, track: &LocalTrack) -> Result<(), NegotiatorError> {
        self.ensure_open()?;
        if self.local_tracks.contains_key(&track.id) {
            debug!("Track {} already attached", track.id);
            return Ok(());
        }

        let mime_type = match track.kind {
            TrackKind::Audio => MIME_TYPE_OPUS,
            TrackKind::Video => MIME_TYPE_VP8,
        };
        let local = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            track.id.clone(),
            track.stream_id.clone(),
        ));

        let sender = self
            .peer_connection
            .add_track(Arc::clone(&local) as Arc<dyn TrackLocal + Send + Sync>)
            .await?;

        // RTCP has to be drained for the interceptors to work.
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while sender.read(&mut rtcp_buf).await.is_ok() {}
        });

        info!("Attached local {:?} track {}", track.kind, track.id);
        self.local_tracks.insert(track.id.clone(), local);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), NegotiatorError> {
        self.ensure_open()?;
        let Some(sdp) = self.pending_offer.take() else {
            return Ok(());
        };

        let mut rollback = RTCSessionDescription::default();
        rollback.sdp_type = RTCSdpType::Rollback;
        rollback.sdp = sdp;
        self.peer_connection.set_local_description(rollback).await?;

        debug!("Rolled back local offer");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), NegotiatorError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.peer_connection.close().await?;
        Ok(())
    }
}
