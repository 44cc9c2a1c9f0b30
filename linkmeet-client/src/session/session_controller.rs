use crate::media::{MediaConstraints, MediaDevices, MediaGuard, TrackKind};
use crate::negotiator::{Negotiator, NegotiatorEvent};
use crate::session::negotiation_state::{NegotiationKind, NegotiationState, Role};
use crate::session::session_error::SessionError;
use crate::session::session_event::{EndReason, SessionEvent, SessionUpdate, UserCommand};
use crate::signaling::SignalSink;
use linkmeet_core::{ClientMessage, ConnectionId, ServerMessage, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The other participant, as far as this side knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: ConnectionId,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaToggles {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaToggles {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

impl MediaToggles {
    fn get(&self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Audio => self.audio,
            TrackKind::Video => self.video,
        }
    }

    fn set(&mut self, kind: TrackKind, enabled: bool) {
        match kind {
            TrackKind::Audio => self.audio = enabled,
            TrackKind::Video => self.video = enabled,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlightOffer {
    kind: NegotiationKind,
    /// State to fall back to if the offer is rolled back or fails.
    resume: NegotiationState,
}

/// Per-participant negotiation state machine.
///
/// Handlers run to completion one at a time. At most one local offer is in
/// flight; renegotiation requested meanwhile is replayed once settled.
pub struct SessionController {
    local_id: ConnectionId,
    peer: Option<PeerInfo>,
    state: NegotiationState,
    in_flight: Option<InFlightOffer>,
    renegotiate_when_stable: bool,
    ended: Option<EndReason>,

    negotiator: Box<dyn Negotiator>,
    signals: Arc<dyn SignalSink>,
    devices: Arc<dyn MediaDevices>,
    constraints: MediaConstraints,

    media: Option<MediaGuard>,
    tracks_attached: bool,
    toggles: MediaToggles,
    remote_video_on: bool,

    updates: mpsc::UnboundedSender<SessionUpdate>,
}

impl SessionController {
    pub fn new(
        local_id: ConnectionId,
        negotiator: Box<dyn Negotiator>,
        signals: Arc<dyn SignalSink>,
        devices: Arc<dyn MediaDevices>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionUpdate>) {
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let controller = Self {
            local_id,
            peer: None,
            state: NegotiationState::Idle,
            in_flight: None,
            renegotiate_when_stable: false,
            ended: None,
            negotiator,
            signals,
            devices,
            constraints: MediaConstraints::default(),
            media: None,
            tracks_attached: false,
            toggles: MediaToggles::default(),
            remote_video_on: true,
            updates,
        };
        (controller, updates_rx)
    }

    pub fn with_constraints(mut self, constraints: MediaConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn local_id(&self) -> ConnectionId {
        self.local_id
    }

    pub fn peer(&self) -> Option<&PeerInfo> {
        self.peer.as_ref()
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn role(&self) -> Option<Role> {
        self.peer
            .as_ref()
            .map(|p| Role::between(&self.local_id, &p.id))
    }

    pub fn toggles(&self) -> MediaToggles {
        self.toggles
    }

    pub fn remote_video_on(&self) -> bool {
        self.remote_video_on
    }

    pub fn has_local_media(&self) -> bool {
        self.media.is_some()
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.ended
    }

    pub fn is_ended(&self) -> bool {
        self.ended.is_some()
    }

    /// Drives the controller until the session ends.
    ///
    /// A closed inbound channel counts as transport closure, a dropped command
    /// sender as a local leave.
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<ServerMessage>,
        mut negotiator_events: mpsc::UnboundedReceiver<NegotiatorEvent>,
        mut commands: mpsc::Receiver<UserCommand>,
    ) -> EndReason {
        info!("Session controller started for {}", self.local_id);

        loop {
            let event = tokio::select! {
                msg = inbound.recv() => match msg {
                    Some(msg) => SessionEvent::Signal(msg),
                    None => SessionEvent::TransportClosed,
                },
                Some(evt) = negotiator_events.recv() => SessionEvent::Negotiator(evt),
                cmd = commands.recv() => match cmd {
                    Some(cmd) => SessionEvent::Command(cmd),
                    None => SessionEvent::Command(UserCommand::Leave),
                },
            };

            if let Err(e) = self.handle(event).await {
                warn!("Session event failed: {}", e);
            }

            if let Some(reason) = self.ended {
                info!("Session controller stopped: {:?}", reason);
                return reason;
            }
        }
    }

    pub async fn handle(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        if self.ended.is_some() {
            return Err(SessionError::Ended);
        }

        match event {
            SessionEvent::Signal(msg) => self.on_signal(msg).await,
            SessionEvent::Negotiator(evt) => self.on_negotiator_event(evt).await,
            SessionEvent::Command(cmd) => self.on_command(cmd).await,
            SessionEvent::TransportClosed => {
                self.end(EndReason::TransportClosed).await;
                Ok(())
            }
        }
    }

    async fn on_signal(&mut self, msg: ServerMessage) -> Result<(), SessionError> {
        debug!("Signal '{}'", msg.event_name());

        match msg {
            ServerMessage::Welcome { id, .. } => {
                self.local_id = id;
                self.emit(SessionUpdate::Welcome { id });
                Ok(())
            }
            ServerMessage::RoomJoined { room } => {
                info!("Joined room '{}'", room);
                self.emit(SessionUpdate::RoomJoined { room });
                Ok(())
            }
            ServerMessage::RoomFull { room } => {
                warn!("Room '{}' is full", room);
                self.emit(SessionUpdate::RoomFull { room });
                Ok(())
            }
            ServerMessage::UserJoined { email, id } => {
                info!("Email {} joined room", email);
                self.peer = Some(PeerInfo {
                    id,
                    email: Some(email.clone()),
                });
                self.emit(SessionUpdate::PeerJoined { id, email });
                Ok(())
            }
            ServerMessage::UserLeft { id } => {
                if self.is_peer(&id) {
                    self.end(EndReason::PeerLeft).await;
                } else {
                    debug!("Ignoring departure of non-peer {}", id);
                }
                Ok(())
            }
            ServerMessage::IncomingCall { from, offer } => {
                self.accept_offer(from, offer, NegotiationKind::Call).await
            }
            ServerMessage::CallAccepted { from, ans } => {
                self.complete_offer(from, ans, NegotiationKind::Call).await
            }
            ServerMessage::NegotiationNeeded { from, offer } => {
                self.accept_offer(from, offer, NegotiationKind::Renegotiation)
                    .await
            }
            ServerMessage::NegotiationFinal { from, ans } => {
                self.complete_offer(from, ans, NegotiationKind::Renegotiation)
                    .await
            }
            ServerMessage::VideoToggle { from, is_on } => {
                if !self.is_peer(&from) {
                    debug!("Ignoring video toggle from non-peer {}", from);
                } else if self.remote_video_on != is_on {
                    self.remote_video_on = is_on;
                    self.emit(SessionUpdate::RemoteVideo(is_on));
                }
                Ok(())
            }
        }
    }

    async fn on_negotiator_event(&mut self, evt: NegotiatorEvent) -> Result<(), SessionError> {
        match evt {
            NegotiatorEvent::NegotiationNeeded => self.request_negotiation().await,
            NegotiatorEvent::RemoteTrack(track) => {
                info!("Got remote {:?} track {}", track.kind, track.track_id);
                self.emit(SessionUpdate::RemoteTrack(track));
                Ok(())
            }
            NegotiatorEvent::ConnectionLost => {
                self.end(EndReason::ConnectionLost).await;
                Ok(())
            }
        }
    }

    async fn on_command(&mut self, cmd: UserCommand) -> Result<(), SessionError> {
        match cmd {
            UserCommand::StartCall => {
                let peer = self.peer_id().ok_or(SessionError::NoPeer)?;
                if self.state != NegotiationState::Idle {
                    return Err(SessionError::InvalidState {
                        operation: "start a call",
                        state: self.state,
                    });
                }
                self.acquire_media().await?;
                self.send_offer(peer, NegotiationKind::Call).await
            }
            UserCommand::SendStreams => self.send_streams().await,
            UserCommand::ToggleAudio => {
                self.toggle(TrackKind::Audio).await;
                Ok(())
            }
            UserCommand::ToggleVideo => {
                self.toggle(TrackKind::Video).await;
                Ok(())
            }
            UserCommand::Leave => {
                self.end(EndReason::LocalLeave).await;
                Ok(())
            }
        }
    }

    /// Answers a remote offer, resolving collisions with our own offer by role.
    async fn accept_offer(
        &mut self,
        from: ConnectionId,
        offer: SessionDescription,
        kind: NegotiationKind,
    ) -> Result<(), SessionError> {
        match self.peer_id() {
            Some(id) if id == from => {}
            Some(_) if kind == NegotiationKind::Renegotiation => {
                warn!("Ignoring renegotiation offer from non-peer {}", from);
                return Ok(());
            }
            _ => {
                info!("Incoming call from {}", from);
                self.peer = Some(PeerInfo {
                    id: from,
                    email: None,
                });
            }
        }

        if kind == NegotiationKind::Call && self.media.is_none() {
            self.acquire_media().await?;
        }

        if self.state == NegotiationState::OfferSent {
            match Role::between(&self.local_id, &from) {
                Role::Impolite => {
                    info!("Offer collision with {}, keeping ours", from);
                    return Ok(());
                }
                Role::Polite => {
                    info!("Offer collision with {}, rolling back ours", from);
                    self.negotiator.rollback().await?;
                    if let Some(flight) = self.in_flight.take() {
                        self.state = flight.resume;
                        if flight.kind == NegotiationKind::Renegotiation
                            || kind == NegotiationKind::Renegotiation
                        {
                            self.renegotiate_when_stable = true;
                        }
                    }
                }
            }
        }

        let resume = self.state;
        self.state = NegotiationState::AnswerPending;
        let answer = match self.negotiator.produce_answer(offer).await {
            Ok(answer) => answer,
            Err(e) => {
                self.state = resume;
                return Err(e.into());
            }
        };

        match kind {
            NegotiationKind::Call => {
                self.state = NegotiationState::Stable;
                self.signals
                    .send(ClientMessage::CallAccepted {
                        to: from,
                        ans: answer,
                    })
                    .await;
                self.emit(SessionUpdate::CallEstablished {
                    peer: from,
                    initiated: false,
                });
            }
            NegotiationKind::Renegotiation => {
                self.state = resume;
                self.signals
                    .send(ClientMessage::NegotiationDone {
                        to: from,
                        ans: answer,
                    })
                    .await;
            }
        }

        self.flush_pending_negotiation().await
    }

    /// Applies the answer to our in-flight offer; anything else is stale.
    async fn complete_offer(
        &mut self,
        from: ConnectionId,
        answer: SessionDescription,
        kind: NegotiationKind,
    ) -> Result<(), SessionError> {
        let flight = match self.in_flight {
            Some(flight) if flight.kind == kind && self.state == NegotiationState::OfferSent => {
                flight
            }
            _ => {
                warn!(
                    "Dropping stale {:?} answer from {} while {:?}",
                    kind, from, self.state
                );
                return Ok(());
            }
        };
        if !self.is_peer(&from) {
            warn!("Dropping answer from non-peer {}", from);
            return Ok(());
        }

        self.in_flight = None;
        if let Err(e) = self.negotiator.apply_remote_description(answer).await {
            self.state = flight.resume;
            return Err(e.into());
        }
        self.state = NegotiationState::Stable;

        if kind == NegotiationKind::Call {
            info!("Call accepted by {}", from);
            self.emit(SessionUpdate::CallEstablished {
                peer: from,
                initiated: true,
            });
            // A failed attach leaves the call up; deferred renegotiation still goes out.
            if let Err(e) = self.send_streams().await {
                warn!("Could not send local streams to {}: {}", from, e);
            }
        } else {
            debug!("Renegotiation with {} settled", from);
        }

        self.flush_pending_negotiation().await
    }

    async fn request_negotiation(&mut self) -> Result<(), SessionError> {
        let Some(peer) = self.peer_id() else {
            debug!("Negotiation needed without a peer, ignoring");
            return Ok(());
        };

        if !self.state.can_offer() {
            debug!("Negotiation needed while {:?}, deferring", self.state);
            self.renegotiate_when_stable = true;
            return Ok(());
        }

        self.send_offer(peer, NegotiationKind::Renegotiation).await
    }

    async fn flush_pending_negotiation(&mut self) -> Result<(), SessionError> {
        if self.renegotiate_when_stable && self.state.can_offer() {
            self.renegotiate_when_stable = false;
            return self.request_negotiation().await;
        }
        Ok(())
    }

    async fn send_offer(
        &mut self,
        to: ConnectionId,
        kind: NegotiationKind,
    ) -> Result<(), SessionError> {
        let offer = self.negotiator.produce_offer().await?;

        self.in_flight = Some(InFlightOffer {
            kind,
            resume: self.state,
        });
        self.state = NegotiationState::OfferSent;

        let msg = match kind {
            NegotiationKind::Call => ClientMessage::UserCall { to, offer },
            NegotiationKind::Renegotiation => ClientMessage::NegotiationNeeded { to, offer },
        };
        self.signals.send(msg).await;
        Ok(())
    }

    async fn acquire_media(&mut self) -> Result<(), SessionError> {
        if self.media.is_some() {
            return Ok(());
        }

        match self.devices.acquire(self.constraints).await {
            Ok(stream) => {
                let guard = MediaGuard::new(stream);
                let tracks = guard.tracks();
                info!("Acquired {} local track(s)", tracks.len());
                self.media = Some(guard);
                self.toggles = MediaToggles::default();
                self.emit(SessionUpdate::LocalMediaReady { tracks });
                Ok(())
            }
            Err(e) => {
                warn!("Media acquisition failed: {}", e);
                self.emit(SessionUpdate::MediaUnavailable {
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    async fn send_streams(&mut self) -> Result<(), SessionError> {
        if self.tracks_attached {
            return Ok(());
        }
        let tracks = match &self.media {
            Some(media) => media.tracks(),
            None => return Err(SessionError::NoLocalMedia),
        };

        for track in &tracks {
            self.negotiator.attach_local_track(track).await?;
        }
        self.tracks_attached = true;
        Ok(())
    }

    async fn toggle(&mut self, kind: TrackKind) {
        let Some(media) = self.media.as_mut() else {
            debug!("No local media to toggle");
            return;
        };

        let enabled = !self.toggles.get(kind);
        media.set_enabled(kind, enabled);
        self.toggles.set(kind, enabled);

        match kind {
            TrackKind::Audio => self.emit(SessionUpdate::LocalAudio(enabled)),
            TrackKind::Video => {
                self.emit(SessionUpdate::LocalVideo(enabled));
                if let Some(to) = self.peer_id() {
                    self.signals
                        .send(ClientMessage::VideoToggle { to, is_on: enabled })
                        .await;
                }
            }
        }
    }

    /// Releases media and the negotiator. Idempotent.
    async fn end(&mut self, reason: EndReason) {
        if self.ended.is_some() {
            return;
        }
        info!("Ending session: {:?}", reason);

        if let Some(media) = self.media.take() {
            media.release();
        }
        if let Err(e) = self.negotiator.close().await {
            warn!("Failed to close negotiator: {}", e);
        }

        self.in_flight = None;
        self.renegotiate_when_stable = false;
        self.ended = Some(reason);
        self.emit(SessionUpdate::Ended(reason));
    }

    fn peer_id(&self) -> Option<ConnectionId> {
        self.peer.as_ref().map(|p| p.id)
    }

    fn is_peer(&self, id: &ConnectionId) -> bool {
        self.peer.as_ref().is_some_and(|p| &p.id == id)
    }

    fn emit(&self, update: SessionUpdate) {
        let _ = self.updates.send(update);
    }
}
