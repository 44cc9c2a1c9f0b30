use anyhow::{Context, Result, bail};
use linkmeet_client::{
    NegotiationState, NegotiatorEvent, SessionController, SessionError, SessionEvent,
    SessionUpdate, UserCommand,
};
use linkmeet_core::{ConnectionId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{MockDevices, MockNegotiator, RecordingSink};

/// Upper bound on delivery rounds before a pump is considered livelocked.
pub const MAX_PUMP_ROUNDS: usize = 50;

/// One participant wired to mocks.
pub struct Side {
    pub controller: SessionController,
    pub negotiator: MockNegotiator,
    pub sink: RecordingSink,
    pub devices: MockDevices,
    pub events: mpsc::UnboundedReceiver<NegotiatorEvent>,
    pub updates: mpsc::UnboundedReceiver<SessionUpdate>,
}

impl Side {
    pub fn new(label: &str, id: ConnectionId) -> Self {
        Self::with_devices(label, id, MockDevices::new(label))
    }

    pub fn with_devices(label: &str, id: ConnectionId, devices: MockDevices) -> Self {
        let (negotiator, events) = MockNegotiator::new(label);
        let sink = RecordingSink::new();
        let (controller, updates) = SessionController::new(
            id,
            Box::new(negotiator.clone()),
            Arc::new(sink.clone()),
            Arc::new(devices.clone()),
        );

        Self {
            controller,
            negotiator,
            sink,
            devices,
            events,
            updates,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.controller.local_id()
    }

    pub fn state(&self) -> NegotiationState {
        self.controller.state()
    }

    pub async fn signal(&mut self, msg: ServerMessage) -> Result<(), SessionError> {
        self.controller.handle(SessionEvent::Signal(msg)).await
    }

    pub async fn command(&mut self, cmd: UserCommand) -> Result<(), SessionError> {
        self.controller.handle(SessionEvent::Command(cmd)).await
    }

    /// Feeds queued negotiator events into the controller. Returns how many.
    pub async fn drain_events(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Ok(evt) = self.events.try_recv() {
            self.controller
                .handle(SessionEvent::Negotiator(evt))
                .await
                .context("Negotiator event failed")?;
            handled += 1;
        }
        Ok(handled)
    }

    pub fn drain_updates(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.updates.try_recv() {
            updates.push(update);
        }
        updates
    }
}

/// Two controllers connected back to back through the relay routing rule.
///
/// `a` joined the room first and was told about `b` through `user:joined`.
pub struct LoopbackPair {
    pub a: Side,
    pub b: Side,
    /// Every relayed message as `(sender, delivered form)`.
    pub delivered: Vec<(ConnectionId, ServerMessage)>,
}

impl LoopbackPair {
    /// Builds a pair where `a` holds the smaller id when `a_polite` is set.
    pub async fn joined(a_polite: bool) -> Result<Self> {
        let mut ids = [ConnectionId::new(), ConnectionId::new()];
        ids.sort();
        let (a_id, b_id) = if a_polite {
            (ids[0], ids[1])
        } else {
            (ids[1], ids[0])
        };

        let mut pair = Self {
            a: Side::new("alice", a_id),
            b: Side::new("bob", b_id),
            delivered: Vec::new(),
        };

        pair.a
            .signal(ServerMessage::UserJoined {
                email: "bob@example.com".into(),
                id: b_id,
            })
            .await
            .context("user:joined rejected")?;

        Ok(pair)
    }

    /// `a` calls `b` and everything is delivered until both sides go quiet.
    pub async fn connected(a_polite: bool) -> Result<Self> {
        let mut pair = Self::joined(a_polite).await?;
        pair.a
            .command(UserCommand::StartCall)
            .await
            .context("StartCall failed")?;
        pair.pump().await?;
        Ok(pair)
    }

    /// Delivers outbound messages and negotiator events in rounds until
    /// nothing moves. Returns the number of relayed messages.
    pub async fn pump(&mut self) -> Result<usize> {
        let mut relayed = 0;

        for _ in 0..MAX_PUMP_ROUNDS {
            let mut moved = 0;

            moved += self.a.drain_events().await?;
            moved += self.b.drain_events().await?;

            for msg in self.a.sink.take().await {
                if let Some((to, routed)) = msg.route(self.a.id()) {
                    if to == self.b.id() {
                        self.delivered.push((self.a.id(), routed.clone()));
                        self.b.signal(routed).await.context("b rejected signal")?;
                        moved += 1;
                        relayed += 1;
                    }
                }
            }
            for msg in self.b.sink.take().await {
                if let Some((to, routed)) = msg.route(self.b.id()) {
                    if to == self.a.id() {
                        self.delivered.push((self.b.id(), routed.clone()));
                        self.a.signal(routed).await.context("a rejected signal")?;
                        moved += 1;
                        relayed += 1;
                    }
                }
            }

            if moved == 0 {
                return Ok(relayed);
            }
        }

        bail!("Signaling did not settle within {} rounds", MAX_PUMP_ROUNDS)
    }

    /// How many relayed messages from `from` carried `event`.
    pub fn delivered_count(&self, from: ConnectionId, event: &str) -> usize {
        self.delivered
            .iter()
            .filter(|(sender, msg)| *sender == from && msg.event_name() == event)
            .count()
    }
}
