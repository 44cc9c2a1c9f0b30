use anyhow::{Result, bail};
use linkmeet_client::{
    LocalTrack, Negotiator, NegotiatorEvent, RtcNegotiator, SessionUpdate, TrackKind,
    UserCommand,
};
use linkmeet_core::SdpType;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::RtcPair;

const GATHER_TIMEOUT: Duration = Duration::from_secs(2);
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(20);

async fn next_negotiation_needed(
    events: &mut mpsc::UnboundedReceiver<NegotiatorEvent>,
) -> Result<()> {
    let wait = async {
        while let Some(evt) = events.recv().await {
            if evt == NegotiatorEvent::NegotiationNeeded {
                return true;
            }
        }
        false
    };

    match tokio::time::timeout(EVENT_TIMEOUT, wait).await {
        Ok(true) => Ok(()),
        Ok(false) => bail!("Negotiator event channel closed"),
        Err(_) => bail!("No negotiation-needed within {:?}", EVENT_TIMEOUT),
    }
}

#[tokio::test]
async fn test_rtc_offer_before_tracks() -> Result<()> {
    init_tracing();

    let (a_tx, mut a_events) = mpsc::unbounded_channel();
    let (b_tx, _b_events) = mpsc::unbounded_channel();
    let mut a = RtcNegotiator::new(&[], GATHER_TIMEOUT, a_tx).await?;
    let mut b = RtcNegotiator::new(&[], GATHER_TIMEOUT, b_tx).await?;

    // The caller offers before it has any media.
    let offer = a.produce_offer().await?;
    assert!(offer.sdp.contains("m=audio"));
    assert!(offer.sdp.contains("m=video"));
    assert!(offer.sdp.contains("a=ice-ufrag"));

    let answer = b.produce_answer(offer).await?;
    assert_eq!(answer.kind, SdpType::Answer);
    a.apply_remote_description(answer).await?;

    while a_events.try_recv().is_ok() {}

    a.attach_local_track(&LocalTrack {
        id: "alice-audio".into(),
        stream_id: "alice".into(),
        kind: TrackKind::Audio,
    })
    .await?;
    next_negotiation_needed(&mut a_events).await?;

    // The renegotiation carries the new track.
    let offer = a.produce_offer().await?;
    assert!(offer.sdp.contains("alice-audio"));
    let answer = b.produce_answer(offer).await?;
    a.apply_remote_description(answer).await?;

    a.close().await?;
    b.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_rtc_controllers_call_and_exchange_streams() -> Result<()> {
    init_tracing();

    let mut pair = RtcPair::joined().await?;
    let (a_id, b_id) = (pair.a.id(), pair.b.id());

    pair.a.command(UserCommand::StartCall).await?;
    pair.settle(SETTLE_TIMEOUT, |p| {
        p.both_stable()
            && p.delivered_count(a_id, "peer:nego:needed") >= 1
            && p.delivered_count(b_id, "peer:nego:final") >= 1
    })
    .await?;

    assert_eq!(pair.delivered_count(a_id, "incoming:call"), 1);
    assert_eq!(pair.delivered_count(b_id, "call:accepted"), 1);
    assert!(
        pair.a
            .drain_updates()
            .iter()
            .any(|u| matches!(u, SessionUpdate::CallEstablished { .. }))
    );

    // Now the acceptor sends its own tracks.
    let b_offers = pair.delivered_count(b_id, "peer:nego:needed");
    pair.b.command(UserCommand::SendStreams).await?;
    pair.settle(SETTLE_TIMEOUT, |p| {
        p.both_stable() && p.delivered_count(b_id, "peer:nego:needed") > b_offers
    })
    .await?;

    assert!(pair.a.controller.has_local_media());
    assert!(pair.b.controller.has_local_media());
    assert_eq!(pair.a.devices.acquires(), 1);
    assert_eq!(pair.b.devices.acquires(), 1);

    pair.a.command(UserCommand::Leave).await?;
    pair.b.command(UserCommand::Leave).await?;
    Ok(())
}
