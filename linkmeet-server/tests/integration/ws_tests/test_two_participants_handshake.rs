use linkmeet_core::{ClientMessage, RoomId, ServerMessage, SessionDescription};

use crate::integration::{init_tracing, spawn_test_server};
use crate::utils::TestClient;

#[tokio::test]
async fn test_two_participants_handshake() {
    init_tracing();

    let (url, _state) = spawn_test_server().await;

    let mut a = TestClient::connect(&url).await.expect("A failed to connect");
    let mut b = TestClient::connect(&url).await.expect("B failed to connect");
    assert_ne!(a.id, b.id);

    a.join("a@x.com", "r1").await.expect("A join failed");
    assert_eq!(
        a.recv().await.expect("A ack"),
        ServerMessage::RoomJoined { room: RoomId::from("r1") }
    );

    b.join("b@x.com", "r1").await.expect("B join failed");
    assert_eq!(
        a.recv().await.expect("A peer-joined"),
        ServerMessage::UserJoined { email: "b@x.com".into(), id: b.id }
    );
    assert_eq!(
        b.recv().await.expect("B ack"),
        ServerMessage::RoomJoined { room: RoomId::from("r1") }
    );

    let offer = SessionDescription::offer("v=0 a");
    a.send(&ClientMessage::UserCall { to: b.id, offer: offer.clone() })
        .await
        .expect("A call failed");
    assert_eq!(
        b.recv().await.expect("B incoming call"),
        ServerMessage::IncomingCall { from: a.id, offer }
    );

    let ans = SessionDescription::answer("v=0 b");
    b.send(&ClientMessage::CallAccepted { to: a.id, ans: ans.clone() })
        .await
        .expect("B accept failed");
    assert_eq!(
        a.recv().await.expect("A call accepted"),
        ServerMessage::CallAccepted { from: b.id, ans }
    );

    a.expect_silence().await.expect("A got stray frames");
    b.expect_silence().await.expect("B got stray frames");

    a.close().await.expect("close A");
    b.close().await.expect("close B");
}
