use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use tenpin::adapter::protocol::{
    create_ack, create_hello, create_observation, RequestedRole, PROTOCOL_VERSION,
};
use tenpin::adapter::server::{run_server, ServerConfig};
use tenpin::adapter::{InboundRoll, OutboundMessage};
use tenpin::core::BowlingGame;

struct TestServer {
    addr: std::net::SocketAddr,
    roll_rx: mpsc::Receiver<InboundRoll>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

async fn start_server() -> TestServer {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        protocol_version: PROTOCOL_VERSION.to_string(),
        max_pending_rolls: 8,
    };

    let (roll_tx, roll_rx) = mpsc::channel::<InboundRoll>(8);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    tokio::spawn(async move {
        let _ = run_server(config, roll_tx, out_rx, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");

    TestServer {
        addr,
        roll_rx,
        out_tx,
    }
}

type ClientLines = tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>;

async fn connect(addr: std::net::SocketAddr) -> (ClientLines, tokio::net::tcp::OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half).lines(), write_half)
}

async fn send_line(write_half: &mut tokio::net::tcp::OwnedWriteHalf, line: &str) {
    write_half.write_all(line.as_bytes()).await.unwrap();
    write_half.write_all(b"\n").await.unwrap();
    write_half.flush().await.unwrap();
}

async fn next_json(lines: &mut ClientLines) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timed out waiting for server line")
        .unwrap()
        .expect("connection closed");
    serde_json::from_str(&line).expect("server sent invalid json")
}

#[tokio::test]
async fn adapter_hello_roll_ack_and_observation() {
    let mut server = start_server().await;
    let (mut lines, mut write_half) = connect(server.addr).await;

    // hello (auto role claims controller)
    let hello = create_hello(1, "e2e-test", PROTOCOL_VERSION);
    send_line(&mut write_half, &serde_json::to_string(&hello).unwrap()).await;

    let welcome = next_json(&mut lines).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["game_id"], "tenpin");

    // roll
    send_line(
        &mut write_half,
        r#"{"type":"roll","seq":2,"ts":1,"pins":7}"#,
    )
    .await;

    let inbound = tokio::time::timeout(Duration::from_secs(2), server.roll_rx.recv())
        .await
        .unwrap()
        .expect("expected inbound roll");
    assert_eq!(inbound.seq, 2);
    assert_eq!(inbound.pins, 7);

    // The game loop applies the roll, acks, and broadcasts the score.
    let mut game = BowlingGame::new();
    game.roll(inbound.pins).unwrap();

    let ack = create_ack(inbound.seq);
    server
        .out_tx
        .send(OutboundMessage::ToClient {
            client_id: inbound.client_id,
            line: serde_json::to_string(&ack).unwrap(),
        })
        .unwrap();

    let obs = create_observation(1, &game.snapshot());
    server
        .out_tx
        .send(OutboundMessage::Broadcast {
            line: serde_json::to_string(&obs).unwrap(),
        })
        .unwrap();

    let ack_line = next_json(&mut lines).await;
    assert_eq!(ack_line["type"], "ack");
    assert_eq!(ack_line["seq"], 2);

    let obs_line = next_json(&mut lines).await;
    assert_eq!(obs_line["type"], "observation");
    assert_eq!(obs_line["score"], 7);
    assert_eq!(obs_line["phase"], "second_roll");
    assert_eq!(obs_line["rolls"], serde_json::json!([7]));
}

#[tokio::test]
async fn adapter_rejects_roll_before_handshake() {
    let server = start_server().await;
    let (mut lines, mut write_half) = connect(server.addr).await;

    send_line(
        &mut write_half,
        r#"{"type":"roll","seq":1,"ts":1,"pins":5}"#,
    )
    .await;

    let err = next_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "handshake_required");
}

#[tokio::test]
async fn adapter_observer_cannot_roll() {
    let server = start_server().await;
    let (mut lines, mut write_half) = connect(server.addr).await;

    let mut hello = create_hello(1, "e2e-observer", PROTOCOL_VERSION);
    hello.requested.role = Some(RequestedRole::Observer);
    send_line(&mut write_half, &serde_json::to_string(&hello).unwrap()).await;

    let welcome = next_json(&mut lines).await;
    assert_eq!(welcome["role"], "observer");

    send_line(
        &mut write_half,
        r#"{"type":"roll","seq":2,"ts":1,"pins":5}"#,
    )
    .await;

    let err = next_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "not_controller");
}

#[tokio::test]
async fn adapter_drops_stale_sequence_numbers() {
    let mut server = start_server().await;
    let (mut lines, mut write_half) = connect(server.addr).await;

    let hello = create_hello(1, "e2e-test", PROTOCOL_VERSION);
    send_line(&mut write_half, &serde_json::to_string(&hello).unwrap()).await;
    let welcome = next_json(&mut lines).await;
    assert_eq!(welcome["role"], "controller");

    send_line(
        &mut write_half,
        r#"{"type":"roll","seq":2,"ts":1,"pins":3}"#,
    )
    .await;
    // Replay of the same seq is dropped without an inbound roll.
    send_line(
        &mut write_half,
        r#"{"type":"roll","seq":2,"ts":2,"pins":9}"#,
    )
    .await;
    send_line(
        &mut write_half,
        r#"{"type":"roll","seq":3,"ts":3,"pins":4}"#,
    )
    .await;

    let first = tokio::time::timeout(Duration::from_secs(2), server.roll_rx.recv())
        .await
        .unwrap()
        .expect("expected inbound roll");
    assert_eq!((first.seq, first.pins), (2, 3));

    let second = tokio::time::timeout(Duration::from_secs(2), server.roll_rx.recv())
        .await
        .unwrap()
        .expect("expected inbound roll");
    assert_eq!((second.seq, second.pins), (3, 4));
}

#[tokio::test]
async fn adapter_rejects_protocol_mismatch() {
    let server = start_server().await;
    let (mut lines, mut write_half) = connect(server.addr).await;

    let hello = create_hello(1, "e2e-test", "9.9.9");
    send_line(&mut write_half, &serde_json::to_string(&hello).unwrap()).await;

    let err = next_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "protocol_mismatch");
}
