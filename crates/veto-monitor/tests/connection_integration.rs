//! Integration tests for the connection lifecycle and event bridge.
//!
//! # Purpose
//!
//! These tests drive [`Connection`] through its public API the way the main
//! loop does: call an operation, pump `service()`, drain the event queue.
//! They verify:
//!
//! - The lifecycle scenarios: connect, establish, receive, close; and a
//!   failure before the connection was established.
//! - The monitor handshake: the board asks for the `monitor` role on
//!   `Connected` and the command reaches the wire.
//! - A full voting round flowing from raw lines into the board.
//! - The same path over a real WebSocket against a local server, and a
//!   server that never answers the handshake.
//!
//! Scripted tests use [`ScriptedConnector::manual`], so each transport
//! callback is injected explicitly through its [`TransportProbe`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header;
use tokio_tungstenite::tungstenite::Message;

use veto_core::{MonitorCommand, VetoEvent};
use veto_monitor::application::{MonitorBoard, Reaction};
use veto_monitor::domain::{
    ConnectionState, DisconnectReason, Endpoint, LifecycleEvent, MonitorEvent,
};
use veto_monitor::infrastructure::network::scripted::{ScriptedConnector, TransportProbe};
use veto_monitor::infrastructure::network::{
    Connection, FixedDelay, TransportEvent, WsConnector,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn drain(rx: &mut UnboundedReceiver<MonitorEvent>) -> Vec<MonitorEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn pump_until(conn: &mut Connection, done: impl Fn(&Connection) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(conn) {
        assert!(Instant::now() < deadline, "connection never reached the expected state");
        conn.service();
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Connects through a manual scripted connector and returns once the
/// handshake transport has been adopted (state still `Connecting`).
fn adopted() -> (
    Connection,
    UnboundedReceiver<MonitorEvent>,
    Arc<ScriptedConnector>,
    TransportProbe,
) {
    let connector = Arc::new(ScriptedConnector::manual());
    let (mut conn, events) = Connection::new(Endpoint::default(), connector.clone());
    conn.connect();
    pump_until(&mut conn, |c| c.has_transport());
    let probe = connector.probe(0).expect("handshake succeeded");
    (conn, events, connector, probe)
}

// ── Lifecycle scenarios ───────────────────────────────────────────────────────

/// Connect, establish, receive `P3`, close.
#[test]
fn test_connect_receive_and_clean_close() {
    // Arrange
    let (mut conn, mut events, _connector, probe) = adopted();
    assert_eq!(conn.state(), ConnectionState::Connecting);

    // Act / Assert: established
    probe.push(TransportEvent::Established);
    conn.service();
    assert_eq!(conn.state(), ConnectionState::Connected);

    // Act / Assert: a player-count line
    probe.push(TransportEvent::Received("P3".to_string()));
    conn.service();

    // Act / Assert: clean close
    probe.push(TransportEvent::Closed);
    conn.service();
    assert_eq!(conn.state(), ConnectionState::Disconnected);
    assert!(!conn.has_transport());

    assert_eq!(
        drain(&mut events),
        vec![
            MonitorEvent::Lifecycle(LifecycleEvent::Connecting),
            MonitorEvent::Lifecycle(LifecycleEvent::Connected),
            MonitorEvent::Game(VetoEvent::PlayerCount(3)),
            MonitorEvent::Lifecycle(LifecycleEvent::Disconnected(DisconnectReason::Closed)),
        ]
    );
}

/// A transport error before `Established` is a failed attempt, not a clean
/// disconnect.
#[test]
fn test_error_before_established_is_connect_failed() {
    let (mut conn, mut events, _connector, probe) = adopted();

    probe.push(TransportEvent::Error("connection refused".to_string()));
    conn.service();

    assert_eq!(conn.state(), ConnectionState::Disconnected);
    assert!(!conn.has_transport());
    assert!(probe.is_closed());
    let events = drain(&mut events);
    assert_eq!(
        events.last(),
        Some(&MonitorEvent::Lifecycle(LifecycleEvent::Disconnected(
            DisconnectReason::ConnectFailed
        )))
    );
    assert_ne!(DisconnectReason::ConnectFailed, DisconnectReason::Closed);
}

/// A refused handshake never produces a transport at all.
#[test]
fn test_refused_handshake_reports_connect_failed() {
    let connector = Arc::new(ScriptedConnector::new());
    connector.refuse_next(1);
    let (mut conn, mut events) = Connection::new(Endpoint::default(), connector.clone());

    conn.connect();
    pump_until(&mut conn, |c| c.state() == ConnectionState::Disconnected);

    assert_eq!(
        drain(&mut events),
        vec![
            MonitorEvent::Lifecycle(LifecycleEvent::Connecting),
            MonitorEvent::Lifecycle(LifecycleEvent::Disconnected(
                DisconnectReason::ConnectFailed
            )),
        ]
    );
    assert!(connector.probe(0).is_none());
}

/// The connector sees the configured endpoint.
#[test]
fn test_handshake_targets_configured_endpoint() {
    let connector = Arc::new(ScriptedConnector::new());
    let endpoint = Endpoint::new("localhost", 9000, "game");
    let (mut conn, _events) = Connection::new(endpoint.clone(), connector.clone());

    conn.connect();
    pump_until(&mut conn, |c| c.is_connected());

    assert_eq!(connector.endpoints(), vec![endpoint]);
}

/// Reconnecting after a clean close starts a fresh cycle on a new transport.
#[test]
fn test_manual_reconnect_after_close() {
    let connector = Arc::new(ScriptedConnector::new());
    let (mut conn, _events) = Connection::new(Endpoint::default(), connector.clone());
    conn.connect();
    pump_until(&mut conn, |c| c.is_connected());

    connector.probe(0).unwrap().push(TransportEvent::Closed);
    conn.service();
    conn.connect();
    pump_until(&mut conn, |c| c.is_connected());

    assert_eq!(connector.attempts(), 2);
    assert!(connector.probe(0).unwrap().is_closed());
    assert!(!connector.probe(1).unwrap().is_closed());
}

// ── Monitor handshake and board ───────────────────────────────────────────────

/// Feeds every queued event to the board and sends what it asks for.
fn run_board(
    conn: &mut Connection,
    events: &mut UnboundedReceiver<MonitorEvent>,
    board: &mut MonitorBoard,
) {
    while let Ok(event) = events.try_recv() {
        if let Some(Reaction::Send(command)) = board.apply(&event) {
            conn.send_command(command);
        }
    }
}

#[test]
fn test_board_claims_monitor_role_on_connect() {
    // Arrange
    let (mut conn, mut events, _connector, probe) = adopted();
    let mut board = MonitorBoard::new();

    // Act
    probe.push(TransportEvent::Established);
    conn.service();
    run_board(&mut conn, &mut events, &mut board);
    conn.service();

    // Assert
    assert_eq!(board.banner(), None);
    assert_eq!(probe.sent(), vec!["{\"type\":\"monitor\"}".to_string()]);
}

#[test]
fn test_voting_round_reaches_board() {
    // Arrange
    let (mut conn, mut events, _connector, probe) = adopted();
    let mut board = MonitorBoard::new();
    probe.push(TransportEvent::Established);

    // Act
    for line in [
        "P4", "S", "V", "C10", "C9", "Jola", "F2", "A1", "N1", "EF", "W0ola", "Tthanks",
    ] {
        probe.push(TransportEvent::Received(line.to_string()));
    }
    conn.service();
    run_board(&mut conn, &mut events, &mut board);

    // Assert
    assert_eq!(board.players, 4);
    assert_eq!(board.seconds_left, Some(9));
    assert_eq!(
        (board.votes_for, board.votes_against, board.votes_abstained),
        (2, 1, 1)
    );
    assert_eq!(board.last_result, Some(true));
    assert_eq!(board.winners.get(&0).map(String::as_str), Some("ola"));
    assert_eq!(board.status(), Some("The end: thanks"));
}

#[test]
fn test_operator_commands_reach_wire_in_order() {
    let (mut conn, _events, _connector, probe) = adopted();
    probe.push(TransportEvent::Established);
    conn.service();

    conn.send_command(MonitorCommand::Start);
    conn.service();
    conn.send_command(MonitorCommand::Voting);
    conn.service();

    assert_eq!(
        probe.sent(),
        vec![
            "{\"type\":\"start\"}".to_string(),
            "{\"type\":\"voting\"}".to_string()
        ]
    );
}

// ── Real WebSocket ────────────────────────────────────────────────────────────

/// Full path over a local WebSocket server: handshake headers, the monitor
/// role command, an inbound line and a server-side close.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_monitor_session() {
    // Arrange: a server that checks the headers, waits for the role claim,
    // sends one line and closes.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let check = |req: &Request, mut resp: Response| -> Result<Response, ErrorResponse> {
            assert_eq!(req.headers()[header::ORIGIN], "veto-monitor");
            let protocol = req.headers()[header::SEC_WEBSOCKET_PROTOCOL].clone();
            resp.headers_mut()
                .insert(header::SEC_WEBSOCKET_PROTOCOL, protocol);
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(tcp, check).await.unwrap();

        let claim = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(_)) => continue,
                other => panic!("client went away: {other:?}"),
            }
        };
        ws.send(Message::Text("P3".to_string())).await.unwrap();
        let _ = ws.close(None).await;
        claim
    });

    // Act: run the main-loop shape on a blocking thread
    let runtime = Handle::current();
    let (events, board) = tokio::task::spawn_blocking(move || {
        let connector = Arc::new(WsConnector::new(runtime));
        let (mut conn, mut rx) =
            Connection::new(Endpoint::new("127.0.0.1", port, "/"), connector);
        let mut board = MonitorBoard::new();
        let mut seen = Vec::new();

        conn.connect();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !matches!(
            seen.last(),
            Some(MonitorEvent::Lifecycle(LifecycleEvent::Disconnected(_)))
        ) {
            assert!(Instant::now() < deadline, "session never finished");
            conn.service();
            while let Ok(event) = rx.try_recv() {
                if let Some(Reaction::Send(command)) = board.apply(&event) {
                    conn.send_command(command);
                }
                seen.push(event);
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        (seen, board)
    })
    .await
    .unwrap();

    // Assert
    assert_eq!(server.await.unwrap(), "{\"type\":\"monitor\"}");
    assert_eq!(
        events,
        vec![
            MonitorEvent::Lifecycle(LifecycleEvent::Connecting),
            MonitorEvent::Lifecycle(LifecycleEvent::Connected),
            MonitorEvent::Game(VetoEvent::PlayerCount(3)),
            MonitorEvent::Lifecycle(LifecycleEvent::Disconnected(DisconnectReason::Closed)),
        ]
    );
    assert_eq!(board.players, 3);
    assert_eq!(board.banner(), Some("Disconnected"));
}

/// A server that accepts TCP but never answers the upgrade fails the
/// attempt once the handshake deadline passes, and the reconnect policy
/// gets its say.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_silent_server_reports_connect_failed() {
    // Arrange: hold the accepted socket open without replying
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        let (_tcp, _) = listener.accept().await.unwrap();
        let _ = release_rx.await;
    });

    // Act
    let runtime = Handle::current();
    let (conn, mut events) = tokio::task::spawn_blocking(move || {
        let connector = Arc::new(
            WsConnector::new(runtime).with_connect_timeout(Duration::from_millis(200)),
        );
        let (conn, rx) = Connection::new(Endpoint::new("127.0.0.1", port, "/"), connector);
        let mut conn =
            conn.with_reconnect_policy(Box::new(FixedDelay::new(Duration::from_secs(60))));

        conn.connect();
        pump_until(&mut conn, |c| c.state() == ConnectionState::Disconnected);
        (conn, rx)
    })
    .await
    .unwrap();
    let _ = release_tx.send(());

    // Assert
    assert_eq!(
        drain(&mut events),
        vec![
            MonitorEvent::Lifecycle(LifecycleEvent::Connecting),
            MonitorEvent::Lifecycle(LifecycleEvent::Disconnected(
                DisconnectReason::ConnectFailed
            )),
        ]
    );
    assert!(!conn.has_transport());
    assert!(conn.reconnect_scheduled_at().is_some());
}
