//! End-to-end tests over a real `WebSocket` connection.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use growthos_config::Config;
use growthos_engine::CommandGateway;
use growthos_gateway::WsServer;
use growthos_test::{fast_catalog, init_test_logging, test_context_with};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Harness {
    addr: SocketAddr,
    gateway: CommandGateway,
    shutdown: broadcast::Sender<()>,
    server: tokio::task::JoinHandle<growthos_gateway::GatewayResult<()>>,
}

impl Harness {
    async fn start() -> Self {
        init_test_logging();
        let mut config = Config::default();
        config.server.bind = "127.0.0.1:0".into();
        config.simulation.time_scale = 0.01;

        let gateway = CommandGateway::new(test_context_with(fast_catalog(), &config));
        let server = WsServer::bind(&config.server, gateway.clone()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (shutdown, rx) = broadcast::channel(1);
        let server = tokio::spawn(server.run(rx));

        Self {
            addr,
            gateway,
            shutdown,
            server,
        }
    }

    async fn connect(&self) -> Client {
        let (ws, _) = connect_async(format!("ws://{}/ws", self.addr)).await.unwrap();
        ws
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.server.await.unwrap().unwrap();
    }
}

async fn send(ws: &mut Client, json: &str) {
    ws.send(Message::Text(json.to_owned().into())).await.unwrap();
}

async fn next_event(ws: &mut Client) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .unwrap()
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn wait_for_observers(gateway: &CommandGateway, count: usize) {
    timeout(Duration::from_secs(5), async {
        while gateway.context().bus().registry().len() != count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("observer count never reached");
}

#[tokio::test]
async fn test_simulate_lead_streams_new_lead_and_booking() {
    let harness = Harness::start().await;
    let mut ws = harness.connect().await;

    send(&mut ws, r#"{"action":"simulate_lead","mode":"new"}"#).await;

    let first = next_event(&mut ws).await;
    assert_eq!(first["type"], "new_lead");
    assert_eq!(first["metrics"]["total_leads"], 1);
    assert_eq!(first["patient"]["stage"], "lead");
    assert_eq!(first["patient"]["mode"], "new");
    let lead_id = first["patient"]["id"].as_str().unwrap().to_owned();

    let mut messages = 0;
    let booked = loop {
        let event = next_event(&mut ws).await;
        match event["type"].as_str().unwrap() {
            "message" => {
                assert_eq!(event["patient_id"], lead_id.as_str());
                assert!(event.get("metrics").is_none());
                messages += 1;
            },
            "stage_change" => break event,
            other => panic!("unexpected event type {other}"),
        }
    };
    assert_eq!(messages, 3);
    assert_eq!(booked["stage"], "booked");
    assert_eq!(booked["metrics"]["booked"], 1);
    assert_eq!(booked["metrics"]["revenue_captured"], 2800);

    harness.stop().await;
}

#[tokio::test]
async fn test_every_observer_receives_broadcasts() {
    let harness = Harness::start().await;
    let mut a = harness.connect().await;
    let mut b = harness.connect().await;
    wait_for_observers(&harness.gateway, 2).await;

    send(&mut a, r#"{"action":"reset"}"#).await;

    for ws in [&mut a, &mut b] {
        let event = next_event(ws).await;
        assert_eq!(event["type"], "reset");
        assert_eq!(event["metrics"]["total_leads"], 0);
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_malformed_frames_ignored() {
    let harness = Harness::start().await;
    let mut ws = harness.connect().await;

    send(&mut ws, "not json").await;
    send(&mut ws, r#"{"action":"teleport"}"#).await;
    send(&mut ws, r#"{"action":"simulate_retention","patient_id":"ffffffff"}"#).await;
    ws.send(Message::Binary(vec![1, 2, 3].into())).await.unwrap();
    send(&mut ws, r#"{"action":"reset"}"#).await;

    // The first event this observer sees is the reset.
    let event = next_event(&mut ws).await;
    assert_eq!(event["type"], "reset");

    harness.stop().await;
}

#[tokio::test]
async fn test_disconnect_unregisters_observer() {
    let harness = Harness::start().await;
    let mut ws = harness.connect().await;
    wait_for_observers(&harness.gateway, 1).await;

    ws.close(None).await.unwrap();
    drop(ws);
    wait_for_observers(&harness.gateway, 0).await;

    harness.stop().await;
}

#[tokio::test]
async fn test_wrong_path_rejected() {
    let harness = Harness::start().await;

    let result = connect_async(format!("ws://{}/elsewhere", harness.addr)).await;
    assert!(result.is_err());
    assert!(harness.gateway.context().bus().registry().is_empty());

    harness.stop().await;
}
