use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::common::Message;

const TEST_TIMEOUT: Duration = Duration::from_secs(3);

pub fn message(id: i64, username: &str, text: &str) -> Message {
    Message {
        id,
        username: username.to_string(),
        message: text.to_string(),
        timestamp: Some("2024-05-01T12:00:00".to_string()),
    }
}

/// In-process chat server: caller-supplied REST routes plus a scripted Socket.IO endpoint.
pub struct TestServer {
    address: SocketAddr,
    peers: mpsc::Receiver<WebSocket>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start(routes: Router) -> Self {
        let (peer_tx, peers) = mpsc::channel(4);
        let app = Router::new()
            .route("/socket.io/", get(upgrade))
            .with_state(peer_tx)
            .merge(routes);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server listener");
        let address = listener.local_addr().expect("test server local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("run test server");
        });

        Self {
            address,
            peers,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    async fn next_socket(&mut self) -> WebSocket {
        timeout(TEST_TIMEOUT, self.peers.recv())
            .await
            .expect("client never upgraded")
            .expect("test server stopped")
    }

    /// Waits for a client and completes the Engine.IO and namespace handshake.
    pub async fn accept(&mut self) -> FakePeer {
        let mut peer = self.open().await;
        peer.send_frame(r#"40{"sid":"namespace-sid"}"#).await;
        peer
    }

    pub async fn accept_and_refuse(&mut self) {
        let mut peer = self.open().await;
        peer.send_frame(r#"44{"message":"Not authorized"}"#).await;
    }

    /// Takes the upgraded socket without sending anything, leaving the client mid-handshake.
    pub async fn accept_silently(&mut self) -> FakePeer {
        FakePeer {
            socket: self.next_socket().await,
        }
    }

    async fn open(&mut self) -> FakePeer {
        let mut peer = FakePeer {
            socket: self.next_socket().await,
        };
        peer.send_frame(
            r#"0{"sid":"engine-sid","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .await;
        assert_eq!(peer.recv_frame().await, "40");
        peer
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn upgrade(ws: WebSocketUpgrade, State(peers): State<mpsc::Sender<WebSocket>>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let _ = peers.send(socket).await;
    })
}

/// Server side of one accepted Socket.IO connection.
pub struct FakePeer {
    socket: WebSocket,
}

impl FakePeer {
    pub async fn send_frame(&mut self, frame: &str) {
        self.socket
            .send(WsMessage::Text(frame.to_string().into()))
            .await
            .expect("send frame to client");
    }

    pub async fn ping(&mut self) {
        self.send_frame("2").await;
    }

    pub async fn emit_message(&mut self, message: &Message) {
        let payload = serde_json::to_string(message).expect("encode message");
        self.send_frame(&format!(r#"42["message",{payload}]"#)).await;
    }

    pub async fn recv_frame(&mut self) -> String {
        timeout(TEST_TIMEOUT, async {
            loop {
                match self.socket.recv().await {
                    Some(Ok(WsMessage::Text(text))) => return text.as_str().to_string(),
                    Some(Ok(_)) => continue,
                    other => panic!("client socket ended: {other:?}"),
                }
            }
        })
        .await
        .expect("client frame timeout")
    }

    /// Resolves once the client has dropped or closed its end.
    pub async fn closed(&mut self) {
        timeout(TEST_TIMEOUT, async {
            loop {
                match self.socket.recv().await {
                    Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await
        .expect("client kept the socket open")
    }
}
