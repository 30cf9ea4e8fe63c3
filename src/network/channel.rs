use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::common::{
    ChannelCommand, ChannelError, ConnectionState, OutboundMessage, SessionEvent,
};

use super::client::SocketIoClient;
use super::transport;

const COMMAND_BUFFER: usize = 32;

/// Session-side handle of the realtime connection.
///
/// The state here is authoritative for `send`: it only changes when the owning session
/// applies lifecycle events from its queue, so a send is judged against what the
/// session has actually observed. Dropping the handle closes the connection.
#[derive(Debug, Default)]
pub struct RealtimeChannel {
    state: ConnectionState,
    commands: Option<mpsc::Sender<ChannelCommand>>,
}

impl RealtimeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Spawns the transport task and moves to `Connecting`.
    pub fn connect(
        &mut self,
        server_url: &str,
        handshake_timeout: Duration,
        events: mpsc::Sender<SessionEvent>,
        runtime: &Handle,
    ) -> Result<(), ChannelError> {
        self.ensure_transition(ConnectionState::Connecting)?;
        let url = transport::websocket_url(server_url)?;

        let (command_sender, command_receiver) = mpsc::channel(COMMAND_BUFFER);
        log::info!("Connecting to {url}");
        let client = SocketIoClient::new(url, handshake_timeout, events, command_receiver);
        runtime.spawn(client.run());

        self.begin(command_sender)
    }

    pub(crate) fn begin(
        &mut self,
        command_sender: mpsc::Sender<ChannelCommand>,
    ) -> Result<(), ChannelError> {
        self.transition(ConnectionState::Connecting)?;
        self.commands = Some(command_sender);
        Ok(())
    }

    pub fn mark_connected(&mut self) -> Result<(), ChannelError> {
        self.transition(ConnectionState::Connected)?;
        log::info!("WebSocket connected");
        Ok(())
    }

    /// Transport reported a disconnect or a failed connection attempt.
    pub fn mark_disconnected(&mut self, reason: &str) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.state = ConnectionState::Disconnected;
        self.commands = None;
        log::info!("WebSocket disconnected ({reason})");
    }

    /// Forwards an outbound message to the transport. Never touches the transport unless connected.
    pub fn send(&self, message: OutboundMessage) -> Result<(), ChannelError> {
        if self.state != ConnectionState::Connected {
            return Err(ChannelError::NotConnected);
        }

        let commands = self.commands.as_ref().ok_or(ChannelError::Closed)?;
        commands
            .try_send(ChannelCommand::Emit(message))
            .map_err(|err| match err {
                TrySendError::Full(_) => ChannelError::Busy,
                TrySendError::Closed(_) => ChannelError::Closed,
            })
    }

    /// Idempotent teardown.
    pub fn close(&mut self) {
        if let Some(commands) = self.commands.take() {
            // A full or closed queue still ends the task: dropping the sender closes it.
            let _ = commands.try_send(ChannelCommand::Close);
        }
        if self.state != ConnectionState::Disconnected {
            log::info!("Closing realtime channel");
            self.state = ConnectionState::Disconnected;
        }
    }

    fn ensure_transition(&self, next: ConnectionState) -> Result<(), ChannelError> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(ChannelError::InvalidTransition {
                from: self.state,
                to: next,
            })
        }
    }

    fn transition(&mut self, next: ConnectionState) -> Result<(), ChannelError> {
        self.ensure_transition(next)?;
        self.state = next;
        Ok(())
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ChannelEvent, DisconnectReason};
    use crate::test_support::{TestServer, message};
    use axum::Router;
    use tokio::sync::mpsc::error::TryRecvError;

    fn outbound(text: &str) -> OutboundMessage {
        OutboundMessage {
            username: "alice".into(),
            message: text.into(),
        }
    }

    #[test]
    fn send_fails_while_disconnected() {
        let channel = RealtimeChannel::new();
        assert!(matches!(
            channel.send(outbound("hi")),
            Err(ChannelError::NotConnected)
        ));
    }

    #[test]
    fn send_while_connecting_never_reaches_transport() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut channel = RealtimeChannel::new();
        channel.begin(tx).unwrap();

        assert_eq!(channel.state(), ConnectionState::Connecting);
        assert!(matches!(
            channel.send(outbound("hi")),
            Err(ChannelError::NotConnected)
        ));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn send_while_connected_is_forwarded() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut channel = RealtimeChannel::new();
        channel.begin(tx).unwrap();
        channel.mark_connected().unwrap();

        channel.send(outbound("hi")).unwrap();
        match rx.try_recv() {
            Ok(ChannelCommand::Emit(sent)) => assert_eq!(sent, outbound("hi")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn full_queue_is_busy_and_dropped_task_is_closed() {
        let (tx, rx) = mpsc::channel(1);
        let mut channel = RealtimeChannel::new();
        channel.begin(tx).unwrap();
        channel.mark_connected().unwrap();

        channel.send(outbound("one")).unwrap();
        assert!(matches!(
            channel.send(outbound("two")),
            Err(ChannelError::Busy)
        ));

        drop(rx);
        assert!(matches!(
            channel.send(outbound("three")),
            Err(ChannelError::Closed)
        ));
    }

    #[test]
    fn lifecycle_rejects_out_of_order_transitions() {
        let (tx, _rx) = mpsc::channel(4);
        let mut channel = RealtimeChannel::new();

        assert!(matches!(
            channel.mark_connected(),
            Err(ChannelError::InvalidTransition { .. })
        ));

        channel.begin(tx.clone()).unwrap();
        assert!(matches!(
            channel.begin(tx.clone()),
            Err(ChannelError::InvalidTransition { .. })
        ));

        channel.mark_connected().unwrap();
        channel.mark_disconnected("transport close");
        assert_eq!(channel.state(), ConnectionState::Disconnected);
        assert!(matches!(
            channel.send(outbound("late")),
            Err(ChannelError::NotConnected)
        ));
    }

    #[test]
    fn connect_error_moves_connecting_to_disconnected() {
        let (tx, _rx) = mpsc::channel(4);
        let mut channel = RealtimeChannel::new();
        channel.begin(tx).unwrap();

        channel.mark_disconnected("connect error");
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn close_is_idempotent_and_notifies_transport_once() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut channel = RealtimeChannel::new();
        channel.begin(tx).unwrap();
        channel.mark_connected().unwrap();

        channel.close();
        channel.close();

        assert_eq!(channel.state(), ConnectionState::Disconnected);
        assert!(matches!(rx.try_recv(), Ok(ChannelCommand::Close)));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[test]
    fn dropping_the_handle_closes_the_transport() {
        let (tx, mut rx) = mpsc::channel(4);
        {
            let mut channel = RealtimeChannel::new();
            channel.begin(tx).unwrap();
        }
        assert!(matches!(rx.try_recv(), Ok(ChannelCommand::Close)));
    }

    #[test]
    fn invalid_server_url_leaves_channel_disconnected() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (events, _rx) = mpsc::channel(4);
        let mut channel = RealtimeChannel::new();

        let result = channel.connect(
            "ftp://nowhere",
            Duration::from_secs(1),
            events,
            runtime.handle(),
        );
        assert!(matches!(result, Err(ChannelError::InvalidUrl(_))));
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn talks_socket_io_with_a_live_server() {
        let mut server = TestServer::start(Router::new()).await;
        let (events, mut event_rx) = mpsc::channel(16);
        let mut channel = RealtimeChannel::new();

        channel
            .connect(
                &server.base_url(),
                Duration::from_secs(3),
                events,
                &Handle::current(),
            )
            .unwrap();
        let mut peer = server.accept().await;

        match event_rx.recv().await {
            Some(SessionEvent::Channel(ChannelEvent::Connected)) => {
                channel.mark_connected().unwrap()
            }
            other => panic!("expected connect, got {other:?}"),
        }

        peer.ping().await;
        assert_eq!(peer.recv_frame().await, "3");

        peer.emit_message(&message(1, "bob", "first")).await;
        peer.emit_message(&message(2, "bob", "second")).await;
        for expected in [1, 2] {
            match event_rx.recv().await {
                Some(SessionEvent::Channel(ChannelEvent::MessageReceived(received))) => {
                    assert_eq!(received.id, expected)
                }
                other => panic!("expected message, got {other:?}"),
            }
        }

        channel.send(outbound("hello there")).unwrap();
        assert_eq!(
            peer.recv_frame().await,
            r#"42["sendMessage",{"message":"hello there","username":"alice"}]"#
        );

        channel.close();
        assert_eq!(peer.recv_frame().await, "41");
        match event_rx.recv().await {
            Some(SessionEvent::Channel(ChannelEvent::Disconnected(reason))) => {
                assert_eq!(reason, DisconnectReason::ClientClose)
            }
            other => panic!("expected disconnect, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_abandons_a_handshake_in_flight() {
        let mut server = TestServer::start(Router::new()).await;
        let (events, mut event_rx) = mpsc::channel(16);
        let mut channel = RealtimeChannel::new();
        channel
            .connect(
                &server.base_url(),
                Duration::from_secs(60),
                events,
                &Handle::current(),
            )
            .unwrap();

        let mut peer = server.accept_silently().await;
        channel.close();

        peer.closed().await;
        assert!(event_rx.recv().await.is_none());
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn server_disconnect_is_reported() {
        let mut server = TestServer::start(Router::new()).await;
        let (events, mut event_rx) = mpsc::channel(16);
        let mut channel = RealtimeChannel::new();
        channel
            .connect(&server.base_url(), Duration::from_secs(3), events, &Handle::current())
            .unwrap();
        let mut peer = server.accept().await;

        assert!(matches!(
            event_rx.recv().await,
            Some(SessionEvent::Channel(ChannelEvent::Connected))
        ));
        peer.send_frame("41").await;

        match event_rx.recv().await {
            Some(SessionEvent::Channel(ChannelEvent::Disconnected(reason))) => {
                assert_eq!(reason, DisconnectReason::ServerDisconnect)
            }
            other => panic!("expected disconnect, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_namespace_is_a_connect_error() {
        let mut server = TestServer::start(Router::new()).await;
        let (events, mut event_rx) = mpsc::channel(16);
        let mut channel = RealtimeChannel::new();
        channel
            .connect(&server.base_url(), Duration::from_secs(3), events, &Handle::current())
            .unwrap();
        server.accept_and_refuse().await;

        match event_rx.recv().await {
            Some(SessionEvent::Channel(ChannelEvent::ConnectError(detail))) => {
                assert!(detail.contains("Not authorized"), "{detail}")
            }
            other => panic!("expected connect error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connect_error() {
        let address = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let (events, mut event_rx) = mpsc::channel(16);
        let mut channel = RealtimeChannel::new();
        channel
            .connect(
                &format!("http://{address}"),
                Duration::from_secs(3),
                events,
                &Handle::current(),
            )
            .unwrap();

        assert!(matches!(
            event_rx.recv().await,
            Some(SessionEvent::Channel(ChannelEvent::ConnectError(_)))
        ));
    }
}
