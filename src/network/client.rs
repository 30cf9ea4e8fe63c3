use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::common::{
    ChannelCommand, ChannelError, ChannelEvent, DisconnectReason, Message, OutboundMessage,
    SessionEvent,
};

use super::protocol::{Handshake, Packet};
use super::transport::{self, Socket};

const INBOUND_MESSAGE_EVENT: &str = "message";
const OUTBOUND_MESSAGE_EVENT: &str = "sendMessage";

/// Socket.IO client task: owns the websocket for one connection attempt.
///
/// Lifecycle signals and inbound messages go to the session queue in the order the
/// transport produced them; outbound emits arrive through the command queue.
pub struct SocketIoClient {
    url: String,
    handshake_timeout: Duration,
    event_sender: mpsc::Sender<SessionEvent>,
    command_receiver: mpsc::Receiver<ChannelCommand>,
}

impl SocketIoClient {
    pub fn new(
        url: String,
        handshake_timeout: Duration,
        event_sender: mpsc::Sender<SessionEvent>,
        command_receiver: mpsc::Receiver<ChannelCommand>,
    ) -> Self {
        Self {
            url,
            handshake_timeout,
            event_sender,
            command_receiver,
        }
    }

    pub async fn run(mut self) {
        let establish = establish(self.url.clone(), self.handshake_timeout);
        tokio::pin!(establish);

        // Teardown must win over a handshake still in flight.
        let (mut socket, handshake) = loop {
            tokio::select! {
                result = &mut establish => match result {
                    Ok(opened) => break opened,
                    Err(err) => {
                        self.emit(ChannelEvent::ConnectError(err.to_string())).await;
                        return;
                    }
                },
                command = self.command_receiver.recv() => match command {
                    Some(ChannelCommand::Emit(_)) => {
                        log::warn!("Dropping message emitted before the handshake finished");
                    }
                    Some(ChannelCommand::Close) | None => {
                        log::debug!("Connection attempt to {} abandoned", self.url);
                        return;
                    }
                },
            }
        };

        log::debug!("Socket.IO session {} established", handshake.sid);
        self.emit(ChannelEvent::Connected).await;

        let reason = self.event_loop(&mut socket, &handshake).await;
        self.emit(ChannelEvent::Disconnected(reason)).await;
    }

    async fn event_loop(&mut self, socket: &mut Socket, handshake: &Handshake) -> DisconnectReason {
        let liveness = Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
        let deadline = tokio::time::sleep(liveness);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(ChannelCommand::Emit(outbound)) => {
                            if let Err(err) = send_outbound(socket, &outbound).await {
                                log::warn!("Failed to emit message: {err}");
                                return DisconnectReason::TransportError;
                            }
                        }
                        Some(ChannelCommand::Close) | None => {
                            let _ = socket.send(text(&Packet::Disconnect)).await;
                            let _ = socket.close(None).await;
                            return DisconnectReason::ClientClose;
                        }
                    }
                }
                frame = socket.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(frame))) => match Packet::decode(frame.as_str()) {
                            Ok(Packet::Ping) => {
                                deadline.as_mut().reset(Instant::now() + liveness);
                                if socket.send(text(&Packet::Pong)).await.is_err() {
                                    return DisconnectReason::TransportError;
                                }
                            }
                            Ok(Packet::Event { name, payload }) => self.dispatch(&name, payload).await,
                            Ok(Packet::Disconnect) => return DisconnectReason::ServerDisconnect,
                            Ok(Packet::Close) => return DisconnectReason::TransportClose,
                            Ok(other) => log::debug!("Ignoring packet {other:?}"),
                            Err(err) => log::warn!("Dropping undecodable frame: {err}"),
                        },
                        Some(Ok(WsMessage::Close(_))) | None => return DisconnectReason::TransportClose,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            log::warn!("WebSocket receive failed: {err}");
                            return DisconnectReason::TransportError;
                        }
                    }
                }
                () = &mut deadline => return DisconnectReason::PingTimeout,
            }
        }
    }

    async fn dispatch(&self, name: &str, payload: serde_json::Value) {
        if name != INBOUND_MESSAGE_EVENT {
            log::debug!("Ignoring event `{name}`");
            return;
        }

        match serde_json::from_value::<Message>(payload) {
            Ok(message) => self.emit(ChannelEvent::MessageReceived(message)).await,
            Err(err) => log::warn!("Malformed `message` payload: {err}"),
        }
    }

    async fn emit(&self, event: ChannelEvent) {
        if self.event_sender.send(event.into()).await.is_err() {
            log::debug!("Chat session is gone; dropping channel event");
        }
    }
}

/// Opens the websocket and completes the handshake, each step bounded by `handshake_timeout`.
async fn establish(
    url: String,
    handshake_timeout: Duration,
) -> Result<(Socket, Handshake), ChannelError> {
    let mut socket = timeout(handshake_timeout, transport::open(&url))
        .await
        .map_err(|_| ChannelError::HandshakeTimeout)??;

    match timeout(handshake_timeout, handshake(&mut socket)).await {
        Ok(Ok(handshake)) => Ok((socket, handshake)),
        Ok(Err(err)) => {
            let _ = socket.close(None).await;
            Err(err)
        }
        Err(_) => {
            let _ = socket.close(None).await;
            Err(ChannelError::HandshakeTimeout)
        }
    }
}

/// Engine.IO open, then Socket.IO connect to the default namespace.
async fn handshake(socket: &mut Socket) -> Result<Handshake, ChannelError> {
    let handshake = match next_packet(socket).await? {
        Packet::Open(handshake) => handshake,
        other => return Err(ChannelError::UnexpectedPacket(format!("{other:?}"))),
    };

    socket.send(text(&Packet::Connect(None))).await?;

    loop {
        match next_packet(socket).await? {
            Packet::Connect(_) => return Ok(handshake),
            Packet::ConnectError(detail) => return Err(ChannelError::Rejected(detail.to_string())),
            Packet::Ping => socket.send(text(&Packet::Pong)).await?,
            Packet::Close | Packet::Disconnect => return Err(ChannelError::TransportClosed),
            other => log::debug!("Ignoring {other:?} before namespace ack"),
        }
    }
}

async fn next_packet(socket: &mut Socket) -> Result<Packet, ChannelError> {
    loop {
        match socket.next().await {
            Some(Ok(WsMessage::Text(frame))) => return Ok(Packet::decode(frame.as_str())?),
            Some(Ok(WsMessage::Close(_))) | None => return Err(ChannelError::TransportClosed),
            Some(Ok(_)) => continue,
            Some(Err(err)) => return Err(err.into()),
        }
    }
}

async fn send_outbound(socket: &mut Socket, outbound: &OutboundMessage) -> Result<(), ChannelError> {
    let payload = serde_json::to_value(outbound).map_err(super::protocol::ProtocolError::from)?;
    socket
        .send(text(&Packet::event(OUTBOUND_MESSAGE_EVENT, payload)))
        .await?;
    Ok(())
}

fn text(packet: &Packet) -> WsMessage {
    WsMessage::text(packet.encode())
}
