use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::common::ChannelError;

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SOCKET_IO_PATH: &str = "/socket.io/?EIO=4&transport=websocket";

/// Maps the REST base url onto the Engine.IO websocket endpoint of the same host.
pub fn websocket_url(server_url: &str) -> Result<String, ChannelError> {
    let base = server_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(ChannelError::InvalidUrl(server_url.to_string()));
    };

    Ok(format!("{ws_base}{SOCKET_IO_PATH}"))
}

pub async fn open(url: &str) -> Result<Socket, ChannelError> {
    let (socket, response) = connect_async(url).await?;
    log::debug!("WebSocket upgrade to {url} answered {}", response.status());
    Ok(socket)
}
