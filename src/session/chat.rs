use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::common::{
    ChannelEvent, ConnectionState, Identity, MergePolicy, Message, SessionError, SessionEvent,
};
use crate::config::AppConfig;
use crate::network::{HistoryLoader, RealtimeChannel};

use super::context::SessionContext;
use super::send::{SendPath, SubmitOutcome};
use super::stream::{MessageStream, Observer};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server_url: String,
    pub merge_policy: MergePolicy,
    pub event_buffer: usize,
    pub handshake_timeout: Duration,
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            server_url: config.server_url.clone(),
            merge_policy: config.merge_policy,
            event_buffer: config.event_buffer.max(1),
            handshake_timeout: Duration::from_secs(config.handshake_timeout_secs),
        }
    }
}

/// State of one chat screen: history load, live channel and the merged stream.
///
/// All mutations of the stream happen here, one queued event at a time. The history
/// task and the transport task only ever talk to this session through its event queue,
/// which is replaced on every activation and dropped on teardown.
pub struct ChatSession {
    identity: Identity,
    config: SessionConfig,
    http: reqwest::Client,
    stream: MessageStream,
    channel: RealtimeChannel,
    send_path: SendPath,
    events: Option<mpsc::Receiver<SessionEvent>>,
}

impl ChatSession {
    /// Builds and starts a session, or refuses when nobody is logged in.
    pub fn activate(
        context: &SessionContext,
        config: SessionConfig,
        http: reqwest::Client,
        runtime: &Handle,
    ) -> Result<Self, SessionError> {
        let identity = context.get().cloned().ok_or(SessionError::MissingIdentity)?;
        let mut session = Self::new(identity, config, http);
        session.start(runtime);
        Ok(session)
    }

    pub fn new(identity: Identity, config: SessionConfig, http: reqwest::Client) -> Self {
        let stream = MessageStream::new(config.merge_policy);
        let send_path = SendPath::new(Some(identity.clone()));
        Self {
            identity,
            config,
            http,
            stream,
            channel: RealtimeChannel::new(),
            send_path,
            events: None,
        }
    }

    /// Fires the history request and the channel connection concurrently.
    pub fn start(&mut self, runtime: &Handle) {
        let (event_sender, event_receiver) = mpsc::channel(self.config.event_buffer);
        self.events = Some(event_receiver);

        let loader = HistoryLoader::new(self.http.clone(), &self.config.server_url);
        let history_sender = event_sender.clone();
        runtime.spawn(async move {
            let result = loader.load().await;
            if history_sender
                .send(SessionEvent::HistoryLoaded(result))
                .await
                .is_err()
            {
                log::debug!("Chat screen closed before history arrived; discarding it");
            }
        });

        if let Err(err) = self.channel.connect(
            &self.config.server_url,
            self.config.handshake_timeout,
            event_sender,
            runtime,
        ) {
            log::error!("Could not start realtime channel: {err}");
        }
    }

    /// Teardown. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.channel.close();
        self.events = None;
    }

    /// Tears down and activates again: fresh stream, history and connection.
    pub fn remount(&mut self, runtime: &Handle) {
        self.stop();
        self.stream.reset();
        self.start(runtime);
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn messages(&self) -> &[Message] {
        self.stream.messages()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.stream.subscribe(observer);
    }

    pub fn submit(&mut self, draft: &mut String) -> SubmitOutcome {
        self.send_path.submit(draft, &self.channel)
    }

    /// Applies every queued event without waiting. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.events.as_mut().and_then(|events| events.try_recv().ok()) {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Waits for the next event and applies it. `false` once nothing can arrive anymore.
    pub async fn process_next(&mut self) -> bool {
        let Some(events) = self.events.as_mut() else {
            return false;
        };
        match events.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    pub(crate) fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::HistoryLoaded(Ok(history)) => {
                log::info!("Loaded {} messages of history", history.len());
                self.stream.replace_all(history);
            }
            SessionEvent::HistoryLoaded(Err(err)) => {
                log::error!("Failed to load message history: {err}");
            }
            SessionEvent::Channel(ChannelEvent::Connected) => {
                if let Err(err) = self.channel.mark_connected() {
                    log::warn!("Ignoring connect signal: {err}");
                }
            }
            SessionEvent::Channel(ChannelEvent::Disconnected(reason)) => {
                self.channel.mark_disconnected(&reason.to_string());
            }
            SessionEvent::Channel(ChannelEvent::ConnectError(detail)) => {
                log::error!("WebSocket connection error: {detail}");
                self.channel.mark_disconnected("connect error");
            }
            SessionEvent::Channel(ChannelEvent::MessageReceived(message)) => {
                self.stream.append(message);
            }
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.stop();
    }
}
