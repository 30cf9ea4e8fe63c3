use std::time::Duration;

use eframe::egui;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::common::{ConnectionState, Message};
use crate::config::AppConfig;
use crate::network::AuthClient;
use crate::session::{ChatSession, SessionConfig, SessionContext};
use crate::storage::IdentityStore;

use super::components::{chat_area, input_bar, login_form, status_bar};
use super::state::{LoginState, Screen};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ChatApp {
    config: AppConfig,
    runtime: Handle,
    http: reqwest::Client,
    identity_store: IdentityStore,
    repaint: egui::Context,
    screen: Screen,
    login: LoginState,
    session: Option<ChatSession>,
    draft: String,
}

impl ChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig, runtime: Handle) -> Self {
        let identity_store = IdentityStore::new(&config.identity_path);
        let mut app = Self {
            config,
            runtime,
            http: reqwest::Client::new(),
            identity_store,
            repaint: cc.egui_ctx.clone(),
            screen: Screen::Login,
            login: LoginState::new(),
            session: None,
            draft: String::new(),
        };
        app.enter_chat();
        app
    }

    /// Activates the chat screen, or stays on login when no identity is stored.
    fn enter_chat(&mut self) {
        let context = SessionContext::from_store(&self.identity_store);
        match ChatSession::activate(
            &context,
            SessionConfig::from(&self.config),
            self.http.clone(),
            &self.runtime,
        ) {
            Ok(mut session) => {
                let ctx = self.repaint.clone();
                session.subscribe(Box::new(move |_: &[Message]| ctx.request_repaint()));
                log::info!("Entering chat room as {}", session.identity());
                self.session = Some(session);
                self.draft.clear();
                self.screen = Screen::Chat;
            }
            Err(err) => {
                log::info!("{err}; showing login screen");
                self.session = None;
                self.screen = Screen::Login;
            }
        }
    }

    fn submit_login(&mut self) {
        let auth = AuthClient::new(self.http.clone(), &self.config.server_url);
        let username = self.login.username_input.clone();
        let (tx, rx) = oneshot::channel();
        self.runtime.spawn(async move {
            let _ = tx.send(auth.sign_in(&username).await);
        });
        self.login.begin(rx);
    }

    fn poll_login(&mut self) {
        let Some(identity) = self.login.poll() else {
            return;
        };
        if let Err(err) = self.identity_store.save(&identity) {
            log::error!(
                "Failed to persist identity to {}: {err}",
                self.identity_store.path().display()
            );
            self.login.error = Some("Could not save your login locally.".to_string());
            return;
        }
        self.enter_chat();
    }

    fn leave(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
        if let Err(err) = self.identity_store.clear() {
            log::warn!("Failed to clear stored identity: {err}");
        }
        self.screen = Screen::Login;
    }

    fn show_login(&mut self, ctx: &egui::Context) {
        self.poll_login();

        egui::CentralPanel::default().show(ctx, |ui| {
            if login_form::render(ui, &mut self.login) {
                self.submit_login();
            }
        });

        if self.login.is_pending() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }

    fn show_chat(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            // Chat without a session means the identity went missing.
            self.screen = Screen::Login;
            return;
        };
        session.pump();

        let mut actions = status_bar::StatusActions::default();
        egui::TopBottomPanel::top("chat_header").show(ctx, |ui| {
            actions = status_bar::render(
                ui,
                session.identity().as_str(),
                session.connection_state(),
            );
        });

        egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
            ui.add_space(4.0);
            let connected = session.connection_state() == ConnectionState::Connected;
            if input_bar::render(ui, &mut self.draft, connected) {
                session.submit(&mut self.draft);
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            chat_area::render(ui, session.messages(), session.identity());
        });

        if actions.leave {
            self.leave();
        } else if actions.reconnect {
            session.remount(&self.runtime);
        }

        ctx.request_repaint_after(POLL_INTERVAL);
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.screen {
            Screen::Login => self.show_login(ctx),
            Screen::Chat => self.show_chat(ctx),
        }
    }
}
