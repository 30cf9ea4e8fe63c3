mod common;
mod config;
mod network;
mod session;
mod storage;
mod ui;

#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use common::Message;
use config::AppConfig;
use dotenvy::dotenv;
use std::io::Write;
use network::AuthClient;
use session::{ChatSession, SessionConfig, SessionContext};
use storage::IdentityStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use ui::ChatApp;

#[derive(Parser)]
#[command(name = "chatroom_client", version, about = "Real-time chat room client")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Chat server base url, overrides config file and CHAT_SERVER_URL
    #[arg(long, value_name = "URL")]
    server: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Mode {
    /// Run without UI: print the room to stdout, send each stdin line
    Headless {
        /// Log in as this user first instead of using the stored identity
        #[arg(long)]
        username: Option<String>,
    },
    /// Forget the stored identity
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config)
        .with_overrides(std::env::var(config::SERVER_URL_ENV).ok(), cli.server);
    log::info!("Using chat server {}", app_config.server_url);

    match cli.mode {
        Some(Mode::Headless { username }) => {
            run_headless(app_config, username).await;
            Ok(())
        }
        Some(Mode::Logout) => {
            logout(&app_config);
            Ok(())
        }
        None => run_gui(app_config),
    }
}

fn run_gui(app_config: AppConfig) -> Result<(), eframe::Error> {
    let runtime = Handle::current();
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Chat App",
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, app_config, runtime)))),
    )
}

async fn run_headless(app_config: AppConfig, username: Option<String>) {
    let store = IdentityStore::new(&app_config.identity_path);
    let http = reqwest::Client::new();

    if let Some(username) = username {
        let auth = AuthClient::new(http.clone(), &app_config.server_url);
        match auth.sign_in(&username).await {
            Ok(identity) => {
                if let Err(err) = store.save(&identity) {
                    log::warn!("Failed to persist identity: {err}");
                }
            }
            Err(err) => {
                log::error!("Login failed: {err}");
                return;
            }
        }
    }

    let context = SessionContext::from_store(&store);
    let mut session = match ChatSession::activate(
        &context,
        SessionConfig::from(&app_config),
        http,
        &Handle::current(),
    ) {
        Ok(session) => session,
        Err(err) => {
            log::error!("{err}");
            return;
        }
    };
    session.subscribe(print_new_messages(std::io::stdout()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(mut draft)) => {
                    session.submit(&mut draft);
                }
                Ok(None) => break,
                Err(err) => {
                    log::warn!("Failed to read stdin: {err}");
                    break;
                }
            },
            alive = session.process_next() => {
                if !alive {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.stop();
}

/// Prints messages as they land; reprints everything when history replaced the stream.
fn print_new_messages<W: Write + Send + 'static>(mut out: W) -> Box<dyn FnMut(&[Message]) + Send> {
    let mut printed = 0usize;
    let mut last_id = None;

    Box::new(move |messages: &[Message]| {
        let prefix_intact = printed <= messages.len()
            && (printed == 0 || Some(messages[printed - 1].id) == last_id);
        let start = if prefix_intact { printed } else { 0 };

        for message in &messages[start..] {
            if let Err(err) = writeln!(
                out,
                "[{}] {}: {}",
                message.display_timestamp(),
                message.username,
                message.message
            ) {
                log::warn!("Failed to print message {}: {err}", message.id);
                break;
            }
        }
        printed = messages.len();
        last_id = messages.last().map(|message| message.id);
    })
}

fn logout(app_config: &AppConfig) {
    let store = IdentityStore::new(&app_config.identity_path);
    match store.clear() {
        Ok(()) => log::info!("Cleared stored identity at {}", store.path().display()),
        Err(err) => log::error!("Failed to clear {}: {err}", store.path().display()),
    }
}
