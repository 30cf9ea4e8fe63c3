use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{AuthError, Identity};

const REGISTER_FAILED: &str = "Registration failed.";
const LOGIN_FAILED: &str = "Login failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    AlreadyRegistered,
}

#[derive(Serialize)]
struct UsernameBody<'a> {
    username: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

/// REST side of the login screen: register (tolerating duplicates), then log in.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    server_url: String,
}

impl AuthClient {
    pub fn new(client: reqwest::Client, server_url: &str) -> Self {
        Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn sign_in(&self, raw_username: &str) -> Result<Identity, AuthError> {
        let identity = Identity::new(raw_username).ok_or(AuthError::EmptyUsername)?;

        match self.register(&identity).await? {
            Registration::Created => log::info!("Registered new user {identity}"),
            Registration::AlreadyRegistered => log::info!("User {identity} already registered"),
        }
        self.login(&identity).await?;
        log::info!("Logged in as {identity}");

        Ok(identity)
    }

    pub async fn register(&self, identity: &Identity) -> Result<Registration, AuthError> {
        let response = self.post("register", identity).await?;
        let status = response.status();

        if status.is_success() {
            Ok(Registration::Created)
        } else if status == StatusCode::BAD_REQUEST {
            Ok(Registration::AlreadyRegistered)
        } else {
            Err(rejection(response, REGISTER_FAILED).await)
        }
    }

    pub async fn login(&self, identity: &Identity) -> Result<(), AuthError> {
        let response = self.post("login", identity).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejection(response, LOGIN_FAILED).await)
        }
    }

    async fn post(&self, path: &str, identity: &Identity) -> Result<reqwest::Response, AuthError> {
        self.client
            .post(format!("{}/{path}", self.server_url))
            .json(&UsernameBody {
                username: identity.as_str(),
            })
            .send()
            .await
            .map_err(AuthError::Unreachable)
    }
}

/// FastAPI puts a string in `detail` for HTTPException and a list for validation errors.
async fn rejection(response: reqwest::Response, fallback: &str) -> AuthError {
    let status = response.status();
    let detail = match response.json::<ErrorBody>().await {
        Ok(ErrorBody {
            detail: Some(Value::String(detail)),
        }) if !detail.is_empty() => detail,
        _ => fallback.to_string(),
    };

    AuthError::Rejected { status, detail }
}
