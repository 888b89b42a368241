//! Blocking Gitea API client using ureq

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::Login;

const USER_AGENT: &str = concat!("tea/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// The authenticated user as returned by `GET /api/v1/user`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(alias = "username")]
    pub login: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// A personal access token. `sha1` holds the secret and is only filled in
/// the response to a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessToken {
    pub id: i64,
    pub name: String,
    pub sha1: String,
    pub token_last_eight: String,
    pub scopes: Vec<String>,
}

/// Body of `POST /api/v1/users/{user}/tokens`
#[derive(Debug, Clone, Serialize)]
pub struct CreateAccessToken {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

enum Auth {
    Token(String),
    Basic {
        user: String,
        password: String,
        otp: Option<String>,
    },
}

/// API client bound to one login
pub struct GiteaClient {
    base_url: String,
    auth: Auth,
    agent: ureq::Agent,
}

fn make_agent(insecure: bool) -> ureq::Agent {
    let mut builder = ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(30)));
    if insecure {
        builder = builder.tls_config(
            ureq::tls::TlsConfig::builder()
                .disable_verification(true)
                .build(),
        );
    }
    builder.build().new_agent()
}

impl GiteaClient {
    /// Client authenticating with the login's token
    pub fn new(login: &Login) -> Self {
        Self {
            base_url: login.base_url(),
            auth: Auth::Token(login.token.clone()),
            agent: make_agent(login.insecure),
        }
    }

    /// Client authenticating with username and password against the
    /// login's server, optionally sending a one-time password
    pub fn with_basic_auth(login: &Login, user: &str, password: &str, otp: Option<&str>) -> Self {
        Self {
            base_url: login.base_url(),
            auth: Auth::Basic {
                user: user.to_string(),
                password: password.to_string(),
                otp: otp.filter(|o| !o.is_empty()).map(str::to_string),
            },
            agent: make_agent(login.insecure),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the user owning the credentials
    pub fn get_my_user_info(&self) -> Result<User, ApiError> {
        self.get("/user")
    }

    /// Lists the access tokens of `user`
    pub fn list_access_tokens(&self, user: &str) -> Result<Vec<AccessToken>, ApiError> {
        self.get(&format!("/users/{}/tokens", encode_segment(user)))
    }

    /// Creates an access token for `user`; requires basic auth
    pub fn create_access_token(
        &self,
        user: &str,
        option: &CreateAccessToken,
    ) -> Result<AccessToken, ApiError> {
        let url = self.url(&format!("/users/{}/tokens", encode_segment(user)));
        debug!(%url, name = %option.name, "POST");

        let request = self.authorize(self.agent.post(&url));
        let response = request.send_json(option)?;
        read_response(response)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self.authorize(self.agent.get(&url)).call()?;
        read_response(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let request = request
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT);

        match &self.auth {
            Auth::Token(token) if token.is_empty() => request,
            Auth::Token(token) => request.header("Authorization", &format!("token {}", token)),
            Auth::Basic {
                user,
                password,
                otp,
            } => {
                let credentials =
                    general_purpose::STANDARD.encode(format!("{}:{}", user, password));
                let request = request.header("Authorization", &format!("Basic {}", credentials));
                match otp {
                    Some(otp) => request.header("X-Gitea-OTP", otp),
                    None => request,
                }
            }
        }
    }
}

fn read_response<T: DeserializeOwned>(
    response: ureq::http::Response<ureq::Body>,
) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    if status == 401 || status == 403 {
        let message = response.into_body().read_to_string().unwrap_or_default();
        return Err(ApiError::Auth(error_message(&message, status)));
    }
    if status >= 400 {
        let message = response.into_body().read_to_string().unwrap_or_default();
        return Err(ApiError::Api {
            status,
            message: error_message(&message, status),
        });
    }

    Ok(response.into_body().read_json()?)
}

fn encode_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Gitea reports errors as `{"message": "..."}`; fall back to the raw body
fn error_message(body: &str, status: u16) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ if body.trim().is_empty() => format!("status {}", status),
        _ => body.trim().to_string(),
    }
}
