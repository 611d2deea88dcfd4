//! HTCPCP request dispatching
//!
//! Maps a request method and its headers onto a pot operation or a read,
//! and renders the outcome. The request path is never consulted.

use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::SettingsSource;
use crate::pot::{Pot, PotError, PotState};

/// Media type marking a request body as a coffee pot command
pub const COFFEE_POT_COMMAND: &str = "application/coffee-pot-command";
/// Request header listing the additions a client wants
pub const ACCEPT_ADDITIONS: &str = "accept-additions";
/// Response header advertising the supported additions
pub const ADDITIONS_LIST: &str = "additions-list";
pub const SUPPORTED_ADDITIONS: &str = "milk";
pub const ALLOWED_METHODS: &str = "BREW, POST, GET, PROPFIND, WHEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `BREW` or `POST`
    Brew,
    Get,
    Propfind,
    When,
}

impl Verb {
    pub fn parse(method: &Method) -> Option<Self> {
        match method.as_str() {
            "BREW" | "POST" => Some(Verb::Brew),
            "GET" => Some(Verb::Get),
            "PROPFIND" => Some(Verb::Propfind),
            "WHEN" => Some(Verb::When),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("coffee content type is not set")]
    MissingContentType,
    #[error("additions are not supported (requested {requested})")]
    UnsupportedAdditions { requested: String },
    #[error("method {method} is not allowed")]
    MethodNotAllowed { method: String },
    #[error("failed to brew: {0}")]
    Brew(#[source] PotError),
    #[error("failed to stop pouring: {0}")]
    StopPouring(#[source] PotError),
    #[error("failed to encode pot status: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::MissingContentType => StatusCode::BAD_REQUEST,
            DispatchError::UnsupportedAdditions { .. } => StatusCode::NOT_ACCEPTABLE,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::Brew(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::StopPouring(PotError::NotPouring { .. }) => StatusCode::BAD_REQUEST,
            DispatchError::StopPouring(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client; details stay in the logs
    fn public_message(&self) -> &'static str {
        match self {
            DispatchError::MissingContentType => "Coffee content type is not set",
            DispatchError::UnsupportedAdditions { .. } => "Additions are not supported",
            DispatchError::MethodNotAllowed { .. } => "Method not allowed",
            DispatchError::Brew(_) => "Brewing error",
            DispatchError::StopPouring(PotError::NotPouring { .. }) => "Nothing is pouring",
            DispatchError::StopPouring(_) => "Stop pouring error",
            DispatchError::Encoding(_) => "JSON encoding failed",
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = format!("{}\n", self.public_message());
        match self {
            DispatchError::MethodNotAllowed { .. } => {
                (status, [(header::ALLOW, ALLOWED_METHODS)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

/// Routes HTCPCP verbs to the pot
#[derive(Clone)]
pub struct Dispatcher {
    pot: Pot,
    settings_source: Option<Arc<dyn SettingsSource>>,
}

impl Dispatcher {
    pub fn new(pot: Pot) -> Self {
        Self {
            pot,
            settings_source: None,
        }
    }

    /// Reload pot settings from `source` before each request
    pub fn with_settings_source(mut self, source: Arc<dyn SettingsSource>) -> Self {
        self.settings_source = Some(source);
        self
    }

    pub async fn dispatch(
        &self,
        method: &Method,
        headers: &HeaderMap,
    ) -> Result<Response, DispatchError> {
        self.reload_settings().await;

        match Verb::parse(method) {
            Some(Verb::Brew) => self.brew(headers).await,
            Some(Verb::Get) => self.status().await,
            Some(Verb::Propfind) => self.coffee_type().await,
            Some(Verb::When) => self.stop_pouring(headers).await,
            None => Err(DispatchError::MethodNotAllowed {
                method: method.to_string(),
            }),
        }
    }

    async fn brew(&self, headers: &HeaderMap) -> Result<Response, DispatchError> {
        require_coffee_command(headers)?;
        if let Some(requested) = requested_additions(headers) {
            return Err(DispatchError::UnsupportedAdditions { requested });
        }

        self.pot.brew(&[]).await.map_err(DispatchError::Brew)?;
        info!("Brew started");
        Ok(StatusCode::OK.into_response())
    }

    async fn status(&self) -> Result<Response, DispatchError> {
        let body = serde_json::to_string(&self.pot.snapshot().await)?;
        Ok((
            [
                (header::CONTENT_TYPE, "application/json"),
                (HeaderName::from_static(ADDITIONS_LIST), SUPPORTED_ADDITIONS),
            ],
            body,
        )
            .into_response())
    }

    async fn coffee_type(&self) -> Result<Response, DispatchError> {
        let coffee_type = self.pot.coffee_type().await;
        Ok(([(header::CONTENT_TYPE, "text/plain")], coffee_type).into_response())
    }

    async fn stop_pouring(&self, headers: &HeaderMap) -> Result<Response, DispatchError> {
        require_coffee_command(headers)?;

        self.pot
            .stop_pouring()
            .await
            .map_err(DispatchError::StopPouring)?;
        info!("Pouring stopped");
        Ok(StatusCode::OK.into_response())
    }

    /// Reload is gated on the pot being Ready; `Pot::reconfigure` repeats the
    /// check under its lock.
    async fn reload_settings(&self) {
        let Some(source) = &self.settings_source else {
            return;
        };
        if self.pot.state().await != PotState::Ready {
            debug!("Pot busy, keeping current settings");
            return;
        }

        // Sources may hit the filesystem; keep that off the async workers
        let source = Arc::clone(source);
        match tokio::task::spawn_blocking(move || source.load()).await {
            Ok(Ok(settings)) => {
                if !self.pot.reconfigure(settings).await {
                    debug!("Pot left Ready during reload, keeping current settings");
                }
            }
            Ok(Err(e)) => warn!(error = %e, "Failed to reload settings, keeping current ones"),
            Err(e) => warn!(error = %e, "Settings reload task failed, keeping current settings"),
        }
    }
}

fn require_coffee_command(headers: &HeaderMap) -> Result<(), DispatchError> {
    let is_coffee = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(COFFEE_POT_COMMAND));

    if is_coffee {
        Ok(())
    } else {
        Err(DispatchError::MissingContentType)
    }
}

fn requested_additions(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACCEPT_ADDITIONS)
        .filter(|value| !value.is_empty())
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}
