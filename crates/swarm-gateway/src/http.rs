//! [`Gateway`] over the platform's REST API using `reqwest`.

use std::time::Duration;

use chrono::Utc;
use serde_json::{Value, json};
use swarm_core::{Gateway, GatewayError};
use swarm_types::{
    Catalog, Credentials, EntityId, GenerationCategory, GenerationForm, LifecycleCategory, Listing,
    Outcome, Session, SocialAction, TelemetryAck, TelemetryEvent,
};

use crate::classify::{classify, generated_id, parse_listings, parse_login, telemetry_ack};
use crate::routes;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default lifetime of a fresh session in days.
const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Configuration for [`HttpGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How long a fresh session may be reused.
    pub session_ttl: chrono::Duration,
}

impl GatewayConfig {
    /// Create a configuration for `base_url` with default timeouts.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_ttl: chrono::Duration::days(DEFAULT_SESSION_TTL_DAYS),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for the platform.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("HTTP client init failed: {e}")))?;
        Ok(Self { client, config })
    }

    /// The configuration in use.
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn post(
        &self,
        session: Option<&Session>,
        path: &str,
        body: &Value,
    ) -> Result<(u16, Value), GatewayError> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(session) = session {
            request = request.bearer_auth(&session.token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("POST {path} failed: {e}")))?;
        read_body(path, response).await
    }

    async fn get(&self, session: &Session, path: &str) -> Result<(u16, Value), GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&session.token)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("GET {path} failed: {e}")))?;
        read_body(path, response).await
    }
}

/// Read the status and JSON body of a response.
///
/// An error status with a non-JSON body still yields an outcome; a success
/// status with a non-JSON body is undecodable.
async fn read_body(path: &str, response: reqwest::Response) -> Result<(u16, Value), GatewayError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| GatewayError::Transport(format!("reading {path} failed: {e}")))?;

    let body = match serde_json::from_str::<Value>(&text) {
        Ok(body) => body,
        Err(_) if !status.is_success() => Value::Null,
        Err(e) => return Err(GatewayError::Decode(format!("{path}: {e}"))),
    };

    if !status.is_success() {
        tracing::debug!(%status, path, message = ?body.get("message"), "API error");
    }
    Ok((status.as_u16(), body))
}

fn unit(outcome: Outcome<Value>) -> Outcome {
    outcome.map(|_| ())
}

impl Gateway for HttpGateway {
    async fn login(&self, credentials: &Credentials) -> Result<Session, GatewayError> {
        let body = json!({
            "username": credentials.username,
            "password": credentials.password,
        });
        let (status, body) = self.post(None, routes::LOGIN, &body).await?;
        parse_login(status, &body, Utc::now(), self.config.session_ttl)
    }

    async fn browse(
        &self,
        session: &Session,
        catalog: Catalog,
        limit: u32,
    ) -> Result<Vec<Listing>, GatewayError> {
        let path = routes::catalog(catalog, limit);
        let (status, body) = self.get(session, &path).await?;
        if !(200..300).contains(&status) {
            tracing::debug!(status, ?catalog, "Catalog unavailable");
            return Ok(Vec::new());
        }
        let mut listings = parse_listings(&body);
        listings.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(listings)
    }

    async fn start_lifecycle(
        &self,
        session: &Session,
        category: LifecycleCategory,
        item: EntityId,
    ) -> Result<Outcome, GatewayError> {
        let path = routes::lifecycle(category, item, "start");
        let (status, body) = self.post(Some(session), &path, &json!({})).await?;
        Ok(unit(classify(status, &body)))
    }

    async fn complete_lifecycle(
        &self,
        session: &Session,
        category: LifecycleCategory,
        item: EntityId,
    ) -> Result<Outcome, GatewayError> {
        let path = routes::lifecycle(category, item, "complete");
        let (status, body) = self.post(Some(session), &path, &json!({})).await?;
        Ok(unit(classify(status, &body)))
    }

    async fn perform_once(
        &self,
        session: &Session,
        action: &SocialAction,
        target: EntityId,
    ) -> Result<Outcome, GatewayError> {
        let (path, request) = routes::social(action, target);
        let (status, body) = self.post(Some(session), &path, &request).await?;
        Ok(unit(classify(status, &body)))
    }

    async fn generate_content(
        &self,
        session: &Session,
        category: GenerationCategory,
        form: &GenerationForm,
    ) -> Result<Outcome<EntityId>, GatewayError> {
        let (path, request) = routes::generation(category, form);
        let (status, body) = self.post(Some(session), &path, &request).await?;
        Ok(generated_id(classify(status, &body)))
    }

    async fn dispatch_telemetry(
        &self,
        session: &Session,
        event: TelemetryEvent,
    ) -> Result<Outcome<TelemetryAck>, GatewayError> {
        let request = routes::telemetry(event);
        let (status, body) = self.post(Some(session), routes::EVENTS, &request).await?;
        Ok(classify(status, &body).map(|data| telemetry_ack(&data)))
    }
}
