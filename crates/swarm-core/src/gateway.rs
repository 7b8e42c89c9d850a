//! Remote action gateway trait.
//!
//! A [`Gateway`] performs the actual network actions against the platform.
//! Every action that reaches the platform yields a closed [`Outcome`]:
//! applied, already applied, or failed. An `Err` means the request never
//! produced a usable answer (connection failure, timeout, undecodable
//! body). Detecting "already done" answers is the gateway's job; the
//! orchestrator only ever matches on [`Outcome`] variants.

use std::future::Future;

use swarm_types::{
    Catalog, Credentials, EntityId, GenerationCategory, GenerationForm, LifecycleCategory, Listing,
    Outcome, Session, SocialAction, TelemetryAck, TelemetryEvent,
};

/// Errors raised by a [`Gateway`] when no outcome could be obtained.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request could not be sent or the response not read.
    #[error("transport error: {0}")]
    Transport(String),

    /// Login was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The platform answered with something that could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Network boundary to the remote platform.
pub trait Gateway: Send + Sync {
    /// Obtain a fresh session.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Session, GatewayError>> + Send;

    /// List up to `limit` entries of a catalog.
    fn browse(
        &self,
        session: &Session,
        catalog: Catalog,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Listing>, GatewayError>> + Send;

    /// Start a diet or exercise plan.
    fn start_lifecycle(
        &self,
        session: &Session,
        category: LifecycleCategory,
        item: EntityId,
    ) -> impl Future<Output = Result<Outcome, GatewayError>> + Send;

    /// Complete a previously started plan.
    fn complete_lifecycle(
        &self,
        session: &Session,
        category: LifecycleCategory,
        item: EntityId,
    ) -> impl Future<Output = Result<Outcome, GatewayError>> + Send;

    /// Perform a one-shot social action on `target`.
    fn perform_once(
        &self,
        session: &Session,
        action: &SocialAction,
        target: EntityId,
    ) -> impl Future<Output = Result<Outcome, GatewayError>> + Send;

    /// Ask the platform to generate a plan; an applied outcome carries the
    /// id of the produced entity.
    fn generate_content(
        &self,
        session: &Session,
        category: GenerationCategory,
        form: &GenerationForm,
    ) -> impl Future<Output = Result<Outcome<EntityId>, GatewayError>> + Send;

    /// Dispatch a telemetry event.
    fn dispatch_telemetry(
        &self,
        session: &Session,
        event: TelemetryEvent,
    ) -> impl Future<Output = Result<Outcome<TelemetryAck>, GatewayError>> + Send;
}
