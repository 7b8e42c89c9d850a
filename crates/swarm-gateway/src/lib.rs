//! HTTP gateway to the remote platform for the Swarm simulation.
//!
//! Implements [`swarm_core::Gateway`] over the platform's REST API. All
//! "already done" message sniffing lives in [`classify`]; callers only see
//! closed [`Outcome`](swarm_types::Outcome) variants.
//!
//! # Modules
//!
//! - [`http`] -- [`HttpGateway`] and its configuration
//! - [`classify`] -- Response classification and payload parsing
//! - [`routes`] -- Endpoint paths and request bodies

pub mod classify;
pub mod http;
pub mod routes;

pub use http::{GatewayConfig, HttpGateway};
