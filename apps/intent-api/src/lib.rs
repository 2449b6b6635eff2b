//! # Tally Intent API
//!
//! HTTP bridge that executes structured intents against a tenant's
//! business data. An upstream NLU layer turns chat text into an intent
//! name and an entity bag; this service authorizes the caller, runs the
//! matching handler and answers with a chat-ready message.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Intent API Server                                │
//! │                                                                         │
//! │  POST /v1/intents/execute                                               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌────────────────────┐ │
//! │  │   auth   │──►│ authorizer │──►│  router  │──►│ handlers/*         │ │
//! │  │ JWT/key  │   │ membership │   │ dispatch │   │ sale, inventory,   │ │
//! │  └──────────┘   │ + role     │   │ + timing │   │ expense, staff ... │ │
//! │                 └────────────┘   └──────────┘   └─────────┬──────────┘ │
//! │                                                           │            │
//! │                        ┌───────────┐   ┌──────────────┐   │            │
//! │                        │ formatter │◄──│  sequence    │◄──┤            │
//! │                        └───────────┘   └──────────────┘   ▼            │
//! │                                              TimedStore<PgStore>       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - `BridgeConfig` from `tally.toml` and `TALLY_*` variables
//! - [`auth`] - Bearer credential verification (JWT and service key)
//! - [`authorizer`] - Membership lookup and permission check
//! - [`router`] - Intent dispatch and response envelope
//! - [`handlers`] - One handler per intent
//! - [`sequence`] - `PREFIX-YYYY-NNNN` document numbers
//! - [`formatter`] - Human-readable messages
//! - [`http`] - axum routes
//! - [`error`] - `AuthError` / `ApiError` and their HTTP mapping
//! - [`response`] - Request and response bodies

pub mod auth;
pub mod authorizer;
pub mod config;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod http;
pub mod response;
pub mod router;
pub mod sequence;

use chrono::FixedOffset;
use std::sync::Arc;

use tally_db::Store;

use crate::auth::CredentialVerifier;
use crate::config::BridgeConfig;
use crate::formatter::Formatter;
use crate::sequence::SequenceGenerator;

pub use crate::error::{ApiError, AuthError};
pub use crate::response::{ExecuteRequest, ExecuteResponse};

/// Shared application state.
///
/// Immutable after startup; handlers receive it by reference.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub credentials: CredentialVerifier,
    pub sequences: SequenceGenerator,
    pub formatter: Formatter,
    /// Business-local UTC offset for periods and dates.
    pub offset: FixedOffset,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &BridgeConfig) -> Self {
        let offset = config.utc_offset();
        AppState {
            store,
            credentials: CredentialVerifier::new(config.jwt_secret.clone(), config.service_key_hash.clone()),
            sequences: SequenceGenerator::new(config.sequence_strategy, offset),
            formatter: Formatter::new(config.currency_symbol.clone(), offset),
            offset,
        }
    }
}
