//! # Showroom API
//!
//! HTTP surface of the showroom loyalty engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Showroom API Routes                             │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Sales (admin) │  │  Redemptions   │  │  Cart (customer)           ││
//! │  │                │  │                │  │                            ││
//! │  │ • create       │  │ • request      │  │ • view                     ││
//! │  │ • edit status  │  │ • cancel       │  │ • add / set / remove       ││
//! │  │ • cancel       │  │ • approve      │  │ • clear                    ││
//! │  │ • history      │  │ • reject       │  │                            ││
//! │  │                │  │ • deliver      │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  AppState: Database (SQLite pool) · Authenticator · ApiConfig    │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config::ApiConfig`]):
//! - `SHOWROOM_BIND_ADDRESS` / `SHOWROOM_PORT` - listen address (default: 0.0.0.0:8080)
//! - `SHOWROOM_DATABASE_PATH` - SQLite file (default: showroom.db)
//! - `SHOWROOM_MAX_CONNECTIONS` - pool size (default: 5)
//! - `SHOWROOM_BUSY_TIMEOUT_MS` - writer wait on a locked database (default: 5000)
//! - `SHOWROOM_JWT_SECRET` - HS256 secret for bearer tokens
//! - `SHOWROOM_POINTS_RATE_BPS` - points per currency unit in basis points (default: 1000)
//! - `SHOWROOM_DEFAULT_PAGE_LIMIT` - listing page size (default: 50)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use serde::de::DeserializeOwned;
use showroom_db::Database;

pub use auth::{Authenticator, CurrentCustomer};
pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::router;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub auth: Authenticator,
    pub config: ApiConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> SharedState {
        let auth = Authenticator::new(&config.jwt_secret);
        Arc::new(AppState { db, auth, config })
    }
}

/// JSON body extractor whose rejections use the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query-string extractor whose rejections use the API error shape.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// JSON body extractor for endpoints whose body is optional.
///
/// A missing or blank body yields `T::default()`; anything else must be
/// valid JSON for `T`.
#[derive(Debug)]
pub struct ApiJsonOrDefault<T>(pub T);

impl<S, T> FromRequest<S> for ApiJsonOrDefault<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ApiJsonOrDefault(T::default()));
        }

        let axum::Json(value) = axum::Json::<T>::from_bytes(&bytes)?;
        Ok(ApiJsonOrDefault(value))
    }
}
