pub mod contact;
pub mod metrics;

use std::sync::Arc;

use anyhow::Error;
use axum::{
    extract::Extension,
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::{brevo::Upstream, metrics::Metrics};

pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

pub struct RelayState {
    pub api_key: Option<String>,
    pub upstream: Arc<dyn Upstream>,
    pub metrics: Mutex<Metrics>,
}

impl RelayState {
    pub fn new(api_key: Option<String>, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            api_key,
            upstream,
            metrics: Default::default(),
        }
    }
}

pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route(
            "/add-brevo-contact",
            post(contact::add_contact).options(contact::preflight),
        )
        .route("/metrics", get(metrics::metrics))
        .layer(Extension(state))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
}

#[derive(Debug)]
pub enum RelayError {
    BadRequest(&'static str),
    Misconfigured(&'static str),
    Upstream { status: StatusCode, details: Value },
    Internal(Error),
}

impl<E> From<E> for RelayError
where
    Error: From<E>,
{
    fn from(err: E) -> Self {
        Self::Internal(Error::from(err))
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            Self::Misconfigured(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": msg }))).into_response()
            }
            Self::Upstream { status, details } => (
                status,
                Json(json!({
                    "error": "Failed to add contact to mailing list",
                    "details": details,
                })),
            )
                .into_response(),
            Self::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response(),
        }
    }
}
