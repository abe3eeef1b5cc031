use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    contact::ContactRequest,
    metrics::Outcome,
    relay::{RelayError, RelayState},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Added {
    pub success: bool,
    pub message: String,
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn add_contact(
    Extension(state): Extension<Arc<RelayState>>,
    body: Bytes,
) -> Result<Json<Added>, RelayError> {
    let res = relay(&state, &body).await;

    let outcome = match &res {
        Ok((outcome, _)) => *outcome,
        Err(RelayError::BadRequest(_)) => Outcome::Rejected,
        Err(RelayError::Misconfigured(_)) => Outcome::Misconfigured,
        Err(RelayError::Upstream { .. }) => Outcome::UpstreamFailed,
        Err(RelayError::Internal(err)) => {
            tracing::error!("Failed to relay contact: {:#}", err);

            Outcome::Failed
        }
    };

    state.metrics.lock().record(outcome);

    let (_, message) = res?;

    Ok(Json(Added {
        success: true,
        message: message.to_owned(),
    }))
}

#[tracing::instrument(skip_all)]
async fn relay(state: &RelayState, body: &[u8]) -> Result<(Outcome, &'static str), RelayError> {
    let request = serde_json::from_slice::<ContactRequest>(body).map_err(|err| {
        tracing::debug!("Malformed request body: {}", err);

        RelayError::BadRequest("Invalid request body")
    })?;

    let contact = request.validate().map_err(|invalid| {
        tracing::debug!("Rejected contact: {}", invalid);

        RelayError::BadRequest(invalid.message())
    })?;

    let api_key = match &state.api_key {
        Some(api_key) => api_key,
        None => {
            tracing::error!("BREVO_API_KEY is not configured");

            return Err(RelayError::Misconfigured("Brevo API key not configured"));
        }
    };

    let response = state.upstream.create_contact(api_key, &contact).await?;

    match response.status {
        StatusCode::CREATED => {
            tracing::info!("Contact created");

            Ok((Outcome::Created, "Contact added successfully"))
        }
        StatusCode::NO_CONTENT => {
            tracing::info!("Contact already existed and was updated");

            Ok((Outcome::Updated, "Contact updated successfully"))
        }
        status => {
            tracing::error!("Upstream rejected contact with status {}: {}", status, response.body);

            Err(RelayError::Upstream {
                status,
                details: response.body,
            })
        }
    }
}
