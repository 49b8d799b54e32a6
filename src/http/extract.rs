use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::application::AppError;
use crate::domain::TaxId;
use crate::storage::CustomerHandle;

use super::AppState;

/// Header carrying the customer's tax id.
pub const TAX_ID_HEADER: &str = "cpf";

/// Customer resolved from the `cpf` header.
///
/// Handlers that take this extractor only run for open accounts; anything else is
/// rejected with `400 {"error": "customer not found"}` before the handler is called.
pub struct CurrentCustomer(pub CustomerHandle);

#[async_trait]
impl FromRequestParts<AppState> for CurrentCustomer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TAX_ID_HEADER)
            .and_then(|value| value.to_str().ok());

        // Anything unparseable can never match a registered tax id.
        let Some(tax_id) = raw.and_then(|value| value.trim().parse::<TaxId>().ok()) else {
            debug!(header = ?raw, "missing or malformed cpf header");
            return Err(AppError::MissingTaxId);
        };

        state.service.lookup(tax_id).map(CurrentCustomer)
    }
}

/// JSON request body whose rejections are reported like every other client error:
/// `400 {"error": ...}` instead of axum's plain-text 415/422.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::InvalidRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
