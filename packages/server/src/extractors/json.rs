use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body extractor that folds parse failures into the error taxonomy.
///
/// Axum's stock `Json` rejection replies with plain text, which would be
/// the one unstructured error in the API. Routing it through
/// `AppError::Validation` keeps malformed bodies on the same
/// `VALIDATION_ERROR` shape the request validators produce.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(payload)) => Ok(AppJson(payload)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}
