//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::InvoiceError;
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// The request conflicts with the current state of a resource.
    Conflict(String),
    /// Saga error, mapped by kind.
    Saga(SagaError),
}

impl ApiError {
    /// Maps a failed print.
    ///
    /// Any failed decrement step is a conflict, including a product that
    /// vanished from the ledger after the invoice was issued.
    pub fn from_print(err: SagaError) -> Self {
        match err {
            SagaError::ProductNotFound(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::Saga(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    let status = match &err {
        SagaError::InvoiceNotFound(_) | SagaError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        SagaError::InvalidState { .. }
        | SagaError::InvalidQuantity { .. }
        | SagaError::InsufficientStock { .. } => StatusCode::CONFLICT,
        SagaError::EmptyInvoice => StatusCode::BAD_REQUEST,
        SagaError::RemoteUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SagaError::Domain(InvoiceError::InvalidTransition { .. }) => StatusCode::CONFLICT,
        SagaError::Domain(_) => StatusCode::BAD_REQUEST,
        SagaError::Store(_) => {
            tracing::error!(error = %err, "internal server error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_saga_errors_map_to_statuses() {
        let product_id = ProductId::new();
        assert_eq!(
            status_of(SagaError::ProductNotFound(product_id).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                SagaError::InvalidQuantity {
                    product_id,
                    quantity: 0
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(SagaError::EmptyInvoice.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SagaError::RemoteUnavailable("timeout".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_unknown_invoice_is_not_found() {
        let err: ApiError = SagaError::InvoiceNotFound(common::InvoiceId::new()).into();
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_product_while_printing_is_conflict() {
        let err = ApiError::from_print(SagaError::ProductNotFound(ProductId::new()));
        assert_eq!(status_of(err), StatusCode::CONFLICT);

        let err = ApiError::from_print(SagaError::RemoteUnavailable("down".into()));
        assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
    }
}
