use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay_core::RelayError;

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
///
/// Invalid input is the caller's fault (400). Everything else that reaches a
/// handler, including an unknown repository, is reported as 500 so callers
/// know the directive was not enqueued.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<RelayError>() {
            Some(RelayError::InvalidDirective(_)) => StatusCode::BAD_REQUEST,
            Some(
                RelayError::UnknownRepository(_)
                | RelayError::DeliveryFailed { .. }
                | RelayError::SourceUnavailable(_)
                | RelayError::RegistryNotFound(_)
                | RelayError::Io(_)
                | RelayError::Json(_),
            )
            | None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn invalid_directive_maps_to_400() {
        let err = AppError(RelayError::InvalidDirective("no action".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_repository_maps_to_500() {
        let err = AppError(RelayError::UnknownRepository("org/missing".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn delivery_failed_maps_to_500() {
        let err = AppError(
            RelayError::DeliveryFailed {
                queue: "poppit:notifications".into(),
                reason: "connection refused".into(),
            }
            .into(),
        );
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_relay_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_body_contains_error_field() {
        let err = AppError(RelayError::UnknownRepository("org/missing".into()).into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(
            ct.to_str().unwrap().contains("application/json"),
            "expected JSON content type, got {:?}",
            ct
        );
    }
}
