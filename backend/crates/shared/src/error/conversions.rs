//! Error conversions
//!
//! Database error classification and the HTTP rendering of [`AppError`].

use super::app_error::AppError;

/// Message returned for every server-side failure
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

// ============================================================================
// SQLx helpers (feature-gated)
// ============================================================================

/// Whether the error is a PostgreSQL unique constraint violation (23505)
///
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
#[cfg(feature = "sqlx")]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code == "23505"),
        _ => false,
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

/// JSON error body: `{"error": <code>, "message": <string>}`
///
/// Server errors are rendered without a code and with a generic message.
pub fn error_body(err: &AppError) -> serde_json::Value {
    if err.is_server_error() {
        return serde_json::json!({ "message": UNKNOWN_ERROR_MESSAGE });
    }

    match err.code() {
        Some(code) => serde_json::json!({ "error": code, "message": err.message() }),
        None => serde_json::json!({ "message": err.message() }),
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(error_body(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_with_code() {
        let err = AppError::rejected("2FA is already enabled").with_code(9);
        let body = error_body(&err);
        assert_eq!(body["error"], 9);
        assert_eq!(body["message"], "2FA is already enabled");
    }

    #[test]
    fn test_error_body_hides_server_errors() {
        let err = AppError::internal("connection refused on 10.0.0.3").with_code(99);
        let body = error_body(&err);
        assert!(body.get("error").is_none());
        assert_eq!(body["message"], UNKNOWN_ERROR_MESSAGE);
    }

    #[cfg(feature = "axum")]
    #[tokio::test]
    async fn test_into_response_status_and_body() {
        use crate::error::kind::ErrorKind;
        use axum::response::IntoResponse;
        use http_body_util::BodyExt;

        let response = AppError::new(ErrorKind::Expired, "The token has expired")
            .with_code(6)
            .into_response();
        assert_eq!(response.status().as_u16(), 410);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], 6);
        assert_eq!(body["message"], "The token has expired");
    }
}
