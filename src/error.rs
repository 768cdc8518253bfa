use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Failures raised by the store implementations.
#[derive(Debug, Display)]
pub enum StoreError {
    /// A unique key (username) was already present at write time.
    #[display(fmt = "duplicate key")]
    Duplicate,
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        // MySQL reports duplicate keys as SQLSTATE 23000
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::Duplicate;
            }
        }
        StoreError::Database(e)
    }
}

/// Errors surfaced by request handlers.
///
/// Domain failures render as `400 {success:false, message}`; anything else is a 500.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    Auth(String),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn employee_not_found() -> Self {
        ApiError::NotFound("Employee not found".to_string())
    }

    pub fn username_taken() -> Self {
        ApiError::Conflict("Username already exists".to_string())
    }

    pub fn invalid_credentials() -> Self {
        ApiError::Auth("Invalid credentials".to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => ApiError::username_taken(),
            StoreError::Database(e) => {
                tracing::error!(error = %e, "Store operation failed");
                ApiError::Internal
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn domain_errors_render_as_400_failure_body() {
        let resp = ApiError::employee_not_found().error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"success": false, "message": "Employee not found"}));
    }

    #[test]
    fn internal_error_hides_details() {
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Internal.to_string(), "Internal Server Error");
    }

    #[test]
    fn duplicate_store_error_maps_to_conflict() {
        assert_eq!(
            ApiError::from(StoreError::Duplicate),
            ApiError::Conflict("Username already exists".into())
        );
    }
}
