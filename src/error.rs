// src/error.rs - API error type and conversions from the store and codec errors

use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

use crate::models::Category;
use crate::store::StoreError;
use crate::workbook::CodecError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(String),
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::DatabaseError(err) => write!(f, "Database Error: {}", err),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            success: false,
            message: self.to_string(),
        };

        match self {
            ApiError::BadRequest(_) => HttpResponse::BadRequest().json(error_response),
            ApiError::NotFound(_) => HttpResponse::NotFound().json(error_response),
            ApiError::ValidationError(_) => HttpResponse::UnprocessableEntity().json(error_response),
            ApiError::DatabaseError(_) => HttpResponse::InternalServerError().json(error_response),
            ApiError::InternalServerError(_) => HttpResponse::InternalServerError().json(error_response),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Invalid(msg) => ApiError::ValidationError(msg),
            StoreError::UnknownField { .. } | StoreError::CategoryMismatch { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            StoreError::Database(e) => ApiError::DatabaseError(e),
            StoreError::Serialization(e) => ApiError::InternalServerError(e.to_string()),
        }
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Write(_) => ApiError::InternalServerError(err.to_string()),
            CodecError::Unreadable(_) | CodecError::NoWorksheet | CodecError::Sheet(_) => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl ApiError {
    pub fn bad_request(msg: &str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }

    pub fn unknown_category(segment: &str) -> Self {
        ApiError::NotFound(format!("Unknown inventory category '{}'", segment))
    }

    /// Store write failure as the user sees it: labelled with the action and
    /// category. Client-side problems (missing record, invalid patch) keep
    /// their own message.
    pub fn store_failure(action: &str, category: Category, err: StoreError) -> Self {
        match err {
            StoreError::Database(_) | StoreError::Serialization(_) => {
                log::error!("Error {} {}: {}", action, category.as_ref(), err);
                ApiError::InternalServerError(format!(
                    "Error {} {}. Please try again.",
                    action,
                    category.as_ref()
                ))
            }
            other => other.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_store_errors_map_to_status_codes() {
        let not_found: ApiError = StoreError::NotFound { category: Category::Reagent, id: "r1".into() }.into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let invalid: ApiError = StoreError::Invalid("Description is required!".into()).into();
        assert_eq!(invalid.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let unknown: ApiError =
            StoreError::UnknownField { category: Category::Glassware, field: "name".into() }.into();
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_codec_errors_map_to_status_codes() {
        let missing: ApiError = CodecError::NoWorksheet.into();
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
        assert!(missing.to_string().contains("no worksheet"));
    }

    #[test]
    fn test_store_failure_is_category_labelled() {
        let err = ApiError::store_failure("adding", Category::Reagent, StoreError::Database(sqlx::Error::PoolClosed));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Server Error: Error adding reagent. Please try again.");

        let missing = ApiError::store_failure(
            "updating",
            Category::Glassware,
            StoreError::NotFound { category: Category::Glassware, id: "g1".into() },
        );
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }
}
