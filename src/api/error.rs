//! HTTP error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt::Display;
use thiserror::Error;
use tracing::error;

use crate::db::{OwnedProductError, PurchaseError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Insufficient funds")]
    InsufficientFunds { price: i64, balance: i64, shortfall: i64 },

    #[error("{message}: {error}")]
    Internal { message: &'static str, error: String },
}

impl ApiError {
    /// `map_err` adapter for unexpected failures
    pub fn internal<E: Display>(message: &'static str) -> impl FnOnce(E) -> Self {
        move |e| ApiError::Internal {
            message,
            error: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::ProductNotFound | PurchaseError::UserNotFound => {
                ApiError::NotFound(err.to_string())
            }
            PurchaseError::InsufficientFunds { price, balance, shortfall } => {
                ApiError::InsufficientFunds { price, balance, shortfall }
            }
            PurchaseError::Storage(e) => ApiError::internal("Error purchasing product")(e),
        }
    }
}

impl From<OwnedProductError> for ApiError {
    fn from(err: OwnedProductError) -> Self {
        match err {
            OwnedProductError::NotFound => ApiError::NotFound(err.to_string()),
            OwnedProductError::Storage(e) => ApiError::internal("Error updating owned product")(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": message }),
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": message }),
            ),
            ApiError::InsufficientFunds { price, balance, shortfall } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": self.to_string(),
                    "price": price,
                    "balance": balance,
                    "shortfall": shortfall,
                }),
            ),
            ApiError::Internal { message, error } => {
                error!("{}: {}", message, error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": message, "error": error }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
