use std::{
    env::VarError, fmt::Error as FMT_ERROR, io::Error as IO_ERROR,
    num::ParseIntError, str::ParseBoolError as PARSE_BOOL_ERROR,
};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use alloy_primitives::hex::FromHexError as FROM_HEX_ERROR;
use alloy_sol_types::Error as SOL_TYPES_ERROR;
use anyhow::Error as ANYHOW_ERROR;
use bigdecimal::{
    num_bigint::ParseBigIntError as BIG_INT_ERROR,
    ParseBigDecimalError as BIG_DECIMAL_ERROR,
};
use regex::Error as REGEX_ERROR;
use reqwest::Error as REQWEST_ERROR;
use serde::Serialize;
use serde_json::Error as JSON_ERROR;
use sqlx::error::Error as SQL_ERROR;
use thiserror::Error;
use tokio::{task::JoinError, time::error::Elapsed};
use tracing::subscriber::SetGlobalDefaultError as TRACING_GLOBAL_DEFAULT_ERROR;
use url::ParseError as URL_ERROR;

/// One failed check of an inbound request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.to_owned(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] IO_ERROR),

    #[error("{0}")]
    URL(#[from] URL_ERROR),

    #[error("{0}")]
    INT(#[from] ParseIntError),

    #[error("{0}")]
    SQL(#[from] SQL_ERROR),

    #[error("{0}")]
    VAR(#[from] VarError),

    #[error("{0}")]
    TokioJoinError(#[from] JoinError),

    #[error("{0}")]
    TokioElapsedError(#[from] Elapsed),

    #[error("{0}")]
    FmtError(#[from] FMT_ERROR),

    #[error("{0}")]
    BigDecimalError(#[from] BIG_DECIMAL_ERROR),

    #[error("{0}")]
    BigIntError(#[from] BIG_INT_ERROR),

    #[error("{0}")]
    ParseBoolError(#[from] PARSE_BOOL_ERROR),

    #[error("{0}")]
    FromHexError(#[from] FROM_HEX_ERROR),

    #[error("{0}")]
    RegexError(#[from] REGEX_ERROR),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("{0}")]
    JsonError(#[from] JSON_ERROR),

    #[error("Tracing error: {0}")]
    SetGlobalDefaultError(#[from] TRACING_GLOBAL_DEFAULT_ERROR),

    #[error("{0}")]
    AnyHowError(#[from] ANYHOW_ERROR),

    #[error("{0}")]
    ReqwestError(#[from] REQWEST_ERROR),

    #[error("Abi decode error: {0}")]
    AbiError(#[from] SOL_TYPES_ERROR),

    #[error("Rpc error: {0}")]
    RpcError(String),

    #[error("Indexer error: {0}")]
    IndexerError(String),

    #[error("Math error: {0}")]
    MathError(String),

    #[error("Invalid request parameters")]
    Validation(Vec<ValidationIssue>),

    #[error("Chain not supported: {0}")]
    UnsupportedChain(String),

    #[error("Invalid LP address")]
    InvalidLpAddress,

    #[error("Slot0 not found")]
    Slot0NotFound,

    #[error("PoolInfo not found")]
    PoolInfoNotFound,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Failed to get active liquidity")]
    LiveFetchFailed,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request - client sent invalid input
            Error::Validation(_)
            | Error::UnsupportedChain(_)
            | Error::InvalidLpAddress
            | Error::AnyHowError(_)
            | Error::JsonError(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized - admin endpoints
            Error::Unauthorized => StatusCode::UNAUTHORIZED,

            // 404 Not Found - requested resource does not exist
            Error::Slot0NotFound
            | Error::PoolInfoNotFound
            | Error::NotFound(_) => StatusCode::NOT_FOUND,

            // 502 Bad Gateway - upstream service error
            Error::ReqwestError(_)
            | Error::RpcError(_)
            | Error::IndexerError(_)
            | Error::AbiError(_) => StatusCode::BAD_GATEWAY,

            // 504 Gateway Timeout - upstream timed out
            Error::TokioElapsedError(_) => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error - everything else
            Error::Io(_)
            | Error::URL(_)
            | Error::INT(_)
            | Error::SQL(_)
            | Error::VAR(_)
            | Error::TokioJoinError(_)
            | Error::FmtError(_)
            | Error::BigDecimalError(_)
            | Error::BigIntError(_)
            | Error::ParseBoolError(_)
            | Error::FromHexError(_)
            | Error::RegexError(_)
            | Error::ConfigurationError(_)
            | Error::SetGlobalDefaultError(_)
            | Error::MathError(_)
            | Error::LiveFetchFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut body = serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Unknown"),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        if let Error::Validation(issues) = self {
            body["issues"] = serde_json::json!(issues);
        }

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::Validation(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidLpAddress.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::Slot0NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::LiveFetchFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn test_validation_body_lists_issues() {
        let error = Error::Validation(vec![ValidationIssue::new(
            "chainId",
            "Unsupported chain 999",
        )]);
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], 400);
        assert_eq!(body["issues"][0]["path"], "chainId");
        assert_eq!(body["issues"][0]["message"], "Unsupported chain 999");
    }
}
