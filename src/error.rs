use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Relay-side failures. Every variant renders as `{"error": ..., "code": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Server signing key is not configured")]
    MissingCredential,

    #[error("Insufficient server wallet balance")]
    InsufficientFunds,

    #[error("Blockchain RPC error: {0}")]
    BlockchainRPC(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            AppError::MissingCredential => {
                (StatusCode::INTERNAL_SERVER_ERROR, "MISSING_CREDENTIAL")
            }
            AppError::InsufficientFunds => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INSUFFICIENT_FUNDS")
            }
            AppError::BlockchainRPC(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BLOCKCHAIN_RPC"),
            AppError::Reverted(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REVERTED"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("setKittens relay error: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Wallet connection failures. None of these are retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("No Web3 provider detected. Please install MetaMask.")]
    NoProvider,

    #[error("Please switch to Scroll Sepolia network (expected chain {expected}, got {actual}).")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("Wallet error: {0}")]
    Provider(String),
}

/// Client-side sync failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Game not initialized yet")]
    NotReady,

    #[error(transparent)]
    Wallet(#[from] ConnectError),

    #[error("Relay unreachable: {0}")]
    TransportFailure(String),

    #[error("{0}")]
    RelayRejected(String),
}

impl SyncError {
    /// Short status line for the game's message window.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::InvalidInput(_) => "Kitten count must be between 0 and 60.".to_string(),
            SyncError::NotReady => "Error: Game not initialized.".to_string(),
            other => format!("Error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_relay_contract() {
        assert_eq!(
            AppError::BadRequest("x".into()).status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MethodNotAllowed.status_and_code().0,
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::MissingCredential.status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::InsufficientFunds.status_and_code().1,
            "INSUFFICIENT_FUNDS"
        );
    }

    #[test]
    fn relay_rejection_is_surfaced_verbatim() {
        let err = SyncError::RelayRejected("Insufficient server wallet balance".into());
        assert_eq!(err.to_string(), "Insufficient server wallet balance");
        assert_eq!(
            err.user_message(),
            "Error: Insufficient server wallet balance"
        );
    }

    #[test]
    fn wallet_errors_convert_into_sync_errors() {
        let err: SyncError = ConnectError::NoProvider.into();
        assert!(matches!(err, SyncError::Wallet(ConnectError::NoProvider)));
    }
}
