use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use peerchain_core::NodeError;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    message: &'a str,
    detail: Option<&'a str>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            detail: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            message: &self.message,
            detail: self.detail.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<NodeError> for ApiError {
    fn from(value: NodeError) -> Self {
        let detail = Some(value.to_string());
        match value {
            NodeError::InvalidTransaction(_) => Self {
                status: StatusCode::BAD_REQUEST,
                message: "invalid transaction".to_string(),
                detail,
            },
            NodeError::NothingToMine => Self {
                status: StatusCode::BAD_REQUEST,
                message: "no transactions to mine".to_string(),
                detail: None,
            },
            NodeError::StaleMiningAttempt => Self {
                status: StatusCode::CONFLICT,
                message: "no block produced this round".to_string(),
                detail,
            },
            NodeError::RejectedBlock(_) => Self {
                status: StatusCode::BAD_REQUEST,
                message: "invalid block".to_string(),
                detail,
            },
            NodeError::Worker(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "mining failed".to_string(),
                detail,
            },
        }
    }
}
