//! `POST /api/chat`: decode, run one exchange, map the outcome to HTTP.

use axum::{
    Extension,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use clinicchat_core::error::ChatError;
use clinicchat_core::message::ConversationRequest;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::auth::Principal;
use crate::{ErrorBody, SharedState};

pub const QUOTA_MESSAGE: &str = "API quota exceeded. Please try again later.";
pub const FAILURE_MESSAGE: &str = "Failed to get response from chatbot";
pub const BAD_BODY_MESSAGE: &str = "Invalid request body";

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub reply: String,
}

/// Maps a `ChatError` onto its status and body.
fn error_response(err: ChatError, expose_detail: bool) -> Response {
    match err {
        ChatError::InvalidInput(message) => {
            (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
        }
        ChatError::QuotaExceeded => {
            (StatusCode::TOO_MANY_REQUESTS, Json(ErrorBody::new(QUOTA_MESSAGE))).into_response()
        }
        ChatError::ProviderFailure(detail) => {
            let mut body = ErrorBody::new(FAILURE_MESSAGE);
            if expose_detail {
                body.error = Some(detail);
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<ConversationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            let reason = rejection.body_text();
            warn!(subject = %principal.subject, %reason, "Undecodable chat body");
            let mut body = ErrorBody::new(BAD_BODY_MESSAGE);
            if state.expose_error_detail {
                body.error = Some(reason);
            }
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    info!(subject = %principal.subject, history_len = request.history.len(), "Chat request");

    match state.assistant.respond(&request).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(ChatReply {
                success: true,
                reply,
            }),
        )
            .into_response(),
        Err(err) => {
            if let ChatError::ProviderFailure(detail) = &err {
                error!(subject = %principal.subject, %detail, "Chatbot error");
            }
            error_response(err, state.expose_error_detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_input_is_bad_request() {
        let resp = error_response(ChatError::InvalidInput("Message is required".into()), true);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Message is required");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn quota_is_too_many_requests() {
        let resp = error_response(ChatError::QuotaExceeded, true);
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_json(resp).await["message"], QUOTA_MESSAGE);
    }

    #[tokio::test]
    async fn failure_detail_follows_flag() {
        let err = ChatError::ProviderFailure("HTTP error: connection refused".into());

        let resp = error_response(err.clone(), true);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["message"], FAILURE_MESSAGE);
        assert_eq!(json["error"], "HTTP error: connection refused");

        let json = body_json(error_response(err, false)).await;
        assert!(json.get("error").is_none());
    }
}
