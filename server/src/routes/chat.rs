use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use tomas_shared::chat::{
    CONFIGURATION_ERROR, ChatError, ChatRequest, ChatResponse, ChatTurn, ClearRequest,
    ClearResponse, DEFAULT_SESSION_ID, EMPTY_MESSAGE_ERROR, HISTORY_CLEARED, PROCESSING_ERROR,
};
use tracing::{debug, error, warn};

use crate::services::gemini;
use crate::state::AppState;

pub type ApiError = (StatusCode, Json<ChatError>);

fn api_error(status: StatusCode, error: ChatError) -> ApiError {
    (status, Json(error))
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "rejected chat payload");
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                ChatError::new(EMPTY_MESSAGE_ERROR),
            ));
        }
    };
    let Some(message) = request.trimmed_message() else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            ChatError::new(EMPTY_MESSAGE_ERROR),
        ));
    };
    let session_id = request.session_id().to_owned();

    let Some(api_key) = state.chat.api_key.as_deref() else {
        error!("GEMINI_API_KEY is not set; chat requests cannot be served");
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ChatError::new(CONFIGURATION_ERROR),
        ));
    };

    let history = state.history(&session_id);
    let contents = gemini::build_contents(&history, message);

    match gemini::generate_reply(&state.http_client, &state.chat, api_key, &contents).await {
        Ok(reply) => {
            state.record_turns(
                &session_id,
                [ChatTurn::user(message), ChatTurn::model(reply.clone())],
            );
            debug!(%session_id, turns = history.len() + 2, "chat reply relayed");
            Ok(Json(ChatResponse {
                success: true,
                message: reply,
                session_id,
            }))
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), %session_id, "chat upstream failed");
            let details = state.chat.expose_error_details.then(|| format!("{e:#}"));
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                ChatError::new(PROCESSING_ERROR).with_details(details),
            ))
        }
    }
}

pub async fn clear(
    State(state): State<AppState>,
    payload: Result<Json<ClearRequest>, JsonRejection>,
) -> Json<ClearResponse> {
    let session_id = payload
        .ok()
        .and_then(|Json(request)| request.session_id)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_owned());

    let existed = state.clear_session(&session_id);
    debug!(%session_id, existed, "chat history cleared");
    Json(ClearResponse {
        success: true,
        message: HISTORY_CLEARED.to_owned(),
    })
}
