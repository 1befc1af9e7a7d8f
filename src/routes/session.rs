use std::sync::Arc;

use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::learner::actor::LearnerActor;
use crate::session_factory::actor_client::SessionFactoryClient;
use crate::websocket::{close, send_error};

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    /// CSV text in one of the vocabulary layouts, header line included.
    vocabulary: Option<String>,
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    id: String,
}

pub async fn create(
    State(session_factory): State<Arc<SessionFactoryClient>>,
    request: Option<Json<CreateSessionRequest>>,
) -> Response {
    let vocabulary = request.and_then(|Json(request)| request.vocabulary);
    match session_factory.create_session(vocabulary).await {
        Ok(session_id) => {
            (StatusCode::OK, Json(CreateSessionResponse { id: session_id })).into_response()
        }
        Err(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response(),
    }
}

pub async fn connect_learner_to_websocket(
    State(session_factory): State<Arc<SessionFactoryClient>>,
    Path(session_id): Path<String>,
    websocket_upgrade: WebSocketUpgrade,
) -> Response {
    websocket_upgrade.on_upgrade(move |mut websocket| async move {
        match session_factory.get_session(&session_id).await {
            Ok(session) => LearnerActor::create(session_id, session, websocket).await,
            Err(error) => {
                send_error(&mut websocket, &error).await;
                close(websocket).await;
            }
        }
    })
}
