pub mod message;

use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;

use crate::error::domain_error::DomainError;
use crate::error::Error;

use self::message::{WsMessageIn, WsMessageOut};

pub async fn send_error(websocket: &mut WebSocket, error: &Error) {
    if let Err(send_error) = send_message(websocket, &error_to_ws_error(error)).await {
        log::debug!("Could not send the error to the learner. Error: '{error}', Reason: '{send_error}'.");
    }
}

pub async fn close(websocket: WebSocket) {
    if let Err(error) = websocket.close().await {
        log::debug!("Could not close the WebSocket. Error: '{error}'.")
    }
}

pub fn parse_message(message: &str) -> Result<WsMessageIn, Error> {
    serde_json::from_str(message).map_err(|error| {
        Error::UnprocessableMessage(error.to_string(), message.to_string())
    })
}

pub async fn send_message<T>(websocket: &mut WebSocket, value: &T) -> Result<(), Error>
where
    T: ?Sized + Serialize,
{
    let message = serde_json::to_string(value).map_err(|error| {
        Error::log_and_create_internal(&format!(
            "Could not serialize the message. Error: '{error}'."
        ))
    })?;
    send_message_string(websocket, &message).await
}

pub async fn send_message_string(websocket: &mut WebSocket, message: &str) -> Result<(), Error> {
    websocket
        .send(Message::Text(message.to_string()))
        .await
        .map_err(|error| Error::WebsocketClosed(error.to_string()))
}

pub fn error_to_ws_error(error: &Error) -> WsMessageOut {
    let (r#type, title) = match error {
        Error::Domain(DomainError::EmptyVocabulary) => {
            ("EMPTY_VOCABULARY", "The vocabulary has no entries")
        }
        Error::Domain(DomainError::InvalidSessionSettings(_)) => {
            ("INVALID_SESSION_SETTINGS", "The session settings are not valid")
        }
        Error::Domain(DomainError::InvalidStateForStart(_)) => {
            ("INVALID_STATE_FOR_START", "The session has already been started")
        }
        Error::Domain(DomainError::InvalidStateForAnswer(_)) => {
            ("INVALID_STATE_FOR_ANSWER", "No question is waiting for an answer")
        }
        Error::Domain(DomainError::InvalidStateForPlaybackComplete(_)) => (
            "INVALID_STATE_FOR_PLAYBACK_COMPLETE",
            "No prompt is being presented",
        ),
        Error::Domain(DomainError::UnknownChoice(_)) => {
            ("UNKNOWN_CHOICE", "The choice is not offered")
        }
        Error::Domain(DomainError::UnknownVoice(_)) => ("UNKNOWN_VOICE", "The voice is not available"),
        Error::Domain(DomainError::SessionDoesNotExist(_)) => {
            ("SESSION_DOES_NOT_EXIST", "The session does not exist")
        }
        Error::Internal(_) => ("INTERNAL_SERVER", "Internal Server error"),
        Error::UnprocessableMessage(_, _) => {
            ("UNPROCESSABLE_WEBSOCKET_MESSAGE", "The message could not be processed")
        }
        Error::WebsocketClosed(_) => ("WEBSOCKET_CLOSED", "The learner websocket is closed"),
    };
    WsMessageOut::Error {
        r#type: r#type.to_string(),
        title: title.to_string(),
        detail: error.to_string(),
    }
}
