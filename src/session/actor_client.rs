use tokio::sync::broadcast;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot::{self, Receiver as OneshotReceiver, Sender as OneshotSender};

use crate::error::Error;
use crate::listener::{RecognitionError, RecognitionResult};
use crate::narrator::voices::Voice;
use crate::round::Answer;
use crate::session::actor::{SessionCommand, SessionResponse, SessionWideEvent};

#[derive(Clone, Debug)]
pub struct SessionClient {
    pub(super) session_tx: Sender<SessionCommand>,
}

impl SessionClient {
    pub async fn connect_learner(&self) -> Result<SessionWideEventReceiver, Error> {
        let (tx, rx): (OneshotSender<SessionResponse>, OneshotReceiver<SessionResponse>) =
            oneshot::channel();

        self.session_tx
            .send(SessionCommand::ConnectLearner { response_tx: tx })
            .await
            // The SessionFactory still knows the session but its actor already stopped.
            .map_err(|error| {
                Error::log_and_create_internal(&format!(
                    "The Session is not alive. Can't connect the learner. Error: '{error}'"
                ))
            })?;

        match rx.await {
            Ok(SessionResponse::Connected { broadcast_rx }) => {
                Ok(SessionWideEventReceiver { broadcast_rx })
            }
            Ok(SessionResponse::Error { error }) => Err(error),
            _ => Err(Error::log_and_create_internal(
                "Learner sent a SessionCommand::ConnectLearner to Session, but Session channel died.",
            )),
        }
    }

    pub async fn disconnect_learner(&self) -> Result<(), Error> {
        self.session_tx
            .send(SessionCommand::DisconnectLearner)
            .await
            .map_err(|error| Error::log_and_create_internal(&format!("Tried to send SessionCommand::DisconnectLearner but SessionActor is not listening. Error: {error}.")))
    }

    pub async fn start(&self) -> Result<(), Error> {
        self.request("Start", |response_tx| SessionCommand::Start { response_tx })
            .await
    }

    pub async fn end(&self) -> Result<(), Error> {
        self.request("End", |response_tx| SessionCommand::End { response_tx })
            .await
    }

    pub async fn utterance_ended(
        &self,
        utterance_id: u64,
        error: Option<String>,
    ) -> Result<(), Error> {
        self.request("UtteranceEnded", |response_tx| {
            SessionCommand::UtteranceEnded {
                utterance_id,
                error,
                response_tx,
            }
        })
        .await
    }

    pub async fn recognition_result(
        &self,
        capture_id: u64,
        result: RecognitionResult,
    ) -> Result<(), Error> {
        self.request("RecognitionResult", |response_tx| {
            SessionCommand::RecognitionResult {
                capture_id,
                result,
                response_tx,
            }
        })
        .await
    }

    pub async fn recognition_error(
        &self,
        capture_id: u64,
        error: RecognitionError,
    ) -> Result<(), Error> {
        self.request("RecognitionError", |response_tx| {
            SessionCommand::RecognitionError {
                capture_id,
                error,
                response_tx,
            }
        })
        .await
    }

    pub async fn capture_ended(&self, capture_id: u64) -> Result<(), Error> {
        self.request("CaptureEnded", |response_tx| SessionCommand::CaptureEnded {
            capture_id,
            response_tx,
        })
        .await
    }

    pub async fn submit_answer(&self, answer: Answer) -> Result<(), Error> {
        self.request("SubmitAnswer", |response_tx| SessionCommand::SubmitAnswer {
            answer,
            response_tx,
        })
        .await
    }

    pub async fn voices_changed(&self, voices: Vec<Voice>) -> Result<(), Error> {
        self.request("VoicesChanged", |response_tx| {
            SessionCommand::VoicesChanged {
                voices,
                response_tx,
            }
        })
        .await
    }

    pub async fn select_voice(&self, voice_id: &str) -> Result<(), Error> {
        self.request("SelectVoice", |response_tx| SessionCommand::SelectVoice {
            voice_id: voice_id.to_string(),
            response_tx,
        })
        .await
    }

    pub async fn set_rate(&self, rate: f32) -> Result<(), Error> {
        self.request("SetRate", |response_tx| SessionCommand::SetRate {
            rate,
            response_tx,
        })
        .await
    }

    async fn request(
        &self,
        command_name: &str,
        command: impl FnOnce(OneshotSender<SessionResponse>) -> SessionCommand,
    ) -> Result<(), Error> {
        let (tx, rx): (OneshotSender<SessionResponse>, OneshotReceiver<SessionResponse>) =
            oneshot::channel();

        self.session_tx.send(command(tx)).await.map_err(|error| {
            Error::log_and_create_internal(&format!(
                "Tried to send SessionCommand::{command_name} but SessionActor is not listening. Error: {error}."
            ))
        })?;

        match rx.await {
            Ok(SessionResponse::Ok) => Ok(()),
            Ok(SessionResponse::Error { error }) => Err(error),
            Ok(unexpected_response) => Err(Error::log_and_create_internal(&format!(
                "Received an unexpected SessionResponse. SessionResponse: '{unexpected_response}'."
            ))),
            Err(_) => Err(Error::log_and_create_internal(&format!(
                "Sent a SessionCommand::{command_name} to the Session, but the Session channel died."
            ))),
        }
    }
}

pub struct SessionWideEventReceiver {
    broadcast_rx: broadcast::Receiver<SessionWideEvent>,
}

impl SessionWideEventReceiver {
    pub async fn next(&mut self) -> Result<SessionWideEvent, Error> {
        self.broadcast_rx.recv().await.map_err(|error| {
            Error::log_and_create_internal(&format!(
                "The broadcast channel with the Session has been closed. Error: {error}."
            ))
        })
    }
}
