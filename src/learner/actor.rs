use axum::extract::ws::{Message, WebSocket};
use std::time::Duration;
use tokio::select;
use tokio::time::error::Elapsed;
use tokio::time::timeout;

use crate::error::Error;
use crate::listener::{RecognitionError, RecognitionResult};
use crate::metrics::CONNECTED_LEARNERS;
use crate::narrator::voices::Voice;
use crate::round::Answer;
use crate::session::actor::SessionWideEvent;
use crate::session::actor_client::{SessionClient, SessionWideEventReceiver};
use crate::websocket::message::{feedback, VoiceDto, WsMessageIn, WsMessageOut};
use crate::websocket::{close, parse_message, send_error, send_message, send_message_string};

/// Bridges one browser tab to its session: commands go in, everything the session
/// broadcasts goes out.
pub struct LearnerActor {
    session_id: String,
    session: SessionClient,
    session_wide_event_receiver: SessionWideEventReceiver,
    websocket: WebSocket,
    inactivity_timeout: Duration,
}

impl LearnerActor {
    const PING_TIMEOUT: Duration = Duration::from_secs(5);

    pub async fn create(session_id: String, session: SessionClient, mut websocket: WebSocket) {
        match session.connect_learner().await {
            Ok(session_wide_event_receiver) => {
                LearnerActor {
                    session_id,
                    session,
                    session_wide_event_receiver,
                    websocket,
                    inactivity_timeout: LearnerActor::PING_TIMEOUT,
                }
                .start()
                .await
            }
            Err(error) => {
                send_error(&mut websocket, &error).await;
                close(websocket).await;
            }
        }
    }

    async fn start(mut self) {
        CONNECTED_LEARNERS.inc();

        loop {
            select! {
                session_wide_message = self.session_wide_event_receiver.next() => {
                    if let Err(error) = self.receive_session_wide_message(session_wide_message).await {
                        send_error(&mut self.websocket, &error).await;
                        if LearnerActor::should_close_websocket(&error) {
                            break;
                        }
                    }
                },
                websocket_message = timeout(self.inactivity_timeout, self.websocket.recv()) => {
                    if let Err(error) = self.receive_websocket_message(websocket_message).await {
                        send_error(&mut self.websocket, &error).await;
                        if LearnerActor::should_close_websocket(&error) {
                            break;
                        }
                    }
                },
            }
        }

        let _ = self.session.disconnect_learner().await;
        close(self.websocket).await;
        CONNECTED_LEARNERS.dec();
    }

    fn should_close_websocket(error: &Error) -> bool {
        match error {
            Error::Internal(_) => true,
            Error::WebsocketClosed(_) => true,
            Error::Domain(_) => false,
            Error::UnprocessableMessage(_, _) => false,
        }
    }

    async fn receive_session_wide_message(
        &mut self,
        session_wide_message: Result<SessionWideEvent, Error>,
    ) -> Result<(), Error> {
        let message = match session_wide_message? {
            SessionWideEvent::State { snapshot } => snapshot.into(),
            SessionWideEvent::Prompt { prompt } => prompt.into(),
            SessionWideEvent::Speak { utterance } => utterance.into(),
            SessionWideEvent::StartCapture {
                capture_id,
                mode,
                language,
            } => WsMessageOut::StartCapture {
                capture_id,
                mode: mode.as_str().to_string(),
                lang: language,
            },
            SessionWideEvent::StopCapture => WsMessageOut::StopCapture,
            SessionWideEvent::InterimTranscript { transcript } => {
                WsMessageOut::InterimTranscript { transcript }
            }
            SessionWideEvent::Feedback {
                outcome,
                attempts_remaining,
            } => feedback(outcome, attempts_remaining),
            SessionWideEvent::Score { current, target } => WsMessageOut::Score { current, target },
            SessionWideEvent::SessionComplete { summary } => summary.into(),
            SessionWideEvent::Voices { voices } => WsMessageOut::Voices {
                voices: voices.into_iter().map(VoiceDto::from).collect(),
            },
            SessionWideEvent::Error { error } => return Err(error),
        };
        send_message(&mut self.websocket, &message).await
    }

    async fn receive_websocket_message(
        &mut self,
        websocket_message: Result<Option<Result<Message, axum::Error>>, Elapsed>,
    ) -> Result<(), Error> {
        match websocket_message {
            Ok(Some(Ok(Message::Text(txt)))) => match txt.as_str() {
                "ping" => send_message_string(&mut self.websocket, "pong").await,
                message => self.handle_learner_message(parse_message(message)?).await,
            },
            // browser said "close"
            Ok(Some(Ok(Message::Close(_)))) => {
                self.log_connection_lost_with_learner("browser sent 'Close' websocket frame");
                Err(Error::WebsocketClosed(
                    "browser sent 'Close' websocket frame".to_string(),
                ))
            }
            // websocket was closed
            Ok(None) => {
                self.log_connection_lost_with_learner("other end of websocket was closed abruptly");
                Err(Error::WebsocketClosed(
                    "other end of websocket was closed abruptly".to_string(),
                ))
            }
            // timeout without receiving anything from the learner
            Err(_) => {
                self.log_connection_lost_with_learner(
                    "connection timed out; missing 'ping' messages",
                );
                Err(Error::WebsocketClosed(
                    "connection timed out; missing 'ping' messages".to_string(),
                ))
            }
            Ok(Some(Err(error))) => Err(Error::UnprocessableMessage(
                "Message cannot be loaded".to_string(),
                error.to_string(),
            )),
            Ok(Some(Ok(_))) => Err(Error::UnprocessableMessage(
                "Unsupported message type".to_string(),
                "Unsupported message type".to_string(),
            )),
        }
    }

    async fn handle_learner_message(&mut self, message: WsMessageIn) -> Result<(), Error> {
        match message {
            WsMessageIn::StartSession => self.session.start().await,
            WsMessageIn::EndSession => self.session.end().await,
            WsMessageIn::UtteranceEnded { utterance_id } => {
                self.session.utterance_ended(utterance_id, None).await
            }
            WsMessageIn::UtteranceFailed {
                utterance_id,
                error,
            } => self.session.utterance_ended(utterance_id, Some(error)).await,
            WsMessageIn::RecognitionResult {
                capture_id,
                transcript,
                is_final,
            } => {
                self.session
                    .recognition_result(
                        capture_id,
                        RecognitionResult {
                            transcript,
                            is_final,
                        },
                    )
                    .await
            }
            WsMessageIn::RecognitionError { capture_id, error } => {
                self.session
                    .recognition_error(capture_id, RecognitionError::from_code(&error))
                    .await
            }
            WsMessageIn::CaptureEnded { capture_id } => {
                self.session.capture_ended(capture_id).await
            }
            WsMessageIn::TypedAnswer { text } => {
                self.session.submit_answer(Answer::Typed(text)).await
            }
            WsMessageIn::SelectChoice { choice_id } => {
                self.session.submit_answer(Answer::Choice(choice_id)).await
            }
            WsMessageIn::VoicesChanged { voices } => {
                self.session
                    .voices_changed(voices.into_iter().map(Voice::from).collect())
                    .await
            }
            WsMessageIn::SelectVoice { voice_id } => self.session.select_voice(&voice_id).await,
            WsMessageIn::SetRate { rate } => self.session.set_rate(rate).await,
        }
    }

    fn log_connection_lost_with_learner(&self, reason: &str) {
        log::info!(
            "Connection with the learner of session {} lost due to: {}. Stopping learner actor.",
            &self.session_id,
            reason,
        );
    }
}
