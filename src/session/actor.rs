use std::fmt::{Display, Formatter};
use std::time::Duration;

use tokio::sync::oneshot::Sender as OneshotSender;
use tokio::sync::{
    broadcast, mpsc,
    mpsc::{Receiver, Sender},
};
use tokio::time::{self, Instant};

use crate::error::Error;
use crate::listener::{CaptureMode, RecognitionError, RecognitionResult};
use crate::metrics::{ACTIVE_SESSIONS, ANSWERS_EVALUATED};
use crate::narrator::voices::Voice;
use crate::narrator::Utterance;
use crate::round::{Answer, AnswerOutcome, PromptView, RoundSnapshot, SessionSummary};
use crate::session::actor_client::SessionClient;
use crate::session::host::{PresentationAdapter, SpeechPlatform};
use crate::session::{Session, SessionSettings};
use crate::session_factory::actor_client::SessionFactoryClient;
use crate::vocabulary::Vocabulary;

pub struct SessionActor {
    id: String,
    session: Session<BroadcastHost>,
    session_rx: Receiver<SessionCommand>,
    session_factory: SessionFactoryClient,
    inactivity_timeout: Duration,
    connected_learners: usize,
}

impl SessionActor {
    pub fn spawn(
        id: &str,
        vocabulary: Vocabulary,
        settings: SessionSettings,
        inactivity_timeout: Duration,
        session_factory: SessionFactoryClient,
    ) -> SessionClient {
        let (session_tx, session_rx): (Sender<SessionCommand>, Receiver<SessionCommand>) =
            mpsc::channel(128);
        let (broadcast_tx, _): (
            broadcast::Sender<SessionWideEvent>,
            broadcast::Receiver<SessionWideEvent>,
        ) = broadcast::channel(64);

        tokio::spawn(
            SessionActor {
                id: id.to_string(),
                session: Session::new(vocabulary, settings, BroadcastHost { broadcast_tx }),
                session_rx,
                session_factory,
                inactivity_timeout,
                connected_learners: 0,
            }
            .start(),
        );

        SessionClient { session_tx }
    }

    async fn start(mut self) {
        ACTIVE_SESSIONS.inc();

        loop {
            let wait = self.next_wakeup();
            match time::timeout(wait, self.session_rx.recv()).await {
                Err(_) => {
                    if self.capture_deadline_passed() {
                        if let Err(error) = self.handle_capture_timeout() {
                            log::error!("Stopping session actor after a failed capture timeout. SessionId: '{}', Error: '{error}'.", self.id);
                            break;
                        }
                        self.session.publish_state();
                    } else if self.connected_learners == 0 {
                        log::info!(
                            "No activity detected in session {} after {} seconds. Stopping session actor.",
                            self.id,
                            self.inactivity_timeout.as_secs()
                        );
                        break;
                    }
                }
                Ok(None) => {
                    log::info!("Session channel has been dropped. Stopping session actor.");
                    break;
                }
                Ok(Some(command)) => {
                    self.handle_command(command);
                    self.session.publish_state();
                }
            }
        }

        self.stop_session().await;
        ACTIVE_SESSIONS.dec();
    }

    fn handle_command(&mut self, command: SessionCommand) {
        let (result, response_tx) = match command {
            SessionCommand::ConnectLearner { response_tx } => {
                self.connected_learners += 1;
                let broadcast_rx = self.session.host().broadcast_tx.subscribe();
                (Ok(SessionResponse::Connected { broadcast_rx }), response_tx)
            }
            SessionCommand::DisconnectLearner => {
                self.connected_learners = self.connected_learners.saturating_sub(1);
                return;
            }
            SessionCommand::Start { response_tx } => {
                (self.session.start().map(|_| SessionResponse::Ok), response_tx)
            }
            SessionCommand::End { response_tx } => {
                (self.session.end().map(|_| SessionResponse::Ok), response_tx)
            }
            SessionCommand::UtteranceEnded {
                utterance_id,
                error,
                response_tx,
            } => (
                self.session
                    .on_utterance_ended(utterance_id, error)
                    .map(|_| SessionResponse::Ok),
                response_tx,
            ),
            SessionCommand::RecognitionResult {
                capture_id,
                result,
                response_tx,
            } => {
                let result = self.session.on_recognition_result(capture_id, result);
                (self.handle_answer_result(result), response_tx)
            }
            SessionCommand::RecognitionError {
                capture_id,
                error,
                response_tx,
            } => {
                let result = self.session.on_recognition_error(capture_id, error);
                (self.handle_answer_result(result), response_tx)
            }
            SessionCommand::CaptureEnded {
                capture_id,
                response_tx,
            } => {
                let result = self.session.on_capture_ended(capture_id);
                (self.handle_answer_result(result), response_tx)
            }
            SessionCommand::SubmitAnswer {
                answer,
                response_tx,
            } => {
                let result = self.session.submit_answer(answer);
                (self.handle_answer_result(result), response_tx)
            }
            SessionCommand::VoicesChanged {
                voices,
                response_tx,
            } => {
                self.session.on_voices_changed(voices);
                (Ok(SessionResponse::Ok), response_tx)
            }
            SessionCommand::SelectVoice {
                voice_id,
                response_tx,
            } => (
                self.session
                    .select_voice(&voice_id)
                    .map(|_| SessionResponse::Ok),
                response_tx,
            ),
            SessionCommand::SetRate { rate, response_tx } => (
                self.session.set_rate(rate).map(|_| SessionResponse::Ok),
                response_tx,
            ),
        };

        let response = match result {
            Ok(response) => response,
            Err(error) => SessionResponse::Error { error },
        };
        if let Err(response) = response_tx.send(response) {
            log::error!("Sent SessionResponse to the learner but the response channel is closed. SessionId: '{}', Response: '{response}'.", self.id);
        }
    }

    fn handle_answer_result(
        &self,
        result: Result<AnswerOutcome, Error>,
    ) -> Result<SessionResponse, Error> {
        let outcome = result?;
        if outcome != AnswerOutcome::Ignored {
            ANSWERS_EVALUATED
                .with_label_values(&[outcome.label()])
                .inc();
        }
        Ok(SessionResponse::Ok)
    }

    /// Nobody is waiting on a reply here, so domain errors go to the learners as events.
    /// Internal errors are returned and stop the actor.
    fn handle_capture_timeout(&mut self) -> Result<(), Error> {
        let result = self.session.on_capture_timeout();
        match self.handle_answer_result(result) {
            Ok(_) => Ok(()),
            Err(error @ Error::Internal(_)) => Err(error),
            Err(error) => {
                log::warn!("Capture timeout could not be evaluated. SessionId: '{}', Error: '{error}'.", self.id);
                self.session.host().send(SessionWideEvent::Error { error });
                Ok(())
            }
        }
    }

    fn next_wakeup(&self) -> Duration {
        match self.session.capture_deadline() {
            Some(deadline) => {
                let until_deadline =
                    Instant::from_std(deadline).saturating_duration_since(Instant::now());
                until_deadline.min(self.inactivity_timeout)
            }
            None => self.inactivity_timeout,
        }
    }

    fn capture_deadline_passed(&self) -> bool {
        self.session
            .capture_deadline()
            .is_some_and(|deadline| deadline <= std::time::Instant::now())
    }

    async fn stop_session(self) {
        if let Err(error) = self.session_factory.remove_session(&self.id).await {
            log::error!("The SessionFactory channel is closed, can't remove the Session. SessionId: '{}', Error: '{error}'.", self.id);
        }
    }
}

/// Forwards everything the session renders or asks the platform to do to the
/// connected learners.
pub struct BroadcastHost {
    broadcast_tx: broadcast::Sender<SessionWideEvent>,
}

impl BroadcastHost {
    fn send(&self, event: SessionWideEvent) {
        if let Err(error) = self.broadcast_tx.send(event) {
            log::debug!("No learner is listening to the session. Event: '{:?}'.", error.0);
        }
    }
}

impl PresentationAdapter for BroadcastHost {
    fn render_prompt(&mut self, prompt: &PromptView) {
        self.send(SessionWideEvent::Prompt {
            prompt: prompt.clone(),
        });
    }

    fn render_feedback(&mut self, outcome: &AnswerOutcome, attempts_remaining: u8) {
        self.send(SessionWideEvent::Feedback {
            outcome: outcome.clone(),
            attempts_remaining,
        });
    }

    fn render_score(&mut self, current: u32, target: u32) {
        self.send(SessionWideEvent::Score { current, target });
    }

    fn render_session_complete(&mut self, summary: &SessionSummary) {
        self.send(SessionWideEvent::SessionComplete {
            summary: summary.clone(),
        });
    }

    fn render_interim_transcript(&mut self, transcript: &str) {
        self.send(SessionWideEvent::InterimTranscript {
            transcript: transcript.to_string(),
        });
    }

    fn render_voices(&mut self, voices: &[Voice]) {
        self.send(SessionWideEvent::Voices {
            voices: voices.to_vec(),
        });
    }

    fn render_state(&mut self, snapshot: &RoundSnapshot) {
        self.send(SessionWideEvent::State {
            snapshot: snapshot.clone(),
        });
    }
}

impl SpeechPlatform for BroadcastHost {
    fn speak(&mut self, utterance: &Utterance) {
        self.send(SessionWideEvent::Speak {
            utterance: utterance.clone(),
        });
    }

    fn start_capture(&mut self, capture_id: u64, mode: CaptureMode, language: &str) {
        self.send(SessionWideEvent::StartCapture {
            capture_id,
            mode,
            language: language.to_string(),
        });
    }

    fn stop_capture(&mut self) {
        self.send(SessionWideEvent::StopCapture);
    }
}

pub(crate) enum SessionCommand {
    ConnectLearner {
        response_tx: OneshotSender<SessionResponse>,
    },
    DisconnectLearner,
    Start {
        response_tx: OneshotSender<SessionResponse>,
    },
    End {
        response_tx: OneshotSender<SessionResponse>,
    },
    UtteranceEnded {
        utterance_id: u64,
        error: Option<String>,
        response_tx: OneshotSender<SessionResponse>,
    },
    RecognitionResult {
        capture_id: u64,
        result: RecognitionResult,
        response_tx: OneshotSender<SessionResponse>,
    },
    RecognitionError {
        capture_id: u64,
        error: RecognitionError,
        response_tx: OneshotSender<SessionResponse>,
    },
    CaptureEnded {
        capture_id: u64,
        response_tx: OneshotSender<SessionResponse>,
    },
    SubmitAnswer {
        answer: Answer,
        response_tx: OneshotSender<SessionResponse>,
    },
    VoicesChanged {
        voices: Vec<Voice>,
        response_tx: OneshotSender<SessionResponse>,
    },
    SelectVoice {
        voice_id: String,
        response_tx: OneshotSender<SessionResponse>,
    },
    SetRate {
        rate: f32,
        response_tx: OneshotSender<SessionResponse>,
    },
}

#[derive(Debug)]
pub(crate) enum SessionResponse {
    Connected {
        broadcast_rx: broadcast::Receiver<SessionWideEvent>,
    },
    Ok,
    Error {
        error: Error,
    },
}

impl Display for SessionResponse {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                SessionResponse::Connected { .. } => "SessionResponse::Connected".to_string(),
                SessionResponse::Ok => "SessionResponse::Ok".to_string(),
                SessionResponse::Error { error } => format!("Error '{error}'"),
            }
        )
    }
}

#[derive(Clone, Debug)]
pub enum SessionWideEvent {
    State {
        snapshot: RoundSnapshot,
    },
    Prompt {
        prompt: PromptView,
    },
    Speak {
        utterance: Utterance,
    },
    StartCapture {
        capture_id: u64,
        mode: CaptureMode,
        language: String,
    },
    StopCapture,
    InterimTranscript {
        transcript: String,
    },
    Feedback {
        outcome: AnswerOutcome,
        attempts_remaining: u8,
    },
    Score {
        current: u32,
        target: u32,
    },
    SessionComplete {
        summary: SessionSummary,
    },
    Voices {
        voices: Vec<Voice>,
    },
    Error {
        error: Error,
    },
}
