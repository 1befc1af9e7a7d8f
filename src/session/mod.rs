pub mod actor;
pub mod actor_client;
pub mod host;

use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::domain_error::DomainError;
use crate::error::Error;
use crate::listener::{CaptureMode, Listener, ListenerStep, RecognitionError, RecognitionResult};
use crate::narrator::voices::{Voice, VoiceCatalog};
use crate::narrator::{NarrationStep, Narrator, PlaybackError, SpeechRequest};
use crate::round::round_fsm::RoundFsmState;
use crate::round::{
    Answer, AnswerOutcome, RoundController, RoundSettings, RoundSnapshot, SessionSummary,
};
use crate::vocabulary::Vocabulary;

use self::host::SessionHost;

/// How the learner is expected to answer once the prompt has been spoken. Typed answers
/// and choices are accepted in every mode, only `Spoken` turns the microphone on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    #[default]
    Spoken,
    Typed,
    Choice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub round: RoundSettings,
    pub answer_mode: AnswerMode,
    pub capture_mode: CaptureMode,
    pub recognition_language: String,
    pub voice_language_prefix: String,
    pub speech_rate: f32,
    pub recognition_timeout: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            round: RoundSettings::default(),
            answer_mode: AnswerMode::Spoken,
            capture_mode: CaptureMode::SingleShot,
            recognition_language: "ko-KR".to_string(),
            voice_language_prefix: "en".to_string(),
            speech_rate: 1.0,
            recognition_timeout: Some(Duration::from_secs(8)),
        }
    }
}

/// One learner's practice run: the round controller plus the speech components, driven by the
/// events the platform reports back.
pub struct Session<H: SessionHost> {
    controller: RoundController,
    narrator: Narrator,
    listener: Listener,
    voices: VoiceCatalog,
    vocabulary: Vocabulary,
    settings: SessionSettings,
    speech_rate: f32,
    host: H,
}

impl<H: SessionHost> Session<H> {
    const MIN_SPEECH_RATE: f32 = 0.1;
    const MAX_SPEECH_RATE: f32 = 10.0;

    pub fn new(vocabulary: Vocabulary, settings: SessionSettings, host: H) -> Self {
        Session::with_controller(vocabulary, settings, host, RoundController::new())
    }

    pub fn with_controller(
        vocabulary: Vocabulary,
        settings: SessionSettings,
        host: H,
        controller: RoundController,
    ) -> Self {
        Self {
            controller,
            narrator: Narrator::new(),
            listener: Listener::new(
                settings.capture_mode,
                &settings.recognition_language,
                settings.recognition_timeout,
            ),
            voices: VoiceCatalog::new(&settings.voice_language_prefix),
            vocabulary,
            speech_rate: settings.speech_rate,
            settings,
            host,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn phase(&self) -> RoundFsmState {
        self.controller.phase()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        self.controller.snapshot()
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_capturing()
    }

    pub fn is_speaking(&self) -> bool {
        self.narrator.is_speaking()
    }

    pub fn capture_id(&self) -> Option<u64> {
        self.listener.capture_id()
    }

    pub fn capture_deadline(&self) -> Option<Instant> {
        self.listener.deadline()
    }

    pub fn publish_state(&mut self) {
        let snapshot = self.controller.snapshot();
        self.host.render_state(&snapshot);
    }

    pub fn start(&mut self) -> Result<(), Error> {
        self.controller
            .start(self.vocabulary.clone(), self.settings.round.clone())?;
        log::info!(
            "Session started. Words: '{}', TargetScore: '{}', AnswerMode: '{:?}'.",
            self.vocabulary.len(),
            self.settings.round.target_score,
            self.settings.answer_mode
        );
        self.present(self.settings.round.repeats_per_prompt)
    }

    pub fn on_utterance_ended(
        &mut self,
        utterance_id: u64,
        error: Option<String>,
    ) -> Result<(), Error> {
        let result = match error {
            None => Ok(()),
            Some(reason) => Err(PlaybackError {
                utterance_id,
                reason,
            }),
        };
        match self.narrator.on_utterance_end(utterance_id, result) {
            NarrationStep::Speak(utterance) => {
                self.host.speak(&utterance);
                Ok(())
            }
            NarrationStep::Completed => self.finish_presenting(),
            NarrationStep::Failed(error) => {
                log::warn!("Prompt playback failed, the prompt stays on screen and can still be answered. Error: '{error}'.");
                self.finish_presenting()
            }
            NarrationStep::Stale => Ok(()),
        }
    }

    pub fn on_recognition_result(
        &mut self,
        capture_id: u64,
        result: RecognitionResult,
    ) -> Result<AnswerOutcome, Error> {
        if self.controller.phase() != RoundFsmState::AwaitingAnswer {
            log::debug!(
                "Recognition result outside of AwaitingAnswer ignored. State: '{}', Transcript: '{}'.",
                self.controller.phase(),
                result.transcript
            );
            return Ok(AnswerOutcome::Ignored);
        }
        match self.listener.on_result(capture_id, result) {
            ListenerStep::Interim(transcript) => {
                self.host.render_interim_transcript(&transcript);
                Ok(AnswerOutcome::Ignored)
            }
            ListenerStep::Final(transcript) => self.submit_answer(Answer::Spoken(transcript)),
            ListenerStep::Ignored => Ok(AnswerOutcome::Ignored),
        }
    }

    pub fn on_recognition_error(
        &mut self,
        capture_id: u64,
        error: RecognitionError,
    ) -> Result<AnswerOutcome, Error> {
        match self.listener.on_error(capture_id, error) {
            Some(unavailable) => self.submit_answer(Answer::Unavailable(unavailable)),
            None => Ok(AnswerOutcome::Ignored),
        }
    }

    /// Platforms report the end of every capture, also after a result or an error. Only the
    /// end of a capture that is still waiting for an answer counts as an attempt.
    pub fn on_capture_ended(&mut self, capture_id: u64) -> Result<AnswerOutcome, Error> {
        match self.listener.on_capture_ended(capture_id) {
            Some(unavailable) => self.submit_answer(Answer::Unavailable(unavailable)),
            None => Ok(AnswerOutcome::Ignored),
        }
    }

    pub fn on_capture_timeout(&mut self) -> Result<AnswerOutcome, Error> {
        match self.listener.on_timeout(Instant::now()) {
            Some(unavailable) => {
                self.host.stop_capture();
                self.submit_answer(Answer::Unavailable(unavailable))
            }
            None => Ok(AnswerOutcome::Ignored),
        }
    }

    pub fn submit_answer(&mut self, answer: Answer) -> Result<AnswerOutcome, Error> {
        let outcome = self.controller.submit_answer(answer)?;
        if outcome == AnswerOutcome::Ignored {
            return Ok(outcome);
        }
        if outcome.resolves_question() {
            self.stop_capture();
        }

        self.host
            .render_feedback(&outcome, outcome.attempts_remaining());
        self.host.render_score(
            self.controller.cumulative_score(),
            self.settings.round.target_score,
        );

        match &outcome {
            AnswerOutcome::SessionComplete { summary, .. } => {
                log::info!(
                    "Session complete. Score: '{}', Questions: '{}', Correct: '{}', Exhausted: '{}'.",
                    summary.final_score,
                    summary.questions_asked,
                    summary.correct_answers,
                    summary.exhausted_questions
                );
                self.host.render_session_complete(summary);
            }
            AnswerOutcome::Correct { .. } | AnswerOutcome::IncorrectExhausted { .. } => {
                self.present(self.settings.round.repeats_per_prompt)?;
            }
            AnswerOutcome::IncorrectRetry { .. } => {
                if self.controller.phase() == RoundFsmState::Presenting {
                    self.present(1)?;
                } else if self.settings.answer_mode == AnswerMode::Spoken {
                    self.start_capture();
                }
            }
            AnswerOutcome::Ignored => {}
        }
        Ok(outcome)
    }

    /// Ends the session early and reports what was achieved so far.
    pub fn end(&mut self) -> Result<SessionSummary, Error> {
        let was_active = matches!(
            self.controller.phase(),
            RoundFsmState::Presenting | RoundFsmState::AwaitingAnswer
        );
        self.narrator.cancel();
        self.stop_capture();
        self.controller.abandon()?;

        let summary = self.controller.summary();
        if was_active {
            log::info!(
                "Session ended by the learner. Score: '{}', Questions: '{}'.",
                summary.final_score,
                summary.questions_asked
            );
            self.host.render_session_complete(&summary);
        }
        Ok(summary)
    }

    pub fn on_voices_changed(&mut self, voices: Vec<Voice>) {
        self.voices.refresh(voices);
        self.host.render_voices(self.voices.list_voices());
    }

    pub fn select_voice(&mut self, voice_id: &str) -> Result<(), Error> {
        self.voices.select(voice_id)?;
        Ok(())
    }

    pub fn set_rate(&mut self, rate: f32) -> Result<(), Error> {
        if !(Session::<H>::MIN_SPEECH_RATE..=Session::<H>::MAX_SPEECH_RATE).contains(&rate) {
            return Err(DomainError::InvalidSessionSettings(format!(
                "speech rate must be between {} and {}, got {rate}",
                Session::<H>::MIN_SPEECH_RATE,
                Session::<H>::MAX_SPEECH_RATE
            ))
            .into());
        }
        self.speech_rate = rate;
        Ok(())
    }

    fn present(&mut self, repeats: u8) -> Result<(), Error> {
        self.stop_capture();
        let prompt = self.controller.prompt_view().ok_or_else(|| {
            Error::log_and_create_internal(
                "Missing current entry while presenting, there is a bug in the code.",
            )
        })?;
        self.host.render_prompt(&prompt);

        let request = SpeechRequest {
            phrase: prompt.prompt,
            repeats,
            voice: self.voices.resolve().cloned(),
            rate: self.speech_rate,
        };
        match self.narrator.begin(request) {
            Some(utterance) => {
                self.host.speak(&utterance);
                Ok(())
            }
            None => self.finish_presenting(),
        }
    }

    fn finish_presenting(&mut self) -> Result<(), Error> {
        self.controller.on_prompt_playback_complete()?;
        if self.settings.answer_mode == AnswerMode::Spoken {
            self.start_capture();
        }
        Ok(())
    }

    fn start_capture(&mut self) {
        if let Some(capture_id) = self.listener.start() {
            self.host
                .start_capture(capture_id, self.listener.mode(), self.listener.language());
        }
    }

    fn stop_capture(&mut self) {
        if self.listener.stop() {
            self.host.stop_capture();
        }
    }
}
