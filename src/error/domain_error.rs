use thiserror::Error;

use crate::round::round_fsm::RoundFsmState;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("The vocabulary has no entries.")]
    EmptyVocabulary,
    #[error("Invalid session settings. Reason: '{0}'.")]
    InvalidSessionSettings(String),
    #[error("Invalid state for starting the session. ActualState: '{0:?}', ExpectedState: 'Idle'.")]
    InvalidStateForStart(RoundFsmState),
    #[error("Invalid state for submitting an answer. ActualState: '{0:?}'.")]
    InvalidStateForAnswer(RoundFsmState),
    #[error("Invalid state for completing the prompt playback. ActualState: '{0:?}', ExpectedState: 'Presenting'.")]
    InvalidStateForPlaybackComplete(RoundFsmState),
    #[error("The choice is not offered for the current question. ChoiceId: '{0}'.")]
    UnknownChoice(usize),
    #[error("The voice is not in the catalog. VoiceId: '{0}'.")]
    UnknownVoice(String),
    #[error("The session does not exist. SessionId: '{0}'.")]
    SessionDoesNotExist(String),
}
