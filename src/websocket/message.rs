use serde::{Deserialize, Serialize};

use crate::narrator::voices::Voice;
use crate::narrator::Utterance;
use crate::round::round_fsm::RoundFsmState;
use crate::round::{AnswerOutcome, Choice, PromptView, RoundSnapshot, SessionSummary};

#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum WsMessageIn {
    StartSession,
    EndSession,
    #[serde(rename_all = "camelCase")]
    UtteranceEnded {
        utterance_id: u64,
    },
    #[serde(rename_all = "camelCase")]
    UtteranceFailed {
        utterance_id: u64,
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    RecognitionResult {
        capture_id: u64,
        transcript: String,
        is_final: bool,
    },
    #[serde(rename_all = "camelCase")]
    RecognitionError {
        capture_id: u64,
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    CaptureEnded {
        capture_id: u64,
    },
    TypedAnswer {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    SelectChoice {
        choice_id: usize,
    },
    VoicesChanged {
        voices: Vec<VoiceDto>,
    },
    #[serde(rename_all = "camelCase")]
    SelectVoice {
        voice_id: String,
    },
    SetRate {
        rate: f32,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum WsMessageOut {
    #[serde(rename_all = "camelCase")]
    SessionState {
        state: String,
        prompt: Option<String>,
        attempts_used: u8,
        max_attempts: u8,
        score: u32,
        target_score: u32,
        question_index: u32,
    },
    #[serde(rename_all = "camelCase")]
    Prompt {
        question_index: u32,
        prompt: String,
        choices: Vec<ChoiceDto>,
    },
    #[serde(rename_all = "camelCase")]
    Speak {
        utterance_id: u64,
        text: String,
        voice_id: Option<String>,
        lang: Option<String>,
        rate: f32,
        repetition: u8,
        repeats: u8,
    },
    #[serde(rename_all = "camelCase")]
    StartCapture {
        capture_id: u64,
        mode: String,
        lang: String,
    },
    StopCapture,
    InterimTranscript {
        transcript: String,
    },
    #[serde(rename_all = "camelCase")]
    Feedback {
        outcome: String,
        expected: Option<String>,
        attempts_remaining: u8,
    },
    Score {
        current: u32,
        target: u32,
    },
    #[serde(rename_all = "camelCase")]
    SessionComplete {
        final_score: u32,
        target_score: u32,
        questions_asked: u32,
        correct_answers: u32,
        exhausted_questions: u32,
        completed: bool,
    },
    Voices {
        voices: Vec<VoiceDto>,
    },
    Error {
        r#type: String,
        title: String,
        detail: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDto {
    pub id: String,
    pub name: String,
    pub lang: String,
}

impl From<Voice> for VoiceDto {
    fn from(voice: Voice) -> Self {
        VoiceDto {
            id: voice.id,
            name: voice.display_name,
            lang: voice.language_tag,
        }
    }
}

impl From<VoiceDto> for Voice {
    fn from(voice: VoiceDto) -> Self {
        Voice {
            id: voice.id,
            display_name: voice.name,
            language_tag: voice.lang,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDto {
    id: usize,
    text: String,
    translation: Option<String>,
}

impl From<Choice> for ChoiceDto {
    fn from(choice: Choice) -> Self {
        ChoiceDto {
            id: choice.id,
            text: choice.text,
            translation: choice.translation,
        }
    }
}

impl From<RoundSnapshot> for WsMessageOut {
    fn from(snapshot: RoundSnapshot) -> Self {
        WsMessageOut::SessionState {
            state: state_to_string(snapshot.phase),
            prompt: snapshot.prompt,
            attempts_used: snapshot.attempts_used,
            max_attempts: snapshot.max_attempts,
            score: snapshot.cumulative_score,
            target_score: snapshot.target_score,
            question_index: snapshot.question_index,
        }
    }
}

impl From<PromptView> for WsMessageOut {
    fn from(prompt: PromptView) -> Self {
        WsMessageOut::Prompt {
            question_index: prompt.question_index,
            prompt: prompt.prompt,
            choices: prompt.choices.into_iter().map(ChoiceDto::from).collect(),
        }
    }
}

impl From<Utterance> for WsMessageOut {
    fn from(utterance: Utterance) -> Self {
        WsMessageOut::Speak {
            utterance_id: utterance.id,
            text: utterance.text,
            voice_id: utterance.voice_id,
            lang: utterance.language_tag,
            rate: utterance.rate,
            repetition: utterance.repetition,
            repeats: utterance.repeats,
        }
    }
}

impl From<SessionSummary> for WsMessageOut {
    fn from(summary: SessionSummary) -> Self {
        WsMessageOut::SessionComplete {
            final_score: summary.final_score,
            target_score: summary.target_score,
            questions_asked: summary.questions_asked,
            correct_answers: summary.correct_answers,
            exhausted_questions: summary.exhausted_questions,
            completed: summary.completed,
        }
    }
}

pub fn feedback(outcome: AnswerOutcome, attempts_remaining: u8) -> WsMessageOut {
    let label = outcome.label().to_string();
    let expected = match outcome {
        AnswerOutcome::Correct { expected }
        | AnswerOutcome::IncorrectExhausted { expected }
        | AnswerOutcome::SessionComplete { expected, .. } => Some(expected),
        AnswerOutcome::IncorrectRetry { .. } | AnswerOutcome::Ignored => None,
    };
    WsMessageOut::Feedback {
        outcome: label,
        expected,
        attempts_remaining,
    }
}

pub fn state_to_string(state: RoundFsmState) -> String {
    match state {
        RoundFsmState::Idle => "Idle",
        RoundFsmState::Presenting => "Presenting",
        RoundFsmState::AwaitingAnswer => "AwaitingAnswer",
        RoundFsmState::Evaluating => "Evaluating",
        RoundFsmState::Finished => "Finished",
    }
    .to_string()
}
