use crate::listener::CaptureMode;
use crate::narrator::voices::Voice;
use crate::narrator::Utterance;
use crate::round::{AnswerOutcome, PromptView, RoundSnapshot, SessionSummary};

/// Everything the learner sees.
pub trait PresentationAdapter {
    fn render_prompt(&mut self, prompt: &PromptView);
    fn render_feedback(&mut self, outcome: &AnswerOutcome, attempts_remaining: u8);
    fn render_score(&mut self, current: u32, target: u32);
    fn render_session_complete(&mut self, summary: &SessionSummary);

    fn render_interim_transcript(&mut self, _transcript: &str) {}
    fn render_voices(&mut self, _voices: &[Voice]) {}
    fn render_state(&mut self, _snapshot: &RoundSnapshot) {}
}

/// Speech synthesis and recognition, owned by whoever is on the other end.
pub trait SpeechPlatform {
    fn speak(&mut self, utterance: &Utterance);
    /// `capture_id` tags every recognition event the platform reports for this capture.
    fn start_capture(&mut self, capture_id: u64, mode: CaptureMode, language: &str);
    fn stop_capture(&mut self);
}

pub trait SessionHost: PresentationAdapter + SpeechPlatform {}

impl<T> SessionHost for T where T: PresentationAdapter + SpeechPlatform {}
