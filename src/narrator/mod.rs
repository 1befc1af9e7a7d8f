pub mod voices;

use thiserror::Error;

use self::voices::Voice;

/// Recoverable: the rest of the narration is dropped, the question goes on.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("Speech playback failed. UtteranceId: '{utterance_id}', Error: '{reason}'.")]
pub struct PlaybackError {
    pub utterance_id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub phrase: String,
    pub repeats: u8,
    pub voice: Option<Voice>,
    pub rate: f32,
}

/// One repetition of a `SpeechRequest`, as handed to the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub voice_id: Option<String>,
    pub language_tag: Option<String>,
    pub rate: f32,
    pub repetition: u8,
    pub repeats: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NarrationStep {
    Speak(Utterance),
    Completed,
    Failed(PlaybackError),
    /// The event belongs to an utterance we are no longer waiting for.
    Stale,
}

#[derive(Debug, Clone)]
struct Narration {
    request: SpeechRequest,
    spoken: u8,
    pending_utterance_id: u64,
}

/// Speaks a phrase a number of times, strictly one utterance after the other: the next
/// repetition is only handed out when the previous one reports its end.
#[derive(Debug, Clone, Default)]
pub struct Narrator {
    next_utterance_id: u64,
    narration: Option<Narration>,
}

impl Narrator {
    pub fn new() -> Self {
        Narrator::default()
    }

    pub fn is_speaking(&self) -> bool {
        self.narration.is_some()
    }

    /// Starts a narration and returns its first utterance, `None` when there is nothing
    /// to say. A narration still running is dropped, its late events become stale.
    pub fn begin(&mut self, request: SpeechRequest) -> Option<Utterance> {
        if let Some(previous) = self.narration.take() {
            log::debug!(
                "Dropping unfinished narration. Phrase: '{}', Spoken: '{}/{}'.",
                previous.request.phrase,
                previous.spoken,
                previous.request.repeats
            );
        }
        if request.repeats == 0 || request.phrase.trim().is_empty() {
            return None;
        }

        let mut narration = Narration {
            request,
            spoken: 0,
            pending_utterance_id: 0,
        };
        let utterance = self.next_utterance(&mut narration);
        self.narration = Some(narration);
        Some(utterance)
    }

    pub fn on_utterance_end(
        &mut self,
        utterance_id: u64,
        result: Result<(), PlaybackError>,
    ) -> NarrationStep {
        let Some(mut narration) = self.narration.take() else {
            return NarrationStep::Stale;
        };
        if narration.pending_utterance_id != utterance_id {
            log::debug!(
                "Ignoring the end of a stale utterance. UtteranceId: '{utterance_id}', Pending: '{}'.",
                narration.pending_utterance_id
            );
            self.narration = Some(narration);
            return NarrationStep::Stale;
        }

        if let Err(error) = result {
            log::warn!(
                "Narration abandoned after a playback error. Phrase: '{}', Spoken: '{}/{}', Error: '{error}'.",
                narration.request.phrase,
                narration.spoken,
                narration.request.repeats
            );
            return NarrationStep::Failed(error);
        }

        narration.spoken += 1;
        if narration.spoken >= narration.request.repeats {
            NarrationStep::Completed
        } else {
            let utterance = self.next_utterance(&mut narration);
            self.narration = Some(narration);
            NarrationStep::Speak(utterance)
        }
    }

    pub fn cancel(&mut self) {
        self.narration = None;
    }

    fn next_utterance(&mut self, narration: &mut Narration) -> Utterance {
        self.next_utterance_id += 1;
        narration.pending_utterance_id = self.next_utterance_id;
        let request = &narration.request;
        Utterance {
            id: self.next_utterance_id,
            text: request.phrase.clone(),
            voice_id: request.voice.as_ref().map(|voice| voice.id.clone()),
            language_tag: request.voice.as_ref().map(|voice| voice.language_tag.clone()),
            rate: request.rate,
            repetition: narration.spoken + 1,
            repeats: request.repeats,
        }
    }
}
