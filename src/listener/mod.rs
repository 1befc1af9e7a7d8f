use std::fmt::Display;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// One final result, then the platform stops listening on its own.
    #[default]
    SingleShot,
    /// Interim and final partial results until explicitly stopped.
    Continuous,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::SingleShot => "single_shot",
            CaptureMode::Continuous => "continuous",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionError {
    NoSpeech,
    Unsupported,
    Aborted,
    Timeout,
    Platform(String),
}

impl RecognitionError {
    /// Maps the error codes reported by browser speech recognition.
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => RecognitionError::NoSpeech,
            "not-allowed" | "service-not-allowed" | "language-not-supported"
            | "unsupported" => RecognitionError::Unsupported,
            "aborted" => RecognitionError::Aborted,
            other => RecognitionError::Platform(other.to_string()),
        }
    }
}

impl Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionError::NoSpeech => write!(f, "no speech detected"),
            RecognitionError::Unsupported => write!(f, "speech recognition is not supported"),
            RecognitionError::Aborted => write!(f, "capture aborted"),
            RecognitionError::Timeout => write!(f, "capture timed out"),
            RecognitionError::Platform(code) => write!(f, "platform error '{code}'"),
        }
    }
}

/// Recoverable: the question goes on, one attempt is spent.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("Speech recognition is unavailable. Reason: '{0}'.")]
pub struct RecognitionUnavailable(pub RecognitionError);

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerStep {
    Interim(String),
    Final(String),
    /// No capture is active, the result is late or belongs to our own voice.
    Ignored,
}

#[derive(Debug, Clone)]
struct Capture {
    id: u64,
    deadline: Option<Instant>,
}

/// Tracks the one capture the platform is allowed to report on. Every capture gets a fresh
/// id; events carrying any other id are late reports of a capture that is already over.
#[derive(Debug, Clone)]
pub struct Listener {
    mode: CaptureMode,
    language: String,
    timeout: Option<Duration>,
    capture: Option<Capture>,
    next_capture_id: u64,
}

impl Listener {
    pub fn new(mode: CaptureMode, language: &str, timeout: Option<Duration>) -> Self {
        Self {
            mode,
            language: language.to_string(),
            timeout,
            capture: None,
            next_capture_id: 1,
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn capture_id(&self) -> Option<u64> {
        self.capture.as_ref().map(|capture| capture.id)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.capture.as_ref().and_then(|capture| capture.deadline)
    }

    pub fn has_timed_out(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| deadline <= now)
    }

    /// Arms a new capture and returns its id. `None` when one was already running.
    pub fn start(&mut self) -> Option<u64> {
        if self.capture.is_some() {
            return None;
        }
        let id = self.next_capture_id;
        self.next_capture_id += 1;
        self.capture = Some(Capture {
            id,
            deadline: self.next_deadline(),
        });
        Some(id)
    }

    /// Returns `true` when a capture was running.
    pub fn stop(&mut self) -> bool {
        self.capture.take().is_some()
    }

    pub fn on_result(&mut self, capture_id: u64, result: RecognitionResult) -> ListenerStep {
        if !self.is_active(capture_id) {
            log::debug!(
                "Recognition result for an inactive capture. CaptureId: '{capture_id}', Transcript: '{}'.",
                result.transcript
            );
            return ListenerStep::Ignored;
        }
        if !result.is_final {
            return ListenerStep::Interim(result.transcript);
        }
        match self.mode {
            CaptureMode::SingleShot => {
                self.capture = None;
            }
            CaptureMode::Continuous => {
                // Every final partial starts a fresh wait for the next one.
                self.capture = Some(Capture {
                    id: capture_id,
                    deadline: self.next_deadline(),
                });
            }
        }
        ListenerStep::Final(result.transcript)
    }

    pub fn on_error(
        &mut self,
        capture_id: u64,
        error: RecognitionError,
    ) -> Option<RecognitionUnavailable> {
        if !self.is_active(capture_id) {
            log::debug!("Recognition error for an inactive capture ignored. CaptureId: '{capture_id}', Error: '{error}'.");
            return None;
        }
        self.capture.take().map(|_| RecognitionUnavailable(error))
    }

    /// The platform stopped listening without delivering a final result.
    pub fn on_capture_ended(&mut self, capture_id: u64) -> Option<RecognitionUnavailable> {
        self.on_error(capture_id, RecognitionError::NoSpeech)
    }

    pub fn on_timeout(&mut self, now: Instant) -> Option<RecognitionUnavailable> {
        if self.has_timed_out(now) {
            self.capture
                .take()
                .map(|_| RecognitionUnavailable(RecognitionError::Timeout))
        } else {
            None
        }
    }

    fn is_active(&self, capture_id: u64) -> bool {
        self.capture_id() == Some(capture_id)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timeout.map(|timeout| Instant::now() + timeout)
    }
}
