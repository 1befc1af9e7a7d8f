pub mod matching;
pub mod round_fsm;
pub mod selection;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rust_fsm::StateMachine;
use serde::Deserialize;

use crate::error::domain_error::DomainError;
use crate::error::Error;
use crate::listener::RecognitionUnavailable;
use crate::vocabulary::{AnswerKey, Vocabulary, WordEntry};

use self::matching::answer_matches;
use self::round_fsm::{RoundFsm, RoundFsmInput, RoundFsmState};
use self::selection::{SelectionPolicy, WordPicker};

/// Which field of a `term,translation` entry the learner has to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedAnswer {
    #[default]
    Translation,
    /// Dictation: repeat the word that was spoken.
    Prompt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundSettings {
    pub target_score: u32,
    pub score_increment: u32,
    pub max_attempts: u8,
    pub repeats_per_prompt: u8,
    pub expected_answer: ExpectedAnswer,
    pub selection: SelectionPolicy,
    pub replay_prompt_on_retry: bool,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            target_score: 100,
            score_increment: 2,
            max_attempts: 3,
            repeats_per_prompt: 3,
            expected_answer: ExpectedAnswer::Translation,
            selection: SelectionPolicy::WithReplacement,
            replay_prompt_on_retry: false,
        }
    }
}

impl RoundSettings {
    fn validate(&self) -> Result<(), DomainError> {
        let reason = if self.target_score == 0 {
            "target_score must be greater than zero"
        } else if self.score_increment == 0 {
            "score_increment must be greater than zero"
        } else if self.max_attempts == 0 {
            "max_attempts must be greater than zero"
        } else {
            return Ok(());
        };
        Err(DomainError::InvalidSessionSettings(reason.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Typed(String),
    Spoken(String),
    Choice(usize),
    Unavailable(RecognitionUnavailable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub id: usize,
    pub text: String,
    pub translation: Option<String>,
    is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// The answer arrived while the prompt was still being spoken.
    Ignored,
    Correct {
        expected: String,
    },
    IncorrectRetry {
        attempts_remaining: u8,
    },
    IncorrectExhausted {
        expected: String,
    },
    SessionComplete {
        expected: String,
        summary: SessionSummary,
    },
}

impl AnswerOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            AnswerOutcome::Ignored => "ignored",
            AnswerOutcome::Correct { .. } => "correct",
            AnswerOutcome::IncorrectRetry { .. } => "incorrect_retry",
            AnswerOutcome::IncorrectExhausted { .. } => "incorrect_exhausted",
            AnswerOutcome::SessionComplete { .. } => "session_complete",
        }
    }

    /// Attempts left on the question this outcome answered. Resolved questions have none.
    pub fn attempts_remaining(&self) -> u8 {
        match self {
            AnswerOutcome::IncorrectRetry { attempts_remaining } => *attempts_remaining,
            _ => 0,
        }
    }

    /// Whether the question is over and the next one (or the end) follows.
    pub fn resolves_question(&self) -> bool {
        matches!(
            self,
            AnswerOutcome::Correct { .. }
                | AnswerOutcome::IncorrectExhausted { .. }
                | AnswerOutcome::SessionComplete { .. }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct RoundState {
    current_entry: Option<usize>,
    attempts_used: u8,
    cumulative_score: u32,
    question_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundSnapshot {
    pub phase: RoundFsmState,
    pub prompt: Option<String>,
    pub attempts_used: u8,
    pub max_attempts: u8,
    pub cumulative_score: u32,
    pub target_score: u32,
    pub question_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptView {
    pub question_index: u32,
    pub prompt: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub final_score: u32,
    pub target_score: u32,
    pub questions_asked: u32,
    pub correct_answers: u32,
    pub exhausted_questions: u32,
    pub completed: bool,
}

pub struct RoundController {
    fsm: StateMachine<RoundFsm>,
    vocabulary: Vocabulary,
    settings: RoundSettings,
    state: RoundState,
    choices: Vec<Choice>,
    picker: WordPicker,
    rng: StdRng,
    correct_answers: u32,
    exhausted_questions: u32,
}

impl Default for RoundController {
    fn default() -> Self {
        RoundController::new()
    }
}

impl RoundController {
    pub fn new() -> Self {
        RoundController::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            fsm: StateMachine::default(),
            vocabulary: Vocabulary::default(),
            settings: RoundSettings::default(),
            state: RoundState::default(),
            choices: Vec::default(),
            picker: WordPicker::new(SelectionPolicy::default(), 0),
            rng,
            correct_answers: 0,
            exhausted_questions: 0,
        }
    }

    pub fn phase(&self) -> RoundFsmState {
        *self.fsm.state()
    }

    pub fn settings(&self) -> &RoundSettings {
        &self.settings
    }

    pub fn current_entry(&self) -> Option<&WordEntry> {
        self.state
            .current_entry
            .and_then(|index| self.vocabulary.get(index))
    }

    pub fn attempts_used(&self) -> u8 {
        self.state.attempts_used
    }

    pub fn attempts_remaining(&self) -> u8 {
        self.settings
            .max_attempts
            .saturating_sub(self.state.attempts_used)
    }

    pub fn cumulative_score(&self) -> u32 {
        self.state.cumulative_score
    }

    pub fn question_index(&self) -> u32 {
        self.state.question_index
    }

    pub fn start(&mut self, vocabulary: Vocabulary, settings: RoundSettings) -> Result<(), Error> {
        if self.phase() != RoundFsmState::Idle {
            return Err(DomainError::InvalidStateForStart(self.phase()).into());
        }
        if vocabulary.is_empty() {
            return Err(DomainError::EmptyVocabulary.into());
        }
        settings.validate()?;

        self.picker = WordPicker::new(settings.selection, vocabulary.len());
        self.vocabulary = vocabulary;
        self.settings = settings;
        self.state = RoundState::default();
        self.choose_next_entry();
        self.process_event(&RoundFsmInput::Start)
    }

    pub fn on_prompt_playback_complete(&mut self) -> Result<(), Error> {
        if self.phase() != RoundFsmState::Presenting {
            return Err(DomainError::InvalidStateForPlaybackComplete(self.phase()).into());
        }
        self.process_event(&RoundFsmInput::PlaybackComplete)
    }

    pub fn submit_answer(&mut self, answer: Answer) -> Result<AnswerOutcome, Error> {
        match self.phase() {
            RoundFsmState::AwaitingAnswer => {}
            RoundFsmState::Presenting => {
                log::debug!("Answer ignored while the prompt is being spoken. Answer: '{answer:?}'.");
                return Ok(AnswerOutcome::Ignored);
            }
            phase => return Err(DomainError::InvalidStateForAnswer(phase).into()),
        }

        let expected = self
            .expected_answer()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::log_and_create_internal(
                    "Missing current entry while awaiting an answer, there is a bug in the code.",
                )
            })?;
        let is_correct = match &answer {
            Answer::Typed(text) | Answer::Spoken(text) => answer_matches(text, &expected),
            Answer::Choice(choice_id) => self
                .choices
                .get(*choice_id)
                .map(|choice| choice.is_correct)
                .ok_or(DomainError::UnknownChoice(*choice_id))?,
            Answer::Unavailable(reason) => {
                log::info!("Counting unavailable speech recognition as an incorrect answer. Reason: '{reason}'.");
                false
            }
        };

        self.process_event(&RoundFsmInput::AnswerSubmitted)?;
        if is_correct {
            self.on_correct_answer(expected)
        } else {
            self.on_incorrect_answer(expected)
        }
    }

    /// Ends the session early. No-op when there is nothing to abandon.
    pub fn abandon(&mut self) -> Result<(), Error> {
        match self.phase() {
            RoundFsmState::Presenting | RoundFsmState::AwaitingAnswer => {
                self.process_event(&RoundFsmInput::Abandon)
            }
            _ => Ok(()),
        }
    }

    pub fn expected_answer(&self) -> Option<&str> {
        self.current_entry().map(|entry| match entry.answer() {
            AnswerKey::Translation(translation) => match self.settings.expected_answer {
                ExpectedAnswer::Translation => translation.as_str(),
                ExpectedAnswer::Prompt => entry.prompt(),
            },
            AnswerKey::Choices { correct, .. } => correct.as_str(),
        })
    }

    pub fn prompt_view(&self) -> Option<PromptView> {
        self.current_entry().map(|entry| PromptView {
            question_index: self.state.question_index,
            prompt: entry.prompt().to_string(),
            choices: self.choices.clone(),
        })
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            phase: self.phase(),
            prompt: self.current_entry().map(|entry| entry.prompt().to_string()),
            attempts_used: self.state.attempts_used,
            max_attempts: self.settings.max_attempts,
            cumulative_score: self.state.cumulative_score,
            target_score: self.settings.target_score,
            question_index: self.state.question_index,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            final_score: self.state.cumulative_score,
            target_score: self.settings.target_score,
            questions_asked: match self.state.current_entry {
                Some(_) => self.state.question_index + 1,
                None => 0,
            },
            correct_answers: self.correct_answers,
            exhausted_questions: self.exhausted_questions,
            completed: self.phase() == RoundFsmState::Finished
                && self.state.cumulative_score >= self.settings.target_score,
        }
    }

    fn on_correct_answer(&mut self, expected: String) -> Result<AnswerOutcome, Error> {
        self.state.cumulative_score = self
            .state
            .cumulative_score
            .saturating_add(self.settings.score_increment);
        self.correct_answers += 1;

        if self.state.cumulative_score >= self.settings.target_score {
            self.process_event(&RoundFsmInput::TargetReached)?;
            log::info!(
                "Target score reached. Score: '{}', Target: '{}', Questions: '{}'.",
                self.state.cumulative_score,
                self.settings.target_score,
                self.state.question_index + 1
            );
            Ok(AnswerOutcome::SessionComplete {
                expected,
                summary: self.summary(),
            })
        } else {
            self.advance();
            self.process_event(&RoundFsmInput::NextPrompt)?;
            Ok(AnswerOutcome::Correct { expected })
        }
    }

    fn on_incorrect_answer(&mut self, expected: String) -> Result<AnswerOutcome, Error> {
        self.state.attempts_used += 1;

        if self.state.attempts_used >= self.settings.max_attempts {
            self.exhausted_questions += 1;
            self.advance();
            self.process_event(&RoundFsmInput::NextPrompt)?;
            Ok(AnswerOutcome::IncorrectExhausted { expected })
        } else {
            let event = if self.settings.replay_prompt_on_retry {
                RoundFsmInput::RetryWithReplay
            } else {
                RoundFsmInput::Retry
            };
            self.process_event(&event)?;
            Ok(AnswerOutcome::IncorrectRetry {
                attempts_remaining: self.attempts_remaining(),
            })
        }
    }

    fn advance(&mut self) {
        self.state.question_index += 1;
        self.choose_next_entry();
    }

    fn choose_next_entry(&mut self) {
        self.state.current_entry = self.picker.pick(&mut self.rng);
        self.state.attempts_used = 0;
        self.choices = match self
            .state
            .current_entry
            .and_then(|index| self.vocabulary.get(index))
        {
            Some(entry) => RoundController::build_choices(entry, &mut self.rng),
            None => Vec::default(),
        };
    }

    fn build_choices(entry: &WordEntry, rng: &mut StdRng) -> Vec<Choice> {
        match entry.answer() {
            AnswerKey::Translation(_) => Vec::default(),
            AnswerKey::Choices {
                correct,
                wrong,
                wrong_translation,
            } => {
                let mut options = vec![
                    (correct.clone(), None, true),
                    (wrong.clone(), wrong_translation.clone(), false),
                ];
                options.shuffle(rng);
                options
                    .into_iter()
                    .enumerate()
                    .map(|(id, (text, translation, is_correct))| Choice {
                        id,
                        text,
                        translation,
                        is_correct,
                    })
                    .collect()
            }
        }
    }

    fn process_event(&mut self, event: &RoundFsmInput) -> Result<(), Error> {
        match self.fsm.consume(event) {
            Ok(_) => Ok(()),
            Err(error) => Err(Error::log_and_create_internal(&format!(
                "The fsm in state {:?} can't transition with an event {:?}. Error: '{error}'.",
                self.fsm.state(),
                event
            ))),
        }
    }
}
