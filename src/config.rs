use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde_aux::prelude::deserialize_number_from_string;

use crate::listener::CaptureMode;
use crate::round::selection::SelectionPolicy;
use crate::round::{ExpectedAnswer, RoundSettings};
use crate::session::{AnswerMode, SessionSettings};
use crate::vocabulary::VocabularySchema;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub application: ApplicationSettings,
    pub allow_cors: bool,
    pub session: SessionConfig,
    pub vocabulary: VocabularyConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SessionConfig {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub target_score: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub score_increment: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_attempts: u8,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub repeats_per_prompt: u8,
    pub expected_answer: ExpectedAnswer,
    pub selection: SelectionPolicy,
    pub replay_prompt_on_retry: bool,
    pub answer_mode: AnswerMode,
    pub capture_mode: CaptureMode,
    pub recognition_language: String,
    pub voice_language_prefix: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub speech_rate: f32,
    /// 0 disables the timeout.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub recognition_timeout_seconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub inactivity_timeout_seconds: u64,
}

impl SessionConfig {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_seconds)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            round: RoundSettings {
                target_score: self.target_score,
                score_increment: self.score_increment,
                max_attempts: self.max_attempts,
                repeats_per_prompt: self.repeats_per_prompt,
                expected_answer: self.expected_answer,
                selection: self.selection,
                replay_prompt_on_retry: self.replay_prompt_on_retry,
            },
            answer_mode: self.answer_mode,
            capture_mode: self.capture_mode,
            recognition_language: self.recognition_language.clone(),
            voice_language_prefix: self.voice_language_prefix.clone(),
            speech_rate: self.speech_rate,
            recognition_timeout: match self.recognition_timeout_seconds {
                0 => None,
                seconds => Some(Duration::from_secs(seconds)),
            },
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct VocabularyConfig {
    pub path: String,
    pub schema: VocabularySchema,
}

impl Config {
    pub fn get() -> Result<Config, ConfigError> {
        let base_path = std::env::current_dir().map_err(|error| {
            ConfigError::Message(format!(
                "Failed to determine the current directory. Error: '{error}'."
            ))
        })?;
        let configuration_directory = base_path.join("config");

        let environment: Environment = std::env::var("ENVIRONMENT")
            .map_err(|_| ConfigError::NotFound("ENVIRONMENT".to_string()))?
            .try_into()
            .map_err(ConfigError::Message)?;

        let environment_filename = format!("{}.yaml", environment.as_str());

        let config = config::Config::builder()
            .add_source(config::File::from(
                configuration_directory.join("base.yaml"),
            ))
            .add_source(config::File::from(
                configuration_directory.join(environment_filename),
            ))
            // WORDCALL__SESSION__TARGET_SCORE=10 overrides session.target_score
            .add_source(
                config::Environment::with_prefix("WORDCALL")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize::<Config>()
    }
}

enum Environment {
    Dev,
    Prod,
}

const DEV: &str = "dev";
const PROD: &str = "prod";

impl Environment {
    fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => DEV,
            Environment::Prod => PROD,
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        match string.to_lowercase().as_str() {
            DEV => Ok(Self::Dev),
            PROD => Ok(Self::Prod),
            other => Err(format!(
                "{other} is not a supported environment. Use either `{DEV}` or `{PROD}`.",
            )),
        }
    }
}
