pub mod actor;
pub mod actor_client;

use rand::distributions::{Alphanumeric, DistString};
use std::collections::HashMap;

use crate::config::{SessionConfig, VocabularyConfig};
use crate::error::domain_error::DomainError;
use crate::error::Error;
use crate::session::actor::SessionActor;
use crate::session::actor_client::SessionClient;
use crate::session_factory::actor_client::SessionFactoryClient;
use crate::vocabulary::{Vocabulary, VocabularySchema};

pub struct SessionFactory {
    session_channels: HashMap<String, SessionClient>,
    session_config: SessionConfig,
    schema: VocabularySchema,
    default_vocabulary: Vocabulary,
}

impl SessionFactory {
    pub fn new(session_config: SessionConfig, vocabulary_config: VocabularyConfig) -> Self {
        let default_vocabulary =
            match Vocabulary::load(&vocabulary_config.path, vocabulary_config.schema) {
                Ok(vocabulary) => vocabulary,
                Err(_) => {
                    log::warn!(
                        "Sessions without their own vocabulary will fail to start. File: '{}'.",
                        vocabulary_config.path
                    );
                    Vocabulary::default()
                }
            };
        SessionFactory::with_vocabulary(session_config, vocabulary_config.schema, default_vocabulary)
    }

    pub fn with_vocabulary(
        session_config: SessionConfig,
        schema: VocabularySchema,
        default_vocabulary: Vocabulary,
    ) -> Self {
        SessionFactory {
            session_channels: HashMap::default(),
            session_config,
            schema,
            default_vocabulary,
        }
    }

    /// Spawns a session over the given CSV text, or over the default vocabulary.
    pub fn create_new_session(
        &mut self,
        vocabulary: Option<String>,
        session_factory: SessionFactoryClient,
    ) -> String {
        let id = self.create_unique_session_id();
        let vocabulary = match vocabulary {
            Some(raw) => Vocabulary::parse(&raw, self.schema),
            None => self.default_vocabulary.clone(),
        };
        log::info!(
            "Creating session. SessionId: '{id}', Entries: '{}'.",
            vocabulary.len()
        );
        self.session_channels.insert(
            id.clone(),
            SessionActor::spawn(
                &id,
                vocabulary,
                self.session_config.session_settings(),
                self.session_config.inactivity_timeout(),
                session_factory,
            ),
        );

        id
    }

    pub fn remove_session(&mut self, session_id: &str) -> Option<SessionClient> {
        self.session_channels.remove(session_id)
    }

    pub fn get_session(&self, session_id: &str) -> Result<&SessionClient, Error> {
        match self.session_channels.get(session_id) {
            Some(session) => Ok(session),
            None => Err(Error::Domain(DomainError::SessionDoesNotExist(
                session_id.to_string(),
            ))),
        }
    }

    fn create_unique_session_id(&self) -> String {
        loop {
            let id = Alphanumeric
                .sample_string(&mut rand::thread_rng(), 5)
                .replace('O', "P")
                .replace('0', "1")
                .replace('I', "J")
                .replace('l', "m");
            if !self.session_channels.contains_key(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{SessionConfig, VocabularyConfig};
    use crate::error::{domain_error::DomainError, Error};
    use crate::listener::CaptureMode;
    use crate::round::selection::SelectionPolicy;
    use crate::round::ExpectedAnswer;
    use crate::session::AnswerMode;
    use crate::vocabulary::VocabularySchema;

    use super::SessionFactory;

    pub(super) fn session_config() -> SessionConfig {
        SessionConfig {
            target_score: 100,
            score_increment: 2,
            max_attempts: 3,
            repeats_per_prompt: 3,
            expected_answer: ExpectedAnswer::Translation,
            selection: SelectionPolicy::WithReplacement,
            replay_prompt_on_retry: true,
            answer_mode: AnswerMode::Spoken,
            capture_mode: CaptureMode::SingleShot,
            recognition_language: "ko-KR".to_string(),
            voice_language_prefix: "en".to_string(),
            speech_rate: 1.0,
            recognition_timeout_seconds: 8,
            inactivity_timeout_seconds: 1,
        }
    }

    #[test]
    fn session_ids_are_five_alphanumeric_characters() {
        let session_factory = SessionFactory::new(
            session_config(),
            VocabularyConfig {
                path: "vocabulary/en-ko.csv".to_string(),
                schema: VocabularySchema::Auto,
            },
        );

        let id = session_factory.create_unique_session_id();

        assert_eq!(id.len(), 5);
        for char in id.chars() {
            assert!(char.is_ascii_alphanumeric());
            assert!(!['O', '0', 'I', 'l'].contains(&char));
        }
    }

    #[test]
    fn missing_vocabulary_file_leaves_an_empty_default() {
        let session_factory = SessionFactory::new(
            session_config(),
            VocabularyConfig {
                path: "vocabulary/missing.csv".to_string(),
                schema: VocabularySchema::Auto,
            },
        );

        assert!(session_factory.default_vocabulary.is_empty());
    }

    #[test]
    fn get_session_fails_when_session_does_not_exist() {
        let session_factory = SessionFactory::new(
            session_config(),
            VocabularyConfig {
                path: "vocabulary/en-ko.csv".to_string(),
                schema: VocabularySchema::Auto,
            },
        );

        let result = session_factory.get_session("invalid_session");

        assert_eq!(
            result.unwrap_err(),
            Error::Domain(DomainError::SessionDoesNotExist(
                "invalid_session".to_string()
            ))
        );
    }
}
