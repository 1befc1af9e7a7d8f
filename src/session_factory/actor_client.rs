use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot::{self, Sender as OneshotSender};

use crate::error::Error;
use crate::session::actor_client::SessionClient;
use crate::session_factory::actor::{SessionFactoryCommand, SessionFactoryResponse};

/// Handle to the factory actor. Session actors keep one to deregister themselves.
#[derive(Clone, Debug)]
pub struct SessionFactoryClient {
    pub(super) session_factory_tx: Sender<SessionFactoryCommand>,
}

impl SessionFactoryClient {
    /// Creates a session over `vocabulary` (CSV text), or over the default word list.
    pub async fn create_session(&self, vocabulary: Option<String>) -> Result<String, Error> {
        let response = self
            .request("CreateSession", |response_channel| {
                SessionFactoryCommand::CreateSession {
                    vocabulary,
                    response_channel,
                }
            })
            .await?;
        match response {
            SessionFactoryResponse::SessionCreated { session_id } => Ok(session_id),
            unexpected => Err(SessionFactoryClient::unexpected_response(unexpected)),
        }
    }

    pub async fn get_session(&self, session_id: &str) -> Result<SessionClient, Error> {
        let response = self
            .request("GetSessionActor", |response_channel| {
                SessionFactoryCommand::GetSessionActor {
                    session_id: session_id.to_string(),
                    response_channel,
                }
            })
            .await?;
        match response {
            SessionFactoryResponse::SessionActor { session } => Ok(session),
            unexpected => Err(SessionFactoryClient::unexpected_response(unexpected)),
        }
    }

    /// Fire and forget, the factory does not answer removals.
    pub async fn remove_session(&self, session_id: &str) -> Result<(), Error> {
        self.session_factory_tx
            .send(SessionFactoryCommand::RemoveSession {
                session_id: session_id.to_string(),
            })
            .await
            .map_err(|error| {
                Error::log_and_create_internal(&format!(
                    "Tried to send SessionFactoryCommand::RemoveSession but the SessionFactory is not listening. SessionId: '{session_id}', Error: '{error}'."
                ))
            })
    }

    /// Sends a command and waits for its reply. Errors reported by the factory are unwrapped.
    async fn request(
        &self,
        command_name: &str,
        command: impl FnOnce(OneshotSender<SessionFactoryResponse>) -> SessionFactoryCommand,
    ) -> Result<SessionFactoryResponse, Error> {
        let (tx, rx) = oneshot::channel();

        self.session_factory_tx
            .send(command(tx))
            .await
            .map_err(|error| {
                Error::log_and_create_internal(&format!(
                    "Tried to send SessionFactoryCommand::{command_name} but the SessionFactory is not listening. Error: '{error}'."
                ))
            })?;

        match rx.await {
            Ok(SessionFactoryResponse::Error { error }) => Err(error),
            Ok(response) => Ok(response),
            Err(_) => Err(Error::log_and_create_internal(&format!(
                "Sent a SessionFactoryCommand::{command_name} but the SessionFactory dropped the reply."
            ))),
        }
    }

    fn unexpected_response(response: SessionFactoryResponse) -> Error {
        Error::log_and_create_internal(&format!(
            "Received an unexpected SessionFactoryResponse. SessionFactoryResponse: '{response}'."
        ))
    }
}

#[cfg(test)]
impl SessionFactoryClient {
    /// A client whose factory is already gone, for actors tested on their own.
    pub(crate) fn detached() -> Self {
        let (session_factory_tx, _) = tokio::sync::mpsc::channel(1);
        SessionFactoryClient { session_factory_tx }
    }
}
