use std::time::Duration;

use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub struct TestLearner {
    tx: SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>,
    rx: SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    capture_id: u64,
}

impl TestLearner {
    const RECEIVE_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(websocket: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        let (tx, rx) = websocket.split();
        TestLearner {
            tx,
            rx,
            capture_id: 0,
        }
    }

    pub async fn send(&mut self, message: WsMessageOut) {
        self.send_message(Message::Text(
            serde_json::to_string(&message).expect("Could not serialize message"),
        ))
        .await;
    }

    pub async fn send_message(&mut self, message: Message) {
        self.tx.send(message).await.expect("Could not send message");
    }

    pub async fn receive_text(&mut self) -> Result<String, String> {
        match time::timeout(TestLearner::RECEIVE_TIMEOUT, self.rx.next()).await {
            Ok(Some(Ok(message))) => message
                .into_text()
                .map_err(|error| format!("Message was not a text. Error: '{error}'.")),
            Ok(Some(Err(error))) => Err(format!("Websocket returned an error {error}")),
            Ok(None) => Err("Websocket closed before expected.".to_string()),
            Err(_) => Err("No message received in time.".to_string()),
        }
    }

    /// Id of the last capture the server started, `0` before the first one.
    pub fn capture_id(&self) -> u64 {
        self.capture_id
    }

    pub async fn receive(&mut self) -> Result<WsMessageIn, String> {
        let text = self.receive_text().await?;
        let message = serde_json::from_str(&text).map_err(|error| {
            format!("Could not parse the message. Message: '{text}', Error: '{error}'.")
        })?;
        if let WsMessageIn::StartCapture { capture_id, .. } = &message {
            self.capture_id = *capture_id;
        }
        Ok(message)
    }

    /// Answers the current capture with a final transcript.
    pub async fn say(&mut self, transcript: &str) {
        self.send(WsMessageOut::RecognitionResult {
            capture_id: self.capture_id,
            transcript: transcript.to_string(),
            is_final: true,
        })
        .await;
    }

    /// Skips messages until one matches, errors from the server always stop the search.
    pub async fn receive_until(
        &mut self,
        matches: impl Fn(&WsMessageIn) -> bool,
    ) -> Result<WsMessageIn, String> {
        loop {
            let message = self.receive().await?;
            if matches(&message) {
                return Ok(message);
            }
            if let WsMessageIn::Error { r#type, .. } = message {
                return Err(r#type);
            }
        }
    }

    pub async fn receive_error(&mut self) -> String {
        match self
            .receive_until(|message| matches!(message, WsMessageIn::Error { .. }))
            .await
        {
            Ok(WsMessageIn::Error {
                r#type,
                title,
                detail,
            }) => {
                assert!(!title.is_empty());
                assert!(!detail.is_empty());
                r#type
            }
            other => panic!("Expected an error message, got {other:?}"),
        }
    }

    /// Acknowledges every repetition of the prompt until the server starts listening.
    pub async fn listen_to_prompt(&mut self) -> Result<Vec<u8>, String> {
        let mut repetitions = Vec::default();
        loop {
            match self
                .receive_until(|message| {
                    matches!(
                        message,
                        WsMessageIn::Speak { .. } | WsMessageIn::StartCapture { .. }
                    )
                })
                .await?
            {
                WsMessageIn::Speak {
                    utterance_id,
                    repetition,
                    ..
                } => {
                    repetitions.push(repetition);
                    self.send(WsMessageOut::UtteranceEnded { utterance_id })
                        .await;
                }
                _ => return Ok(repetitions),
            }
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum WsMessageOut {
    StartSession,
    EndSession,
    #[serde(rename_all = "camelCase")]
    UtteranceEnded {
        utterance_id: u64,
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
    Dance,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum WsMessageIn {
    #[serde(rename_all = "camelCase")]
    SessionState {
        state: String,
        prompt: Option<String>,
        attempts_used: u8,
        score: u32,
        target_score: u32,
    },
    Prompt {
        prompt: String,
        choices: Vec<Choice>,
    },
    #[serde(rename_all = "camelCase")]
    Speak {
        utterance_id: u64,
        text: String,
        repetition: u8,
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
        completed: bool,
    },
    Voices {
        voices: Vec<serde_json::Value>,
    },
    Error {
        r#type: String,
        title: String,
        detail: String,
    },
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct Choice {
    pub id: usize,
    pub text: String,
}
