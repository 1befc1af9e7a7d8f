use std::net::SocketAddr;

use serde::Deserialize;
use tokio::net::TcpListener;
use wordcall::config::Config;

use super::test_learner::TestLearner;

pub struct TestApp {
    pub base_address: String,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        TestApp::spawn_app_with(|_| {}).await
    }

    pub async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
        // Binding to port 0 triggers an OS scan for an available port, this way we can run tests in parallel where each runs its own application
        let random_port_address = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(random_port_address)
            .await
            .expect("Failed to bind to bind random port.");
        let address = listener.local_addr().unwrap();
        std::env::set_var("ENVIRONMENT", "dev");
        let config = {
            let mut config = Config::get().expect("Failed to read configuration.");
            config.session.inactivity_timeout_seconds = 1;
            customize(&mut config);
            config
        };

        let server = wordcall::startup::create_web_server(config, listener);
        let _ = tokio::spawn(server);

        TestApp {
            base_address: format!("localhost:{}", address.port()),
        }
    }

    pub async fn create_session(&self, vocabulary: Option<&str>) -> String {
        let request = reqwest::Client::new().post(format!("http://{}/session", self.base_address));
        let request = match vocabulary {
            Some(vocabulary) => request.json(&serde_json::json!({ "vocabulary": vocabulary })),
            None => request,
        };
        let response = request
            .send()
            .await
            .expect("Failed to execute CreateSession request.");
        assert!(response.status().is_success());

        let session_created_response: SessionCreatedResponse = response
            .json()
            .await
            .expect("Failed to parse SessionCreatedResponse.");
        assert!(!session_created_response.id.is_empty());

        session_created_response.id
    }

    pub async fn connect(&self, session_id: &str) -> TestLearner {
        let (websocket, _) = tokio_tungstenite::connect_async(format!(
            "ws://{}/session/{session_id}/ws",
            self.base_address
        ))
        .await
        .expect("WebSocket could not be created.");
        TestLearner::new(websocket)
    }
}

#[derive(Deserialize)]
struct SessionCreatedResponse {
    id: String,
}
