use std::time::Duration;

use tokio_tungstenite::tungstenite::Message;

use crate::helpers::test_app::TestApp;
use crate::helpers::test_learner::{TestLearner, WsMessageIn, WsMessageOut};

const APPLE: &str = "english,korean\napple,사과";

async fn started_session(app: &TestApp, vocabulary: &str) -> TestLearner {
    let session_id = app.create_session(Some(vocabulary)).await;
    let mut learner = app.connect(&session_id).await;
    let state = learner
        .receive_until(|message| matches!(message, WsMessageIn::SessionState { .. }))
        .await
        .unwrap();
    assert!(matches!(state, WsMessageIn::SessionState { state, .. } if state == "Idle"));
    learner.send(WsMessageOut::StartSession).await;
    learner
}

async fn receive_feedback(learner: &mut TestLearner) -> (String, Option<String>, u8) {
    match learner
        .receive_until(|message| matches!(message, WsMessageIn::Feedback { .. }))
        .await
        .unwrap()
    {
        WsMessageIn::Feedback {
            outcome,
            expected,
            attempts_remaining,
        } => (outcome, expected, attempts_remaining),
        other => panic!("Expected feedback, got {other:?}"),
    }
}

#[tokio::test]
async fn create_session_works_with_the_default_vocabulary() {
    let app = TestApp::spawn_app().await;

    let session_id = app.create_session(None).await;

    assert_eq!(session_id.len(), 5);
}

#[tokio::test]
async fn connecting_to_an_unknown_session_fails() {
    let app = TestApp::spawn_app().await;

    let mut learner = app.connect("nope1").await;

    assert_eq!(learner.receive_error().await, "SESSION_DOES_NOT_EXIST");
}

#[tokio::test]
async fn prompt_is_spoken_three_times_before_listening() {
    let app = TestApp::spawn_app().await;
    let mut learner = started_session(&app, APPLE).await;

    let prompt = learner
        .receive_until(|message| matches!(message, WsMessageIn::Prompt { .. }))
        .await
        .unwrap();
    assert!(matches!(prompt, WsMessageIn::Prompt { prompt, .. } if prompt == "apple"));

    assert_eq!(learner.listen_to_prompt().await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn a_correct_spoken_answer_completes_a_two_point_session() {
    let app = TestApp::spawn_app_with(|config| config.session.target_score = 2).await;
    let mut learner = started_session(&app, APPLE).await;
    learner.listen_to_prompt().await.unwrap();

    learner.say(" 사과 ").await;

    let (outcome, expected, _) = receive_feedback(&mut learner).await;
    assert_eq!(outcome, "session_complete");
    assert_eq!(expected.as_deref(), Some("사과"));
    let score = learner
        .receive_until(|message| matches!(message, WsMessageIn::Score { .. }))
        .await
        .unwrap();
    assert_eq!(score, WsMessageIn::Score { current: 2, target: 2 });
    let complete = learner
        .receive_until(|message| matches!(message, WsMessageIn::SessionComplete { .. }))
        .await
        .unwrap();
    assert_eq!(
        complete,
        WsMessageIn::SessionComplete {
            final_score: 2,
            completed: true
        }
    );
}

#[tokio::test]
async fn answers_while_the_prompt_is_spoken_are_ignored() {
    let app = TestApp::spawn_app_with(|config| config.session.target_score = 2).await;
    let mut learner = started_session(&app, APPLE).await;
    let utterance_id = match learner
        .receive_until(|message| matches!(message, WsMessageIn::Speak { .. }))
        .await
        .unwrap()
    {
        WsMessageIn::Speak { utterance_id, .. } => utterance_id,
        other => panic!("Expected speak, got {other:?}"),
    };

    learner.say("사과").await;
    learner
        .send(WsMessageOut::UtteranceEnded { utterance_id })
        .await;

    assert_eq!(learner.listen_to_prompt().await.unwrap(), vec![2, 3]);
    learner.say("사과").await;
    let (outcome, _, attempts_remaining) = receive_feedback(&mut learner).await;
    assert_eq!(outcome, "session_complete");
    assert_eq!(attempts_remaining, 0);
}

#[tokio::test]
async fn wrong_answers_replay_the_prompt_until_attempts_run_out() {
    let app = TestApp::spawn_app().await;
    let mut learner = started_session(&app, APPLE).await;
    learner.listen_to_prompt().await.unwrap();

    learner.say("바나나").await;
    assert_eq!(
        receive_feedback(&mut learner).await,
        ("incorrect_retry".to_string(), None, 2)
    );
    assert_eq!(learner.listen_to_prompt().await.unwrap(), vec![1]);

    learner
        .send(WsMessageOut::RecognitionError {
            capture_id: learner.capture_id(),
            error: "no-speech".to_string(),
        })
        .await;
    assert_eq!(
        receive_feedback(&mut learner).await,
        ("incorrect_retry".to_string(), None, 1)
    );
    assert_eq!(learner.listen_to_prompt().await.unwrap(), vec![1]);

    learner
        .send(WsMessageOut::TypedAnswer {
            text: "포도".to_string(),
        })
        .await;
    let (outcome, expected, _) = receive_feedback(&mut learner).await;
    assert_eq!(outcome, "incorrect_exhausted");
    assert_eq!(expected.as_deref(), Some("사과"));
    let state = learner
        .receive_until(|message| matches!(message, WsMessageIn::SessionState { .. }))
        .await
        .unwrap();
    assert!(matches!(
        state,
        WsMessageIn::SessionState { state, score: 0, attempts_used: 0, .. } if state == "Presenting"
    ));
}

#[tokio::test]
async fn capture_end_after_a_wrong_answer_costs_a_single_attempt() {
    let app = TestApp::spawn_app_with(|config| config.session.replay_prompt_on_retry = false).await;
    let mut learner = started_session(&app, APPLE).await;
    learner.listen_to_prompt().await.unwrap();
    let answered = learner.capture_id();

    learner.say("바나나").await;
    learner
        .send(WsMessageOut::CaptureEnded {
            capture_id: answered,
        })
        .await;

    assert_eq!(
        receive_feedback(&mut learner).await,
        ("incorrect_retry".to_string(), None, 2)
    );
    learner
        .receive_until(|message| matches!(message, WsMessageIn::StartCapture { .. }))
        .await
        .unwrap();
    assert_ne!(learner.capture_id(), answered);
    learner.say("사과").await;
    let (outcome, _, _) = receive_feedback(&mut learner).await;
    assert_eq!(outcome, "correct");
    let state = learner
        .receive_until(|message| matches!(message, WsMessageIn::SessionState { .. }))
        .await
        .unwrap();
    assert!(matches!(state, WsMessageIn::SessionState { score: 2, .. }));
}

#[tokio::test]
async fn silent_capture_times_out_and_costs_an_attempt() {
    let app = TestApp::spawn_app_with(|config| {
        config.session.recognition_timeout_seconds = 1;
        config.session.replay_prompt_on_retry = false;
    })
    .await;
    let mut learner = started_session(&app, APPLE).await;
    learner.listen_to_prompt().await.unwrap();
    let timed_out = learner.capture_id();

    learner
        .receive_until(|message| matches!(message, WsMessageIn::StopCapture))
        .await
        .unwrap();
    assert_eq!(
        receive_feedback(&mut learner).await,
        ("incorrect_retry".to_string(), None, 2)
    );
    learner
        .receive_until(|message| matches!(message, WsMessageIn::StartCapture { .. }))
        .await
        .unwrap();
    assert_ne!(learner.capture_id(), timed_out);
}

#[tokio::test]
async fn multiple_choice_answers_are_selected_by_id() {
    let app = TestApp::spawn_app_with(|config| config.session.target_score = 2).await;
    let mut learner = started_session(
        &app,
        "prompt,correct,wrong,wrong_translation\napple,사과,사자,lion",
    )
    .await;
    let choices = match learner
        .receive_until(|message| matches!(message, WsMessageIn::Prompt { .. }))
        .await
        .unwrap()
    {
        WsMessageIn::Prompt { choices, .. } => choices,
        other => panic!("Expected prompt, got {other:?}"),
    };
    assert_eq!(choices.len(), 2);
    let correct = choices
        .iter()
        .find(|choice| choice.text == "사과")
        .expect("The correct answer is offered");
    learner.listen_to_prompt().await.unwrap();

    learner
        .send(WsMessageOut::SelectChoice {
            choice_id: correct.id,
        })
        .await;

    let (outcome, _, _) = receive_feedback(&mut learner).await;
    assert_eq!(outcome, "session_complete");
}

#[tokio::test]
async fn empty_vocabulary_cannot_be_started() {
    let app = TestApp::spawn_app().await;

    let mut learner = started_session(&app, "english,korean\n\n").await;

    assert_eq!(learner.receive_error().await, "EMPTY_VOCABULARY");
}

#[tokio::test]
async fn ending_the_session_stops_listening() {
    let app = TestApp::spawn_app().await;
    let mut learner = started_session(&app, APPLE).await;
    learner.listen_to_prompt().await.unwrap();

    learner.send(WsMessageOut::EndSession).await;

    learner
        .receive_until(|message| matches!(message, WsMessageIn::StopCapture))
        .await
        .unwrap();
    let complete = learner
        .receive_until(|message| matches!(message, WsMessageIn::SessionComplete { .. }))
        .await
        .unwrap();
    assert_eq!(
        complete,
        WsMessageIn::SessionComplete {
            final_score: 0,
            completed: false
        }
    );
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let app = TestApp::spawn_app().await;
    let session_id = app.create_session(None).await;
    let mut learner = app.connect(&session_id).await;
    learner
        .receive_until(|message| matches!(message, WsMessageIn::SessionState { .. }))
        .await
        .unwrap();

    learner.send_message(Message::Text("ping".to_string())).await;

    assert_eq!(learner.receive_text().await.unwrap(), "pong");
}

#[tokio::test]
async fn unprocessable_messages_keep_the_websocket_open() {
    let app = TestApp::spawn_app().await;
    let session_id = app.create_session(None).await;
    let mut learner = app.connect(&session_id).await;
    learner
        .receive_until(|message| matches!(message, WsMessageIn::SessionState { .. }))
        .await
        .unwrap();

    learner.send(WsMessageOut::Dance).await;
    assert_eq!(
        learner.receive_error().await,
        "UNPROCESSABLE_WEBSOCKET_MESSAGE"
    );

    learner.send_message(Message::Text("ping".to_string())).await;
    assert_eq!(learner.receive_text().await.unwrap(), "pong");
}

#[tokio::test]
async fn session_is_closed_after_inactivity_timeout() {
    let app = TestApp::spawn_app().await;
    let session_id = app.create_session(None).await;
    let learner = app.connect(&session_id).await;

    // Dropping the websocket disconnects the only learner of the session
    drop(learner);
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let mut learner = app.connect(&session_id).await;
    assert_eq!(learner.receive_error().await, "SESSION_DOES_NOT_EXIST");
}
