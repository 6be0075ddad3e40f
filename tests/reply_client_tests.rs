mod common;

use base64::Engine;
use common::{hearing, Rig, StubReply};
use std::sync::Arc;
use std::time::Duration;
use voice_avatar::reply::{HttpReplyClient, ReplyClient};
use voice_avatar::session::{Event, SessionState};
use voice_avatar::ErrorKind;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> HttpReplyClient {
    HttpReplyClient::new(format!("{}/gemini", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_posts_prompt_and_reads_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gemini"))
        .and(body_json(serde_json::json!({ "prompt": "hello" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "Hi there" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).await.send("hello").await.unwrap();
    assert_eq!(reply.reply_text, "Hi there");
    assert!(reply.reply_audio.is_none());
}

#[tokio::test]
async fn test_decodes_reply_audio() {
    let server = MockServer::start().await;
    let audio = base64::engine::general_purpose::STANDARD.encode([7u8, 8, 9]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Listen",
            "audio": audio,
            "audio_mime": "audio/wav",
        })))
        .mount(&server)
        .await;

    let reply = client_for(&server).await.send("play").await.unwrap();
    let buffer = reply.reply_audio.unwrap();
    assert_eq!(buffer.as_bytes(), &[7, 8, 9]);
    assert_eq!(buffer.mime(), "audio/wav");
}

#[tokio::test]
async fn test_server_error_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client_for(&server).await.send("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = HttpReplyClient::new(uri, Duration::from_secs(1)).unwrap();
    let err = client.send("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
}

#[tokio::test]
async fn test_unparsable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).await.send("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponseError);
}

#[tokio::test]
async fn test_wrongly_typed_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": 42 })))
        .mount(&server)
        .await;

    let err = client_for(&server).await.send("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponseError);
}

#[tokio::test]
async fn test_empty_object_surfaces_as_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let rig = Rig::new(hearing("hello"), StubReply::default());
    let mut capabilities = rig.capabilities();
    capabilities.reply = Arc::new(client_for(&server).await);
    let mut controller =
        voice_avatar::SessionController::new(capabilities, voice_avatar::SessionConfig::default());

    controller.dispatch(Event::start()).await;
    controller.settle().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Errored);
    assert_eq!(snapshot.error.unwrap().kind, ErrorKind::NoContentError);
    assert_eq!(snapshot.transcript.as_deref(), Some("hello"));
    assert_eq!(rig.synthesizer.stats().starts(), 0);
}
