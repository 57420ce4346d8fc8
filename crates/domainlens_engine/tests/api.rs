use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use domainlens_engine::{ApiClient, ApiConfig, BatchStatus, ClientError, SectorLabel};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiConfig::new(server.uri())).expect("client")
}

#[tokio::test]
async fn analyze_posts_the_email_and_decodes_the_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_partial_json(json!({
            "email": "person@example.com",
            "force_refresh": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "original_email": "person@example.com",
            "extracted_domain": "example.com",
            "selected_url": "https://example.com",
            "scraping_status": "success",
            "website_summary": "An example business.",
            "confidence_score": 0.91,
            "processing_time_seconds": 2.4,
            "from_cache": true,
            "real_estate": "No",
            "infrastructure": "Can't Say",
            "industrial": "Yes"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.analyze("person@example.com", false).await.unwrap();

    assert_eq!(result.extracted_domain, "example.com");
    assert_eq!(result.confidence_score, Some(0.91));
    assert_eq!(result.real_estate, SectorLabel::No);
    assert_eq!(result.infrastructure, SectorLabel::CantSay);
    assert_eq!(result.industrial, SectorLabel::Yes);
    assert!(result.from_cache);
}

#[tokio::test]
async fn failure_statuses_surface_the_service_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"detail": "Invalid email format"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client.analyze("person@example.com", false).await.unwrap_err();

    match error {
        ClientError::Service { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Invalid email format");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_failure_bodies_fall_back_to_the_status_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client.analyze("person@example.com", false).await.unwrap_err();

    match error {
        ClientError::Service { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn an_error_key_under_a_success_status_is_still_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/upload-csv"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "No email column found"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .upload_csv("sess_x", "leads.csv", b"email\na@b.co\n".to_vec())
        .await
        .unwrap_err();

    match error {
        ClientError::Service { status, message } => {
            assert_eq!(status, 200);
            assert_eq!(message, "No email column found");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_messages_return_the_service_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/message"))
        .and(body_partial_json(json!({
            "session_id": "sess_x",
            "message": "what can you do?",
            "message_type": "user"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message_id": "msg_1",
            "session_id": "sess_x",
            "message_type": "system",
            "content": "I analyze email domains.",
            "timestamp": "2026-08-23T10:00:00Z",
            "metadata": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let envelope = client
        .send_chat_message("sess_x", "what can you do?")
        .await
        .unwrap();

    assert_eq!(envelope.content, "I analyze email domains.");
}

#[tokio::test]
async fn batch_status_and_results_use_the_batch_routes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batch/status/batch_7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch_id": "batch_7",
            "total": 120,
            "processed": 60,
            "successful": 58,
            "failed": 2,
            "status": "processing",
            "progress_percentage": 50.0
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/batch/results/batch_7"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"original_email": "a@b.co", "extracted_domain": "b.co"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let job = client.batch_status("batch_7").await.unwrap();
    assert_eq!(job.status, BatchStatus::Processing);
    assert_eq!(job.processed, 60);

    let results = client.batch_results("batch_7", 0, 100).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].extracted_domain, "b.co");
}

#[tokio::test]
async fn health_reports_success_and_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.health().await.is_ok());
    assert!(client.health().await.is_err());
}
