use contact_scout::scorer::{FormScorer, OpenAiScorer};
use httpmock::prelude::*;
use serde_json::json;

fn scorer_for(server: &MockServer) -> OpenAiScorer {
    OpenAiScorer::new("test-key".to_string())
        .unwrap()
        .with_endpoint(server.url("/v1/chat/completions"))
}

fn completion(content: &str) -> serde_json::Value {
    json!({ "choices": [{ "message": { "content": content } }] })
}

#[tokio::test]
async fn verdict_is_parsed_from_the_completion() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body_partial(r#"{ "model": "gpt-4o-mini", "temperature": 0 }"#);
            then.status(200).json_body(completion("2"));
        })
        .await;

    let scorer = scorer_for(&server);
    let verdict = scorer.score("<form></form>", "Contact us").await.unwrap();

    assert_eq!(verdict, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn negative_verdict_survives_surrounding_prose() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(completion("The answer is -2."));
        })
        .await;

    let scorer = scorer_for(&server);
    assert_eq!(scorer.score("<form></form>", "").await.unwrap(), -2);
}

#[tokio::test]
async fn completion_without_a_number_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(completion("maybe"));
        })
        .await;

    let scorer = scorer_for(&server);
    assert!(scorer.score("<form></form>", "").await.is_err());
}

#[tokio::test]
async fn http_failure_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(500);
        })
        .await;

    let scorer = scorer_for(&server);
    assert!(scorer.score("<form></form>", "").await.is_err());
}
