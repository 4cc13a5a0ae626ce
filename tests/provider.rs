use std::io::Write;
use std::time::Duration;

use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use roastchat_lib::api::{HuggingFaceProvider, LLMApiProvider};
use roastchat_lib::models::{DecodingParams, ModelConfig, PromptRoute, Turn};
use serde_json::json;

fn config(api_url: &str, prompt_route: PromptRoute) -> ModelConfig {
    ModelConfig {
        model: "org/model".to_string(),
        api_url: api_url.to_string(),
        prompt_route,
        decoding: DecodingParams {
            max_new_tokens: 32,
            temperature: 0.5,
            max_length: 128,
        },
        request_timeout: Duration::from_secs(5),
    }
}

fn provider() -> HuggingFaceProvider {
    HuggingFaceProvider::new(Duration::from_secs(5)).unwrap()
}

fn chat_reply(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_prompt_over_chat_route() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer hf_test")
        .match_body(Matcher::Json(json!({
            "model": "org/model",
            "messages": [{"role": "user", "content": "Roast Ravi"}],
            "max_tokens": 32,
            "temperature": 0.5,
            "stream": false
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply("Ravi, tu toh legend hai"))
        .create_async()
        .await;

    let actual = provider()
        .send_prompt_request(&config(&server.url(), PromptRoute::Chat), "hf_test", "Roast Ravi")
        .await
        .unwrap();

    assert_eq!(actual, "Ravi, tu toh legend hai");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_prompt_over_text_generation_route() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/hf-inference/models/org/model")
        .match_header("authorization", "Bearer hf_test")
        .match_body(Matcher::Json(json!({
            "inputs": "Roast Ravi",
            "parameters": {
                "max_new_tokens": 32,
                "temperature": 0.5,
                "max_length": 128,
                "return_full_text": false
            }
        })))
        .with_status(200)
        .with_body(json!([{"generated_text": "generated roast"}]).to_string())
        .create_async()
        .await;

    let actual = provider()
        .send_prompt_request(
            &config(&server.url(), PromptRoute::TextGeneration),
            "hf_test",
            "Roast Ravi",
        )
        .await
        .unwrap();

    assert_eq!(actual, "generated roast");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_text_generation_single_object_response() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/hf-inference/models/org/model")
        .with_status(200)
        .with_body(json!({"generated_text": "single"}).to_string())
        .create_async()
        .await;

    let actual = provider()
        .send_prompt_request(&config(&server.url(), PromptRoute::TextGeneration), "k", "p")
        .await
        .unwrap();

    assert_eq!(actual, "single");
}

#[tokio::test]
async fn test_chat_request_sends_full_history() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "messages": [
                {"role": "system", "content": "persona"},
                {"role": "assistant", "content": "roast"},
                {"role": "user", "content": "lol"},
                {"role": "assistant", "content": "reply"},
                {"role": "user", "content": "again"}
            ]
        })))
        .with_status(200)
        .with_body(chat_reply("next"))
        .create_async()
        .await;

    let turns = vec![
        Turn::system("persona"),
        Turn::assistant("roast"),
        Turn::user("lol"),
        Turn::assistant("reply"),
        Turn::user("again"),
    ];
    let actual = provider()
        .send_chat_request(&config(&server.url(), PromptRoute::Chat), "k", &turns)
        .await
        .unwrap();

    assert_eq!(actual, "next");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":"Rate limit reached"}"#)
        .create_async()
        .await;

    let err = provider()
        .send_chat_request(&config(&server.url(), PromptRoute::Chat), "k", &[Turn::user("hi")])
        .await
        .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("429"), "{}", message);
    assert!(message.contains("Rate limit reached"), "{}", message);
}

#[tokio::test]
async fn test_unauthorized_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body("Invalid credentials")
        .create_async()
        .await;

    let err = provider()
        .send_prompt_request(&config(&server.url(), PromptRoute::Chat), "bad", "p")
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("401"));
}

#[tokio::test]
async fn test_malformed_body_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let result = provider()
        .send_chat_request(&config(&server.url(), PromptRoute::Chat), "k", &[Turn::user("hi")])
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_choices_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(json!({"choices": []}).to_string())
        .create_async()
        .await;

    let result = provider()
        .send_chat_request(&config(&server.url(), PromptRoute::Chat), "k", &[Turn::user("hi")])
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_blank_completion_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(chat_reply("   "))
        .create_async()
        .await;

    let result = provider()
        .send_prompt_request(&config(&server.url(), PromptRoute::Chat), "k", "p")
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_timeout_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(800));
            w.write_all(b"{}")
        })
        .create_async()
        .await;

    let fast = HuggingFaceProvider::new(Duration::from_millis(100)).unwrap();
    let result = fast
        .send_prompt_request(&config(&server.url(), PromptRoute::Chat), "k", "p")
        .await;

    assert!(result.is_err());
}
