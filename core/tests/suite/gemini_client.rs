use core_test_support::gemini_config_for;
use core_test_support::image_response;
use core_test_support::load_json_fixture;
use core_test_support::mount_generate;
use core_test_support::only_request_body;
use core_test_support::tagged_png;
use core_test_support::text_response;
use pretty_assertions::assert_eq;
use retouch_core::ApiError;
use retouch_core::EditError;
use retouch_core::GeminiClient;
use retouch_core::GeminiConfig;
use retouch_core::RemoteEditService;
use retouch_core::protocol::ImagePayload;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;

const EDIT_MODEL: &str = "gemini-2.5-flash-image";
const SUGGEST_MODEL: &str = "gemini-2.5-flash";

#[tokio::test]
async fn edit_returns_inline_image() {
    let server = MockServer::start().await;
    let edited = ImagePayload::new("image/jpeg", vec![9, 8, 7]);
    mount_generate(
        &server,
        EDIT_MODEL,
        ResponseTemplate::new(200).set_body_json(image_response(&edited)),
    )
    .await;
    let client = GeminiClient::new(gemini_config_for(&server.uri()));

    let result = client
        .edit(&tagged_png(1), "make it black and white")
        .await
        .unwrap();

    assert_eq!(result, edited);

    let body = only_request_body(&server).await;
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], tagged_png(1).to_base64());
    let prompt = parts[1]["text"].as_str().unwrap();
    assert!(prompt.starts_with("Act as a professional photo editor."));
    assert!(prompt.contains("Instruction: make it black and white"));
}

#[tokio::test]
async fn edit_without_image_reports_commentary() {
    let server = MockServer::start().await;
    mount_generate(
        &server,
        EDIT_MODEL,
        ResponseTemplate::new(200)
            .set_body_json(text_response("I can't edit this image.\nTry another.")),
    )
    .await;
    let client = GeminiClient::new(gemini_config_for(&server.uri()));

    let err = client.edit(&tagged_png(1), "remove the sky").await.unwrap_err();

    let EditError::NoImageReturned { commentary } = &err else {
        panic!("expected NoImageReturned, got {err:?}");
    };
    assert_eq!(
        commentary.as_deref(),
        Some("I can't edit this image. Try another.")
    );
    assert!(err.to_string().contains("I can't edit this image."));
}

#[tokio::test]
async fn blocked_prompt_is_a_refusal() {
    let server = MockServer::start().await;
    mount_generate(
        &server,
        EDIT_MODEL,
        ResponseTemplate::new(200).set_body_json(load_json_fixture("prompt_blocked.json")),
    )
    .await;
    let client = GeminiClient::new(gemini_config_for(&server.uri()));

    let err = client.edit(&tagged_png(1), "anything").await.unwrap_err();

    assert!(matches!(err, EditError::ModelRefusal { ref reason } if reason == "SAFETY"));
    assert_eq!(err.to_string(), "Generation stopped due to: SAFETY");
}

#[tokio::test]
async fn non_stop_finish_without_image_is_a_refusal() {
    let server = MockServer::start().await;
    mount_generate(
        &server,
        EDIT_MODEL,
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "IMAGE_SAFETY" }]
        })),
    )
    .await;
    let client = GeminiClient::new(gemini_config_for(&server.uri()));

    let err = client.edit(&tagged_png(1), "anything").await.unwrap_err();

    assert!(matches!(err, EditError::ModelRefusal { ref reason } if reason == "IMAGE_SAFETY"));
}

#[tokio::test]
async fn http_error_surfaces_api_message() {
    let server = MockServer::start().await;
    mount_generate(
        &server,
        EDIT_MODEL,
        ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "Internal error encountered.", "status": "INTERNAL" }
        })),
    )
    .await;
    let client = GeminiClient::new(gemini_config_for(&server.uri()));

    let err = client.edit(&tagged_png(1), "anything").await.unwrap_err();

    match err {
        EditError::Transport(ApiError::ApiResponse {
            status,
            message,
            error_type,
        }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal error encountered.");
            assert_eq!(error_type.as_deref(), Some("INTERNAL"));
        }
        other => panic!("expected ApiResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_api_key_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = GeminiClient::new(GeminiConfig {
        api_key: None,
        ..gemini_config_for(&server.uri())
    });

    assert!(!client.is_authenticated());
    let err = client.edit(&tagged_png(1), "anything").await.unwrap_err();

    assert!(matches!(err, EditError::Transport(ApiError::NotAuthenticated)));
}

#[tokio::test]
async fn suggestions_are_parsed_and_cleaned() {
    let server = MockServer::start().await;
    mount_generate(
        &server,
        SUGGEST_MODEL,
        ResponseTemplate::new(200).set_body_json(load_json_fixture("suggestions.json")),
    )
    .await;
    let client = GeminiClient::new(gemini_config_for(&server.uri()));

    let suggestions = client.suggest(&tagged_png(3)).await;

    assert_eq!(
        suggestions,
        vec![
            "Isolate the sneaker on a white studio background".to_string(),
            "Add a soft contact shadow".to_string(),
            "Boost color vibrance of the laces".to_string(),
        ]
    );

    let body = only_request_body(&server).await;
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(body["generationConfig"]["temperature"], 0.5);
}

#[tokio::test]
async fn suggestions_are_capped_by_config() {
    let server = MockServer::start().await;
    mount_generate(
        &server,
        SUGGEST_MODEL,
        ResponseTemplate::new(200).set_body_json(text_response(r#"["a", "b", "c", "d"]"#)),
    )
    .await;
    let client = GeminiClient::new(GeminiConfig {
        max_suggestions: 2,
        ..gemini_config_for(&server.uri())
    });

    let suggestions = client.fetch_suggestions(&tagged_png(1)).await.unwrap();

    assert_eq!(suggestions, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn suggestion_failures_degrade_to_empty_list() {
    let server = MockServer::start().await;
    mount_generate(
        &server,
        SUGGEST_MODEL,
        ResponseTemplate::new(503).set_body_string("overloaded"),
    )
    .await;
    let client = GeminiClient::new(gemini_config_for(&server.uri()));

    assert!(matches!(
        client.fetch_suggestions(&tagged_png(1)).await,
        Err(ApiError::ApiResponse { status: 503, .. })
    ));
    assert!(client.suggest(&tagged_png(1)).await.is_empty());
}
