//! End-to-end route tests against the in-memory store and a canned generator.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vocard::generation::GenerationError;
use vocard::{app, AppState, MemoryTableStore, TextGenerator};

struct CannedGenerator;

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn define_word(&self, word: &str, topic: Option<&str>) -> Result<Value, GenerationError> {
        Ok(json!({
            "definitions": [{
                "word": word,
                "partOfSpeech": "noun",
                "definition": format!("definition of {}", word),
                "context": topic,
            }]
        }))
    }

    async fn list_vocabulary(&self, topic: &str) -> Result<Vec<String>, GenerationError> {
        if topic == "broken" {
            return Err(GenerationError::Malformed("missing 'vocabularies' array".into()));
        }
        Ok(vec!["apple".into(), "bread".into()])
    }
}

fn test_app() -> Router {
    let state = AppState::new(Arc::new(MemoryTableStore::new()), Arc::new(CannedGenerator));
    app(state, 64 * 1024)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri).body(Body::from(body)).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn card(topic: &str, word: &str) -> Value {
    json!({"topic": topic, "word": word, "partOfSpeech": "noun", "definition": format!("a {}", word)})
}

#[tokio::test]
async fn test_create_card_then_list_topic() {
    let app = test_app();
    let (status, created) = send(&app, Method::POST, "/cards/create", Some(card("Food", "apple"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["PartitionKey"], "food");
    assert_eq!(created["word"], "apple");
    assert!(created["RowKey"].as_str().unwrap().len() >= 32);

    let (status, page) = send(&app, Method::GET, "/cards/food", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["cards"].as_array().unwrap().len(), 1);
    assert_eq!(page["cards"][0]["RowKey"], created["RowKey"]);
    assert_eq!(page["continuationToken"], Value::Null);
}

#[tokio::test]
async fn test_partition_keyed_create_is_listable() {
    let app = test_app();
    let (status, created) = send(&app, Method::POST, "/cards/create", Some(card("Create", "make"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["PartitionKey"], "create");

    let (status, page) = send(&app, Method::GET, "/cards/create?pageSize=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["cards"].as_array().unwrap().len(), 1);
    assert_eq!(page["cards"][0]["word"], "make");

    let (status, topic) = send(
        &app,
        Method::POST,
        "/topics/create",
        Some(json!({"module": "Create", "title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(topic["PartitionKey"], "create");

    let (status, page) = send(&app, Method::GET, "/topics/create", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["topics"].as_array().unwrap().len(), 1);
    assert_eq!(page["topics"][0]["RowKey"], "x");
}

#[tokio::test]
async fn test_card_pagination_with_continuation_token() {
    let app = test_app();
    for word in ["apple", "banana", "cherry"] {
        let (status, _) = send(&app, Method::POST, "/cards/create", Some(card("Food", word))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let mut uri = "/cards/food?pageSize=1".to_string();
    let mut words = Vec::new();
    for i in 0..3 {
        let (status, page) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let cards = page["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 1);
        words.push(cards[0]["word"].as_str().unwrap().to_string());
        let token = &page["continuationToken"];
        if i < 2 {
            assert!(token.is_object(), "expected a token on page {}", i);
            let url = reqwest::Url::parse_with_params(
                "http://localhost/cards/food",
                &[("pageSize", "1".to_string()), ("continuationToken", token.to_string())],
            )
            .unwrap();
            uri = format!("{}?{}", url.path(), url.query().unwrap());
        } else {
            assert_eq!(*token, Value::Null);
        }
    }
    words.sort();
    assert_eq!(words, ["apple", "banana", "cherry"]);
}

#[tokio::test]
async fn test_list_rejects_malformed_paging_input() {
    let app = test_app();
    let (status, _) = send(&app, Method::GET, "/cards/food?continuationToken=%7Bnope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::GET, "/cards/food?pageSize=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_card_validation_names_missing_keys() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/cards/create",
        Some(json!({"topic": "food", "word": "apple"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("partOfSpeech"), "{}", message);
    assert!(message.contains("definition"), "{}", message);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_module_title_type_is_checked() {
    let app = test_app();
    let (status, body) = send(&app, Method::POST, "/modules/create", Some(json!({"title": 123}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "title must be a string");
}

#[tokio::test]
async fn test_body_must_be_json_object() {
    let app = test_app();
    let (status, _) = send(&app, Method::POST, "/modules/create", Some(json!(["title"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extra_fields_persist_and_reserved_keys_are_ignored() {
    let app = test_app();
    let (status, created) = send(
        &app,
        Method::POST,
        "/modules/create",
        Some(json!({"title": "Everyday English", "level": "A1", "order": 2, "PartitionKey": "elsewhere"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["PartitionKey"], "default");
    assert_eq!(created["RowKey"], "everyday_english");
    assert_eq!(created["level"], "A1");
    assert_eq!(created["order"], 2);

    let (_, page) = send(&app, Method::GET, "/modules", None).await;
    assert_eq!(page["modules"][0]["order"], 2);
}

#[tokio::test]
async fn test_duplicate_module_is_conflict() {
    let app = test_app();
    let (status, _) = send(&app, Method::POST, "/modules/create", Some(json!({"title": "Food!"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::POST, "/modules/create", Some(json!({"title": "Food?"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn test_topic_update_and_title_immutability() {
    let app = test_app();
    let (status, topic) = send(
        &app,
        Method::POST,
        "/topics/create",
        Some(json!({"module": "Everyday English", "title": "Fruits"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(topic["PartitionKey"], "everyday_english");
    assert_eq!(topic["RowKey"], "fruits");

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/topics/everyday_english/fruits/change",
        Some(json!({"module": "Everyday English", "title": "Fruits", "description": "sweet things"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "sweet things");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/topics/everyday_english/fruits/change",
        Some(json!({"module": "Everyday English", "title": "Vegetables"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Changing topic title is not allowed.");

    let (_, page) = send(&app, Method::GET, "/topics/everyday_english", None).await;
    assert_eq!(page["topics"].as_array().unwrap().len(), 1);
    assert_eq!(page["topics"][0]["description"], "sweet things");
}

#[tokio::test]
async fn test_card_change_and_delete() {
    let app = test_app();
    let (_, created) = send(&app, Method::POST, "/cards/create", Some(card("Food", "apple"))).await;
    let row_key = created["RowKey"].as_str().unwrap().to_string();

    let mut changed = card("Food", "apple");
    changed["meaningVi"] = json!("quả táo");
    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/cards/food/{}/change", row_key),
        Some(changed),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["meaningVi"], "quả táo");
    assert_eq!(updated["RowKey"], row_key.as_str());

    let (status, body) = send(&app, Method::DELETE, &format!("/cards/food/{}/delete", row_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (_, page) = send(&app, Method::GET, "/cards/food", None).await;
    assert!(page["cards"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_module_update_is_not_found() {
    let app = test_app();
    send(&app, Method::POST, "/modules/create", Some(json!({"title": "Basics"}))).await;
    let (status, _) = send(&app, Method::DELETE, "/modules/basics/delete", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/modules/basics/change",
        Some(json!({"title": "Basics"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::DELETE, "/modules/basics/delete", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_of_missing_record_is_not_found_before_body_checks() {
    let app = test_app();
    let (status, body) = send_raw(&app, Method::PUT, "/modules/ghost/change", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
    let (status, _) = send_raw(&app, Method::PUT, "/topics/m/ghost/change", "not json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_raw(&app, Method::PUT, "/cards/food/ghost/change", "[1]").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, Method::POST, "/modules/create", Some(json!({"title": "Basics"}))).await;
    let (status, body) = send_raw(&app, Method::PUT, "/modules/basics/change", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "bad request: Please pass a JSON object in the request body");
}

#[tokio::test]
async fn test_generate_definitions() {
    let app = test_app();
    let (status, body) = send(&app, Method::POST, "/definitions/gen", Some(json!({"topic": "food"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("Please provide a word"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/definitions/gen",
        Some(json!({"word": "apple", "topic": "food"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["definitions"][0]["word"], "apple");
    assert_eq!(body["definitions"][0]["context"], "food");

    let (status, body) = send(
        &app,
        Method::POST,
        "/definitions/gen",
        Some(json!({"word": "apple", "topic": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["definitions"][0]["context"], Value::Null);

    let (status, body) = send(&app, Method::POST, "/definitions/gen", Some(json!({"word": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "bad request: word must be a string");
}

#[tokio::test]
async fn test_generate_vocabularies() {
    let app = test_app();
    let (status, body) = send(&app, Method::POST, "/vocabularies/gen", Some(json!({"topic": "food"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"topic": "food", "vocabularies": ["apple", "bread"]}));

    let (status, body) = send(&app, Method::POST, "/vocabularies/gen", Some(json!({"topic": "broken"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "generation_error");
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "ok");
}
