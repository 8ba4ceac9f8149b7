use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use lexicon_db::{LexiconCache, LexiconDictionary, LoadMode};
use scripture_reader::handlers::{AppState, router};
use scripture_types::RawLexiconEntry;

fn entry(def: &str, pos: Option<&str>) -> RawLexiconEntry {
    RawLexiconEntry {
        strongs_def: Some(def.into()),
        pos: pos.map(String::from),
        ..RawLexiconEntry::default()
    }
}

fn make_state() -> AppState {
    let dict = LexiconDictionary::from_entries(
        [
            ("G1615", entry("to complete fully", None)),
            ("G25", entry("to love", Some("verb"))),
        ],
        [("H430", entry("God", Some("noun")))],
    );
    AppState {
        lexicon: Arc::new(LexiconCache::preloaded(dict)),
        max_text_bytes: 64,
        disable_cache: false,
    }
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn read(
    response: axum::response::Response,
) -> (StatusCode, Option<String>, serde_json::Value) {
    let status = response.status();
    let cache = response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let body_bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);
    (status, cache, body)
}

#[tokio::test]
async fn healthz_ok() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn tokens_endpoint_splits_tagged_text() {
    let app = router(make_state());
    let (status, cache, body) = get(
        app,
        "/v1/tokens?text=love%5BG25%5D%5BG26%5D%20one%20another%2C",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cache.is_some());
    assert_eq!(body["text"], "love[G25][G26] one another,");
    let tokens = body["tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[0]["text"], "love");
    assert_eq!(tokens[0]["referenceCodes"], serde_json::json!(["G25", "G26"]));
    assert_eq!(tokens[3]["text"], ",");
    assert_eq!(tokens[3]["referenceCodes"], serde_json::json!([]));
}

#[tokio::test]
async fn tokens_endpoint_rejects_oversized_text() {
    let app = router(make_state());
    let text = "a".repeat(65);
    let (status, _, body) = get(app, &format!("/v1/tokens?text={text}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("at most 64"));
}

#[tokio::test]
async fn verse_endpoint_honors_pretokenized_codes() {
    let app = router(make_state());
    let request = Request::builder()
        .method("POST")
        .uri("/v1/verses/tokens")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"text": "In the beginning", "tokens": [{"text": "In", "strongs": "H7225"}, {"text": "beginning", "strongs": ["H7225", "H7218"]}]}"#,
        ))
        .unwrap();
    let (status, _, body) = read(app.oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens"][0]["referenceCodes"], serde_json::json!(["H7225"]));
    assert_eq!(
        body["tokens"][1]["referenceCodes"],
        serde_json::json!(["H7225", "H7218"])
    );
}

#[tokio::test]
async fn verse_endpoint_tokenizes_plain_text() {
    let app = router(make_state());
    let request = Request::builder()
        .method("POST")
        .uri("/v1/verses/tokens")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "  Blessed[G3107]  are[G1510]  "}"#))
        .unwrap();
    let (status, _, body) = read(app.oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let tokens = body["tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0]["text"], "Blessed");
    assert_eq!(tokens[1]["referenceCodes"], serde_json::json!(["G1510"]));
}

#[tokio::test]
async fn definition_endpoint_normalizes_code() {
    let app = router(make_state());
    let (status, cache, body) = get(app, "/v1/definitions/h430").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("public, max-age=86400"));
    assert_eq!(body["number"], "H430");
    assert_eq!(body["definition"], "God");
    assert_eq!(body["partOfSpeech"], "noun");
    assert!(body.get("lemma").is_none());
}

#[tokio::test]
async fn definition_endpoint_reports_missing_codes() {
    for uri in ["/v1/definitions/G9999", "/v1/definitions/X12"] {
        let app = router(make_state());
        let (status, _, body) = get(app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(
            body["error"]
                .as_str()
                .unwrap_or_default()
                .contains("no definition")
        );
    }
}

#[tokio::test]
async fn selection_substitutes_resolvable_sibling() {
    let app = router(make_state());
    let (status, _, body) = get(app, "/v1/definitions?codes=G9999,G1615&selected=G9999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "substituted");
    assert_eq!(body["requested"], "G9999");
    assert_eq!(body["shown"], "G1615");
    assert_eq!(body["definition"]["definition"], "to complete fully");
}

#[tokio::test]
async fn selection_reports_requested_and_unavailable() {
    let app = router(make_state());
    let (_, _, body) = get(app, "/v1/definitions?codes=G25,G1615&selected=g25").await;
    assert_eq!(body["status"], "requested");
    assert_eq!(body["shown"], "G25");

    let app = router(make_state());
    let (status, _, body) = get(app, "/v1/definitions?codes=G9999,H9999&selected=G9999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unavailable");
    assert!(body.get("definition").is_none());
    assert!(body.get("shown").is_none());
}

#[tokio::test]
async fn selection_requires_codes() {
    let app = router(make_state());
    let (status, _, body) = get(app, "/v1/definitions?codes=&selected=G25").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("required"));
}

#[tokio::test]
async fn missing_query_parameters_are_json_bad_requests() {
    for uri in [
        "/v1/tokens",
        "/v1/definitions?codes=G25",
        "/v1/resolvable",
    ] {
        let app = router(make_state());
        let (status, _, body) = get(app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        let error = body["error"].as_str().unwrap_or_default();
        assert!(error.contains("missing field"), "{uri}: {error}");
    }
}

#[tokio::test]
async fn verse_endpoint_rejects_malformed_bodies() {
    for payload in [r#"{"tokens": []}"#, "not json"] {
        let app = router(make_state());
        let request = Request::builder()
            .method("POST")
            .uri("/v1/verses/tokens")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .unwrap();
        let (status, _, body) = read(app.oneshot(request).await.unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert!(body["error"].is_string(), "{payload}");
    }
}

#[tokio::test]
async fn resolvable_endpoint_filters_in_order() {
    let app = router(make_state());
    let (status, _, body) = get(app, "/v1/resolvable?codes=H430,G9999,g25,Q1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["codes"], serde_json::json!(["H430", "g25"]));
}

#[tokio::test]
async fn cache_headers_can_be_disabled() {
    let mut state = make_state();
    state.disable_cache = true;
    let (status, cache, _) = get(router(state), "/v1/definitions/G25").await;
    assert_eq!(status, StatusCode::OK);
    assert!(cache.is_none());
}

#[tokio::test]
async fn lexicon_failure_surfaces_as_unavailable() {
    let state = AppState {
        lexicon: Arc::new(LexiconCache::new(|| anyhow::bail!("lexicon storage offline"))),
        max_text_bytes: 64,
        disable_cache: false,
    };
    let (status, _, body) = get(router(state.clone()), "/v1/definitions/G25").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("lexicon storage offline")
    );

    // Tokenizing needs no lexicon.
    let (status, _, _) = get(router(state), "/v1/tokens?text=amen").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn lexicon_loads_lazily_from_disk() {
    let tempdir = tempfile::tempdir().unwrap();
    std::fs::write(
        tempdir.path().join("greek.json"),
        r#"{"g26": {"lemma": "ἀγάπη", "strongs_def": "love"}}"#,
    )
    .unwrap();
    std::fs::write(tempdir.path().join("hebrew.json"), "{}").unwrap();
    let cache = Arc::new(LexiconCache::from_dir(tempdir.path(), LoadMode::Owned));
    let state = AppState {
        lexicon: Arc::clone(&cache),
        max_text_bytes: 64,
        disable_cache: false,
    };
    assert!(!cache.is_loaded());

    let (status, _, body) = get(router(state), "/v1/definitions/G26").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lemma"], "ἀγάπη");
    assert!(cache.is_loaded());
}
