use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lexicon_db::{LexiconCache, LexiconDictionary};
use lexicon_resolver::{Resolver, Selection, normalize_code};
use scripture_tokenizer::{tokenize, verse_tokens};
use scripture_types::{NormalizedDefinition, Token, VerseRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const DEFAULT_MAX_TEXT_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub lexicon: Arc<LexiconCache>,
    pub max_text_bytes: usize,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct TokensQuery {
    pub text: String,
}

#[derive(Deserialize)]
pub struct SelectionQuery {
    pub codes: String,
    pub selected: String,
}

#[derive(Deserialize)]
pub struct ResolvableQuery {
    pub codes: String,
}

#[derive(Serialize)]
pub struct TokensResponse {
    text: String,
    tokens: Vec<Token>,
}

#[derive(Serialize)]
pub struct SelectionResponse {
    status: &'static str,
    requested: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    definition: Option<NormalizedDefinition>,
}

#[derive(Serialize)]
pub struct ResolvableResponse {
    codes: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/tokens", get(tokens))
        .route("/v1/verses/tokens", post(verse))
        .route("/v1/definitions", get(select_definition))
        .route("/v1/definitions/{code}", get(definition))
        .route("/v1/resolvable", get(resolvable))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn tokens(
    State(state): State<AppState>,
    params: Result<Query<TokensQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    check_text_len(&state, &params.text)?;
    let tokens = tokenize(&params.text);
    let response = TokensResponse {
        text: params.text,
        tokens,
    };
    Ok(with_cache(&state, "public, max-age=3600", Json(response)))
}

async fn verse(
    State(state): State<AppState>,
    record: Result<Json<VerseRecord>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(record) = record?;
    check_text_len(&state, &record.text)?;
    let tokens = verse_tokens(&record);
    Ok(Json(TokensResponse {
        text: record.text,
        tokens,
    })
    .into_response())
}

async fn definition(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let dict = lexicon(&state).await?;
    let resolver = Resolver::new(|family, key| dict.entry(family, key));
    let definition = resolver
        .resolve(&code)
        .ok_or_else(|| ApiError::NotFound(format!("no definition for {}", normalize_code(&code))))?;
    Ok(with_cache(&state, "public, max-age=86400", Json(definition)))
}

async fn select_definition(
    State(state): State<AppState>,
    params: Result<Query<SelectionQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let codes = parse_codes(&params.codes);
    if codes.is_empty() {
        return Err(ApiError::bad_request("codes is required"));
    }
    if params.selected.trim().is_empty() {
        return Err(ApiError::bad_request("selected is required"));
    }

    let dict = lexicon(&state).await?;
    let resolver = Resolver::new(|family, key| dict.entry(family, key));
    let response = match resolver.select(codes.as_slice(), &params.selected) {
        Selection::Requested(definition) => SelectionResponse {
            status: "requested",
            requested: definition.number.clone(),
            shown: Some(definition.number.clone()),
            definition: Some(definition),
        },
        Selection::Substituted {
            requested,
            shown,
            definition,
        } => SelectionResponse {
            status: "substituted",
            requested,
            shown: Some(shown),
            definition: Some(definition),
        },
        Selection::Unavailable => SelectionResponse {
            status: "unavailable",
            requested: normalize_code(&params.selected),
            shown: None,
            definition: None,
        },
    };
    Ok(with_cache(&state, "public, max-age=86400", Json(response)))
}

async fn resolvable(
    State(state): State<AppState>,
    params: Result<Query<ResolvableQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let codes = parse_codes(&params.codes);
    let dict = lexicon(&state).await?;
    let resolver = Resolver::new(|family, key| dict.entry(family, key));
    let response = ResolvableResponse {
        codes: resolver
            .resolvable(codes.as_slice())
            .into_iter()
            .map(String::from)
            .collect(),
    };
    Ok(with_cache(&state, "public, max-age=86400", Json(response)))
}

/// Fetch the shared dictionaries, running the first load off the async
/// workers.
async fn lexicon(state: &AppState) -> Result<Arc<LexiconDictionary>, ApiError> {
    let cache = Arc::clone(&state.lexicon);
    let loaded = if cache.is_loaded() {
        cache.get()
    } else {
        tokio::task::spawn_blocking(move || cache.get())
            .await
            .map_err(|err| {
                error!("lexicon load task failed: {err}");
                ApiError::Internal
            })?
    };
    loaded.map_err(|err| {
        error!("lexicon unavailable: {err:#}");
        ApiError::LexiconUnavailable(format!("{err:#}"))
    })
}

fn check_text_len(state: &AppState, text: &str) -> Result<(), ApiError> {
    if text.len() > state.max_text_bytes {
        return Err(ApiError::bad_request(format!(
            "text must be at most {} bytes",
            state.max_text_bytes
        )));
    }
    Ok(())
}

/// Split a comma-separated code list, dropping blanks. Order is kept.
fn parse_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(String::from)
        .collect()
}

fn with_cache(state: &AppState, policy: &'static str, body: impl IntoResponse) -> Response {
    if state.disable_cache {
        return body.into_response();
    }
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static(policy))],
        body,
    )
        .into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("lexicon unavailable: {0}")]
    LexiconUnavailable(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::LexiconUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
