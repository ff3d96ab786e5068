//! Result read handlers.
//!
//! ```text
//! GET /api/v1/results
//! GET /api/v1/candidates/{id}
//! GET /api/v1/political_parties/{name}
//! ```
//!
//! Rendered bodies are kept in the page cache under the request path until
//! the next vote or reset flushes it.

use std::future::Future;

use actix_web::{HttpRequest, HttpResponse, get, http::header, web};
use serde::Serialize;

use crate::domain::{
    CandidateDetail, CandidateId, ElectionError, ElectionSummary, PartyDetail,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::state::HttpState;

fn json_body(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .body(body)
}

/// Serve `key` from the page cache, rendering it with `load` on a miss.
async fn cached<T, F, Fut>(state: &HttpState, key: &str, load: F) -> ApiResult<HttpResponse>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ElectionError>>,
{
    if let Some(body) = state.page_cache.get(key) {
        return Ok(json_body(body));
    }

    let value = load().await?;
    let body = serde_json::to_string(&value)
        .map_err(|err| ElectionError::query_failed(format!("render {key}: {err}")))?;
    state.page_cache.put(key, body.clone());
    Ok(json_body(body))
}

/// Leaderboard, party standings, and the demographic split.
#[utoipa::path(
    get,
    path = "/api/v1/results",
    responses(
        (status = 200, description = "Election results", body = ElectionSummary),
        (status = 503, description = "Aggregate store unavailable", body = ErrorBody)
    ),
    tags = ["results"],
    operation_id = "getResults"
)]
#[get("/results")]
pub async fn results(req: HttpRequest, state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let query = state.results.clone();
    cached(&state, req.path(), || async move { query.summary().await }).await
}

/// Candidate detail with top keywords.
#[utoipa::path(
    get,
    path = "/api/v1/candidates/{id}",
    params(("id" = i32, Path, description = "Candidate identifier")),
    responses(
        (status = 200, description = "Candidate detail", body = CandidateDetail),
        (status = 404, description = "Unknown candidate", body = ErrorBody),
        (status = 503, description = "Aggregate store unavailable", body = ErrorBody)
    ),
    tags = ["results"],
    operation_id = "getCandidate"
)]
#[get("/candidates/{id}")]
pub async fn candidate(
    req: HttpRequest,
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = CandidateId::new(path.into_inner());
    let query = state.results.clone();
    cached(&state, req.path(), || async move {
        query.candidate_detail(id).await
    })
    .await
}

/// Party total, top keywords, and member candidates.
#[utoipa::path(
    get,
    path = "/api/v1/political_parties/{name}",
    params(("name" = String, Path, description = "Political party name")),
    responses(
        (status = 200, description = "Party detail", body = PartyDetail),
        (status = 404, description = "Unknown party", body = ErrorBody),
        (status = 503, description = "Aggregate store unavailable", body = ErrorBody)
    ),
    tags = ["results"],
    operation_id = "getPoliticalParty"
)]
#[get("/political_parties/{name}")]
pub async fn political_party(
    req: HttpRequest,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let party = path.into_inner();
    let query = state.results.clone();
    cached(&state, req.path(), || async move {
        query.party_detail(&party).await
    })
    .await
}
