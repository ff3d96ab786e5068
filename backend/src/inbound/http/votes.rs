//! Vote submission handler.
//!
//! ```text
//! POST /api/v1/vote
//! ```
//!
//! Accepts the vote form either URL-encoded or as JSON. Field validation
//! happens in the domain so both encodings report the same errors.

use actix_web::{Either, HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{VoteReceipt, VoteRequest, VoterCredentials};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::state::HttpState;

/// Vote count as submitted: a JSON number or the text of a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum VoteCount {
    Number(i64),
    Text(String),
}

impl VoteCount {
    /// Unparseable text counts as zero, which the domain rejects.
    fn value(&self) -> i64 {
        match self {
            Self::Number(count) => *count,
            Self::Text(text) => text.trim().parse().unwrap_or(0),
        }
    }
}

/// Vote form fields.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct VoteForm {
    pub name: String,
    pub address: String,
    pub mynumber: String,
    /// Candidate display name or numeric id.
    pub candidate: String,
    pub keyword: String,
    pub vote_count: Option<VoteCount>,
}

impl From<VoteForm> for VoteRequest {
    fn from(form: VoteForm) -> Self {
        Self {
            count: form.vote_count.as_ref().map_or(0, VoteCount::value),
            credentials: VoterCredentials {
                name: form.name,
                address: form.address,
                my_number: form.mynumber,
            },
            candidate: form.candidate,
            keyword: form.keyword,
        }
    }
}

/// Cast votes for a candidate.
#[utoipa::path(
    post,
    path = "/api/v1/vote",
    request_body(
        content = VoteForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Vote form; JSON bodies with the same fields are also accepted"
    ),
    responses(
        (status = 200, description = "Vote recorded", body = VoteReceipt),
        (status = 400, description = "Missing or invalid field", body = ErrorBody),
        (status = 401, description = "Voter details are incorrect", body = ErrorBody),
        (status = 404, description = "Unknown candidate", body = ErrorBody),
        (status = 409, description = "Vote quota exceeded", body = ErrorBody),
        (status = 503, description = "Ledger unavailable", body = ErrorBody)
    ),
    tags = ["votes"],
    operation_id = "castVote"
)]
#[post("/vote")]
pub async fn vote(
    state: web::Data<HttpState>,
    payload: Either<web::Json<VoteForm>, web::Form<VoteForm>>,
) -> ApiResult<HttpResponse> {
    let form = match payload {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };
    let receipt = state.votes.cast_vote(VoteRequest::from(form)).await?;
    Ok(HttpResponse::Ok().json(receipt))
}
