//! OpenAPI documentation for the election API.
//!
//! [`ApiDoc`] registers every handler in `inbound::http` together with the
//! read models and the error envelope. Export it with
//! `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::domain::{
    CandidateDetail, CandidateStanding, ElectionSummary, ErrorCode, KeywordScore, Leaderboard,
    PartyDetail, PartyStanding, Sex, SexRatio, TallyDrift, VoteReceipt,
};
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::votes::{VoteCount, VoteForm};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Election API",
        description = "Vote submission, live results, and tally maintenance."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::results::results,
        crate::inbound::http::results::candidate,
        crate::inbound::http::results::political_party,
        crate::inbound::http::votes::vote,
        crate::inbound::http::admin::initialize,
        crate::inbound::http::admin::rebuild,
        crate::inbound::http::admin::audit,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ElectionSummary,
        Leaderboard,
        CandidateStanding,
        PartyStanding,
        SexRatio,
        Sex,
        CandidateDetail,
        PartyDetail,
        KeywordScore,
        TallyDrift,
        VoteForm,
        VoteCount,
        VoteReceipt,
        ErrorBody,
        ErrorCode
    )),
    tags(
        (name = "results", description = "Live standings served from the aggregate store"),
        (name = "votes", description = "Vote submission"),
        (name = "admin", description = "Reset, rebuild, and audit"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
