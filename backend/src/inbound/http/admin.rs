//! Administrative handlers.
//!
//! ```text
//! POST /api/v1/initialize
//! POST /api/v1/admin/rebuild
//! GET  /api/v1/admin/audit
//! ```
//!
//! Reset, rebuild, and audit wait for in-flight votes and block new ones
//! until they finish; the admin service enforces this.

use actix_web::{HttpResponse, get, post, web};

use crate::domain::TallyDrift;
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::state::HttpState;

/// Clear every vote and reload the candidate directory.
#[utoipa::path(
    post,
    path = "/api/v1/initialize",
    responses(
        (status = 200, description = "Election reset", body = String),
        (status = 503, description = "A backing store is unavailable", body = ErrorBody)
    ),
    tags = ["admin"],
    operation_id = "initialize"
)]
#[post("/initialize")]
pub async fn initialize(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    state.admin.reset().await?;
    Ok(HttpResponse::Ok().content_type("text/plain").body("Finish"))
}

/// Recompute every aggregate from the ledger.
#[utoipa::path(
    post,
    path = "/api/v1/admin/rebuild",
    responses(
        (status = 204, description = "Aggregates rebuilt"),
        (status = 503, description = "A backing store is unavailable", body = ErrorBody)
    ),
    tags = ["admin"],
    operation_id = "rebuildAggregates"
)]
#[post("/admin/rebuild")]
pub async fn rebuild(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    state.admin.rebuild_aggregates().await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Candidates whose ledger and aggregate tallies disagree.
#[utoipa::path(
    get,
    path = "/api/v1/admin/audit",
    responses(
        (status = 200, description = "Drifted candidates; empty when consistent", body = [TallyDrift]),
        (status = 503, description = "A backing store is unavailable", body = ErrorBody)
    ),
    tags = ["admin"],
    operation_id = "auditTallies"
)]
#[get("/admin/audit")]
pub async fn audit(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let drift = state.admin.audit().await?;
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "no-store"))
        .json(drift))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockElectionAdmin;
    use crate::domain::{CandidateId, ElectionError};
    use crate::inbound::http::test_utils::{StateBuilder, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::Value;

    #[actix_web::test]
    async fn initialize_resets_the_election() {
        let mut admin = MockElectionAdmin::new();
        admin.expect_reset().times(1).return_once(|| Ok(()));
        let app = actix_test::init_service(test_app(StateBuilder::new().admin(admin).build()))
            .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/initialize")
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        assert_eq!(body.as_ref(), b"Finish");
    }

    #[actix_web::test]
    async fn rebuild_failure_is_unavailable() {
        let mut admin = MockElectionAdmin::new();
        admin
            .expect_rebuild_aggregates()
            .return_once(|| Err(ElectionError::store_unavailable("aggregate store: down")));
        let app = actix_test::init_service(test_app(StateBuilder::new().admin(admin).build()))
            .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/admin/rebuild")
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn audit_lists_drift() {
        let mut admin = MockElectionAdmin::new();
        admin.expect_audit().return_once(|| {
            Ok(vec![TallyDrift {
                candidate_id: CandidateId::new(2),
                record_votes: 5,
                counter_votes: 5,
                aggregate_votes: 3,
            }])
        });
        let app = actix_test::init_service(test_app(StateBuilder::new().admin(admin).build()))
            .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/admin/audit")
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body[0]["candidateId"], Value::from(2));
        assert_eq!(body[0]["aggregateVotes"], Value::from(3));
    }
}
