//! HTTP inbound adapter exposing the voting and results endpoints.

pub mod admin;
pub mod error;
pub mod health;
pub mod results;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod votes;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on a service config.
///
/// ```ignore
/// App::new().service(web::scope("/api/v1").configure(election::inbound::http::configure))
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(results::results)
        .service(results::candidate)
        .service(results::political_party)
        .service(votes::vote)
        .service(admin::initialize)
        .service(admin::rebuild)
        .service(admin::audit);
}
