//! Test helpers for inbound HTTP components.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, web};

use crate::domain::ports::{MockElectionAdmin, MockElectionQuery, MockVoteCommand};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::configure;
use crate::outbound::page_cache::InMemoryPageCache;

/// Assemble an [`HttpState`] from mocks, defaulting to mocks without
/// expectations so unexpected port calls fail the test.
pub struct StateBuilder {
    votes: MockVoteCommand,
    results: MockElectionQuery,
    admin: MockElectionAdmin,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            votes: MockVoteCommand::new(),
            results: MockElectionQuery::new(),
            admin: MockElectionAdmin::new(),
        }
    }

    pub fn votes(mut self, votes: MockVoteCommand) -> Self {
        self.votes = votes;
        self
    }

    pub fn results(mut self, results: MockElectionQuery) -> Self {
        self.results = results;
        self
    }

    pub fn admin(mut self, admin: MockElectionAdmin) -> Self {
        self.admin = admin;
        self
    }

    pub fn build(self) -> HttpState {
        HttpState::new(
            Arc::new(self.votes),
            Arc::new(self.results),
            Arc::new(self.admin),
            Arc::new(InMemoryPageCache::new(Duration::from_secs(60))),
        )
    }
}

/// Application with every `/api/v1` handler mounted on `state`.
pub fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .service(web::scope("/api/v1").configure(configure))
}
