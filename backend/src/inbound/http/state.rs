//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{ElectionAdmin, ElectionQuery, PageCache, VoteCommand};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub votes: Arc<dyn VoteCommand>,
    pub results: Arc<dyn ElectionQuery>,
    pub admin: Arc<dyn ElectionAdmin>,
    pub page_cache: Arc<dyn PageCache>,
}

impl HttpState {
    /// Bundle the driving ports and the page cache.
    pub fn new(
        votes: Arc<dyn VoteCommand>,
        results: Arc<dyn ElectionQuery>,
        admin: Arc<dyn ElectionAdmin>,
        page_cache: Arc<dyn PageCache>,
    ) -> Self {
        Self {
            votes,
            results,
            admin,
            page_cache,
        }
    }
}
