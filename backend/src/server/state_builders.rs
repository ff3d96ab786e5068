//! Builders wiring domain services onto the HTTP state.

use std::sync::Arc;

use election::domain::ports::{AggregateStore, PageCache, VoteLedger, VoteMetrics};
use election::domain::{
    CandidateRegistry, ElectionAdminService, ElectionQueryService, TallyGate, VoteService,
};
use election::inbound::http::state::HttpState;

/// Build the driving ports over one ledger and one aggregate store.
///
/// All three services share a single candidate registry so a reset or
/// rebuild is visible to votes and queries as soon as it is published, and
/// one tally gate so admin rewrites never interleave with ballots.
pub(crate) fn build_http_state<L, A>(
    ledger: Arc<L>,
    aggregates: Arc<A>,
    page_cache: Arc<dyn PageCache>,
    metrics: Arc<dyn VoteMetrics>,
) -> HttpState
where
    L: VoteLedger + 'static,
    A: AggregateStore + 'static,
{
    let registry = Arc::new(CandidateRegistry::new());
    let gate = Arc::new(TallyGate::new());
    let votes = VoteService::new(
        Arc::clone(&ledger),
        Arc::clone(&aggregates),
        Arc::clone(&registry),
        Arc::clone(&page_cache),
        metrics,
        Arc::clone(&gate),
    );
    let results = ElectionQueryService::new(Arc::clone(&aggregates), Arc::clone(&registry));
    let admin = ElectionAdminService::new(
        ledger,
        aggregates,
        registry,
        Arc::clone(&page_cache),
        gate,
    );

    HttpState::new(
        Arc::new(votes),
        Arc::new(results),
        Arc::new(admin),
        page_cache,
    )
}
