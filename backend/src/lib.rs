//! Election vote tallying service.
//!
//! Votes are written to a PostgreSQL ledger, the source of truth, and then
//! folded into ranked aggregates that serve the live results pages.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
