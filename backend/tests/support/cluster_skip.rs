//! Skip policy for suites that need an embedded PostgreSQL cluster.
//!
//! Set `SKIP_TEST_CLUSTER=1` where no cluster can be started. Without it a
//! setup failure fails the test so CI breakage stays visible.

/// Whether `SKIP_TEST_CLUSTER` holds a truthy value (`1`, `true`, `yes`).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Report a cluster setup failure: skip when allowed, panic otherwise.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("ledger test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
