//! Embedded PostgreSQL bootstrap for the ledger integration tests.
//!
//! `pg-embed-setup-unpriv` installs binaries and data under `/var/tmp` by
//! default. When `PG_RUNTIME_DIR` or `PG_DATA_DIR` is unset, both are pointed
//! at a unique directory under the cargo target dir for the duration of the
//! bootstrap, so sandboxed runs can still start a cluster.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use pg_embedded_setup_unpriv::TestCluster;
use uuid::Uuid;

static BOOTSTRAP_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

fn scratch_dirs() -> std::io::Result<(PathBuf, PathBuf)> {
    let target = std::env::var_os("CARGO_TARGET_DIR").map_or_else(
        || PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("target"),
        PathBuf::from,
    );
    let base = target
        .join("pg-embed")
        .join(format!("ledger-{}-{}", std::process::id(), Uuid::new_v4()));
    let runtime_dir = base.join("install");
    let data_dir = base.join("data");
    std::fs::create_dir_all(&runtime_dir)?;
    std::fs::create_dir_all(&data_dir)?;
    Ok((runtime_dir, data_dir))
}

/// Binary downloads fail intermittently when suites run in parallel.
fn is_transient(error: &str) -> bool {
    let error = error.to_lowercase();
    ["connection reset", "timed out", "timeout", "error decoding response body", "dns error"]
        .iter()
        .any(|pattern| error.contains(pattern))
}

/// Start a cluster, retrying transient download failures.
pub fn test_cluster() -> Result<TestCluster, String> {
    let _bootstrap = BOOTSTRAP_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let needs_dirs =
        std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none();
    let _env = if needs_dirs {
        let (runtime_dir, data_dir) = scratch_dirs().map_err(|err| err.to_string())?;
        Some(env_lock::lock_env([
            ("PG_RUNTIME_DIR", Some(runtime_dir.to_string_lossy().into_owned())),
            ("PG_DATA_DIR", Some(data_dir.to_string_lossy().into_owned())),
        ]))
    } else {
        None
    };

    let mut last_error = String::new();
    for attempt in 1..=MAX_ATTEMPTS {
        match TestCluster::new() {
            Ok(cluster) => return Ok(cluster),
            Err(err) => last_error = format!("{err:?}"),
        }
        if attempt == MAX_ATTEMPTS || !is_transient(&last_error) {
            break;
        }
        std::thread::sleep(RETRY_DELAY * attempt);
    }
    Err(last_error)
}
