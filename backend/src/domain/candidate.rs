//! Candidates and the process-wide candidate directory.
//!
//! The directory is read by every vote and every result query, and is
//! rebuilt from the ledger by an administrative reset. [`CandidateRegistry`]
//! publishes a fully built [`CandidateDirectory`] in one pointer swap so
//! readers never observe a half-populated table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ledger identifier of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(i32);

impl CandidateId {
    /// Wrap a raw ledger identifier.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw ledger identifier.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Candidate sex as recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Ledger representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "男",
            Self::Female => "女",
        }
    }
}

/// Error returned when a ledger sex value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised candidate sex: {0}")]
pub struct ParseSexError(String);

impl FromStr for Sex {
    type Err = ParseSexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "男" | "male" | "m" => Ok(Self::Male),
            "女" | "female" | "f" => Ok(Self::Female),
            other => Err(ParseSexError(other.to_owned())),
        }
    }
}

/// Static candidate metadata loaded from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub political_party: String,
    pub sex: Sex,
}

/// Immutable lookup tables over one generation of candidates.
#[derive(Debug, Default, Clone)]
pub struct CandidateDirectory {
    ordered: Vec<Candidate>,
    by_id: HashMap<CandidateId, usize>,
    by_name: HashMap<String, usize>,
    by_party: BTreeMap<String, Vec<usize>>,
}

impl CandidateDirectory {
    /// Build every lookup table from the supplied candidates.
    ///
    /// Candidates are kept in ledger id order. A later duplicate name
    /// shadows an earlier one, matching a plain map insert.
    pub fn new(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by_key(|candidate| candidate.id);
        let mut by_id = HashMap::with_capacity(candidates.len());
        let mut by_name = HashMap::with_capacity(candidates.len());
        let mut by_party: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (index, candidate) in candidates.iter().enumerate() {
            by_id.insert(candidate.id, index);
            by_name.insert(candidate.name.clone(), index);
            by_party
                .entry(candidate.political_party.clone())
                .or_default()
                .push(index);
        }

        Self {
            ordered: candidates,
            by_id,
            by_name,
            by_party,
        }
    }

    /// All candidates in id order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.ordered
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether the directory has been populated.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Look up a candidate by ledger id.
    pub fn by_id(&self, id: CandidateId) -> Option<&Candidate> {
        self.by_id.get(&id).and_then(|index| self.ordered.get(*index))
    }

    /// Look up a candidate by display name.
    pub fn by_name(&self, name: &str) -> Option<&Candidate> {
        self.by_name
            .get(name)
            .and_then(|index| self.ordered.get(*index))
    }

    /// Resolve a voting form value: a display name first, then a numeric id.
    pub fn resolve(&self, name_or_id: &str) -> Option<&Candidate> {
        let trimmed = name_or_id.trim();
        self.by_name(trimmed).or_else(|| {
            trimmed
                .parse::<i32>()
                .ok()
                .and_then(|raw| self.by_id(CandidateId::new(raw)))
        })
    }

    /// Candidates belonging to a party, in id order.
    pub fn by_party(&self, party: &str) -> Vec<&Candidate> {
        self.by_party
            .get(party)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|index| self.ordered.get(*index))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Distinct party names in lexical order.
    pub fn parties(&self) -> impl Iterator<Item = &str> {
        self.by_party.keys().map(String::as_str)
    }
}

/// Process-wide, read-mostly handle to the current [`CandidateDirectory`].
///
/// The lock guards only the pointer: readers clone the `Arc` and release it
/// immediately, so no lock is held across store I/O.
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    current: RwLock<Arc<CandidateDirectory>>,
}

impl CandidateRegistry {
    /// Create a registry publishing an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry already holding the supplied directory.
    pub fn with_directory(directory: CandidateDirectory) -> Self {
        Self {
            current: RwLock::new(Arc::new(directory)),
        }
    }

    /// Snapshot of the directory currently published.
    pub fn snapshot(&self) -> Arc<CandidateDirectory> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Atomically replace the published directory.
    pub fn publish(&self, directory: CandidateDirectory) {
        let next = Arc::new(directory);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }
}
