//! Voters and the three-factor identity match.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ledger identifier of a voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterId(i32);

impl VoterId {
    /// Wrap a raw ledger identifier.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw ledger identifier.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity details supplied with a vote.
///
/// A voter is identified only when all three fields match the ledger.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCredentials {
    pub name: String,
    pub address: String,
    pub my_number: String,
}

// Keep identity details out of logs.
impl fmt::Debug for VoterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoterCredentials").finish_non_exhaustive()
    }
}

/// A registered voter and their quota state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voter {
    pub id: VoterId,
    pub name: String,
    pub address: String,
    pub my_number: String,
    /// Total votes the voter may ever cast.
    pub quota: u32,
    /// Votes already cast.
    pub used: u32,
}

impl Voter {
    /// Whether every credential field matches this voter.
    ///
    /// Callers must not report which field differed.
    pub fn matches(&self, credentials: &VoterCredentials) -> bool {
        self.my_number == credentials.my_number
            && self.name == credentials.name
            && self.address == credentials.address
    }

    /// Votes still available.
    pub fn remaining(&self) -> u32 {
        self.quota.saturating_sub(self.used)
    }

    /// Whether `requested` more votes fit within the quota.
    pub fn can_cast(&self, requested: u32) -> bool {
        u64::from(self.used) + u64::from(requested) <= u64::from(self.quota)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn voter() -> Voter {
        Voter {
            id: VoterId::new(7),
            name: "Hanako".to_owned(),
            address: "Tokyo".to_owned(),
            my_number: "1234".to_owned(),
            quota: 5,
            used: 3,
        }
    }

    fn credentials(name: &str, address: &str, my_number: &str) -> VoterCredentials {
        VoterCredentials {
            name: name.to_owned(),
            address: address.to_owned(),
            my_number: my_number.to_owned(),
        }
    }

    #[rstest]
    fn matches_requires_all_three_fields(voter: Voter) {
        assert!(voter.matches(&credentials("Hanako", "Tokyo", "1234")));
        assert!(!voter.matches(&credentials("Taro", "Tokyo", "1234")));
        assert!(!voter.matches(&credentials("Hanako", "Osaka", "1234")));
        assert!(!voter.matches(&credentials("Hanako", "Tokyo", "9999")));
    }

    #[rstest]
    #[case(2, true)]
    #[case(3, false)]
    #[case(u32::MAX, false)]
    fn can_cast_respects_quota(voter: Voter, #[case] requested: u32, #[case] expected: bool) {
        assert_eq!(voter.can_cast(requested), expected);
    }

    #[rstest]
    fn remaining_never_underflows(mut voter: Voter) {
        voter.used = 9;
        assert_eq!(voter.remaining(), 0);
    }

    #[rstest]
    fn credentials_debug_redacts_fields() {
        let rendered = format!("{:?}", credentials("Hanako", "Tokyo", "1234"));
        assert!(!rendered.contains("Hanako"));
        assert!(!rendered.contains("1234"));
    }
}
