//! Chain configuration and fork compatibility.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fork schedule of a chain. `None` means the fork is not scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub homestead_block: Option<u64>,
    pub eip150_block: Option<u64>,
    pub eip155_block: Option<u64>,
    pub eip158_block: Option<u64>,
    pub byzantium_block: Option<u64>,
    pub constantinople_block: Option<u64>,
}

impl ChainConfig {
    /// Mainnet fork schedule.
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            homestead_block: Some(1_150_000),
            eip150_block: Some(2_463_000),
            eip155_block: Some(2_675_000),
            eip158_block: Some(2_675_000),
            byzantium_block: Some(4_370_000),
            constantinople_block: Some(7_280_000),
        }
    }

    /// Development chain with every fork active from genesis.
    pub fn dev() -> Self {
        Self {
            chain_id: 1337,
            homestead_block: Some(0),
            eip150_block: Some(0),
            eip155_block: Some(0),
            eip158_block: Some(0),
            byzantium_block: Some(0),
            constantinople_block: Some(0),
        }
    }

    fn forks(&self) -> [(&'static str, Option<u64>); 6] {
        [
            ("Homestead fork block", self.homestead_block),
            ("EIP150 fork block", self.eip150_block),
            ("EIP155 fork block", self.eip155_block),
            ("EIP158 fork block", self.eip158_block),
            ("Byzantium fork block", self.byzantium_block),
            ("Constantinople fork block", self.constantinople_block),
        ]
    }

    /// Check whether `new` can replace `self` for a chain whose head is at
    /// `head`. A fork that either config has already activated must not move.
    pub fn check_compatible(&self, new: &ChainConfig, head: u64) -> Option<ConfigCompatError> {
        for ((what, stored), (_, proposed)) in self.forks().into_iter().zip(new.forks()) {
            if is_fork_incompatible(stored, proposed, head) {
                return Some(ConfigCompatError::new(what, stored, proposed));
            }
        }

        let eip155_active = is_forked(self.eip155_block, head) || is_forked(new.eip155_block, head);
        if eip155_active && self.chain_id != new.chain_id {
            return Some(ConfigCompatError::new(
                "EIP155 chain ID",
                self.eip155_block,
                new.eip155_block,
            ));
        }

        None
    }
}

fn is_forked(fork: Option<u64>, head: u64) -> bool {
    fork.is_some_and(|block| block <= head)
}

fn is_fork_incompatible(stored: Option<u64>, new: Option<u64>, head: u64) -> bool {
    (is_forked(stored, head) || is_forked(new, head)) && stored != new
}

/// A stored chain config differs from the requested one in a way that
/// would require rewinding the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCompatError {
    pub what: &'static str,
    pub stored: Option<u64>,
    pub new: Option<u64>,
    /// Block the chain would have to rewind to for the new config to apply.
    pub rewind_to: u64,
}

impl ConfigCompatError {
    fn new(what: &'static str, stored: Option<u64>, new: Option<u64>) -> Self {
        let rewind_to = match (stored, new) {
            (Some(s), Some(n)) => s.min(n),
            (Some(b), None) | (None, Some(b)) => b,
            (None, None) => 0,
        }
        .saturating_sub(1);

        Self {
            what,
            stored,
            new,
            rewind_to,
        }
    }
}

impl fmt::Display for ConfigCompatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |b: Option<u64>| b.map_or_else(|| "nil".to_string(), |b| b.to_string());
        write!(
            f,
            "mismatching {} in database (have {}, want {}, rewindto {})",
            self.what,
            show(self.stored),
            show(self.new),
            self.rewind_to
        )
    }
}

impl std::error::Error for ConfigCompatError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_configs_are_compatible() {
        let cfg = ChainConfig::mainnet();
        assert_eq!(cfg.check_compatible(&ChainConfig::mainnet(), 10_000_000), None);
    }

    #[test]
    fn test_future_fork_change_is_compatible() {
        let stored = ChainConfig::mainnet();
        let mut new = ChainConfig::mainnet();
        new.constantinople_block = Some(8_000_000);

        assert_eq!(stored.check_compatible(&new, 5_000_000), None);
    }

    #[test]
    fn test_passed_fork_change_is_incompatible() {
        let stored = ChainConfig::mainnet();
        let mut new = ChainConfig::mainnet();
        new.homestead_block = Some(1_000_000);

        let err = stored.check_compatible(&new, 1_200_000).unwrap();
        assert_eq!(err.what, "Homestead fork block");
        assert_eq!(err.rewind_to, 999_999);
    }

    #[test]
    fn test_chain_id_change_after_eip155() {
        let stored = ChainConfig::dev();
        let mut new = ChainConfig::dev();
        new.chain_id = 7;

        let err = stored.check_compatible(&new, 0).unwrap();
        assert_eq!(err.what, "EIP155 chain ID");
    }
}
