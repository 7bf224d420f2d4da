//! Shard group routing.
//!
//! # Responsibilities
//! - Hold the two-level destination set (shard groups of alternate URLs)
//! - Pick one endpoint per group from a reference check id
//!
//! # Design Decisions
//! - Selection is `check_id mod group_len`, so it is deterministic
//! - Every group receives the write; groups are independent replicas

use url::Url;

use crate::store::StoreError;

/// Shard groups of full write URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardGroups {
    groups: Vec<Vec<String>>,
}

impl ShardGroups {
    /// Build from base URLs, appending `write_path` to each.
    pub fn new(base_urls: &[Vec<String>], write_path: &str) -> Result<Self, StoreError> {
        let mut groups = Vec::with_capacity(base_urls.len());
        for group in base_urls {
            if group.is_empty() {
                continue;
            }
            let mut urls = Vec::with_capacity(group.len());
            for base in group {
                Url::parse(base).map_err(|_| StoreError::InvalidUrl(base.clone()))?;
                urls.push(format!("{}{}", base.trim_end_matches('/'), write_path));
            }
            groups.push(urls);
        }
        Ok(Self { groups })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// One URL per shard group for `reference_check_id`.
    pub fn targets(&self, reference_check_id: i64) -> Vec<&str> {
        self.groups
            .iter()
            .map(|urls| urls[shard_index(reference_check_id, urls.len())].as_str())
            .collect()
    }
}

/// Endpoint index within a group of `group_len` endpoints.
///
/// Negative ids wrap instead of producing an out-of-range index.
pub fn shard_index(check_id: i64, group_len: usize) -> usize {
    if group_len == 0 {
        return 0;
    }
    check_id.rem_euclid(group_len as i64) as usize
}
