//! Cryptographic hash chain for audit integrity.

use crate::StorageError;
use dpdp_audit_types::AuditLogEntry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Previous-hash value of the first link.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A link in the hash chain, one per appended entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    /// Zero-based append position.
    pub sequence: u64,
    /// Hash of the serialized entry.
    pub entry_hash: String,
    /// Hash of the previous link.
    pub prev_hash: String,
    /// Combined hash (this link's hash).
    pub link_hash: String,
}

impl ChainLink {
    /// Create the link for `entry` following `previous` (or the genesis link).
    pub fn next(entry: &AuditLogEntry, previous: Option<&ChainLink>) -> Result<Self, StorageError> {
        let (sequence, prev_hash) = match previous {
            Some(prev) => (prev.sequence + 1, prev.link_hash.clone()),
            None => (0, GENESIS_HASH.to_string()),
        };
        let entry_hash = hash_entry(entry)?;
        let link_hash = compute_link_hash(&entry_hash, &prev_hash, sequence);

        Ok(Self {
            sequence,
            entry_hash,
            prev_hash,
            link_hash,
        })
    }

    /// Verify this link's own hash.
    pub fn verify(&self) -> bool {
        compute_link_hash(&self.entry_hash, &self.prev_hash, self.sequence) == self.link_hash
    }
}

/// Outcome of an integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Entries examined.
    pub entries_checked: u64,
    /// Sequence of the first entry whose link does not verify.
    pub first_broken: Option<u64>,
}

impl IntegrityReport {
    /// Whether every link verified.
    pub fn is_intact(&self) -> bool {
        self.first_broken.is_none()
    }

    /// Check stored entries against their stored links, both in append order.
    pub fn check(entries: &[AuditLogEntry], links: &[ChainLink]) -> Result<Self, StorageError> {
        if entries.len() != links.len() {
            return Ok(Self {
                entries_checked: entries.len().min(links.len()) as u64,
                first_broken: Some(entries.len().min(links.len()) as u64),
            });
        }

        let mut previous: Option<&ChainLink> = None;
        for (index, (entry, link)) in entries.iter().zip(links).enumerate() {
            let expected = ChainLink::next(entry, previous)?;
            if expected != *link || !link.verify() {
                return Ok(Self {
                    entries_checked: index as u64 + 1,
                    first_broken: Some(index as u64),
                });
            }
            previous = Some(link);
        }

        Ok(Self {
            entries_checked: entries.len() as u64,
            first_broken: None,
        })
    }
}

fn hash_entry(entry: &AuditLogEntry) -> Result<String, StorageError> {
    let bytes = serde_json::to_vec(entry)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn compute_link_hash(entry_hash: &str, prev_hash: &str, sequence: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(entry_hash.as_bytes());
    hasher.update(prev_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}
