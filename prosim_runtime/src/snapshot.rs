//! Snapshot layer: deterministic in-memory company snapshots.
//!
//! A snapshot holds the canonical JSON of a company plus its SHA-256.
//! Restoring checks the hash, the engine version and the structural
//! invariants before handing the company back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use prosim_engine::hashing::{canonical_serialize_company, sha256_hex};
use prosim_engine::invariants::try_validate_company;
use prosim_engine::{Company, ENGINE_VERSION};

use crate::error::{RuntimeError, RuntimeResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Last completed week at snapshot time.
    pub week: u32,
    /// Canonical JSON of the company (UTF-8).
    pub canonical_json: String,
    /// SHA-256 of `canonical_json`.
    pub hash: String,
    pub engine_version: u32,
}

pub fn take_snapshot(company: &Company) -> RuntimeResult<Snapshot> {
    let bytes = canonical_serialize_company(company)?;
    let hash = sha256_hex(&bytes);
    let canonical_json = String::from_utf8(bytes).map_err(|e| RuntimeError::Snapshot(e.to_string()))?;
    Ok(Snapshot {
        week: company.current_week(),
        canonical_json,
        hash,
        engine_version: ENGINE_VERSION,
    })
}

/// True if the hash matches the canonical JSON content.
pub fn verify_snapshot_hash(snap: &Snapshot) -> bool {
    sha256_hex(snap.canonical_json.as_bytes()) == snap.hash
}

pub fn restore_snapshot(snap: &Snapshot) -> RuntimeResult<Company> {
    if snap.engine_version != ENGINE_VERSION {
        return Err(RuntimeError::Snapshot(format!(
            "taken by engine version {}, running {}",
            snap.engine_version, ENGINE_VERSION
        )));
    }
    if !verify_snapshot_hash(snap) {
        return Err(RuntimeError::Snapshot(format!("week {}: hash mismatch", snap.week)));
    }

    let mut envelope: Value =
        serde_json::from_str(&snap.canonical_json).map_err(|e| RuntimeError::Snapshot(e.to_string()))?;
    let body = envelope
        .get_mut("body")
        .map(Value::take)
        .ok_or_else(|| RuntimeError::Snapshot("missing body".to_string()))?;
    let company: Company = serde_json::from_value(body).map_err(|e| RuntimeError::Snapshot(e.to_string()))?;

    if company.current_week() != snap.week {
        return Err(RuntimeError::Snapshot(format!(
            "labelled week {} but holds week {}",
            snap.week,
            company.current_week()
        )));
    }
    try_validate_company(&company)?;
    Ok(company)
}

/// Snapshots keyed by week, taken every `interval` weeks.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    interval: u32,
    snapshots: BTreeMap<u32, Snapshot>,
}

impl SnapshotStore {
    /// `interval = 0` disables automatic snapshots.
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            snapshots: BTreeMap::new(),
        }
    }

    pub fn is_due(&self, week: u32) -> bool {
        self.interval > 0 && week % self.interval == 0
    }

    pub fn insert(&mut self, snap: Snapshot) {
        self.snapshots.insert(snap.week, snap);
    }

    pub fn get(&self, week: u32) -> Option<&Snapshot> {
        self.snapshots.get(&week)
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
