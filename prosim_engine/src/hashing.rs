/// Prosim Engine - Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing of reports and
/// companies.
///
/// Rules:
///   - engine_version first, then a kind tag, then the body
///   - body fields in declaration order (serde_json preserve_order)
///   - every collection in the body is a Vec in engine order, never a map
///   - compact UTF-8 JSON, no whitespace

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::Company;
use crate::error::{SimError, SimResult};
use crate::report::WeeklyReport;
use crate::ENGINE_VERSION;

fn canonical_envelope<T: Serialize>(kind: &str, body: &T) -> SimResult<Value> {
    let body = serde_json::to_value(body)
        .map_err(|e| SimError::consistency("canonical_serialization", e.to_string()))?;
    let mut map = Map::new();
    map.insert("engine_version".to_string(), Value::from(ENGINE_VERSION));
    map.insert("kind".to_string(), Value::String(kind.to_string()));
    map.insert("body".to_string(), body);
    Ok(Value::Object(map))
}

fn to_bytes(value: &Value) -> SimResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SimError::consistency("canonical_serialization", e.to_string()))
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}

pub fn canonical_serialize_report(report: &WeeklyReport) -> SimResult<Vec<u8>> {
    to_bytes(&canonical_envelope("weekly_report", report)?)
}

pub fn canonical_serialize_company(company: &Company) -> SimResult<Vec<u8>> {
    to_bytes(&canonical_envelope("company", company)?)
}

/// Hash of one weekly report. Equal inputs and seed give equal hashes.
pub fn canonical_report_hash(report: &WeeklyReport) -> SimResult<String> {
    Ok(sha256_hex(&canonical_serialize_report(report)?))
}

/// Hash of a whole company, including its hidden demand.
pub fn canonical_company_hash(company: &Company) -> SimResult<String> {
    Ok(sha256_hex(&canonical_serialize_company(company)?))
}
