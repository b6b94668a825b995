//! License gate.
//!
//! The oracle is an external authority consulted once per startup; the
//! ledger treats its verdict purely as allow/deny and never persists or
//! reasons about it beyond that. Unreachability is a distinct, retryable
//! condition — never conflated with an invalid key.

use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Verdict returned by a license oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LicenseStatus {
    Active,
    Suspended,
    /// Key is hardware-bound, and bound to this installation.
    BoundToThisMachine,
    /// Key is hardware-bound to a different installation.
    BoundElsewhere,
    Invalid,
}

impl LicenseStatus {
    pub fn allows_access(&self) -> bool {
        matches!(self, LicenseStatus::Active | LicenseStatus::BoundToThisMachine)
    }
}

/// External license authority.
pub trait LicenseOracle {
    /// Check a key. `Err(LedgerError::Network)` means the authority was
    /// unreachable or timed out, not that the key is bad.
    fn check(&self, key: &str) -> Result<LicenseStatus>;
}

/// Map a remote status value onto a verdict.
///
/// The remote map holds `"ACTIVE"`, `"SUSPENDED"`, or a machine id the key
/// is bound to; a missing key or an explicit `"INVALID"` both reject.
fn classify(remote: Option<&str>, machine_id: &str) -> LicenseStatus {
    match remote {
        Some("ACTIVE") => LicenseStatus::Active,
        Some("SUSPENDED") => LicenseStatus::Suspended,
        Some("INVALID") | None => LicenseStatus::Invalid,
        Some(bound) if bound == machine_id => LicenseStatus::BoundToThisMachine,
        Some(_) => LicenseStatus::BoundElsewhere,
    }
}

/// HTTP-backed oracle fetching a JSON key→status map.
pub struct HttpLicenseOracle {
    endpoint: String,
    machine_id: String,
    client: reqwest::blocking::Client,
}

impl HttpLicenseOracle {
    /// The one timeout-bounded call in the system.
    pub const TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(endpoint: impl Into<String>, machine_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Network(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            machine_id: machine_id.into(),
            client,
        })
    }
}

impl LicenseOracle for HttpLicenseOracle {
    fn check(&self, key: &str) -> Result<LicenseStatus> {
        use rand::Rng;

        // Cache-busting query: the endpoint sits behind an aggressive CDN.
        let url = format!(
            "{}?v={}",
            self.endpoint,
            rand::thread_rng().gen_range(1u32..1_000_000)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LedgerError::Network(format!(
                "license endpoint returned {}",
                response.status()
            )));
        }

        let statuses: HashMap<String, String> = response
            .json()
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        Ok(classify(
            statuses.get(key).map(String::as_str),
            &self.machine_id,
        ))
    }
}
