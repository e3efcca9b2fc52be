// src/core/models.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

use crate::core::error::ReconError;

// --- Defaults ---

/// Concurrency cap used when the caller does not pick one.
pub const DEFAULT_CONCURRENCY: usize = 10;
/// Per-probe TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Per-lookup DNS timeout.
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(3);

// --- Port Scanner Models ---

/// Options for a single TCP port scan run.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub target: String,
    pub ports: Vec<u16>,
    pub timeout: Duration,
    pub concurrency: usize,
}

impl ScanOptions {
    pub fn new(target: impl Into<String>, ports: Vec<u16>) -> Self {
        Self {
            target: target.into(),
            ports,
            timeout: DEFAULT_CONNECT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Checks the invariants that must hold before a scan starts.
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.target.trim().is_empty() {
            return Err(ReconError::config("scan target is empty"));
        }
        if self.ports.is_empty() {
            return Err(ReconError::config("no ports to scan"));
        }
        if self.concurrency == 0 {
            return Err(ReconError::config("concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// Liveness classification of a probed port. Filtered ports collapse to `Closed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
}

/// Outcome of probing one port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanResult {
    pub port: u16,
    pub state: PortState,
    pub service: String,
}

impl ScanResult {
    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

// --- Subdomain Enumeration Models ---

/// Options for one subdomain enumeration run.
#[derive(Debug, Clone)]
pub struct EnumOptions {
    pub domain: String,
    pub recursive: bool,
    pub max_depth: usize,
    pub concurrency: usize,
    pub shodan_key: Option<String>,
    pub virustotal_key: Option<String>,
    pub use_apis: bool,
    /// Emit non-resolving candidates as `Inactive` instead of dropping them.
    pub include_inactive: bool,
    pub dns_timeout: Duration,
}

impl Default for EnumOptions {
    fn default() -> Self {
        Self {
            domain: String::new(),
            recursive: false,
            max_depth: 1,
            concurrency: DEFAULT_CONCURRENCY,
            shodan_key: None,
            virustotal_key: None,
            use_apis: false,
            include_inactive: false,
            dns_timeout: DEFAULT_DNS_TIMEOUT,
        }
    }
}

impl EnumOptions {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    /// Validates the options before enumeration starts.
    ///
    /// A domain without a dot or a zero concurrency is fatal. A depth below 1
    /// is reported in the returned warnings and clamped to 1 so the run can
    /// still proceed.
    pub fn validate(mut self) -> Result<(Self, Vec<ReconError>), ReconError> {
        let mut warnings = Vec::new();

        let domain = self.domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if !domain.contains('.') || domain.starts_with('.') {
            return Err(ReconError::config(format!(
                "invalid domain format: {:?}",
                self.domain
            )));
        }
        self.domain = domain;

        if self.concurrency == 0 {
            return Err(ReconError::config("concurrency must be at least 1"));
        }

        if self.max_depth < 1 {
            warnings.push(ReconError::config("invalid depth value"));
            self.max_depth = 1;
        }

        Ok((self, warnings))
    }

    /// Depth actually walked by the enumerator.
    pub fn effective_depth(&self) -> usize {
        if self.recursive { self.max_depth.max(1) } else { 1 }
    }
}

/// Whether a candidate name resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubdomainStatus {
    Active,
    Inactive,
}

/// A resolved (or, on request, unresolved) subdomain candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubdomainResult {
    pub subdomain: String,
    pub ips: Vec<String>,
    pub status: SubdomainStatus,
}

impl SubdomainResult {
    pub fn active(subdomain: impl Into<String>, ips: Vec<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            ips,
            status: SubdomainStatus::Active,
        }
    }

    pub fn inactive(subdomain: impl Into<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            ips: Vec::new(),
            status: SubdomainStatus::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubdomainStatus::Active
    }
}

// --- DNS Record Models ---

/// Record types collected by the DNS record aggregator, in query order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DnsRecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Txt,
}

/// Record-type label (`A`, `AAAA`, ...) to the values returned for it.
/// A label is present only if its lookup succeeded.
pub type DnsRecords = BTreeMap<String, Vec<String>>;
