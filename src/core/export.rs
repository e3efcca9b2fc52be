// src/core/export.rs

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::ReconError;
use crate::core::models::{DnsRecords, ScanResult, SubdomainResult, SubdomainStatus};

/// One subdomain entry of the export document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubdomainExport {
    pub name: String,
    pub ips: Vec<String>,
    pub status: SubdomainStatus,
}

impl From<&SubdomainResult> for SubdomainExport {
    fn from(result: &SubdomainResult) -> Self {
        Self {
            name: result.subdomain.clone(),
            ips: result.ips.clone(),
            status: result.status,
        }
    }
}

/// JSON document written by `--output`. Empty collections are left out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportReport {
    pub target: String,
    /// RFC3339 time the run started.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subdomains: Vec<SubdomainExport>,
    #[serde(default, skip_serializing_if = "DnsRecords::is_empty")]
    pub dns_records: DnsRecords,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ScanResult>,
}

impl ExportReport {
    pub fn new(target: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            target: target.into(),
            timestamp: started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            subdomains: Vec::new(),
            dns_records: DnsRecords::new(),
            ports: Vec::new(),
        }
    }

    pub fn with_subdomains<'a>(mut self, results: impl IntoIterator<Item = &'a SubdomainResult>) -> Self {
        self.subdomains = results.into_iter().map(SubdomainExport::from).collect();
        self
    }

    pub fn with_dns_records(mut self, records: DnsRecords) -> Self {
        self.dns_records = records;
        self
    }

    pub fn with_ports(mut self, ports: Vec<ScanResult>) -> Self {
        self.ports = ports;
        self
    }

    pub fn to_json(&self) -> Result<String, ReconError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReconError::export("failed to serialize results", e))
    }

    pub fn from_json(json: &str) -> Result<Self, ReconError> {
        serde_json::from_str(json).map_err(|e| ReconError::export("failed to parse results", e))
    }

    /// Writes the report as indented JSON to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), ReconError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| {
            ReconError::export(format!("failed to write {}", path.display()), e)
        })?;
        info!(path = %path.display(), "Results exported.");
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, ReconError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ReconError::export(format!("failed to read {}", path.display()), e))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::PortState;
    use chrono::TimeZone;

    fn started_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let report = ExportReport::new("example.com", started_at());
        assert_eq!(report.timestamp, "2026-10-19T08:30:00Z");
        assert!(DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[test]
    fn empty_collections_are_omitted() {
        let json = ExportReport::new("example.com", started_at()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 2);
        assert!(object.contains_key("target"));
        assert!(object.contains_key("timestamp"));
    }

    #[test]
    fn field_names_follow_the_document_layout() {
        let results = [SubdomainResult::active("www.example.com", vec!["10.0.0.1".into()])];
        let json = ExportReport::new("example.com", started_at())
            .with_subdomains(&results)
            .with_dns_records(DnsRecords::from([("NS".to_string(), vec!["ns1.example.com.".to_string()])]))
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["subdomains"][0]["name"], "www.example.com");
        assert_eq!(value["subdomains"][0]["ips"][0], "10.0.0.1");
        assert_eq!(value["subdomains"][0]["status"], "active");
        assert_eq!(value["dns_records"]["NS"][0], "ns1.example.com.");
        assert!(json.contains("\n  \"target\""), "two-space indentation");
    }

    #[test]
    fn file_round_trip_preserves_every_field() {
        let results = [
            SubdomainResult::active("www.example.com", vec!["10.0.0.1".into(), "10.0.0.2".into()]),
            SubdomainResult::inactive("old.example.com"),
        ];
        let report = ExportReport::new("example.com", started_at())
            .with_subdomains(&results)
            .with_dns_records(DnsRecords::from([("A".to_string(), vec!["10.0.0.1".to_string()])]))
            .with_ports(vec![ScanResult {
                port: 443,
                state: PortState::Open,
                service: "HTTPS".into(),
            }]);

        let file = tempfile::NamedTempFile::new().unwrap();
        report.write_to(file.path()).unwrap();
        let restored = ExportReport::read_from(file.path()).unwrap();

        assert_eq!(restored, report);
    }

    #[test]
    fn garbage_is_an_export_error() {
        let err = ExportReport::from_json("{ not json").unwrap_err();
        assert_eq!(err.kind(), crate::core::error::ErrorKind::Export);
    }
}
