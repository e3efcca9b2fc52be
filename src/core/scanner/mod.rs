// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module.
// It declares the probe executors and wires them into full runs.
pub mod dns_scanner;
pub mod passive_scanner;
pub mod subdomain_scanner;
pub mod tcp_scanner;

use tracing::info;

use crate::core::cancel::CancelToken;
use crate::core::error::ReconError;
use crate::core::models::{DnsRecords, ScanResult, SubdomainResult};
use self::subdomain_scanner::SubdomainEnumerator;
use self::tcp_scanner::PortScanner;

/// Everything a port scan run produced.
#[derive(Debug, Default)]
pub struct PortScanReport {
    pub results: Vec<ScanResult>,
}

impl PortScanReport {
    pub fn open_ports(&self) -> impl Iterator<Item = &ScanResult> {
        self.results.iter().filter(|r| r.is_open())
    }
}

/// Everything an enumeration run produced, including the errors collected
/// along the way.
#[derive(Debug, Default)]
pub struct EnumerationReport {
    pub subdomains: Vec<SubdomainResult>,
    pub dns_records: DnsRecords,
    pub errors: Vec<ReconError>,
}

impl EnumerationReport {
    pub fn active_count(&self) -> usize {
        self.subdomains.iter().filter(|s| s.is_active()).count()
    }
}

/// Runs a full port scan.
///
/// # Arguments
///
/// * `scanner` - A validated scanner holding the target and the ports.
/// * `cancel` - Stops admitting ports and cuts short connects in flight.
/// * `on_result` - Called with each result as soon as it arrives.
///
/// # Returns
///
/// A `PortScanReport` with every result, in completion order.
pub async fn run_port_scan<F>(scanner: &PortScanner, cancel: &CancelToken, mut on_result: F) -> PortScanReport
where
    F: FnMut(&ScanResult),
{
    let mut rx = scanner.start(cancel);
    let mut report = PortScanReport::default();

    while let Some(result) = rx.recv().await {
        on_result(&result);
        report.results.push(result);
    }

    info!(
        probed = report.results.len(),
        open = report.open_ports().count(),
        "Port scan finished."
    );
    report
}

/// Runs a full enumeration: the wordlist pass and the passive sources
/// together, then the DNS record collection of the base domain.
///
/// # Arguments
///
/// * `enumerator` - A configured enumerator (resolver, wordlist, sources).
/// * `cancel` - Stops every stage: admission, lookups in flight, source
///   queries and the record collection.
/// * `on_result` - Called with each subdomain result as soon as it arrives.
///
/// # Returns
///
/// An `EnumerationReport` with the subdomains, the DNS records and every
/// source error. Source errors never abort the run. The record collection is
/// skipped when the run was cancelled.
pub async fn run_enumeration<F>(
    enumerator: &SubdomainEnumerator,
    cancel: &CancelToken,
    mut on_result: F,
) -> EnumerationReport
where
    F: FnMut(&SubdomainResult),
{
    let (mut rx, source_errors) = enumerator.start_with_sources(cancel);
    let mut report = EnumerationReport::default();

    while let Some(result) = rx.recv().await {
        on_result(&result);
        report.subdomains.push(result);
    }
    report.errors = passive_scanner::join_errors(source_errors).await;

    report.dns_records = enumerator
        .check_dns_records(&enumerator.options().domain, cancel)
        .await;

    info!(
        found = report.subdomains.len(),
        active = report.active_count(),
        record_types = report.dns_records.len(),
        errors = report.errors.len(),
        cancelled = cancel.is_cancelled(),
        "Enumeration finished."
    );
    report
}
