// src/core/scanner/dns_scanner.rs

use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::RecordType;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::core::cancel::CancelToken;
use crate::core::error::ReconError;
use crate::core::models::{DnsRecordType, DnsRecords};

/// Forward DNS lookups used by the enumerator and the record aggregator.
///
/// The production implementation is [`DnsResolver`]; tests plug in fixed tables.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolves `name` to its addresses, in the order the resolver returned them.
    async fn lookup_host(&self, name: &str) -> Result<Vec<String>, ReconError>;

    /// Returns the textual values of every `record_type` record for `name`.
    async fn lookup_records(
        &self,
        name: &str,
        record_type: DnsRecordType,
    ) -> Result<Vec<String>, ReconError>;
}

/// `Resolve` backed by hickory's tokio resolver.
#[derive(Clone)]
pub struct DnsResolver {
    inner: TokioAsyncResolver,
}

impl DnsResolver {
    /// Builds a resolver from the system configuration, falling back to the
    /// library default when it cannot be read. Each lookup is attempted once
    /// and bounded by `lookup_timeout`.
    pub fn new(lookup_timeout: Duration) -> Self {
        let (config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
            Ok(system) => system,
            Err(e) => {
                warn!(error = %e, "Could not read system resolver configuration, using defaults.");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = lookup_timeout;
        opts.attempts = 1;

        debug!(timeout_ms = lookup_timeout.as_millis() as u64, "Initializing DNS resolver.");
        Self {
            inner: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

#[async_trait]
impl Resolve for DnsResolver {
    async fn lookup_host(&self, name: &str) -> Result<Vec<String>, ReconError> {
        match self.inner.lookup_ip(name).await {
            Ok(lookup) => {
                let ips: Vec<String> = lookup.iter().map(|ip| ip.to_string()).collect();
                debug!(name, count = ips.len(), "Host resolved.");
                Ok(ips)
            }
            Err(e) => Err(classify(e, &format!("failed to resolve domain {name}"))),
        }
    }

    async fn lookup_records(
        &self,
        name: &str,
        record_type: DnsRecordType,
    ) -> Result<Vec<String>, ReconError> {
        match self.inner.lookup(name, to_hickory(record_type)).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|rdata| rdata.to_string().trim_matches('"').to_string())
                .collect()),
            Err(e) => Err(classify(
                e,
                &format!("{record_type} lookup failed for {name}"),
            )),
        }
    }
}

fn to_hickory(record_type: DnsRecordType) -> RecordType {
    match record_type {
        DnsRecordType::A => RecordType::A,
        DnsRecordType::Aaaa => RecordType::AAAA,
        DnsRecordType::Cname => RecordType::CNAME,
        DnsRecordType::Mx => RecordType::MX,
        DnsRecordType::Ns => RecordType::NS,
        DnsRecordType::Txt => RecordType::TXT,
    }
}

/// Maps a resolver failure onto the engine's error kinds: resolver timeouts
/// become `Timeout`, transport failures `Network`, everything else `Dns`.
fn classify(error: ResolveError, message: &str) -> ReconError {
    match error.kind() {
        ResolveErrorKind::Timeout => ReconError::timeout(message, error),
        ResolveErrorKind::Io(_) | ResolveErrorKind::NoConnections => {
            ReconError::network(message, error)
        }
        _ => ReconError::dns(message, error),
    }
}

/// Collects the A, AAAA, CNAME, MX, NS and TXT records of `domain`.
///
/// # Arguments
///
/// * `resolver` - The lookup backend, usually the enumerator's resolver.
/// * `domain` - The name whose records are collected.
/// * `cancel` - Stops the collection; an in-flight lookup is abandoned.
///
/// # Returns
///
/// A map from record type label to the values returned. Lookups run one after
/// another, and a type whose lookup fails, comes back empty or is cut short by
/// cancellation is left out.
pub async fn check_dns_records<R: Resolve + ?Sized>(
    resolver: &R,
    domain: &str,
    cancel: &CancelToken,
) -> DnsRecords {
    info!(domain = %domain, "Collecting DNS records.");
    let mut records = DnsRecords::new();

    for record_type in DnsRecordType::iter() {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(record = %record_type, "Record collection cancelled.");
                break;
            }
            outcome = resolver.lookup_records(domain, record_type) => outcome,
        };
        match outcome {
            Ok(values) if !values.is_empty() => {
                debug!(record = %record_type, count = values.len(), "Records found.");
                records.insert(record_type.to_string(), values);
            }
            Ok(_) => debug!(record = %record_type, "No records returned."),
            Err(e) => debug!(record = %record_type, kind = %e.kind(), error = %e.detail(), "Record lookup failed, omitting."),
        }
    }

    info!(types = records.len(), "DNS record collection finished.");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use std::collections::HashMap;

    struct FixedRecords(HashMap<DnsRecordType, Vec<String>>);

    #[async_trait]
    impl Resolve for FixedRecords {
        async fn lookup_host(&self, name: &str) -> Result<Vec<String>, ReconError> {
            Err(ReconError::config(format!("unused: {name}")))
        }

        async fn lookup_records(
            &self,
            name: &str,
            record_type: DnsRecordType,
        ) -> Result<Vec<String>, ReconError> {
            match self.0.get(&record_type) {
                Some(values) => Ok(values.clone()),
                None => Err(ReconError::dns(
                    format!("no {record_type} for {name}"),
                    "NXDOMAIN",
                )),
            }
        }
    }

    #[tokio::test]
    async fn aggregator_keeps_only_successful_types() {
        let resolver = FixedRecords(HashMap::from([
            (DnsRecordType::A, vec!["93.184.216.34".to_string()]),
            (DnsRecordType::Mx, vec!["10 mail.example.com.".to_string()]),
            (DnsRecordType::Txt, Vec::new()),
        ]));

        let records = check_dns_records(&resolver, "example.com", &CancelToken::new()).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records["A"], vec!["93.184.216.34"]);
        assert_eq!(records["MX"], vec!["10 mail.example.com."]);
        assert!(!records.contains_key("TXT"));
        assert!(!records.contains_key("AAAA"));
    }

    /// Answers every record query, but only after `delay`.
    struct SlowRecords(Duration);

    #[async_trait]
    impl Resolve for SlowRecords {
        async fn lookup_host(&self, _name: &str) -> Result<Vec<String>, ReconError> {
            tokio::time::sleep(self.0).await;
            Ok(vec!["10.0.0.1".to_string()])
        }

        async fn lookup_records(
            &self,
            _name: &str,
            _record_type: DnsRecordType,
        ) -> Result<Vec<String>, ReconError> {
            tokio::time::sleep(self.0).await;
            Ok(vec!["value".to_string()])
        }
    }

    #[tokio::test]
    async fn cancelled_collection_skips_every_lookup() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let started = std::time::Instant::now();
        let records = check_dns_records(&SlowRecords(Duration::from_secs(1)), "example.com", &cancel).await;

        assert!(records.is_empty());
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn cancellation_abandons_the_lookup_in_flight() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let records = check_dns_records(&SlowRecords(Duration::from_secs(2)), "example.com", &cancel).await;

        assert!(records.is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn record_type_labels_match_dns_names() {
        let labels: Vec<String> = DnsRecordType::iter().map(|t| t.to_string()).collect();
        assert_eq!(labels, ["A", "AAAA", "CNAME", "MX", "NS", "TXT"]);
        assert_eq!(to_hickory(DnsRecordType::Aaaa), RecordType::AAAA);
    }

    #[test]
    fn resolver_timeouts_are_classified_as_timeouts() {
        let err = classify(ResolveError::from(ResolveErrorKind::Timeout), "lookup");
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn transport_failures_are_network_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = classify(ResolveError::from(io), "lookup");
        assert_eq!(err.kind(), ErrorKind::Network);

        let err = classify(ResolveError::from(ResolveErrorKind::NoConnections), "lookup");
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn other_failures_are_dns_errors() {
        let err = classify(ResolveError::from("no record found"), "lookup");
        assert_eq!(err.kind(), ErrorKind::Dns);
    }

    #[tokio::test]
    #[ignore]
    async fn resolves_a_public_name() {
        let resolver = DnsResolver::new(Duration::from_secs(5));
        let ips = resolver.lookup_host("example.com").await.unwrap();
        assert!(!ips.is_empty());
    }
}
